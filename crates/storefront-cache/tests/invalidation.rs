//! Write-path behaviour: change events against a populated in-memory store.

mod common;

use common::memory_cache;
use std::collections::BTreeSet;
use storefront_cache::{
    CartParams, ChangeEvent, KeyParams, OrderDetailParams, OrderListParams, PaymentStatusParams, ResourceCategory,
    ReviewsParams, StorefrontCache, SuggestionParams, UserProfileParams,
};
use storefront_core::{OrderId, PageRequest, ProductId, UserId};

async fn populate(cache: &StorefrontCache, params: &KeyParams) -> String {
    let _: String = cache
        .get_or_load(params, || async { Ok("cached".to_string()) })
        .await
        .unwrap();
    cache.key(params).key
}

fn reviews(product: i64) -> KeyParams {
    KeyParams::Reviews(ReviewsParams {
        product_id: ProductId::new(product),
        page: None,
        limit: None,
    })
}

/// One entry in every category, touching product 42, product 43, `owner`
/// and order 7.
async fn populate_everything(cache: &StorefrontCache, owner: UserId) -> Vec<KeyParams> {
    let params = vec![
        KeyParams::product_list(PageRequest::first(), None),
        KeyParams::product_list(PageRequest::new(2, 20), Some("Electronics".to_string())),
        KeyParams::product_detail(ProductId::new(42)),
        KeyParams::product_detail(ProductId::new(43)),
        KeyParams::product_search("lamp", PageRequest::first()),
        KeyParams::Suggestions(SuggestionParams {
            query: "la".to_string(),
            limit: None,
        }),
        KeyParams::Categories(Default::default()),
        KeyParams::UserProfile(UserProfileParams { user_id: owner }),
        KeyParams::order_list(owner, PageRequest::first()),
        KeyParams::OrderList(OrderListParams {
            user_id: owner,
            page: Some(2),
            limit: None,
            status: Some("shipped".to_string()),
        }),
        KeyParams::OrderDetail(OrderDetailParams { order_id: OrderId::new(7) }),
        KeyParams::Cart(CartParams { user_id: owner }),
        KeyParams::SearchResults(Default::default()),
        reviews(42),
        reviews(43),
        KeyParams::PaymentStatus(PaymentStatusParams { order_id: OrderId::new(7) }),
    ];
    for p in &params {
        populate(cache, p).await;
    }
    params
}

fn categories_of(keys: &[String]) -> BTreeSet<ResourceCategory> {
    ResourceCategory::ALL
        .into_iter()
        .filter(|c| {
            let prefix = format!("storefront:cache:{}:", c);
            keys.iter().any(|k| k.starts_with(&prefix))
        })
        .collect()
}

#[tokio::test]
async fn product_changed_removes_every_dependent_entry() {
    let (cache, store) = memory_cache();
    let owner = UserId::new();
    populate_everything(&cache, owner).await;

    cache
        .invalidate(&ChangeEvent::ProductChanged { product_id: ProductId::new(42) })
        .await;

    let remaining = store.keys();
    let expected: BTreeSet<String> = [
        cache.key(&KeyParams::product_detail(ProductId::new(43))).key,
        cache.key(&reviews(43)).key,
        cache.key(&KeyParams::UserProfile(UserProfileParams { user_id: owner })).key,
        cache.key(&KeyParams::order_list(owner, PageRequest::first())).key,
        cache
            .key(&KeyParams::OrderList(OrderListParams {
                user_id: owner,
                page: Some(2),
                limit: None,
                status: Some("shipped".to_string()),
            }))
            .key,
        cache.key(&KeyParams::OrderDetail(OrderDetailParams { order_id: OrderId::new(7) })).key,
        cache.key(&KeyParams::Cart(CartParams { user_id: owner })).key,
        cache.key(&KeyParams::PaymentStatus(PaymentStatusParams { order_id: OrderId::new(7) })).key,
    ]
    .into_iter()
    .collect();

    assert_eq!(remaining.into_iter().collect::<BTreeSet<_>>(), expected);
}

#[tokio::test]
async fn order_changed_only_touches_that_order_and_owner() {
    let (cache, store) = memory_cache();
    let owner = UserId::new();
    let stranger = UserId::new();
    populate_everything(&cache, owner).await;
    let strangers_orders = populate(&cache, &KeyParams::order_list(stranger, PageRequest::first())).await;
    let before = store.len();

    let report = cache
        .invalidate(&ChangeEvent::OrderChanged {
            order_id: OrderId::new(7),
            user_id: owner,
        })
        .await;

    // order-detail:7, payment-status:7 and both of the owner's order-list pages.
    assert_eq!(report.deleted, 4);
    assert_eq!(store.len(), before - 4);
    assert!(store.keys().contains(&strangers_orders));
    assert!(store.keys().contains(&cache.key(&KeyParams::Cart(CartParams { user_id: owner })).key));
}

#[tokio::test]
async fn user_changed_clears_profile_and_cart() {
    let (cache, store) = memory_cache();
    let owner = UserId::new();
    populate_everything(&cache, owner).await;

    let report = cache.invalidate(&ChangeEvent::UserChanged { user_id: owner }).await;

    assert_eq!(report.deleted, 2);
    let remaining = store.keys();
    assert!(!remaining.contains(&cache.key(&KeyParams::Cart(CartParams { user_id: owner })).key));
    assert!(!remaining.contains(&cache.key(&KeyParams::UserProfile(UserProfileParams { user_id: owner })).key));
}

#[tokio::test]
async fn global_flush_empties_every_category() {
    let (cache, store) = memory_cache();
    let keys_before = {
        populate_everything(&cache, UserId::new()).await;
        store.keys()
    };
    assert_eq!(categories_of(&keys_before).len(), ResourceCategory::ALL.len());

    let report = cache.invalidate(&ChangeEvent::All).await;

    assert_eq!(report.deleted as usize, keys_before.len());
    assert!(store.is_empty());
}

#[tokio::test]
async fn listener_applies_events_in_the_background() {
    let (cache, store) = memory_cache();
    let key = populate(&cache, &KeyParams::product_detail(ProductId::new(42))).await;
    assert!(store.keys().contains(&key));

    let (publisher, listener) = cache.listener(16);
    let handle = listener.spawn();
    publisher
        .publish(ChangeEvent::ReviewChanged { product_id: ProductId::new(42) })
        .await
        .unwrap();
    drop(publisher);

    assert_eq!(handle.await.unwrap(), 1);
    assert!(store.is_empty());
}

#[tokio::test]
async fn parsed_events_match_typed_events() {
    let (cache, _store) = memory_cache();
    let owner = UserId::new();
    let owner_text = owner.to_string();

    let parsed = ChangeEvent::parse("payment_changed", Some("7"), Some(&owner_text)).unwrap();
    let typed = ChangeEvent::PaymentChanged {
        order_id: OrderId::new(7),
        user_id: owner,
    };

    assert_eq!(parsed, typed);
    assert_eq!(cache.patterns_for(&parsed), cache.patterns_for(&typed));
}

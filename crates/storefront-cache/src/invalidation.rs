//! Cascading invalidation.
//!
//! A committed write is described by a [`ChangeEvent`]. Each event kind owns
//! an ordered list of [`PatternTemplate`]s naming every category whose
//! entries may embed the changed data. The engine renders the templates with
//! the event's ids and deletes each pattern in turn.

use crate::category::normalize_name;
use crate::store::CacheStore;
use crate::timeout::with_timeout;
use crate::{KeyBuilder, ResourceCategory};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use storefront_core::{CategoryId, OrderId, ProductId, StorefrontError, StorefrontResult, UserId};
use tracing::{info, warn};

/// A committed change to the system of record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ChangeEvent {
    ProductChanged { product_id: ProductId },
    CategoryChanged { category_id: CategoryId },
    OrderChanged { order_id: OrderId, user_id: UserId },
    PaymentChanged { order_id: OrderId, user_id: UserId },
    CartChanged { user_id: UserId },
    UserChanged { user_id: UserId },
    ReviewChanged { product_id: ProductId },
    /// Global flush of every category.
    All,
}

/// The discriminant of a [`ChangeEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    ProductChanged,
    CategoryChanged,
    OrderChanged,
    PaymentChanged,
    CartChanged,
    UserChanged,
    ReviewChanged,
    All,
}

impl EventKind {
    /// Every event kind.
    pub const ALL: [Self; 8] = [
        Self::ProductChanged,
        Self::CategoryChanged,
        Self::OrderChanged,
        Self::PaymentChanged,
        Self::CartChanged,
        Self::UserChanged,
        Self::ReviewChanged,
        Self::All,
    ];

    /// Returns the event name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ProductChanged => "product-changed",
            Self::CategoryChanged => "category-changed",
            Self::OrderChanged => "order-changed",
            Self::PaymentChanged => "payment-changed",
            Self::CartChanged => "cart-changed",
            Self::UserChanged => "user-changed",
            Self::ReviewChanged => "review-changed",
            Self::All => "all",
        }
    }

    /// Returns the ordered pattern templates invalidated by this kind.
    #[must_use]
    pub const fn templates(&self) -> &'static [PatternTemplate] {
        use ResourceCategory as C;
        use Scope::{Category, OwnerPrefix, Resource, ResourcePrefix};

        match self {
            Self::ProductChanged => &[
                PatternTemplate { category: C::ProductDetail, scope: Resource },
                PatternTemplate { category: C::ProductList, scope: Category },
                PatternTemplate { category: C::ProductSearch, scope: Category },
                PatternTemplate { category: C::SearchResults, scope: Category },
                PatternTemplate { category: C::Suggestions, scope: Category },
                PatternTemplate { category: C::Categories, scope: Category },
                PatternTemplate { category: C::Reviews, scope: ResourcePrefix },
            ],
            // Category keys fingerprint the parent id and product lists the
            // category name, so the id cannot address them: whole categories.
            Self::CategoryChanged => &[
                PatternTemplate { category: C::Categories, scope: Category },
                PatternTemplate { category: C::ProductList, scope: Category },
                PatternTemplate { category: C::ProductSearch, scope: Category },
                PatternTemplate { category: C::SearchResults, scope: Category },
                PatternTemplate { category: C::Suggestions, scope: Category },
            ],
            Self::OrderChanged => &[
                PatternTemplate { category: C::OrderDetail, scope: Resource },
                PatternTemplate { category: C::PaymentStatus, scope: Resource },
                PatternTemplate { category: C::OrderList, scope: OwnerPrefix },
            ],
            Self::PaymentChanged => &[
                PatternTemplate { category: C::PaymentStatus, scope: Resource },
                PatternTemplate { category: C::OrderDetail, scope: Resource },
                PatternTemplate { category: C::OrderList, scope: OwnerPrefix },
            ],
            Self::CartChanged => &[PatternTemplate { category: C::Cart, scope: Resource }],
            Self::UserChanged => &[
                PatternTemplate { category: C::UserProfile, scope: Resource },
                PatternTemplate { category: C::Cart, scope: Resource },
            ],
            Self::ReviewChanged => &[
                PatternTemplate { category: C::Reviews, scope: ResourcePrefix },
                PatternTemplate { category: C::ProductDetail, scope: Resource },
            ],
            Self::All => &[
                PatternTemplate { category: C::ProductList, scope: Category },
                PatternTemplate { category: C::ProductDetail, scope: Category },
                PatternTemplate { category: C::ProductSearch, scope: Category },
                PatternTemplate { category: C::Suggestions, scope: Category },
                PatternTemplate { category: C::Categories, scope: Category },
                PatternTemplate { category: C::UserProfile, scope: Category },
                PatternTemplate { category: C::OrderList, scope: Category },
                PatternTemplate { category: C::OrderDetail, scope: Category },
                PatternTemplate { category: C::Cart, scope: Category },
                PatternTemplate { category: C::SearchResults, scope: Category },
                PatternTemplate { category: C::Reviews, scope: Category },
                PatternTemplate { category: C::PaymentStatus, scope: Category },
            ],
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = StorefrontError;

    /// Accepts `product-changed`, `product_changed` and `productChanged`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_name(s);
        Self::ALL
            .into_iter()
            .find(|kind| normalize_name(kind.as_str()) == wanted)
            .ok_or_else(|| StorefrontError::Configuration(format!("unknown change event '{}'", s)))
    }
}

/// Which keys of a category a template reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// `{category}:{resource id}`, one key.
    Resource,
    /// `{category}:{resource id}:*`, every page for one resource.
    ResourcePrefix,
    /// `{category}:{owner id}:*`, every page for one user.
    OwnerPrefix,
    /// `{category}:*`, the whole category.
    Category,
}

/// One pattern to delete: a category and how much of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternTemplate {
    pub category: ResourceCategory,
    pub scope: Scope,
}

impl PatternTemplate {
    /// Renders the pattern for `event`, or `None` when the event lacks the
    /// id this scope needs.
    #[must_use]
    pub fn render(&self, keys: &KeyBuilder, event: &ChangeEvent) -> Option<String> {
        let prefix = keys.category_prefix(self.category);
        match self.scope {
            Scope::Resource => event.resource_id().map(|id| format!("{}:{}", prefix, id)),
            Scope::ResourcePrefix => event.resource_id().map(|id| format!("{}:{}:*", prefix, id)),
            Scope::OwnerPrefix => event.owner_id().map(|id| format!("{}:{}:*", prefix, id)),
            Scope::Category => Some(format!("{}:*", prefix)),
        }
    }
}

impl ChangeEvent {
    /// Returns the kind of this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::ProductChanged { .. } => EventKind::ProductChanged,
            Self::CategoryChanged { .. } => EventKind::CategoryChanged,
            Self::OrderChanged { .. } => EventKind::OrderChanged,
            Self::PaymentChanged { .. } => EventKind::PaymentChanged,
            Self::CartChanged { .. } => EventKind::CartChanged,
            Self::UserChanged { .. } => EventKind::UserChanged,
            Self::ReviewChanged { .. } => EventKind::ReviewChanged,
            Self::All => EventKind::All,
        }
    }

    /// Id of the changed resource as it appears in keys.
    fn resource_id(&self) -> Option<String> {
        match self {
            Self::ProductChanged { product_id } | Self::ReviewChanged { product_id } => {
                Some(product_id.to_string())
            }
            Self::OrderChanged { order_id, .. } | Self::PaymentChanged { order_id, .. } => {
                Some(order_id.to_string())
            }
            Self::CartChanged { user_id } | Self::UserChanged { user_id } => Some(user_id.to_string()),
            Self::CategoryChanged { .. } | Self::All => None,
        }
    }

    /// Id of the user owning the changed resource.
    fn owner_id(&self) -> Option<String> {
        match self {
            Self::OrderChanged { user_id, .. }
            | Self::PaymentChanged { user_id, .. }
            | Self::CartChanged { user_id }
            | Self::UserChanged { user_id } => Some(user_id.to_string()),
            _ => None,
        }
    }

    /// Builds an event from dynamic input.
    ///
    /// `id` is the changed resource (a user id for cart and user events) and
    /// `owner` the user who owns an order. An unknown kind, a missing or
    /// malformed id, or a missing owner is a configuration error.
    pub fn parse(kind: &str, id: Option<&str>, owner: Option<&str>) -> StorefrontResult<Self> {
        let kind: EventKind = kind.parse()?;
        let event = match kind {
            EventKind::All => Self::All,
            EventKind::ProductChanged => Self::ProductChanged {
                product_id: parse_numeric(kind, "id", id)?,
            },
            EventKind::ReviewChanged => Self::ReviewChanged {
                product_id: parse_numeric(kind, "id", id)?,
            },
            EventKind::CategoryChanged => Self::CategoryChanged {
                category_id: parse_numeric(kind, "id", id)?,
            },
            EventKind::OrderChanged => Self::OrderChanged {
                order_id: parse_numeric(kind, "id", id)?,
                user_id: parse_user(kind, "owner", owner)?,
            },
            EventKind::PaymentChanged => Self::PaymentChanged {
                order_id: parse_numeric(kind, "id", id)?,
                user_id: parse_user(kind, "owner", owner)?,
            },
            EventKind::CartChanged => Self::CartChanged {
                user_id: parse_user(kind, "id", id)?,
            },
            EventKind::UserChanged => Self::UserChanged {
                user_id: parse_user(kind, "id", id)?,
            },
        };
        Ok(event)
    }
}

fn required<'a>(kind: EventKind, field: &str, value: Option<&'a str>) -> StorefrontResult<&'a str> {
    value.filter(|v| !v.trim().is_empty()).ok_or_else(|| {
        StorefrontError::Configuration(format!("event '{}' requires {}", kind, field))
    })
}

fn parse_numeric<T: FromStr>(kind: EventKind, field: &str, value: Option<&str>) -> StorefrontResult<T> {
    let raw = required(kind, field, value)?;
    raw.parse().map_err(|_| {
        StorefrontError::Configuration(format!("event '{}': {} '{}' is not a numeric id", kind, field, raw))
    })
}

fn parse_user(kind: EventKind, field: &str, value: Option<&str>) -> StorefrontResult<UserId> {
    let raw = required(kind, field, value)?;
    UserId::parse(raw).map_err(|e| {
        StorefrontError::Configuration(format!("event '{}': {} '{}' is not a user id: {}", kind, field, raw, e))
    })
}

/// Outcome of one invalidation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationReport {
    pub kind: EventKind,
    /// Patterns issued, in order.
    pub patterns: Vec<String>,
    /// Keys removed across all patterns that succeeded.
    pub deleted: u64,
    /// Patterns whose delete failed or timed out.
    pub failed: Vec<String>,
}

impl InvalidationReport {
    /// Returns true if every pattern was deleted.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Expands change events into pattern deletes against the store.
#[derive(Clone)]
pub struct InvalidationEngine {
    store: Arc<dyn CacheStore>,
    keys: Arc<KeyBuilder>,
    timeout: Duration,
}

impl InvalidationEngine {
    /// Creates an engine; each pattern delete is bounded by `timeout`.
    #[must_use]
    pub fn new(store: Arc<dyn CacheStore>, keys: Arc<KeyBuilder>, timeout: Duration) -> Self {
        Self { store, keys, timeout }
    }

    /// Returns the rendered patterns for `event`, in rule order.
    #[must_use]
    pub fn patterns_for(&self, event: &ChangeEvent) -> Vec<String> {
        event
            .kind()
            .templates()
            .iter()
            .filter_map(|template| template.render(&self.keys, event))
            .collect()
    }

    /// Deletes every pattern for `event`.
    ///
    /// Never fails: a pattern that errors or times out is logged and the
    /// remaining patterns are still attempted. Entries that survive expire
    /// within one TTL.
    pub async fn invalidate(&self, event: &ChangeEvent) -> InvalidationReport {
        let kind = event.kind();
        let patterns = self.patterns_for(event);
        let mut deleted = 0;
        let mut failed = Vec::new();

        for pattern in &patterns {
            match with_timeout(self.timeout, || self.store.delete_pattern(pattern)).await {
                Ok(count) => deleted += count,
                Err(e) => {
                    warn!("Invalidation of '{}' for {} failed: {}", pattern, kind, e);
                    failed.push(pattern.clone());
                }
            }
        }

        info!(
            event = %kind,
            patterns = patterns.len(),
            deleted,
            failed = failed.len(),
            "Cache invalidated"
        );

        InvalidationReport {
            kind,
            patterns,
            deleted,
            failed,
        }
    }
}

impl fmt::Debug for InvalidationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvalidationEngine")
            .field("namespace", &self.keys.namespace())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockCacheStore;
    use crate::TtlPolicy;
    use std::collections::HashSet;

    const USER: &str = "550e8400-e29b-41d4-a716-446655440000";

    fn keys() -> Arc<KeyBuilder> {
        Arc::new(KeyBuilder::new("ns", TtlPolicy::new()).unwrap())
    }

    fn user() -> UserId {
        UserId::parse(USER).unwrap()
    }

    fn sample_events() -> Vec<ChangeEvent> {
        vec![
            ChangeEvent::ProductChanged { product_id: ProductId::new(42) },
            ChangeEvent::CategoryChanged { category_id: CategoryId::new(3) },
            ChangeEvent::OrderChanged { order_id: OrderId::new(7), user_id: user() },
            ChangeEvent::PaymentChanged { order_id: OrderId::new(7), user_id: user() },
            ChangeEvent::CartChanged { user_id: user() },
            ChangeEvent::UserChanged { user_id: user() },
            ChangeEvent::ReviewChanged { product_id: ProductId::new(42) },
            ChangeEvent::All,
        ]
    }

    #[test]
    fn test_category_changed_is_category_wide() {
        let engine = InvalidationEngine::new(Arc::new(MockCacheStore::new()), keys(), Duration::from_millis(50));
        let first = engine.patterns_for(&ChangeEvent::CategoryChanged { category_id: CategoryId::new(3) });
        let second = engine.patterns_for(&ChangeEvent::CategoryChanged { category_id: CategoryId::new(9) });

        assert_eq!(first, second);
        assert!(first.iter().all(|pattern| pattern.ends_with(":*")));
        assert_eq!(first[0], "ns:categories:*");
    }

    #[test]
    fn test_every_rule_renders_completely() {
        let keys = keys();
        for event in sample_events() {
            for template in event.kind().templates() {
                assert!(
                    template.render(&keys, &event).is_some(),
                    "{:?} cannot render for {}",
                    template,
                    event.kind()
                );
            }
        }
    }

    #[test]
    fn test_product_changed_patterns() {
        let engine = InvalidationEngine::new(Arc::new(MockCacheStore::new()), keys(), Duration::from_millis(50));
        let patterns = engine.patterns_for(&ChangeEvent::ProductChanged { product_id: ProductId::new(42) });
        assert_eq!(
            patterns,
            vec![
                "ns:product-detail:42",
                "ns:product-list:*",
                "ns:product-search:*",
                "ns:search-results:*",
                "ns:suggestions:*",
                "ns:categories:*",
                "ns:reviews:42:*",
            ]
        );
    }

    #[test]
    fn test_order_and_payment_patterns() {
        let engine = InvalidationEngine::new(Arc::new(MockCacheStore::new()), keys(), Duration::from_millis(50));
        let order = engine.patterns_for(&ChangeEvent::OrderChanged { order_id: OrderId::new(7), user_id: user() });
        assert_eq!(
            order,
            vec![
                "ns:order-detail:7".to_string(),
                "ns:payment-status:7".to_string(),
                format!("ns:order-list:{}:*", USER),
            ]
        );
        let payment = engine.patterns_for(&ChangeEvent::PaymentChanged { order_id: OrderId::new(7), user_id: user() });
        assert_eq!(payment[0], "ns:payment-status:7");
        assert_eq!(payment[1], "ns:order-detail:7");
    }

    #[test]
    fn test_all_covers_every_category() {
        let covered: HashSet<_> = EventKind::All
            .templates()
            .iter()
            .inspect(|t| assert_eq!(t.scope, Scope::Category))
            .map(|t| t.category)
            .collect();
        let expected: HashSet<_> = ResourceCategory::ALL.into_iter().collect();
        assert_eq!(covered, expected);
    }

    #[test]
    fn test_event_kind_parsing() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
        }
        assert_eq!("productChanged".parse::<EventKind>().unwrap(), EventKind::ProductChanged);
        assert_eq!("ORDER_CHANGED".parse::<EventKind>().unwrap(), EventKind::OrderChanged);
        assert!(matches!(
            "price-changed".parse::<EventKind>(),
            Err(StorefrontError::Configuration(_))
        ));
    }

    #[test]
    fn test_parse_builds_events() {
        assert_eq!(
            ChangeEvent::parse("product-changed", Some("42"), None).unwrap(),
            ChangeEvent::ProductChanged { product_id: ProductId::new(42) }
        );
        assert_eq!(
            ChangeEvent::parse("order-changed", Some("7"), Some(USER)).unwrap(),
            ChangeEvent::OrderChanged { order_id: OrderId::new(7), user_id: user() }
        );
        assert_eq!(
            ChangeEvent::parse("cart-changed", Some(USER), None).unwrap(),
            ChangeEvent::CartChanged { user_id: user() }
        );
        assert_eq!(ChangeEvent::parse("all", None, None).unwrap(), ChangeEvent::All);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        let cases = [
            ("product-changed", None, None),
            ("product-changed", Some("forty-two"), None),
            ("order-changed", Some("7"), None),
            ("order-changed", Some("7"), Some("not-a-uuid")),
            ("user-changed", Some("42"), None),
            ("wishlist-changed", Some("1"), None),
        ];
        for (kind, id, owner) in cases {
            assert!(
                matches!(ChangeEvent::parse(kind, id, owner), Err(StorefrontError::Configuration(_))),
                "{} {:?} {:?} should be rejected",
                kind,
                id,
                owner
            );
        }
    }

    #[test]
    fn test_event_serde_is_tagged() {
        let json = serde_json::to_value(ChangeEvent::ProductChanged { product_id: ProductId::new(42) }).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "product-changed", "product_id": 42}));
        let back: ChangeEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind(), EventKind::ProductChanged);
    }

    #[tokio::test]
    async fn test_failed_pattern_does_not_stop_the_rest() {
        let mut store = MockCacheStore::new();
        store
            .expect_delete_pattern()
            .withf(|pattern| pattern == "ns:product-list:*")
            .times(1)
            .returning(|_| Err(StorefrontError::store_unavailable("connection reset")));
        store
            .expect_delete_pattern()
            .withf(|pattern| pattern != "ns:product-list:*")
            .times(6)
            .returning(|_| Ok(2));

        let engine = InvalidationEngine::new(Arc::new(store), keys(), Duration::from_millis(50));
        let report = engine
            .invalidate(&ChangeEvent::ProductChanged { product_id: ProductId::new(42) })
            .await;

        assert_eq!(report.patterns.len(), 7);
        assert_eq!(report.deleted, 12);
        assert_eq!(report.failed, vec!["ns:product-list:*".to_string()]);
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn test_patterns_are_deleted_in_rule_order() {
        let mut seq = mockall::Sequence::new();
        let mut store = MockCacheStore::new();
        for expected in ["ns:reviews:9:*", "ns:product-detail:9"] {
            store
                .expect_delete_pattern()
                .withf(move |pattern| pattern == expected)
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(1));
        }

        let engine = InvalidationEngine::new(Arc::new(store), keys(), Duration::from_millis(50));
        let report = engine
            .invalidate(&ChangeEvent::ReviewChanged { product_id: ProductId::new(9) })
            .await;

        assert!(report.is_complete());
        assert_eq!(report.deleted, 2);
    }
}

//! Cache key construction.
//!
//! A key has the shape `{namespace}:{category}[:{scope id}][:{fingerprint}]`.
//! Identifiers that invalidation needs to target (product, user, order)
//! appear verbatim so that prefix patterns can reach them. Every other
//! parameter is normalised and folded into a SHA-256 fingerprint, which keeps
//! free text from ever injecting `:` or glob characters into a key.

use crate::{ResourceCategory, TtlPolicy};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::time::Duration;
use storefront_config::CacheConfig;
use storefront_core::{CategoryId, OrderId, PageRequest, ProductId, StorefrontError, StorefrontResult, UserId};

/// Composite filters. A `BTreeMap` so iteration order, and therefore the
/// key, never depends on insertion order.
pub type Filters = BTreeMap<String, Option<String>>;

/// Parameters for [`ResourceCategory::ProductList`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProductListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Category filter; `None` lists every category.
    pub category: Option<String>,
    pub sort: Option<String>,
    pub filters: Filters,
}

/// Parameters for [`ResourceCategory::ProductDetail`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductDetailParams {
    pub id: ProductId,
}

/// Parameters for [`ResourceCategory::ProductSearch`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProductSearchParams {
    pub query: String,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Parameters for [`ResourceCategory::Suggestions`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SuggestionParams {
    pub query: String,
    pub limit: Option<u32>,
}

impl SuggestionParams {
    /// Default suggestion count.
    pub const DEFAULT_LIMIT: u32 = 10;
    /// Maximum suggestion count.
    pub const MAX_LIMIT: u32 = 50;

    /// Returns the requested count with the default applied and clamped to
    /// `1..=MAX_LIMIT`.
    #[must_use]
    pub fn effective_limit(&self) -> u32 {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT).clamp(1, Self::MAX_LIMIT)
    }
}

/// Parameters for [`ResourceCategory::Categories`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CategoriesParams {
    /// Parent category; `None` is the root of the tree.
    pub parent: Option<CategoryId>,
}

/// Parameters for [`ResourceCategory::UserProfile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserProfileParams {
    pub user_id: UserId,
}

/// Parameters for [`ResourceCategory::OrderList`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderListParams {
    pub user_id: UserId,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Parameters for [`ResourceCategory::OrderDetail`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderDetailParams {
    pub order_id: OrderId,
}

/// Parameters for [`ResourceCategory::Cart`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CartParams {
    pub user_id: UserId,
}

/// Parameters for [`ResourceCategory::SearchResults`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchResultsParams {
    pub query: String,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub filters: Filters,
}

/// Parameters for [`ResourceCategory::Reviews`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReviewsParams {
    pub product_id: ProductId,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Parameters for [`ResourceCategory::PaymentStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaymentStatusParams {
    pub order_id: OrderId,
}

/// One fixed-shape parameter record per category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyParams {
    ProductList(ProductListParams),
    ProductDetail(ProductDetailParams),
    ProductSearch(ProductSearchParams),
    Suggestions(SuggestionParams),
    Categories(CategoriesParams),
    UserProfile(UserProfileParams),
    OrderList(OrderListParams),
    OrderDetail(OrderDetailParams),
    Cart(CartParams),
    SearchResults(SearchResultsParams),
    Reviews(ReviewsParams),
    PaymentStatus(PaymentStatusParams),
}

impl KeyParams {
    /// Returns the category these parameters belong to.
    #[must_use]
    pub const fn category(&self) -> ResourceCategory {
        match self {
            Self::ProductList(_) => ResourceCategory::ProductList,
            Self::ProductDetail(_) => ResourceCategory::ProductDetail,
            Self::ProductSearch(_) => ResourceCategory::ProductSearch,
            Self::Suggestions(_) => ResourceCategory::Suggestions,
            Self::Categories(_) => ResourceCategory::Categories,
            Self::UserProfile(_) => ResourceCategory::UserProfile,
            Self::OrderList(_) => ResourceCategory::OrderList,
            Self::OrderDetail(_) => ResourceCategory::OrderDetail,
            Self::Cart(_) => ResourceCategory::Cart,
            Self::SearchResults(_) => ResourceCategory::SearchResults,
            Self::Reviews(_) => ResourceCategory::Reviews,
            Self::PaymentStatus(_) => ResourceCategory::PaymentStatus,
        }
    }

    /// Decodes the record for `category` from JSON.
    ///
    /// `null` is read as `{}`. A record of the wrong shape (missing required
    /// id, unknown field, wrong type) is a configuration error.
    pub fn from_json(category: ResourceCategory, params: serde_json::Value) -> StorefrontResult<Self> {
        let params = if params.is_null() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            params
        };

        let decoded = match category {
            ResourceCategory::ProductList => serde_json::from_value(params).map(Self::ProductList),
            ResourceCategory::ProductDetail => serde_json::from_value(params).map(Self::ProductDetail),
            ResourceCategory::ProductSearch => serde_json::from_value(params).map(Self::ProductSearch),
            ResourceCategory::Suggestions => serde_json::from_value(params).map(Self::Suggestions),
            ResourceCategory::Categories => serde_json::from_value(params).map(Self::Categories),
            ResourceCategory::UserProfile => serde_json::from_value(params).map(Self::UserProfile),
            ResourceCategory::OrderList => serde_json::from_value(params).map(Self::OrderList),
            ResourceCategory::OrderDetail => serde_json::from_value(params).map(Self::OrderDetail),
            ResourceCategory::Cart => serde_json::from_value(params).map(Self::Cart),
            ResourceCategory::SearchResults => serde_json::from_value(params).map(Self::SearchResults),
            ResourceCategory::Reviews => serde_json::from_value(params).map(Self::Reviews),
            ResourceCategory::PaymentStatus => serde_json::from_value(params).map(Self::PaymentStatus),
        };

        decoded.map_err(|e| {
            StorefrontError::Configuration(format!("invalid parameters for '{}': {}", category, e))
        })
    }

    /// Product listing page, optionally filtered by category name.
    #[must_use]
    pub fn product_list(page: PageRequest, category: Option<String>) -> Self {
        Self::ProductList(ProductListParams {
            page: Some(page.page),
            limit: Some(page.limit),
            category,
            ..ProductListParams::default()
        })
    }

    /// Single product.
    #[must_use]
    pub const fn product_detail(id: ProductId) -> Self {
        Self::ProductDetail(ProductDetailParams { id })
    }

    /// Product search page.
    #[must_use]
    pub fn product_search(query: impl Into<String>, page: PageRequest) -> Self {
        Self::ProductSearch(ProductSearchParams {
            query: query.into(),
            page: Some(page.page),
            limit: Some(page.limit),
        })
    }

    /// A user's order history page.
    #[must_use]
    pub fn order_list(user_id: UserId, page: PageRequest) -> Self {
        Self::OrderList(OrderListParams {
            user_id,
            page: Some(page.page),
            limit: Some(page.limit),
            status: None,
        })
    }
}

/// A concrete key together with the lifetime its entry must get.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltKey {
    pub category: ResourceCategory,
    pub key: String,
    pub ttl: Duration,
}

/// Derives keys and TTLs from typed parameters.
///
/// Pure: the output depends only on the input and the static namespace and
/// policy table.
#[derive(Debug, Clone)]
pub struct KeyBuilder {
    namespace: String,
    policy: TtlPolicy,
}

impl KeyBuilder {
    /// Creates a builder for `namespace` using `policy`.
    ///
    /// The namespace must be non-empty and free of glob metacharacters,
    /// otherwise invalidation patterns could reach outside it.
    pub fn new(namespace: impl Into<String>, policy: TtlPolicy) -> StorefrontResult<Self> {
        let namespace = namespace.into().trim().trim_end_matches(':').to_string();
        if namespace.is_empty() || namespace.contains(['*', '?', '[', ']']) {
            return Err(StorefrontError::Configuration(format!(
                "invalid cache namespace '{}'",
                namespace
            )));
        }
        Ok(Self { namespace, policy })
    }

    /// Creates a builder from the cache section of the configuration.
    pub fn from_config(config: &CacheConfig) -> StorefrontResult<Self> {
        Self::new(&config.namespace, TtlPolicy::with_overrides(&config.ttl_overrides)?)
    }

    /// Returns the key namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the TTL table.
    #[must_use]
    pub const fn policy(&self) -> &TtlPolicy {
        &self.policy
    }

    /// Returns the lifetime for `category`.
    #[must_use]
    pub fn ttl_for(&self, category: ResourceCategory) -> Duration {
        self.policy.ttl_for(category)
    }

    /// Returns `{namespace}:{category}`, the prefix of every key in the
    /// category.
    #[must_use]
    pub fn category_prefix(&self, category: ResourceCategory) -> String {
        format!("{}:{}", self.namespace, category.as_str())
    }

    /// Builds the key and TTL for `params`.
    #[must_use]
    pub fn build(&self, params: &KeyParams) -> BuiltKey {
        let category = params.category();
        let prefix = self.category_prefix(category);

        let key = match params {
            KeyParams::ProductList(p) => {
                let page = PageRequest::from_query(p.page, p.limit);
                let fingerprint = Fingerprint::new(category)
                    .number("page", page.page.into())
                    .number("limit", page.limit.into())
                    .text("category", p.category.as_deref())
                    .text("sort", p.sort.as_deref())
                    .filters("filters", &p.filters)
                    .finish();
                format!("{}:{}", prefix, fingerprint)
            }
            KeyParams::ProductDetail(p) => format!("{}:{}", prefix, p.id),
            KeyParams::ProductSearch(p) => {
                let page = PageRequest::from_query(p.page, p.limit);
                let fingerprint = Fingerprint::new(category)
                    .text("query", Some(&normalize_query(&p.query)))
                    .number("page", page.page.into())
                    .number("limit", page.limit.into())
                    .finish();
                format!("{}:{}", prefix, fingerprint)
            }
            KeyParams::Suggestions(p) => {
                let fingerprint = Fingerprint::new(category)
                    .text("query", Some(&normalize_query(&p.query)))
                    .number("limit", p.effective_limit().into())
                    .finish();
                format!("{}:{}", prefix, fingerprint)
            }
            KeyParams::Categories(p) => {
                let parent = p.parent.map(|id| id.to_string());
                let fingerprint = Fingerprint::new(category)
                    .text("parent", parent.as_deref())
                    .finish();
                format!("{}:{}", prefix, fingerprint)
            }
            KeyParams::UserProfile(p) => format!("{}:{}", prefix, p.user_id),
            KeyParams::OrderList(p) => {
                let page = PageRequest::from_query(p.page, p.limit);
                let fingerprint = Fingerprint::new(category)
                    .number("page", page.page.into())
                    .number("limit", page.limit.into())
                    .text("status", p.status.as_deref())
                    .finish();
                format!("{}:{}:{}", prefix, p.user_id, fingerprint)
            }
            KeyParams::OrderDetail(p) => format!("{}:{}", prefix, p.order_id),
            KeyParams::Cart(p) => format!("{}:{}", prefix, p.user_id),
            KeyParams::SearchResults(p) => {
                let page = PageRequest::from_query(p.page, p.limit);
                let fingerprint = Fingerprint::new(category)
                    .text("query", Some(&normalize_query(&p.query)))
                    .number("page", page.page.into())
                    .number("limit", page.limit.into())
                    .filters("filters", &p.filters)
                    .finish();
                format!("{}:{}", prefix, fingerprint)
            }
            KeyParams::Reviews(p) => {
                let page = PageRequest::from_query(p.page, p.limit);
                let fingerprint = Fingerprint::new(category)
                    .number("page", page.page.into())
                    .number("limit", page.limit.into())
                    .finish();
                format!("{}:{}:{}", prefix, p.product_id, fingerprint)
            }
            KeyParams::PaymentStatus(p) => format!("{}:{}", prefix, p.order_id),
        };

        BuiltKey {
            category,
            key,
            ttl: self.policy.ttl_for(category),
        }
    }

    /// Builds a key from a category name and JSON parameters, for input that
    /// only arrives at runtime.
    pub fn build_dynamic(&self, category: &str, params: serde_json::Value) -> StorefrontResult<BuiltKey> {
        let category: ResourceCategory = category.parse()?;
        let params = KeyParams::from_json(category, params)?;
        Ok(self.build(&params))
    }
}

/// Trims, collapses inner whitespace, and lower-cases free text.
///
/// Keys hash the normalized form, so callers must hand the same form to
/// their loader; otherwise two queries sharing a key could load differently.
#[must_use]
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Injective encoding of named fields, hashed with SHA-256.
///
/// Every name and string value is length-prefixed and `None` has its own
/// tag, so `None`, `Some("")`, and `Some("~")` all encode differently.
struct Fingerprint {
    hasher: Sha256,
}

impl Fingerprint {
    fn new(category: ResourceCategory) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(category.as_str().as_bytes());
        hasher.update(b"|");
        Self { hasher }
    }

    fn name(&mut self, name: &str) {
        self.hasher.update(format!("{}:{}=", name.len(), name).as_bytes());
    }

    fn value(&mut self, value: Option<&str>) {
        match value {
            Some(v) => self.hasher.update(format!("s{}:{};", v.len(), v).as_bytes()),
            None => self.hasher.update(b"n;"),
        }
    }

    fn number(mut self, name: &str, value: u64) -> Self {
        self.name(name);
        self.hasher.update(format!("i{};", value).as_bytes());
        self
    }

    fn text(mut self, name: &str, value: Option<&str>) -> Self {
        self.name(name);
        self.value(value);
        self
    }

    fn filters(mut self, name: &str, filters: &Filters) -> Self {
        self.name(name);
        self.hasher.update(format!("m{};", filters.len()).as_bytes());
        for (key, value) in filters {
            self.value(Some(key));
            self.value(value.as_deref());
        }
        self
    }

    fn finish(self) -> String {
        format!("{:x}", self.hasher.finalize())
    }
}

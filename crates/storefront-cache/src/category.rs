//! Resource categories: the top level of the cache keyspace.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use storefront_core::StorefrontError;

/// A family of cache keys sharing one TTL and one key prefix.
///
/// This enum is the single source of truth for which categories exist. Both
/// key building and the TTL table dispatch on it exhaustively, and dynamic
/// input is parsed through [`FromStr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceCategory {
    ProductList,
    ProductDetail,
    ProductSearch,
    Suggestions,
    Categories,
    UserProfile,
    OrderList,
    OrderDetail,
    Cart,
    SearchResults,
    Reviews,
    PaymentStatus,
}

impl ResourceCategory {
    /// Number of categories.
    pub const COUNT: usize = 12;

    /// Every category, in declaration order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::ProductList,
        Self::ProductDetail,
        Self::ProductSearch,
        Self::Suggestions,
        Self::Categories,
        Self::UserProfile,
        Self::OrderList,
        Self::OrderDetail,
        Self::Cart,
        Self::SearchResults,
        Self::Reviews,
        Self::PaymentStatus,
    ];

    /// Returns the category name. This is also the key segment that follows
    /// the namespace.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ProductList => "product-list",
            Self::ProductDetail => "product-detail",
            Self::ProductSearch => "product-search",
            Self::Suggestions => "suggestions",
            Self::Categories => "categories",
            Self::UserProfile => "user-profile",
            Self::OrderList => "order-list",
            Self::OrderDetail => "order-detail",
            Self::Cart => "cart",
            Self::SearchResults => "search-results",
            Self::Reviews => "reviews",
            Self::PaymentStatus => "payment-status",
        }
    }

    /// Returns the built-in lifetime for entries of this category.
    ///
    /// Highly volatile data stays at or under two minutes, orders and
    /// profiles between five and fifteen, catalog reads half an hour, and
    /// near-static data an hour.
    #[must_use]
    pub const fn default_ttl(&self) -> Duration {
        let secs = match self {
            Self::PaymentStatus => 60,
            Self::Cart => 120,
            Self::OrderList => 300,
            Self::OrderDetail => 600,
            Self::UserProfile => 900,
            Self::ProductList
            | Self::ProductDetail
            | Self::ProductSearch
            | Self::SearchResults
            | Self::Reviews => 1800,
            Self::Categories | Self::Suggestions => 3600,
        };
        Duration::from_secs(secs)
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceCategory {
    type Err = StorefrontError;

    /// Accepts `product-list`, `product_list` and `productList` alike.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_name(s);
        Self::ALL
            .into_iter()
            .find(|category| normalize_name(category.as_str()) == wanted)
            .ok_or_else(|| StorefrontError::Configuration(format!("unknown resource category '{}'", s)))
    }
}

/// Lower-cases and strips `-` / `_` so naming styles compare equal.
pub(crate) fn normalize_name(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

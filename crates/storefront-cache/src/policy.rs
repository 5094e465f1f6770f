//! TTL policy table.

use crate::ResourceCategory;
use std::collections::BTreeMap;
use std::time::Duration;
use storefront_config::CacheConfig;
use storefront_core::{StorefrontError, StorefrontResult};

/// Maps every [`ResourceCategory`] to the lifetime of its entries.
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtlPolicy {
    ttls: [Duration; ResourceCategory::COUNT],
}

impl TtlPolicy {
    /// Creates the table from the built-in defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ttls: ResourceCategory::ALL.map(|category| category.default_ttl()),
        }
    }

    /// Creates the table from the defaults plus overrides in seconds, keyed
    /// by category name.
    ///
    /// Unknown category names, zero TTLs and TTLs above
    /// [`CacheConfig::MAX_TTL_SECS`] are configuration errors.
    pub fn with_overrides(overrides: &BTreeMap<String, u64>) -> StorefrontResult<Self> {
        let mut policy = Self::new();
        for (name, secs) in overrides {
            let category: ResourceCategory = name.parse()?;
            if *secs == 0 {
                return Err(StorefrontError::Configuration(format!(
                    "TTL override for '{}' must be positive",
                    category
                )));
            }
            if *secs > CacheConfig::MAX_TTL_SECS {
                return Err(StorefrontError::Configuration(format!(
                    "TTL override for '{}' exceeds {}s",
                    category,
                    CacheConfig::MAX_TTL_SECS
                )));
            }
            policy.ttls[category.index()] = Duration::from_secs(*secs);
        }
        Ok(policy)
    }

    /// Returns the lifetime for `category`.
    #[must_use]
    pub fn ttl_for(&self, category: ResourceCategory) -> Duration {
        self.ttls[category.index()]
    }

    /// Parses `name` and returns its lifetime.
    pub fn ttl_for_name(&self, name: &str) -> StorefrontResult<Duration> {
        Ok(self.ttl_for(name.parse()?))
    }

    /// Iterates `(category, ttl)` in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceCategory, Duration)> + '_ {
        ResourceCategory::ALL
            .into_iter()
            .map(move |category| (category, self.ttl_for(category)))
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self::new()
    }
}

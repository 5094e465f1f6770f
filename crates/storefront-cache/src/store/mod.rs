//! Key-value store abstraction behind the cache layer.
//!
//! Values are opaque JSON strings so the trait stays object-safe and one
//! `Arc<dyn CacheStore>` can serve every entity type.

mod memory;
mod redis;

pub use memory::InMemoryCacheStore;
pub use redis::{RedisCacheStore, RedisCacheStoreParameters, DEFAULT_SCAN_COUNT};

use async_trait::async_trait;
use shaku::Interface;
use std::time::Duration;
use storefront_core::StorefrontResult;

/// A shared key-value store with per-entry expiry.
///
/// Every operation is a network round-trip in production and may fail or
/// stall. Callers bound each call with a timeout and treat failures as
/// misses.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheStore: Interface + Send + Sync {
    /// Returns the stored value, or `None` if the key is absent or expired.
    async fn get_raw(&self, key: &str) -> StorefrontResult<Option<String>>;

    /// Stores `value` under `key`, expiring after `ttl`.
    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> StorefrontResult<()>;

    /// Deletes every key matching the glob `pattern` and returns how many
    /// were removed. A pattern without metacharacters deletes one key.
    async fn delete_pattern(&self, pattern: &str) -> StorefrontResult<u64>;

    /// Round-trips to the store.
    async fn ping(&self) -> StorefrontResult<()>;

    /// Returns false for a store that is configured off and acts as an
    /// always-empty cache.
    fn is_enabled(&self) -> bool;
}

/// Returns true if `pattern` contains glob metacharacters.
pub(crate) fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

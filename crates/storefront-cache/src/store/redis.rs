//! Redis-backed store.

use super::CacheStore;
use async_trait::async_trait;
use deadpool_redis::{
    redis::{cmd, AsyncCommands},
    Pool,
};
use shaku::Component;
use std::sync::Arc;
use std::time::Duration;
use storefront_core::{StorefrontError, StorefrontResult};
use tracing::debug;

/// Keys requested per SCAN round-trip.
pub const DEFAULT_SCAN_COUNT: usize = 500;

/// A [`CacheStore`] over a deadpool Redis connection pool.
#[derive(Component)]
#[shaku(interface = CacheStore)]
pub struct RedisCacheStore {
    /// Connection pool; `None` when Redis is configured off.
    pool: Option<Arc<Pool>>,
    #[shaku(default = DEFAULT_SCAN_COUNT)]
    scan_count: usize,
}

impl RedisCacheStore {
    /// Creates a store over `pool`.
    #[must_use]
    pub fn new(pool: Arc<Pool>) -> Self {
        Self {
            pool: Some(pool),
            scan_count: DEFAULT_SCAN_COUNT,
        }
    }

    /// Creates a store that never holds anything (for when Redis is
    /// disabled). Reads miss, writes and deletes are no-ops.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            pool: None,
            scan_count: DEFAULT_SCAN_COUNT,
        }
    }

    /// Sets the SCAN batch hint.
    #[must_use]
    pub fn with_scan_count(mut self, scan_count: usize) -> Self {
        self.scan_count = scan_count.max(1);
        self
    }

    async fn get_conn(&self) -> StorefrontResult<deadpool_redis::Connection> {
        match &self.pool {
            Some(pool) => pool.get().await.map_err(|e| {
                StorefrontError::StoreUnavailable(format!("Failed to get Redis connection: {}", e))
            }),
            None => Err(StorefrontError::StoreUnavailable("Cache store is disabled".to_string())),
        }
    }
}

impl std::fmt::Debug for RedisCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheStore")
            .field("enabled", &self.pool.is_some())
            .field("scan_count", &self.scan_count)
            .finish()
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    fn is_enabled(&self) -> bool {
        self.pool.is_some()
    }

    async fn get_raw(&self, key: &str) -> StorefrontResult<Option<String>> {
        if !self.is_enabled() {
            return Ok(None);
        }

        let mut conn = self.get_conn().await?;
        let value: Option<String> = conn.get(key).await.map_err(|e| {
            StorefrontError::StoreUnavailable(format!("Failed to get key '{}': {}", key, e))
        })?;

        Ok(value)
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> StorefrontResult<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let mut conn = self.get_conn().await?;
        let ttl_secs = ttl.as_secs().max(1);

        conn.set_ex::<_, _, ()>(key, value, ttl_secs).await.map_err(|e| {
            StorefrontError::StoreUnavailable(format!("Failed to set key '{}': {}", key, e))
        })?;

        debug!("Stored key '{}' with TTL {}s", key, ttl_secs);
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> StorefrontResult<u64> {
        if !self.is_enabled() {
            return Ok(0);
        }

        let mut conn = self.get_conn().await?;

        if !super::is_glob(pattern) {
            let deleted: u64 = conn.del(pattern).await.map_err(|e| {
                StorefrontError::StoreUnavailable(format!("Failed to delete key '{}': {}", pattern, e))
            })?;
            return Ok(deleted);
        }

        // SCAN rather than KEYS so a large keyspace never blocks the server.
        let mut cursor: u64 = 0;
        let mut deleted: u64 = 0;
        loop {
            let (next, keys): (u64, Vec<String>) = cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(self.scan_count)
                .query_async(&mut conn)
                .await
                .map_err(|e| StorefrontError::StoreUnavailable(format!("Failed to scan keys: {}", e)))?;

            if !keys.is_empty() {
                let removed: u64 = conn.del(&keys).await.map_err(|e| {
                    StorefrontError::StoreUnavailable(format!("Failed to delete keys: {}", e))
                })?;
                deleted += removed;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        debug!("Deleted {} keys matching pattern '{}'", deleted, pattern);
        Ok(deleted)
    }

    async fn ping(&self) -> StorefrontResult<()> {
        let mut conn = self.get_conn().await?;
        let _: String = cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| StorefrontError::StoreUnavailable(format!("PING failed: {}", e)))?;
        Ok(())
    }
}

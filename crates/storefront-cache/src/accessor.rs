//! Cache-aside reads.

use crate::store::CacheStore;
use crate::timeout::with_timeout;
use crate::{BuiltKey, KeyBuilder, KeyParams};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use storefront_core::StorefrontResult;
use tracing::{debug, warn};

/// Wraps a loader with get / populate / return semantics.
///
/// The store is advisory. A failed or slow read is a miss, a failed write is
/// logged and dropped, and only the loader's own error ever reaches the
/// caller. Concurrent misses on one key each call the loader; there is no
/// single-flight coordination.
#[derive(Clone)]
pub struct CacheAside {
    store: Arc<dyn CacheStore>,
    keys: Arc<KeyBuilder>,
    store_timeout: Duration,
    enabled: bool,
}

impl CacheAside {
    /// Creates an accessor. With `enabled == false` every call goes straight
    /// to the loader and the store is never touched.
    #[must_use]
    pub fn new(store: Arc<dyn CacheStore>, keys: Arc<KeyBuilder>, store_timeout: Duration, enabled: bool) -> Self {
        Self {
            store,
            keys,
            store_timeout,
            enabled,
        }
    }

    /// Returns true if reads consult the store.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the cached value for `params`, or loads, stores, and returns
    /// it.
    pub async fn get_or_load<T, F, Fut>(&self, params: &KeyParams, load: F) -> StorefrontResult<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = StorefrontResult<T>> + Send,
    {
        let key = self.keys.build(params);
        self.get_or_load_key(&key, load).await
    }

    /// Same as [`Self::get_or_load`] for an already built key.
    pub async fn get_or_load_key<T, F, Fut>(&self, key: &BuiltKey, load: F) -> StorefrontResult<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = StorefrontResult<T>> + Send,
    {
        if !self.enabled {
            return load().await;
        }

        if let Some(cached) = self.lookup::<T>(key).await {
            debug!("Cache hit for key '{}'", key.key);
            return Ok(cached);
        }
        debug!("Cache miss for key '{}'", key.key);

        let value = load().await?;
        self.populate(key, &value).await;
        Ok(value)
    }

    async fn lookup<T: DeserializeOwned>(&self, key: &BuiltKey) -> Option<T> {
        match with_timeout(self.store_timeout, || self.store.get_raw(&key.key)).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Ignoring unreadable cache entry '{}': {}", key.key, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Cache read for '{}' failed, loading from source: {}", key.key, e);
                None
            }
        }
    }

    async fn populate<T: Serialize + Sync>(&self, key: &BuiltKey, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Not caching '{}', value does not serialize: {}", key.key, e);
                return;
            }
        };

        if let Err(e) = with_timeout(self.store_timeout, || self.store.set_raw(&key.key, &raw, key.ttl)).await {
            warn!("Cache write for '{}' failed: {}", key.key, e);
        }
    }
}

impl std::fmt::Debug for CacheAside {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheAside")
            .field("enabled", &self.enabled)
            .field("store_timeout", &self.store_timeout)
            .finish_non_exhaustive()
    }
}

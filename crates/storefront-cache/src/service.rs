//! The cache bundle handed to request handlers.

use crate::store::CacheStore;
use crate::{
    BuiltKey, CacheAside, ChangeEvent, InvalidationEngine, InvalidationListener, InvalidationPublisher,
    InvalidationReport, KeyBuilder, KeyParams, ResourceCategory, StoreHealthCheck, TtlPolicy,
};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use storefront_config::CacheConfig;
use storefront_core::StorefrontResult;
use tracing::info;

/// Key builder, TTL policy, accessor and invalidation engine around one
/// shared store handle.
///
/// Built once at startup and cloned into whatever needs it; every clone
/// shares the same store.
#[derive(Clone)]
pub struct StorefrontCache {
    keys: Arc<KeyBuilder>,
    accessor: CacheAside,
    engine: InvalidationEngine,
    store: Arc<dyn CacheStore>,
    store_timeout: Duration,
}

impl StorefrontCache {
    /// Builds the bundle from the cache section of the configuration.
    ///
    /// Fails on an invalid namespace or TTL override.
    pub fn new(store: Arc<dyn CacheStore>, config: &CacheConfig) -> StorefrontResult<Self> {
        let keys = Arc::new(KeyBuilder::from_config(config)?);
        let accessor = CacheAside::new(Arc::clone(&store), Arc::clone(&keys), config.store_timeout(), config.enabled);
        let engine = InvalidationEngine::new(Arc::clone(&store), Arc::clone(&keys), config.invalidation_timeout());

        info!(
            namespace = keys.namespace(),
            enabled = config.enabled,
            store_enabled = store.is_enabled(),
            "Storefront cache initialized"
        );

        Ok(Self {
            keys,
            accessor,
            engine,
            store,
            store_timeout: config.store_timeout(),
        })
    }

    /// Builds the key and TTL for `params`.
    #[must_use]
    pub fn key(&self, params: &KeyParams) -> BuiltKey {
        self.keys.build(params)
    }

    /// Builds the key and TTL from a category name and JSON parameters.
    pub fn key_dynamic(&self, category: &str, params: serde_json::Value) -> StorefrontResult<BuiltKey> {
        self.keys.build_dynamic(category, params)
    }

    /// Returns the lifetime for `category`.
    #[must_use]
    pub fn ttl_for(&self, category: ResourceCategory) -> Duration {
        self.keys.ttl_for(category)
    }

    /// Returns the TTL table.
    #[must_use]
    pub fn policy(&self) -> &TtlPolicy {
        self.keys.policy()
    }

    /// See [`CacheAside::get_or_load`].
    pub async fn get_or_load<T, F, Fut>(&self, params: &KeyParams, load: F) -> StorefrontResult<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = StorefrontResult<T>> + Send,
    {
        self.accessor.get_or_load(params, load).await
    }

    /// See [`InvalidationEngine::invalidate`].
    pub async fn invalidate(&self, event: &ChangeEvent) -> InvalidationReport {
        self.engine.invalidate(event).await
    }

    /// Returns the patterns `event` would delete, without deleting them.
    #[must_use]
    pub fn patterns_for(&self, event: &ChangeEvent) -> Vec<String> {
        self.engine.patterns_for(event)
    }

    /// Creates a publisher and a listener feeding this cache's engine.
    #[must_use]
    pub fn listener(&self, capacity: usize) -> (InvalidationPublisher, InvalidationListener) {
        InvalidationListener::channel(self.engine.clone(), capacity)
    }

    /// Returns a health check over the shared store.
    #[must_use]
    pub fn health_check(&self) -> StoreHealthCheck {
        StoreHealthCheck::new(Arc::clone(&self.store), self.store_timeout)
    }

    /// Returns the shared store handle.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }
}

impl std::fmt::Debug for StorefrontCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontCache")
            .field("namespace", &self.keys.namespace())
            .field("accessor", &self.accessor)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

//! Dependency injection module using Shaku.
//!
//! Two modules provide the shared [`CacheStore`] handle:
//! - `RedisCacheModule`: deadpool Redis pool behind [`RedisCacheStore`]
//! - `MemoryCacheModule`: in-process [`InMemoryCacheStore`]

use std::sync::Arc;
use storefront_cache::{CacheStore, InMemoryCacheStore, RedisCacheStore, RedisCacheStoreParameters, StorefrontCache};
use storefront_cache::store::DEFAULT_SCAN_COUNT;
use storefront_config::{AppConfig, RedisConfig};
use storefront_core::{module, HasComponent, StorefrontError, StorefrontResult};
use tracing::info;

module! {
    pub RedisCacheModule {
        components = [RedisCacheStore],
        providers = []
    }
}

module! {
    pub MemoryCacheModule {
        components = [InMemoryCacheStore],
        providers = []
    }
}

/// Builds the Redis module. With `redis.enabled == false` the store is
/// wired without a pool and every call is a no-op.
pub fn build_redis_module(redis_config: &RedisConfig) -> StorefrontResult<Arc<RedisCacheModule>> {
    let pool = if redis_config.enabled {
        let mut redis_cfg = deadpool_redis::Config::from_url(&redis_config.url);
        redis_cfg.pool = Some(deadpool_redis::PoolConfig::new(redis_config.pool_size as usize));
        let pool = redis_cfg
            .create_pool(Some(deadpool_redis::Runtime::Tokio1))
            .map_err(|e| StorefrontError::StoreUnavailable(format!("Failed to create Redis pool: {}", e)))?;
        Some(Arc::new(pool))
    } else {
        None
    };

    let module = RedisCacheModule::builder()
        .with_component_parameters::<RedisCacheStore>(RedisCacheStoreParameters {
            pool,
            scan_count: DEFAULT_SCAN_COUNT,
        })
        .build();

    Ok(Arc::new(module))
}

/// Builds the in-process module.
#[must_use]
pub fn build_memory_module() -> Arc<MemoryCacheModule> {
    Arc::new(MemoryCacheModule::builder().build())
}

/// Resolves the store handle from any module that provides one.
pub trait StoreResolver {
    /// Resolves the shared cache store.
    fn cache_store(&self) -> Arc<dyn CacheStore>;
}

impl StoreResolver for RedisCacheModule {
    fn cache_store(&self) -> Arc<dyn CacheStore> {
        self.resolve()
    }
}

impl StoreResolver for MemoryCacheModule {
    fn cache_store(&self) -> Arc<dyn CacheStore> {
        self.resolve()
    }
}

/// Wires the store selected by `config` (or the in-process one when
/// `memory` is set) into a [`StorefrontCache`].
pub fn build_cache(config: &AppConfig, memory: bool) -> StorefrontResult<StorefrontCache> {
    let store = if memory {
        info!("Using in-process cache store");
        build_memory_module().cache_store()
    } else {
        info!("Using Redis cache store at {}", config.redis.url);
        build_redis_module(&config.redis)?.cache_store()
    };

    StorefrontCache::new(store, &config.cache)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_memory_module_resolves_shared_store() {
        let module = build_memory_module();
        let first = module.cache_store();
        let second = module.cache_store();

        first.set_raw("k", "v", Duration::from_secs(60)).await.unwrap();
        assert_eq!(second.get_raw("k").await.unwrap(), Some("v".to_string()));
    }

    #[test]
    fn test_disabled_redis_module_resolves_disabled_store() {
        let config = RedisConfig {
            enabled: false,
            ..RedisConfig::default()
        };
        let store = build_redis_module(&config).unwrap().cache_store();
        assert!(!store.is_enabled());
    }

    #[test]
    fn test_redis_pool_is_created_lazily() {
        let config = RedisConfig {
            url: "redis://127.0.0.1:1".to_string(),
            ..RedisConfig::default()
        };
        let store = build_redis_module(&config).unwrap().cache_store();
        assert!(store.is_enabled());
    }

    #[test]
    fn test_build_cache_rejects_invalid_namespace() {
        let mut config = AppConfig::default();
        config.cache.namespace = "shop:*".to_string();
        let err = build_cache(&config, true).unwrap_err();
        assert!(matches!(err, StorefrontError::Configuration(_)));
    }
}

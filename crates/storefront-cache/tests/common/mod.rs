//! Shared fixtures for the cache integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use storefront_cache::{CacheStore, InMemoryCacheStore, StorefrontCache};
use storefront_config::CacheConfig;
use storefront_core::{StorefrontError, StorefrontResult};

/// A store whose every call fails, as if the server were unreachable.
#[derive(Default)]
pub struct FailingStore {
    pub calls: AtomicUsize,
}

#[async_trait]
impl CacheStore for FailingStore {
    async fn get_raw(&self, _key: &str) -> StorefrontResult<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StorefrontError::store_unavailable("connection refused"))
    }

    async fn set_raw(&self, _key: &str, _value: &str, _ttl: Duration) -> StorefrontResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StorefrontError::store_unavailable("connection refused"))
    }

    async fn delete_pattern(&self, _pattern: &str) -> StorefrontResult<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StorefrontError::store_unavailable("connection refused"))
    }

    async fn ping(&self) -> StorefrontResult<()> {
        Err(StorefrontError::store_unavailable("connection refused"))
    }

    fn is_enabled(&self) -> bool {
        true
    }
}

/// A store that never answers within any reasonable budget.
pub struct StalledStore;

#[async_trait]
impl CacheStore for StalledStore {
    async fn get_raw(&self, _key: &str) -> StorefrontResult<Option<String>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(None)
    }

    async fn set_raw(&self, _key: &str, _value: &str, _ttl: Duration) -> StorefrontResult<()> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }

    async fn delete_pattern(&self, _pattern: &str) -> StorefrontResult<u64> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(0)
    }

    async fn ping(&self) -> StorefrontResult<()> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        true
    }
}

/// Counts loader invocations.
#[derive(Clone, Default)]
pub struct LoadCounter(Arc<AtomicUsize>);

impl LoadCounter {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// A cache over a fresh in-memory store, plus a handle to that store.
pub fn memory_cache() -> (StorefrontCache, Arc<InMemoryCacheStore>) {
    memory_cache_with(&CacheConfig::default())
}

pub fn memory_cache_with(config: &CacheConfig) -> (StorefrontCache, Arc<InMemoryCacheStore>) {
    let store = Arc::new(InMemoryCacheStore::new());
    let cache = StorefrontCache::new(store.clone(), config).expect("valid cache config");
    (cache, store)
}

pub fn cache_over(store: Arc<dyn CacheStore>) -> StorefrontCache {
    StorefrontCache::new(store, &CacheConfig::default()).expect("valid cache config")
}

//! Store health check.

use crate::store::CacheStore;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use storefront_core::{HealthCheck, HealthStatus};

/// Reports whether the shared store answers within its budget.
///
/// A disabled or unreachable store only degrades latency, never
/// correctness, so callers may keep serving on `Unhealthy`.
pub struct StoreHealthCheck {
    store: Arc<dyn CacheStore>,
    timeout: Duration,
}

impl StoreHealthCheck {
    #[must_use]
    pub fn new(store: Arc<dyn CacheStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }
}

#[async_trait]
impl HealthCheck for StoreHealthCheck {
    fn name(&self) -> &str {
        "cache-store"
    }

    async fn check(&self) -> HealthStatus {
        if !self.store.is_enabled() {
            return HealthStatus::Degraded("cache store disabled".to_string());
        }
        match crate::timeout::with_timeout(self.timeout, || self.store.ping()).await {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        }
    }
}

//! Timeout wrapper for store round-trips.

use std::time::Duration;
use storefront_core::StorefrontError;

/// Runs `f` under `duration`, mapping expiry to [`StorefrontError::Timeout`].
pub async fn with_timeout<F, Fut, T>(duration: Duration, f: F) -> Result<T, StorefrontError>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, StorefrontError>>,
{
    tokio::time::timeout(duration, f())
        .await
        .map_err(|_| StorefrontError::Timeout(format!("Store call timed out after {:?}", duration)))?
}

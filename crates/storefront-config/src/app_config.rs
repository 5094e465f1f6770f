//! Application configuration structures.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name and metadata.
    #[serde(default)]
    pub app: AppMetadata,

    /// Redis configuration.
    #[serde(default)]
    pub redis: RedisConfig,

    /// Cache layer configuration.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Application metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppMetadata {
    /// Application name.
    pub name: String,
    /// Application version.
    pub version: String,
    /// Environment (development, staging, production).
    pub environment: String,
}

impl Default for AppMetadata {
    fn default() -> Self {
        Self {
            name: "storefront".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Redis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Redis URL.
    pub url: String,
    /// Connection pool size.
    pub pool_size: u32,
    /// Enable Redis. When disabled the cache runs against an in-process
    /// store instead.
    pub enabled: bool,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            pool_size: 10,
            enabled: true,
        }
    }
}

/// Cache layer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable caching. When disabled every read goes to the system of record.
    pub enabled: bool,
    /// Prefix shared by every cache key, e.g. `storefront:cache`.
    pub namespace: String,
    /// Budget for a single store round-trip in milliseconds.
    pub store_timeout_ms: u64,
    /// Budget for one pattern delete during invalidation in milliseconds.
    /// Pattern deletes scan the keyspace, so this is looser than
    /// `store_timeout_ms`.
    pub invalidation_timeout_ms: u64,
    /// Per-category TTL overrides in seconds, keyed by category name
    /// (`product-list`, `cart`, ...).
    pub ttl_overrides: BTreeMap<String, u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            namespace: "storefront:cache".to_string(),
            store_timeout_ms: 100,
            invalidation_timeout_ms: 500,
            ttl_overrides: BTreeMap::new(),
        }
    }
}

impl CacheConfig {
    /// Longest TTL an override may set, in seconds (30 days).
    pub const MAX_TTL_SECS: u64 = 30 * 24 * 60 * 60;

    /// Returns the store timeout as a Duration.
    #[must_use]
    pub const fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Returns the per-pattern invalidation timeout as a Duration.
    #[must_use]
    pub const fn invalidation_timeout(&self) -> Duration {
        Duration::from_millis(self.invalidation_timeout_ms)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Log format (json, pretty).
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

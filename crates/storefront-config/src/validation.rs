//! Configuration validation module.
//!
//! Validates every configuration value at startup, failing fast on invalid
//! configuration rather than at request time.

use crate::AppConfig;
use std::fmt;

/// Configuration validation error variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// Pool size must be between 1 and the maximum.
    InvalidPoolSize { value: u32, maximum: u32 },
    /// URL format is invalid.
    InvalidUrl { url_type: String, message: String },
    /// Key namespace is empty or contains glob metacharacters.
    InvalidNamespace { value: String },
    /// Timeout value must be positive.
    NonPositiveTimeout { name: String },
    /// Timeout value exceeds the allowed bound.
    TimeoutTooLarge { name: String, value: u64, maximum: u64 },
    /// TTL override must be positive.
    NonPositiveTtl { category: String },
    /// TTL override exceeds the allowed bound.
    TtlTooLarge { category: String, value: u64, maximum: u64 },
    /// Log level is invalid.
    InvalidLogLevel { value: String },
    /// Log format is invalid.
    InvalidLogFormat { value: String },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPoolSize { value, maximum } => {
                write!(f, "Invalid redis pool_size: {} (must be between 1 and {})", value, maximum)
            }
            Self::InvalidUrl { url_type, message } => {
                write!(f, "Invalid {} URL: {}", url_type, message)
            }
            Self::InvalidNamespace { value } => {
                write!(
                    f,
                    "Invalid cache namespace '{}': must be non-empty and free of '*', '?', '[', ']'",
                    value
                )
            }
            Self::NonPositiveTimeout { name } => {
                write!(f, "Timeout '{}' must be positive", name)
            }
            Self::TimeoutTooLarge { name, value, maximum } => {
                write!(f, "Timeout '{}' is {} (maximum {})", name, value, maximum)
            }
            Self::NonPositiveTtl { category } => {
                write!(f, "TTL override for '{}' must be positive", category)
            }
            Self::TtlTooLarge { category, value, maximum } => {
                write!(f, "TTL override for '{}' is {}s (maximum {}s)", category, value, maximum)
            }
            Self::InvalidLogLevel { value } => {
                write!(
                    f,
                    "Invalid log level: '{}' (valid: trace, debug, info, warn, error)",
                    value
                )
            }
            Self::InvalidLogFormat { value } => {
                write!(f, "Invalid log format: '{}' (valid: pretty, json)", value)
            }
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Maximum connection pool size.
    const MAX_POOL_SIZE: u32 = 1000;
    /// Upper bound on a single store round-trip. Cache calls must never hold
    /// a request for longer than this.
    const MAX_STORE_TIMEOUT_MS: u64 = 2_000;
    /// Upper bound on a single pattern delete.
    const MAX_INVALIDATION_TIMEOUT_MS: u64 = 30_000;
    /// Valid log levels.
    const VALID_LOG_LEVELS: &'static [&'static str] = &["trace", "debug", "info", "warn", "error"];
    /// Valid log formats.
    const VALID_LOG_FORMATS: &'static [&'static str] = &["pretty", "json"];

    /// Validates the entire application configuration.
    ///
    /// Returns Ok(()) if valid, or Err with all validation errors found.
    pub fn validate(config: &AppConfig) -> Result<(), Vec<ConfigValidationError>> {
        let mut errors = Vec::new();

        Self::validate_redis(&config.redis, &mut errors);
        Self::validate_cache(&config.cache, &mut errors);
        Self::validate_observability(&config.observability, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validates Redis configuration.
    fn validate_redis(config: &crate::RedisConfig, errors: &mut Vec<ConfigValidationError>) {
        if !config.enabled {
            return;
        }

        if !config.url.starts_with("redis://") && !config.url.starts_with("rediss://") {
            errors.push(ConfigValidationError::InvalidUrl {
                url_type: "redis".to_string(),
                message: "URL must start with redis:// or rediss://".to_string(),
            });
        }

        if config.pool_size == 0 || config.pool_size > Self::MAX_POOL_SIZE {
            errors.push(ConfigValidationError::InvalidPoolSize {
                value: config.pool_size,
                maximum: Self::MAX_POOL_SIZE,
            });
        }
    }

    /// Validates cache layer configuration.
    fn validate_cache(config: &crate::CacheConfig, errors: &mut Vec<ConfigValidationError>) {
        let namespace = config.namespace.trim();
        if namespace.is_empty() || namespace.contains(['*', '?', '[', ']']) {
            errors.push(ConfigValidationError::InvalidNamespace {
                value: config.namespace.clone(),
            });
        }

        Self::validate_timeout(
            "cache.store_timeout_ms",
            config.store_timeout_ms,
            Self::MAX_STORE_TIMEOUT_MS,
            errors,
        );
        Self::validate_timeout(
            "cache.invalidation_timeout_ms",
            config.invalidation_timeout_ms,
            Self::MAX_INVALIDATION_TIMEOUT_MS,
            errors,
        );

        // Category names are checked when the TTL policy is built; only the
        // values are checked here.
        for (category, secs) in &config.ttl_overrides {
            if *secs == 0 {
                errors.push(ConfigValidationError::NonPositiveTtl {
                    category: category.clone(),
                });
            } else if *secs > crate::CacheConfig::MAX_TTL_SECS {
                errors.push(ConfigValidationError::TtlTooLarge {
                    category: category.clone(),
                    value: *secs,
                    maximum: crate::CacheConfig::MAX_TTL_SECS,
                });
            }
        }
    }

    fn validate_timeout(name: &str, value: u64, maximum: u64, errors: &mut Vec<ConfigValidationError>) {
        if value == 0 {
            errors.push(ConfigValidationError::NonPositiveTimeout {
                name: name.to_string(),
            });
        } else if value > maximum {
            errors.push(ConfigValidationError::TimeoutTooLarge {
                name: name.to_string(),
                value,
                maximum,
            });
        }
    }

    /// Validates observability configuration.
    fn validate_observability(
        config: &crate::ObservabilityConfig,
        errors: &mut Vec<ConfigValidationError>,
    ) {
        if !Self::VALID_LOG_LEVELS.contains(&config.log_level.to_lowercase().as_str()) {
            errors.push(ConfigValidationError::InvalidLogLevel {
                value: config.log_level.clone(),
            });
        }
        if !Self::VALID_LOG_FORMATS.contains(&config.log_format.to_lowercase().as_str()) {
            errors.push(ConfigValidationError::InvalidLogFormat {
                value: config.log_format.clone(),
            });
        }
    }
}

//! Configuration loader with layered sources.

use crate::{AppConfig, ConfigValidator};
use config::{Config, ConfigError, Environment, File};
use std::path::{Path, PathBuf};
use storefront_core::{StorefrontError, StorefrontResult};
use tracing::{debug, info};

/// Loads [`AppConfig`] once at startup.
///
/// Configuration is static for the life of the process: the cache taxonomy
/// and TTL table are built from it exactly once.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_dir: PathBuf,
    environment: Option<String>,
}

impl ConfigLoader {
    /// Creates a loader reading from `config_dir`.
    ///
    /// Configuration is loaded from multiple sources in order:
    /// 1. `{config_dir}/default.toml` - Default values
    /// 2. `{config_dir}/{environment}.toml` - Environment-specific overrides
    /// 3. `{config_dir}/local.toml` - Uncommitted local overrides
    /// 4. Environment variables with `STOREFRONT_` prefix, `__` between
    ///    sections (`STOREFRONT_CACHE__STORE_TIMEOUT_MS=50`)
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            environment: None,
        }
    }

    /// Creates a loader for the default location (`./config`).
    #[must_use]
    pub fn from_default_location() -> Self {
        Self::new("./config")
    }

    /// Pins the environment name instead of reading `STOREFRONT_ENVIRONMENT`.
    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Loads, merges, and validates the configuration.
    pub fn load(&self) -> StorefrontResult<AppConfig> {
        // Load .env file if present
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let environment = self.environment.clone().unwrap_or_else(|| {
            std::env::var("STOREFRONT_ENVIRONMENT").unwrap_or_else(|_| "development".to_string())
        });

        info!("Loading configuration for environment: {}", environment);

        let mut builder = Config::builder();

        for name in ["default", environment.as_str(), "local"] {
            let path = self.config_dir.join(format!("{}.toml", name));
            if path.exists() {
                debug!("Loading config layer from: {}", path.display());
                builder = builder.add_source(File::from(path.as_path()).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("STOREFRONT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut app_config: AppConfig = builder
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(config_error_to_storefront_error)?;

        app_config.app.environment = environment;

        ConfigValidator::validate(&app_config).map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            StorefrontError::Configuration(messages.join("; "))
        })?;

        Ok(app_config)
    }

    /// Returns the directory this loader reads from.
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }
}

fn config_error_to_storefront_error(err: ConfigError) -> StorefrontError {
    StorefrontError::Configuration(err.to_string())
}

//! # Storefront Config
//!
//! Configuration management for the storefront cache layer.
//! Supports layered configuration from files and environment variables,
//! validation of every value up front, and logging initialisation.

mod app_config;
mod loader;
mod logging;
mod validation;

pub use app_config::*;
pub use loader::*;
pub use logging::*;
pub use validation::*;

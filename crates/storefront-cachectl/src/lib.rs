//! # Storefront Cache Control
//!
//! Operational tooling for the storefront cache: build keys from dynamic
//! input, inspect the TTL table, issue invalidations and check the store.

pub mod cli;
pub mod commands;
pub mod di;

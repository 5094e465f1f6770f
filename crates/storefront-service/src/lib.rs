//! # Storefront Service
//!
//! Application services for the storefront. Reads go through
//! [`StorefrontCache`](storefront_cache::StorefrontCache); every mutation
//! commits to its repository first and then invalidates exactly once.

pub mod account_service;
pub mod catalog_service;
pub mod order_service;
pub mod repository;

#[cfg(test)]
mod testing;

pub use account_service::*;
pub use catalog_service::*;
pub use order_service::*;
pub use repository::*;

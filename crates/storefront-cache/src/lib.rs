//! # Storefront Cache
//!
//! Read-through cache layer sitting between the storefront's request
//! handlers and its system of record.
//!
//! - [`ResourceCategory`] and [`TtlPolicy`] define the keyspace taxonomy and
//!   how long each kind of data may live.
//! - [`KeyBuilder`] turns typed request parameters into deterministic keys.
//! - [`CacheAside`] wraps a loader with get / populate / return semantics.
//! - [`InvalidationEngine`] expands a [`ChangeEvent`] into key patterns and
//!   deletes them.
//! - [`StorefrontCache`] bundles all of the above around one shared
//!   [`CacheStore`] handle.
//!
//! The layer is strictly additive: if every store call fails, every read
//! still returns the loader's result.

mod accessor;
mod category;
mod health;
mod invalidation;
mod keys;
mod listener;
mod policy;
mod service;
pub mod store;
mod timeout;

pub use accessor::CacheAside;
pub use category::ResourceCategory;
pub use health::StoreHealthCheck;
pub use invalidation::{ChangeEvent, EventKind, InvalidationEngine, InvalidationReport, PatternTemplate, Scope};
pub use keys::*;
pub use listener::{InvalidationListener, InvalidationPublisher};
pub use policy::TtlPolicy;
pub use service::StorefrontCache;
pub use store::{CacheStore, InMemoryCacheStore, RedisCacheStore, RedisCacheStoreParameters};

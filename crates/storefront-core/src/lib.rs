//! # Storefront Core
//!
//! Core types, traits, and error definitions shared by every layer of the
//! storefront: the typed identifiers that appear in cache keys, pagination
//! defaults, the domain entities served through the cache, and the unified
//! error taxonomy.

pub mod domain;
pub mod error;
pub mod id;
pub mod pagination;
pub mod result;
pub mod traits;

pub use domain::*;
pub use error::*;
pub use id::*;
pub use pagination::*;
pub use result::*;
pub use traits::*;

// Re-export shaku for dependency injection
pub use shaku::{module, HasComponent, Interface};

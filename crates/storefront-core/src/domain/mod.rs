//! # Storefront Domain
//!
//! The entities the storefront serves. These are the payload shapes the
//! cache stores verbatim; the cache layer never inspects them.

pub mod catalog;
pub mod order;
pub mod user;

pub use catalog::*;
pub use order::*;
pub use user::*;

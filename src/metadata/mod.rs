//! Catalog discovery and the discovered-object model.

pub mod discover;
pub mod types;

pub use discover::*;
pub use types::*;

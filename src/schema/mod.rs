//! Per-object schema fragments and the process-wide fragment registry.

pub mod fragment;
pub mod registry;

pub use fragment::*;
pub use registry::*;

//! Safe T-SQL synthesis: identifiers from catalog metadata only, values as parameters.

mod builder;
pub mod params;

pub use builder::*;
pub use params::*;

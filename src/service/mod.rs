//! Execution layer: pooled connections and JSON row conversion.

mod exec;

pub use exec::Executor;

/// One pool per configured endpoint; handlers check out one connection per
/// request and never coordinate with each other.
pub type MssqlPool = bb8::Pool<bb8_tiberius::ConnectionManager>;

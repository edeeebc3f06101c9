//! tablegate: discovery-driven REST gateway for SQL Server.
//!
//! Inspects the catalog of each configured endpoint, discovers objects
//! matching include patterns, and synthesizes REST operations plus schema
//! fragments for them, with trigger-aware SQL generation for writes.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metadata;
pub mod pattern;
pub mod registrar;
pub mod response;
pub mod routes;
pub mod schema;
pub mod service;
pub mod sql;
pub mod state;
pub mod template;
pub mod typemap;

pub use config::{load_config, EndpointConfig, GatewayConfig};
pub use error::{AppError, ConfigError, DiscoveryError};
pub use metadata::{discover_endpoint, EndpointCatalog, ObjectKind};
pub use registrar::{register_endpoint, RouteKey, RouteTable, RouteTarget};
pub use routes::{api_routes, common_routes};
pub use schema::SchemaRegistry;
pub use service::{Executor, MssqlPool};
pub use state::{AppState, EndpointRuntime};

//! Shared application state: endpoint runtimes, the route table, and the
//! fragment registry. All built once before the server binds; only the
//! registry is mutable (append-only) afterwards.

use crate::registrar::RouteTable;
use crate::schema::SchemaRegistry;
use crate::service::MssqlPool;
use std::collections::HashMap;
use std::sync::Arc;

pub struct EndpointRuntime {
    pub name: String,
    pub pool: MssqlPool,
    /// Whether the ad-hoc template route is enabled for this endpoint.
    pub advanced: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub endpoints: Arc<HashMap<String, EndpointRuntime>>,
    pub routes: Arc<RouteTable>,
    pub registry: SchemaRegistry,
}

impl AppState {
    pub fn endpoint(&self, name: &str) -> Option<&EndpointRuntime> {
        self.endpoints.get(name)
    }
}

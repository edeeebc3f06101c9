//! Raw config types matching the JSON config file.

use crate::metadata::ObjectKind;
use serde::{Deserialize, Serialize};

/// One logical endpoint: a database connection plus include patterns per
/// object kind. A kind with an empty pattern list discovers nothing (opt-in).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub name: String,
    /// ADO.NET-style connection string.
    pub connection: String,
    #[serde(default)]
    pub tables: Vec<String>,
    #[serde(default)]
    pub views: Vec<String>,
    #[serde(default)]
    pub procedures: Vec<String>,
    #[serde(default)]
    pub functions: Vec<String>,
    /// Enables the ad-hoc template route for this endpoint.
    #[serde(default)]
    pub advanced: bool,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

fn default_pool_size() -> u32 {
    5
}

impl EndpointConfig {
    pub fn patterns_for(&self, kind: ObjectKind) -> &[String] {
        match kind {
            ObjectKind::Table => &self.tables,
            ObjectKind::View => &self.views,
            ObjectKind::Procedure => &self.procedures,
            ObjectKind::Function => &self.functions,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
    #[serde(default = "default_listen")]
    pub listen: String,
}

fn default_listen() -> String {
    "0.0.0.0:3000".to_string()
}

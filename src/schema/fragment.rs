//! Schema fragments: the machine-readable per-object contract consumed by
//! the external document assembler. The `kind` tag is the single source of
//! truth for classifying an object downstream.

use crate::metadata::{ObjectKind, RoutineMetadata, TableMetadata};
use crate::typemap::map_type;
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaFragment {
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_pk: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_view: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proc_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proc_schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_return: Option<String>,
    pub properties: serde_json::Map<String, Value>,
}

/// Registry key: `{endpoint}_{name}`.
pub fn fragment_key(endpoint: &str, name: &str) -> String {
    format!("{}_{}", endpoint, name)
}

pub fn table_fragment(endpoint: &str, table: &TableMetadata) -> (String, SchemaFragment) {
    let mut properties = serde_json::Map::new();
    for c in &table.columns {
        let (_, schema_type) = map_type(&c.data_type, c.max_length, c.precision, c.scale);
        properties.insert(c.name.clone(), schema_type.describe());
    }
    let fragment = SchemaFragment {
        kind: table.kind.as_str().to_string(),
        has_pk: Some(table.single_key().is_some()),
        is_view: Some(table.kind == ObjectKind::View),
        proc_name: None,
        proc_schema: None,
        function_type: None,
        function_return: None,
        properties,
    };
    (fragment_key(endpoint, &table.name), fragment)
}

pub fn routine_fragment(endpoint: &str, routine: &RoutineMetadata) -> (String, SchemaFragment) {
    let mut properties = serde_json::Map::new();
    for p in routine.input_params() {
        let (_, schema_type) = map_type(&p.data_type, p.max_length, p.precision, p.scale);
        properties.insert(p.name.clone(), schema_type.describe());
    }
    let fragment = SchemaFragment {
        kind: routine.kind.as_str().to_string(),
        has_pk: None,
        is_view: None,
        proc_name: Some(routine.name.clone()),
        proc_schema: Some(routine.schema.clone()),
        function_type: routine.function_kind.map(|k| k.as_str().to_string()),
        function_return: routine.function_return.clone(),
        properties,
    };
    (fragment_key(endpoint, &routine.name), fragment)
}

/// Synthetic fragment describing the ad-hoc template capability of an
/// endpoint that has it enabled.
pub fn advanced_fragment(endpoint: &str) -> (String, SchemaFragment) {
    let mut properties = serde_json::Map::new();
    properties.insert(
        "data".to_string(),
        serde_json::json!({"type": "string", "format": "base64"}),
    );
    properties.insert("rowLimit".to_string(), serde_json::json!({"type": "integer"}));
    let fragment = SchemaFragment {
        kind: "advanced".to_string(),
        has_pk: None,
        is_view: None,
        proc_name: None,
        proc_schema: None,
        function_type: None,
        function_return: None,
        properties,
    };
    (fragment_key(endpoint, "advanced"), fragment)
}

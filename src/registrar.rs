//! Binds discovered objects to dispatchable routes and schema fragments.
//!
//! The route table is a plain data structure looked up at request time, not
//! a live web-framework route list: axum carries only the generic
//! `/{endpoint}/{kind}/{name}` patterns. Route entries and fragments are
//! inserted by the same loop so the two can never diverge.

use crate::metadata::{EndpointCatalog, ObjectKind, RoutineMetadata, TableMetadata};
use crate::schema::{advanced_fragment, routine_fragment, table_fragment, SchemaFragment, SchemaRegistry};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RouteKey {
    pub endpoint: String,
    pub kind: ObjectKind,
    pub name: String,
}

impl RouteKey {
    pub fn new(endpoint: &str, kind: ObjectKind, name: &str) -> Self {
        RouteKey {
            endpoint: endpoint.to_string(),
            kind,
            name: name.to_string(),
        }
    }
}

#[derive(Clone)]
pub enum RouteTarget {
    Relation(Arc<TableMetadata>),
    Routine(Arc<RoutineMetadata>),
}

#[derive(Default)]
pub struct RouteTable {
    entries: HashMap<RouteKey, RouteTarget>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, endpoint: &str, kind: ObjectKind, name: &str) -> Option<&RouteTarget> {
        self.entries.get(&RouteKey::new(endpoint, kind, name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, key: RouteKey, target: RouteTarget) {
        self.entries.insert(key, target);
    }
}

/// Register everything discovered for one endpoint: one route entry and one
/// fragment per object, plus the synthetic advanced fragment when enabled.
pub fn register_endpoint(
    endpoint: &str,
    advanced: bool,
    catalog: EndpointCatalog,
    routes: &mut RouteTable,
    registry: &SchemaRegistry,
) {
    let mut fragments: Vec<(String, SchemaFragment)> = Vec::new();

    for table in catalog.tables.into_iter().chain(catalog.views) {
        fragments.push(table_fragment(endpoint, &table));
        routes.insert(
            RouteKey::new(endpoint, table.kind, &table.name),
            RouteTarget::Relation(Arc::new(table)),
        );
    }
    for routine in catalog.procedures.into_iter().chain(catalog.functions) {
        fragments.push(routine_fragment(endpoint, &routine));
        routes.insert(
            RouteKey::new(endpoint, routine.kind, &routine.name),
            RouteTarget::Routine(Arc::new(routine)),
        );
    }
    if advanced {
        fragments.push(advanced_fragment(endpoint));
    }

    tracing::info!(
        endpoint = %endpoint,
        routes = routes.len(),
        fragments = fragments.len(),
        "endpoint registered"
    );
    registry.merge(fragments);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Column, FunctionKind, Parameter};

    fn table(name: &str, kind: ObjectKind, pk: &[&str]) -> TableMetadata {
        TableMetadata {
            schema: "dbo".to_string(),
            name: name.to_string(),
            kind,
            columns: vec![Column {
                name: "id".to_string(),
                data_type: "int".to_string(),
                nullable: false,
                max_length: 0,
                precision: None,
                scale: None,
            }],
            primary_key: pk.iter().map(|s| s.to_string()).collect(),
            has_triggers: false,
            identity_column: None,
        }
    }

    fn routine(name: &str, kind: ObjectKind, function_kind: Option<FunctionKind>) -> RoutineMetadata {
        RoutineMetadata {
            schema: "dbo".to_string(),
            name: name.to_string(),
            kind,
            params: vec![Parameter {
                name: "x".to_string(),
                data_type: "int".to_string(),
                max_length: 0,
                precision: None,
                scale: None,
                is_output: false,
            }],
            function_kind,
            function_return: None,
        }
    }

    fn catalog() -> EndpointCatalog {
        EndpointCatalog {
            tables: vec![table("widgets", ObjectKind::Table, &["id"])],
            views: vec![table("widget_view", ObjectKind::View, &[])],
            procedures: vec![routine("audit", ObjectKind::Procedure, None)],
            functions: vec![routine("total", ObjectKind::Function, Some(FunctionKind::Scalar))],
        }
    }

    #[test]
    fn every_route_has_exactly_one_fragment() {
        let mut routes = RouteTable::new();
        let registry = SchemaRegistry::new();
        register_endpoint("db1", true, catalog(), &mut routes, &registry);

        // 4 objects -> 4 routes; fragments add the synthetic advanced entry.
        assert_eq!(routes.len(), 4);
        assert_eq!(registry.len(), 5);
        let snapshot = registry.snapshot();
        for (kind, name) in [
            (ObjectKind::Table, "widgets"),
            (ObjectKind::View, "widget_view"),
            (ObjectKind::Procedure, "audit"),
            (ObjectKind::Function, "total"),
        ] {
            assert!(routes.lookup("db1", kind, name).is_some());
            assert!(snapshot.contains_key(&format!("db1_{}", name)));
        }
        assert!(snapshot.contains_key("db1_advanced"));
    }

    #[test]
    fn lookup_is_scoped_by_endpoint_and_kind() {
        let mut routes = RouteTable::new();
        let registry = SchemaRegistry::new();
        register_endpoint("db1", false, catalog(), &mut routes, &registry);

        assert!(routes.lookup("db2", ObjectKind::Table, "widgets").is_none());
        assert!(routes.lookup("db1", ObjectKind::View, "widgets").is_none());
        assert!(routes.lookup("db1", ObjectKind::Table, "widgets").is_some());
    }

    #[test]
    fn fragment_kind_tags_match_route_targets() {
        let mut routes = RouteTable::new();
        let registry = SchemaRegistry::new();
        register_endpoint("db1", false, catalog(), &mut routes, &registry);
        let snapshot = registry.snapshot();

        assert_eq!(snapshot["db1_widgets"].kind, "table");
        assert_eq!(snapshot["db1_widgets"].has_pk, Some(true));
        assert_eq!(snapshot["db1_widget_view"].kind, "view");
        assert_eq!(snapshot["db1_widget_view"].is_view, Some(true));
        assert_eq!(snapshot["db1_widget_view"].has_pk, Some(false));
        assert_eq!(snapshot["db1_audit"].kind, "procedure");
        assert_eq!(snapshot["db1_audit"].proc_name.as_deref(), Some("audit"));
        assert_eq!(snapshot["db1_total"].kind, "function");
        assert_eq!(snapshot["db1_total"].function_type.as_deref(), Some("scalar"));
    }
}

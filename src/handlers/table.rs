//! Table and view handlers: list, get, create, update, delete.
//!
//! Handlers resolve the object through the route table, synthesize SQL, and
//! execute it; nothing here is object-specific. Create and the single-row
//! operations exist only for tables with a single-column primary key; a
//! table without one is list-only.

use crate::error::AppError;
use crate::handlers::{body_to_map, parse_kind};
use crate::metadata::{ObjectKind, TableMetadata};
use crate::registrar::RouteTarget;
use crate::response;
use crate::service::{Executor, MssqlPool};
use crate::sql::{self, ListOptions, SortDirection};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

fn relation(
    state: &AppState,
    endpoint: &str,
    kind: ObjectKind,
    name: &str,
) -> Result<Arc<TableMetadata>, AppError> {
    match state.routes.lookup(endpoint, kind, name) {
        Some(RouteTarget::Relation(t)) => Ok(t.clone()),
        _ => Err(AppError::NotFound(format!(
            "{}/{}/{}",
            endpoint,
            kind.route_letter(),
            name
        ))),
    }
}

fn pool(state: &AppState, endpoint: &str) -> Result<MssqlPool, AppError> {
    state
        .endpoint(endpoint)
        .map(|e| e.pool.clone())
        .ok_or_else(|| AppError::NotFound(format!("unknown endpoint: {}", endpoint)))
}

/// The table behind a write or single-row route: tables only, and only with
/// a single-column primary key.
fn keyed_table(
    state: &AppState,
    endpoint: &str,
    kind: ObjectKind,
    name: &str,
) -> Result<Arc<TableMetadata>, AppError> {
    if kind != ObjectKind::Table {
        return Err(AppError::NotFound(format!(
            "single-row operations are not available for kind '{}'",
            kind.as_str()
        )));
    }
    let table = relation(state, endpoint, kind, name)?;
    if table.single_key().is_none() {
        return Err(AppError::NotFound(format!(
            "{} has no single-column primary key",
            name
        )));
    }
    Ok(table)
}

fn parse_order(v: &str) -> (String, SortDirection) {
    match v.rsplit_once('.') {
        Some((col, "desc")) => (col.to_string(), SortDirection::Desc),
        Some((col, "asc")) => (col.to_string(), SortDirection::Asc),
        _ => (v.to_string(), SortDirection::Asc),
    }
}

pub async fn list(
    State(state): State<AppState>,
    Path((endpoint, kind, name)): Path<(String, String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let kind = parse_kind(&kind)?;
    if !matches!(kind, ObjectKind::Table | ObjectKind::View) {
        return Err(AppError::NotFound(format!(
            "list is not available for kind '{}'",
            kind.as_str()
        )));
    }
    let table = relation(&state, &endpoint, kind, &name)?;
    let pool = pool(&state, &endpoint)?;

    let mut opts = ListOptions::default();
    for (k, v) in params {
        match k.as_str() {
            "limit" => opts.limit = v.parse().ok(),
            "offset" => opts.offset = v.parse().ok(),
            "order" => opts.order = Some(parse_order(&v)),
            // Anything else is an equality filter; the synthesizer drops
            // names outside the known column set.
            _ => opts.filters.push((k, Value::String(v))),
        }
    }

    let rows = Executor::query_rows(&pool, &sql::select_list(&table, &opts)).await?;
    Ok((StatusCode::OK, Json(response::many(rows))))
}

pub async fn get_row(
    State(state): State<AppState>,
    Path((endpoint, kind, name, id)): Path<(String, String, String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let kind = parse_kind(&kind)?;
    let table = keyed_table(&state, &endpoint, kind, &name)?;
    let pool = pool(&state, &endpoint)?;
    let q = sql::select_by_key(&table, &Value::String(id.clone()));
    let row = Executor::query_optional(&pool, &q)
        .await?
        .ok_or(AppError::NotFound(id))?;
    Ok((StatusCode::OK, Json(response::one(row))))
}

pub(crate) async fn create(
    state: AppState,
    endpoint: String,
    name: String,
    body: Value,
) -> Result<Response, AppError> {
    let table = keyed_table(&state, &endpoint, ObjectKind::Table, &name)?;
    let pool = pool(&state, &endpoint)?;
    let body = body_to_map(body)?;
    let q = sql::insert(&table, &body);
    let row = Executor::query_optional(&pool, &q)
        .await?
        .ok_or_else(|| AppError::Execution("insert returned no row".to_string()))?;
    Ok((StatusCode::CREATED, Json(response::one(row))).into_response())
}

pub async fn update_row(
    State(state): State<AppState>,
    Path((endpoint, kind, name, id)): Path<(String, String, String, String)>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let kind = parse_kind(&kind)?;
    let table = keyed_table(&state, &endpoint, kind, &name)?;
    let pool = pool(&state, &endpoint)?;
    let body = body_to_map(body)?;
    let q = sql::update(&table, &Value::String(id.clone()), &body)?;
    let row = Executor::query_optional(&pool, &q)
        .await?
        .ok_or(AppError::NotFound(id))?;
    Ok((StatusCode::OK, Json(response::one(row))))
}

pub async fn delete_row(
    State(state): State<AppState>,
    Path((endpoint, kind, name, id)): Path<(String, String, String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let kind = parse_kind(&kind)?;
    let table = keyed_table(&state, &endpoint, kind, &name)?;
    let pool = pool(&state, &endpoint)?;
    let q = sql::delete(&table, &Value::String(id.clone()));
    let row = Executor::query_optional(&pool, &q)
        .await?
        .ok_or(AppError::NotFound(id))?;
    Ok((StatusCode::OK, Json(response::one(row))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Column, EndpointCatalog, TableMetadata};
    use crate::registrar::{register_endpoint, RouteTable};
    use crate::schema::SchemaRegistry;
    use crate::state::EndpointRuntime;
    use serde_json::json;
    use std::collections::HashMap;

    /// A state whose pool was never connected: any handler that reaches the
    /// execution path fails differently than one that refuses up front.
    fn state_with(table: TableMetadata) -> AppState {
        let mut routes = RouteTable::new();
        let registry = SchemaRegistry::new();
        register_endpoint(
            "db1",
            false,
            EndpointCatalog {
                tables: vec![table],
                ..Default::default()
            },
            &mut routes,
            &registry,
        );

        let manager = bb8_tiberius::ConnectionManager::new(tiberius::Config::new());
        let pool = bb8::Pool::builder().build_unchecked(manager);
        let mut endpoints = HashMap::new();
        endpoints.insert(
            "db1".to_string(),
            EndpointRuntime {
                name: "db1".to_string(),
                pool,
                advanced: false,
            },
        );
        AppState {
            endpoints: Arc::new(endpoints),
            routes: Arc::new(routes),
            registry,
        }
    }

    fn keyless_table() -> TableMetadata {
        TableMetadata {
            schema: "dbo".to_string(),
            name: "audit_log".to_string(),
            kind: ObjectKind::Table,
            columns: vec![Column {
                name: "name".to_string(),
                data_type: "nvarchar".to_string(),
                nullable: true,
                max_length: 50,
                precision: None,
                scale: None,
            }],
            primary_key: Vec::new(),
            has_triggers: false,
            identity_column: None,
        }
    }

    #[tokio::test]
    async fn create_on_table_without_primary_key_is_refused() {
        let state = state_with(keyless_table());
        let err = create(
            state,
            "db1".to_string(),
            "audit_log".to_string(),
            json!({"name": "W"}),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn create_on_table_with_composite_key_is_refused() {
        let mut table = keyless_table();
        table.primary_key = vec!["a".to_string(), "b".to_string()];
        let state = state_with(table);
        let err = create(
            state,
            "db1".to_string(),
            "audit_log".to_string(),
            json!({"name": "W"}),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}

//! HTTP handlers for discovered objects and the ad-hoc template route.

pub mod advanced;
pub mod routine;
pub mod table;

pub use advanced::advanced;
pub use table::{delete_row, get_row, list, update_row};

use crate::error::AppError;
use crate::metadata::ObjectKind;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

pub(crate) fn parse_kind(s: &str) -> Result<ObjectKind, AppError> {
    ObjectKind::from_route_letter(s)
        .ok_or_else(|| AppError::NotFound(format!("unknown kind: {}", s)))
}

pub(crate) fn body_to_map(value: Value) -> Result<HashMap<String, Value>, AppError> {
    match value {
        Value::Object(m) => Ok(m.into_iter().collect()),
        _ => Err(AppError::BadRequest("body must be a JSON object".to_string())),
    }
}

/// POST on an object route: create for tables, execute for routines. Views
/// are read-only.
pub async fn create_or_execute(
    State(state): State<AppState>,
    Path((endpoint, kind, name)): Path<(String, String, String)>,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    match parse_kind(&kind)? {
        ObjectKind::Table => table::create(state, endpoint, name, body).await,
        kind @ (ObjectKind::Procedure | ObjectKind::Function) => {
            routine::execute(state, endpoint, kind, name, body).await
        }
        ObjectKind::View => Err(AppError::NotFound(format!("{} is a read-only view", name))),
    }
}

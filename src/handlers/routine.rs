//! Procedure and function execution handlers.

use crate::error::AppError;
use crate::handlers::body_to_map;
use crate::metadata::{FunctionKind, ObjectKind};
use crate::registrar::RouteTarget;
use crate::response;
use crate::service::Executor;
use crate::sql;
use crate::state::AppState;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

/// Execute a discovered procedure or function. Scalar functions wrap their
/// single value; procedures and table-valued functions return the row set.
pub(crate) async fn execute(
    state: AppState,
    endpoint: String,
    kind: ObjectKind,
    name: String,
    body: Value,
) -> Result<Response, AppError> {
    let routine = match state.routes.lookup(&endpoint, kind, &name) {
        Some(RouteTarget::Routine(r)) => r.clone(),
        _ => {
            return Err(AppError::NotFound(format!(
                "{}/{}/{}",
                endpoint,
                kind.route_letter(),
                name
            )))
        }
    };
    let pool = state
        .endpoint(&endpoint)
        .map(|e| e.pool.clone())
        .ok_or_else(|| AppError::NotFound(format!("unknown endpoint: {}", endpoint)))?;
    let body = body_to_map(body)?;

    let q = match kind {
        ObjectKind::Procedure => sql::exec_procedure(&routine, &body),
        _ => sql::select_function(&routine, &body),
    };
    let mut rows = Executor::query_rows(&pool, &q).await?;

    if routine.function_kind == Some(FunctionKind::Scalar) {
        let row = if rows.is_empty() {
            Value::Null
        } else {
            rows.remove(0)
        };
        return Ok((StatusCode::OK, Json(response::one(row))).into_response());
    }
    Ok((StatusCode::OK, Json(response::many(rows))).into_response())
}

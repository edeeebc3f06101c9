//! Ad-hoc template handler: decode, substitute, guard, execute.

use crate::error::AppError;
use crate::response;
use crate::service::Executor;
use crate::state::AppState;
use crate::template;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;

pub async fn advanced(
    State(state): State<AppState>,
    Path(endpoint): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let ep = state
        .endpoint(&endpoint)
        .filter(|e| e.advanced)
        .ok_or_else(|| AppError::NotFound(format!("advanced queries are not enabled for: {}", endpoint)))?;

    let Value::Object(mut map) = body else {
        return Err(AppError::BadRequest("body must be a JSON object".to_string()));
    };
    let data = match map.remove("data") {
        Some(Value::String(s)) => s,
        _ => return Err(AppError::BadRequest("missing required field: data".to_string())),
    };
    let row_limit = map.remove("rowLimit").and_then(|v| v.as_i64());

    // Everything before execution is pure; any failure here is a client
    // error and no database call is made.
    let decoded = template::decode(&data)?;
    let substituted = template::substitute(&decoded, &map)?;
    template::guard(&substituted)?;
    let sql = template::wrap_with_row_limit(&substituted, row_limit);

    let rows = Executor::simple(&ep.pool, &sql).await?;
    Ok((StatusCode::OK, Json(response::many(rows))))
}

//! Generic object routes. axum carries only the path grammar; the route
//! table decides which objects exist.

use crate::handlers::{advanced, create_or_execute, delete_row, get_row, list, update_row};
use crate::state::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

async fn schema_snapshot(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.registry.snapshot();
    Json(serde_json::to_value(snapshot).unwrap_or_default())
}

pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/schema", get(schema_snapshot))
        .route("/:endpoint/a", post(advanced))
        .route("/:endpoint/:kind/:name", get(list).post(create_or_execute))
        .route(
            "/:endpoint/:kind/:name/:id",
            get(get_row).put(update_row).delete(delete_row),
        )
        .with_state(state)
}

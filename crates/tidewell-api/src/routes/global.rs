//! Global view route.

use axum::extract::State;
use axum::{Json, Router, routing::get};
use tidewell_world_state::application::query_handlers::global_view;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/v1/global
async fn get_global(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let view = state.store.read(global_view)?;
    Ok(Json(view))
}

/// Returns the global view router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/v1/global", get(get_global))
}

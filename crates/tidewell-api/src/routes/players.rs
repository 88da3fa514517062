//! Player-facing routes.

use axum::extract::{Path, State};
use axum::{Json, Router, routing::get};
use serde::Deserialize;
use tidewell_core::player::PlayerId;
use tidewell_engine::application::action_pipeline::set_action;
use tidewell_world_state::application::query_handlers::player_view;
use tidewell_world_state::domain::ids::ActionId;
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for PUT /{player_id}/action.
#[derive(Debug, Deserialize)]
pub struct SetActionRequest {
    /// Action token to stage; `null` clears the staged action.
    pub action: Option<String>,
}

/// GET /{player_id}
#[instrument(skip(state))]
async fn get_player(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let player_id: PlayerId = player_id.parse()?;
    let view = state.store.read(|s| player_view(s, player_id))?;
    Ok(Json(view))
}

/// PUT /{player_id}/action
///
/// Stages the token without checking it; legality is decided on approval.
#[instrument(skip(state, request))]
async fn put_action(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
    Json(request): Json<SetActionRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let player_id: PlayerId = player_id.parse()?;
    info!(player_id = %player_id, action = ?request.action, "staging pending action");
    set_action(&state.store, player_id, request.action.map(ActionId::new))?;
    let view = state.store.read(|s| player_view(s, player_id))?;
    Ok(Json(view))
}

/// Returns the router for player routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{player_id}", get(get_player))
        .route("/{player_id}/action", axum::routing::put(put_action))
}

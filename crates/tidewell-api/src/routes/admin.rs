//! Moderator routes. Every request must carry `Authorization: Bearer <ADMIN_TOKEN>`.

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{Json, Router, routing::post};
use serde::Deserialize;
use tidewell_core::command::{CommandRequest, Reply};
use tidewell_core::error::GameError;
use tracing::{info, instrument, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /announce.
#[derive(Debug, Deserialize)]
pub struct AnnounceRequest {
    /// Text posted to the public board.
    pub text: String,
}

async fn require_admin(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let presented = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    match presented {
        Some(token) if token == &*state.admin_token => Ok(next.run(request).await),
        Some(_) => {
            warn!(uri = %request.uri(), "rejected moderator request with wrong token");
            Err(GameError::Unauthorized("invalid admin token".into()).into())
        }
        None => Err(GameError::Unauthorized("missing bearer token".into()).into()),
    }
}

/// POST /commands
///
/// Always answers 200 with a `Reply`; a failed command is a reply of kind
/// `error`.
#[instrument(skip(state, request), fields(command = %request.command, correlation_id = %request.correlation_id))]
async fn run_command(
    State(state): State<AppState>,
    Json(request): Json<CommandRequest>,
) -> Json<Reply> {
    Json(state.console.dispatch(&request).await)
}

/// POST /announce
#[instrument(skip(state, request))]
async fn announce(
    State(state): State<AppState>,
    Json(request): Json<AnnounceRequest>,
) -> Result<Json<Reply>, ApiError> {
    let command = CommandRequest::new("announce", vec![request.text]);
    info!(correlation_id = %command.correlation_id, "handling announce");
    let reply = state.console.execute(&command).await?;
    Ok(Json(reply))
}

/// Returns the router for moderator routes, guarded by the admin token.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/commands", post(run_command))
        .route("/announce", post(announce))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}

//! WebSocket notification stream.
//!
//! A client connects to `/api/v1/stream`, optionally with `?player_id=N`.
//! It first receives the current views, then every `player_update` for its
//! own player (all players when no `player_id` was given) and every
//! `global_update`.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::{Router, routing::get};
use serde::Deserialize;
use tidewell_core::error::GameError;
use tidewell_core::notification::Notification;
use tidewell_core::player::PlayerId;
use tidewell_engine::application::store::GameStore;
use tidewell_world_state::application::query_handlers::{global_view, player_view};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// Query string for GET /api/v1/stream.
#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    /// Restrict player updates to this player.
    pub player_id: Option<String>,
}

async fn stream(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, ApiError> {
    let filter = query
        .player_id
        .as_deref()
        .map(str::parse::<PlayerId>)
        .transpose()?;
    let (rx, initial) = open_stream(&state, filter)?;

    Ok(ws.on_upgrade(move |socket| stream_socket(socket, state, filter, rx, initial)))
}

/// Subscribes to the fanout, then reads the current views.
///
/// Subscribing first means a mutation racing the connection shows up either
/// in the initial views or on the receiver, possibly both.
fn open_stream(
    state: &AppState,
    filter: Option<PlayerId>,
) -> Result<(broadcast::Receiver<Notification>, Vec<Notification>), GameError> {
    let rx = state.notifications.subscribe();
    let initial = current_views(&state.store, filter)?;
    Ok((rx, initial))
}

/// The views a client should see right now.
fn current_views(
    store: &GameStore,
    filter: Option<PlayerId>,
) -> Result<Vec<Notification>, GameError> {
    store.read(|s| {
        let players: Vec<PlayerId> = match filter {
            Some(player_id) => vec![player_id],
            None => s.player_ids().collect(),
        };
        let mut views = Vec::with_capacity(players.len() + 1);
        for player_id in players {
            views.push(Notification::PlayerUpdate {
                player_id,
                payload: player_view(s, player_id)?,
            });
        }
        views.push(Notification::GlobalUpdate {
            payload: global_view(s)?,
        });
        Ok(views)
    })
}

fn delivers(filter: Option<PlayerId>, notification: &Notification) -> bool {
    match (filter, notification.player_id()) {
        (Some(wanted), Some(target)) => wanted == target,
        _ => true,
    }
}

async fn stream_socket(
    mut socket: WebSocket,
    state: AppState,
    filter: Option<PlayerId>,
    mut rx: broadcast::Receiver<Notification>,
    initial: Vec<Notification>,
) {
    info!(player_id = ?filter, "stream client connected");

    if send_all(&mut socket, &initial).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Ping(payload))) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => {
                        break;
                    }
                    _ => {}
                }
            }
            outgoing = rx.recv() => {
                match outgoing {
                    Ok(notification) => {
                        if !delivers(filter, &notification) {
                            continue;
                        }
                        if send_notification(&mut socket, &notification).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(player_id = ?filter, skipped, "stream client lagged, resending current views");
                        let Ok(views) = current_views(&state.store, filter) else {
                            break;
                        };
                        if send_all(&mut socket, &views).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        }
    }

    debug!(player_id = ?filter, "stream client disconnected");
}

async fn send_all(socket: &mut WebSocket, notifications: &[Notification]) -> Result<(), axum::Error> {
    for notification in notifications {
        send_notification(socket, notification).await?;
    }
    Ok(())
}

async fn send_notification(
    socket: &mut WebSocket,
    notification: &Notification,
) -> Result<(), axum::Error> {
    let payload = serde_json::to_string(notification).map_err(axum::Error::new)?;
    socket.send(Message::Text(payload.into())).await
}

/// Returns the stream router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/v1/stream", get(stream))
}

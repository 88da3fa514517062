//! Query handlers for the World State context.
//!
//! Read-only views pushed to clients and returned by inspection routes.

use serde::Serialize;
use tidewell_core::error::GameError;
use tidewell_core::player::PlayerId;

use crate::domain::path::StatePath;
use crate::domain::state::{GameState, GlobalState, PlayerState};

/// Read-only view of one player.
#[derive(Debug, Serialize)]
pub struct PlayerView<'a> {
    /// The player identifier.
    pub player_id: PlayerId,
    /// The player's state.
    #[serde(flatten)]
    pub state: &'a PlayerState,
}

/// Read-only view of global state, shared by every party.
#[derive(Debug, Serialize)]
pub struct GlobalView<'a> {
    /// Number of teams in the session.
    pub player_count: usize,
    /// The global state.
    #[serde(flatten)]
    pub global: &'a GlobalState,
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, GameError> {
    serde_json::to_value(value)
        .map_err(|e| GameError::Infrastructure(format!("view serialization failed: {e}")))
}

/// Serializes the view of one player.
///
/// # Errors
///
/// Returns `GameError::NotFound` if the player does not exist.
pub fn player_view(state: &GameState, player_id: PlayerId) -> Result<serde_json::Value, GameError> {
    let view = PlayerView {
        player_id,
        state: state.player(player_id)?,
    };
    to_json(&view)
}

/// Serializes the global view.
///
/// # Errors
///
/// Returns `GameError::Infrastructure` if serialization fails.
pub fn global_view(state: &GameState) -> Result<serde_json::Value, GameError> {
    let view = GlobalView {
        player_count: state.players.len(),
        global: &state.global,
    };
    to_json(&view)
}

/// Resolves a dotted path against the state tree.
///
/// # Errors
///
/// Returns `GameError::NotFound` if the path is outside the schema or
/// addresses a missing key.
pub fn get_by_path(state: &GameState, path: &str) -> Result<serde_json::Value, GameError> {
    path.parse::<StatePath>()?.resolve(state)
}

/// Lists the keys below a dotted path.
///
/// # Errors
///
/// Returns `GameError::NotFound` if the path is outside the schema or
/// addresses a missing player.
pub fn keys_at_path(state: &GameState, path: &str) -> Result<Vec<String>, GameError> {
    path.parse::<StatePath>()?.child_keys(state)
}

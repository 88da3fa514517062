//! The action-approval pipeline.
//!
//! Players stage an intent with [`set_action`]; nothing about it is checked
//! until a moderator calls [`approve_action`], which resolves the token
//! against the player's current location and applies the action's effects.

use tidewell_core::error::GameError;
use tidewell_core::player::PlayerId;
use tidewell_world_state::domain::ids::ActionId;
use tidewell_world_state::domain::transforms::Transform;
use tracing::info;

use crate::application::store::GameStore;

/// Stores or clears a player's pending action without any legality check.
///
/// # Errors
///
/// Returns `GameError::NotFound` if the player does not exist.
pub fn set_action(
    store: &GameStore,
    player_id: PlayerId,
    action: Option<ActionId>,
) -> Result<(), GameError> {
    store.transaction(|txn| {
        txn.apply_and_notify(&Transform::SetPendingAction { action }, player_id)
    })?;
    Ok(())
}

/// Applies the player's pending action and clears it in the same unit.
///
/// # Errors
///
/// Returns `GameError::Precondition` if nothing is staged, the action is not
/// legal at the player's location or its requirements are unmet, and
/// `GameError::NotFound` for an unknown player. The pending action survives
/// any failure.
pub fn approve_action(store: &GameStore, player_id: PlayerId) -> Result<(), GameError> {
    let token = store.transaction(|txn| {
        let token = txn.state().player(player_id)?.pending_action.clone();
        txn.apply_and_notify(&Transform::ApplyAction, player_id)?;
        Ok::<_, GameError>(token)
    })?;
    if let Some(token) = token {
        info!(player_id = %player_id, action = %token, "action approved");
    }
    Ok(())
}

//! Snapshot save and restore.
//!
//! The state is serialized to JSON and handed to a `SnapshotRepository`
//! together with the fingerprint of the catalog it was produced against.

use chrono::{DateTime, Utc};
use tidewell_content::domain::catalog::Catalog;
use tidewell_core::error::GameError;
use tidewell_core::repository::{SnapshotRepository, StoredSnapshot};
use tidewell_world_state::domain::state::GameState;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::fresh_state::fresh_state;
use crate::application::store::GameStore;

/// Wraps `state` into a stored snapshot.
///
/// # Errors
///
/// Returns `GameError::Infrastructure` if serialization fails.
pub fn to_snapshot(
    state: &GameState,
    catalog: &Catalog,
    saved_at: DateTime<Utc>,
) -> Result<StoredSnapshot, GameError> {
    let payload = serde_json::to_value(state)
        .map_err(|e| GameError::Infrastructure(format!("state serialization failed: {e}")))?;
    Ok(StoredSnapshot {
        snapshot_id: Uuid::now_v7(),
        content_fingerprint: catalog.fingerprint.clone(),
        payload,
        saved_at,
    })
}

/// Reads the state back out of a stored snapshot.
///
/// # Errors
///
/// Returns `GameError::Infrastructure` if the payload is not a game state.
pub fn from_snapshot(snapshot: &StoredSnapshot, catalog: &Catalog) -> Result<GameState, GameError> {
    if snapshot.content_fingerprint != catalog.fingerprint {
        warn!(
            snapshot_id = %snapshot.snapshot_id,
            saved_with = %snapshot.content_fingerprint,
            current = %catalog.fingerprint,
            "snapshot was saved against a different content catalog"
        );
    }
    serde_json::from_value(snapshot.payload.clone())
        .map_err(|e| GameError::Infrastructure(format!("snapshot deserialization failed: {e}")))
}

/// Saves the store's current state.
///
/// # Errors
///
/// Returns the repository's error.
pub async fn save_snapshot(
    store: &GameStore,
    repo: &dyn SnapshotRepository,
) -> Result<StoredSnapshot, GameError> {
    let snapshot = to_snapshot(&store.snapshot(), store.catalog(), store.now())?;
    repo.save(&snapshot).await?;
    info!(
        snapshot_id = %snapshot.snapshot_id,
        fingerprint = %snapshot.content_fingerprint,
        "game state saved"
    );
    Ok(snapshot)
}

/// Restores the latest snapshot, or builds a fresh state if there is none.
///
/// # Errors
///
/// Returns the repository's error, or `GameError::Infrastructure` if the
/// stored payload cannot be read.
pub async fn restore_or_fresh(
    repo: &dyn SnapshotRepository,
    catalog: &Catalog,
    player_count: usize,
    now: DateTime<Utc>,
) -> Result<GameState, GameError> {
    match repo.load_latest().await? {
        Some(snapshot) => {
            let state = from_snapshot(&snapshot, catalog)?;
            info!(
                snapshot_id = %snapshot.snapshot_id,
                saved_at = %snapshot.saved_at,
                players = state.players.len(),
                "game state restored"
            );
            Ok(state)
        }
        None => {
            info!(players = player_count, "no snapshot found, starting fresh");
            fresh_state(catalog, player_count, now)
        }
    }
}

//! Snapshot repository abstraction.
//!
//! The payload format is opaque to the core: callers hand over and receive
//! back a JSON value.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::GameError;

/// Stored representation of a game-state snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSnapshot {
    /// Unique snapshot identifier.
    pub snapshot_id: Uuid,
    /// Fingerprint of the content catalog the state was produced against.
    pub content_fingerprint: String,
    /// Serialized game state.
    pub payload: serde_json::Value,
    /// Timestamp of the save.
    pub saved_at: DateTime<Utc>,
}

/// Repository trait for saving and restoring snapshots.
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Persist a snapshot.
    async fn save(&self, snapshot: &StoredSnapshot) -> Result<(), GameError>;

    /// Load the most recently saved snapshot, if any.
    async fn load_latest(&self) -> Result<Option<StoredSnapshot>, GameError>;
}

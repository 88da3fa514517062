//! JSON file implementation of the `SnapshotRepository` trait.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use tidewell_core::error::GameError;
use tidewell_core::repository::{SnapshotRepository, StoredSnapshot};

/// On-disk layout of a snapshot file.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotDocument {
    snapshot_id: Uuid,
    content_fingerprint: String,
    saved_at: DateTime<Utc>,
    state: serde_json::Value,
}

impl From<&StoredSnapshot> for SnapshotDocument {
    fn from(snapshot: &StoredSnapshot) -> Self {
        Self {
            snapshot_id: snapshot.snapshot_id,
            content_fingerprint: snapshot.content_fingerprint.clone(),
            saved_at: snapshot.saved_at,
            state: snapshot.payload.clone(),
        }
    }
}

impl From<SnapshotDocument> for StoredSnapshot {
    fn from(doc: SnapshotDocument) -> Self {
        Self {
            snapshot_id: doc.snapshot_id,
            content_fingerprint: doc.content_fingerprint,
            payload: doc.state,
            saved_at: doc.saved_at,
        }
    }
}

/// Keeps the latest snapshot in one JSON file.
///
/// A save writes a sibling temporary file and renames it over the target, so
/// a crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileSnapshotRepository {
    path: PathBuf,
}

impl FileSnapshotRepository {
    /// Creates a repository backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The snapshot file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn io_error(action: &str, path: &Path, e: &std::io::Error) -> GameError {
    GameError::Infrastructure(format!("failed to {action} {}: {e}", path.display()))
}

#[async_trait]
impl SnapshotRepository for FileSnapshotRepository {
    async fn save(&self, snapshot: &StoredSnapshot) -> Result<(), GameError> {
        let bytes = serde_json::to_vec_pretty(&SnapshotDocument::from(snapshot))
            .map_err(|e| GameError::Infrastructure(format!("snapshot encoding failed: {e}")))?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, bytes)
            .await
            .map_err(|e| io_error("write", &temp, &e))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| io_error("replace", &self.path, &e))?;
        debug!(path = %self.path.display(), snapshot_id = %snapshot.snapshot_id, "snapshot written");
        Ok(())
    }

    async fn load_latest(&self) -> Result<Option<StoredSnapshot>, GameError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error("read", &self.path, &e)),
        };
        let doc: SnapshotDocument = serde_json::from_slice(&bytes).map_err(|e| {
            GameError::Infrastructure(format!(
                "corrupt snapshot file {}: {e}",
                self.path.display()
            ))
        })?;
        Ok(Some(doc.into()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    use super::*;

    fn snapshot(fingerprint: &str) -> StoredSnapshot {
        StoredSnapshot {
            snapshot_id: Uuid::new_v4(),
            content_fingerprint: fingerprint.to_owned(),
            payload: serde_json::json!({ "players": [], "global": { "crimson_master_switch": true } }),
            saved_at: Utc.with_ymd_and_hms(2026, 3, 1, 18, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_load_latest_returns_none_when_file_missing() {
        let dir = TempDir::new().unwrap();
        let repo = FileSnapshotRepository::new(dir.path().join("snapshot.json"));

        let loaded = repo.load_latest().await.unwrap();

        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_returns_saved_snapshot() {
        // Arrange
        let dir = TempDir::new().unwrap();
        let repo = FileSnapshotRepository::new(dir.path().join("snapshot.json"));
        let saved = snapshot("abc123");

        // Act
        repo.save(&saved).await.unwrap();
        let loaded = repo.load_latest().await.unwrap();

        // Assert
        assert_eq!(loaded, Some(saved));
        assert!(repo.path().exists());
        assert!(!repo.temp_path().exists());
    }

    #[tokio::test]
    async fn test_second_save_replaces_first() {
        let dir = TempDir::new().unwrap();
        let repo = FileSnapshotRepository::new(dir.path().join("snapshot.json"));

        repo.save(&snapshot("first")).await.unwrap();
        repo.save(&snapshot("second")).await.unwrap();

        let loaded = repo.load_latest().await.unwrap().unwrap();
        assert_eq!(loaded.content_fingerprint, "second");
    }

    #[tokio::test]
    async fn test_corrupt_file_is_infrastructure_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.json");
        std::fs::write(&path, "{ not json").unwrap();
        let repo = FileSnapshotRepository::new(&path);

        let result = repo.load_latest().await;

        assert!(matches!(result, Err(GameError::Infrastructure(_))));
    }

    #[tokio::test]
    async fn test_save_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let repo = FileSnapshotRepository::new(dir.path().join("nope").join("snapshot.json"));

        let result = repo.save(&snapshot("x")).await;

        assert!(matches!(result, Err(GameError::Infrastructure(_))));
    }
}

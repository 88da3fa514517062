//! Test repositories — mock `SnapshotRepository` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use tidewell_core::error::GameError;
use tidewell_core::repository::{SnapshotRepository, StoredSnapshot};

/// A snapshot repository that keeps every save in memory and returns the
/// most recent one from `load_latest`.
#[derive(Debug, Default)]
pub struct InMemorySnapshotRepository {
    saved: Mutex<Vec<StoredSnapshot>>,
}

impl InMemorySnapshotRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository that already holds `snapshot`.
    #[must_use]
    pub fn with_snapshot(snapshot: StoredSnapshot) -> Self {
        Self {
            saved: Mutex::new(vec![snapshot]),
        }
    }

    /// Returns a copy of all saved snapshots, oldest first.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn saved(&self) -> Vec<StoredSnapshot> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl SnapshotRepository for InMemorySnapshotRepository {
    async fn save(&self, snapshot: &StoredSnapshot) -> Result<(), GameError> {
        self.saved.lock().unwrap().push(snapshot.clone());
        Ok(())
    }

    async fn load_latest(&self) -> Result<Option<StoredSnapshot>, GameError> {
        Ok(self.saved.lock().unwrap().last().cloned())
    }
}

/// A snapshot repository that always returns an infrastructure error. Useful
/// for testing error-handling paths.
#[derive(Debug)]
pub struct FailingSnapshotRepository;

#[async_trait]
impl SnapshotRepository for FailingSnapshotRepository {
    async fn save(&self, _snapshot: &StoredSnapshot) -> Result<(), GameError> {
        Err(GameError::Infrastructure("connection refused".into()))
    }

    async fn load_latest(&self) -> Result<Option<StoredSnapshot>, GameError> {
        Err(GameError::Infrastructure("connection refused".into()))
    }
}

//! `PostgreSQL` implementation of the `SnapshotRepository` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use tidewell_core::error::GameError;
use tidewell_core::repository::{SnapshotRepository, StoredSnapshot};

use crate::schema::CREATE_SNAPSHOTS_TABLE;

/// PostgreSQL-backed snapshot repository. Every save is kept; the latest by
/// `saved_at` wins on load.
#[derive(Debug, Clone)]
pub struct PgSnapshotRepository {
    pool: PgPool,
}

impl PgSnapshotRepository {
    /// Creates a new `PgSnapshotRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the snapshot table if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Infrastructure` on a database error.
    pub async fn ensure_schema(&self) -> Result<(), GameError> {
        sqlx::raw_sql(CREATE_SNAPSHOTS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        info!("snapshot schema ready");
        Ok(())
    }
}

#[allow(clippy::needless_pass_by_value)]
fn db_error(e: sqlx::Error) -> GameError {
    GameError::Infrastructure(format!("database error: {e}"))
}

#[async_trait]
impl SnapshotRepository for PgSnapshotRepository {
    async fn save(&self, snapshot: &StoredSnapshot) -> Result<(), GameError> {
        sqlx::query(
            "INSERT INTO game_snapshots (snapshot_id, content_fingerprint, payload, saved_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(snapshot.snapshot_id)
        .bind(&snapshot.content_fingerprint)
        .bind(&snapshot.payload)
        .bind(snapshot.saved_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn load_latest(&self) -> Result<Option<StoredSnapshot>, GameError> {
        let row = sqlx::query(
            "SELECT snapshot_id, content_fingerprint, payload, saved_at \
             FROM game_snapshots ORDER BY saved_at DESC, snapshot_id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(|row| {
            Ok(StoredSnapshot {
                snapshot_id: row.try_get::<Uuid, _>("snapshot_id").map_err(db_error)?,
                content_fingerprint: row
                    .try_get::<String, _>("content_fingerprint")
                    .map_err(db_error)?,
                payload: row
                    .try_get::<serde_json::Value, _>("payload")
                    .map_err(db_error)?,
                saved_at: row
                    .try_get::<DateTime<Utc>, _>("saved_at")
                    .map_err(db_error)?,
            })
        })
        .transpose()
    }
}

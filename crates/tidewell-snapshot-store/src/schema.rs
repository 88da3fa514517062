//! Snapshot store database schema.

/// SQL to create the snapshots table.
pub const CREATE_SNAPSHOTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS game_snapshots (
    snapshot_id         UUID PRIMARY KEY,
    content_fingerprint VARCHAR(64) NOT NULL,
    payload             JSONB NOT NULL,
    saved_at            TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_game_snapshots_saved_at
    ON game_snapshots (saved_at DESC);
";

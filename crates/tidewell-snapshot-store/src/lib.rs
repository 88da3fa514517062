//! Snapshot persistence for the Tidewell game server.
//!
//! Two implementations of `SnapshotRepository`: a single JSON file on local
//! disk, and a `PostgreSQL` table keeping every saved snapshot.

pub mod file_snapshot_repository;
pub mod pg_snapshot_repository;
pub mod schema;

//! Tidewell — World State bounded context.
//!
//! Owns the shape of the single authoritative state tree: players, their
//! inventories, quests, oxygen and journals, plus the global flags and the
//! linked-streams puzzle. Mutation rules live in `tidewell-engine`; this crate
//! only defines the data and the transform values that describe mutations.

pub mod application;
pub mod domain;

//! Tidewell — Content Catalog bounded context.
//!
//! Read-only reference tables consumed by the engine: which actions are legal
//! at each location (with their requirements and effect transforms), quest
//! stage definitions, item metadata, oxygen streams and the timing rules for
//! oxygen, challenge mode and the linked streams. Catalogs are authored in
//! YAML and fingerprinted with SHA-256.

pub mod application;
pub mod domain;

//! Catalog loading.
//!
//! Parses a YAML catalog, checks its cross references and stamps it with the
//! SHA-256 fingerprint of the source document.

use std::path::Path;

use sha2::{Digest, Sha256};
use tidewell_core::error::GameError;
use tracing::info;

use crate::domain::catalog::Catalog;

const DEFAULT_CATALOG: &str = include_str!("../../assets/catalog.yaml");

/// Returns the lowercase hex SHA-256 of `source`.
#[must_use]
pub fn fingerprint(source: &str) -> String {
    Sha256::digest(source.as_bytes())
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

/// Parses and validates a catalog from YAML text.
///
/// # Errors
///
/// Returns `GameError::Validation` if the document does not parse or refers
/// to undefined locations, items, quests or streams.
pub fn load_catalog_from_str(source: &str) -> Result<Catalog, GameError> {
    let mut catalog: Catalog = serde_yaml::from_str(source)
        .map_err(|e| GameError::Validation(format!("catalog parse failed: {e}")))?;
    catalog.validate()?;
    catalog.fingerprint = fingerprint(source);

    info!(
        fingerprint = %catalog.fingerprint,
        locations = catalog.locations.len(),
        items = catalog.items.len(),
        quests = catalog.quests.len(),
        "content catalog loaded"
    );
    Ok(catalog)
}

/// Reads, parses and validates a catalog file.
///
/// # Errors
///
/// Returns `GameError::Infrastructure` if the file cannot be read, otherwise
/// the errors of [`load_catalog_from_str`].
pub fn load_catalog_from_path(path: &Path) -> Result<Catalog, GameError> {
    let source = std::fs::read_to_string(path).map_err(|e| {
        GameError::Infrastructure(format!("failed to read catalog {}: {e}", path.display()))
    })?;
    load_catalog_from_str(&source)
}

/// Returns the catalog bundled with the crate.
///
/// # Errors
///
/// Returns `GameError::Validation` if the bundled catalog is inconsistent.
pub fn default_catalog() -> Result<Catalog, GameError> {
    load_catalog_from_str(DEFAULT_CATALOG)
}

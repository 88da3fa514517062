//! Query handlers for the Content Catalog context.

use serde::Serialize;
use tidewell_core::error::GameError;
use tidewell_world_state::domain::ids::{ActionId, LocationId};

use crate::domain::catalog::Catalog;

/// Summary of one action legal at a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionSummary {
    /// Token a player submits to stage the action.
    pub action: ActionId,
    /// Label shown to players.
    pub label: String,
}

/// Lists the actions legal at `location`, ordered by token.
///
/// # Errors
///
/// Returns `GameError::Validation` if the location is unknown.
pub fn legal_actions(
    catalog: &Catalog,
    location: &LocationId,
) -> Result<Vec<ActionSummary>, GameError> {
    let location = catalog.location(location)?;
    Ok(location
        .actions
        .iter()
        .map(|(action, def)| ActionSummary {
            action: action.clone(),
            label: def.label.clone(),
        })
        .collect())
}

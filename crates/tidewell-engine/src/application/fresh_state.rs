//! Fresh session state.

use chrono::{DateTime, TimeDelta, Utc};
use tidewell_content::domain::catalog::Catalog;
use tidewell_core::error::GameError;
use tidewell_world_state::domain::state::{GameState, GlobalState, PlayerState};

/// Largest team count a `PlayerId` can address.
pub const MAX_PLAYERS: usize = u8::MAX as usize + 1;

/// Builds the state of a new session: `player_count` teams at the catalog's
/// starting location with a full oxygen allowance, and idle global state.
///
/// # Errors
///
/// Returns `GameError::Validation` if `player_count` is zero or exceeds
/// [`MAX_PLAYERS`], or if the starting oxygen is out of range.
pub fn fresh_state(
    catalog: &Catalog,
    player_count: usize,
    now: DateTime<Utc>,
) -> Result<GameState, GameError> {
    if player_count == 0 || player_count > MAX_PLAYERS {
        return Err(GameError::Validation(format!(
            "player count must be between 1 and {MAX_PLAYERS}, got {player_count}"
        )));
    }
    let oxygen_until = TimeDelta::try_seconds(catalog.start.oxygen_seconds)
        .and_then(|allowance| now.checked_add_signed(allowance))
        .ok_or_else(|| {
            GameError::Validation(format!(
                "starting oxygen {} is out of range",
                catalog.start.oxygen_seconds
            ))
        })?;

    Ok(GameState {
        players: (0..player_count)
            .map(|_| PlayerState::new(catalog.start.location.clone(), Some(oxygen_until)))
            .collect(),
        global: GlobalState::default(),
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone, Utc};
    use tidewell_content::application::loader::default_catalog;
    use tidewell_core::error::GameError;
    use tidewell_world_state::domain::ids::LocationId;

    use super::fresh_state;

    #[test]
    fn test_fresh_state_places_every_team_at_start() {
        // Arrange
        let catalog = default_catalog().unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 18, 0, 0).unwrap();

        // Act
        let state = fresh_state(&catalog, 3, now).unwrap();

        // Assert
        assert_eq!(state.players.len(), 3);
        for player in &state.players {
            assert_eq!(player.location_id, LocationId::new("bubble"));
            assert_eq!(player.oxygen_until, Some(now + TimeDelta::hours(1)));
            assert!(player.inventory.is_empty());
            assert_eq!(player.pending_action, None);
        }
        assert!(!state.global.crimson_master_switch);
        assert!(state.global.public_messages.is_empty());
    }

    #[test]
    fn test_fresh_state_rejects_zero_players() {
        let catalog = default_catalog().unwrap();
        let result = fresh_state(&catalog, 0, Utc::now());
        assert!(matches!(result, Err(GameError::Validation(_))));
    }
}

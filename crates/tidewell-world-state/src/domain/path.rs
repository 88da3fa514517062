//! Typed dotted-path lookup over the state tree.
//!
//! Paths such as `players.0.inventory.kelp` or `global.linked_streams.salmon`
//! are parsed into a [`StatePath`] over a closed schema. Anything outside the
//! schema, or a key that is absent at lookup time, yields
//! `GameError::NotFound`.

use std::str::FromStr;

use serde::Serialize;
use tidewell_core::error::GameError;
use tidewell_core::player::PlayerId;

use super::ids::{ItemId, LinkedRole, QuestId, StreamId};
use super::state::GameState;

/// A field of `PlayerState` addressable by path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerField {
    LocationId,
    Inventory,
    InventoryItem(ItemId),
    Quests,
    Quest(QuestId),
    OxygenUntil,
    PausedOxygen,
    BankedOxygenMs,
    ChallengeMode,
    StreamCooldownExpiry,
    StreamCooldown(StreamId),
    PendingAction,
    Journal,
}

const PLAYER_FIELDS: [&str; 10] = [
    "location_id",
    "inventory",
    "quests",
    "oxygen_until",
    "paused_oxygen",
    "banked_oxygen_ms",
    "challenge_mode",
    "stream_cooldown_expiry",
    "pending_action",
    "journal",
];

/// A field of `GlobalState` addressable by path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlobalField {
    CrimsonMasterSwitch,
    LinkedStreams,
    LinkedStream(LinkedRole),
    PublicMessages,
}

const GLOBAL_FIELDS: [&str; 3] = ["crimson_master_switch", "linked_streams", "public_messages"];

/// A parsed path into the state tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatePath {
    Root,
    Players,
    Player(PlayerId),
    PlayerField(PlayerId, PlayerField),
    Global,
    GlobalField(GlobalField),
}

fn not_found(path: &str) -> GameError {
    GameError::NotFound(format!("Did not find component {path} in game state."))
}

impl FromStr for StatePath {
    type Err = GameError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        if path.is_empty() {
            return Ok(Self::Root);
        }
        let segments: Vec<&str> = path.split('.').collect();
        let parsed = match segments.as_slice() {
            ["players"] => Self::Players,
            ["players", id, rest @ ..] => {
                let player_id = id.parse::<u8>().map(PlayerId).map_err(|_| not_found(path))?;
                match rest {
                    [] => Self::Player(player_id),
                    [field] => Self::PlayerField(player_id, parse_player_field(field, None, path)?),
                    [field, key] => {
                        Self::PlayerField(player_id, parse_player_field(field, Some(*key), path)?)
                    }
                    _ => return Err(not_found(path)),
                }
            }
            ["global"] => Self::Global,
            ["global", "crimson_master_switch"] => {
                Self::GlobalField(GlobalField::CrimsonMasterSwitch)
            }
            ["global", "linked_streams"] => Self::GlobalField(GlobalField::LinkedStreams),
            ["global", "linked_streams", role] => Self::GlobalField(GlobalField::LinkedStream(
                role.parse().map_err(|_| not_found(path))?,
            )),
            ["global", "public_messages"] => Self::GlobalField(GlobalField::PublicMessages),
            _ => return Err(not_found(path)),
        };
        Ok(parsed)
    }
}

fn parse_player_field(field: &str, key: Option<&str>, path: &str) -> Result<PlayerField, GameError> {
    let parsed = match (field, key) {
        ("location_id", None) => PlayerField::LocationId,
        ("inventory", None) => PlayerField::Inventory,
        ("inventory", Some(item)) => PlayerField::InventoryItem(ItemId::new(item)),
        ("quests", None) => PlayerField::Quests,
        ("quests", Some(quest)) => {
            PlayerField::Quest(quest.parse().map_err(|_| not_found(path))?)
        }
        ("oxygen_until", None) => PlayerField::OxygenUntil,
        ("paused_oxygen", None) => PlayerField::PausedOxygen,
        ("banked_oxygen_ms", None) => PlayerField::BankedOxygenMs,
        ("challenge_mode", None) => PlayerField::ChallengeMode,
        ("stream_cooldown_expiry", None) => PlayerField::StreamCooldownExpiry,
        ("stream_cooldown_expiry", Some(stream)) => {
            PlayerField::StreamCooldown(StreamId::new(stream))
        }
        ("pending_action", None) => PlayerField::PendingAction,
        ("journal", None) => PlayerField::Journal,
        _ => return Err(not_found(path)),
    };
    Ok(parsed)
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<serde_json::Value, GameError> {
    serde_json::to_value(value)
        .map_err(|e| GameError::Infrastructure(format!("state serialization failed: {e}")))
}

impl StatePath {
    /// Serializes the addressed sub-tree.
    ///
    /// # Errors
    ///
    /// Returns `GameError::NotFound` if the path addresses a player, item or
    /// quest that does not exist in `state`.
    pub fn resolve(&self, state: &GameState) -> Result<serde_json::Value, GameError> {
        match self {
            Self::Root => to_json(state),
            Self::Players => to_json(&state.players),
            Self::Player(id) => to_json(state.player(*id)?),
            Self::PlayerField(id, field) => {
                let player = state.player(*id)?;
                match field {
                    PlayerField::LocationId => to_json(&player.location_id),
                    PlayerField::Inventory => to_json(&player.inventory),
                    PlayerField::InventoryItem(item) => player
                        .inventory
                        .get(item)
                        .ok_or_else(|| not_found(&format!("players.{id}.inventory.{item}")))
                        .and_then(to_json),
                    PlayerField::Quests => to_json(&player.quests),
                    PlayerField::Quest(quest) => player
                        .quests
                        .get(quest)
                        .ok_or_else(|| not_found(&format!("players.{id}.quests.{quest}")))
                        .and_then(to_json),
                    PlayerField::OxygenUntil => to_json(&player.oxygen_until),
                    PlayerField::PausedOxygen => to_json(&player.paused_oxygen),
                    PlayerField::BankedOxygenMs => to_json(&player.banked_oxygen_ms),
                    PlayerField::ChallengeMode => to_json(&player.challenge_mode),
                    PlayerField::StreamCooldownExpiry => to_json(&player.stream_cooldown_expiry),
                    PlayerField::StreamCooldown(stream) => player
                        .stream_cooldown_expiry
                        .get(stream)
                        .ok_or_else(|| {
                            not_found(&format!("players.{id}.stream_cooldown_expiry.{stream}"))
                        })
                        .and_then(to_json),
                    PlayerField::PendingAction => to_json(&player.pending_action),
                    PlayerField::Journal => to_json(&player.journal),
                }
            }
            Self::Global => to_json(&state.global),
            Self::GlobalField(field) => match field {
                GlobalField::CrimsonMasterSwitch => to_json(&state.global.crimson_master_switch),
                GlobalField::LinkedStreams => to_json(&state.global.linked_streams),
                GlobalField::LinkedStream(role) => to_json(&state.global.linked_streams.get(*role)),
                GlobalField::PublicMessages => to_json(&state.global.public_messages),
            },
        }
    }

    /// Lists the keys directly below this path.
    ///
    /// # Errors
    ///
    /// Returns `GameError::NotFound` if the path addresses a missing player.
    pub fn child_keys(&self, state: &GameState) -> Result<Vec<String>, GameError> {
        let keys = match self {
            Self::Root => vec!["players".to_owned(), "global".to_owned()],
            Self::Players => state.player_ids().map(|id| id.to_string()).collect(),
            Self::Player(id) => {
                state.player(*id)?;
                PLAYER_FIELDS.iter().map(|f| (*f).to_owned()).collect()
            }
            Self::PlayerField(id, PlayerField::Inventory) => {
                state.player(*id)?.inventory.keys().map(ToString::to_string).collect()
            }
            Self::PlayerField(id, PlayerField::Quests) => {
                state.player(*id)?.quests.keys().map(ToString::to_string).collect()
            }
            Self::PlayerField(id, PlayerField::StreamCooldownExpiry) => state
                .player(*id)?
                .stream_cooldown_expiry
                .keys()
                .map(ToString::to_string)
                .collect(),
            Self::Global => GLOBAL_FIELDS.iter().map(|f| (*f).to_owned()).collect(),
            Self::GlobalField(GlobalField::LinkedStreams) => {
                LinkedRole::ALL.iter().map(|r| r.as_str().to_owned()).collect()
            }
            Self::PlayerField(..) | Self::GlobalField(_) => Vec::new(),
        };
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::LocationId;
    use crate::domain::state::{GlobalState, PlayerState};

    fn sample_state() -> GameState {
        let mut player = PlayerState::new(LocationId::new("bubble"), None);
        player.inventory.insert(ItemId::new("kelp"), 3);
        GameState {
            players: vec![player, PlayerState::new(LocationId::new("tuna"), None)],
            global: GlobalState::default(),
        }
    }

    #[test]
    fn test_parse_recognizes_nested_paths() {
        assert_eq!("".parse::<StatePath>().unwrap(), StatePath::Root);
        assert_eq!(
            "players.1.location_id".parse::<StatePath>().unwrap(),
            StatePath::PlayerField(PlayerId(1), PlayerField::LocationId)
        );
        assert_eq!(
            "global.linked_streams.catfish".parse::<StatePath>().unwrap(),
            StatePath::GlobalField(GlobalField::LinkedStream(LinkedRole::Catfish))
        );
    }

    #[test]
    fn test_parse_rejects_paths_outside_schema() {
        for path in ["nope", "players.x", "players.0.color", "global.weather", "players.0.inventory.kelp.qty"] {
            let err = path.parse::<StatePath>().unwrap_err();
            assert!(matches!(err, GameError::NotFound(_)), "path {path}");
        }
    }

    #[test]
    fn test_resolve_returns_subtree() {
        // Arrange
        let state = sample_state();

        // Act
        let location = "players.1.location_id".parse::<StatePath>().unwrap().resolve(&state).unwrap();
        let kelp = "players.0.inventory.kelp".parse::<StatePath>().unwrap().resolve(&state).unwrap();

        // Assert
        assert_eq!(location, serde_json::json!("tuna"));
        assert_eq!(kelp, serde_json::json!(3));
    }

    #[test]
    fn test_resolve_returns_not_found_for_missing_keys() {
        let state = sample_state();

        let missing_item = "players.0.inventory.tank".parse::<StatePath>().unwrap().resolve(&state);
        let missing_player = "players.5".parse::<StatePath>().unwrap().resolve(&state);

        assert!(matches!(missing_item, Err(GameError::NotFound(_))));
        assert!(matches!(missing_player, Err(GameError::NotFound(_))));
    }

    #[test]
    fn test_banked_oxygen_and_stream_cooldowns_are_addressable() {
        // Arrange
        let mut state = sample_state();
        let expiry = chrono::Utc::now();
        let player = &mut state.players[0];
        player.paused_oxygen = true;
        player.banked_oxygen_ms = Some(90_000);
        player
            .stream_cooldown_expiry
            .insert(StreamId::new("bubble_vent"), expiry);

        // Act
        let banked = "players.0.banked_oxygen_ms".parse::<StatePath>().unwrap().resolve(&state).unwrap();
        let cooldown = "players.0.stream_cooldown_expiry.bubble_vent"
            .parse::<StatePath>()
            .unwrap()
            .resolve(&state)
            .unwrap();
        let streams = "players.0.stream_cooldown_expiry"
            .parse::<StatePath>()
            .unwrap()
            .child_keys(&state)
            .unwrap();
        let missing = "players.1.stream_cooldown_expiry.bubble_vent"
            .parse::<StatePath>()
            .unwrap()
            .resolve(&state);

        // Assert
        assert_eq!(banked, serde_json::json!(90_000));
        assert_eq!(cooldown, serde_json::to_value(expiry).unwrap());
        assert_eq!(streams, vec!["bubble_vent".to_owned()]);
        assert!(matches!(missing, Err(GameError::NotFound(_))));
        assert!(
            "players.0"
                .parse::<StatePath>()
                .unwrap()
                .child_keys(&state)
                .unwrap()
                .contains(&"banked_oxygen_ms".to_owned())
        );
    }

    #[test]
    fn test_child_keys_lists_inventory_items() {
        let state = sample_state();
        let keys = "players.0.inventory"
            .parse::<StatePath>()
            .unwrap()
            .child_keys(&state)
            .unwrap();
        assert_eq!(keys, vec!["kelp".to_owned()]);
    }
}

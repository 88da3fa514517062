//! The authoritative state tree.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tidewell_core::error::GameError;
use tidewell_core::player::PlayerId;

use super::ids::{ActionId, ItemId, LinkedRole, LocationId, QuestId, StreamId};

/// Root of the state tree. One instance per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Players indexed by team identifier.
    pub players: Vec<PlayerState>,
    /// State shared by every player.
    pub global: GlobalState,
}

impl GameState {
    /// Returns the state of one player.
    ///
    /// # Errors
    ///
    /// Returns `GameError::NotFound` if no such player exists.
    pub fn player(&self, player_id: PlayerId) -> Result<&PlayerState, GameError> {
        self.players
            .get(player_id.index())
            .ok_or_else(|| unknown_player(player_id))
    }

    /// Returns the mutable state of one player.
    ///
    /// # Errors
    ///
    /// Returns `GameError::NotFound` if no such player exists.
    pub fn player_mut(&mut self, player_id: PlayerId) -> Result<&mut PlayerState, GameError> {
        self.players
            .get_mut(player_id.index())
            .ok_or_else(|| unknown_player(player_id))
    }

    /// Iterates the identifiers of every player, in team order.
    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> + use<> {
        let count = self.players.len().min(usize::from(u8::MAX) + 1);
        (0..count).filter_map(|i| u8::try_from(i).ok().map(PlayerId))
    }
}

fn unknown_player(player_id: PlayerId) -> GameError {
    GameError::NotFound(format!("Unknown player {player_id}"))
}

/// Progress on a single quest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestProgress {
    /// Current stage. Never decreases.
    pub stage: u32,
    /// Stages that have been reached.
    pub stages: BTreeSet<u32>,
}

/// Who can read a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Only the owning player's journal.
    #[default]
    Private,
    /// The journal and the public message board.
    Public,
}

/// A journal or public-board entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message text.
    pub text: String,
    /// Audience.
    pub visibility: Visibility,
    /// When the message was appended.
    pub sent_at: DateTime<Utc>,
}

/// Per-team state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Where the team currently is.
    pub location_id: LocationId,
    /// Item quantities. Zero entries are pruned.
    pub inventory: BTreeMap<ItemId, u32>,
    /// Quest progress by quest.
    pub quests: BTreeMap<QuestId, QuestProgress>,
    /// Absolute oxygen deadline; `None` means the clock is not running.
    pub oxygen_until: Option<DateTime<Utc>>,
    /// Whether the oxygen clock is paused by a moderator.
    pub paused_oxygen: bool,
    /// Oxygen remaining when the clock was paused, in milliseconds.
    #[serde(default)]
    pub banked_oxygen_ms: Option<i64>,
    /// Challenge-mode deadline; `None` means not in challenge mode.
    pub challenge_mode: Option<DateTime<Utc>>,
    /// Cooldown expiry per oxygen stream.
    pub stream_cooldown_expiry: BTreeMap<StreamId, DateTime<Utc>>,
    /// Staged, not yet approved action.
    pub pending_action: Option<ActionId>,
    /// Private journal, oldest first.
    pub journal: Vec<Message>,
}

impl PlayerState {
    /// Creates a player at `location_id` whose oxygen runs out at `oxygen_until`.
    #[must_use]
    pub fn new(location_id: LocationId, oxygen_until: Option<DateTime<Utc>>) -> Self {
        Self {
            location_id,
            inventory: BTreeMap::new(),
            quests: BTreeMap::new(),
            oxygen_until,
            paused_oxygen: false,
            banked_oxygen_ms: None,
            challenge_mode: None,
            stream_cooldown_expiry: BTreeMap::new(),
            pending_action: None,
            journal: Vec::new(),
        }
    }

    /// Returns how many of `item` the player holds.
    #[must_use]
    pub fn item_quantity(&self, item: &ItemId) -> u32 {
        self.inventory.get(item).copied().unwrap_or(0)
    }

    /// Returns whether `stage` of `quest` has been reached.
    #[must_use]
    pub fn has_quest_flag(&self, quest: QuestId, stage: u32) -> bool {
        self.quests
            .get(&quest)
            .is_some_and(|progress| progress.stages.contains(&stage))
    }

    /// Returns the current stage of `quest`, if issued.
    #[must_use]
    pub fn quest_stage(&self, quest: QuestId) -> Option<u32> {
        self.quests.get(&quest).map(|progress| progress.stage)
    }
}

/// A recorded activation of one linked-stream role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activation {
    /// The player who activated the role.
    pub player_id: PlayerId,
    /// When the role was activated.
    pub activated_at: DateTime<Utc>,
}

/// Current activations of the linked oxygen streams. A role with no
/// activation is idle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedStreams {
    /// Salmon-end activation.
    pub salmon: Option<Activation>,
    /// Catfish-end activation.
    pub catfish: Option<Activation>,
}

impl LinkedStreams {
    /// Returns the activation recorded for `role`.
    #[must_use]
    pub fn get(&self, role: LinkedRole) -> Option<Activation> {
        match role {
            LinkedRole::Salmon => self.salmon,
            LinkedRole::Catfish => self.catfish,
        }
    }

    /// Returns the mutable slot for `role`.
    pub fn slot_mut(&mut self, role: LinkedRole) -> &mut Option<Activation> {
        match role {
            LinkedRole::Salmon => &mut self.salmon,
            LinkedRole::Catfish => &mut self.catfish,
        }
    }
}

/// State shared by every player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalState {
    /// The crimson master switch.
    pub crimson_master_switch: bool,
    /// Linked oxygen streams puzzle.
    pub linked_streams: LinkedStreams,
    /// Public message board, oldest first.
    pub public_messages: Vec<Message>,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn state_with_players(count: usize) -> GameState {
        GameState {
            players: (0..count)
                .map(|_| PlayerState::new(LocationId::new("bubble"), None))
                .collect(),
            global: GlobalState::default(),
        }
    }

    #[test]
    fn test_player_returns_not_found_for_unknown_team() {
        // Arrange
        let state = state_with_players(2);

        // Act
        let result = state.player(PlayerId(2));

        // Assert
        match result.unwrap_err() {
            GameError::NotFound(msg) => assert!(msg.contains('2')),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_player_ids_enumerates_in_team_order() {
        let state = state_with_players(3);
        let ids: Vec<PlayerId> = state.player_ids().collect();
        assert_eq!(ids, vec![PlayerId(0), PlayerId(1), PlayerId(2)]);
    }

    #[test]
    fn test_item_quantity_defaults_to_zero() {
        let player = PlayerState::new(LocationId::new("bubble"), None);
        assert_eq!(player.item_quantity(&ItemId::new("kelp")), 0);
    }

    #[test]
    fn test_has_quest_flag_reads_completed_stages() {
        // Arrange
        let mut player = PlayerState::new(LocationId::new("bubble"), None);
        player.quests.insert(
            QuestId(7),
            QuestProgress {
                stage: 3,
                stages: [0, 3].into_iter().collect(),
            },
        );

        // Assert
        assert!(player.has_quest_flag(QuestId(7), 3));
        assert!(!player.has_quest_flag(QuestId(7), 2));
        assert!(!player.has_quest_flag(QuestId(8), 0));
        assert_eq!(player.quest_stage(QuestId(7)), Some(3));
    }

    #[test]
    fn test_state_serializes_quest_keys_as_strings() {
        // Arrange
        let mut state = state_with_players(1);
        state.players[0].quests.insert(QuestId(4), QuestProgress::default());
        state.players[0].oxygen_until = Some(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap());

        // Act
        let json = serde_json::to_value(&state).unwrap();
        let restored: GameState = serde_json::from_value(json.clone()).unwrap();

        // Assert
        assert!(json["players"][0]["quests"]["4"].is_object());
        assert_eq!(restored, state);
    }
}

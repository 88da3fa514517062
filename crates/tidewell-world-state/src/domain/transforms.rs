//! Transform values.
//!
//! A transform is plain data describing one mutation of a player's sub-state
//! and/or global state. `tidewell-engine` interprets these values; keeping
//! them as data lets the content catalog declare action effects in YAML and
//! lets tests build and compare transforms without closures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ActionId, ItemId, LinkedRole, LocationId, QuestId, StreamId};
use super::state::Visibility;

/// A deterministic mutation unit targeting one player and/or global state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transform {
    /// Grant `qty` of `item`.
    AddItem {
        /// Item to grant.
        item: ItemId,
        /// Quantity, at least 1.
        #[serde(default = "one")]
        qty: u32,
    },
    /// Consume `qty` of `item`. Fails if the player holds fewer.
    RemoveItem {
        /// Item to consume.
        item: ItemId,
        /// Quantity, at least 1.
        #[serde(default = "one")]
        qty: u32,
    },
    /// Shift the oxygen deadline by a signed number of seconds.
    AddOxygen {
        /// Seconds to add; negative values remove oxygen.
        seconds: i64,
    },
    /// Stop the oxygen clock, banking the remaining time.
    PauseOxygen,
    /// Restart the oxygen clock from the banked time.
    ResumeOxygen,
    /// Start a quest at stage 0.
    IssueQuest {
        /// Quest to issue.
        quest: QuestId,
    },
    /// Move a quest to `stage`. Stages never decrease.
    AdvanceQuest {
        /// Quest to advance.
        quest: QuestId,
        /// Target stage.
        stage: u32,
        /// Issue the quest first if the player does not have it yet.
        #[serde(default)]
        issue_if_missing: bool,
    },
    /// Append a journal entry.
    AddMessage {
        /// Message text.
        text: String,
        /// Audience; public messages also go to the global board.
        #[serde(default)]
        visibility: Visibility,
    },
    /// Append to the public board without touching any journal.
    Announce {
        /// Message text.
        text: String,
    },
    /// Teleport the player.
    MoveTo {
        /// Destination.
        location: LocationId,
    },
    /// Set or clear the challenge-mode deadline.
    SetChallengeMode {
        /// New deadline, `None` to clear.
        deadline: Option<DateTime<Utc>>,
    },
    /// Stage or clear the pending action. Performs no legality check.
    SetPendingAction {
        /// Token to stage, `None` to clear.
        action: Option<ActionId>,
    },
    /// Put an oxygen stream on cooldown for the player.
    SetStreamCooldown {
        /// Stream to cool down.
        stream: StreamId,
        /// Cooldown length.
        seconds: i64,
    },
    /// Clear one stream cooldown, or all of them.
    ResetStreamCooldown {
        /// Stream to reset; `None` resets every stream.
        stream: Option<StreamId>,
    },
    /// Record an activation of a linked-stream role by the player,
    /// overwriting any previous activation of that role.
    ActivateLinkedStream {
        /// Role activated.
        role: LinkedRole,
    },
    /// Return one linked-stream role to idle.
    ClearLinkedStream {
        /// Role to clear.
        role: LinkedRole,
    },
    /// Return both linked-stream roles to idle.
    ClearLinkedStreams,
    /// Set the crimson master switch; `None` toggles it.
    SetCrimsonMasterSwitch {
        /// New value, `None` to toggle.
        value: Option<bool>,
    },
    /// Reset the player after running out of oxygen.
    Kill,
    /// Resolve and apply the player's pending action.
    ApplyAction,
    /// Apply every step against one evolving snapshot, all-or-nothing.
    Composite {
        /// Steps, in order.
        steps: Vec<Transform>,
    },
}

fn one() -> u32 {
    1
}

/// Builds a transform applying `steps` as a single atomic unit.
#[must_use]
pub fn composite(steps: impl IntoIterator<Item = Transform>) -> Transform {
    Transform::Composite {
        steps: steps.into_iter().collect(),
    }
}

impl Transform {
    /// A private journal entry.
    #[must_use]
    pub fn message(text: impl Into<String>) -> Self {
        Self::AddMessage {
            text: text.into(),
            visibility: Visibility::Private,
        }
    }

    /// A journal entry that is also posted to the public board.
    #[must_use]
    pub fn public_message(text: impl Into<String>) -> Self {
        Self::AddMessage {
            text: text.into(),
            visibility: Visibility::Public,
        }
    }

    /// A moderator announcement on the public board.
    #[must_use]
    pub fn announcement(text: impl Into<String>) -> Self {
        Self::Announce { text: text.into() }
    }

    /// Returns a short name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddItem { .. } => "add_item",
            Self::RemoveItem { .. } => "remove_item",
            Self::AddOxygen { .. } => "add_oxygen",
            Self::PauseOxygen => "pause_oxygen",
            Self::ResumeOxygen => "resume_oxygen",
            Self::IssueQuest { .. } => "issue_quest",
            Self::AdvanceQuest { .. } => "advance_quest",
            Self::AddMessage { .. } => "add_message",
            Self::Announce { .. } => "announce",
            Self::MoveTo { .. } => "move_to",
            Self::SetChallengeMode { .. } => "set_challenge_mode",
            Self::SetPendingAction { .. } => "set_pending_action",
            Self::SetStreamCooldown { .. } => "set_stream_cooldown",
            Self::ResetStreamCooldown { .. } => "reset_stream_cooldown",
            Self::ActivateLinkedStream { .. } => "activate_linked_stream",
            Self::ClearLinkedStream { .. } => "clear_linked_stream",
            Self::ClearLinkedStreams => "clear_linked_streams",
            Self::SetCrimsonMasterSwitch { .. } => "set_crimson_master_switch",
            Self::Kill => "kill",
            Self::ApplyAction => "apply_action",
            Self::Composite { .. } => "composite",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effects_deserialize_from_yaml() {
        // Arrange
        let yaml = r"
- type: remove_item
  item: kelp
- type: add_item
  item: tank
  qty: 2
- type: advance_quest
  quest: 3
  stage: 2
- type: add_message
  text: You fill the tank.
- type: kill
";

        // Act
        let effects: Vec<Transform> = serde_yaml::from_str(yaml).unwrap();

        // Assert
        assert_eq!(
            effects,
            vec![
                Transform::RemoveItem {
                    item: ItemId::new("kelp"),
                    qty: 1
                },
                Transform::AddItem {
                    item: ItemId::new("tank"),
                    qty: 2
                },
                Transform::AdvanceQuest {
                    quest: QuestId(3),
                    stage: 2,
                    issue_if_missing: false
                },
                Transform::message("You fill the tank."),
                Transform::Kill,
            ]
        );
    }

    #[test]
    fn test_name_matches_serde_tag() {
        for transform in [
            Transform::announcement("Low tide."),
            Transform::ClearLinkedStreams,
            composite([Transform::Kill]),
        ] {
            let json = serde_json::to_value(&transform).unwrap();
            assert_eq!(json["type"], transform.name());
        }
    }

    #[test]
    fn test_composite_collects_steps_in_order() {
        let transform = composite([Transform::Kill, Transform::ApplyAction]);
        match transform {
            Transform::Composite { steps } => {
                assert_eq!(steps, vec![Transform::Kill, Transform::ApplyAction]);
            }
            other => panic!("expected Composite, got {other:?}"),
        }
    }
}

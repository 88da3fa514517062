//! The content catalog.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tidewell_core::error::GameError;
use tidewell_world_state::domain::ids::{ActionId, ItemId, LocationId, QuestId, StreamId};
use tidewell_world_state::domain::transforms::Transform;

use super::requirements::Requirement;

/// Item metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDef {
    /// Display name.
    pub name: String,
    /// Flavour text.
    #[serde(default)]
    pub description: String,
}

/// Quest stage definitions. Stage `n` is `stages[n]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestDef {
    /// Display name.
    pub name: String,
    /// Stage descriptions, starting at stage 0.
    pub stages: Vec<String>,
}

impl QuestDef {
    /// Returns the last valid stage index.
    #[must_use]
    pub fn final_stage(&self) -> u32 {
        u32::try_from(self.stages.len().saturating_sub(1)).unwrap_or(u32::MAX)
    }
}

/// An oxygen stream with its own per-player cooldown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDef {
    /// Display name.
    pub name: String,
}

/// An action legal at one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDef {
    /// Label shown to players.
    pub label: String,
    /// Conditions checked before the effects run.
    #[serde(default)]
    pub requires: Vec<Requirement>,
    /// Transforms applied, as one atomic unit, when the action is approved.
    #[serde(default)]
    pub effects: Vec<Transform>,
}

/// A location and the actions legal there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationDef {
    /// Display name.
    pub name: String,
    /// Legal actions by token.
    #[serde(default)]
    pub actions: BTreeMap<ActionId, ActionDef>,
}

/// Where fresh and respawned players start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartingRules {
    /// Location of a fresh player.
    pub location: LocationId,
    /// Oxygen granted to a fresh or respawned player.
    pub oxygen_seconds: i64,
    /// Location a player is reset to after running out of oxygen.
    pub respawn_location: LocationId,
    /// Journal entry appended on death.
    pub death_message: String,
}

/// Challenge-mode completion rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeRules {
    /// Quest whose stage flag must be set for completion.
    pub prerequisite_quest: QuestId,
    /// Stage flag required.
    pub prerequisite_stage: u32,
    /// Quest advanced on completion.
    pub reward_quest: QuestId,
    /// Stage the reward quest is advanced to.
    pub reward_stage: u32,
    /// Journal entry appended on completion.
    pub completion_message: String,
}

/// Linked oxygen streams reward and messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedStreamRules {
    /// Oxygen granted to both activators on success.
    pub reward_oxygen_seconds: i64,
    /// Journal entry appended on success.
    pub success_message: String,
    /// Journal entry appended when an activation expires unmatched.
    pub failure_message: String,
}

/// The full read-only catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Locations by identifier.
    pub locations: BTreeMap<LocationId, LocationDef>,
    /// Items by identifier.
    #[serde(default)]
    pub items: BTreeMap<ItemId, ItemDef>,
    /// Quests by identifier.
    #[serde(default)]
    pub quests: BTreeMap<QuestId, QuestDef>,
    /// Oxygen streams by identifier.
    #[serde(default)]
    pub streams: BTreeMap<StreamId, StreamDef>,
    /// Starting and respawn rules.
    pub start: StartingRules,
    /// Challenge-mode rules.
    pub challenge: ChallengeRules,
    /// Linked-streams rules.
    pub linked_streams: LinkedStreamRules,
    /// SHA-256 of the source document. Set by the loader.
    #[serde(skip)]
    pub fingerprint: String,
}

impl Catalog {
    /// Returns the location definition.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Validation` if the location is unknown.
    pub fn location(&self, id: &LocationId) -> Result<&LocationDef, GameError> {
        self.locations
            .get(id)
            .ok_or_else(|| GameError::Validation(format!("Invalid location {id}.")))
    }

    /// Returns the action `action` at `location`, if it is legal there.
    #[must_use]
    pub fn action_at(&self, location: &LocationId, action: &ActionId) -> Option<&ActionDef> {
        self.locations.get(location)?.actions.get(action)
    }

    /// Returns the item definition.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Validation` if the item is unknown.
    pub fn item(&self, id: &ItemId) -> Result<&ItemDef, GameError> {
        self.items
            .get(id)
            .ok_or_else(|| GameError::Validation(format!("Unknown item with id {id}")))
    }

    /// Returns the quest definition.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Validation` if the quest is unknown.
    pub fn quest(&self, id: QuestId) -> Result<&QuestDef, GameError> {
        self.quests
            .get(&id)
            .ok_or_else(|| GameError::Validation(format!("Invalid quest ID {id}.")))
    }

    /// Returns the stream definition.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Validation` if the stream is unknown.
    pub fn stream(&self, id: &StreamId) -> Result<&StreamDef, GameError> {
        self.streams
            .get(id)
            .ok_or_else(|| GameError::Validation(format!("Unknown stream {id}.")))
    }

    /// Checks that every identifier the catalog refers to is defined.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Validation` naming the first dangling reference.
    pub fn validate(&self) -> Result<(), GameError> {
        self.location(&self.start.location)?;
        self.location(&self.start.respawn_location)?;
        self.check_stage(self.challenge.prerequisite_quest, self.challenge.prerequisite_stage)?;
        self.check_stage(self.challenge.reward_quest, self.challenge.reward_stage)?;

        for (location_id, location) in &self.locations {
            for (action_id, action) in &location.actions {
                let in_action = |e: GameError| {
                    GameError::Validation(format!("{location_id}/{action_id}: {e}"))
                };
                for requirement in &action.requires {
                    self.validate_requirement(requirement).map_err(in_action)?;
                }
                for effect in &action.effects {
                    self.validate_transform(effect).map_err(in_action)?;
                }
            }
        }
        Ok(())
    }

    fn check_stage(&self, quest: QuestId, stage: u32) -> Result<(), GameError> {
        let def = self.quest(quest)?;
        if stage > def.final_stage() {
            return Err(GameError::Validation(format!(
                "quest {quest} has no stage {stage}"
            )));
        }
        Ok(())
    }

    fn validate_requirement(&self, requirement: &Requirement) -> Result<(), GameError> {
        match requirement {
            Requirement::HasItem { item, .. } | Requirement::LacksItem { item } => {
                self.item(item).map(|_| ())
            }
            Requirement::QuestAtStage { quest, stage }
            | Requirement::QuestBeforeStage { quest, stage } => self.check_stage(*quest, *stage),
            Requirement::QuestNotIssued { quest } => self.quest(*quest).map(|_| ()),
            Requirement::StreamReady { stream } => self.stream(stream).map(|_| ()),
            Requirement::CrimsonSwitch { .. } | Requirement::OxygenRunning => Ok(()),
        }
    }

    fn validate_transform(&self, transform: &Transform) -> Result<(), GameError> {
        match transform {
            Transform::AddItem { item, .. } | Transform::RemoveItem { item, .. } => {
                self.item(item).map(|_| ())
            }
            Transform::IssueQuest { quest } => self.quest(*quest).map(|_| ()),
            Transform::AdvanceQuest { quest, stage, .. } => self.check_stage(*quest, *stage),
            Transform::MoveTo { location } => self.location(location).map(|_| ()),
            Transform::SetStreamCooldown { stream, .. } => self.stream(stream).map(|_| ()),
            Transform::ResetStreamCooldown { stream } => match stream {
                Some(stream) => self.stream(stream).map(|_| ()),
                None => Ok(()),
            },
            Transform::Composite { steps } => {
                steps.iter().try_for_each(|step| self.validate_transform(step))
            }
            Transform::ApplyAction => Err(GameError::Validation(
                "apply_action cannot be an action effect".to_owned(),
            )),
            Transform::AddOxygen { .. }
            | Transform::PauseOxygen
            | Transform::ResumeOxygen
            | Transform::AddMessage { .. }
            | Transform::Announce { .. }
            | Transform::SetChallengeMode { .. }
            | Transform::SetPendingAction { .. }
            | Transform::ActivateLinkedStream { .. }
            | Transform::ClearLinkedStream { .. }
            | Transform::ClearLinkedStreams
            | Transform::SetCrimsonMasterSwitch { .. }
            | Transform::Kill => Ok(()),
        }
    }
}

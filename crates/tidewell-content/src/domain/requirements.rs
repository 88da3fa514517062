//! Action requirements.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tidewell_core::error::GameError;
use tidewell_world_state::domain::ids::{ItemId, QuestId, StreamId};
use tidewell_world_state::domain::state::{GlobalState, PlayerState};

/// A condition that must hold before an action may be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Requirement {
    /// The player holds at least `qty` of `item`.
    HasItem {
        /// Required item.
        item: ItemId,
        /// Minimum quantity.
        #[serde(default = "one")]
        qty: u32,
    },
    /// The player holds none of `item`.
    LacksItem {
        /// Forbidden item.
        item: ItemId,
    },
    /// `stage` of `quest` has been reached.
    QuestAtStage {
        /// Quest to inspect.
        quest: QuestId,
        /// Stage flag that must be set.
        stage: u32,
    },
    /// The quest is issued and its current stage is below `stage`.
    QuestBeforeStage {
        /// Quest to inspect.
        quest: QuestId,
        /// Exclusive upper bound.
        stage: u32,
    },
    /// The player has not been issued `quest`.
    QuestNotIssued {
        /// Quest to inspect.
        quest: QuestId,
    },
    /// The crimson master switch is in the given position.
    CrimsonSwitch {
        /// Required position.
        value: bool,
    },
    /// The stream is not on cooldown for the player.
    StreamReady {
        /// Stream to inspect.
        stream: StreamId,
    },
    /// The player's oxygen clock is not paused.
    OxygenRunning,
}

fn one() -> u32 {
    1
}

impl Requirement {
    /// Checks the requirement against a player.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Precondition` describing the unmet condition.
    pub fn check(
        &self,
        player: &PlayerState,
        global: &GlobalState,
        now: DateTime<Utc>,
    ) -> Result<(), GameError> {
        let met = match self {
            Self::HasItem { item, qty } => player.item_quantity(item) >= *qty,
            Self::LacksItem { item } => player.item_quantity(item) == 0,
            Self::QuestAtStage { quest, stage } => player.has_quest_flag(*quest, *stage),
            Self::QuestBeforeStage { quest, stage } => {
                player.quest_stage(*quest).is_some_and(|current| current < *stage)
            }
            Self::QuestNotIssued { quest } => player.quest_stage(*quest).is_none(),
            Self::CrimsonSwitch { value } => global.crimson_master_switch == *value,
            Self::StreamReady { stream } => player
                .stream_cooldown_expiry
                .get(stream)
                .is_none_or(|expiry| *expiry <= now),
            Self::OxygenRunning => !player.paused_oxygen,
        };
        if met {
            Ok(())
        } else {
            Err(GameError::Precondition(self.describe()))
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::HasItem { item, qty } => format!("requires {qty} x {item}"),
            Self::LacksItem { item } => format!("must not be carrying {item}"),
            Self::QuestAtStage { quest, stage } => {
                format!("requires quest {quest} at stage {stage}")
            }
            Self::QuestBeforeStage { quest, stage } => {
                format!("requires quest {quest} issued and before stage {stage}")
            }
            Self::QuestNotIssued { quest } => format!("quest {quest} already issued"),
            Self::CrimsonSwitch { value: true } => "the crimson master switch is off".to_owned(),
            Self::CrimsonSwitch { value: false } => "the crimson master switch is on".to_owned(),
            Self::StreamReady { stream } => format!("stream {stream} is on cooldown"),
            Self::OxygenRunning => "oxygen clock is paused".to_owned(),
        }
    }
}

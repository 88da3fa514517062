//! The transform interpreter.
//!
//! [`apply`] is the one function that turns a [`Transform`] value into a state
//! change. It either succeeds or returns an error having left `state` exactly
//! as it found it: single-step transforms check every precondition before
//! writing, and composites and actions run against a scratch copy that only
//! replaces `state` once every step has succeeded.

use chrono::{DateTime, TimeDelta, Utc};
use tidewell_content::domain::catalog::Catalog;
use tidewell_core::error::GameError;
use tidewell_core::player::PlayerId;
use tidewell_world_state::domain::ids::{ItemId, QuestId};
use tidewell_world_state::domain::state::{
    Activation, GameState, LinkedStreams, Message, PlayerState, QuestProgress, Visibility,
};
use tidewell_world_state::domain::transforms::Transform;

/// Everything a transform may read besides the state itself.
#[derive(Debug, Clone, Copy)]
pub struct TransformContext<'a> {
    /// The instant the transform is applied at.
    pub now: DateTime<Utc>,
    /// The read-only content catalog.
    pub catalog: &'a Catalog,
}

/// Applies `transform` to `state` on behalf of `player_id`.
///
/// # Errors
///
/// Returns `GameError::Precondition` when a required condition is false,
/// `GameError::Validation` for unknown identifiers or out-of-range values and
/// `GameError::NotFound` for an unknown player. `state` is unchanged on error.
pub fn apply(
    transform: &Transform,
    state: &mut GameState,
    player_id: PlayerId,
    ctx: &TransformContext<'_>,
) -> Result<(), GameError> {
    let now = ctx.now;
    match transform {
        Transform::AddItem { item, qty } => {
            check_quantity(*qty)?;
            ctx.catalog.item(item)?;
            let player = state.player_mut(player_id)?;
            let held = player.item_quantity(item);
            let total = held
                .checked_add(*qty)
                .ok_or_else(|| GameError::Validation(format!("Illegal quantity {qty}.")))?;
            player.inventory.insert(item.clone(), total);
        }
        Transform::RemoveItem { item, qty } => {
            check_quantity(*qty)?;
            ctx.catalog.item(item)?;
            remove_item(state.player_mut(player_id)?, item, *qty)?;
        }
        Transform::AddOxygen { seconds } => {
            add_oxygen(state.player_mut(player_id)?, *seconds, now)?;
        }
        Transform::PauseOxygen => {
            let player = state.player_mut(player_id)?;
            if player.paused_oxygen {
                return Err(GameError::Precondition(format!(
                    "Player {player_id} is already paused."
                )));
            }
            player.banked_oxygen_ms = player
                .oxygen_until
                .map(|deadline| (deadline - now).num_milliseconds().max(0));
            player.oxygen_until = None;
            player.paused_oxygen = true;
        }
        Transform::ResumeOxygen => {
            let player = state.player_mut(player_id)?;
            if !player.paused_oxygen {
                return Err(GameError::Precondition(format!(
                    "Player {player_id} is not paused."
                )));
            }
            player.oxygen_until = match player.banked_oxygen_ms {
                Some(ms) => Some(offset(now, TimeDelta::try_milliseconds(ms))?),
                None => None,
            };
            player.banked_oxygen_ms = None;
            player.paused_oxygen = false;
        }
        Transform::IssueQuest { quest } => {
            ctx.catalog.quest(*quest)?;
            let player = state.player_mut(player_id)?;
            if player.quests.contains_key(quest) {
                return Err(GameError::Precondition(format!(
                    "Quest {quest} has already been issued."
                )));
            }
            player.quests.insert(*quest, issued());
        }
        Transform::AdvanceQuest {
            quest,
            stage,
            issue_if_missing,
        } => {
            advance_quest(
                state.player_mut(player_id)?,
                ctx.catalog,
                *quest,
                *stage,
                *issue_if_missing,
            )?;
        }
        Transform::AddMessage { text, visibility } => {
            let message = Message {
                text: text.clone(),
                visibility: *visibility,
                sent_at: now,
            };
            let player = state.player_mut(player_id)?;
            if *visibility == Visibility::Public {
                player.journal.push(message.clone());
                state.global.public_messages.push(message);
            } else {
                player.journal.push(message);
            }
        }
        Transform::Announce { text } => {
            state.global.public_messages.push(Message {
                text: text.clone(),
                visibility: Visibility::Public,
                sent_at: now,
            });
        }
        Transform::MoveTo { location } => {
            ctx.catalog.location(location)?;
            state.player_mut(player_id)?.location_id = location.clone();
        }
        Transform::SetChallengeMode { deadline } => {
            state.player_mut(player_id)?.challenge_mode = *deadline;
        }
        Transform::SetPendingAction { action } => {
            state.player_mut(player_id)?.pending_action.clone_from(action);
        }
        Transform::SetStreamCooldown { stream, seconds } => {
            ctx.catalog.stream(stream)?;
            let expiry = offset(now, TimeDelta::try_seconds(*seconds))?;
            state
                .player_mut(player_id)?
                .stream_cooldown_expiry
                .insert(stream.clone(), expiry);
        }
        Transform::ResetStreamCooldown { stream } => {
            let cooldowns = &mut state.player_mut(player_id)?.stream_cooldown_expiry;
            match stream {
                Some(stream) => {
                    cooldowns.remove(stream);
                }
                None => cooldowns.clear(),
            }
        }
        Transform::ActivateLinkedStream { role } => {
            state.player(player_id)?;
            *state.global.linked_streams.slot_mut(*role) = Some(Activation {
                player_id,
                activated_at: now,
            });
        }
        Transform::ClearLinkedStream { role } => {
            *state.global.linked_streams.slot_mut(*role) = None;
        }
        Transform::ClearLinkedStreams => {
            state.global.linked_streams = LinkedStreams::default();
        }
        Transform::SetCrimsonMasterSwitch { value } => {
            let switch = &mut state.global.crimson_master_switch;
            *switch = value.unwrap_or(!*switch);
        }
        Transform::Kill => {
            let start = &ctx.catalog.start;
            ctx.catalog.location(&start.respawn_location)?;
            let oxygen_until = offset(now, TimeDelta::try_seconds(start.oxygen_seconds))?;
            let player = state.player_mut(player_id)?;
            player.location_id = start.respawn_location.clone();
            player.inventory.clear();
            player.pending_action = None;
            player.challenge_mode = None;
            player.paused_oxygen = false;
            player.banked_oxygen_ms = None;
            player.oxygen_until = Some(oxygen_until);
            player.journal.push(Message {
                text: start.death_message.clone(),
                visibility: Visibility::Private,
                sent_at: now,
            });
        }
        Transform::ApplyAction => apply_action(state, player_id, ctx)?,
        Transform::Composite { steps } => {
            let mut working = state.clone();
            for step in steps {
                apply(step, &mut working, player_id, ctx)?;
            }
            *state = working;
        }
    }
    Ok(())
}

/// Resolves the player's pending action against their current location,
/// checks its requirements and applies its effects, clearing the pending
/// action in the same atomic unit.
fn apply_action(
    state: &mut GameState,
    player_id: PlayerId,
    ctx: &TransformContext<'_>,
) -> Result<(), GameError> {
    let player = state.player(player_id)?;
    let token = player
        .pending_action
        .clone()
        .ok_or_else(|| GameError::Precondition(format!("Player {player_id} has no pending action.")))?;
    let action = ctx
        .catalog
        .action_at(&player.location_id, &token)
        .ok_or_else(|| {
            GameError::Precondition(format!(
                "Action {token} is not possible at {}.",
                player.location_id
            ))
        })?;
    for requirement in &action.requires {
        requirement.check(player, &state.global, ctx.now)?;
    }

    let mut working = state.clone();
    working.player_mut(player_id)?.pending_action = None;
    for effect in &action.effects {
        apply(effect, &mut working, player_id, ctx)?;
    }
    *state = working;
    Ok(())
}

fn check_quantity(qty: u32) -> Result<(), GameError> {
    if qty == 0 {
        return Err(GameError::Validation("Illegal quantity 0.".to_owned()));
    }
    Ok(())
}

fn remove_item(player: &mut PlayerState, item: &ItemId, qty: u32) -> Result<(), GameError> {
    let held = player.item_quantity(item);
    if held < qty {
        return Err(GameError::Precondition(format!(
            "Player holds {held} x {item}, needs {qty}."
        )));
    }
    if held == qty {
        player.inventory.remove(item);
    } else {
        player.inventory.insert(item.clone(), held - qty);
    }
    Ok(())
}

fn add_oxygen(player: &mut PlayerState, seconds: i64, now: DateTime<Utc>) -> Result<(), GameError> {
    let delta = TimeDelta::try_seconds(seconds).ok_or_else(|| out_of_range(seconds))?;
    if player.paused_oxygen {
        let banked = player
            .banked_oxygen_ms
            .unwrap_or(0)
            .checked_add(delta.num_milliseconds())
            .ok_or_else(|| out_of_range(seconds))?;
        player.banked_oxygen_ms = Some(banked.max(0));
        return Ok(());
    }
    let base = player.oxygen_until.map_or(now, |deadline| deadline.max(now));
    player.oxygen_until = Some(offset(base, Some(delta))?);
    Ok(())
}

fn advance_quest(
    player: &mut PlayerState,
    catalog: &Catalog,
    quest: QuestId,
    stage: u32,
    issue_if_missing: bool,
) -> Result<(), GameError> {
    let def = catalog.quest(quest)?;
    if stage > def.final_stage() {
        return Err(GameError::Validation(format!(
            "Quest {quest} has no stage {stage}."
        )));
    }
    if !player.quests.contains_key(&quest) {
        if !issue_if_missing {
            return Err(GameError::Precondition(format!(
                "Quest {quest} has not been issued."
            )));
        }
        player.quests.insert(quest, issued());
    }
    let progress = player
        .quests
        .get_mut(&quest)
        .ok_or_else(|| GameError::Precondition(format!("Quest {quest} has not been issued.")))?;
    if stage < progress.stage {
        return Err(GameError::Validation(format!(
            "Quest {quest} is at stage {}; cannot go back to stage {stage}.",
            progress.stage
        )));
    }
    progress.stage = stage;
    progress.stages.insert(stage);
    Ok(())
}

fn issued() -> QuestProgress {
    QuestProgress {
        stage: 0,
        stages: [0].into_iter().collect(),
    }
}

fn offset(base: DateTime<Utc>, delta: Option<TimeDelta>) -> Result<DateTime<Utc>, GameError> {
    delta
        .and_then(|delta| base.checked_add_signed(delta))
        .ok_or_else(|| GameError::Validation("time offset out of range".to_owned()))
}

fn out_of_range(seconds: i64) -> GameError {
    GameError::Validation(format!("Invalid delta {seconds}."))
}

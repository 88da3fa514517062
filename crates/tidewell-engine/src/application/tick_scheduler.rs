//! The tick scheduler.
//!
//! Each tick runs, inside one critical section and in this order: oxygen
//! expiry, challenge-mode completion, linked-stream expiry for each role, and
//! the linked-stream match. Player checks finish before global checks, and
//! expiry finishes before matching so a just-expired activation can never be
//! matched. Every branch pushes its notifications as soon as it has mutated.

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use tidewell_core::error::GameError;
use tidewell_core::player::PlayerId;
use tidewell_world_state::domain::ids::LinkedRole;
use tidewell_world_state::domain::transforms::{Transform, composite};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::application::store::{GameStore, Transaction};

/// How long a linked-stream activation stays live.
pub const LINKED_STREAM_WINDOW_MS: i64 = 120_000;

/// What one tick changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Players killed by oxygen exhaustion.
    pub oxygen_expired: usize,
    /// Players whose challenge mode completed.
    pub challenges_completed: usize,
    /// Linked-stream activations that expired unmatched.
    pub linked_streams_expired: usize,
    /// Whether both linked streams were matched.
    pub linked_streams_matched: bool,
    /// Branches skipped because their transform failed.
    pub failures: usize,
}

impl TickReport {
    /// Returns whether the tick changed nothing.
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        *self == Self::default()
    }
}

/// Runs one tick against the store.
pub fn tick(store: &GameStore) -> TickReport {
    store.transaction(run_tick)
}

/// Runs one tick inside an open transaction.
pub fn run_tick(txn: &mut Transaction<'_>) -> TickReport {
    let mut report = TickReport::default();
    expire_oxygen(txn, &mut report);
    complete_challenges(txn, &mut report);
    expire_linked_streams(txn, &mut report);
    match_linked_streams(txn, &mut report);
    report
}

fn expire_oxygen(txn: &mut Transaction<'_>, report: &mut TickReport) {
    let now = txn.now();
    let expired: Vec<PlayerId> = txn
        .state()
        .player_ids()
        .zip(&txn.state().players)
        .filter(|(_, player)| player.oxygen_until.is_some_and(|deadline| deadline < now))
        .map(|(player_id, _)| player_id)
        .collect();

    for player_id in expired {
        match txn.apply_and_notify(&Transform::Kill, player_id) {
            Ok(_) => {
                report.oxygen_expired += 1;
                info!(player_id = %player_id, "player ran out of oxygen");
            }
            Err(e) => skip(report, "oxygen expiry", &Transform::Kill, player_id, &e),
        }
    }
}

fn complete_challenges(txn: &mut Transaction<'_>, report: &mut TickReport) {
    let now = txn.now();
    let rules = txn.catalog().challenge.clone();
    let completed: Vec<PlayerId> = txn
        .state()
        .player_ids()
        .zip(&txn.state().players)
        .filter(|(_, player)| {
            player.challenge_mode.is_some_and(|deadline| deadline <= now)
                && player.has_quest_flag(rules.prerequisite_quest, rules.prerequisite_stage)
        })
        .map(|(player_id, _)| player_id)
        .collect();

    for player_id in completed {
        // A moderator may already have moved the quest past the reward stage.
        let already_rewarded = txn
            .state()
            .player(player_id)
            .is_ok_and(|p| p.quest_stage(rules.reward_quest) >= Some(rules.reward_stage));
        let mut steps = vec![Transform::message(rules.completion_message.clone())];
        if !already_rewarded {
            steps.push(Transform::AdvanceQuest {
                quest: rules.reward_quest,
                stage: rules.reward_stage,
                issue_if_missing: true,
            });
        }
        steps.push(Transform::SetChallengeMode { deadline: None });
        let completion = composite(steps);

        match txn.apply_and_notify(&completion, player_id) {
            Ok(_) => {
                report.challenges_completed += 1;
                info!(player_id = %player_id, "challenge mode completed");
            }
            Err(e) => skip(report, "challenge completion", &completion, player_id, &e),
        }
    }
}

fn expire_linked_streams(txn: &mut Transaction<'_>, report: &mut TickReport) {
    let now = txn.now();
    let window = TimeDelta::milliseconds(LINKED_STREAM_WINDOW_MS);
    let failure_message = txn.catalog().linked_streams.failure_message.clone();

    for role in LinkedRole::ALL {
        let Some(activation) = txn.state().global.linked_streams.get(role) else {
            continue;
        };
        if now - activation.activated_at <= window {
            continue;
        }
        let player_id = activation.player_id;
        let failure = composite([
            Transform::ClearLinkedStream { role },
            Transform::message(failure_message.clone()),
        ]);
        match txn.apply_and_notify(&failure, player_id) {
            Ok(_) => info!(player_id = %player_id, role = %role, "linked stream expired"),
            Err(e) => {
                skip(report, "linked stream expiry", &failure, player_id, &e);
                // The activation must not outlive its window even if the
                // activator can no longer be messaged.
                let clear = Transform::ClearLinkedStream { role };
                if let Err(e) = txn.apply_and_notify(&clear, player_id) {
                    skip(report, "linked stream expiry", &clear, player_id, &e);
                    continue;
                }
            }
        }
        report.linked_streams_expired += 1;
    }
}

fn match_linked_streams(txn: &mut Transaction<'_>, report: &mut TickReport) {
    let streams = txn.state().global.linked_streams;
    let (Some(salmon), Some(catfish)) = (streams.salmon, streams.catfish) else {
        return;
    };
    let rules = txn.catalog().linked_streams.clone();
    let reward = composite([
        Transform::message(rules.success_message),
        Transform::AddOxygen {
            seconds: rules.reward_oxygen_seconds,
        },
    ]);

    for player_id in [catfish.player_id, salmon.player_id] {
        if let Err(e) = txn.apply_and_notify(&reward, player_id) {
            skip(report, "linked stream reward", &reward, player_id, &e);
        }
    }
    if let Err(e) = txn.apply_and_notify(&Transform::ClearLinkedStreams, salmon.player_id) {
        skip(
            report,
            "linked stream reset",
            &Transform::ClearLinkedStreams,
            salmon.player_id,
            &e,
        );
        return;
    }
    report.linked_streams_matched = true;
    info!(
        salmon = %salmon.player_id,
        catfish = %catfish.player_id,
        "linked streams matched"
    );
}

fn skip(
    report: &mut TickReport,
    branch: &str,
    transform: &Transform,
    player_id: PlayerId,
    error: &GameError,
) {
    report.failures += 1;
    warn!(
        branch,
        transform = transform.name(),
        player_id = %player_id,
        error = %error,
        "tick branch skipped"
    );
}

/// Runs [`tick`] every `period` until `shutdown` turns `true` or its sender
/// is dropped. An overrunning tick delays the next one instead of
/// overlapping it.
pub async fn run_scheduler(
    store: Arc<GameStore>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(?period, "tick scheduler started");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let report = tick(&store);
                if !report.is_quiet() {
                    debug!(?report, "tick applied transitions");
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    info!("tick scheduler stopped");
}

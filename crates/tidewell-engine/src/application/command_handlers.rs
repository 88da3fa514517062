//! The moderator console.
//!
//! Parses a [`CommandRequest`], runs it inside a single store transaction
//! and converts the outcome, success or error, into a [`Reply`]. Errors never
//! leave a command half-applied: every state change a command makes is one
//! transform, and a failing transform writes nothing. `save` is the exception
//! to the transaction rule: it copies the state under the lock and writes it
//! after the lock is released.

use std::sync::Arc;

use chrono::TimeDelta;
use tidewell_content::application::query_handlers::legal_actions;
use tidewell_core::command::{CommandRequest, Reply};
use tidewell_core::error::{ErrorKind, GameError};
use tidewell_core::player::PlayerId;
use tidewell_core::repository::SnapshotRepository;
use tidewell_world_state::application::query_handlers::{get_by_path, keys_at_path};
use tidewell_world_state::domain::transforms::Transform;
use tracing::{info, warn};

use crate::application::fresh_state::fresh_state;
use crate::application::snapshots::save_snapshot;
use crate::application::store::{GameStore, Transaction};
use crate::domain::commands::{COMMAND_NAMES, ChallengeOp, ConsoleCommand, ModeratorCommand};

/// Executes moderator commands against the store.
pub struct ModeratorConsole {
    store: Arc<GameStore>,
    snapshots: Arc<dyn SnapshotRepository>,
    player_count: usize,
}

impl ModeratorConsole {
    /// Creates a console. `player_count` is used when the game is reset.
    #[must_use]
    pub fn new(
        store: Arc<GameStore>,
        snapshots: Arc<dyn SnapshotRepository>,
        player_count: usize,
    ) -> Self {
        Self {
            store,
            snapshots,
            player_count,
        }
    }

    /// Runs a command and always produces a reply.
    ///
    /// Rejected commands are only reported back to the moderator; an
    /// infrastructure failure is also logged.
    pub async fn dispatch(&self, request: &CommandRequest) -> Reply {
        self.execute(request).await.unwrap_or_else(|e| {
            if e.kind() == ErrorKind::Infrastructure {
                warn!(
                    correlation_id = %request.correlation_id,
                    command = %request.command,
                    error = %e,
                    "moderator command failed"
                );
            }
            Reply::from(e)
        })
    }

    /// Runs a command.
    ///
    /// # Errors
    ///
    /// Returns `GameError::NotFound` for an unknown command or state path,
    /// `GameError::Validation` for malformed arguments, and whatever the
    /// command's transform or the snapshot repository returns.
    pub async fn execute(&self, request: &CommandRequest) -> Result<Reply, GameError> {
        let command = ConsoleCommand::parse(request)?;
        let name = command.name();
        let reply = match command {
            ConsoleCommand::Save => {
                save_snapshot(&self.store, self.snapshots.as_ref()).await?;
                Reply::ok("Game saved.")
            }
            ConsoleCommand::Apply(command) => self
                .store
                .transaction(|txn| self.apply_command(txn, command))?,
        };
        info!(
            correlation_id = %request.correlation_id,
            command = name,
            args = ?request.args,
            "moderator command executed"
        );
        Ok(reply)
    }

    fn apply_command(
        &self,
        txn: &mut Transaction<'_>,
        command: ModeratorCommand,
    ) -> Result<Reply, GameError> {
        let reply = match command {
            ModeratorCommand::Help => Reply::help(format!(
                "Valid commands are: {}",
                COMMAND_NAMES.join(", ")
            )),
            ModeratorCommand::State { path, list_keys } => {
                if list_keys {
                    let keys = keys_at_path(txn.state(), &path)?;
                    Reply::help(format!("Valid keys are: {}", keys.join(", ")))
                } else {
                    Reply::ok(get_by_path(txn.state(), &path)?.to_string())
                }
            }
            ModeratorCommand::SetCrimsonSwitch { value } => {
                txn.apply_and_notify(&Transform::SetCrimsonMasterSwitch { value }, PlayerId(0))?;
                Reply::ok("Option set.")
            }
            ModeratorCommand::SetAction { player_id, action } => {
                let shown = action
                    .as_ref()
                    .map_or_else(|| "null".to_owned(), ToString::to_string);
                txn.apply_and_notify(&Transform::SetPendingAction { action }, player_id)?;
                Reply::ok(format!("Action set to {shown}."))
            }
            ModeratorCommand::Approve { player_id } => {
                txn.apply_and_notify(&Transform::ApplyAction, player_id)?;
                Reply::ok("Action approved.")
            }
            ModeratorCommand::IssueQuest { player_id, quest } => {
                txn.apply_and_notify(&Transform::IssueQuest { quest }, player_id)?;
                Reply::ok("Quest issued.")
            }
            ModeratorCommand::Advance {
                player_id,
                quest,
                stage,
            } => {
                let advance = Transform::AdvanceQuest {
                    quest,
                    stage,
                    issue_if_missing: true,
                };
                txn.apply_and_notify(&advance, player_id)?;
                Reply::ok("Quest advanced.")
            }
            ModeratorCommand::Move {
                player_id,
                location,
            } => {
                txn.apply_and_notify(&Transform::MoveTo { location }, player_id)?;
                Reply::ok("Player moved.")
            }
            ModeratorCommand::Oxygen {
                player_id,
                delta_seconds,
            } => {
                let add = Transform::AddOxygen {
                    seconds: delta_seconds,
                };
                txn.apply_and_notify(&add, player_id)?;
                Reply::ok("Oxygen added.")
            }
            ModeratorCommand::ResetCooldown { player_id, stream } => {
                let shown = stream
                    .as_ref()
                    .map_or_else(|| "all".to_owned(), ToString::to_string);
                txn.apply_and_notify(&Transform::ResetStreamCooldown { stream }, player_id)?;
                Reply::ok(format!("Cooldown reset for stream {shown}."))
            }
            ModeratorCommand::Pause { player_id } => {
                txn.apply_and_notify(&Transform::PauseOxygen, player_id)?;
                Reply::ok(format!("Player {player_id} paused."))
            }
            ModeratorCommand::Resume { player_id } => {
                txn.apply_and_notify(&Transform::ResumeOxygen, player_id)?;
                Reply::ok(format!("Player {player_id} resumed."))
            }
            ModeratorCommand::Time => Reply::ok(txn.now().to_rfc3339()),
            ModeratorCommand::Challenge { player_id, op } => challenge(txn, player_id, op)?,
            ModeratorCommand::Reset => {
                let state = fresh_state(txn.catalog(), self.player_count, txn.now())?;
                txn.replace(state);
                txn.notify_all();
                Reply::ok("Game reset.")
            }
            ModeratorCommand::Give {
                player_id,
                item,
                qty,
            } => {
                txn.apply_and_notify(&Transform::AddItem { item, qty }, player_id)?;
                Reply::ok("Item awarded.")
            }
            ModeratorCommand::Take {
                player_id,
                item,
                qty,
            } => {
                txn.catalog().item(&item)?;
                let held = txn.state().player(player_id)?.item_quantity(&item);
                if held == 0 {
                    return Err(GameError::Precondition(format!(
                        "Player does not have item {item}"
                    )));
                }
                let qty = qty.unwrap_or(held);
                txn.apply_and_notify(&Transform::RemoveItem { item, qty }, player_id)?;
                Reply::ok("Item taken.")
            }
            ModeratorCommand::Announce { text } => {
                txn.apply_and_notify(&Transform::announcement(text), PlayerId(0))?;
                Reply::ok("Announcement sent.")
            }
            ModeratorCommand::Legal { player_id } => {
                let location = &txn.state().player(player_id)?.location_id;
                let actions = legal_actions(txn.catalog(), location)?;
                let listed: Vec<String> = actions
                    .iter()
                    .map(|a| format!("{} ({})", a.action, a.label))
                    .collect();
                Reply::help(format!("Legal actions at {location}: {}", listed.join(", ")))
            }
        };
        Ok(reply)
    }
}

fn challenge(
    txn: &mut Transaction<'_>,
    player_id: PlayerId,
    op: ChallengeOp,
) -> Result<Reply, GameError> {
    let player = txn.state().player(player_id)?;
    if player.paused_oxygen {
        return Err(GameError::Precondition(
            "Cannot do this while paused.".to_owned(),
        ));
    }
    let deadline = match op {
        ChallengeOp::Set { seconds } => Some(shift(txn.now(), seconds)?),
        ChallengeOp::Change { delta_seconds } => {
            let current = player.challenge_mode.ok_or_else(|| {
                GameError::Precondition("Player is not in Challenge Mode.".to_owned())
            })?;
            Some(shift(current, delta_seconds)?)
        }
        ChallengeOp::Clear => None,
    };
    txn.apply_and_notify(&Transform::SetChallengeMode { deadline }, player_id)?;
    Ok(match deadline {
        Some(deadline) => Reply::ok(format!("Set challenge mode to {}.", deadline.to_rfc3339())),
        None => Reply::ok("Challenge mode cleared."),
    })
}

fn shift(
    base: chrono::DateTime<chrono::Utc>,
    seconds: i64,
) -> Result<chrono::DateTime<chrono::Utc>, GameError> {
    TimeDelta::try_seconds(seconds)
        .and_then(|delta| base.checked_add_signed(delta))
        .ok_or_else(|| GameError::Validation("Invalid argument.".to_owned()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, TimeDelta, TimeZone, Utc};
    use tidewell_content::application::loader::default_catalog;
    use tidewell_core::command::{CommandRequest, ReplyKind};
    use tidewell_core::repository::SnapshotRepository;
    use tidewell_test_support::{
        FailingSnapshotRepository, FixedClock, InMemorySnapshotRepository, RecordingNotifier,
    };
    use tidewell_world_state::domain::ids::{ItemId, LocationId, QuestId};

    use crate::application::command_handlers::ModeratorConsole;
    use crate::application::fresh_state::fresh_state;
    use crate::application::store::GameStore;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 18, 0, 0).unwrap()
    }

    struct Fixture {
        console: ModeratorConsole,
        store: Arc<GameStore>,
        notifier: Arc<RecordingNotifier>,
    }

    fn fixture_with(repo: Arc<dyn SnapshotRepository>) -> Fixture {
        let catalog = Arc::new(default_catalog().unwrap());
        let notifier = Arc::new(RecordingNotifier::new());
        let store = Arc::new(GameStore::new(
            fresh_state(&catalog, 2, now()).unwrap(),
            catalog,
            Arc::new(FixedClock(now())),
            notifier.clone(),
        ));
        Fixture {
            console: ModeratorConsole::new(Arc::clone(&store), repo, 2),
            store,
            notifier,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(Arc::new(InMemorySnapshotRepository::new()))
    }

    async fn run(f: &Fixture, command: &str, args: &[&str]) -> (ReplyKind, String) {
        let request = CommandRequest::new(command, args.iter().map(|a| (*a).to_owned()).collect());
        let reply = f.console.dispatch(&request).await;
        (reply.kind, reply.payload)
    }

    fn kelp(f: &Fixture, player: usize) -> u32 {
        f.store
            .read(|s| s.players[player].item_quantity(&ItemId::new("kelp")))
    }

    #[tokio::test]
    async fn test_give_and_take_adjust_inventory() {
        // Arrange
        let f = fixture();

        // Act
        let give = run(&f, "give", &["1", "kelp", "5"]).await;
        let take_some = run(&f, "take", &["1", "kelp", "2"]).await;
        let after_some = kelp(&f, 1);
        let take_all = run(&f, "take", &["1", "kelp"]).await;

        // Assert
        assert_eq!(give, (ReplyKind::Ok, "Item awarded.".to_owned()));
        assert_eq!(take_some.0, ReplyKind::Ok);
        assert_eq!(after_some, 3);
        assert_eq!(take_all.0, ReplyKind::Ok);
        assert_eq!(kelp(&f, 1), 0);
        assert!(f.notifier.player_updates(tidewell_core::player::PlayerId(1)) >= 3);
    }

    #[tokio::test]
    async fn test_take_more_than_held_changes_nothing() {
        let f = fixture();
        run(&f, "give", &["0", "kelp", "1"]).await;

        let (kind, _) = run(&f, "take", &["0", "kelp", "4"]).await;

        assert_eq!(kind, ReplyKind::Error);
        assert_eq!(kelp(&f, 0), 1);
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_commands_reply_error_without_mutation() {
        // Arrange
        let f = fixture();
        let before = f.store.snapshot();

        // Act
        let unknown = run(&f, "teleport", &["0", "tuna"]).await;
        let malformed = run(&f, "give", &["zero", "kelp"]).await;
        let bad_item = run(&f, "give", &["0", "trident"]).await;

        // Assert
        assert_eq!(unknown, (ReplyKind::Error, "teleport is not a known command.".to_owned()));
        assert_eq!(malformed.0, ReplyKind::Error);
        assert_eq!(bad_item, (ReplyKind::Error, "Unknown item with id trident".to_owned()));
        assert_eq!(f.store.snapshot(), before);
        assert!(f.notifier.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_help_lists_commands() {
        let f = fixture();
        let (kind, payload) = run(&f, "help", &[]).await;
        assert_eq!(kind, ReplyKind::Help);
        assert!(payload.starts_with("Valid commands are: help, state"));
    }

    #[tokio::test]
    async fn test_state_reads_paths_and_lists_keys() {
        let f = fixture();

        let location = run(&f, "state", &["players.0.location_id"]).await;
        let keys = run(&f, "state", &["global", "help"]).await;
        let missing = run(&f, "state", &["players.0.hat"]).await;

        assert_eq!(location, (ReplyKind::Ok, "\"bubble\"".to_owned()));
        assert_eq!(
            keys,
            (
                ReplyKind::Help,
                "Valid keys are: crimson_master_switch, linked_streams, public_messages".to_owned()
            )
        );
        assert_eq!(
            missing,
            (
                ReplyKind::Error,
                "Did not find component players.0.hat in game state.".to_owned()
            )
        );
    }

    #[tokio::test]
    async fn test_setaction_then_approve_applies_action() {
        // Arrange
        let f = fixture();

        // Act
        let staged = run(&f, "setaction", &["0", "gather_kelp"]).await;
        let approved = run(&f, "approve", &["0"]).await;
        let again = run(&f, "approve", &["0"]).await;

        // Assert
        assert_eq!(staged, (ReplyKind::Ok, "Action set to gather_kelp.".to_owned()));
        assert_eq!(approved, (ReplyKind::Ok, "Action approved.".to_owned()));
        assert_eq!(again.0, ReplyKind::Error);
        assert_eq!(kelp(&f, 0), 1);
    }

    #[tokio::test]
    async fn test_advance_issues_missing_quest_and_rejects_going_back() {
        let f = fixture();

        let forward = run(&f, "advance", &["1", "2", "3"]).await;
        let back = run(&f, "advance", &["1", "2", "1"]).await;

        assert_eq!(forward.0, ReplyKind::Ok);
        assert_eq!(back.0, ReplyKind::Error);
        assert_eq!(f.store.read(|s| s.players[1].quest_stage(QuestId(2))), Some(3));
    }

    #[tokio::test]
    async fn test_setglobal_toggles_switch_and_pushes_global_view() {
        let f = fixture();

        run(&f, "setglobal", &["crimsonMasterSwitch"]).await;

        assert!(f.store.read(|s| s.global.crimson_master_switch));
        assert_eq!(f.notifier.global_updates(), 1);
    }

    #[tokio::test]
    async fn test_challenge_set_change_clear() {
        // Arrange
        let f = fixture();

        // Act
        let set = run(&f, "challenge", &["0", "set", "1800"]).await;
        let changed = run(&f, "challenge", &["0", "change", "-600"]).await;
        let deadline = f.store.read(|s| s.players[0].challenge_mode);
        let cleared = run(&f, "challenge", &["0", "clear"]).await;

        // Assert
        assert_eq!(set.0, ReplyKind::Ok);
        assert_eq!(changed.0, ReplyKind::Ok);
        assert_eq!(deadline, Some(now() + TimeDelta::minutes(20)));
        assert_eq!(cleared, (ReplyKind::Ok, "Challenge mode cleared.".to_owned()));
        assert_eq!(f.store.read(|s| s.players[0].challenge_mode), None);
    }

    #[tokio::test]
    async fn test_challenge_rejected_while_paused_or_not_active() {
        let f = fixture();

        let change = run(&f, "challenge", &["1", "change", "60"]).await;
        run(&f, "pause", &["1"]).await;
        let set = run(&f, "challenge", &["1", "set", "60"]).await;

        assert_eq!(
            change,
            (ReplyKind::Error, "Player is not in Challenge Mode.".to_owned())
        );
        assert_eq!(set, (ReplyKind::Error, "Cannot do this while paused.".to_owned()));
    }

    #[tokio::test]
    async fn test_move_validates_location() {
        let f = fixture();

        let ok = run(&f, "move", &["1", "shrine"]).await;
        let bad = run(&f, "move", &["1", "atlantis"]).await;

        assert_eq!(ok, (ReplyKind::Ok, "Player moved.".to_owned()));
        assert_eq!(bad, (ReplyKind::Error, "Invalid location atlantis.".to_owned()));
        assert_eq!(
            f.store.read(|s| s.players[1].location_id.clone()),
            LocationId::new("shrine")
        );
    }

    #[tokio::test]
    async fn test_reset_restores_fresh_state_and_notifies_everyone() {
        // Arrange
        let f = fixture();
        run(&f, "give", &["0", "kelp", "3"]).await;
        f.notifier.clear();

        // Act
        let reply = run(&f, "reset", &[]).await;

        // Assert
        assert_eq!(reply, (ReplyKind::Ok, "Game reset.".to_owned()));
        assert_eq!(f.store.snapshot(), fresh_state(f.store.catalog(), 2, now()).unwrap());
        assert_eq!(f.notifier.notifications().len(), 3);
    }

    #[tokio::test]
    async fn test_save_writes_snapshot() {
        let repo = Arc::new(InMemorySnapshotRepository::new());
        let f = fixture_with(repo.clone());

        let reply = run(&f, "save", &[]).await;

        assert_eq!(reply, (ReplyKind::Ok, "Game saved.".to_owned()));
        assert_eq!(repo.saved().len(), 1);
    }

    #[tokio::test]
    async fn test_save_failure_replies_error() {
        let f = fixture_with(Arc::new(FailingSnapshotRepository));
        let (kind, payload) = run(&f, "save", &[]).await;
        assert_eq!(kind, ReplyKind::Error);
        assert!(payload.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_announce_posts_to_public_board_only() {
        let f = fixture();

        run(&f, "announce", &["Ten", "minutes", "left."]).await;

        f.store.read(|s| {
            assert_eq!(s.global.public_messages.len(), 1);
            assert_eq!(s.global.public_messages[0].text, "Ten minutes left.");
            assert!(s.players[0].journal.is_empty());
        });
    }

    #[tokio::test]
    async fn test_legal_lists_actions_at_player_location() {
        let f = fixture();
        let (kind, payload) = run(&f, "legal", &["0"]).await;
        assert_eq!(kind, ReplyKind::Help);
        assert!(payload.starts_with("Legal actions at bubble: breathe_vent"));
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[tokio::test]
    async fn test_rejected_commands_leave_no_log_entry() {
        // Arrange
        let f = fixture();
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        // Act
        let rejected = run(&f, "approve", &["1"]).await;
        let malformed = run(&f, "oxygen", &["1", "lots"]).await;
        let accepted = run(&f, "give", &["2", "pearl"]).await;

        // Assert
        assert_eq!(rejected.0, ReplyKind::Error);
        assert_eq!(malformed.0, ReplyKind::Error);
        assert_eq!(accepted.0, ReplyKind::Ok);
        let text = logs.text();
        assert_eq!(text.matches("moderator command executed").count(), 1);
        assert!(text.contains("give"));
        assert!(!text.contains("approve"));
        assert!(!text.contains("lots"));
    }

    #[tokio::test]
    async fn test_time_replies_with_clock_time() {
        let f = fixture();
        let reply = run(&f, "time", &[]).await;
        assert_eq!(reply, (ReplyKind::Ok, now().to_rfc3339()));
    }
}

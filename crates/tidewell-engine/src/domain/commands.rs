//! Moderator commands.
//!
//! A moderator sends a command name plus string arguments. Parsing turns that
//! into a typed [`ConsoleCommand`] without touching any state, so a
//! malformed command can never cause a partial mutation.

use tidewell_core::command::CommandRequest;
use tidewell_core::error::GameError;
use tidewell_core::player::PlayerId;
use tidewell_world_state::domain::ids::{ActionId, ItemId, LocationId, QuestId, StreamId};

/// Every command name, in the order `help` lists them.
pub const COMMAND_NAMES: [&str; 20] = [
    "help",
    "state",
    "setglobal",
    "setaction",
    "approve",
    "issuequest",
    "advance",
    "move",
    "oxygen",
    "resetcd",
    "pause",
    "resume",
    "time",
    "challenge",
    "reset",
    "save",
    "give",
    "take",
    "announce",
    "legal",
];

/// What to do with a player's challenge-mode deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeOp {
    /// Start a deadline `seconds` from now.
    Set { seconds: i64 },
    /// Move the existing deadline by `delta_seconds`.
    Change { delta_seconds: i64 },
    /// Leave challenge mode.
    Clear,
}

/// A parsed console request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Persist a snapshot. Runs outside the state lock.
    Save,
    /// A command executed inside one state transaction.
    Apply(ModeratorCommand),
}

impl ConsoleCommand {
    /// Parses a moderator request.
    ///
    /// # Errors
    ///
    /// Returns `GameError::NotFound` for an unknown command name and
    /// `GameError::Validation` for missing or malformed arguments.
    pub fn parse(request: &CommandRequest) -> Result<Self, GameError> {
        if request.command == "save" {
            return Ok(Self::Save);
        }
        ModeratorCommand::parse(request).map(Self::Apply)
    }

    /// The command's name as typed by a moderator.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Save => "save",
            Self::Apply(command) => command.name(),
        }
    }
}

/// A moderator command that reads or mutates the game state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeratorCommand {
    Help,
    /// Read the state at a dotted path, or list its keys.
    State { path: String, list_keys: bool },
    /// Set the crimson master switch; `None` toggles.
    SetCrimsonSwitch { value: Option<bool> },
    SetAction { player_id: PlayerId, action: Option<ActionId> },
    Approve { player_id: PlayerId },
    IssueQuest { player_id: PlayerId, quest: QuestId },
    Advance { player_id: PlayerId, quest: QuestId, stage: u32 },
    Move { player_id: PlayerId, location: LocationId },
    Oxygen { player_id: PlayerId, delta_seconds: i64 },
    /// Reset one stream cooldown, or all of them when `stream` is `None`.
    ResetCooldown { player_id: PlayerId, stream: Option<StreamId> },
    Pause { player_id: PlayerId },
    Resume { player_id: PlayerId },
    Time,
    Challenge { player_id: PlayerId, op: ChallengeOp },
    Reset,
    Give { player_id: PlayerId, item: ItemId, qty: u32 },
    /// Take `qty` of an item, or everything held when `qty` is `None`.
    Take { player_id: PlayerId, item: ItemId, qty: Option<u32> },
    Announce { text: String },
    /// List the actions legal at the player's location.
    Legal { player_id: PlayerId },
}

struct Args<'a> {
    inner: std::slice::Iter<'a, String>,
}

impl<'a> Args<'a> {
    fn next(&mut self) -> Option<&'a str> {
        self.inner.next().map(String::as_str)
    }

    fn required(&mut self) -> Result<&'a str, GameError> {
        self.next()
            .ok_or_else(|| GameError::Validation("Command incomplete.".to_owned()))
    }

    fn player(&mut self) -> Result<PlayerId, GameError> {
        self.required()?.parse()
    }

    fn integer<T: std::str::FromStr>(&mut self, what: &str) -> Result<T, GameError> {
        let raw = self.required()?;
        raw.parse()
            .map_err(|_| GameError::Validation(format!("Invalid {what} {raw}.")))
    }

    fn rest(&mut self) -> Vec<&'a str> {
        self.inner.by_ref().map(String::as_str).collect()
    }
}

impl ModeratorCommand {
    fn parse(request: &CommandRequest) -> Result<Self, GameError> {
        let mut args = Args {
            inner: request.args.iter(),
        };
        let command = match request.command.as_str() {
            "help" => Self::Help,
            "state" => match args.next() {
                None => Self::State {
                    path: String::new(),
                    list_keys: false,
                },
                Some("help") => Self::State {
                    path: String::new(),
                    list_keys: true,
                },
                Some(path) => Self::State {
                    path: path.to_owned(),
                    list_keys: args.next() == Some("help"),
                },
            },
            "setglobal" => match args.required()? {
                "crimsonMasterSwitch" | "crimson_master_switch" => Self::SetCrimsonSwitch {
                    value: match args.next() {
                        None | Some("toggle") => None,
                        Some("true") => Some(true),
                        Some("false") => Some(false),
                        Some(other) => {
                            return Err(GameError::Validation(format!("Unknown option {other}.")));
                        }
                    },
                },
                other => return Err(GameError::Validation(format!("Unknown option {other}."))),
            },
            "setaction" => {
                let player_id = args.player()?;
                let action = match args.rest().last() {
                    None | Some(&("clear" | "null")) => None,
                    Some(token) => Some(ActionId::new(*token)),
                };
                Self::SetAction { player_id, action }
            }
            "approve" => Self::Approve {
                player_id: args.player()?,
            },
            "issuequest" => Self::IssueQuest {
                player_id: args.player()?,
                quest: args.required()?.parse()?,
            },
            "advance" => {
                let player_id = args.player()?;
                let quest = args.required()?.parse()?;
                let stage = args.integer("stage")?;
                Self::Advance {
                    player_id,
                    quest,
                    stage,
                }
            }
            "move" => Self::Move {
                player_id: args.player()?,
                location: LocationId::new(args.required()?),
            },
            "oxygen" => Self::Oxygen {
                player_id: args.player()?,
                delta_seconds: args.integer("delta")?,
            },
            "resetcd" => Self::ResetCooldown {
                player_id: args.player()?,
                stream: match args.next() {
                    None | Some("all") => None,
                    Some(stream) => Some(StreamId::new(stream)),
                },
            },
            "pause" => Self::Pause {
                player_id: args.player()?,
            },
            "resume" => Self::Resume {
                player_id: args.player()?,
            },
            "time" => Self::Time,
            "challenge" => {
                let player_id = args.player()?;
                let op = match args.required()? {
                    "set" => {
                        let seconds: i64 = args.integer("argument")?;
                        if seconds <= 0 {
                            return Err(GameError::Validation("Invalid argument.".to_owned()));
                        }
                        ChallengeOp::Set { seconds }
                    }
                    "change" => ChallengeOp::Change {
                        delta_seconds: args.integer("argument")?,
                    },
                    "clear" => ChallengeOp::Clear,
                    _ => {
                        return Err(GameError::Validation(
                            "Unknown option. Should be set | change | clear.".to_owned(),
                        ));
                    }
                };
                Self::Challenge { player_id, op }
            }
            "reset" => Self::Reset,
            "give" => {
                let player_id = args.player()?;
                let item = ItemId::new(args.required()?);
                let qty = match args.next() {
                    None => 1,
                    Some(raw) => parse_quantity(raw)?,
                };
                Self::Give {
                    player_id,
                    item,
                    qty,
                }
            }
            "take" => {
                let player_id = args.player()?;
                let item = ItemId::new(args.required()?);
                let qty = match args.next() {
                    None | Some("all") => None,
                    Some(raw) => Some(parse_quantity(raw)?),
                };
                Self::Take {
                    player_id,
                    item,
                    qty,
                }
            }
            "announce" => {
                let text = args.rest().join(" ");
                if text.trim().is_empty() {
                    return Err(GameError::Validation("Announcement is empty.".to_owned()));
                }
                Self::Announce { text }
            }
            "legal" => Self::Legal {
                player_id: args.player()?,
            },
            other => {
                return Err(GameError::NotFound(format!(
                    "{other} is not a known command."
                )));
            }
        };
        Ok(command)
    }

    /// The command's name as typed by a moderator.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::State { .. } => "state",
            Self::SetCrimsonSwitch { .. } => "setglobal",
            Self::SetAction { .. } => "setaction",
            Self::Approve { .. } => "approve",
            Self::IssueQuest { .. } => "issuequest",
            Self::Advance { .. } => "advance",
            Self::Move { .. } => "move",
            Self::Oxygen { .. } => "oxygen",
            Self::ResetCooldown { .. } => "resetcd",
            Self::Pause { .. } => "pause",
            Self::Resume { .. } => "resume",
            Self::Time => "time",
            Self::Challenge { .. } => "challenge",
            Self::Reset => "reset",
            Self::Give { .. } => "give",
            Self::Take { .. } => "take",
            Self::Announce { .. } => "announce",
            Self::Legal { .. } => "legal",
        }
    }
}

fn parse_quantity(raw: &str) -> Result<u32, GameError> {
    match raw.parse::<u32>() {
        Ok(qty) if qty > 0 => Ok(qty),
        _ => Err(GameError::Validation(format!("Illegal quantity {raw}."))),
    }
}

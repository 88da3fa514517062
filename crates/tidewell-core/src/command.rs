//! Moderator command contract.
//!
//! A command is a name plus ordered string arguments; the answer is a
//! `(kind, payload)` pair.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GameError;

/// A textual moderator command as received from tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    /// Correlation ID to trace this command through the system.
    #[serde(default = "Uuid::new_v4")]
    pub correlation_id: Uuid,
    /// Command name, e.g. `give`.
    pub command: String,
    /// Ordered arguments.
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandRequest {
    /// Builds a request with a fresh correlation ID.
    #[must_use]
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            command: command.into(),
            args,
        }
    }
}

/// Kind of a moderator reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    /// The command succeeded.
    Ok,
    /// The payload lists valid options.
    Help,
    /// The command failed; nothing was mutated.
    Error,
}

/// A moderator reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    /// Reply kind.
    pub kind: ReplyKind,
    /// Human-readable or JSON payload.
    pub payload: String,
}

impl Reply {
    /// An `ok` reply.
    #[must_use]
    pub fn ok(payload: impl Into<String>) -> Self {
        Self {
            kind: ReplyKind::Ok,
            payload: payload.into(),
        }
    }

    /// A `help` reply.
    #[must_use]
    pub fn help(payload: impl Into<String>) -> Self {
        Self {
            kind: ReplyKind::Help,
            payload: payload.into(),
        }
    }

    /// An `error` reply.
    #[must_use]
    pub fn error(payload: impl Into<String>) -> Self {
        Self {
            kind: ReplyKind::Error,
            payload: payload.into(),
        }
    }
}

impl From<GameError> for Reply {
    fn from(err: GameError) -> Self {
        Self::error(err.to_string())
    }
}

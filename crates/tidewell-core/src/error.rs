//! Game error types.

use serde::Serialize;
use thiserror::Error;

/// Coarse classification of a [`GameError`], used by outer layers to pick a
/// reply or status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A transform's required condition is false.
    Precondition,
    /// Malformed external input.
    Validation,
    /// Unknown command, player or state path.
    NotFound,
    /// A privileged operation was invoked without privileges.
    Unauthorized,
    /// Persistence or I/O failure.
    Infrastructure,
}

/// Top-level error type shared by every Tidewell crate.
///
/// None of these leave a transform partially applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// A transform's precondition does not hold (missing item, no pending
    /// action, invalid state transition, ...).
    #[error("{0}")]
    Precondition(String),

    /// Malformed external input: unknown identifier, non-numeric or
    /// out-of-range argument.
    #[error("{0}")]
    Validation(String),

    /// Unknown command, player or state path.
    #[error("{0}")]
    NotFound(String),

    /// A non-privileged caller invoked a privileged operation.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl GameError {
    /// Returns the classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Precondition(_) => ErrorKind::Precondition,
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Infrastructure(_) => ErrorKind::Infrastructure,
        }
    }
}

//! Identifiers used throughout the state tree.
//!
//! Locations, items, streams and actions are catalog-defined, so they are
//! string newtypes validated against the content catalog at the boundary.
//! Quests are numbered.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tidewell_core::error::GameError;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Creates an identifier from anything string-like.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }
    };
}

string_id!(
    /// A location in the content catalog.
    LocationId
);
string_id!(
    /// An item in the content catalog.
    ItemId
);
string_id!(
    /// An oxygen stream with its own cooldown.
    StreamId
);
string_id!(
    /// A player-proposed action token, resolved against the current location.
    ActionId
);

/// A quest in the content catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestId(pub u32);

impl fmt::Display for QuestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for QuestId {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>()
            .map(QuestId)
            .map_err(|_| GameError::Validation(format!("Invalid quest ID {s}.")))
    }
}

/// One of the two ends of the linked oxygen streams puzzle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkedRole {
    /// The salmon end.
    Salmon,
    /// The catfish end.
    Catfish,
}

impl LinkedRole {
    /// Both roles, in evaluation order.
    pub const ALL: [LinkedRole; 2] = [LinkedRole::Salmon, LinkedRole::Catfish];

    /// Returns the role's wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Salmon => "salmon",
            Self::Catfish => "catfish",
        }
    }
}

impl fmt::Display for LinkedRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkedRole {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "salmon" => Ok(Self::Salmon),
            "catfish" => Ok(Self::Catfish),
            other => Err(GameError::NotFound(format!("unknown linked stream {other}"))),
        }
    }
}

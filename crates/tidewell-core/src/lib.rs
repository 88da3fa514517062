//! Tidewell Core — shared abstractions.
//!
//! This crate defines the traits and types that every other Tidewell crate
//! depends on: time, errors, player identity, the notification sink, the
//! snapshot repository and the moderator reply contract. It contains no
//! infrastructure code.

pub mod clock;
pub mod command;
pub mod error;
pub mod notification;
pub mod player;
pub mod repository;

//! Tidewell — Engine.
//!
//! Owns the authoritative game state and the only way to change it: transform
//! application inside a single critical section. Built on top of that are the
//! action-approval pipeline, the fixed-interval tick scheduler and the
//! moderator console.

pub mod application;
pub mod domain;

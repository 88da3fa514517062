//! Notification sink abstraction.
//!
//! The engine pushes a serialized view after every state-changing branch.
//! Delivery is fire-and-forget: a sink must never block the caller, and a
//! failed delivery is logged by the sink, not retried.

use serde::Serialize;

use crate::player::PlayerId;

/// A view pushed to connected clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// One player's serialized state, delivered to that player.
    PlayerUpdate {
        /// The player whose state changed.
        player_id: PlayerId,
        /// The serialized player view.
        payload: serde_json::Value,
    },
    /// The global view, delivered to every party.
    GlobalUpdate {
        /// The serialized global view.
        payload: serde_json::Value,
    },
}

impl Notification {
    /// Returns the player this notification targets, if any.
    #[must_use]
    pub fn player_id(&self) -> Option<PlayerId> {
        match self {
            Self::PlayerUpdate { player_id, .. } => Some(*player_id),
            Self::GlobalUpdate { .. } => None,
        }
    }
}

/// Trait implemented by notification fanout collaborators.
pub trait Notifier: Send + Sync {
    /// Pushes one notification. Must not block.
    fn notify(&self, notification: Notification);
}

/// A notifier that drops everything. Used by tools that have no clients.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _notification: Notification) {}
}

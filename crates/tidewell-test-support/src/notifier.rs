//! Recording notifier — captures every pushed view for assertions.

use std::sync::Mutex;

use tidewell_core::notification::{Notification, Notifier};
use tidewell_core::player::PlayerId;

/// A notifier that records every notification it receives.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything recorded so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn notifications(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    /// Returns how many player updates targeted `player_id`.
    pub fn player_updates(&self, player_id: PlayerId) -> usize {
        self.notifications()
            .iter()
            .filter(|n| n.player_id() == Some(player_id))
            .count()
    }

    /// Returns how many global updates were pushed.
    pub fn global_updates(&self) -> usize {
        self.notifications()
            .iter()
            .filter(|n| matches!(n, Notification::GlobalUpdate { .. }))
            .count()
    }

    /// Forgets everything recorded so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.sent.lock().unwrap().push(notification);
    }
}

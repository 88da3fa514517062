//! Notification fanout over a `tokio::sync::broadcast` channel.

use tidewell_core::notification::{Notification, Notifier};
use tokio::sync::broadcast;
use tracing::debug;

/// Publishes every notification to all connected stream clients.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    /// Creates a notifier publishing on `tx`.
    #[must_use]
    pub fn new(tx: broadcast::Sender<Notification>) -> Self {
        Self { tx }
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, notification: Notification) {
        // An error only means nobody is listening right now.
        if self.tx.send(notification).is_err() {
            debug!("no stream clients connected, notification dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use tidewell_core::player::PlayerId;

    use super::*;

    #[test]
    fn test_notify_reaches_subscribers() {
        // Arrange
        let (tx, mut rx) = broadcast::channel(8);
        let notifier = BroadcastNotifier::new(tx);

        // Act
        notifier.notify(Notification::PlayerUpdate {
            player_id: PlayerId(3),
            payload: serde_json::json!({ "player_id": 3 }),
        });

        // Assert
        let received = rx.try_recv().unwrap();
        assert_eq!(received.player_id(), Some(PlayerId(3)));
    }

    #[test]
    fn test_notify_without_subscribers_does_not_fail() {
        let (tx, rx) = broadcast::channel(8);
        drop(rx);
        let notifier = BroadcastNotifier::new(tx);

        notifier.notify(Notification::GlobalUpdate {
            payload: serde_json::json!({}),
        });
    }
}

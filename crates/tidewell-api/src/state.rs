//! Shared application state.

use std::sync::Arc;

use tidewell_core::notification::Notification;
use tidewell_engine::application::command_handlers::ModeratorConsole;
use tidewell_engine::application::store::GameStore;
use tokio::sync::broadcast;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The authoritative game store.
    pub store: Arc<GameStore>,
    /// Moderator command executor.
    pub console: Arc<ModeratorConsole>,
    /// Fanout the store's notifier publishes on; stream clients subscribe here.
    pub notifications: broadcast::Sender<Notification>,
    /// Bearer token for moderator routes.
    pub admin_token: Arc<str>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        store: Arc<GameStore>,
        console: Arc<ModeratorConsole>,
        notifications: broadcast::Sender<Notification>,
        admin_token: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            store,
            console,
            notifications,
            admin_token: admin_token.into(),
        }
    }
}

//! The authoritative game store.
//!
//! `GameStore` owns the one `GameState` instance behind a single mutex. Every
//! mutation goes through [`Transaction::apply`], which runs the transform
//! against a scratch copy and only swaps it in on success, so no caller ever
//! observes a half-applied transform. Callers that must see a consistent state
//! across several transforms (an approval, a whole tick, a moderator command)
//! run them inside one [`GameStore::transaction`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tidewell_content::domain::catalog::Catalog;
use tidewell_core::clock::Clock;
use tidewell_core::error::GameError;
use tidewell_core::notification::{Notification, Notifier};
use tidewell_core::player::PlayerId;
use tidewell_world_state::application::query_handlers::{global_view, player_view};
use tidewell_world_state::domain::state::GameState;
use tidewell_world_state::domain::transforms::Transform;
use tracing::warn;

use crate::domain::interpreter::{TransformContext, apply};

/// Owner of the single authoritative state tree.
pub struct GameStore {
    state: Mutex<GameState>,
    catalog: Arc<Catalog>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for GameStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameStore")
            .field("catalog_fingerprint", &self.catalog.fingerprint)
            .finish_non_exhaustive()
    }
}

impl GameStore {
    /// Creates a store owning `state`.
    #[must_use]
    pub fn new(
        state: GameState,
        catalog: Arc<Catalog>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            state: Mutex::new(state),
            catalog,
            clock,
            notifier,
        }
    }

    /// The content catalog transforms are resolved against.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The current time according to the store's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // A transform never writes into the live state until it has succeeded,
    // so a panic while the lock was held cannot have left it half-written.
    fn lock(&self) -> MutexGuard<'_, GameState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` inside the store's critical section.
    pub fn transaction<R>(&self, f: impl FnOnce(&mut Transaction<'_>) -> R) -> R {
        let mut guard = self.lock();
        let mut txn = Transaction {
            state: &mut *guard,
            catalog: &self.catalog,
            notifier: self.notifier.as_ref(),
            now: self.clock.now(),
        };
        f(&mut txn)
    }

    /// Applies one transform and reports whether anything changed.
    ///
    /// Does not notify; use [`Transaction::apply_and_notify`] for that.
    ///
    /// # Errors
    ///
    /// Returns the transform's error; the state is unchanged.
    pub fn apply_transform(
        &self,
        transform: &Transform,
        player_id: PlayerId,
    ) -> Result<bool, GameError> {
        self.transaction(|txn| txn.apply(transform, player_id))
    }

    /// Reads the state without mutating it.
    pub fn read<R>(&self, f: impl FnOnce(&GameState) -> R) -> R {
        f(&*self.lock())
    }

    /// Returns a copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> GameState {
        self.lock().clone()
    }
}

/// A view of the store held for the duration of one critical section.
pub struct Transaction<'a> {
    state: &'a mut GameState,
    catalog: &'a Catalog,
    notifier: &'a dyn Notifier,
    now: DateTime<Utc>,
}

impl Transaction<'_> {
    /// The instant this transaction runs at.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> &GameState {
        self.state
    }

    /// The content catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        self.catalog
    }

    /// Applies `transform` for `player_id`, returning whether the state
    /// changed.
    ///
    /// # Errors
    ///
    /// Returns the transform's error; the state is unchanged.
    pub fn apply(&mut self, transform: &Transform, player_id: PlayerId) -> Result<bool, GameError> {
        let ctx = TransformContext {
            now: self.now,
            catalog: self.catalog,
        };
        let mut working = self.state.clone();
        apply(transform, &mut working, player_id, &ctx)?;
        if working == *self.state {
            return Ok(false);
        }
        *self.state = working;
        Ok(true)
    }

    /// Applies `transform` and pushes the player view if the player changed
    /// and the global view if global state changed.
    ///
    /// # Errors
    ///
    /// Returns the transform's error; nothing is changed or pushed.
    pub fn apply_and_notify(
        &mut self,
        transform: &Transform,
        player_id: PlayerId,
    ) -> Result<bool, GameError> {
        let player_before = self.state.player(player_id).ok().cloned();
        let global_before = self.state.global.clone();
        if !self.apply(transform, player_id)? {
            return Ok(false);
        }
        if self.state.player(player_id).ok() != player_before.as_ref() {
            self.notify_player(player_id);
        }
        if self.state.global != global_before {
            self.notify_game();
        }
        Ok(true)
    }

    /// Replaces the whole state, as on reset or restore.
    pub fn replace(&mut self, state: GameState) {
        *self.state = state;
    }

    /// Pushes one player's view.
    pub fn notify_player(&self, player_id: PlayerId) {
        match player_view(self.state, player_id) {
            Ok(payload) => self.notifier.notify(Notification::PlayerUpdate { player_id, payload }),
            Err(e) => warn!(player_id = %player_id, error = %e, "player view unavailable"),
        }
    }

    /// Pushes the global view.
    pub fn notify_game(&self) {
        match global_view(self.state) {
            Ok(payload) => self.notifier.notify(Notification::GlobalUpdate { payload }),
            Err(e) => warn!(error = %e, "global view unavailable"),
        }
    }

    /// Pushes every player's view and the global view.
    pub fn notify_all(&self) {
        for player_id in self.state.player_ids() {
            self.notify_player(player_id);
        }
        self.notify_game();
    }
}

//! Clock abstraction.
//!
//! Every deadline in the game (oxygen, challenge mode, stream cooldowns,
//! linked-stream windows) is an absolute timestamp compared against
//! `Clock::now`, so tests can drive time explicitly.

use chrono::{DateTime, Utc};

/// Abstraction over wall-clock time.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock that delegates to the system clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

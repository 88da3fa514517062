//! Shared test doubles for the Tidewell engine.

mod clock;
mod notifier;
mod repository;

pub use clock::{FixedClock, ManualClock};
pub use notifier::RecordingNotifier;
pub use repository::{FailingSnapshotRepository, InMemorySnapshotRepository};

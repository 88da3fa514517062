//! Application layer for the engine.

pub mod action_pipeline;
pub mod command_handlers;
pub mod fresh_state;
pub mod snapshots;
pub mod store;
pub mod tick_scheduler;

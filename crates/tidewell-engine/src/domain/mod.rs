//! Domain layer for the engine.

pub mod commands;
pub mod interpreter;

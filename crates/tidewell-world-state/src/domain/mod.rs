//! Domain types for the World State context.

pub mod ids;
pub mod path;
pub mod state;
pub mod transforms;

//! Application layer for the World State context.

pub mod query_handlers;

//! Application layer for the Content Catalog context.

pub mod loader;
pub mod query_handlers;

//! Domain types for the Content Catalog context.

pub mod catalog;
pub mod requirements;

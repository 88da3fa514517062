//! Route modules organized by audience.

pub mod admin;
pub mod global;
pub mod health;
pub mod players;
pub mod stream;

//! Adapters for storage and built-in handlers.

pub mod handlers;
pub mod sqlite;

//! Built-in handler implementations.

pub mod journal;

pub use journal::JournalHandler;

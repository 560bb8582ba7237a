//! Lifelog API client: polling event source and search.

pub mod client;
pub mod types;

pub use client::{LifelogApiClient, LifelogApiClientConfig};

//! Domain layer for the lifelog routing engine
//!
//! This module contains the routing data model, handler contracts and the
//! ports that infrastructure adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};

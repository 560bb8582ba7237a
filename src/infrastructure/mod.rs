//! Infrastructure layer
//!
//! Concrete integrations behind the domain ports:
//! - Claude Messages API reasoning client
//! - Lifelog API polling and search
//! - Search-backed retrieval
//! - Notification sinks
//! - Configuration loading and logging

pub mod claude;
pub mod config;
pub mod lifelog_api;
pub mod logging;
pub mod notifications;
pub mod retrieval;

pub use config::{ConfigError, ConfigLoader};
pub use logging::{LogConfig, LoggerImpl};

//! Domain errors for the lifelog routing engine.

use thiserror::Error;

/// Domain-level errors that can occur while routing and dispatching events.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Handler not found: {0}")]
    HandlerNotFound(String),

    #[error("Duplicate handler registration: {0}")]
    DuplicateHandler(String),

    #[error("Invalid handler {name}: {reason}")]
    InvalidHandler { name: String, reason: String },

    #[error("Classification failed: {0}")]
    ClassificationFailed(String),

    #[error("Handler {handler} failed: {message}")]
    HandlerExecutionFailed { handler: String, message: String },

    #[error("Dedup ledger failure: {0}")]
    DedupStore(String),

    #[error("Retrieval failed: {0}")]
    RetrievalFailed(String),

    #[error("Notification failed: {0}")]
    NotificationFailed(String),

    #[error("Event source failed: {0}")]
    EventSourceFailed(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

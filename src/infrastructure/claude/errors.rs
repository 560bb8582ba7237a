use reqwest::StatusCode;
use thiserror::Error;

use crate::domain::ports::ReasoningError;
use crate::infrastructure::logging::SecretScrubber;

/// Errors that can occur when interacting with the Claude API
#[derive(Error, Debug)]
pub enum ClaudeApiError {
    /// Invalid request parameters (HTTP 400)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid or missing API key (HTTP 401)
    #[error("Invalid API key - authentication failed")]
    InvalidApiKey,

    /// Forbidden - permission denied (HTTP 403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found (HTTP 404)
    #[error("Resource not found")]
    NotFound,

    /// Rate limit exceeded (HTTP 429)
    #[error("Rate limit exceeded - too many requests")]
    RateLimitExceeded,

    /// Server error from Claude API (HTTP 500, 502, 503, 504, 529)
    #[error("Server error ({0}): {1}")]
    ServerError(StatusCode, String),

    /// Network or connection error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// No API key in configuration or environment
    #[error("Missing API key: set reasoning.api_key or ANTHROPIC_API_KEY")]
    MissingApiKey,

    /// Unknown or unexpected error
    #[error("Unknown error ({0}): {1}")]
    UnknownError(StatusCode, String),
}

impl ClaudeApiError {
    /// Classify a non-success HTTP status. The body is scrubbed of secrets.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let body = SecretScrubber::scrub(body);
        match status {
            StatusCode::BAD_REQUEST => Self::InvalidRequest(body),
            StatusCode::UNAUTHORIZED => Self::InvalidApiKey,
            StatusCode::FORBIDDEN => Self::Forbidden(body),
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimitExceeded,
            status if status.is_server_error() => Self::ServerError(status, body),
            _ => Self::UnknownError(status, body),
        }
    }

    /// Returns true if this error is transient and should be retried
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded
                | Self::ServerError(_, _)
                | Self::Timeout
                | Self::NetworkError(_)
        )
    }

    /// Returns true if this is a permanent error that should not be retried
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest(_)
                | Self::InvalidApiKey
                | Self::Forbidden(_)
                | Self::NotFound
                | Self::MissingApiKey
        )
    }
}

impl From<ClaudeApiError> for ReasoningError {
    fn from(err: ClaudeApiError) -> Self {
        match err {
            ClaudeApiError::Timeout => Self::Timeout,
            ClaudeApiError::NetworkError(e) if e.is_timeout() => Self::Timeout,
            ClaudeApiError::NetworkError(e) if e.is_decode() => {
                Self::MalformedResponse(e.to_string())
            }
            ClaudeApiError::NetworkError(e) => Self::Transport(e.to_string()),
            ClaudeApiError::JsonError(e) => Self::MalformedResponse(e.to_string()),
            other => Self::Api(other.to_string()),
        }
    }
}

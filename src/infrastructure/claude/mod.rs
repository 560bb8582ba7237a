//! Claude Messages API client and the reasoning port built on it.

pub mod client;
pub mod errors;
pub mod rate_limiter;
pub mod reasoning;
pub mod retry;
pub mod types;

pub use client::{ClaudeClient, ClaudeClientConfig};
pub use errors::ClaudeApiError;
pub use rate_limiter::TokenBucketRateLimiter;
pub use reasoning::ClaudeReasoningService;
pub use retry::RetryPolicy;

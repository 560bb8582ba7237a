use super::errors::ClaudeApiError;
use super::rate_limiter::TokenBucketRateLimiter;
use super::retry::RetryPolicy;
use super::types::{MessageRequest, MessageResponse};
use crate::domain::models::Config;
use crate::infrastructure::logging::SecretScrubber;
use reqwest::{header, Client as ReqwestClient, Response};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Configuration for the Claude HTTP client
#[derive(Debug, Clone)]
pub struct ClaudeClientConfig {
    /// Anthropic API key
    pub api_key: String,

    /// Base URL for the Claude API
    pub base_url: String,

    /// Rate limit in requests per second
    pub rate_limit_rps: f64,

    /// Maximum retry attempts
    pub max_retries: u32,

    /// Initial backoff delay in milliseconds
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    pub max_backoff_ms: u64,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl ClaudeClientConfig {
    /// Build from application configuration. The API key falls back to
    /// `ANTHROPIC_API_KEY` when `reasoning.api_key` is unset.
    pub fn from_config(config: &Config) -> Result<Self, ClaudeApiError> {
        let api_key = config
            .reasoning
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or(ClaudeApiError::MissingApiKey)?;

        Ok(Self {
            api_key,
            base_url: config.reasoning.base_url.trim_end_matches('/').to_string(),
            rate_limit_rps: config.rate_limit.requests_per_second,
            max_retries: config.retry.max_retries,
            initial_backoff_ms: config.retry.initial_backoff_ms,
            max_backoff_ms: config.retry.max_backoff_ms,
            timeout_secs: config.reasoning.request_timeout_secs,
        })
    }
}

/// HTTP client for the Claude Messages API
///
/// Connections are pooled, requests pass a token bucket before they are
/// sent and transient failures are retried with exponential backoff.
pub struct ClaudeClient {
    http_client: ReqwestClient,
    base_url: String,
    rate_limiter: Arc<TokenBucketRateLimiter>,
    retry_policy: RetryPolicy,
}

impl ClaudeClient {
    pub fn new(config: ClaudeClientConfig) -> Result<Self, ClaudeApiError> {
        info!(
            base_url = %config.base_url,
            rate_limit_rps = config.rate_limit_rps,
            timeout_secs = config.timeout_secs,
            api_key = %SecretScrubber::mask(&config.api_key),
            "Initializing Claude API client"
        );

        let mut headers = header::HeaderMap::new();
        headers.insert(
            "x-api-key",
            header::HeaderValue::from_str(&config.api_key)
                .map_err(|e| ClaudeApiError::InvalidRequest(format!("Invalid API key: {e}")))?,
        );
        headers.insert(
            "anthropic-version",
            header::HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let http_client = ReqwestClient::builder()
            .pool_max_idle_per_host(10)
            .timeout(Duration::from_secs(config.timeout_secs))
            .tcp_nodelay(true)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.base_url,
            rate_limiter: Arc::new(TokenBucketRateLimiter::new(config.rate_limit_rps)),
            retry_policy: RetryPolicy::new(
                config.max_retries,
                config.initial_backoff_ms,
                config.max_backoff_ms,
            ),
        })
    }

    /// Send a message to Claude and get a response
    #[instrument(
        skip(self, request),
        fields(model = %request.model, max_tokens = request.max_tokens)
    )]
    pub async fn send_message(
        &self,
        request: &MessageRequest,
    ) -> Result<MessageResponse, ClaudeApiError> {
        debug!("Sending message request");

        self.rate_limiter.acquire().await;

        let result = self
            .retry_policy
            .execute(|| async { self.execute_message_request(request).await })
            .await;

        match &result {
            Ok(response) => {
                info!(
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    "Message request succeeded"
                );
            }
            Err(err) => {
                error!(error = %err, "Message request failed");
            }
        }

        result
    }

    /// Execute a single message request (called by retry logic)
    async fn execute_message_request(
        &self,
        request: &MessageRequest,
    ) -> Result<MessageResponse, ClaudeApiError> {
        let url = format!("{}/v1/messages", self.base_url);

        debug!(url = %url, "POST");

        let response = self
            .http_client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClaudeApiError::Timeout
                } else {
                    ClaudeApiError::NetworkError(e)
                }
            })?;

        self.handle_response(response).await
    }

    /// Handle HTTP response and convert to typed result
    async fn handle_response(&self, response: Response) -> Result<MessageResponse, ClaudeApiError> {
        let status = response.status();

        debug!(status = %status, "Response received");

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());
            let err = ClaudeApiError::from_status(status, &body);
            warn!(status = %status, error = %err, "API error");
            return Err(err);
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

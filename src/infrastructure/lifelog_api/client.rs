use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use chrono_tz::Tz;
use reqwest::{Client as ReqwestClient, StatusCode};
use tracing::{debug, instrument, warn};

use super::types::{LifelogEntry, LifelogsResponse};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Config, LifelogEvent};
use crate::domain::ports::EventSource;
use crate::infrastructure::logging::SecretScrubber;

const API_KEY_ENV: &str = "LIFELOG_API_KEY";
/// The API rejects larger pages.
const MAX_PAGE_SIZE: u32 = 10;
const WINDOW_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Settings for [`LifelogApiClient`].
#[derive(Debug, Clone)]
pub struct LifelogApiClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
    pub timezone: Tz,
    pub lookback_minutes: i64,
}

impl LifelogApiClientConfig {
    /// The API key falls back to `LIFELOG_API_KEY` when
    /// `lifelog_api.api_key` is unset.
    pub fn from_config(config: &Config) -> DomainResult<Self> {
        let api_key = config
            .lifelog_api
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                DomainError::ValidationFailed(
                    "Missing lifelog API key: set lifelog_api.api_key or LIFELOG_API_KEY"
                        .to_string(),
                )
            })?;

        let timezone = config
            .timezone
            .parse::<Tz>()
            .map_err(|_| {
                DomainError::ValidationFailed(format!("Invalid timezone: {}", config.timezone))
            })?;

        Ok(Self {
            base_url: config.lifelog_api.base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout_secs: config.lifelog_api.timeout_secs,
            timezone,
            lookback_minutes: config.ingestion.lookback_minutes,
        })
    }
}

enum FetchOutcome {
    Entries(Vec<LifelogEntry>),
    RateLimited,
    Rejected { status: StatusCode, message: String },
}

/// HTTP client for the lifelog API: the polling event source and search.
pub struct LifelogApiClient {
    http_client: ReqwestClient,
    base_url: String,
    timezone: Tz,
    lookback: chrono::Duration,
}

impl LifelogApiClient {
    pub fn new(config: LifelogApiClientConfig) -> DomainResult<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        let key = reqwest::header::HeaderValue::from_str(&config.api_key)
            .map_err(|e| DomainError::ValidationFailed(format!("Invalid lifelog API key: {e}")))?;
        headers.insert("X-API-Key", key);

        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| DomainError::EventSourceFailed(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url,
            timezone: config.timezone,
            lookback: chrono::Duration::minutes(config.lookback_minutes.max(1)),
        })
    }

    pub fn from_config(config: &Config) -> DomainResult<Self> {
        Self::new(LifelogApiClientConfig::from_config(config)?)
    }

    /// Hybrid search over lifelogs; hits without text are dropped.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, limit: u32) -> DomainResult<Vec<LifelogEvent>> {
        let params = vec![
            ("search", query.to_string()),
            ("limit", limit.clamp(1, MAX_PAGE_SIZE).to_string()),
            ("includeMarkdown", "true".to_string()),
        ];

        match self.fetch(&params).await? {
            FetchOutcome::Entries(entries) => Ok(into_events(entries)),
            FetchOutcome::RateLimited => {
                Err(DomainError::RetrievalFailed("lifelog search rate limited".to_string()))
            }
            FetchOutcome::Rejected { message, .. } => Err(DomainError::RetrievalFailed(message)),
        }
    }

    fn window_params(&self, limit: u32) -> Vec<(&'static str, String)> {
        let now = Utc::now().with_timezone(&self.timezone);
        let start = now - self.lookback;
        vec![
            ("limit", limit.clamp(1, MAX_PAGE_SIZE).to_string()),
            ("direction", "desc".to_string()),
            ("includeMarkdown", "true".to_string()),
            ("start", start.format(WINDOW_FORMAT).to_string()),
            ("end", now.format(WINDOW_FORMAT).to_string()),
        ]
    }

    fn date_params(&self, limit: u32) -> Vec<(&'static str, String)> {
        let today = Utc::now().with_timezone(&self.timezone).date_naive();
        vec![
            ("limit", limit.clamp(1, MAX_PAGE_SIZE).to_string()),
            ("direction", "desc".to_string()),
            ("includeMarkdown", "true".to_string()),
            ("date", today.format("%Y-%m-%d").to_string()),
            ("timezone", self.timezone.name().to_string()),
        ]
    }

    async fn fetch(&self, params: &[(&str, String)]) -> DomainResult<FetchOutcome> {
        let url = format!("{}/lifelogs", self.base_url);
        debug!(url = %url, ?params, "GET");

        let response = self
            .http_client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| DomainError::EventSourceFailed(SecretScrubber::scrub(&e.to_string())))?;

        let status = response.status();
        match status {
            StatusCode::OK => {
                let body = response
                    .text()
                    .await
                    .map_err(|e| DomainError::EventSourceFailed(e.to_string()))?;
                let parsed: LifelogsResponse = serde_json::from_str(&body)?;
                Ok(FetchOutcome::Entries(parsed.into_entries()))
            }
            StatusCode::TOO_MANY_REQUESTS => Ok(FetchOutcome::RateLimited),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Ok(FetchOutcome::Rejected {
                    status,
                    message: format!(
                        "Lifelog API returned {status}: {}",
                        SecretScrubber::scrub(&body)
                    ),
                })
            }
        }
    }
}

fn into_events(entries: Vec<LifelogEntry>) -> Vec<LifelogEvent> {
    entries.into_iter().filter_map(LifelogEntry::into_event).collect()
}

#[async_trait]
impl EventSource for LifelogApiClient {
    #[instrument(skip(self))]
    async fn poll(&self, limit: u32) -> DomainResult<Vec<LifelogEvent>> {
        let outcome = match self.fetch(&self.window_params(limit)).await? {
            FetchOutcome::Rejected {
                status: StatusCode::BAD_REQUEST,
                message,
            } => {
                warn!(%message, "Start/end window rejected, falling back to date query");
                self.fetch(&self.date_params(limit)).await?
            }
            other => other,
        };

        match outcome {
            FetchOutcome::Entries(entries) => {
                let events = into_events(entries);
                debug!(count = events.len(), "Polled lifelog events");
                Ok(events)
            }
            FetchOutcome::RateLimited => {
                warn!("Lifelog API rate limited this poll, returning empty batch");
                Ok(Vec::new())
            }
            FetchOutcome::Rejected { message, .. } => Err(DomainError::EventSourceFailed(message)),
        }
    }
}

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde_json::json;
use tracing::{debug, instrument};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::NotificationSink;
use crate::infrastructure::logging::SecretScrubber;

// Chat embed limits.
const MAX_TITLE_CHARS: usize = 256;
const MAX_DESCRIPTION_CHARS: usize = 4096;

/// Posts notifications to a chat webhook as a single embed.
pub struct WebhookNotificationSink {
    http_client: ReqwestClient,
    url: String,
}

impl WebhookNotificationSink {
    pub fn new(url: impl Into<String>) -> DomainResult<Self> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| DomainError::NotificationFailed(e.to_string()))?;

        Ok(Self {
            http_client,
            url: url.into(),
        })
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

#[async_trait]
impl NotificationSink for WebhookNotificationSink {
    #[instrument(skip(self, body))]
    async fn send(&self, title: &str, body: &str) -> DomainResult<()> {
        let payload = json!({
            "embeds": [{
                "title": truncate(title, MAX_TITLE_CHARS),
                "description": truncate(body, MAX_DESCRIPTION_CHARS),
            }]
        });

        let response = self
            .http_client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DomainError::NotificationFailed(SecretScrubber::scrub(&e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::NotificationFailed(format!(
                "webhook returned {status}: {}",
                SecretScrubber::scrub(&body)
            )));
        }

        debug!(%status, "Notification delivered");
        Ok(())
    }
}

use async_trait::async_trait;
use tracing::info;

use crate::domain::errors::DomainResult;
use crate::domain::ports::NotificationSink;

/// Logs notifications; used when no webhook is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotificationSink;

#[async_trait]
impl NotificationSink for TracingNotificationSink {
    async fn send(&self, title: &str, body: &str) -> DomainResult<()> {
        info!(%title, %body, "notification");
        Ok(())
    }
}

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

/// Write-only sink for human-readable dispatch results.
///
/// The engine logs and ignores send failures; retry and backoff belong to
/// the sink.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, title: &str, body: &str) -> DomainResult<()>;
}

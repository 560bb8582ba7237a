use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::LifelogEvent;

/// Polling feed of lifelog events.
///
/// Returns at most `limit` events ordered newest-first. Successive polls may
/// return overlapping windows; callers deduplicate.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn poll(&self, limit: u32) -> DomainResult<Vec<LifelogEvent>>;
}

//! Port for pluggable domain handlers.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ActionResult, ScheduledTask, SummaryResult};

/// A domain module the engine can route text to.
///
/// Identity and trigger data (`name`, `keywords`, `question_patterns`) are
/// read once at registration and must not change afterwards. `ingest` is
/// not required to be idempotent; the dedup ledger is the only idempotency
/// boundary. Implementations must not share mutable in-memory state with
/// other handlers, since invocations for one event run concurrently.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Stable routing key, unique across the registry.
    fn name(&self) -> &str;

    /// One-line description used in the tool declaration.
    fn description(&self) -> &str;

    /// Case-insensitive trigger substrings, in priority order.
    fn keywords(&self) -> &[String];

    /// Question-detection regular expressions (matched case-insensitively).
    fn question_patterns(&self) -> &[String];

    /// Act on `text` for the source event `event_id`.
    async fn ingest(&self, text: &str, event_id: &str) -> DomainResult<ActionResult>;

    /// Summarize the handler's records for one calendar date.
    async fn summarize(&self, date: NaiveDate) -> DomainResult<SummaryResult>;

    /// Recurring jobs this handler wants scheduled.
    fn scheduled_tasks(&self) -> DomainResult<Vec<ScheduledTask>> {
        Ok(Vec::new())
    }
}

//! Port for the processed-event dedup ledger.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::ProcessedEventMarker;

/// Durable record of events that have already been acted upon.
///
/// `mark_processed` must be an atomic insert-if-absent keyed on
/// `event_id`: it returns `true` when the marker was written and `false`
/// when one already existed, leaving the existing marker untouched.
#[async_trait]
pub trait ProcessedEventLedger: Send + Sync {
    async fn is_processed(&self, event_id: &str) -> DomainResult<bool>;

    async fn mark_processed(&self, marker: &ProcessedEventMarker) -> DomainResult<bool>;

    async fn get(&self, event_id: &str) -> DomainResult<Option<ProcessedEventMarker>>;

    async fn list_recent(&self, limit: u32) -> DomainResult<Vec<ProcessedEventMarker>>;
}

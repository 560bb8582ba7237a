//! SQLite implementation of the processed-event dedup ledger.

use async_trait::async_trait;
use chrono::SecondsFormat;
use sqlx::SqlitePool;

use crate::adapters::sqlite::parse_datetime;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Disposition, ProcessedEventMarker, Source};
use crate::domain::ports::ProcessedEventLedger;

#[derive(Clone)]
pub struct SqliteProcessedEventLedger {
    pool: SqlitePool,
}

impl SqliteProcessedEventLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn dedup_error(err: sqlx::Error) -> DomainError {
    DomainError::DedupStore(err.to_string())
}

#[async_trait]
impl ProcessedEventLedger for SqliteProcessedEventLedger {
    async fn is_processed(&self, event_id: &str) -> DomainResult<bool> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM processed_events WHERE event_id = ?")
                .bind(event_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(dedup_error)?;
        Ok(row.is_some())
    }

    async fn mark_processed(&self, marker: &ProcessedEventMarker) -> DomainResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO processed_events (event_id, processed_at, source, disposition)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(event_id) DO NOTHING
            "#,
        )
        .bind(&marker.event_id)
        .bind(marker.processed_at.to_rfc3339_opts(SecondsFormat::Micros, true))
        .bind(marker.source.as_str())
        .bind(marker.disposition.as_str())
        .execute(&self.pool)
        .await
        .map_err(dedup_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn get(&self, event_id: &str) -> DomainResult<Option<ProcessedEventMarker>> {
        let row: Option<MarkerRow> = sqlx::query_as(
            r#"
            SELECT event_id, processed_at, source, disposition
            FROM processed_events
            WHERE event_id = ?
            "#,
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(dedup_error)?;

        row.map(ProcessedEventMarker::try_from).transpose()
    }

    async fn list_recent(&self, limit: u32) -> DomainResult<Vec<ProcessedEventMarker>> {
        let rows: Vec<MarkerRow> = sqlx::query_as(
            r#"
            SELECT event_id, processed_at, source, disposition
            FROM processed_events
            ORDER BY processed_at DESC
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(dedup_error)?;

        rows.into_iter().map(ProcessedEventMarker::try_from).collect()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MarkerRow {
    event_id: String,
    processed_at: String,
    source: String,
    disposition: String,
}

impl TryFrom<MarkerRow> for ProcessedEventMarker {
    type Error = DomainError;

    fn try_from(row: MarkerRow) -> Result<Self, Self::Error> {
        Ok(Self {
            event_id: row.event_id,
            processed_at: parse_datetime(&row.processed_at)?,
            source: row
                .source
                .parse::<Source>()
                .map_err(DomainError::SerializationError)?,
            disposition: row
                .disposition
                .parse::<Disposition>()
                .map_err(DomainError::SerializationError)?,
        })
    }
}

//! Storage for raw journal entries written by config-driven handlers.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::adapters::sqlite::parse_datetime;
use crate::domain::errors::{DomainError, DomainResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalEntry {
    pub id: Uuid,
    pub handler_name: String,
    pub event_id: String,
    /// Local calendar date the entry belongs to.
    pub entry_date: NaiveDate,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl JournalEntry {
    pub fn new(
        handler_name: impl Into<String>,
        event_id: impl Into<String>,
        entry_date: NaiveDate,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            handler_name: handler_name.into(),
            event_id: event_id.into(),
            entry_date,
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone)]
pub struct SqliteJournalRepository {
    pool: SqlitePool,
}

impl SqliteJournalRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, entry: &JournalEntry) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO journal_entries (id, handler_name, event_id, entry_date, text, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(&entry.handler_name)
        .bind(&entry.event_id)
        .bind(entry.entry_date.to_string())
        .bind(&entry.text)
        .bind(entry.created_at.to_rfc3339_opts(SecondsFormat::Micros, true))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Entries for one handler and date, oldest first.
    pub async fn list_for_date(
        &self,
        handler_name: &str,
        date: NaiveDate,
    ) -> DomainResult<Vec<JournalEntry>> {
        let rows: Vec<JournalRow> = sqlx::query_as(
            r#"
            SELECT id, handler_name, event_id, entry_date, text, created_at
            FROM journal_entries
            WHERE handler_name = ? AND entry_date = ?
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(handler_name)
        .bind(date.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(JournalEntry::try_from).collect()
    }

    pub async fn count_for_date(&self, handler_name: &str, date: NaiveDate) -> DomainResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM journal_entries WHERE handler_name = ? AND entry_date = ?",
        )
        .bind(handler_name)
        .bind(date.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

#[derive(sqlx::FromRow)]
struct JournalRow {
    id: String,
    handler_name: String,
    event_id: String,
    entry_date: String,
    text: String,
    created_at: String,
}

impl TryFrom<JournalRow> for JournalEntry {
    type Error = DomainError;

    fn try_from(row: JournalRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&row.id)
                .map_err(|e| DomainError::SerializationError(e.to_string()))?,
            handler_name: row.handler_name,
            event_id: row.event_id,
            entry_date: row
                .entry_date
                .parse()
                .map_err(|e: chrono::ParseError| DomainError::SerializationError(e.to_string()))?,
            text: row.text,
            created_at: parse_datetime(&row.created_at)?,
        })
    }
}

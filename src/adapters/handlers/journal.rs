//! Config-driven handler that journals raw text per local day.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use tracing::{debug, warn};

use crate::adapters::sqlite::{JournalEntry, SqliteJournalRepository};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    ActionResult, HandlerConfig, ScheduledTask, ScheduledTaskConfig, SummaryResult,
};
use crate::domain::ports::Handler;
use crate::services::DateResolver;

/// How many recent entries a summary quotes.
const SUMMARY_EXCERPTS: usize = 3;
const EXCERPT_CHARS: usize = 120;

/// A handler whose identity and triggers come from configuration and whose
/// records are plain journal entries bucketed by local calendar date.
pub struct JournalHandler {
    name: String,
    description: String,
    keywords: Vec<String>,
    question_patterns: Vec<String>,
    tasks: Vec<ScheduledTaskConfig>,
    store: SqliteJournalRepository,
    dates: DateResolver,
}

impl JournalHandler {
    pub fn from_config(
        config: &HandlerConfig,
        store: SqliteJournalRepository,
        dates: DateResolver,
    ) -> Self {
        Self {
            name: config.name.clone(),
            description: config.description.clone(),
            keywords: config.keywords.clone(),
            question_patterns: config.question_patterns.clone(),
            tasks: config.scheduled_tasks.clone(),
            store,
            dates,
        }
    }
}

fn excerpt(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= EXCERPT_CHARS {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(EXCERPT_CHARS).collect();
    format!("{cut}...")
}

/// Today's entry count for the confirmation message. The entry is already
/// stored, so a failed count is logged and reported as one.
fn count_or_one(handler: &str, count: DomainResult<i64>) -> i64 {
    count.unwrap_or_else(|e| {
        warn!(handler = %handler, error = %e, "Failed to count today's entries");
        1
    })
}

#[async_trait]
impl Handler for JournalHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn keywords(&self) -> &[String] {
        &self.keywords
    }

    fn question_patterns(&self) -> &[String] {
        &self.question_patterns
    }

    async fn ingest(&self, text: &str, event_id: &str) -> DomainResult<ActionResult> {
        let today = self.dates.today();
        let entry = JournalEntry::new(&self.name, event_id, today, text.trim());
        self.store.insert(&entry).await.map_err(|e| DomainError::HandlerExecutionFailed {
            handler: self.name.clone(),
            message: e.to_string(),
        })?;

        let count = count_or_one(
            &self.name,
            self.store.count_for_date(&self.name, today).await,
        );
        debug!(handler = %self.name, event_id = %event_id, date = %today, "Journal entry stored");

        Ok(ActionResult::success(
            &self.name,
            format!("Logged to {} ({count} today): {}", self.name, excerpt(text)),
        ))
    }

    async fn summarize(&self, date: NaiveDate) -> DomainResult<SummaryResult> {
        let entries = self.store.list_for_date(&self.name, date).await?;

        let text = if entries.is_empty() {
            "No entries.".to_string()
        } else {
            let mut lines = vec![format!("{} entries", entries.len())];
            let skip = entries.len().saturating_sub(SUMMARY_EXCERPTS);
            lines.extend(entries.iter().skip(skip).map(|e| format!("- {}", excerpt(&e.text))));
            lines.join("\n")
        };

        Ok(SummaryResult {
            handler_name: self.name.clone(),
            date,
            text,
            data: json!({
                "entries": entries.len(),
                "event_ids": entries.iter().map(|e| e.event_id.as_str()).collect::<Vec<_>>(),
            }),
        })
    }

    fn scheduled_tasks(&self) -> DomainResult<Vec<ScheduledTask>> {
        self.tasks
            .iter()
            .map(|task| {
                let at = NaiveTime::parse_from_str(&task.at, "%H:%M").map_err(|e| {
                    DomainError::InvalidHandler {
                        name: self.name.clone(),
                        reason: format!(
                            "scheduled task '{}' has invalid time '{}': {e}",
                            task.name, task.at
                        ),
                    }
                })?;
                Ok(ScheduledTask {
                    name: task.name.clone(),
                    at,
                })
            })
            .collect()
    }
}

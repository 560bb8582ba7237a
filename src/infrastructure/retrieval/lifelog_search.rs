//! Retrieval answered from lifelog search hits.

use std::sync::Arc;

use async_trait::async_trait;
use chrono_tz::Tz;
use tracing::{debug, instrument};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::LifelogEvent;
use crate::domain::ports::{ReasoningRequest, ReasoningService, RetrievalService};
use crate::infrastructure::lifelog_api::LifelogApiClient;

const DEFAULT_MAX_HITS: u32 = 5;
/// Per-hit excerpt cap so a long transcript cannot crowd out the rest.
const MAX_EXCERPT_CHARS: usize = 1200;

const SYSTEM_INSTRUCTION: &str = "You are a personal automation assistant answering questions \
about the user's own tracked history: nutrition, workouts, sleep and health. Use only the \
context from the user's records. If it does not contain enough information, say what is \
missing. Cite dates when giving numbers.";

pub struct LifelogSearchRetrieval {
    search: Arc<LifelogApiClient>,
    reasoning: Arc<dyn ReasoningService>,
    timezone: Tz,
    max_hits: u32,
}

impl LifelogSearchRetrieval {
    pub fn new(
        search: Arc<LifelogApiClient>,
        reasoning: Arc<dyn ReasoningService>,
        timezone: Tz,
    ) -> Self {
        Self {
            search,
            reasoning,
            timezone,
            max_hits: DEFAULT_MAX_HITS,
        }
    }

    pub fn with_max_hits(mut self, max_hits: u32) -> Self {
        self.max_hits = max_hits.max(1);
        self
    }
}

/// `[YYYY-MM-DD] text` blocks separated by blank lines.
pub(crate) fn format_context(hits: &[LifelogEvent], timezone: Tz) -> String {
    hits.iter()
        .map(|hit| {
            let date = hit.observed_at.with_timezone(&timezone).date_naive();
            let excerpt: String = hit.text.chars().take(MAX_EXCERPT_CHARS).collect();
            format!("[{date}] {excerpt}")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl RetrievalService for LifelogSearchRetrieval {
    #[instrument(skip(self))]
    async fn answer(&self, query: &str) -> DomainResult<String> {
        let hits = self.search.search(query, self.max_hits).await?;
        debug!(hits = hits.len(), "Retrieved lifelog context");

        if hits.is_empty() {
            return Ok("I couldn't find anything in your records about that.".to_string());
        }

        let user_text = format!(
            "Context from user's records:\n\n{}\n\nUser's question: {query}",
            format_context(&hits, self.timezone)
        );

        let response = self
            .reasoning
            .invoke(ReasoningRequest::new(SYSTEM_INSTRUCTION, user_text))
            .await
            .map_err(|e| DomainError::RetrievalFailed(e.to_string()))?;

        response
            .content
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| DomainError::RetrievalFailed("empty answer".to_string()))
    }
}

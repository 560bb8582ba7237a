//! Wire types for the lifelog `/lifelogs` endpoint.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::models::LifelogEvent;

/// `{"data": {"lifelogs": [...]}}`; some deployments return `lifelogs` at
/// the top level instead.
#[derive(Debug, Default, Deserialize)]
pub struct LifelogsResponse {
    #[serde(default)]
    pub data: Option<LifelogsData>,
    #[serde(default)]
    pub lifelogs: Option<Vec<LifelogEntry>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LifelogsData {
    #[serde(default)]
    pub lifelogs: Vec<LifelogEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifelogEntry {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub markdown: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

impl LifelogsResponse {
    pub fn into_entries(self) -> Vec<LifelogEntry> {
        match (self.data, self.lifelogs) {
            (Some(data), _) => data.lifelogs,
            (None, Some(lifelogs)) => lifelogs,
            (None, None) => Vec::new(),
        }
    }
}

impl LifelogEntry {
    /// Entries without transcript text carry nothing to route.
    pub fn into_event(self) -> Option<LifelogEvent> {
        let text = self.markdown.as_deref().map(str::trim).unwrap_or_default();
        if text.is_empty() {
            return None;
        }

        let observed_at = self
            .start_time
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map_or_else(Utc::now, |t| t.with_timezone(&Utc));

        Some(LifelogEvent::new(self.id, text, observed_at))
    }
}

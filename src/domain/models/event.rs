//! Source events and the durable markers that record their processing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::routing::Source;

/// One polled text unit from the ambient feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifelogEvent {
    /// Stable identifier assigned by the upstream source.
    pub event_id: String,
    pub text: String,
    pub observed_at: DateTime<Utc>,
}

impl LifelogEvent {
    pub fn new(
        event_id: impl Into<String>,
        text: impl Into<String>,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            text: text.into(),
            observed_at,
        }
    }
}

/// How a processed event was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Dispatched,
    Summary,
    Retrieval,
    DirectAnswer,
    NoAction,
    Error,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dispatched => "dispatched",
            Self::Summary => "summary",
            Self::Retrieval => "retrieval",
            Self::DirectAnswer => "direct_answer",
            Self::NoAction => "no_action",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Disposition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dispatched" => Ok(Self::Dispatched),
            "summary" => Ok(Self::Summary),
            "retrieval" => Ok(Self::Retrieval),
            "direct_answer" => Ok(Self::DirectAnswer),
            "no_action" => Ok(Self::NoAction),
            "error" => Ok(Self::Error),
            other => Err(format!("Unknown disposition: {other}")),
        }
    }
}

/// Durable proof that an event has been acted upon. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedEventMarker {
    pub event_id: String,
    pub processed_at: DateTime<Utc>,
    pub source: Source,
    pub disposition: Disposition,
}

impl ProcessedEventMarker {
    pub fn new(event_id: impl Into<String>, source: Source, disposition: Disposition) -> Self {
        Self {
            event_id: event_id.into(),
            processed_at: Utc::now(),
            source,
            disposition,
        }
    }
}

//! Values exchanged with domain handlers.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Outcome of one `ingest` invocation. Consumed by the notification sink
/// and then discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub handler_name: String,
    pub success: bool,
    pub notification_payload: Option<String>,
    pub error: Option<String>,
}

impl ActionResult {
    pub fn success(handler_name: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            handler_name: handler_name.into(),
            success: true,
            notification_payload: Some(payload.into()),
            error: None,
        }
    }

    pub fn silent_success(handler_name: impl Into<String>) -> Self {
        Self {
            handler_name: handler_name.into(),
            success: true,
            notification_payload: None,
            error: None,
        }
    }

    pub fn failure(handler_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            handler_name: handler_name.into(),
            success: false,
            notification_payload: None,
            error: Some(error.into()),
        }
    }
}

/// A human-readable message for the notification sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// A handler's summary for one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub handler_name: String,
    pub date: NaiveDate,
    /// Rendered text for notifications.
    pub text: String,
    /// Handler-specific structured data.
    #[serde(default)]
    pub data: serde_json::Value,
}

/// One slot of a cross-handler summary. Either `summary` or `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerSummary {
    pub handler_name: String,
    pub summary: Option<SummaryResult>,
    pub error: Option<String>,
}

/// Summaries from every registered handler for one date, in registration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub handlers: Vec<HandlerSummary>,
}

impl DailySummary {
    pub fn get(&self, handler_name: &str) -> Option<&HandlerSummary> {
        self.handlers.iter().find(|h| h.handler_name == handler_name)
    }

    pub fn failed_count(&self) -> usize {
        self.handlers.iter().filter(|h| h.error.is_some()).count()
    }

    /// Render as a notification title and body.
    pub fn render(&self) -> (String, String) {
        let title = format!("Daily summary for {}", self.date.format("%A, %B %-d, %Y"));
        if self.handlers.is_empty() {
            return (title, "No handlers are registered.".to_string());
        }

        let sections: Vec<String> = self
            .handlers
            .iter()
            .map(|slot| match (&slot.summary, &slot.error) {
                (_, Some(error)) => format!("**{}**\nerror: {}", slot.handler_name, error),
                (Some(summary), None) => format!("**{}**\n{}", slot.handler_name, summary.text),
                (None, None) => format!("**{}**\nno data", slot.handler_name),
            })
            .collect();

        (title, sections.join("\n\n"))
    }
}

/// A recurring job a handler wants run at a fixed local time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub name: String,
    pub at: NaiveTime,
}

/// A scheduled task tagged with the handler that declared it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredTask {
    pub handler_name: String,
    #[serde(flatten)]
    pub task: ScheduledTask,
}

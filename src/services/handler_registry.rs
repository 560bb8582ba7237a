//! Registry of domain handlers.
//!
//! The [`HandlerRegistry`] owns every [`HandlerDescriptor`] for the process
//! lifetime. Registration order is preserved and is the tie-break for
//! keyword and question matching. Lookups at call sites go through
//! [`HandlerRegistry::find_by_name`] only; names are validated once at
//! registration.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use regex::{Regex, RegexBuilder};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{DailySummary, HandlerSummary, RegisteredTask};
use crate::domain::ports::Handler;

/// Longest accepted handler name; `{name}_module` must fit a 64 char tool name.
const MAX_NAME_LEN: usize = 57;

/// A registered handler with its trigger data compiled.
pub struct HandlerDescriptor {
    name: String,
    description: String,
    /// Lowercased trigger substrings.
    keywords: Vec<String>,
    question_patterns: Vec<Regex>,
    handler: Arc<dyn Handler>,
}

impl std::fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("name", &self.name)
            .field("keywords", &self.keywords)
            .field(
                "question_patterns",
                &self.question_patterns.iter().map(Regex::as_str).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl HandlerDescriptor {
    /// Validate a handler's identity and compile its question patterns.
    pub fn from_handler(handler: Arc<dyn Handler>) -> DomainResult<Self> {
        let name = handler.name().to_string();
        validate_name(&name)?;

        let question_patterns = handler
            .question_patterns()
            .iter()
            .map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| DomainError::InvalidHandler {
                        name: name.clone(),
                        reason: format!("invalid question pattern '{pattern}': {e}"),
                    })
            })
            .collect::<DomainResult<Vec<_>>>()?;

        let keywords = handler
            .keywords()
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        let description = if handler.description().trim().is_empty() {
            format!("Handles {name}-related requests.")
        } else {
            handler.description().to_string()
        };

        Ok(Self {
            name,
            description,
            keywords,
            question_patterns,
            handler,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    /// Case-insensitive substring match against any keyword.
    pub fn matches_keyword(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }

    /// Case-insensitive regex match against any question pattern.
    pub fn matches_question(&self, text: &str) -> bool {
        self.question_patterns.iter().any(|p| p.is_match(text))
    }
}

fn validate_name(name: &str) -> DomainResult<()> {
    let invalid = |reason: &str| DomainError::InvalidHandler {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name cannot be empty"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(invalid("name is too long"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(invalid("name may only contain a-z, 0-9 and '_'"));
    }
    Ok(())
}

/// Ordered, name-indexed collection of handlers.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    handlers: Vec<HandlerDescriptor>,
    index: HashMap<String, usize>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. A second registration under the same name is a
    /// configuration error.
    pub fn register(&mut self, handler: Arc<dyn Handler>) -> DomainResult<()> {
        let descriptor = HandlerDescriptor::from_handler(handler)?;
        if self.index.contains_key(descriptor.name()) {
            return Err(DomainError::DuplicateHandler(descriptor.name().to_string()));
        }

        tracing::info!(
            handler = descriptor.name(),
            keywords = descriptor.keywords.len(),
            question_patterns = descriptor.question_patterns.len(),
            "Registered handler"
        );

        self.index
            .insert(descriptor.name().to_string(), self.handlers.len());
        self.handlers.push(descriptor);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Descriptors in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &HandlerDescriptor> {
        self.handlers.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.handlers.iter().map(HandlerDescriptor::name).collect()
    }

    pub fn find_by_name(&self, name: &str) -> Option<&HandlerDescriptor> {
        self.index.get(name).map(|&i| &self.handlers[i])
    }

    /// First handler, in registration order, with a matching keyword.
    pub fn match_by_keyword(&self, text: &str) -> Option<&HandlerDescriptor> {
        self.handlers.iter().find(|h| h.matches_keyword(text))
    }

    /// First handler, in registration order, with a matching question pattern.
    pub fn match_by_question(&self, text: &str) -> Option<&HandlerDescriptor> {
        self.handlers.iter().find(|h| h.matches_question(text))
    }

    /// Collect every handler's summary for `date`. A failing or panicking
    /// handler fills its own slot with the error; the others are unaffected.
    pub async fn summarize_all(&self, date: NaiveDate) -> DailySummary {
        let tasks = self.handlers.iter().map(|descriptor| {
            let handler = Arc::clone(&descriptor.handler);
            let handle = tokio::spawn(async move { handler.summarize(date).await });
            let handler_name = descriptor.name.clone();
            async move { (handler_name, handle.await) }
        });
        let joined = futures::future::join_all(tasks).await;

        let mut handlers = Vec::with_capacity(joined.len());
        for (handler_name, joined) in joined {
            let outcome = match joined {
                Ok(Ok(summary)) => Ok(summary),
                Ok(Err(e)) => Err(e.to_string()),
                Err(e) => Err(format!("handler task aborted: {e}")),
            };
            handlers.push(match outcome {
                Ok(summary) => HandlerSummary {
                    handler_name,
                    summary: Some(summary),
                    error: None,
                },
                Err(error) => {
                    tracing::warn!(
                        handler = %handler_name,
                        error = %error,
                        "Handler summary failed"
                    );
                    HandlerSummary {
                        handler_name,
                        summary: None,
                        error: Some(error),
                    }
                }
            });
        }

        DailySummary { date, handlers }
    }

    /// Scheduled tasks across handlers, tagged with the declaring handler.
    /// A handler that fails to report its tasks is logged and skipped.
    pub fn scheduled_tasks(&self) -> Vec<RegisteredTask> {
        let mut tasks = Vec::new();
        for descriptor in &self.handlers {
            match descriptor.handler.scheduled_tasks() {
                Ok(declared) => tasks.extend(declared.into_iter().map(|task| RegisteredTask {
                    handler_name: descriptor.name.clone(),
                    task,
                })),
                Err(e) => {
                    tracing::warn!(
                        handler = %descriptor.name,
                        error = %e,
                        "Failed to read scheduled tasks"
                    );
                }
            }
        }
        tasks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ActionResult, ScheduledTask, SummaryResult};
    use async_trait::async_trait;
    use chrono::NaiveTime;

    struct StubHandler {
        name: String,
        keywords: Vec<String>,
        patterns: Vec<String>,
        fail_summary: bool,
        panic_summary: bool,
    }

    impl StubHandler {
        fn new(name: &str, keywords: &[&str], patterns: &[&str]) -> Self {
            Self {
                name: name.to_string(),
                keywords: keywords.iter().map(|s| (*s).to_string()).collect(),
                patterns: patterns.iter().map(|s| (*s).to_string()).collect(),
                fail_summary: false,
                panic_summary: false,
            }
        }
    }

    #[async_trait]
    impl Handler for StubHandler {
        fn name(&self) -> &str {
            &self.name
        }
        fn description(&self) -> &str {
            ""
        }
        fn keywords(&self) -> &[String] {
            &self.keywords
        }
        fn question_patterns(&self) -> &[String] {
            &self.patterns
        }
        async fn ingest(&self, _text: &str, _event_id: &str) -> DomainResult<ActionResult> {
            Ok(ActionResult::silent_success(&self.name))
        }
        async fn summarize(&self, date: NaiveDate) -> DomainResult<SummaryResult> {
            assert!(!self.panic_summary, "summary store unavailable");
            if self.fail_summary {
                return Err(DomainError::DatabaseError("offline".to_string()));
            }
            Ok(SummaryResult {
                handler_name: self.name.clone(),
                date,
                text: format!("{} ok", self.name),
                data: serde_json::Value::Null,
            })
        }
        fn scheduled_tasks(&self) -> DomainResult<Vec<ScheduledTask>> {
            if self.name == "broken" {
                return Err(DomainError::ValidationFailed("bad time".to_string()));
            }
            Ok(vec![ScheduledTask {
                name: format!("{}_reminder", self.name),
                at: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            }])
        }
    }

    fn registry() -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        registry
            .register(Arc::new(StubHandler::new(
                "nutrition",
                &["Log That", "water"],
                &[r"how much (protein|calories)"],
            )))
            .unwrap();
        registry
            .register(Arc::new(StubHandler::new(
                "workout",
                &["ran", "water"],
                &[r"did i.*workout"],
            )))
            .unwrap();
        registry
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = registry();
        let err = registry
            .register(Arc::new(StubHandler::new("nutrition", &[], &[])))
            .unwrap_err();
        assert!(matches!(err, DomainError::DuplicateHandler(name) if name == "nutrition"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let mut registry = HandlerRegistry::new();
        let err = registry
            .register(Arc::new(StubHandler::new("sleep", &[], &["(unclosed"])))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidHandler { .. }));
    }

    #[test]
    fn test_invalid_names_rejected() {
        for bad in ["", "Sleep", "sleep tracker", "sleep-log"] {
            let mut registry = HandlerRegistry::new();
            assert!(
                registry.register(Arc::new(StubHandler::new(bad, &[], &[]))).is_err(),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_keyword_match_is_case_insensitive_and_ordered() {
        let registry = registry();
        assert_eq!(registry.match_by_keyword("OK, LOG THAT").unwrap().name(), "nutrition");
        // Both handlers list "water"; registration order breaks the tie.
        assert_eq!(registry.match_by_keyword("drank water").unwrap().name(), "nutrition");
        assert_eq!(registry.match_by_keyword("I RAN far").unwrap().name(), "workout");
        assert!(registry.match_by_keyword("hello").is_none());
    }

    #[test]
    fn test_question_match() {
        let registry = registry();
        assert_eq!(
            registry.match_by_question("How much PROTEIN today?").unwrap().name(),
            "nutrition"
        );
        assert_eq!(
            registry.match_by_question("did I do my workout").unwrap().name(),
            "workout"
        );
        assert!(registry.match_by_question("how are you").is_none());
    }

    #[test]
    fn test_find_by_name() {
        let registry = registry();
        assert!(registry.find_by_name("workout").is_some());
        assert!(registry.find_by_name("sleep").is_none());
        assert_eq!(registry.names(), vec!["nutrition", "workout"]);
    }

    #[tokio::test]
    async fn test_summarize_all_isolates_failures() {
        let mut registry = registry();
        let mut failing = StubHandler::new("sleep", &[], &[]);
        failing.fail_summary = true;
        registry.register(Arc::new(failing)).unwrap();

        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let summary = registry.summarize_all(date).await;

        assert_eq!(summary.handlers.len(), 3);
        assert_eq!(summary.handlers[0].handler_name, "nutrition");
        assert!(summary.get("nutrition").unwrap().summary.is_some());
        assert!(summary.get("workout").unwrap().summary.is_some());
        let sleep = summary.get("sleep").unwrap();
        assert!(sleep.summary.is_none());
        assert!(sleep.error.as_deref().unwrap().contains("offline"));
    }

    #[tokio::test]
    async fn test_summarize_all_survives_panicking_handler() {
        let mut registry = registry();
        let mut panicking = StubHandler::new("sleep", &[], &[]);
        panicking.panic_summary = true;
        registry.register(Arc::new(panicking)).unwrap();

        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let summary = registry.summarize_all(date).await;

        let names: Vec<_> = summary.handlers.iter().map(|h| h.handler_name.as_str()).collect();
        assert_eq!(names, vec!["nutrition", "workout", "sleep"]);
        assert!(summary.get("workout").unwrap().summary.is_some());
        let sleep = summary.get("sleep").unwrap();
        assert!(sleep.summary.is_none());
        assert!(sleep.error.as_deref().unwrap().contains("handler task aborted"));
    }

    #[test]
    fn test_scheduled_tasks_skip_failing_handler() {
        let mut registry = registry();
        registry
            .register(Arc::new(StubHandler::new("broken", &[], &[])))
            .unwrap();

        let tasks = registry.scheduled_tasks();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].handler_name, "nutrition");
        assert_eq!(tasks[0].task.name, "nutrition_reminder");
    }
}

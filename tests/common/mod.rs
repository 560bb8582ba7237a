//! Common test utilities for integration tests
//!
//! Hand-written port implementations and a harness that wires the routing
//! services the same way the application does, minus the network.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde_json::json;

use lifelog_router::adapters::sqlite::{create_migrated_test_pool, SqliteProcessedEventLedger};
use lifelog_router::domain::models::{
    ActionResult, LifelogEvent, Notification, ProcessedEventMarker, ScopeConfig, SummaryResult,
};
use lifelog_router::domain::ports::{
    EventSource, Handler, NotificationSink, ProcessedEventLedger, ReasoningError, ReasoningRequest,
    ReasoningResponse, ReasoningService, ToolInvocation,
};
use lifelog_router::services::tool_projection::handler_tool_name;
use lifelog_router::services::{
    ClassifierSettings, DateResolver, Dispatcher, HandlerRegistry, IngestionLoop,
    IngestionLoopConfig, IntentClassifier, ScopeGate,
};
use lifelog_router::{DomainError, DomainResult};

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
}

pub fn dates() -> DateResolver {
    DateResolver::from_name("America/Los_Angeles")
        .unwrap()
        .with_fixed_today(today())
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Tool invocation selecting a handler for logging.
pub fn handler_call(handler: &str, confidence: f64) -> ToolInvocation {
    ToolInvocation::new(
        handler_tool_name(handler),
        json!({"action": "log", "confidence": confidence, "reasoning": "test"}).to_string(),
    )
}

/// Reasoning service that replays queued responses, then repeats the last
/// one. An `Err` entry simulates a transport failure.
pub struct ScriptedReasoning {
    script: Mutex<VecDeque<Result<ReasoningResponse, String>>>,
    last: Mutex<Option<Result<ReasoningResponse, String>>>,
    pub calls: AtomicUsize,
}

impl ScriptedReasoning {
    pub fn new(script: Vec<Result<ReasoningResponse, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always(response: ReasoningResponse) -> Self {
        Self::new(vec![Ok(response)])
    }

    pub fn failing() -> Self {
        Self::new(vec![Err("connection refused".to_string())])
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReasoningService for ScriptedReasoning {
    async fn invoke(
        &self,
        _request: ReasoningRequest,
    ) -> Result<ReasoningResponse, ReasoningError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        let step = match next {
            Some(step) => {
                *self.last.lock().unwrap() = Some(step.clone());
                step
            }
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Err("script exhausted".to_string())),
        };
        step.map_err(ReasoningError::Transport)
    }
}

/// Handler that counts invocations and either succeeds or always fails.
pub struct RecordingHandler {
    name: String,
    description: String,
    keywords: Vec<String>,
    question_patterns: Vec<String>,
    fail: bool,
    panic_on_summary: bool,
    pub ingested: Mutex<Vec<(String, String)>>,
}

impl RecordingHandler {
    pub fn new(name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            description: format!("Tracks {name}"),
            keywords: strings(keywords),
            question_patterns: Vec::new(),
            fail: false,
            panic_on_summary: false,
            ingested: Mutex::new(Vec::new()),
        }
    }

    pub fn with_question_patterns(mut self, patterns: &[&str]) -> Self {
        self.question_patterns = strings(patterns);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn panicking_summary(mut self) -> Self {
        self.panic_on_summary = true;
        self
    }

    pub fn invocations(&self) -> usize {
        self.ingested.lock().unwrap().len()
    }
}

#[async_trait]
impl Handler for RecordingHandler {
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
        self.ingested
            .lock()
            .unwrap()
            .push((text.to_string(), event_id.to_string()));
        if self.fail {
            return Err(DomainError::HandlerExecutionFailed {
                handler: self.name.clone(),
                message: "storage unavailable".to_string(),
            });
        }
        Ok(ActionResult::success(&self.name, format!("{} logged", self.name)))
    }

    async fn summarize(&self, date: NaiveDate) -> DomainResult<SummaryResult> {
        assert!(!self.panic_on_summary, "{} summary store corrupted", self.name);
        Ok(SummaryResult {
            handler_name: self.name.clone(),
            date,
            text: format!("{} entries", self.invocations()),
            data: json!({"entries": self.invocations()}),
        })
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub sent: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn titles(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|n| n.title.clone()).collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, title: &str, body: &str) -> DomainResult<()> {
        self.sent.lock().unwrap().push(Notification::new(title, body));
        Ok(())
    }
}

/// Event source that returns the same window on every poll.
pub struct StaticEventSource {
    events: Vec<LifelogEvent>,
    pub polls: AtomicUsize,
}

impl StaticEventSource {
    pub fn new(events: &[(&str, &str)]) -> Self {
        Self {
            events: events
                .iter()
                .map(|(id, text)| LifelogEvent::new(*id, *text, Utc::now()))
                .collect(),
            polls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl EventSource for StaticEventSource {
    async fn poll(&self, limit: u32) -> DomainResult<Vec<LifelogEvent>> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        Ok(self.events.iter().take(limit as usize).cloned().collect())
    }
}

/// Event source whose first `failures` polls error, then behaves like
/// [`StaticEventSource`].
pub struct FlakyEventSource {
    inner: StaticEventSource,
    failures: usize,
}

impl FlakyEventSource {
    pub fn new(failures: usize, events: &[(&str, &str)]) -> Self {
        Self {
            inner: StaticEventSource::new(events),
            failures,
        }
    }

    pub fn polls(&self) -> usize {
        self.inner.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventSource for FlakyEventSource {
    async fn poll(&self, limit: u32) -> DomainResult<Vec<LifelogEvent>> {
        if self.polls() < self.failures {
            self.inner.polls.fetch_add(1, Ordering::SeqCst);
            return Err(DomainError::EventSourceFailed("lifelog API returned 503".to_string()));
        }
        self.inner.poll(limit).await
    }
}

/// Ledger whose backing store is unreachable.
pub struct FailingLedger;

#[async_trait]
impl ProcessedEventLedger for FailingLedger {
    async fn is_processed(&self, _event_id: &str) -> DomainResult<bool> {
        Err(DomainError::DedupStore("database is locked".to_string()))
    }

    async fn mark_processed(&self, _marker: &ProcessedEventMarker) -> DomainResult<bool> {
        Err(DomainError::DedupStore("database is locked".to_string()))
    }

    async fn get(&self, _event_id: &str) -> DomainResult<Option<ProcessedEventMarker>> {
        Err(DomainError::DedupStore("database is locked".to_string()))
    }

    async fn list_recent(&self, _limit: u32) -> DomainResult<Vec<ProcessedEventMarker>> {
        Err(DomainError::DedupStore("database is locked".to_string()))
    }
}

/// Routing services wired over in-memory collaborators.
pub struct Harness {
    pub registry: Arc<HandlerRegistry>,
    pub reasoning: Arc<ScriptedReasoning>,
    pub sink: Arc<RecordingSink>,
    pub classifier: Arc<IntentClassifier>,
    pub dispatcher: Arc<Dispatcher>,
}

impl Harness {
    pub fn new(handlers: Vec<Arc<dyn Handler>>, reasoning: ScriptedReasoning) -> Self {
        let mut registry = HandlerRegistry::new();
        for handler in handlers {
            registry.register(handler).unwrap();
        }
        let registry = Arc::new(registry);
        let reasoning = Arc::new(reasoning);
        let sink = Arc::new(RecordingSink::default());
        let settings = ClassifierSettings::default();

        let classifier = IntentClassifier::new(
            reasoning.clone(),
            registry.clone(),
            dates(),
            ScopeGate::new(&ScopeConfig::default()),
            settings.clone(),
        );
        let dispatcher = Dispatcher::new(
            registry.clone(),
            sink.clone(),
            dates(),
            settings.dispatch_threshold,
        );

        Self {
            registry,
            reasoning,
            sink,
            classifier: Arc::new(classifier),
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// An ingestion loop over `source` and a fresh in-memory sqlite ledger.
    pub async fn ingestion(
        &self,
        source: Arc<dyn EventSource>,
    ) -> (IngestionLoop, Arc<SqliteProcessedEventLedger>) {
        let ledger = Arc::new(SqliteProcessedEventLedger::new(
            create_migrated_test_pool().await.unwrap(),
        ));
        let ingestion = self.ingestion_with_ledger(source, ledger.clone());
        (ingestion, ledger)
    }

    pub fn ingestion_with_ledger(
        &self,
        source: Arc<dyn EventSource>,
        ledger: Arc<dyn ProcessedEventLedger>,
    ) -> IngestionLoop {
        self.ingestion_with_config(source, ledger, IngestionLoopConfig::default())
    }

    pub fn ingestion_with_config(
        &self,
        source: Arc<dyn EventSource>,
        ledger: Arc<dyn ProcessedEventLedger>,
        config: IngestionLoopConfig,
    ) -> IngestionLoop {
        IngestionLoop::new(
            source,
            ledger,
            self.classifier.clone(),
            self.dispatcher.clone(),
            config,
        )
    }
}

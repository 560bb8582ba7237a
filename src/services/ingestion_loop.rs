//! Idempotent ingestion loop.
//!
//! Polls the [`EventSource`], consults the [`ProcessedEventLedger`] before
//! every dispatch and marks events once the [`Dispatcher`] says they may be
//! marked. One cycle runs at a time. A failed cycle is logged and followed
//! by a longer sleep; nothing in a cycle stops the loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Notify, RwLock};
use tracing::instrument;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Disposition, IngestionConfig, LifelogEvent, ProcessedEventMarker, Source,
};
use crate::domain::ports::{EventSource, ProcessedEventLedger};
use crate::services::dispatcher::Dispatcher;
use crate::services::intent_classifier::{ClassificationContext, IntentClassifier};

/// Configuration for the ingestion loop.
#[derive(Debug, Clone)]
pub struct IngestionLoopConfig {
    /// Sleep after a successful cycle.
    pub poll_interval: Duration,
    /// Maximum events requested per poll.
    pub batch_size: u32,
    /// Multiplier applied to `poll_interval` after a failed cycle.
    pub failure_backoff_multiplier: u32,
}

impl Default for IngestionLoopConfig {
    fn default() -> Self {
        Self::from_config(&IngestionConfig::default())
    }
}

impl IngestionLoopConfig {
    pub fn from_config(config: &IngestionConfig) -> Self {
        Self {
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            batch_size: config.batch_size,
            failure_backoff_multiplier: config.failure_backoff_multiplier.max(1),
        }
    }

    /// Sleep before the next cycle.
    pub fn delay_after(&self, cycle_failed: bool) -> Duration {
        if cycle_failed {
            self.poll_interval * self.failure_backoff_multiplier
        } else {
            self.poll_interval
        }
    }
}

/// Counters across the lifetime of the loop.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestionStatus {
    pub running: bool,
    pub cycles: u64,
    pub failed_cycles: u64,
    pub events_seen: u64,
    pub events_skipped: u64,
    pub events_marked: u64,
    pub events_left_unprocessed: u64,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// What happened to one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// A marker already existed.
    Skipped,
    /// Dispatched and marked with the given disposition.
    Marked(Disposition),
    /// Dispatched without success; reconsidered next cycle.
    LeftUnprocessed,
}

/// Result of one polling cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub fetched: usize,
    pub skipped: usize,
    pub marked: usize,
    pub left_unprocessed: usize,
}

/// Handle to control a running loop.
#[derive(Clone)]
pub struct IngestionHandle {
    stop_flag: Arc<AtomicBool>,
    wake: Arc<Notify>,
    status: Arc<RwLock<IngestionStatus>>,
}

impl IngestionHandle {
    /// Request the loop to stop after the current cycle.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop_flag.load(Ordering::Acquire)
    }

    pub async fn status(&self) -> IngestionStatus {
        self.status.read().await.clone()
    }
}

pub struct IngestionLoop {
    source: Arc<dyn EventSource>,
    ledger: Arc<dyn ProcessedEventLedger>,
    classifier: Arc<IntentClassifier>,
    dispatcher: Arc<Dispatcher>,
    config: IngestionLoopConfig,
    status: Arc<RwLock<IngestionStatus>>,
    stop_flag: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl IngestionLoop {
    pub fn new(
        source: Arc<dyn EventSource>,
        ledger: Arc<dyn ProcessedEventLedger>,
        classifier: Arc<IntentClassifier>,
        dispatcher: Arc<Dispatcher>,
        config: IngestionLoopConfig,
    ) -> Self {
        Self {
            source,
            ledger,
            classifier,
            dispatcher,
            config,
            status: Arc::new(RwLock::new(IngestionStatus::default())),
            stop_flag: Arc::new(AtomicBool::new(false)),
            wake: Arc::new(Notify::new()),
        }
    }

    pub fn handle(&self) -> IngestionHandle {
        IngestionHandle {
            stop_flag: self.stop_flag.clone(),
            wake: self.wake.clone(),
            status: self.status.clone(),
        }
    }

    pub fn config(&self) -> &IngestionLoopConfig {
        &self.config
    }

    pub async fn status(&self) -> IngestionStatus {
        self.status.read().await.clone()
    }

    /// Run cycles until a stop is requested.
    pub async fn run(&self) {
        self.status.write().await.running = true;
        tracing::info!(
            poll_interval_secs = self.config.poll_interval.as_secs(),
            batch_size = self.config.batch_size,
            "Ingestion loop started"
        );

        while !self.stop_flag.load(Ordering::Acquire) {
            let failed = match self.run_cycle().await {
                Ok(report) => {
                    if report.fetched > 0 {
                        tracing::info!(
                            fetched = report.fetched,
                            skipped = report.skipped,
                            marked = report.marked,
                            left_unprocessed = report.left_unprocessed,
                            "Ingestion cycle completed"
                        );
                    }
                    false
                }
                Err(e) => {
                    tracing::error!(error = %e, "Ingestion cycle failed");
                    let mut status = self.status.write().await;
                    status.failed_cycles += 1;
                    status.last_error = Some(e.to_string());
                    true
                }
            };

            if self.stop_flag.load(Ordering::Acquire) {
                break;
            }
            tokio::select! {
                () = tokio::time::sleep(self.config.delay_after(failed)) => {}
                () = self.wake.notified() => {}
            }
        }

        self.status.write().await.running = false;
        tracing::info!("Ingestion loop stopped");
    }

    /// Poll once and process the batch in order.
    ///
    /// A ledger failure aborts the rest of the batch; events not yet
    /// reached are reconsidered next cycle.
    #[instrument(skip(self))]
    pub async fn run_cycle(&self) -> DomainResult<CycleReport> {
        {
            let mut status = self.status.write().await;
            status.cycles += 1;
            status.last_cycle_at = Some(Utc::now());
        }

        let events = self.source.poll(self.config.batch_size).await?;
        let mut report = CycleReport {
            fetched: events.len(),
            ..CycleReport::default()
        };

        for event in &events {
            self.status.write().await.events_seen += 1;
            let outcome = self.process_event(event).await?;

            let mut status = self.status.write().await;
            match outcome {
                EventOutcome::Skipped => {
                    report.skipped += 1;
                    status.events_skipped += 1;
                }
                EventOutcome::Marked(_) => {
                    report.marked += 1;
                    status.events_marked += 1;
                }
                EventOutcome::LeftUnprocessed => {
                    report.left_unprocessed += 1;
                    status.events_left_unprocessed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Dedup-check, classify, dispatch and mark one event.
    #[instrument(skip(self, event), fields(event_id = %event.event_id))]
    pub async fn process_event(&self, event: &LifelogEvent) -> DomainResult<EventOutcome> {
        let already = self
            .ledger
            .is_processed(&event.event_id)
            .await
            .map_err(|e| DomainError::DedupStore(e.to_string()))?;
        if already {
            tracing::debug!("Event already processed, skipping");
            return Ok(EventOutcome::Skipped);
        }

        let decision = self
            .classifier
            .classify(
                &event.text,
                Source::Ambient,
                &ClassificationContext::for_event(&event.event_id),
            )
            .await;
        tracing::debug!(reasoning = %decision.reasoning, "Event classified");

        let outcome = self
            .dispatcher
            .dispatch(&decision, &event.text, &event.event_id)
            .await;

        if !outcome.should_mark {
            tracing::info!(failed = outcome.failed(), "Event left unprocessed for retry");
            return Ok(EventOutcome::LeftUnprocessed);
        }

        let marker =
            ProcessedEventMarker::new(&event.event_id, Source::Ambient, outcome.disposition);
        let inserted = self
            .ledger
            .mark_processed(&marker)
            .await
            .map_err(|e| DomainError::DedupStore(e.to_string()))?;
        if !inserted {
            tracing::warn!("Event was marked concurrently by another worker");
        }

        tracing::info!(disposition = %outcome.disposition, "Event processed");
        Ok(EventOutcome::Marked(outcome.disposition))
    }
}

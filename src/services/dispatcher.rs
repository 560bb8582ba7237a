//! Resolves a [`RoutingDecision`] against the handler registry.
//!
//! Shared by the ingestion loop and the interactive surface. The dispatcher
//! performs side effects and notifies, then reports whether the event may be
//! marked processed. It never touches the ledger itself.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::instrument;

use crate::domain::models::{
    ActionResult, DecisionOutcome, Disposition, ModuleCall, Notification, RoutingDecision,
};
use crate::domain::ports::{NotificationSink, RetrievalService};
use crate::services::date_parser::DateResolver;
use crate::services::handler_registry::HandlerRegistry;

/// What dispatching one decision did.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchOutcome {
    pub disposition: Disposition,
    /// True for every no-op outcome, and for handler dispatch only when at
    /// least one invocation succeeded.
    pub should_mark: bool,
    pub results: Vec<ActionResult>,
    pub notifications: Vec<Notification>,
}

impl DispatchOutcome {
    fn marked(disposition: Disposition, notifications: Vec<Notification>) -> Self {
        Self {
            disposition,
            should_mark: true,
            results: Vec::new(),
            notifications,
        }
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }
}

pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    sink: Arc<dyn NotificationSink>,
    retrieval: Option<Arc<dyn RetrievalService>>,
    dates: DateResolver,
    dispatch_threshold: f64,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<HandlerRegistry>,
        sink: Arc<dyn NotificationSink>,
        dates: DateResolver,
        dispatch_threshold: f64,
    ) -> Self {
        Self {
            registry,
            sink,
            retrieval: None,
            dates,
            dispatch_threshold,
        }
    }

    pub fn with_retrieval(mut self, retrieval: Arc<dyn RetrievalService>) -> Self {
        self.retrieval = Some(retrieval);
        self
    }

    pub fn has_retrieval(&self) -> bool {
        self.retrieval.is_some()
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    #[instrument(skip(self, decision, text), fields(event_id = %event_id))]
    pub async fn dispatch(
        &self,
        decision: &RoutingDecision,
        text: &str,
        event_id: &str,
    ) -> DispatchOutcome {
        match decision.outcome() {
            DecisionOutcome::Failed(error) => {
                tracing::warn!(error, "Classification produced an error decision");
                let note = self
                    .notify(Notification::new("Could not process message", error))
                    .await;
                DispatchOutcome::marked(Disposition::Error, vec![note])
            }
            DecisionOutcome::Summary(date) => {
                let date = date.unwrap_or_else(|| self.dates.today());
                let note = self.notify(self.summary_notification(date).await).await;
                DispatchOutcome::marked(Disposition::Summary, vec![note])
            }
            DecisionOutcome::Retrieval(query) => {
                let query = query.unwrap_or(text);
                let body = match &self.retrieval {
                    None => "Retrieval is not configured, so this question cannot be answered."
                        .to_string(),
                    Some(retrieval) => match retrieval.answer(query).await {
                        Ok(answer) => answer,
                        Err(e) => {
                            tracing::warn!(error = %e, "Retrieval failed");
                            e.to_string()
                        }
                    },
                };
                let note = self.notify(Notification::new("Answer", body)).await;
                DispatchOutcome::marked(Disposition::Retrieval, vec![note])
            }
            DecisionOutcome::DirectAnswer(answer) => {
                let note = self.notify(Notification::new("Answer", answer)).await;
                DispatchOutcome::marked(Disposition::DirectAnswer, vec![note])
            }
            DecisionOutcome::NoAction => {
                let note = self
                    .notify(Notification::new("No action taken", &decision.reasoning))
                    .await;
                DispatchOutcome::marked(Disposition::NoAction, vec![note])
            }
            DecisionOutcome::Dispatch(calls) => {
                self.dispatch_to_handlers(calls, text, event_id).await
            }
        }
    }

    /// Summary notification for `date` across every registered handler.
    pub async fn summary_notification(&self, date: NaiveDate) -> Notification {
        let summary = self.registry.summarize_all(date).await;
        if summary.failed_count() > 0 {
            tracing::warn!(%date, failed = summary.failed_count(), "Some handler summaries failed");
        }
        let (title, body) = summary.render();
        Notification::new(title, body)
    }

    async fn dispatch_to_handlers(
        &self,
        calls: &[ModuleCall],
        text: &str,
        event_id: &str,
    ) -> DispatchOutcome {
        let results = self.fan_out(calls, text, event_id).await;
        let any_success = results.iter().any(|r| r.success);

        let mut notifications = Vec::new();
        for result in results.iter().filter(|r| r.success) {
            let body = result
                .notification_payload
                .clone()
                .unwrap_or_else(|| format!("Logged to {}.", result.handler_name));
            notifications.push(
                self.notify(Notification::new(format!("{} updated", result.handler_name), body))
                    .await,
            );
        }

        if !results.is_empty() && !any_success {
            tracing::warn!(
                failed = results.len(),
                "Every handler invocation failed, leaving event unprocessed"
            );
        }

        DispatchOutcome {
            disposition: Disposition::Dispatched,
            should_mark: any_success,
            results,
            notifications,
        }
    }

    /// Invoke every eligible handler concurrently.
    ///
    /// Calls below the dispatch threshold and calls naming an unregistered
    /// handler are skipped. One handler's error or panic becomes its own
    /// failed [`ActionResult`] and never affects the others.
    pub async fn fan_out(
        &self,
        calls: &[ModuleCall],
        text: &str,
        event_id: &str,
    ) -> Vec<ActionResult> {
        let mut handles = Vec::new();

        for call in calls {
            if call.confidence < self.dispatch_threshold {
                tracing::debug!(
                    handler = %call.handler_name,
                    confidence = call.confidence,
                    "Skipping handler below dispatch threshold"
                );
                continue;
            }
            let Some(descriptor) = self.registry.find_by_name(&call.handler_name) else {
                tracing::warn!(
                    handler = %call.handler_name,
                    "Decision names an unregistered handler, skipping"
                );
                continue;
            };

            let handler = Arc::clone(descriptor.handler());
            let handler_name = call.handler_name.clone();
            let text = text.to_string();
            let event_id = event_id.to_string();

            tracing::info!(handler = %handler_name, action = %call.action, "Invoking handler");
            let handle = tokio::spawn(async move {
                match handler.ingest(&text, &event_id).await {
                    Ok(result) => result,
                    Err(e) => ActionResult::failure(handler.name(), e.to_string()),
                }
            });
            handles.push((handler_name, handle));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (handler_name, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    ActionResult::failure(&handler_name, format!("handler task aborted: {e}"))
                }
            };
            if let Some(error) = &result.error {
                tracing::warn!(
                    handler = %handler_name,
                    error = %error,
                    "Handler invocation failed"
                );
            }
            results.push(result);
        }
        results
    }

    /// Send through the sink. Delivery failures are logged and the
    /// notification is still returned to the caller.
    pub async fn notify(&self, notification: Notification) -> Notification {
        if let Err(e) = self.sink.send(&notification.title, &notification.body).await {
            tracing::warn!(error = %e, title = %notification.title, "Notification delivery failed");
        }
        notification
    }
}

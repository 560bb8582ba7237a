//! Wiring of concrete adapters behind the domain ports.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::adapters::handlers::JournalHandler;
use crate::adapters::sqlite::{
    database_url, initialize_database, PoolConfig, SqliteJournalRepository,
    SqliteProcessedEventLedger,
};
use crate::domain::models::{Config, RoutingDecision, Source};
use crate::domain::ports::{EventSource, NotificationSink, ProcessedEventLedger, ReasoningService};
use crate::infrastructure::claude::{ClaudeApiError, ClaudeReasoningService};
use crate::infrastructure::lifelog_api::LifelogApiClient;
use crate::infrastructure::notifications::{
    spawn_forwarder, ChannelNotificationSink, TracingNotificationSink, WebhookNotificationSink,
};
use crate::infrastructure::retrieval::LifelogSearchRetrieval;
use crate::services::{
    ClassificationContext, ClassifierSettings, DateResolver, DispatchOutcome, Dispatcher,
    HandlerRegistry, IngestionLoop, IngestionLoopConfig, IntentClassifier, ScopeGate,
};

/// How long shutdown waits for queued notifications to drain.
const NOTIFICATION_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Every long-lived collaborator of the router, built once from [`Config`].
///
/// The reasoning service and the lifelog client are optional: commands that
/// only read local state work without API keys.
pub struct AppContext {
    pub config: Config,
    pub pool: SqlitePool,
    pub ledger: Arc<dyn ProcessedEventLedger>,
    pub registry: Arc<HandlerRegistry>,
    pub dates: DateResolver,
    pub dispatcher: Arc<Dispatcher>,
    reasoning: Option<Arc<dyn ReasoningService>>,
    lifelog: Option<Arc<LifelogApiClient>>,
    forwarder: Option<JoinHandle<()>>,
}

impl AppContext {
    pub async fn build(config: Config) -> Result<Self> {
        let dates = DateResolver::from_name(&config.timezone).context("Invalid timezone")?;

        let pool = initialize_database(
            &database_url(&config.database.path),
            Some(PoolConfig::from(&config.database)),
        )
        .await
        .with_context(|| format!("Failed to open database at {}", config.database.path))?;

        let ledger: Arc<dyn ProcessedEventLedger> =
            Arc::new(SqliteProcessedEventLedger::new(pool.clone()));
        let registry = Arc::new(build_registry(&config, &pool, &dates)?);

        let reasoning: Option<Arc<dyn ReasoningService>> =
            match ClaudeReasoningService::from_config(&config) {
                Ok(service) => Some(Arc::new(service)),
                Err(ClaudeApiError::MissingApiKey) => {
                    warn!("No Anthropic API key configured, classification is unavailable");
                    None
                }
                Err(e) => return Err(e).context("Failed to build reasoning client"),
            };

        let lifelog = match LifelogApiClient::from_config(&config) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                warn!(error = %e, "Lifelog API unavailable, ingestion and retrieval are disabled");
                None
            }
        };

        let (sink, forwarder) = build_sink(&config)?;

        let mut dispatcher = Dispatcher::new(
            registry.clone(),
            sink,
            dates.clone(),
            config.routing.dispatch_threshold,
        );
        if let (Some(reasoning), Some(lifelog)) = (&reasoning, &lifelog) {
            let retrieval =
                LifelogSearchRetrieval::new(lifelog.clone(), reasoning.clone(), dates.timezone());
            dispatcher = dispatcher.with_retrieval(Arc::new(retrieval));
        }

        info!(
            handlers = registry.len(),
            reasoning = reasoning.is_some(),
            lifelog = lifelog.is_some(),
            "Application context ready"
        );

        Ok(Self {
            config,
            pool,
            ledger,
            registry,
            dates,
            dispatcher: Arc::new(dispatcher),
            reasoning,
            lifelog,
            forwarder: Some(forwarder),
        })
    }

    /// Classifier over the registered handlers. Requires a reasoning service.
    pub fn classifier(&self) -> Result<IntentClassifier> {
        let reasoning = self
            .reasoning
            .clone()
            .context("Classification needs an Anthropic API key: set ANTHROPIC_API_KEY")?;

        Ok(IntentClassifier::new(
            reasoning,
            self.registry.clone(),
            self.dates.clone(),
            ScopeGate::new(&self.config.scope),
            ClassifierSettings::from_config(&self.config),
        )
        .with_retrieval(self.dispatcher.has_retrieval()))
    }

    /// Polling loop over the lifelog API. Requires both API keys.
    pub fn ingestion_loop(&self) -> Result<IngestionLoop> {
        let source: Arc<dyn EventSource> = self
            .lifelog
            .clone()
            .context(
                "Ingestion needs a lifelog API key: set lifelog_api.api_key or LIFELOG_API_KEY",
            )?;

        Ok(IngestionLoop::new(
            source,
            self.ledger.clone(),
            Arc::new(self.classifier()?),
            self.dispatcher.clone(),
            IngestionLoopConfig::from_config(&self.config.ingestion),
        ))
    }

    /// Classify and dispatch one chat message. The ledger is not consulted.
    pub async fn handle_interactive(
        &self,
        text: &str,
    ) -> Result<(RoutingDecision, DispatchOutcome)> {
        let classifier = self.classifier()?;
        let event_id = format!("interactive-{}", Uuid::new_v4());

        let decision = classifier
            .classify(text, Source::Interactive, &ClassificationContext::for_event(&event_id))
            .await;
        let outcome = self.dispatcher.dispatch(&decision, text, &event_id).await;
        Ok((decision, outcome))
    }

    /// Release the dispatcher and wait for queued notifications to drain.
    pub async fn shutdown(mut self) {
        let forwarder = self.forwarder.take();
        drop(self);

        if let Some(forwarder) = forwarder {
            if tokio::time::timeout(NOTIFICATION_DRAIN_TIMEOUT, forwarder).await.is_err() {
                warn!("Timed out draining pending notifications");
            }
        }
    }
}

/// Register one journal handler per enabled handler definition.
fn build_registry(
    config: &Config,
    pool: &SqlitePool,
    dates: &DateResolver,
) -> Result<HandlerRegistry> {
    let store = SqliteJournalRepository::new(pool.clone());
    let mut registry = HandlerRegistry::new();

    for handler in config.handlers.iter().filter(|h| h.enabled) {
        registry
            .register(Arc::new(JournalHandler::from_config(handler, store.clone(), dates.clone())))
            .with_context(|| format!("Failed to register handler '{}'", handler.name))?;
    }

    Ok(registry)
}

fn build_sink(config: &Config) -> Result<(Arc<dyn NotificationSink>, JoinHandle<()>)> {
    let delivery: Arc<dyn NotificationSink> = match &config.notifications.webhook_url {
        Some(url) if !url.trim().is_empty() => {
            let sink = WebhookNotificationSink::new(url.trim())
                .context("Invalid notification webhook")?;
            Arc::new(sink)
        }
        _ => Arc::new(TracingNotificationSink),
    };

    let (sink, rx) = ChannelNotificationSink::channel(config.notifications.channel_capacity);
    let forwarder = spawn_forwarder(rx, delivery);
    Ok((Arc::new(sink), forwarder))
}

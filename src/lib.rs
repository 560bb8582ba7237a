//! Lifelog Router - intent routing and idempotent dispatch
//!
//! Routes free-form text, from an ambient transcript feed or a chat surface,
//! to pluggable domain handlers. Every piece of text is classified into one
//! routing decision (handler dispatch, summary, retrieval, direct answer or
//! out of scope) and ambient events are dispatched at most once through a
//! durable dedup ledger.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): routing model, handler contract and ports
//! - **Service Layer** (`services`): classifier, registry, dispatcher, ingestion loop
//! - **Adapters** (`adapters`): SQLite ledger and journal handlers
//! - **Infrastructure Layer** (`infrastructure`): reasoning client, lifelog API,
//!   notifications, configuration and logging
//! - **Application Layer** (`application`): wiring
//! - **CLI Layer** (`cli`): command-line interface

pub mod adapters;
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::AppContext;
pub use domain::models::{
    ActionResult, Config, Disposition, LifelogEvent, ModuleCall, ProcessedEventMarker, RouteAction,
    RoutingDecision, Source, SummaryResult,
};
pub use domain::ports::{
    EventSource, Handler, NotificationSink, ProcessedEventLedger, ReasoningService,
    RetrievalService,
};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{DateResolver, Dispatcher, HandlerRegistry, IngestionLoop, IntentClassifier};

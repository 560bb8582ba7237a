//! Port trait definitions (Hexagonal Architecture)
//!
//! Async trait interfaces implemented by adapters:
//! - Handler: pluggable domain module (ingest + summarize)
//! - ReasoningService: tool-calling classification backend
//! - RetrievalService: answers questions over historical records
//! - EventSource: polling feed of lifelog events
//! - NotificationSink: write-only, best-effort result sink
//! - ProcessedEventLedger: durable dedup ledger

pub mod event_source;
pub mod handler;
pub mod ledger;
pub mod notification;
pub mod reasoning;
pub mod retrieval;

pub use event_source::EventSource;
pub use handler::Handler;
pub use ledger::ProcessedEventLedger;
pub use notification::NotificationSink;
pub use reasoning::{
    ReasoningError, ReasoningRequest, ReasoningResponse, ReasoningService, ToolDeclaration,
    ToolInvocation,
};
pub use retrieval::RetrievalService;

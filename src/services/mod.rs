//! Core routing services.

pub mod date_parser;
pub mod dispatcher;
pub mod handler_registry;
pub mod ingestion_loop;
pub mod intent_classifier;
pub mod scope_gate;
pub mod tool_projection;

pub use date_parser::DateResolver;
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use handler_registry::{HandlerDescriptor, HandlerRegistry};
pub use ingestion_loop::{
    CycleReport, EventOutcome, IngestionHandle, IngestionLoop, IngestionLoopConfig,
    IngestionStatus,
};
pub use intent_classifier::{ClassificationContext, ClassifierSettings, IntentClassifier};
pub use scope_gate::{ScopeGate, ScopeVerdict};

//! Domain models for the routing engine.

pub mod config;
pub mod event;
pub mod handler;
pub mod routing;

pub use config::{
    Config, DatabaseConfig, HandlerConfig, IngestionConfig, LifelogApiConfig, LoggingConfig,
    NotificationConfig, RateLimitConfig, ReasoningConfig, RetryConfig, RoutingConfig,
    ScheduledTaskConfig, ScopeConfig,
};
pub use event::{Disposition, LifelogEvent, ProcessedEventMarker};
pub use handler::{
    ActionResult, DailySummary, HandlerSummary, Notification, RegisteredTask, ScheduledTask,
    SummaryResult,
};
pub use routing::{DecisionOutcome, ModuleCall, RouteAction, RoutingDecision, Source};

//! Notification sinks.

pub mod channel;
pub mod tracing_sink;
pub mod webhook;

pub use channel::{spawn_forwarder, ChannelNotificationSink};
pub use tracing_sink::TracingNotificationSink;
pub use webhook::WebhookNotificationSink;

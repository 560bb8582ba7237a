//! Bounded channel between the dispatcher and a slow sink.
//!
//! The dispatcher only pays for an enqueue; a forwarder task drains the
//! channel into the real sink and logs delivery failures.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Notification;
use crate::domain::ports::NotificationSink;

#[derive(Clone)]
pub struct ChannelNotificationSink {
    tx: mpsc::Sender<Notification>,
}

impl ChannelNotificationSink {
    /// Create a sink and the receiving half of its channel.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl NotificationSink for ChannelNotificationSink {
    async fn send(&self, title: &str, body: &str) -> DomainResult<()> {
        self.tx
            .send(Notification::new(title, body))
            .await
            .map_err(|_| DomainError::NotificationFailed("notification channel closed".to_string()))
    }
}

/// Drain `rx` into `sink` until every sender is dropped.
pub fn spawn_forwarder(
    mut rx: mpsc::Receiver<Notification>,
    sink: Arc<dyn NotificationSink>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(notification) = rx.recv().await {
            if let Err(e) = sink.send(&notification.title, &notification.body).await {
                warn!(title = %notification.title, error = %e, "Notification delivery failed");
            }
        }
        debug!("Notification forwarder stopped");
    })
}

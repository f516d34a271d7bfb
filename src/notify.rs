//! Alert presentation contract and the worker → foreground handoff.
//!
//! The poll worker never touches presentation state. It hands a
//! [`FireEvent`] to the foreground context over a channel and waits for
//! the acknowledgment signal; only after that signal does the dedup mark
//! become durable.

use async_trait::async_trait;
use chrono::DateTime;
use chrono_tz::Tz;
use tokio::sync::{mpsc, oneshot};

use crate::error::{DaybellError, Result};

/// Presents one alert and returns once the user has acknowledged it.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn present(&self, title: &str, target: DateTime<Tz>) -> Result<()>;
}

/// A due alert handed to the presentation context.
#[derive(Debug)]
pub struct FireEvent {
    pub title: String,
    /// Nominal due time, shown to the user ("originally due at ...").
    pub target: DateTime<Tz>,
    /// Signal this once the user acknowledged the alert.
    pub ack: oneshot::Sender<()>,
}

/// Notifier that posts fire events to a channel consumed by the
/// foreground context, then blocks on the acknowledgment signal.
pub struct ChannelNotifier {
    tx: mpsc::Sender<FireEvent>,
}

impl ChannelNotifier {
    /// Build the notifier plus the receiver the foreground must drain.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<FireEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn present(&self, title: &str, target: DateTime<Tz>) -> Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        let event = FireEvent {
            title: title.to_string(),
            target,
            ack: ack_tx,
        };
        self.tx
            .send(event)
            .await
            .map_err(|_| DaybellError::Evaluation {
                title: title.to_string(),
                reason: "presentation context is gone".into(),
            })?;
        ack_rx.await.map_err(|_| DaybellError::Evaluation {
            title: title.to_string(),
            reason: "alert dismissed without acknowledgment".into(),
        })
    }
}

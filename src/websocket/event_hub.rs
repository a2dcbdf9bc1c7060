//! Push-event hub for UI subscribers.
//!
//! Every connected WebSocket holds a receiver of the same broadcast channel.
//! Sends never wait for subscribers and events sent while nobody is listening
//! are dropped.

use serde::Serialize;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 1024;

/// Events sent to UI clients
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "args")]
pub enum PushEvent {
    /// One console line from the server container
    #[serde(rename = "log-line")]
    LogLine(Vec<String>),

    /// The UI should wipe its log view
    #[serde(rename = "logs-cleared")]
    LogsCleared,
}

impl PushEvent {
    pub fn line(text: impl Into<String>) -> Self {
        PushEvent::LogLine(vec![text.into()])
    }
}

pub struct EventHub {
    event_tx: broadcast::Sender<PushEvent>,
}

impl EventHub {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { event_tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.event_tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.event_tx.receiver_count()
    }

    pub fn broadcast_line(&self, line: &str) {
        let _ = self.event_tx.send(PushEvent::line(line));
    }

    pub fn broadcast_cleared(&self) {
        let _ = self.event_tx.send(PushEvent::LogsCleared);
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

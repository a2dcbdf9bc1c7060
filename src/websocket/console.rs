//! Console streamer for the server container.
//!
//! Follows the container's combined stdout/stderr and pushes every line
//! through the event hub. At most one stream is live per process; attaching
//! tears down the previous one before opening a new one.

use futures::StreamExt;
use futures::stream::BoxStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::event_hub::EventHub;
use super::frame::LogFrame;
use crate::engine::{Engine, EngineError};

pub const STREAM_ENDED: &str = "[log stream ended]";

struct LiveStream {
    container: String,
    handle: JoinHandle<()>,
}

/// Decrements the active loop count when the decode task ends or is aborted.
struct LoopGuard(Arc<AtomicUsize>);

impl Drop for LoopGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct LogBroadcaster {
    engine: Arc<dyn Engine>,
    event_hub: Arc<EventHub>,
    tail: usize,
    live: Mutex<Option<LiveStream>>,
    active: Arc<AtomicUsize>,
}

impl LogBroadcaster {
    pub fn new(engine: Arc<dyn Engine>, event_hub: Arc<EventHub>, tail: usize) -> Self {
        Self {
            engine,
            event_hub,
            tail,
            live: Mutex::new(None),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Start following `container`, replacing any stream already running.
    pub async fn attach(&self, container: &str) {
        let mut live = self.live.lock().await;
        if let Some(previous) = live.take() {
            Self::teardown(previous).await;
        }

        tracing::info!("Attaching log stream to {} (tail {})", container, self.tail);

        let stream = self.engine.logs(container, self.tail);
        self.active.fetch_add(1, Ordering::SeqCst);
        let guard = LoopGuard(self.active.clone());
        let event_hub = self.event_hub.clone();
        let name = container.to_string();

        let handle = tokio::spawn(async move {
            let _guard = guard;
            Self::pump(stream, &name, &event_hub).await;
        });

        *live = Some(LiveStream {
            container: container.to_string(),
            handle,
        });
    }

    /// Close the live stream, if any. Safe to call repeatedly.
    pub async fn detach(&self) {
        if let Some(previous) = self.live.lock().await.take() {
            Self::teardown(previous).await;
        }
    }

    /// True while a decode loop is still reading `container`'s logs.
    pub async fn is_live_for(&self, container: &str) -> bool {
        match self.live.lock().await.as_ref() {
            Some(stream) => stream.container == container && !stream.handle.is_finished(),
            None => false,
        }
    }

    pub fn active_loops(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    async fn teardown(stream: LiveStream) {
        tracing::debug!("Closing log stream for {}", stream.container);
        stream.handle.abort();
        // Wait until the task is gone so two loops never overlap.
        let _ = stream.handle.await;
    }

    async fn pump(
        mut stream: BoxStream<'static, Result<LogFrame, EngineError>>,
        container: &str,
        event_hub: &EventHub,
    ) {
        let mut log_count: u64 = 0;

        while let Some(result) = stream.next().await {
            match result {
                Ok(frame) => {
                    for line in frame.lines() {
                        log_count += 1;
                        tracing::debug!("{} log #{}: {}", container, log_count, line);
                        event_hub.broadcast_line(&line);
                    }
                }
                Err(e) => {
                    tracing::warn!("Log stream error for {}: {}", container, e);
                    event_hub.broadcast_line(&format!("⚠️  {}", e));
                }
            }
        }

        tracing::info!("Log stream ended for {} (total {} lines)", container, log_count);
        event_hub.broadcast_line(STREAM_ENDED);
    }
}

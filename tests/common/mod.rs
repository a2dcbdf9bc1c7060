#![allow(dead_code)]

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

use mclaunchd::container::{LifecycleHandle, LifecycleManager, LifecycleSettings, ServerOptions};
use mclaunchd::engine::{ContainerInfo, ContainerSpec, Engine, EngineError, PullProgress};
use mclaunchd::websocket::{EventHub, FrameDecoder, LogBroadcaster, LogFrame, PushEvent};

pub const NAME: &str = "mc_test_server";
pub const IMAGE: &str = "itzg/minecraft-server:latest";

#[derive(Debug, Clone)]
pub struct FakeContainer {
    pub env: Vec<String>,
    pub running: bool,
    pub status: String,
}

#[derive(Default)]
pub struct FakeState {
    pub images: HashSet<String>,
    pub container: Option<FakeContainer>,
    pub calls: Vec<String>,
    pub pull_error: Option<String>,
    pub remove_error: Option<EngineError>,
    /// Returned by every container inspect
    pub inspect_error: Option<EngineError>,
    /// Returned by every image inspect
    pub image_error: Option<EngineError>,
    /// Raw multiplexed bytes served to every log stream
    pub log_bytes: Vec<u8>,
    /// Keep log streams open after the scripted bytes
    pub follow: bool,
    /// Error yielded after the scripted bytes
    pub log_error: Option<EngineError>,
    pub logs_opened: usize,
}

/// In-memory engine with one container slot.
#[derive(Default)]
pub struct FakeEngine {
    pub state: Mutex<FakeState>,
}

impl FakeEngine {
    pub fn new() -> Self {
        let engine = Self::default();
        engine.state.lock().unwrap().follow = true;
        engine
    }

    pub fn with_image(self) -> Self {
        self.state.lock().unwrap().images.insert(IMAGE.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == call).count()
    }

    pub fn logs_opened(&self) -> usize {
        self.state.lock().unwrap().logs_opened
    }

    pub fn set_container(&self, env: Vec<String>, running: bool) {
        self.state.lock().unwrap().container = Some(FakeContainer {
            env,
            running,
            status: if running { "running" } else { "exited" }.to_string(),
        });
    }

    pub fn container(&self) -> Option<FakeContainer> {
        self.state.lock().unwrap().container.clone()
    }

    fn record(&self, call: &str) {
        self.state.lock().unwrap().calls.push(call.to_string());
    }
}

#[async_trait]
impl Engine for FakeEngine {
    async fn ping(&self) -> Result<(), EngineError> {
        Ok(())
    }

    async fn inspect_image(&self, reference: &str) -> Result<(), EngineError> {
        self.record("inspect_image");
        let state = self.state.lock().unwrap();
        if let Some(err) = state.image_error.clone() {
            return Err(err);
        }
        if state.images.contains(reference) {
            Ok(())
        } else {
            Err(EngineError::NotFound(format!("No such image: {}", reference)))
        }
    }

    fn pull_image(
        &self,
        reference: &str,
    ) -> BoxStream<'static, Result<PullProgress, EngineError>> {
        self.record("pull_image");
        let mut state = self.state.lock().unwrap();
        let progress = PullProgress {
            status: Some("Downloading".to_string()),
            progress: None,
        };
        match state.pull_error.clone() {
            Some(err) => stream::iter(vec![
                Ok(progress),
                Err(EngineError::Api { status: 500, message: err }),
            ])
            .boxed(),
            None => {
                state.images.insert(reference.to_string());
                stream::iter(vec![Ok(progress)]).boxed()
            }
        }
    }

    async fn inspect_container(&self, name: &str) -> Result<ContainerInfo, EngineError> {
        self.record("inspect_container");
        let state = self.state.lock().unwrap();
        if let Some(err) = state.inspect_error.clone() {
            return Err(err);
        }
        match &state.container {
            Some(c) => Ok(ContainerInfo {
                id: "c0ffee".to_string(),
                running: c.running,
                status: c.status.clone(),
                env: c.env.clone(),
            }),
            None => Err(EngineError::NotFound(format!("No such container: {}", name))),
        }
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, EngineError> {
        self.record("create_container");
        let mut state = self.state.lock().unwrap();
        if state.container.is_some() {
            return Err(EngineError::Api {
                status: 409,
                message: format!("Conflict. The container name {} is already in use", spec.name),
            });
        }
        state.container = Some(FakeContainer {
            env: spec.env.clone(),
            running: false,
            status: "created".to_string(),
        });
        Ok("c0ffee".to_string())
    }

    async fn start_container(&self, name: &str) -> Result<(), EngineError> {
        self.record("start_container");
        match self.state.lock().unwrap().container.as_mut() {
            Some(c) => {
                c.running = true;
                c.status = "running".to_string();
                Ok(())
            }
            None => Err(EngineError::NotFound(name.to_string())),
        }
    }

    async fn stop_container(&self, name: &str) -> Result<(), EngineError> {
        self.record("stop_container");
        match self.state.lock().unwrap().container.as_mut() {
            Some(c) if c.running => {
                c.running = false;
                c.status = "exited".to_string();
                Ok(())
            }
            Some(_) => Err(EngineError::Api {
                status: 304,
                message: "container already stopped".to_string(),
            }),
            None => Err(EngineError::NotFound(name.to_string())),
        }
    }

    async fn remove_container(&self, name: &str, _force: bool) -> Result<(), EngineError> {
        self.record("remove_container");
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.remove_error.clone() {
            return Err(err);
        }
        match state.container.take() {
            Some(_) => Ok(()),
            None => Err(EngineError::NotFound(name.to_string())),
        }
    }

    fn logs(
        &self,
        _name: &str,
        _tail: usize,
    ) -> BoxStream<'static, Result<LogFrame, EngineError>> {
        let mut state = self.state.lock().unwrap();
        state.logs_opened += 1;

        let frames = FrameDecoder::new()
            .decode(&state.log_bytes)
            .expect("scripted log bytes are well-formed");
        let mut items: Vec<Result<LogFrame, EngineError>> = frames.into_iter().map(Ok).collect();
        if let Some(err) = state.log_error.clone() {
            items.push(Err(err));
        }

        let scripted = stream::iter(items);
        if state.follow {
            scripted.chain(stream::pending()).boxed()
        } else {
            scripted.boxed()
        }
    }
}

pub struct Harness {
    pub engine: Arc<FakeEngine>,
    pub hub: Arc<EventHub>,
    pub console: Arc<LogBroadcaster>,
    pub lifecycle: LifecycleHandle,
}

pub fn settings() -> LifecycleSettings {
    LifecycleSettings {
        container_name: NAME.to_string(),
        image: IMAGE.to_string(),
        port: 25565,
        recreate_on_settings_change: false,
    }
}

pub fn harness(engine: FakeEngine) -> Harness {
    harness_with(engine, settings())
}

pub fn harness_with(engine: FakeEngine, settings: LifecycleSettings) -> Harness {
    let engine = Arc::new(engine);
    let hub = Arc::new(EventHub::new());
    let console = Arc::new(LogBroadcaster::new(engine.clone(), hub.clone(), 10));
    let (lifecycle, _events) =
        LifecycleManager::spawn(engine.clone(), console.clone(), hub.clone(), settings);
    Harness {
        engine,
        hub,
        console,
        lifecycle,
    }
}

pub fn options() -> ServerOptions {
    ServerOptions {
        name: "S".to_string(),
        version: "1.20.1".to_string(),
        max_players: 20,
        difficulty: "easy".to_string(),
        motd: "hi".to_string(),
    }
}

pub async fn next_event(rx: &mut broadcast::Receiver<PushEvent>) -> PushEvent {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for push event")
        .expect("event channel closed")
}

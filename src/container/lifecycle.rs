//! Lifecycle of the single server container.
//!
//! Every operation goes through one actor task, so a stop issued while a start
//! is still pulling the image waits for the start to finish instead of racing
//! it against the same container name.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use super::image::ensure_image;
use super::options::{ServerOptions, build_env, env_drift};
use super::state::{ContainerState, StartOutcome, StatusReport, StopOutcome};
use crate::config::config::MinecraftConfig;
use crate::engine::{ContainerSpec, Engine, EngineError};
use crate::error::LauncherError;
use crate::websocket::{EventHub, LogBroadcaster};

const COMMAND_QUEUE: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    CreatingContainer(String),
    ContainerCreated(String, String),
    Started(String),
    Adopted(String),
    Stopped(String),
    Error(String, String),
}

#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    pub container_name: String,
    pub image: String,
    pub port: u16,
    pub recreate_on_settings_change: bool,
}

impl From<&MinecraftConfig> for LifecycleSettings {
    fn from(config: &MinecraftConfig) -> Self {
        Self {
            container_name: config.container_name.clone(),
            image: config.image.clone(),
            port: config.port,
            recreate_on_settings_change: config.recreate_on_settings_change,
        }
    }
}

enum Command {
    Start {
        options: ServerOptions,
        reply: oneshot::Sender<Result<StartOutcome, LauncherError>>,
    },
    Stop {
        reply: oneshot::Sender<StopOutcome>,
    },
    Status {
        reply: oneshot::Sender<Result<StatusReport, LauncherError>>,
    },
    Adopt {
        reply: oneshot::Sender<Result<bool, LauncherError>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Cheap, cloneable entry point to the lifecycle actor.
#[derive(Clone)]
pub struct LifecycleHandle {
    command_tx: mpsc::Sender<Command>,
}

impl LifecycleHandle {
    pub async fn start(&self, options: ServerOptions) -> Result<StartOutcome, LauncherError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Start { options, reply }).await?;
        rx.await.map_err(|_| LauncherError::ShutDown)?
    }

    /// Best-effort teardown. Engine failures are reported in the outcome,
    /// never as an error.
    pub async fn stop(&self) -> Result<StopOutcome, LauncherError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Stop { reply }).await?;
        rx.await.map_err(|_| LauncherError::ShutDown)
    }

    pub async fn status(&self) -> Result<StatusReport, LauncherError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Status { reply }).await?;
        rx.await.map_err(|_| LauncherError::ShutDown)?
    }

    /// Attach the log stream if the container is already running. Returns
    /// whether it was.
    pub async fn adopt_running(&self) -> Result<bool, LauncherError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Adopt { reply }).await?;
        rx.await.map_err(|_| LauncherError::ShutDown)?
    }

    /// Close the live log stream and stop the actor. The container itself is
    /// left alone.
    pub async fn shutdown(&self) {
        let (reply, rx) = oneshot::channel();
        if self.send(Command::Shutdown { reply }).await.is_ok() {
            let _ = rx.await;
        }
    }

    async fn send(&self, command: Command) -> Result<(), LauncherError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| LauncherError::ShutDown)
    }
}

pub struct LifecycleManager {
    engine: Arc<dyn Engine>,
    console: Arc<LogBroadcaster>,
    event_hub: Arc<EventHub>,
    settings: LifecycleSettings,
    event_tx: mpsc::UnboundedSender<LifecycleEvent>,
}

impl LifecycleManager {
    pub fn spawn(
        engine: Arc<dyn Engine>,
        console: Arc<LogBroadcaster>,
        event_hub: Arc<EventHub>,
        settings: LifecycleSettings,
    ) -> (LifecycleHandle, mpsc::UnboundedReceiver<LifecycleEvent>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE);
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let manager = Self {
            engine,
            console,
            event_hub,
            settings,
            event_tx,
        };
        tokio::spawn(manager.run(command_rx));

        tracing::info!("Lifecycle manager initialized");
        (LifecycleHandle { command_tx }, event_rx)
    }

    async fn run(self, mut command_rx: mpsc::Receiver<Command>) {
        while let Some(command) = command_rx.recv().await {
            match command {
                Command::Start { options, reply } => {
                    let result = self.start(&options).await;
                    if let Err(e) = &result {
                        tracing::error!("Start failed for {}: {}", self.name(), e);
                        self.emit(LifecycleEvent::Error(self.name().to_string(), e.to_string()));
                    }
                    let _ = reply.send(result);
                }
                Command::Stop { reply } => {
                    let _ = reply.send(self.stop().await);
                }
                Command::Status { reply } => {
                    let _ = reply.send(self.status().await);
                }
                Command::Adopt { reply } => {
                    let _ = reply.send(self.adopt_running().await);
                }
                Command::Shutdown { reply } => {
                    self.console.detach().await;
                    let _ = reply.send(());
                    break;
                }
            }
        }

        tracing::info!("Lifecycle manager stopped");
    }

    fn name(&self) -> &str {
        &self.settings.container_name
    }

    fn emit(&self, event: LifecycleEvent) {
        let _ = self.event_tx.send(event);
    }

    async fn start(&self, options: &ServerOptions) -> Result<StartOutcome, LauncherError> {
        let name = self.name();

        let info = match self.engine.inspect_container(name).await {
            Ok(info) => info,
            Err(e) if e.is_not_found() => {
                let env = build_env(&options.validate());
                self.create_and_start(env).await?;
                return Ok(StartOutcome::Created);
            }
            Err(e) => return Err(e.into()),
        };

        if info.state() == ContainerState::Running {
            if !self.console.is_live_for(name).await {
                self.console.attach(name).await;
            }
            tracing::info!("{} is already running, start ignored", name);
            return Ok(StartOutcome::AlreadyRunning);
        }

        // Created or stopped: reuse it. The container keeps the environment
        // it was created with unless recreation is enabled.
        let env = build_env(&options.validate());
        let drift = env_drift(&env, &info.env);
        if !drift.is_empty() {
            if self.settings.recreate_on_settings_change {
                tracing::info!("Settings changed ({}), recreating {}", drift.join(", "), name);
                match self.engine.remove_container(name, true).await {
                    Ok(()) => {}
                    Err(e) if e.is_not_found() => {}
                    Err(e) => return Err(start_failed(e)),
                }
                self.create_and_start(env).await?;
                return Ok(StartOutcome::Recreated);
            }
            tracing::warn!(
                "Reusing {} with its original settings, ignoring changes to: {}",
                name,
                drift.join(", ")
            );
        }

        tracing::info!("Starting existing container {} ({})", name, info.id);
        self.engine.start_container(name).await.map_err(start_failed)?;
        self.console.attach(name).await;
        self.emit(LifecycleEvent::Started(name.to_string()));
        Ok(StartOutcome::Restarted)
    }

    async fn create_and_start(&self, env: Vec<String>) -> Result<(), LauncherError> {
        let name = self.name();

        ensure_image(self.engine.as_ref(), &self.settings.image).await?;

        self.event_hub.broadcast_cleared();
        self.emit(LifecycleEvent::CreatingContainer(name.to_string()));

        let spec = ContainerSpec {
            name: name.to_string(),
            image: self.settings.image.clone(),
            env,
            port: self.settings.port,
        };
        let container_id = self.engine.create_container(&spec).await.map_err(start_failed)?;
        tracing::info!("Container {} created with id {}", name, container_id);
        self.emit(LifecycleEvent::ContainerCreated(name.to_string(), container_id));

        self.engine.start_container(name).await.map_err(start_failed)?;
        self.console.attach(name).await;

        tracing::info!("Started container {}", name);
        self.emit(LifecycleEvent::Started(name.to_string()));
        Ok(())
    }

    async fn stop(&self) -> StopOutcome {
        let name = self.name();
        self.console.detach().await;

        match self.engine.stop_container(name).await {
            Ok(()) => tracing::info!("Stopped container {}", name),
            Err(e) if e.is_not_found() => {}
            Err(EngineError::Api { status: 304, .. }) => {
                tracing::debug!("Container {} was not running", name);
            }
            Err(e) => tracing::warn!("Failed to stop {}: {}", name, e),
        }

        let outcome = match self.engine.remove_container(name, true).await {
            Ok(()) => StopOutcome::Removed,
            Err(e) if e.is_not_found() => StopOutcome::AlreadyAbsent,
            Err(e) => {
                tracing::warn!("Failed to remove {}: {}", name, e);
                StopOutcome::Attempted { error: e.to_string() }
            }
        };

        self.event_hub.broadcast_cleared();
        self.emit(LifecycleEvent::Stopped(name.to_string()));
        outcome
    }

    async fn status(&self) -> Result<StatusReport, LauncherError> {
        match self.engine.inspect_container(self.name()).await {
            Ok(info) => Ok(StatusReport {
                running: info.running,
                status: info.status,
            }),
            Err(e) if e.is_not_found() => Ok(StatusReport::not_created()),
            Err(e) => Err(e.into()),
        }
    }

    async fn adopt_running(&self) -> Result<bool, LauncherError> {
        let name = self.name();
        match self.engine.inspect_container(name).await {
            Ok(info) if info.state() == ContainerState::Running => {
                if !self.console.is_live_for(name).await {
                    self.console.attach(name).await;
                }
                self.emit(LifecycleEvent::Adopted(name.to_string()));
                Ok(true)
            }
            Ok(_) => Ok(false),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

fn start_failed(err: EngineError) -> LauncherError {
    match err {
        EngineError::Connectivity(msg) => LauncherError::Connectivity(msg),
        other => LauncherError::StartFailed(other.to_string()),
    }
}

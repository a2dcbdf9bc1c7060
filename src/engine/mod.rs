//! Container engine surface used by the lifecycle manager and the console.
//!
//! `DockerEngine` talks to the real daemon through bollard; everything else in
//! the crate only sees the `Engine` trait.

pub mod docker;
pub mod transport;

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

use crate::container::state::ContainerState;
use crate::websocket::frame::LogFrame;

pub use docker::DockerEngine;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    #[error("No such object: {0}")]
    NotFound(String),

    #[error("Engine unreachable: {0}")]
    Connectivity(String),

    #[error("Engine returned {status}: {message}")]
    Api { status: u16, message: String },
}

impl EngineError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::NotFound(_))
    }
}

/// Snapshot of an inspect-container response.
#[derive(Debug, Clone)]
pub struct ContainerInfo {
    pub id: String,
    pub running: bool,
    /// Raw engine status string (`running`, `exited`, ...)
    pub status: String,
    pub env: Vec<String>,
}

impl ContainerInfo {
    pub fn state(&self) -> ContainerState {
        if self.running {
            ContainerState::Running
        } else {
            ContainerState::from_engine_status(&self.status)
        }
    }
}

/// Everything needed to create the server container.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub env: Vec<String>,
    /// Bound identically inside and outside the container (tcp).
    pub port: u16,
}

/// One progress message from an image pull.
#[derive(Debug, Clone, Default)]
pub struct PullProgress {
    pub status: Option<String>,
    pub progress: Option<String>,
}

#[async_trait]
pub trait Engine: Send + Sync {
    async fn ping(&self) -> Result<(), EngineError>;

    async fn inspect_image(&self, reference: &str) -> Result<(), EngineError>;

    /// Starts a pull; the returned stream ends when the pull is complete.
    fn pull_image(&self, reference: &str) -> BoxStream<'static, Result<PullProgress, EngineError>>;

    async fn inspect_container(&self, name: &str) -> Result<ContainerInfo, EngineError>;

    /// Returns the new container id.
    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, EngineError>;

    async fn start_container(&self, name: &str) -> Result<(), EngineError>;

    async fn stop_container(&self, name: &str) -> Result<(), EngineError>;

    async fn remove_container(&self, name: &str, force: bool) -> Result<(), EngineError>;

    /// Follow-mode stdout+stderr stream starting with the last `tail` lines.
    fn logs(&self, name: &str, tail: usize) -> BoxStream<'static, Result<LogFrame, EngineError>>;
}

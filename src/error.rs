//! Error types surfaced by the launcher daemon.

use thiserror::Error;

use crate::engine::EngineError;

/// Errors returned from lifecycle commands and daemon bootstrap.
#[derive(Debug, Error)]
pub enum LauncherError {
    #[error("Cannot reach container engine: {0}")]
    Connectivity(String),

    #[error("Image pull failed for {image}: {reason}")]
    PullFailed { image: String, reason: String },

    /// The engine was reachable but rejected the request.
    #[error("Container engine error ({status}): {message}")]
    Engine { status: u16, message: String },

    #[error("Failed to start server container: {0}")]
    StartFailed(String),

    #[error("Lifecycle manager is shut down")]
    ShutDown,

    #[error("Failed to read config file: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl From<EngineError> for LauncherError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Connectivity(msg) => LauncherError::Connectivity(msg),
            EngineError::NotFound(message) => LauncherError::Engine {
                status: 404,
                message,
            },
            EngineError::Api { status, message } => LauncherError::Engine { status, message },
        }
    }
}

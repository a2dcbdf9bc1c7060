use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::LauncherError;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub version: String,
    pub server: ServerConfig,
    pub docker: DockerConfig,
    pub minecraft: MinecraftConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DockerConfig {
    /// Skips socket probing when set
    pub socket_path: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MinecraftConfig {
    pub container_name: String,
    pub image: String,
    /// Game port, bound identically on the host
    pub port: u16,
    /// Lines replayed when a log stream attaches
    pub log_tail: usize,
    /// Recreate a stopped container whose environment no longer matches the
    /// requested options instead of reusing it as-is.
    pub recreate_on_settings_change: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            server: ServerConfig::default(),
            docker: DockerConfig::default(),
            minecraft: MinecraftConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            socket_path: None,
            timeout_secs: 120,
        }
    }
}

impl Default for MinecraftConfig {
    fn default() -> Self {
        Self {
            container_name: "mc_launcher_server".to_string(),
            image: "itzg/minecraft-server:latest".to_string(),
            port: 25565,
            log_tail: 10,
            recreate_on_settings_change: false,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LauncherError> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Like `load`, but a missing file means defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, LauncherError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn get_version(&self) -> &str {
        &self.version
    }
}

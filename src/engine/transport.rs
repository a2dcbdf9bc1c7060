//! Picks the engine socket for the current machine and opens a bollard client.

use bollard::{API_DEFAULT_VERSION, Docker};
use std::path::{Path, PathBuf};

pub const WINDOWS_PIPE: &str = "//./pipe/docker_engine";
pub const WSL_SHARED_SOCKET: &str =
    "/mnt/wsl/docker-desktop/shared-sockets/guest-services/docker.sock";
pub const DEFAULT_SOCKET: &str = "/var/run/docker.sock";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Linux,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else if cfg!(target_os = "linux") {
            Platform::Linux
        } else {
            Platform::Other
        }
    }
}

/// Environment variables that influence socket selection.
#[derive(Debug, Clone, Default)]
pub struct EnvProbe {
    pub wsl_distro: Option<String>,
    pub xdg_runtime_dir: Option<String>,
}

impl EnvProbe {
    pub fn from_env() -> Self {
        Self {
            wsl_distro: std::env::var("WSL_DISTRO_NAME").ok().filter(|v| !v.is_empty()),
            xdg_runtime_dir: std::env::var("XDG_RUNTIME_DIR").ok().filter(|v| !v.is_empty()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketTarget {
    NamedPipe(String),
    Unix(PathBuf),
}

impl std::fmt::Display for SocketTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SocketTarget::NamedPipe(pipe) => write!(f, "npipe://{}", pipe),
            SocketTarget::Unix(path) => write!(f, "unix://{}", path.display()),
        }
    }
}

/// First match wins: config override, Windows pipe, WSL shared socket,
/// rootless runtime socket, system default.
pub fn resolve_socket(
    override_path: Option<&str>,
    platform: Platform,
    env: &EnvProbe,
    exists: impl Fn(&Path) -> bool,
) -> SocketTarget {
    if let Some(path) = override_path.filter(|p| !p.trim().is_empty()) {
        return match platform {
            Platform::Windows => SocketTarget::NamedPipe(path.to_string()),
            _ => SocketTarget::Unix(PathBuf::from(path)),
        };
    }

    if platform == Platform::Windows {
        tracing::debug!("Detected Windows environment");
        return SocketTarget::NamedPipe(WINDOWS_PIPE.to_string());
    }

    if platform == Platform::Linux && env.wsl_distro.is_some() {
        tracing::debug!("Detected WSL2 environment");
        return SocketTarget::Unix(PathBuf::from(WSL_SHARED_SOCKET));
    }

    // rootless docker
    if let Some(runtime_dir) = &env.xdg_runtime_dir {
        let rootless = Path::new(runtime_dir).join("docker.sock");
        if exists(&rootless) {
            return SocketTarget::Unix(rootless);
        }
    }

    SocketTarget::Unix(PathBuf::from(DEFAULT_SOCKET))
}

/// Build a client for `target`. Nothing is sent to the engine here; an
/// unreachable socket shows up on the first API call.
pub fn connect(target: &SocketTarget, timeout_secs: u64) -> Result<Docker, bollard::errors::Error> {
    match target {
        #[cfg(windows)]
        SocketTarget::NamedPipe(pipe) => {
            Docker::connect_with_named_pipe(pipe, timeout_secs, API_DEFAULT_VERSION)
        }
        #[cfg(unix)]
        SocketTarget::Unix(path) => {
            Docker::connect_with_unix(&path.to_string_lossy(), timeout_secs, API_DEFAULT_VERSION)
        }
        #[allow(unreachable_patterns)]
        _ => {
            tracing::warn!("Socket {} not usable on this platform, using local defaults", target);
            Docker::connect_with_local_defaults()
        }
    }
}

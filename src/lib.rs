//! mclaunchd supervises one Minecraft server container on the local Docker
//! engine and streams its console to UI clients.

pub mod config;
pub mod container;
pub mod daemon;
pub mod engine;
pub mod error;
pub mod router;
pub mod websocket;

pub use error::LauncherError;

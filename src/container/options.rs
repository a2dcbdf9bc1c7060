//! Server options as sent by the settings form, and the environment the
//! `itzg/minecraft-server` image reads them from.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Missing or `null` fields take the form defaults and go through
/// `validate()` like any other value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "PartialOptions")]
pub struct ServerOptions {
    pub name: String,
    pub version: String,
    pub max_players: u32,
    pub difficulty: String,
    pub motd: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartialOptions {
    name: Option<String>,
    version: Option<String>,
    max_players: Option<u32>,
    difficulty: Option<String>,
    motd: Option<String>,
}

impl From<PartialOptions> for ServerOptions {
    fn from(partial: PartialOptions) -> Self {
        let defaults = ServerOptions::default();
        Self {
            name: partial.name.unwrap_or(defaults.name),
            version: partial.version.unwrap_or(defaults.version),
            max_players: partial.max_players.unwrap_or(defaults.max_players),
            difficulty: partial.difficulty.unwrap_or(defaults.difficulty),
            motd: partial.motd.unwrap_or(defaults.motd),
        }
    }
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            name: "My Awesome Server".to_string(),
            version: MinecraftVersion::default().to_string(),
            max_players: 20,
            difficulty: Difficulty::default().to_string(),
            motd: "Welcome to my server!".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MinecraftVersion {
    #[default]
    V1_20_1,
    V1_16_5,
}

impl MinecraftVersion {
    pub const SUPPORTED: [MinecraftVersion; 2] =
        [MinecraftVersion::V1_20_1, MinecraftVersion::V1_16_5];

    pub fn as_str(&self) -> &'static str {
        match self {
            MinecraftVersion::V1_20_1 => "1.20.1",
            MinecraftVersion::V1_16_5 => "1.16.5",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::SUPPORTED
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for MinecraftVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Difficulty {
    Peaceful,
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Peaceful => "peaceful",
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "peaceful" => Some(Difficulty::Peaceful),
            "easy" => Some(Difficulty::Easy),
            "normal" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options after the fallback policy has been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedOptions {
    pub name: String,
    pub version: MinecraftVersion,
    pub max_players: u32,
    pub difficulty: Difficulty,
    pub motd: String,
}

impl ServerOptions {
    /// Unsupported versions and difficulties are replaced by their defaults
    /// with a warning. Never fails and leaves `self` untouched.
    pub fn validate(&self) -> ValidatedOptions {
        let version = MinecraftVersion::parse(&self.version).unwrap_or_else(|| {
            let fallback = MinecraftVersion::default();
            tracing::warn!("Unsupported version {:?}, falling back to {}", self.version, fallback);
            fallback
        });

        let difficulty = Difficulty::parse(&self.difficulty).unwrap_or_else(|| {
            let fallback = Difficulty::default();
            tracing::warn!(
                "Unknown difficulty {:?}, falling back to {}",
                self.difficulty,
                fallback
            );
            fallback
        });

        ValidatedOptions {
            name: self.name.clone(),
            version,
            max_players: self.max_players,
            difficulty,
            motd: self.motd.clone(),
        }
    }
}

/// `KEY=VALUE` pairs for the container, EULA acceptance first.
pub fn build_env(options: &ValidatedOptions) -> Vec<String> {
    vec![
        "EULA=TRUE".to_string(),
        format!("SERVER_NAME={}", options.name),
        format!("VERSION={}", options.version),
        format!("MAX_PLAYERS={}", options.max_players),
        format!("DIFFICULTY={}", options.difficulty),
        format!("MOTD={}", options.motd),
    ]
}

/// Keys of `wanted` whose value is missing from `actual`.
pub fn env_drift(wanted: &[String], actual: &[String]) -> Vec<String> {
    wanted
        .iter()
        .filter(|kv| !actual.contains(kv))
        .map(|kv| kv.split_once('=').map(|(k, _)| k).unwrap_or(kv).to_string())
        .collect()
}

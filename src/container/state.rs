use serde::{Deserialize, Serialize};

pub const NOT_CREATED: &str = "not-created";

/// Where the server container currently is, as reported by the engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ContainerState {
    Absent,
    Created,
    Running,
    Stopped,
    Unknown,
}

impl ContainerState {
    pub fn from_engine_status(status: &str) -> Self {
        match status {
            "created" => ContainerState::Created,
            "running" => ContainerState::Running,
            "exited" | "dead" => ContainerState::Stopped,
            _ => ContainerState::Unknown,
        }
    }
}

/// Answer to a status query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusReport {
    pub running: bool,
    pub status: String,
}

impl StatusReport {
    pub fn not_created() -> Self {
        Self {
            running: false,
            status: NOT_CREATED.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StartOutcome {
    Created,
    Restarted,
    Recreated,
    AlreadyRunning,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StopOutcome {
    /// Container was removed by this call
    Removed,
    /// Nothing to remove
    AlreadyAbsent,
    /// Teardown hit an engine error; the container may still exist
    Attempted { error: String },
}

impl StopOutcome {
    pub fn confirmed_absent(&self) -> bool {
        !matches!(self, StopOutcome::Attempted { .. })
    }
}

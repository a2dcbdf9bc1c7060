pub mod image;
pub mod lifecycle;
pub mod options;
pub mod state;

pub use lifecycle::{LifecycleEvent, LifecycleHandle, LifecycleManager, LifecycleSettings};
pub use options::{Difficulty, MinecraftVersion, ServerOptions, ValidatedOptions, build_env};
pub use state::{ContainerState, StartOutcome, StatusReport, StopOutcome};

//! Live console feed for the UI
//!
//! ## Events (server -> client)
//! - `log-line` - one console line from the server container
//! - `logs-cleared` - the UI should wipe its log view
//!
//! Connecting to `/ws` only subscribes. A log stream is attached when the
//! server is started or found already running.

pub mod console;
pub mod event_hub;
pub mod frame;
pub mod handler;

pub use console::{LogBroadcaster, STREAM_ENDED};
pub use event_hub::{EventHub, PushEvent};
pub use frame::{FrameDecoder, LogFrame, StreamKind};
pub use handler::{WebSocketState, ws_handler};

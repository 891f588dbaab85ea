//! Live streaming pipeline: wire events, per-session heartbeats, and the
//! session manager that ties frames to classifications.

pub mod events;
pub mod heartbeat;
pub mod manager;

pub use events::{InboundEvent, OutboundEvent, unix_timestamp};
pub use manager::StreamingSessionManager;

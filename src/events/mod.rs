//! Outbound domain events and their fan-out

pub mod dispatcher;
pub mod types;

pub use dispatcher::{EventDispatcher, EventObserver, LogObserver};
pub use types::{DefuseStopReason, EventEnvelope, GameEvent};

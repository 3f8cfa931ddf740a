//! Reconnect orchestration.
//!
//! ## Module Structure
//!
//! - `target`: Reconnectable destinations and attempt bookkeeping
//! - `scheduler`: Single-worker delayed execution
//! - `controller`: The reconnect state machine (`ReconnectController`)
//! - `messages`: Scripted messages sent after an automatic reconnect
//! - `navigation`: View heuristics that invalidate a stale target

pub mod controller;
pub mod messages;
pub mod navigation;
pub mod scheduler;
pub mod target;

pub use controller::{ControllerState, ReconnectController, Tick, TickCallback};
pub use messages::{ChatSink, MessageScript};
pub use navigation::View;
pub use scheduler::{Dispatch, Inline, Scheduler, TaskHandle};
pub use target::{Connector, Destination, RetryTarget, TargetKind};

use crate::common::AttemptsExhausted;

/// Settings the controller reads at the moment it needs them.
pub trait ReconnectSettings: Send + Sync {
    /// Countdown length in seconds for a 1-based attempt number.
    fn delay_for_attempt(&self, attempt: u32) -> Result<u32, AttemptsExhausted>;

    /// The configured auto-message script, if any.
    fn auto_messages(&self) -> Option<MessageScript>;
}

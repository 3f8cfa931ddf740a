//! Canonical message types passed between the session task and the
//! application loop.

/// Lifecycle notification emitted by the session task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A connection attempt to `address` has started.
    Connecting { address: String },
    /// The connection is up and the session is usable.
    Established { address: String },
    /// The connection closed or could not be opened.
    Disconnected {
        address: String,
        /// Human-readable cause, if one is known.
        reason: Option<String>,
    },
    /// Automatic reconnection ran out of configured attempts.
    GaveUp,
}

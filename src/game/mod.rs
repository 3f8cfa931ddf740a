//! Line-based session client used by the `autoreconnect` binary.
//!
//! This module contains:
//! - Channel bundle between the application loop and the session task
//! - The connector the reconnect controller calls for remote targets
//! - The session client itself

pub mod channels;
pub mod client;
pub mod connector;

// Re-export commonly used types
pub use channels::{AppChannels, ChannelBundle, SessionChannels};
pub use client::GameClient;
pub use connector::ChannelConnector;

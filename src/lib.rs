//! Automatic reconnection to a previously joined world or server.
//!
//! The core is [`reconnect::ReconnectController`]: it tracks retry attempts
//! for one target, counts down before each retry on a single-worker
//! [`reconnect::Scheduler`], dispatches the reconnect action, and sends a
//! scripted message sequence after a successful automatic reconnect.
//!
//! The surrounding application owns the controller and feeds it disconnect,
//! navigation and session-established events. The `autoreconnect` binary
//! does this for line-based TCP servers using the [`game`] module.

pub mod common;
pub mod config;
pub mod game;
pub mod reconnect;

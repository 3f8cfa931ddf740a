//! Common utilities and types shared across the application.

pub mod error;
pub mod messages;

pub use error::{AppError, AttemptsExhausted, ConfigError, ConnectionError, ReconnectError};
pub use messages::SessionEvent;

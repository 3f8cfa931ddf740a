//! Error types for the application.

use thiserror::Error;

/// Top-level application error.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Reconnect error: {0}")]
    Reconnect(#[from] ReconnectError),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

/// Errors raised by the reconnect controller.
///
/// These are programmer errors in the code that feeds events to the
/// controller. Debug builds panic before returning them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconnectError {
    #[error("Contract violation: {message}")]
    ContractViolation { message: String },
}

/// The delay table has no entry for the requested attempt.
///
/// Signals that automatic retries should stop; surfaced to the countdown
/// callback as `Tick::Exhausted`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("No delay configured for attempt {attempt}")]
pub struct AttemptsExhausted {
    pub attempt: u32,
}

/// Connection-related errors.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Failed to connect to {address}: {source}")]
    ConnectFailed {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Line codec error: {0}")]
    Codec(#[from] tokio_util::codec::LinesCodecError),
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for connection operations.
pub type ConnectionResult<T> = std::result::Result<T, ConnectionError>;

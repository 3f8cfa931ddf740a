//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.

use crate::common::error::ConfigError;
use crate::config::types::Config;

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    // Delay table
    for (i, delay) in config.delays.0.iter().enumerate() {
        if *delay == 0 {
            errors.push(format!("delays[{}] must be at least 1 second", i));
        }
    }

    // Auto messages
    let auto_messages = &config.auto_messages;
    if auto_messages.delay == 0 {
        errors.push("auto-messages.delay must be at least 1 millisecond".to_string());
    }
    if !auto_messages.messages.is_empty() && auto_messages.name.trim().is_empty() {
        errors.push(
            "auto-messages.name is required when auto-messages.messages is not empty".to_string(),
        );
    }

    // Session
    if let Some(ref session) = config.session {
        match session.host_port() {
            None => errors.push(format!(
                "session.address '{}' must be in host:port form",
                session.address
            )),
            Some((_, 0)) => errors.push("session.address port must be non-zero".to_string()),
            Some(_) => {}
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}

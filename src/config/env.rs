//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `AUTORECONNECT_CONFIG` - Path of the HOCON config file
//! - `AUTORECONNECT_ADDRESS` - Remote session address (`host:port`)
//! - `AUTORECONNECT_DELAYS` - Comma-separated countdown lengths in seconds

use std::env;

use tracing::warn;

use crate::config::types::{Config, DelayTable, SessionConfig};

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "AUTORECONNECT";

/// Apply environment variable overrides to a config.
pub fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(address) = env::var(format!("{}_ADDRESS", ENV_PREFIX)) {
        config.session = Some(SessionConfig { address });
    }

    if let Ok(delays) = env::var(format!("{}_DELAYS", ENV_PREFIX)) {
        match parse_delays(&delays) {
            Some(table) => config.delays = table,
            None => warn!(
                "Ignoring {}_DELAYS: '{}' is not a comma-separated list of seconds",
                ENV_PREFIX, delays
            ),
        }
    }

    config
}

/// Parse "5, 10, 20" into a delay table. An empty string yields an empty table.
pub fn parse_delays(value: &str) -> Option<DelayTable> {
    let value = value.trim();
    if value.is_empty() {
        return Some(DelayTable(Vec::new()));
    }
    value
        .split(',')
        .map(|part| part.trim().parse::<u32>().ok())
        .collect::<Option<Vec<_>>>()
        .map(DelayTable)
}

/// Get the config file path from environment or use default.
///
/// Checks `AUTORECONNECT_CONFIG` environment variable, otherwise returns "autoreconnect.conf".
pub fn get_config_path() -> String {
    env::var(format!("{}_CONFIG", ENV_PREFIX))
        .unwrap_or_else(|_| "autoreconnect.conf".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_prefix() {
        assert_eq!(ENV_PREFIX, "AUTORECONNECT");
    }

    #[test]
    fn test_parse_delays() {
        assert_eq!(parse_delays("5,10, 20"), Some(DelayTable(vec![5, 10, 20])));
        assert_eq!(parse_delays("  "), Some(DelayTable(Vec::new())));
        assert_eq!(parse_delays("5,x"), None);
        assert_eq!(parse_delays("-1"), None);
    }

    #[test]
    fn test_apply_env_overrides_no_vars() {
        env::remove_var("AUTORECONNECT_ADDRESS");
        env::remove_var("AUTORECONNECT_DELAYS");

        let result = apply_env_overrides(Config::default());

        assert_eq!(result.delays, DelayTable::default());
        assert!(result.session.is_none());
    }
}

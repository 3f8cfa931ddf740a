//! Configuration type definitions.

use std::time::Duration;

use serde::Deserialize;

use crate::common::AttemptsExhausted;
use crate::reconnect::messages::MessageScript;
use crate::reconnect::ReconnectSettings;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Countdown length in seconds for each attempt, 1-indexed.
    #[serde(default)]
    pub delays: DelayTable,
    /// Messages sent after a successful automatic reconnect.
    #[serde(default)]
    pub auto_messages: AutoMessagesConfig,
    /// Remote session driven by the bundled client.
    pub session: Option<SessionConfig>,
}

impl ReconnectSettings for Config {
    fn delay_for_attempt(&self, attempt: u32) -> Result<u32, AttemptsExhausted> {
        self.delays.delay_for_attempt(attempt)
    }

    fn auto_messages(&self) -> Option<MessageScript> {
        if self.auto_messages.messages.is_empty() {
            return None;
        }
        Some(MessageScript::new(
            self.auto_messages.name.clone(),
            Duration::from_millis(self.auto_messages.delay),
            self.auto_messages.messages.iter().cloned(),
        ))
    }
}

/// Ordered per-attempt countdown lengths in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct DelayTable(pub Vec<u32>);

impl DelayTable {
    /// Delay for a 1-based attempt number.
    pub fn delay_for_attempt(&self, attempt: u32) -> Result<u32, AttemptsExhausted> {
        attempt
            .checked_sub(1)
            .and_then(|index| self.0.get(index as usize))
            .copied()
            .ok_or(AttemptsExhausted { attempt })
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for DelayTable {
    fn default() -> Self {
        Self(vec![3, 30, 60, 300])
    }
}

/// Scripted messages for one world or server.
#[derive(Debug, Clone, Deserialize)]
pub struct AutoMessagesConfig {
    /// Name of the world or server address that owns the script.
    #[serde(default)]
    pub name: String,
    /// Milliseconds to wait before each message.
    #[serde(default = "default_message_delay")]
    pub delay: u64,
    #[serde(default)]
    pub messages: Vec<String>,
}

impl Default for AutoMessagesConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            delay: default_message_delay(),
            messages: Vec::new(),
        }
    }
}

fn default_message_delay() -> u64 {
    1000
}

/// Remote server the bundled client connects to.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// `host:port` of the server.
    pub address: String,
}

impl SessionConfig {
    /// Split the address into host and port.
    pub fn host_port(&self) -> Option<(&str, u16)> {
        let (host, port) = self.address.rsplit_once(':')?;
        let port = port.parse().ok()?;
        if host.is_empty() {
            return None;
        }
        Some((host, port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_for_attempt_is_one_based() {
        let table = DelayTable(vec![5, 10, 20]);
        assert_eq!(table.delay_for_attempt(1), Ok(5));
        assert_eq!(table.delay_for_attempt(3), Ok(20));
        assert_eq!(
            table.delay_for_attempt(4),
            Err(AttemptsExhausted { attempt: 4 })
        );
        assert_eq!(
            table.delay_for_attempt(0),
            Err(AttemptsExhausted { attempt: 0 })
        );
    }

    #[test]
    fn test_empty_table_is_exhausted() {
        let table = DelayTable(Vec::new());
        assert!(table.is_empty());
        assert!(table.delay_for_attempt(1).is_err());
    }

    #[test]
    fn test_auto_messages_script() {
        let mut config = Config::default();
        assert!(config.auto_messages().is_none());

        config.auto_messages = AutoMessagesConfig {
            name: "Alice's World".to_string(),
            delay: 500,
            messages: vec!["hi".to_string(), "bye".to_string()],
        };
        let script = config.auto_messages().unwrap();
        assert_eq!(script.owner(), "Alice's World");
        assert_eq!(script.delay(), Duration::from_millis(500));
        assert_eq!(script.remaining(), 2);
    }

    #[test]
    fn test_host_port() {
        let session = SessionConfig {
            address: "play.example.net:25565".to_string(),
        };
        assert_eq!(session.host_port(), Some(("play.example.net", 25565)));

        let session = SessionConfig {
            address: "no-port".to_string(),
        };
        assert_eq!(session.host_port(), None);

        let session = SessionConfig {
            address: ":25565".to_string(),
        };
        assert_eq!(session.host_port(), None);
    }
}

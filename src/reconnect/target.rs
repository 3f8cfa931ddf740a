//! Reconnectable destinations and their attempt bookkeeping.

use std::fmt;
use std::sync::Arc;

/// Kind of destination, used for dedup and navigation decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// A saved world opened locally.
    Local,
    /// A server reached over the network.
    Remote,
}

/// Where a reconnect attempt goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Local { world: String },
    Remote { address: String },
}

impl Destination {
    pub fn kind(&self) -> TargetKind {
        match self {
            Destination::Local { .. } => TargetKind::Local,
            Destination::Remote { .. } => TargetKind::Remote,
        }
    }

    /// World name or server address.
    pub fn name(&self) -> &str {
        match self {
            Destination::Local { world } => world,
            Destination::Remote { address } => address,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Local { world } => write!(f, "world '{}'", world),
            Destination::Remote { address } => write!(f, "server {}", address),
        }
    }
}

/// Performs the concrete connection for one kind of destination.
///
/// Implementations must not block for long; a failed attempt is reported by
/// raising a new disconnect event rather than through a return value.
pub trait Connector: Send + Sync {
    fn connect(&self, destination: &Destination);
}

/// The destination currently being auto-reconnected to.
#[derive(Clone)]
pub struct RetryTarget {
    destination: Destination,
    attempts: u32,
    attempting: bool,
    connector: Arc<dyn Connector>,
}

impl RetryTarget {
    pub fn new(destination: Destination, connector: Arc<dyn Connector>) -> Self {
        Self {
            destination,
            attempts: 0,
            attempting: false,
            connector,
        }
    }

    /// Target for a locally saved world.
    pub fn local(world: impl Into<String>, connector: Arc<dyn Connector>) -> Self {
        Self::new(
            Destination::Local {
                world: world.into(),
            },
            connector,
        )
    }

    /// Target for a remote server address.
    pub fn remote(address: impl Into<String>, connector: Arc<dyn Connector>) -> Self {
        Self::new(
            Destination::Remote {
                address: address.into(),
            },
            connector,
        )
    }

    pub fn name(&self) -> &str {
        self.destination.name()
    }

    pub fn kind(&self) -> TargetKind {
        self.destination.kind()
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// True once an automatic attempt has started since the last reset.
    pub fn is_attempting(&self) -> bool {
        self.attempting
    }

    /// Consume the next attempt and return its 1-based number.
    pub fn next_attempt(&mut self) -> u32 {
        self.attempting = true;
        self.attempts = self.attempts.saturating_add(1);
        self.attempts
    }

    pub fn reset_attempts(&mut self) {
        self.attempts = 0;
        self.attempting = false;
    }

    /// Same kind and same name.
    pub fn same_destination(&self, other: &RetryTarget) -> bool {
        self.destination == other.destination
    }

    pub fn reconnect(&self) {
        self.connector.connect(&self.destination);
    }
}

impl fmt::Debug for RetryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryTarget")
            .field("destination", &self.destination)
            .field("attempts", &self.attempts)
            .field("attempting", &self.attempting)
            .finish_non_exhaustive()
    }
}

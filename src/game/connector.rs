//! Connector that hands reconnect requests to the session task.

use tokio::sync::mpsc;
use tracing::warn;

use crate::reconnect::{Connector, Destination};

/// Forwards every connect request to the session task's queue.
#[derive(Debug, Clone)]
pub struct ChannelConnector {
    tx: mpsc::UnboundedSender<Destination>,
}

impl ChannelConnector {
    pub fn new(tx: mpsc::UnboundedSender<Destination>) -> Self {
        Self { tx }
    }
}

impl Connector for ChannelConnector {
    fn connect(&self, destination: &Destination) {
        if self.tx.send(destination.clone()).is_err() {
            warn!("Session task is gone, cannot connect to {}", destination);
        }
    }
}

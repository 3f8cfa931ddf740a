//! Session channel management.
//!
//! Groups the channels between the application loop and the session task.

use tokio::sync::{mpsc, watch};

use crate::common::SessionEvent;
use crate::reconnect::Destination;

/// Channels owned by the session task.
pub struct SessionChannels {
    /// Receiver for connect requests (manual or from the reconnect controller).
    pub connect_rx: mpsc::UnboundedReceiver<Destination>,
    /// Receiver for outgoing chat lines.
    pub chat_rx: mpsc::UnboundedReceiver<String>,
    /// Sender for session lifecycle events.
    pub events_tx: mpsc::UnboundedSender<SessionEvent>,
    /// Receiver for shutdown signal.
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Channels owned by the application loop.
pub struct AppChannels {
    /// Sender for connect requests.
    pub connect_tx: mpsc::UnboundedSender<Destination>,
    /// Sender for outgoing chat lines.
    pub chat_tx: mpsc::UnboundedSender<String>,
    /// Sender for events raised outside the session task (e.g. giving up).
    pub events_tx: mpsc::UnboundedSender<SessionEvent>,
    /// Receiver for session lifecycle events.
    pub events_rx: mpsc::UnboundedReceiver<SessionEvent>,
}

/// Control channels for shutdown coordination.
pub struct ControlChannels {
    /// Sender to trigger shutdown.
    pub shutdown_tx: watch::Sender<bool>,
}

/// Bundle of all channels between the application and the session task.
pub struct ChannelBundle {
    pub session: SessionChannels,
    pub app: AppChannels,
    pub control: ControlChannels,
}

impl ChannelBundle {
    pub fn new() -> Self {
        let (connect_tx, connect_rx) = mpsc::unbounded_channel();
        let (chat_tx, chat_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            session: SessionChannels {
                connect_rx,
                chat_rx,
                events_tx: events_tx.clone(),
                shutdown_rx,
            },
            app: AppChannels {
                connect_tx,
                chat_tx,
                events_tx,
                events_rx,
            },
            control: ControlChannels { shutdown_tx },
        }
    }
}

impl Default for ChannelBundle {
    fn default() -> Self {
        Self::new()
    }
}

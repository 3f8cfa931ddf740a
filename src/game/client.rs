use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LinesCodec};
use tracing::{debug, error, info, warn};

use crate::common::error::{ConnectionError, ConnectionResult};
use crate::common::SessionEvent;
use crate::reconnect::Destination;

use super::channels::SessionChannels;

/// Longest line accepted from the server.
const MAX_LINE_LENGTH: usize = 8 * 1024;

/// Connects to line-based servers on request and relays chat.
pub struct GameClient {
    pub channels: SessionChannels,
}

impl GameClient {
    pub fn new(channels: SessionChannels) -> Self {
        Self { channels }
    }

    /// Serve connect requests until shutdown or until every sender is gone.
    ///
    /// Each request produces `Connecting`, then either `Established`
    /// followed by `Disconnected` when the connection ends, or
    /// `Disconnected` alone if it could not be opened.
    pub async fn run(&mut self) {
        loop {
            let destination = tokio::select! {
                request = self.channels.connect_rx.recv() => match request {
                    Some(destination) => destination,
                    None => return,
                },
                changed = self.channels.shutdown_rx.changed() => {
                    if changed.is_err() || *self.channels.shutdown_rx.borrow() {
                        return;
                    }
                    continue;
                }
            };

            let address = match destination {
                Destination::Remote { address } => address,
                Destination::Local { world } => {
                    warn!("Cannot open local world '{}' from the line client", world);
                    continue;
                }
            };

            self.emit(SessionEvent::Connecting {
                address: address.clone(),
            });

            let reason = match connect(&address).await {
                Ok(stream) => {
                    info!("Connected to {}", address);
                    self.emit(SessionEvent::Established {
                        address: address.clone(),
                    });
                    match self.handle_connection(stream).await {
                        Ok(()) => None,
                        Err(e) => {
                            error!("Session error: {}", e);
                            Some(e.to_string())
                        }
                    }
                }
                Err(e) => {
                    error!("{}", e);
                    Some(e.to_string())
                }
            };

            self.emit(SessionEvent::Disconnected { address, reason });

            if *self.channels.shutdown_rx.borrow() {
                return;
            }
        }
    }

    /// Relay lines until the peer closes the stream or shutdown is signalled.
    pub async fn handle_connection<S>(&mut self, stream: S) -> ConnectionResult<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));
        let shutdown_rx = &mut self.channels.shutdown_rx;
        let chat_rx = &mut self.channels.chat_rx;

        loop {
            tokio::select! {
                line = framed.next() => match line {
                    Some(Ok(line)) => info!("<< {}", line),
                    Some(Err(e)) => return Err(e.into()),
                    None => {
                        info!("Connection closed by server");
                        return Ok(());
                    }
                },

                Some(message) = chat_rx.recv() => {
                    debug!(len = message.len(), "Sending chat line");
                    framed.send(message).await?;
                }

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("Closing session");
                        return Ok(());
                    }
                }
            }
        }
    }

    fn emit(&self, event: SessionEvent) {
        if let Err(e) = self.channels.events_tx.send(event) {
            debug!("Event channel closed (shutdown in progress): {}", e);
        }
    }
}

async fn connect(address: &str) -> ConnectionResult<TcpStream> {
    info!("Connecting to {}", address);
    TcpStream::connect(address)
        .await
        .map_err(|source| ConnectionError::ConnectFailed {
            address: address.to_string(),
            source,
        })
}

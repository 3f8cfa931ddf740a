//! Autoreconnect - automatic reconnection for line-based game servers
//!
//! Connects to the configured server, relays stdin lines as chat, and when
//! the connection drops counts down and reconnects using the configured
//! delay table.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use autoreconnect::common::error::Result as AppResult;
use autoreconnect::common::SessionEvent;
use autoreconnect::config::{env::get_config_path, load_and_validate};
use autoreconnect::game::{ChannelBundle, ChannelConnector, GameClient};
use autoreconnect::reconnect::{
    Connector, ControllerState, Destination, ReconnectController, RetryTarget, Scheduler, Tick,
    TickCallback, View,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Autoreconnect v{} starting...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_path = get_config_path();
    info!("Loading configuration from {}...", config_path);

    let config = load_and_validate(&config_path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        error!("Please ensure {} exists and is properly formatted.", config_path);
        e
    })?;
    let address = config
        .session
        .as_ref()
        .map(|session| session.address.clone())
        .context("session.address is not configured")?;

    info!("Configuration loaded successfully");
    info!("  Server: {}", address);
    info!("  Delays: {:?}", config.delays.0);
    if config.delays.is_empty() {
        warn!("No reconnect delays configured, automatic reconnect is disabled");
    }
    if !config.auto_messages.messages.is_empty() {
        info!(
            "  Auto messages: {} for {}",
            config.auto_messages.messages.len(),
            config.auto_messages.name
        );
    }

    // ============================================================
    // Wire the controller to the session task
    // ============================================================
    let channels = ChannelBundle::new();
    let scheduler = Scheduler::new();
    let controller = ReconnectController::new(
        Arc::new(config),
        scheduler.clone(),
        Arc::new(tokio::runtime::Handle::current()),
        Arc::new(channels.app.chat_tx.clone()),
    );
    let connector: Arc<dyn Connector> =
        Arc::new(ChannelConnector::new(channels.app.connect_tx.clone()));

    let shutdown_tx = channels.control.shutdown_tx;
    let mut session_task = {
        let mut client = GameClient::new(channels.session);
        tokio::spawn(async move { client.run().await })
    };

    // The first connection is manual, so it never triggers auto messages.
    connector.connect(&Destination::Remote {
        address: address.clone(),
    });

    let mut app = App {
        controller,
        connector,
        view: Some(View::Connecting),
        on_tick: countdown_reporter(channels.app.events_tx.clone()),
    };
    let chat_tx = channels.app.chat_tx;
    let mut events_rx = channels.app.events_rx;
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    info!("Type /cancel, /reconnect or /quit; anything else is sent as chat");

    // ============================================================
    // Event loop
    // ============================================================
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    let mut session_finished = false;

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
            Some(event) = events_rx.recv() => {
                if !app.handle_event(event)? {
                    break;
                }
            }
            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    if !app.handle_input(&line, &chat_tx) {
                        break;
                    }
                }
                Ok(None) => {
                    debug!("stdin closed");
                    stdin_open = false;
                }
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    stdin_open = false;
                }
            },
            _ = &mut session_task => {
                warn!("Session task ended");
                session_finished = true;
                break;
            }
        }
    }

    // Handle graceful shutdown
    scheduler.shutdown();
    if !session_finished {
        if let Err(e) = shutdown_tx.send(true) {
            debug!("Shutdown channel closed (session already exited): {}", e);
        }
        match tokio::time::timeout(tokio::time::Duration::from_secs(5), session_task).await {
            Ok(Ok(())) => info!("Session closed"),
            Ok(Err(e)) => warn!("Session task panicked: {}", e),
            Err(_) => warn!("Session close timed out"),
        }
    }

    info!("Exiting...");
    Ok(())
}

/// The surrounding application: turns session events and user input into
/// controller calls.
struct App {
    controller: ReconnectController,
    connector: Arc<dyn Connector>,
    view: Option<View>,
    on_tick: TickCallback,
}

impl App {
    fn navigate(&mut self, to: View) {
        let to = Some(to);
        self.controller
            .on_navigation_changed(self.view.as_ref(), to.as_ref());
        self.view = to;
    }

    /// Returns `false` when the application should exit.
    fn handle_event(&mut self, event: SessionEvent) -> AppResult<bool> {
        match event {
            SessionEvent::Connecting { address } => {
                debug!("Connecting to {}", address);
                self.navigate(View::Connecting);
            }
            SessionEvent::Established { address } => {
                info!("Session established with {}", address);
                self.navigate(View::InGame);
                self.controller.on_session_established();
            }
            SessionEvent::Disconnected { address, reason } => {
                warn!(
                    "Disconnected from {}: {}",
                    address,
                    reason.as_deref().unwrap_or("connection closed")
                );
                self.navigate(View::Disconnected);
                self.controller
                    .set_target(RetryTarget::remote(address, self.connector.clone()))?;
                if self.controller.state() == ControllerState::CountingDown {
                    debug!("Countdown already running, ignoring repeated disconnect");
                } else {
                    self.controller.start_countdown(self.on_tick.clone())?;
                }
            }
            SessionEvent::GaveUp => {
                error!("No more reconnect attempts configured, giving up");
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Returns `false` when the user asked to quit.
    fn handle_input(&mut self, line: &str, chat_tx: &mpsc::UnboundedSender<String>) -> bool {
        match line.trim() {
            "" => {}
            "/cancel" => {
                self.controller.cancel();
                info!("Type /reconnect to try again");
            }
            "/reconnect" => match self.controller.state() {
                ControllerState::Active | ControllerState::CountingDown => {
                    self.controller.reconnect()
                }
                ControllerState::Attempting => info!("A reconnect is already in progress"),
                ControllerState::Idle => info!("Nothing to reconnect to"),
            },
            "/quit" => {
                self.navigate(View::Title);
                return false;
            }
            _ => {
                if chat_tx.send(line.to_string()).is_err() {
                    warn!("Session task is gone, dropping chat line");
                }
            }
        }
        true
    }
}

/// Log countdown progress and turn exhaustion into a `GaveUp` event.
fn countdown_reporter(events_tx: mpsc::UnboundedSender<SessionEvent>) -> TickCallback {
    Arc::new(move |tick| match tick {
        Tick::Remaining(seconds) => {
            info!("Reconnecting in {}s (type /cancel to stop)", seconds)
        }
        Tick::Exhausted => {
            if events_tx.send(SessionEvent::GaveUp).is_err() {
                debug!("Event channel closed before give-up could be reported");
            }
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

//! Scripted messages sent after a successful automatic reconnect.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::scheduler::Scheduler;

/// Destination for outgoing chat lines.
pub trait ChatSink: Send + Sync {
    fn send_chat(&self, message: &str);
}

impl ChatSink for mpsc::UnboundedSender<String> {
    fn send_chat(&self, message: &str) {
        if let Err(e) = self.send(message.to_string()) {
            warn!("Failed to queue auto message: {}", e);
        }
    }
}

/// Ordered messages owned by one world or server, consumed one at a time.
#[derive(Debug, Clone)]
pub struct MessageScript {
    owner: String,
    delay: Duration,
    messages: VecDeque<String>,
}

impl MessageScript {
    pub fn new(
        owner: impl Into<String>,
        delay: Duration,
        messages: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            delay,
            messages: messages.into_iter().collect(),
        }
    }

    /// Target name the script belongs to.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Wait before each message.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn remaining(&self) -> usize {
        self.messages.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn next_message(&mut self) -> Option<String> {
        self.messages.pop_front()
    }
}

/// Send every message in `script`, waiting `script.delay()` before each one.
///
/// The chain runs to completion on `scheduler` and cannot be cancelled.
pub fn send_messages(scheduler: &Scheduler, chat: Arc<dyn ChatSink>, mut script: MessageScript) {
    if script.is_exhausted() {
        debug!(owner = script.owner(), "Auto messages finished");
        return;
    }
    let next = scheduler.clone();
    scheduler.schedule(script.delay(), move || {
        if let Some(message) = script.next_message() {
            debug!(owner = script.owner(), "Sending auto message");
            chat.send_chat(&message);
        }
        send_messages(&next, chat, script);
    });
}

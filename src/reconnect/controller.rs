//! The reconnect state machine.
//!
//! A [`ReconnectController`] owns at most one [`RetryTarget`] and at most one
//! live countdown. External events (disconnect, navigation, session
//! established, user cancel) may arrive from any thread; countdown ticks run
//! on the [`Scheduler`] worker. All mutation goes through one mutex, and each
//! tick carries the id of the countdown that scheduled it so a tick that
//! raced with a cancel finds its slot gone and stops.
//!
//! ```text
//!  Idle --set_target--> Active --start_countdown--> CountingDown
//!   ^                    ^  ^                            |
//!   |                    |  +--------cancel--------------+
//!   |                    |                               | reaches 0
//!   |                    +--set_target (same target)-- Attempting
//!   +--on_session_established / leaving navigation-- (any)
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, error, info};

use super::messages::{self, ChatSink};
use super::navigation::{self, View};
use super::scheduler::{Dispatch, Scheduler, TaskHandle};
use super::target::{RetryTarget, TargetKind};
use super::ReconnectSettings;
use crate::common::ReconnectError;

/// Countdown resolution.
const TICK: Duration = Duration::from_secs(1);

/// Countdown progress reported to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Seconds left before the next reconnect attempt. Never zero.
    Remaining(u32),
    /// The delay table has no entry for this attempt; automatic reconnect
    /// has stopped for good.
    Exhausted,
}

impl Tick {
    /// Seconds remaining, or `-1` once attempts are exhausted.
    pub fn value(self) -> i64 {
        match self {
            Tick::Remaining(seconds) => i64::from(seconds),
            Tick::Exhausted => -1,
        }
    }
}

/// Receives countdown ticks.
pub type TickCallback = Arc<dyn Fn(Tick) + Send + Sync>;

/// Observable controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// No retry target.
    Idle,
    /// A target is set and nothing is scheduled.
    Active,
    /// A countdown is live.
    CountingDown,
    /// The reconnect action has been dispatched.
    Attempting,
}

struct Countdown {
    id: u64,
    /// Next scheduled tick; `None` only between creation and the first tick.
    handle: Option<TaskHandle>,
}

impl Countdown {
    fn cancel(self) {
        if let Some(handle) = self.handle {
            handle.cancel();
        }
    }
}

#[derive(Default)]
struct Slots {
    target: Option<RetryTarget>,
    countdown: Option<Countdown>,
    reconnecting: bool,
}

struct Inner {
    settings: Arc<dyn ReconnectSettings>,
    scheduler: Scheduler,
    dispatcher: Arc<dyn Dispatch>,
    chat: Arc<dyn ChatSink>,
    slots: Mutex<Slots>,
    next_countdown: AtomicU64,
}

/// Drives automatic reconnection for a single target.
///
/// Cloning is cheap and every clone controls the same state.
#[derive(Clone)]
pub struct ReconnectController {
    inner: Arc<Inner>,
}

impl ReconnectController {
    /// Create a controller.
    ///
    /// `dispatcher` is the execution context the reconnect action runs on;
    /// `chat` receives auto messages after a successful automatic reconnect.
    pub fn new(
        settings: Arc<dyn ReconnectSettings>,
        scheduler: Scheduler,
        dispatcher: Arc<dyn Dispatch>,
        chat: Arc<dyn ChatSink>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                settings,
                scheduler,
                dispatcher,
                chat,
                slots: Mutex::new(Slots::default()),
                next_countdown: AtomicU64::new(0),
            }),
        }
    }

    fn slots(&self) -> MutexGuard<'_, Slots> {
        self.inner
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state, derived from the target and countdown slots.
    pub fn state(&self) -> ControllerState {
        let slots = self.slots();
        if slots.target.is_none() {
            ControllerState::Idle
        } else if slots.countdown.is_some() {
            ControllerState::CountingDown
        } else if slots.reconnecting {
            ControllerState::Attempting
        } else {
            ControllerState::Active
        }
    }

    /// Name of the active target, if any.
    pub fn target_name(&self) -> Option<String> {
        self.slots().target.as_ref().map(|t| t.name().to_string())
    }

    /// Attempts consumed by the active target since its last reset.
    pub fn attempts(&self) -> Option<u32> {
        self.slots().target.as_ref().map(RetryTarget::attempts)
    }

    /// Whether the active target is inside an automatic reconnect cycle.
    pub fn is_attempting(&self) -> bool {
        self.slots()
            .target
            .as_ref()
            .is_some_and(RetryTarget::is_attempting)
    }

    /// Whether the active target is a locally saved world.
    pub fn is_local_target(&self) -> bool {
        self.slots()
            .target
            .as_ref()
            .is_some_and(|t| t.kind() == TargetKind::Local)
    }

    /// Register the target of a detected disconnect.
    ///
    /// Repeated disconnects for the active target keep its attempt counter.
    /// A different target while one is active is a contract violation.
    pub fn set_target(&self, candidate: RetryTarget) -> Result<(), ReconnectError> {
        let mut slots = self.slots();
        match slots.target.as_ref() {
            None => {
                info!(
                    "Tracking {} for automatic reconnect",
                    candidate.destination()
                );
                slots.target = Some(candidate);
            }
            Some(current) if current.same_destination(&candidate) => {
                debug!(
                    target_name = current.name(),
                    attempts = current.attempts(),
                    "Disconnect for active target, keeping attempt counter"
                );
            }
            Some(current) => {
                let message = format!(
                    "disconnect from {} while {} is the active target",
                    candidate.destination(),
                    current.destination()
                );
                drop(slots);
                return Err(contract_violation(message));
            }
        }
        slots.reconnecting = false;
        Ok(())
    }

    /// Start the countdown for the next attempt.
    ///
    /// `on_tick` receives `n, n-1, ..., 1` one second apart, then the
    /// reconnect action is dispatched. When the delay table is exhausted
    /// `on_tick` receives [`Tick::Exhausted`] immediately and nothing is
    /// scheduled.
    pub fn start_countdown(&self, on_tick: TickCallback) -> Result<(), ReconnectError> {
        let mut slots = self.slots();
        if slots.countdown.is_some() {
            drop(slots);
            return Err(contract_violation(
                "countdown started while another is running".to_string(),
            ));
        }

        let (name, attempt) = match slots.target.as_mut() {
            Some(target) => {
                let attempt = target.next_attempt();
                (target.name().to_string(), attempt)
            }
            None => {
                drop(slots);
                return Err(contract_violation(
                    "countdown started without an active target".to_string(),
                ));
            }
        };

        let seconds = match self.inner.settings.delay_for_attempt(attempt) {
            Ok(seconds) => seconds,
            Err(exhausted) => {
                drop(slots);
                info!(target_name = %name, "{}, giving up", exhausted);
                on_tick(Tick::Exhausted);
                return Ok(());
            }
        };

        info!(
            target_name = %name,
            attempt, seconds, "Starting reconnect countdown"
        );
        let id = self.inner.next_countdown.fetch_add(1, Ordering::Relaxed);
        slots.countdown = Some(Countdown { id, handle: None });
        slots.reconnecting = false;
        drop(slots);

        self.countdown(id, seconds, on_tick);
        Ok(())
    }

    /// Deliver one tick and schedule the next.
    ///
    /// The liveness check and the reschedule share one critical section, so
    /// nothing is scheduled for a countdown once `cancel` has returned. The
    /// tick itself is delivered outside the lock and may still reach
    /// `on_tick` if a cancel lands while it is being delivered.
    fn countdown(&self, id: u64, seconds: u32, on_tick: TickCallback) {
        if seconds == 0 {
            self.finish_countdown(id);
            return;
        }

        {
            let mut slots = self.slots();
            let Some(countdown) = slots.countdown.as_mut().filter(|c| c.id == id) else {
                debug!(countdown = id, "Countdown no longer live, dropping tick");
                return;
            };
            let controller = self.clone();
            let next = on_tick.clone();
            countdown.handle = Some(self.inner.scheduler.schedule(TICK, move || {
                controller.countdown(id, seconds - 1, next)
            }));
        }

        on_tick(Tick::Remaining(seconds));
    }

    fn finish_countdown(&self, id: u64) {
        let target = {
            let mut slots = self.slots();
            if !slots.countdown.as_ref().is_some_and(|c| c.id == id) {
                return;
            }
            slots.countdown = None;
            slots.reconnecting = true;
            slots.target.clone()
        };
        if let Some(target) = target {
            self.dispatch_reconnect(target);
        }
    }

    fn dispatch_reconnect(&self, target: RetryTarget) {
        info!(
            "Reconnecting to {} (attempt {})",
            target.destination(),
            target.attempts()
        );
        self.inner
            .dispatcher
            .dispatch(Box::new(move || target.reconnect()));
    }

    /// Stop a pending automatic reconnect and reset the attempt counter.
    ///
    /// The target is kept. Safe to call repeatedly or after the countdown
    /// has already fired.
    pub fn cancel(&self) {
        let mut slots = self.slots();
        let countdown = slots.countdown.take();
        slots.reconnecting = false;
        match slots.target.as_mut() {
            Some(target) => {
                target.reset_attempts();
                info!(target_name = target.name(), "Automatic reconnect cancelled");
            }
            None => debug!("Cancel requested without an active target"),
        }
        if let Some(countdown) = countdown {
            countdown.cancel();
        }
    }

    /// Reconnect to the active target right away.
    ///
    /// A live countdown is cancelled so the action runs once. Without a
    /// target this does nothing.
    pub fn reconnect(&self) {
        let target = {
            let mut slots = self.slots();
            if slots.target.is_some() {
                if let Some(countdown) = slots.countdown.take() {
                    countdown.cancel();
                }
                slots.reconnecting = true;
            }
            slots.target.clone()
        };
        match target {
            Some(target) => self.dispatch_reconnect(target),
            None => debug!("Reconnect requested without an active target"),
        }
    }

    /// React to a view change reported by the navigation layer.
    ///
    /// Entering a main menu from elsewhere, or handing off to
    /// re-authentication after a disconnect, drops the target.
    pub fn on_navigation_changed(&self, from: Option<&View>, to: Option<&View>) {
        if !navigation::leaves_session(from, to) {
            return;
        }

        let mut slots = self.slots();
        let target = slots.target.take();
        let countdown = slots.countdown.take();
        slots.reconnecting = false;
        if let Some(countdown) = countdown {
            countdown.cancel();
        }
        if let Some(target) = target {
            info!(
                "Navigation {:?} -> {:?}, no longer reconnecting to {}",
                from,
                to,
                target.destination()
            );
        }
    }

    /// A session was established, by automatic reconnect or manually.
    ///
    /// Only the tail of an automatic reconnect resets attempts and starts
    /// the auto-message script owned by the target.
    pub fn on_session_established(&self) {
        let script = {
            let mut slots = self.slots();
            if let Some(countdown) = slots.countdown.take() {
                countdown.cancel();
            }
            slots.reconnecting = false;
            let Some(mut target) = slots.target.take() else {
                debug!("Session established without a retry target");
                return;
            };
            if !target.is_attempting() {
                debug!(target_name = target.name(), "Manual connect, no auto messages");
                return;
            }

            info!(
                target_name = target.name(),
                attempts = target.attempts(),
                "Reconnected"
            );
            target.reset_attempts();
            self.inner
                .settings
                .auto_messages()
                .filter(|script| script.owner() == target.name())
        };

        if let Some(script) = script {
            info!(
                owner = script.owner(),
                count = script.remaining(),
                "Sending auto messages"
            );
            messages::send_messages(&self.inner.scheduler, self.inner.chat.clone(), script);
        }
    }
}

impl fmt::Debug for ReconnectController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconnectController")
            .field("state", &self.state())
            .field("target", &self.target_name())
            .finish_non_exhaustive()
    }
}

/// Log a misuse of the controller; panics in debug builds.
fn contract_violation(message: String) -> ReconnectError {
    error!("Reconnect contract violation: {}", message);
    if cfg!(debug_assertions) {
        panic!("contract violation: {}", message);
    }
    ReconnectError::ContractViolation { message }
}

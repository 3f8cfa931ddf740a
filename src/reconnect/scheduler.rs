//! Single-worker delayed execution.
//!
//! Every scheduled action runs on one worker task, one at a time, so a
//! countdown tick and a message-send tick can never interleave. Actions are
//! plain closures; anything long-running should be handed off to another
//! execution context from inside the action.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::time::{delay_queue, DelayQueue};
use tracing::{debug, error, warn};

/// A unit of work run by the scheduler or a [`Dispatch`] implementation.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Execution context that runs reconnect actions.
pub trait Dispatch: Send + Sync {
    fn dispatch(&self, job: Job);
}

/// Runs jobs immediately on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct Inline;

impl Dispatch for Inline {
    fn dispatch(&self, job: Job) {
        job();
    }
}

/// Runs jobs on the runtime's blocking pool.
impl Dispatch for tokio::runtime::Handle {
    fn dispatch(&self, job: Job) {
        let _ = self.spawn_blocking(job);
    }
}

const PENDING: u8 = 0;
const RUNNING: u8 = 1;
const DONE: u8 = 2;
const CANCELLED: u8 = 3;

enum Command {
    Schedule {
        id: u64,
        delay: Duration,
        job: Job,
        state: Arc<AtomicU8>,
    },
    Cancel(u64),
    Shutdown,
}

struct Entry {
    id: u64,
    job: Job,
    state: Arc<AtomicU8>,
}

impl Entry {
    fn run(self) {
        if self
            .state
            .compare_exchange(PENDING, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        if panic::catch_unwind(AssertUnwindSafe(self.job)).is_err() {
            error!(task = self.id, "Scheduled task panicked");
        }
        self.state.store(DONE, Ordering::Release);
    }
}

/// Handle to a scheduled action.
///
/// Dropping the handle does not cancel the action.
#[derive(Debug)]
pub struct TaskHandle {
    id: u64,
    state: Arc<AtomicU8>,
    tx: mpsc::UnboundedSender<Command>,
}

impl TaskHandle {
    /// Cancel the action if it has not started yet.
    ///
    /// Returns `true` if this call prevented the action from running. Calling
    /// it on a running, finished or already cancelled action is a no-op.
    pub fn cancel(&self) -> bool {
        let cancelled = self
            .state
            .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if cancelled {
            // Lets the worker drop the queued closure early; the state flag
            // already guarantees it will not run.
            let _ = self.tx.send(Command::Cancel(self.id));
        }
        cancelled
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::Acquire) == CANCELLED
    }

    pub fn is_finished(&self) -> bool {
        self.state.load(Ordering::Acquire) == DONE
    }
}

/// Delayed-execution facility backed by one worker task.
///
/// Cloning is cheap; all clones feed the same worker.
#[derive(Debug, Clone)]
pub struct Scheduler {
    tx: mpsc::UnboundedSender<Command>,
    next_id: Arc<AtomicU64>,
}

impl Scheduler {
    /// Spawn the worker on the current tokio runtime.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(rx));
        Self {
            tx,
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Run `action` once after `delay`.
    pub fn schedule<F>(&self, delay: Duration, action: F) -> TaskHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let state = Arc::new(AtomicU8::new(PENDING));
        let command = Command::Schedule {
            id,
            delay,
            job: Box::new(action),
            state: state.clone(),
        };
        if self.tx.send(command).is_err() {
            warn!(task = id, "Scheduler worker has stopped, dropping task");
            state.store(CANCELLED, Ordering::Release);
        }
        TaskHandle {
            id,
            state,
            tx: self.tx.clone(),
        }
    }

    /// Stop the worker. Pending actions are dropped without running.
    pub fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown);
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_worker(mut rx: mpsc::UnboundedReceiver<Command>) {
    let mut queue: DelayQueue<Entry> = DelayQueue::new();
    let mut keys: HashMap<u64, delay_queue::Key> = HashMap::new();
    let mut closed = false;

    loop {
        tokio::select! {
            command = rx.recv(), if !closed => match command {
                Some(Command::Schedule { id, delay, job, state }) => {
                    let key = queue.insert(Entry { id, job, state }, delay);
                    keys.insert(id, key);
                }
                Some(Command::Cancel(id)) => {
                    if let Some(key) = keys.remove(&id) {
                        queue.remove(&key);
                    }
                }
                Some(Command::Shutdown) => {
                    debug!(pending = keys.len(), "Scheduler shutting down");
                    break;
                }
                None => closed = true,
            },

            Some(expired) = queue.next(), if !queue.is_empty() => {
                let entry = expired.into_inner();
                keys.remove(&entry.id);
                entry.run();
            }

            else => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::time::{sleep, Instant};

    fn recorder() -> Arc<Mutex<Vec<(&'static str, Instant)>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_once_after_delay() {
        let scheduler = Scheduler::new();
        let runs = recorder();
        let start = Instant::now();

        let log = runs.clone();
        let handle = scheduler.schedule(Duration::from_secs(2), move || {
            log.lock().unwrap().push(("job", Instant::now()));
        });

        sleep(Duration::from_millis(1500)).await;
        assert!(runs.lock().unwrap().is_empty());

        sleep(Duration::from_secs(5)).await;
        let runs = runs.lock().unwrap();
        assert_eq!(runs.len(), 1);
        let elapsed = runs[0].1 - start;
        assert!(elapsed >= Duration::from_secs(2) && elapsed < Duration::from_millis(2010));
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_fire() {
        let scheduler = Scheduler::new();
        let runs = recorder();

        let log = runs.clone();
        let handle = scheduler.schedule(Duration::from_secs(1), move || {
            log.lock().unwrap().push(("job", Instant::now()));
        });

        assert!(handle.cancel());
        assert!(handle.is_cancelled());
        assert!(!handle.cancel());

        sleep(Duration::from_secs(3)).await;
        assert!(runs.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_fire_is_noop() {
        let scheduler = Scheduler::new();
        let runs = recorder();

        let log = runs.clone();
        let handle = scheduler.schedule(Duration::from_millis(100), move || {
            log.lock().unwrap().push(("job", Instant::now()));
        });

        sleep(Duration::from_secs(1)).await;
        assert!(!handle.cancel());
        assert!(handle.is_finished());
        assert_eq!(runs.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_delay_runs_in_order() {
        let scheduler = Scheduler::new();
        let runs = recorder();

        for name in ["first", "second", "third"] {
            let log = runs.clone();
            scheduler.schedule(Duration::from_secs(1), move || {
                log.lock().unwrap().push((name, Instant::now()));
            });
        }

        sleep(Duration::from_secs(2)).await;
        let names: Vec<_> = runs.lock().unwrap().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_can_reschedule_itself() {
        let scheduler = Scheduler::new();
        let runs = recorder();

        let log = runs.clone();
        let next = scheduler.clone();
        scheduler.schedule(Duration::from_secs(1), move || {
            log.lock().unwrap().push(("outer", Instant::now()));
            next.schedule(Duration::from_secs(1), move || {
                log.lock().unwrap().push(("inner", Instant::now()));
            });
        });

        sleep(Duration::from_secs(3)).await;
        let runs = runs.lock().unwrap();
        assert_eq!(runs.len(), 2);
        let gap = runs[1].1 - runs[0].1;
        assert!(gap >= Duration::from_secs(1) && gap < Duration::from_millis(1010));
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_task_does_not_stop_worker() {
        let scheduler = Scheduler::new();
        let runs = recorder();

        scheduler.schedule(Duration::from_millis(10), || panic!("boom"));
        let log = runs.clone();
        scheduler.schedule(Duration::from_millis(20), move || {
            log.lock().unwrap().push(("after", Instant::now()));
        });

        sleep(Duration::from_secs(1)).await;
        assert_eq!(runs.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_drops_pending_tasks() {
        let scheduler = Scheduler::new();
        let runs = recorder();

        let log = runs.clone();
        let handle = scheduler.schedule(Duration::from_secs(1), move || {
            log.lock().unwrap().push(("job", Instant::now()));
        });
        scheduler.shutdown();

        sleep(Duration::from_secs(2)).await;
        assert!(runs.lock().unwrap().is_empty());
        assert!(!handle.is_finished());

        let late = scheduler.schedule(Duration::from_millis(1), || {});
        assert!(late.is_cancelled());
    }
}

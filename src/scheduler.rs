//! Single-thread timer used for session deactivation checks and block TTLs.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, error, warn};

use crate::constants::SHUTDOWN_WAIT;
use crate::error::{DockError, DockResult, panic_message};

pub type TimerId = u64;

type Task = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct Timers {
    queue: BinaryHeap<Reverse<(Instant, TimerId)>>,
    tasks: HashMap<TimerId, Task>,
    next_id: TimerId,
    shutdown: bool,
}

#[derive(Default)]
struct Shared {
    timers: Mutex<Timers>,
    wake: Condvar,
}

/// Signals the owner once the timer thread has left its loop, however it
/// left it.
struct DoneGuard(Sender<()>);

impl Drop for DoneGuard {
    fn drop(&mut self) {
        let _ = self.0.send(());
    }
}

pub struct Scheduler {
    name: String,
    shared: Arc<Shared>,
    thread_id: ThreadId,
    thread: Mutex<Option<JoinHandle<()>>>,
    done: Mutex<Option<Receiver<()>>>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("name", &self.name)
            .field("pending", &self.pending())
            .finish()
    }
}

impl Scheduler {
    pub fn new(name: impl Into<String>) -> DockResult<Self> {
        let name = name.into();
        let shared = Arc::new(Shared::default());
        let (done_tx, done_rx) = mpsc::channel();
        let thread = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name(name.clone())
                .spawn(move || {
                    let _done = DoneGuard(done_tx);
                    run_timers(&shared);
                })
                .map_err(|source| DockError::Spawn {
                    name: name.clone(),
                    source,
                })?
        };
        Ok(Self {
            name,
            shared,
            thread_id: thread.thread().id(),
            thread: Mutex::new(Some(thread)),
            done: Mutex::new(Some(done_rx)),
        })
    }

    pub fn schedule(&self, delay: Duration, task: impl FnOnce() + Send + 'static) -> TimerHandle {
        let mut timers = self.shared.timers.lock();
        let id = timers.next_id;
        timers.next_id += 1;
        if timers.shutdown {
            debug!(scheduler = %self.name, "schedule after shutdown ignored");
        } else {
            timers.queue.push(Reverse((Instant::now() + delay, id)));
            timers.tasks.insert(id, Box::new(task));
            self.shared.wake.notify_one();
        }
        TimerHandle {
            id,
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Number of timers still waiting to fire.
    pub fn pending(&self) -> usize {
        self.shared.timers.lock().tasks.len()
    }

    pub fn is_shutdown(&self) -> bool {
        self.shared.timers.lock().shutdown
    }

    /// Drops every pending timer and stops the thread, waiting at most
    /// `timeout` for it to exit. Returns whether the thread is known to have
    /// stopped. Called from a timer task it returns immediately; the loop
    /// exits once that task returns.
    pub fn shutdown_and_wait(&self, timeout: Duration) -> bool {
        let dropped = {
            let mut timers = self.shared.timers.lock();
            timers.shutdown = true;
            timers.queue.clear();
            std::mem::take(&mut timers.tasks)
        };
        self.shared.wake.notify_all();
        // Pending tasks may own handles back into whoever owns us.
        drop(dropped);

        if thread::current().id() == self.thread_id {
            return true;
        }
        let Some(done) = self.done.lock().take() else {
            return true;
        };
        match done.recv_timeout(timeout) {
            Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => {
                if let Some(handle) = self.thread.lock().take() {
                    let _ = handle.join();
                }
                true
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                warn!(scheduler = %self.name, ?timeout, "timer thread did not stop in time");
                false
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown_and_wait(SHUTDOWN_WAIT);
    }
}

fn run_timers(shared: &Shared) {
    let mut timers = shared.timers.lock();
    loop {
        if timers.shutdown {
            break;
        }
        let Some(&Reverse((at, id))) = timers.queue.peek() else {
            shared.wake.wait(&mut timers);
            continue;
        };
        if at > Instant::now() {
            shared.wake.wait_until(&mut timers, at);
            continue;
        }
        timers.queue.pop();
        if let Some(task) = timers.tasks.remove(&id) {
            MutexGuard::unlocked(&mut timers, || {
                if let Err(payload) = catch_unwind(AssertUnwindSafe(task)) {
                    error!("timer task panicked: {}", panic_message(payload.as_ref()));
                }
            });
        }
    }
}

/// Handle to one scheduled task.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    id: TimerId,
    shared: Weak<Shared>,
}

impl TimerHandle {
    pub fn id(&self) -> TimerId {
        self.id
    }

    /// Removes the task if it has not started yet. Idempotent; returns whether
    /// this call removed it.
    pub fn cancel(&self) -> bool {
        match self.shared.upgrade() {
            Some(shared) => shared.timers.lock().tasks.remove(&self.id).is_some(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn runs_tasks_in_deadline_order() {
        let scheduler = Scheduler::new("test-timer").unwrap();
        let (tx, rx) = mpsc::channel();
        let late = tx.clone();
        scheduler.schedule(Duration::from_millis(60), move || late.send("late").unwrap());
        scheduler.schedule(Duration::from_millis(10), move || tx.send("early").unwrap());
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), "early");
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), "late");
    }

    #[test]
    fn cancel_is_idempotent() {
        let scheduler = Scheduler::new("test-timer").unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let handle = scheduler.schedule(Duration::from_millis(30), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(handle.cancel());
        assert!(!handle.cancel());
        thread::sleep(Duration::from_millis(80));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn panicking_task_does_not_kill_thread() {
        let scheduler = Scheduler::new("test-timer").unwrap();
        scheduler.schedule(Duration::ZERO, || panic!("boom"));
        let (tx, rx) = mpsc::channel();
        scheduler.schedule(Duration::from_millis(10), move || tx.send(()).unwrap());
        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
    }

    #[test]
    fn shutdown_drops_pending_and_rejects_new() {
        let scheduler = Scheduler::new("test-timer").unwrap();
        scheduler.schedule(Duration::from_secs(30), || {});
        assert_eq!(scheduler.pending(), 1);
        assert!(scheduler.shutdown_and_wait(Duration::from_secs(1)));
        assert!(scheduler.is_shutdown());
        assert_eq!(scheduler.pending(), 0);
        scheduler.schedule(Duration::ZERO, || {});
        assert_eq!(scheduler.pending(), 0);
        // second call is harmless
        assert!(scheduler.shutdown_and_wait(Duration::from_millis(10)));
    }
}

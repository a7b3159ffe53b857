//! Bounded command queue and the single worker that drains it onto the UI
//! thread.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, trace};

use crate::constants::GATE_POLL;
use crate::error::{DockError, DockResult};
use crate::gate::Gate;
use crate::ui_thread::UiHandle;

#[derive(Debug)]
struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
    /// Producers are admitted strictly in ticket order.
    next_ticket: u64,
    serving: u64,
}

/// FIFO with blocking, fair `put` once `capacity` items are waiting.
#[derive(Debug)]
pub struct CommandQueue<T> {
    state: Mutex<QueueState<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

impl<T> CommandQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                closed: false,
                next_ticket: 0,
                serving: 0,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Appends `item`, blocking while the queue is full.
    pub fn put(&self, item: T) -> DockResult<()> {
        let mut state = self.state.lock();
        let ticket = state.next_ticket;
        state.next_ticket += 1;
        while !state.closed && (state.serving != ticket || state.items.len() >= self.capacity) {
            self.not_full.wait(&mut state);
        }
        if state.closed {
            return Err(DockError::QueueClosed);
        }
        state.items.push_back(item);
        state.serving += 1;
        self.not_full.notify_all();
        self.not_empty.notify_one();
        Ok(())
    }

    /// Puts `item` back at the tail without waiting for room. Only the
    /// consumer calls this, and it must never block on its own queue.
    pub fn requeue(&self, item: T) -> DockResult<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(DockError::QueueClosed);
        }
        state.items.push_back(item);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Blocks for the next item; `None` once the queue is closed.
    pub fn take(&self) -> Option<T> {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return None;
            }
            if let Some(item) = state.items.pop_front() {
                self.not_full.notify_all();
                return Some(item);
            }
            self.not_empty.wait(&mut state);
        }
    }

    /// Closes the queue, dropping whatever is still waiting. Returns how many
    /// items were dropped.
    pub fn close(&self) -> usize {
        let dropped = {
            let mut state = self.state.lock();
            if state.closed {
                return 0;
            }
            state.closed = true;
            std::mem::take(&mut state.items)
        };
        self.not_empty.notify_all();
        self.not_full.notify_all();
        dropped.len()
    }
}

/// Spawns the consumer: take one item, wait for the gate, run `apply` on the
/// UI thread and wait for it to finish, repeat. A panicking `apply` is logged
/// and the loop goes on; the worker exits when the queue closes or the UI
/// loop goes away.
pub fn spawn_worker<T, U, F>(
    name: String,
    queue: Arc<CommandQueue<T>>,
    gate: Arc<Gate>,
    ui: UiHandle<U>,
    apply: F,
) -> DockResult<JoinHandle<()>>
where
    T: Send + 'static,
    U: 'static,
    F: Fn(&mut U, T) + Send + Sync + 'static,
{
    let apply = Arc::new(apply);
    let worker = name.clone();
    thread::Builder::new()
        .name(name.clone())
        .spawn(move || {
            let name = worker;
            while let Some(item) = queue.take() {
                while !gate.wait_until_allowed_for(GATE_POLL) {
                    if queue.is_closed() {
                        debug!(worker = %name, "queue closed while gated");
                        return;
                    }
                }
                trace!(worker = %name, "applying command");
                let apply = Arc::clone(&apply);
                match ui.run_and_wait(move |target| apply(target, item)) {
                    Ok(()) => {}
                    Err(DockError::TaskPanicked(message)) => {
                        error!(worker = %name, "command failed: {message}");
                    }
                    Err(DockError::UiDisconnected) => {
                        debug!(worker = %name, "ui loop gone, worker stopping");
                        return;
                    }
                    Err(err) => error!(worker = %name, %err, "command failed"),
                }
            }
            debug!(worker = %name, "worker stopped");
        })
        .map_err(|source| DockError::Spawn { name, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui_thread::ui_channel;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[test]
    fn fifo_order_and_requeue_at_tail() {
        let queue = CommandQueue::new(4);
        queue.put(1).unwrap();
        queue.put(2).unwrap();
        assert_eq!(queue.take(), Some(1));
        queue.requeue(1).unwrap();
        assert_eq!(queue.take(), Some(2));
        assert_eq!(queue.take(), Some(1));
    }

    #[test]
    fn requeue_ignores_capacity() {
        let queue = CommandQueue::new(1);
        queue.put(1).unwrap();
        queue.requeue(2).unwrap();
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn put_blocks_while_full() {
        let queue = Arc::new(CommandQueue::new(1));
        queue.put(1).unwrap();
        let done = Arc::new(AtomicBool::new(false));
        let producer = {
            let queue = Arc::clone(&queue);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                queue.put(2).unwrap();
                done.store(true, Ordering::SeqCst);
            })
        };
        thread::sleep(Duration::from_millis(50));
        assert!(!done.load(Ordering::SeqCst));
        assert_eq!(queue.take(), Some(1));
        producer.join().unwrap();
        assert_eq!(queue.take(), Some(2));
    }

    #[test]
    fn close_wakes_everyone() {
        let queue = Arc::new(CommandQueue::<u32>::new(1));
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.take())
        };
        thread::sleep(Duration::from_millis(20));
        assert_eq!(queue.close(), 0);
        assert_eq!(consumer.join().unwrap(), None);
        assert!(matches!(queue.put(1), Err(DockError::QueueClosed)));
        assert!(matches!(queue.requeue(1), Err(DockError::QueueClosed)));
    }

    #[test]
    fn worker_applies_in_order_and_survives_panics() {
        let queue = Arc::new(CommandQueue::new(10));
        let gate = Arc::new(Gate::new());
        let (ui, mut ui_loop) = ui_channel::<Vec<u32>>();
        let worker = spawn_worker(
            "test-queue".into(),
            Arc::clone(&queue),
            Arc::clone(&gate),
            ui,
            |applied: &mut Vec<u32>, n: u32| {
                if n == 3 {
                    panic!("command {n} failed");
                }
                applied.push(n);
            },
        )
        .unwrap();
        for n in 1..=5 {
            queue.put(n).unwrap();
        }
        let mut applied = Vec::new();
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while applied.len() < 4 && std::time::Instant::now() < deadline {
            ui_loop.pump_timeout(&mut applied, Duration::from_millis(10));
        }
        assert_eq!(applied, vec![1, 2, 4, 5]);
        queue.close();
        worker.join().unwrap();
    }

    #[test]
    fn worker_holds_while_gate_closed() {
        let queue = Arc::new(CommandQueue::new(10));
        let gate = Arc::new(Gate::new());
        let (ui, mut ui_loop) = ui_channel::<Vec<u32>>();
        gate.forbid();
        let worker = spawn_worker(
            "test-queue".into(),
            Arc::clone(&queue),
            Arc::clone(&gate),
            ui,
            |applied: &mut Vec<u32>, n: u32| applied.push(n),
        )
        .unwrap();
        queue.put(7).unwrap();
        let mut applied = Vec::new();
        ui_loop.pump_timeout(&mut applied, Duration::from_millis(120));
        assert!(applied.is_empty());

        gate.allow();
        ui_loop.pump_timeout(&mut applied, Duration::from_secs(2));
        assert_eq!(applied, vec![7]);

        gate.forbid();
        queue.put(8).unwrap();
        queue.close();
        worker.join().unwrap();
    }
}

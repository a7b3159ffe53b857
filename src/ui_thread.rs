//! Hand-off of work onto the single thread that owns the dock's UI state.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender, TryRecvError};
use std::time::Duration;

use tracing::error;

use crate::error::{DockError, DockResult, panic_message};

type UiTask<T> = Box<dyn FnOnce(&mut T) + Send>;

enum Completion {
    Done,
    Panicked(String),
}

struct Envelope<T> {
    task: UiTask<T>,
    done: Option<SyncSender<Completion>>,
}

/// Creates the two ends of a UI task channel: the cloneable handle any thread
/// may post work through, and the loop the UI thread pumps.
pub fn ui_channel<T>() -> (UiHandle<T>, UiLoop<T>) {
    let (tx, rx) = mpsc::channel();
    (UiHandle { tx }, UiLoop { rx })
}

pub struct UiHandle<T> {
    tx: Sender<Envelope<T>>,
}

impl<T> Clone for UiHandle<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> std::fmt::Debug for UiHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("UiHandle")
    }
}

impl<T: 'static> UiHandle<T> {
    /// Posts `task` and returns immediately.
    pub fn run_later(&self, task: impl FnOnce(&mut T) + Send + 'static) -> DockResult<()> {
        self.tx
            .send(Envelope {
                task: Box::new(task),
                done: None,
            })
            .map_err(|_| DockError::UiDisconnected)
    }

    /// Posts `task` and blocks until the UI thread has run it.
    ///
    /// Must not be called from the UI thread itself.
    pub fn run_and_wait(&self, task: impl FnOnce(&mut T) + Send + 'static) -> DockResult<()> {
        let (done_tx, done_rx) = mpsc::sync_channel(1);
        self.tx
            .send(Envelope {
                task: Box::new(task),
                done: Some(done_tx),
            })
            .map_err(|_| DockError::UiDisconnected)?;
        match done_rx.recv() {
            Ok(Completion::Done) => Ok(()),
            Ok(Completion::Panicked(message)) => Err(DockError::TaskPanicked(message)),
            // The loop went away with our task still queued.
            Err(_) => Err(DockError::UiDisconnected),
        }
    }
}

pub struct UiLoop<T> {
    rx: Receiver<Envelope<T>>,
}

impl<T> std::fmt::Debug for UiLoop<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("UiLoop")
    }
}

impl<T> UiLoop<T> {
    /// Runs every task already posted. Returns how many ran.
    pub fn pump(&mut self, target: &mut T) -> usize {
        let mut ran = 0;
        loop {
            match self.rx.try_recv() {
                Ok(envelope) => {
                    run(envelope, target);
                    ran += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return ran,
            }
        }
    }

    /// Waits up to `timeout` for the first task, then drains the rest.
    pub fn pump_timeout(&mut self, target: &mut T, timeout: Duration) -> usize {
        match self.rx.recv_timeout(timeout) {
            Ok(envelope) => {
                run(envelope, target);
                1 + self.pump(target)
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => 0,
        }
    }
}

fn run<T>(envelope: Envelope<T>, target: &mut T) {
    let Envelope { task, done } = envelope;
    let completion = match catch_unwind(AssertUnwindSafe(|| task(target))) {
        Ok(()) => Completion::Done,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!("ui task panicked: {message}");
            Completion::Panicked(message)
        }
    };
    if let Some(done) = done {
        let _ = done.send(completion);
    }
}

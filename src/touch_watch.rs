//! Turns pointer samples into session touches.
//!
//! Entering the touch strip touches the session, either right away or after
//! the configured delay; leaving the strip before the delay runs out cancels
//! the pending touch. Moving over the visible dock keeps the session alive.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::trace;

use crate::areas::DockAreas;
use crate::error::DockResult;
use crate::geometry::Point;
use crate::scheduler::{Scheduler, TimerHandle};
use crate::session::{Session, TouchKind};

/// Delay between the pointer entering the touch strip and the touch. Zero
/// means touch immediately.
#[derive(Debug, Default)]
pub struct OnTouchDelay {
    millis: AtomicU64,
}

impl OnTouchDelay {
    pub fn new(delay: Option<Duration>) -> Self {
        let this = Self::default();
        this.set(delay);
        this
    }

    pub fn set(&self, delay: Option<Duration>) {
        let millis = delay.map_or(0, |delay| delay.as_millis() as u64);
        self.millis.store(millis, Ordering::Relaxed);
    }

    pub fn get_or_zero(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::Relaxed))
    }

    pub fn is_set(&self) -> bool {
        self.millis.load(Ordering::Relaxed) > 0
    }
}

#[derive(Debug, Default)]
struct WatchState {
    in_strip: bool,
    pending: Option<TimerHandle>,
}

pub struct TouchWatch<T> {
    areas: DockAreas,
    session: Session<T>,
    delay: Arc<OnTouchDelay>,
    scheduler: Scheduler,
    state: Mutex<WatchState>,
}

impl<T> std::fmt::Debug for TouchWatch<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TouchWatch")
            .field("delay", &self.delay)
            .field("state", &*self.state.lock())
            .finish()
    }
}

impl<T: 'static> TouchWatch<T> {
    pub fn new(areas: DockAreas, session: Session<T>, delay: Arc<OnTouchDelay>) -> DockResult<Self> {
        let scheduler = Scheduler::new(format!("{}-touch", session.name()))?;
        Ok(Self {
            areas,
            session,
            delay,
            scheduler,
            state: Mutex::new(WatchState::default()),
        })
    }

    pub fn delay(&self) -> &OnTouchDelay {
        &self.delay
    }

    /// Whether a delayed touch is waiting to fire.
    pub fn has_pending_touch(&self) -> bool {
        self.state.lock().pending.is_some() && self.scheduler.pending() > 0
    }

    /// Feeds one pointer sample.
    pub fn on_pointer(&self, point: Point) {
        let in_strip = self.areas.is_in_touch(point);
        let mut state = self.state.lock();
        let entered = in_strip && !state.in_strip;
        let left = !in_strip && state.in_strip;
        state.in_strip = in_strip;

        if entered {
            let delay = self.delay.get_or_zero();
            if delay.is_zero() {
                trace!(?point, "touch strip entered");
                drop(state);
                self.session.touch(TouchKind::Manual);
                return;
            }
            trace!(?point, ?delay, "touch strip entered, touch delayed");
            let session = self.session.clone();
            let handle = self.scheduler.schedule(delay, move || {
                session.touch(TouchKind::Manual);
            });
            if let Some(previous) = state.pending.replace(handle) {
                previous.cancel();
            }
            return;
        }

        if left && let Some(pending) = state.pending.take() {
            trace!(?point, "touch strip left, delayed touch cancelled");
            pending.cancel();
        }
        drop(state);

        if !in_strip && self.areas.is_over_dock(point) {
            self.session.touch(TouchKind::Manual);
        }
    }

    /// Cancels a pending delayed touch and stops the timer thread.
    pub fn shutdown(&self, timeout: Duration) {
        if let Some(pending) = self.state.lock().pending.take() {
            pending.cancel();
        }
        self.scheduler.shutdown_and_wait(timeout);
    }
}

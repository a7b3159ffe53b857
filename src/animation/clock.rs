use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Shareable animation clock.
///
/// A real clock reads the monotonic time elapsed since it was created. A
/// manual clock only moves when told to, which is what tests drive.
#[derive(Debug, Clone)]
pub struct Clock {
    inner: Arc<Mutex<ClockState>>,
}

#[derive(Debug)]
struct ClockState {
    origin: Instant,
    manual: Option<Duration>,
    complete_instantly: bool,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    pub fn new() -> Self {
        Self::from_state(None)
    }

    /// Creates a clock frozen at `time`.
    pub fn manual(time: Duration) -> Self {
        Self::from_state(Some(time))
    }

    fn from_state(manual: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ClockState {
                origin: Instant::now(),
                manual,
                complete_instantly: false,
            })),
        }
    }

    pub fn now(&self) -> Duration {
        let state = self.inner.lock();
        state.manual.unwrap_or_else(|| state.origin.elapsed())
    }

    pub fn is_manual(&self) -> bool {
        self.inner.lock().manual.is_some()
    }

    /// Freezes the clock at `time`.
    pub fn set(&self, time: Duration) {
        self.inner.lock().manual = Some(time);
    }

    /// Moves a manual clock forward; freezes a real clock at its current
    /// reading plus `delta`.
    pub fn advance(&self, delta: Duration) {
        let mut state = self.inner.lock();
        let now = state.manual.unwrap_or_else(|| state.origin.elapsed());
        state.manual = Some(now.saturating_add(delta));
    }

    /// Returns whether animations should complete instantly.
    pub fn should_complete_instantly(&self) -> bool {
        self.inner.lock().complete_instantly
    }

    pub fn set_complete_instantly(&self, value: bool) {
        self.inner.lock().complete_instantly = value;
    }
}

impl PartialEq for Clock {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Clock {}

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Open/closed permission flag the queue worker waits on while a show or
/// hide transition owns the dock geometry.
#[derive(Debug)]
pub struct Gate {
    allowed: Mutex<bool>,
    changed: Condvar,
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

impl Gate {
    pub fn new() -> Self {
        Self {
            allowed: Mutex::new(true),
            changed: Condvar::new(),
        }
    }

    pub fn forbid(&self) {
        *self.allowed.lock() = false;
    }

    pub fn allow(&self) {
        let mut allowed = self.allowed.lock();
        if !*allowed {
            *allowed = true;
            self.changed.notify_all();
        }
    }

    pub fn is_allowed(&self) -> bool {
        *self.allowed.lock()
    }

    pub fn wait_until_allowed(&self) {
        let mut allowed = self.allowed.lock();
        while !*allowed {
            self.changed.wait(&mut allowed);
        }
    }

    /// Returns `true` once allowed, `false` if `timeout` elapsed first.
    pub fn wait_until_allowed_for(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut allowed = self.allowed.lock();
        while !*allowed {
            if self.changed.wait_until(&mut allowed, deadline).timed_out() {
                return *allowed;
            }
        }
        true
    }
}

//! Touch / block / deactivate state machine deciding whether the dock is
//! active.
//!
//! All state lives behind one lock. Side effects (activation, deactivation,
//! touch listeners) are posted to the UI thread and never run while the lock
//! is held. The `can_deactivate` predicate is also evaluated outside the
//! lock; a decision that was overtaken by a touch or a block while the
//! predicate ran is dropped.

use std::collections::{BTreeSet, HashMap};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, warn};

use crate::constants::{DEFAULT_QUIET_PERIOD, SHUTDOWN_WAIT};
use crate::error::{DockResult, panic_message};
use crate::scheduler::{Scheduler, TimerHandle};
use crate::ui_thread::UiHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchKind {
    /// The pointer reached the dock's sensing strip.
    Manual,
    /// A caller touched the session through the control API.
    Programmatic,
}

pub type ListenerId = u64;

type TouchListener = Arc<dyn Fn(TouchKind) + Send + Sync>;
type Listeners = Arc<Mutex<Vec<(ListenerId, TouchListener)>>>;

/// Callbacks a session drives. The first two run on the UI thread against
/// the UI-owned state `T`; `can_deactivate` runs on whichever thread decides.
pub struct SessionHooks<T> {
    pub on_activation: Arc<dyn Fn(&mut T, TouchKind) + Send + Sync>,
    pub on_deactivation: Arc<dyn Fn(&mut T) + Send + Sync>,
    pub can_deactivate: Arc<dyn Fn() -> bool + Send + Sync>,
}

impl<T> Clone for SessionHooks<T> {
    fn clone(&self) -> Self {
        Self {
            on_activation: Arc::clone(&self.on_activation),
            on_deactivation: Arc::clone(&self.on_deactivation),
            can_deactivate: Arc::clone(&self.can_deactivate),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub name: String,
    pub quiet_period: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: "dock".to_string(),
            quiet_period: DEFAULT_QUIET_PERIOD,
        }
    }
}

#[derive(Debug)]
enum Activity {
    /// Blocked: no deactivation check is armed.
    Frozen,
    /// A deactivation check is armed on the timer.
    Waiting { check: u64, handle: TimerHandle },
    /// The `can_deactivate` predicate is being evaluated for `check`.
    Deciding { check: u64 },
}

#[derive(Debug)]
enum Phase {
    Inactive,
    Active(Activity),
}

#[derive(Debug)]
struct SessionState {
    blocks: BTreeSet<String>,
    ttls: HashMap<String, (u64, TimerHandle)>,
    phase: Phase,
    next_token: u64,
    disposed: bool,
}

impl SessionState {
    fn token(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }

    /// Disarms a waiting check, leaving the session active.
    fn disarm(&mut self) {
        if let Phase::Active(activity) = &mut self.phase {
            if let Activity::Waiting { handle, .. } = activity {
                handle.cancel();
            }
            *activity = Activity::Frozen;
        }
    }
}

struct SessionInner<T> {
    config: SessionConfig,
    state: RwLock<SessionState>,
    scheduler: Scheduler,
    ui: UiHandle<T>,
    hooks: SessionHooks<T>,
    listeners: Listeners,
    next_listener: AtomicU64,
}

/// Cloneable handle to one dock's session.
pub struct Session<T> {
    inner: Arc<SessionInner<T>>,
}

impl<T> Clone for Session<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("Session")
            .field("name", &self.inner.config.name)
            .field("blocks", &state.blocks)
            .field("phase", &state.phase)
            .finish()
    }
}

impl<T: 'static> Session<T> {
    pub fn new(config: SessionConfig, ui: UiHandle<T>, hooks: SessionHooks<T>) -> DockResult<Self> {
        let scheduler = Scheduler::new(format!("{}-session", config.name))?;
        Ok(Self {
            inner: Arc::new(SessionInner {
                config,
                state: RwLock::new(SessionState {
                    blocks: BTreeSet::new(),
                    ttls: HashMap::new(),
                    phase: Phase::Inactive,
                    next_token: 0,
                    disposed: false,
                }),
                scheduler,
                ui,
                hooks,
                listeners: Arc::new(Mutex::new(Vec::new())),
                next_listener: AtomicU64::new(0),
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    pub fn quiet_period(&self) -> Duration {
        self.inner.config.quiet_period
    }

    pub fn is_active(&self) -> bool {
        matches!(self.inner.state.read().phase, Phase::Active(_))
    }

    pub fn is_blocked(&self) -> bool {
        !self.inner.state.read().blocks.is_empty()
    }

    pub fn has_block(&self, name: &str) -> bool {
        self.inner.state.read().blocks.contains(name)
    }

    pub fn blocks(&self) -> Vec<String> {
        self.inner.state.read().blocks.iter().cloned().collect()
    }

    /// Touches the session. Ignored while blocked. Returns whether the touch
    /// took effect.
    pub fn touch(&self, kind: TouchKind) -> bool {
        let mut state = self.inner.state.write();
        self.touch_locked(&mut state, kind)
    }

    /// Keeps the session up for another quiet period without firing the
    /// activation hook or touch listeners. A deactivation that already went
    /// out is taken back silently.
    pub fn keep_alive(&self) -> bool {
        let mut state = self.inner.state.write();
        if state.disposed {
            return false;
        }
        if matches!(state.phase, Phase::Inactive) {
            state.phase = Phase::Active(Activity::Frozen);
        } else {
            state.disarm();
        }
        if state.blocks.is_empty() {
            self.arm(&mut state);
        }
        debug!(session = %self.name(), "session kept alive");
        true
    }

    /// Adds a named block, freezing deactivation until it is lifted. With a
    /// `ttl` the block lifts itself; re-blocking a name restarts its TTL.
    pub fn block(&self, name: impl Into<String>, ttl: Option<Duration>) {
        let mut state = self.inner.state.write();
        self.block_locked(&mut state, name.into(), ttl);
    }

    /// Touch and block as one step: nothing can deactivate the session
    /// between the two.
    pub fn touch_and_block(&self, kind: TouchKind, name: impl Into<String>, ttl: Option<Duration>) {
        let mut state = self.inner.state.write();
        self.touch_locked(&mut state, kind);
        self.block_locked(&mut state, name.into(), ttl);
    }

    /// Lifts one block. Returns whether it was present.
    pub fn unblock(&self, name: &str) -> bool {
        let (removed, decide) = {
            let mut state = self.inner.state.write();
            if let Some((_, handle)) = state.ttls.remove(name) {
                handle.cancel();
            }
            let removed = state.blocks.remove(name);
            let decide = if removed {
                self.after_unblock(&mut state)
            } else {
                None
            };
            (removed, decide)
        };
        if let Some(check) = decide {
            self.decide(check);
        }
        removed
    }

    pub fn unblock_all(&self) {
        let decide = {
            let mut state = self.inner.state.write();
            for (_, (_, handle)) in state.ttls.drain() {
                handle.cancel();
            }
            if state.blocks.is_empty() {
                None
            } else {
                state.blocks.clear();
                self.after_unblock(&mut state)
            }
        };
        if let Some(check) = decide {
            self.decide(check);
        }
    }

    pub fn add_touch_listener(&self, listener: impl Fn(TouchKind) + Send + Sync + 'static) -> ListenerId {
        let id = self.inner.next_listener.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    pub fn remove_touch_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(other, _)| *other != id);
        listeners.len() != before
    }

    /// Cancels every timer and stops the timer thread (bounded wait). The
    /// session ignores everything afterwards.
    pub fn dispose(&self) {
        {
            let mut state = self.inner.state.write();
            if state.disposed {
                return;
            }
            state.disposed = true;
            state.disarm();
            for (_, (_, handle)) in state.ttls.drain() {
                handle.cancel();
            }
            state.blocks.clear();
            state.phase = Phase::Inactive;
        }
        self.inner.scheduler.shutdown_and_wait(SHUTDOWN_WAIT);
        debug!(session = %self.name(), "session disposed");
    }

    fn touch_locked(&self, state: &mut SessionState, kind: TouchKind) -> bool {
        if state.disposed {
            return false;
        }
        if !state.blocks.is_empty() {
            debug!(session = %self.name(), ?kind, blocks = ?state.blocks, "touch ignored while blocked");
            return false;
        }
        match state.phase {
            Phase::Inactive => {
                debug!(session = %self.name(), ?kind, "session activated");
                state.phase = Phase::Active(Activity::Frozen);
                self.dispatch_activation(kind);
            }
            Phase::Active(_) => state.disarm(),
        }
        self.arm(state);
        true
    }

    fn block_locked(&self, state: &mut SessionState, name: String, ttl: Option<Duration>) {
        if state.disposed {
            return;
        }
        state.disarm();
        if let Some((_, previous)) = state.ttls.remove(&name) {
            previous.cancel();
        }
        if let Some(ttl) = ttl {
            let token = state.token();
            let weak = self.downgrade();
            let expired = name.clone();
            let handle = self.inner.scheduler.schedule(ttl, move || {
                if let Some(session) = Session::upgrade(&weak) {
                    session.expire_block(&expired, token);
                }
            });
            state.ttls.insert(name.clone(), (token, handle));
        }
        debug!(session = %self.name(), block = %name, ?ttl, "session blocked");
        state.blocks.insert(name);
    }

    fn expire_block(&self, name: &str, token: u64) {
        let decide = {
            let mut state = self.inner.state.write();
            if state.ttls.get(name).map(|(t, _)| *t) != Some(token) {
                return;
            }
            state.ttls.remove(name);
            debug!(session = %self.name(), block = %name, "block expired");
            if state.blocks.remove(name) {
                self.after_unblock(&mut state)
            } else {
                None
            }
        };
        if let Some(check) = decide {
            self.decide(check);
        }
    }

    /// Starts a decision if the last block just went away.
    fn after_unblock(&self, state: &mut SessionState) -> Option<u64> {
        if !state.blocks.is_empty() || state.disposed {
            return None;
        }
        match state.phase {
            Phase::Active(Activity::Frozen) => {
                let check = state.token();
                state.phase = Phase::Active(Activity::Deciding { check });
                Some(check)
            }
            _ => None,
        }
    }

    /// Arms a fresh deactivation check one quiet period from now.
    fn arm(&self, state: &mut SessionState) {
        let check = state.token();
        let weak = self.downgrade();
        let handle = self.inner.scheduler.schedule(self.quiet_period(), move || {
            if let Some(session) = Session::upgrade(&weak) {
                session.on_check(check);
            }
        });
        state.phase = Phase::Active(Activity::Waiting { check, handle });
    }

    fn on_check(&self, check: u64) {
        {
            let mut state = self.inner.state.write();
            match state.phase {
                Phase::Active(Activity::Waiting { check: armed, .. }) if armed == check => {}
                _ => return,
            }
            if !state.blocks.is_empty() {
                self.arm(&mut state);
                return;
            }
            state.phase = Phase::Active(Activity::Deciding { check });
        }
        self.decide(check);
    }

    fn decide(&self, check: u64) {
        let may_deactivate = match catch_unwind(AssertUnwindSafe(|| (self.inner.hooks.can_deactivate)())) {
            Ok(may) => may,
            Err(payload) => {
                error!("can_deactivate panicked: {}", panic_message(payload.as_ref()));
                false
            }
        };
        let mut state = self.inner.state.write();
        match state.phase {
            Phase::Active(Activity::Deciding { check: current }) if current == check => {}
            // A touch or block overtook this decision.
            _ => return,
        }
        if !state.blocks.is_empty() {
            self.arm(&mut state);
        } else if may_deactivate {
            debug!(session = %self.name(), "session deactivated");
            state.phase = Phase::Inactive;
            self.dispatch_deactivation();
        } else {
            self.arm(&mut state);
        }
    }

    fn dispatch_activation(&self, kind: TouchKind) {
        let on_activation = Arc::clone(&self.inner.hooks.on_activation);
        let listeners = Arc::clone(&self.inner.listeners);
        let posted = self.inner.ui.run_later(move |target| {
            on_activation(target, kind);
            let snapshot: Vec<TouchListener> = listeners
                .lock()
                .iter()
                .map(|(_, listener)| Arc::clone(listener))
                .collect();
            for listener in snapshot {
                if let Err(payload) = catch_unwind(AssertUnwindSafe(|| listener(kind))) {
                    error!("touch listener panicked: {}", panic_message(payload.as_ref()));
                }
            }
        });
        if posted.is_err() {
            warn!(session = %self.name(), "activation dropped, ui loop is gone");
        }
    }

    fn dispatch_deactivation(&self) {
        let on_deactivation = Arc::clone(&self.inner.hooks.on_deactivation);
        if self.inner.ui.run_later(move |target| on_deactivation(target)).is_err() {
            warn!(session = %self.name(), "deactivation dropped, ui loop is gone");
        }
    }

    fn downgrade(&self) -> Weak<SessionInner<T>> {
        Arc::downgrade(&self.inner)
    }

    fn upgrade(weak: &Weak<SessionInner<T>>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }
}

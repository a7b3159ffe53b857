//! A complete dock: the thread-safe control handle, the UI-thread half and
//! the builder wiring session, queue, gate and animation together.
//!
//! Everything that changes the dock's geometry runs on the UI thread, inside
//! [`DockUi::pump`] or [`DockUi::frame`]. [`Dock`] only posts work and reads
//! published values, so it can be shared freely between threads.

mod core;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

pub use self::core::DockCore;
use crate::animation::{Clock, ShowHideAnimation};
use crate::areas::{DockAreas, hidden_offset, sliding_extent, with_docking, with_sliding};
use crate::command::{Command, SessionDirective};
use crate::config::{Behavior, DockConfig};
use crate::constants::{
    DEFAULT_QUEUE_CAPACITY, DEFAULT_QUIET_PERIOD, FRAME_INTERVAL, INITIAL_SHOW_BLOCK, INITIAL_SHOW_HOLD_EXTRA,
    INITIAL_SHOW_HOLD_INSTANT, SHUTDOWN_WAIT,
};
use crate::content::ContentView;
use crate::docking::DockingController;
use crate::error::DockResult;
use crate::gate::Gate;
use crate::geometry::{Point, Rect, Screen, Side, SideMarkers};
use crate::observe::{Observable, Subscription};
use crate::position::{CurrentPosition, Position, RelativePosition, clamp_coordinate};
use crate::queue::{CommandQueue, spawn_worker};
use crate::session::{ListenerId, Session, SessionConfig, SessionHooks, TouchKind};
use crate::snapshot::{DockSnapshot, SnapshotSink};
use crate::state::DockState;
use crate::touch_watch::{OnTouchDelay, TouchWatch};
use crate::ui_thread::{UiLoop, ui_channel};

/// Where the pointer is, as far as the dock can tell.
pub trait PointerSource: Send + Sync + 'static {
    fn pointer(&self) -> Option<Point>;

    /// Receives every sample fed through [`Dock::pointer_moved`].
    fn report(&self, _point: Point) {}
}

/// Remembers the last reported pointer sample.
#[derive(Debug, Default)]
pub struct LastPointer {
    last: Mutex<Option<Point>>,
}

impl LastPointer {
    pub fn clear(&self) {
        *self.last.lock() = None;
    }
}

impl PointerSource for LastPointer {
    fn pointer(&self) -> Option<Point> {
        *self.last.lock()
    }

    fn report(&self, point: Point) {
        *self.last.lock() = Some(point);
    }
}

/// The dock's published values. Written only on the UI thread; readable and
/// observable from anywhere.
#[derive(Debug, Clone)]
pub struct DockProperties {
    pub stage: Observable<Rect>,
    pub side: Observable<Side>,
    pub state: Observable<DockState>,
    pub position: Observable<CurrentPosition>,
    pub pinned: Observable<bool>,
}

pub struct DockBuilder<V: ContentView> {
    name: String,
    screen: Screen,
    view: V,
    position: Position,
    pinned: bool,
    show: Behavior,
    hide: Behavior,
    quiet_period: Duration,
    queue_capacity: usize,
    touch_delay: Option<Duration>,
    initial_show: bool,
    clock: Option<Clock>,
    pointer: Option<Arc<dyn PointerSource>>,
    sink: Option<SnapshotSink>,
}

impl<V: ContentView> DockBuilder<V> {
    pub fn new(screen: Screen, view: V) -> Self {
        Self {
            name: "dock".to_string(),
            screen,
            view,
            position: Position::default(),
            pinned: false,
            show: Behavior::default(),
            hide: Behavior::default(),
            quiet_period: DEFAULT_QUIET_PERIOD,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            touch_delay: None,
            initial_show: true,
            clock: None,
            pointer: None,
            sink: None,
        }
    }

    pub fn from_config(screen: Screen, view: V, config: &DockConfig) -> Self {
        Self::new(screen, view)
            .name(config.name.clone())
            .position(config.position)
            .pinned(config.pinned)
            .show(config.show)
            .hide(config.hide)
            .quiet_period(config.quiet_period())
            .queue_capacity(config.queue_capacity)
            .touch_delay(config.touch_delay())
            .initial_show(config.initial_show)
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn pinned(mut self, pinned: bool) -> Self {
        self.pinned = pinned;
        self
    }

    pub fn show(mut self, behavior: Behavior) -> Self {
        self.show = behavior.normalized();
        self
    }

    pub fn hide(mut self, behavior: Behavior) -> Self {
        self.hide = behavior.normalized();
        self
    }

    pub fn quiet_period(mut self, quiet_period: Duration) -> Self {
        self.quiet_period = quiet_period;
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn touch_delay(mut self, delay: Option<Duration>) -> Self {
        self.touch_delay = delay;
        self
    }

    /// Whether the dock shows itself once right after being built.
    pub fn initial_show(mut self, initial_show: bool) -> Self {
        self.initial_show = initial_show;
        self
    }

    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn pointer_source(mut self, pointer: Arc<dyn PointerSource>) -> Self {
        self.pointer = Some(pointer);
        self
    }

    pub fn snapshot_sink(mut self, sink: SnapshotSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Builds the dock hidden at its configured position and, unless turned
    /// off, posts the initial show. The returned [`DockUi`] must be pumped by
    /// the thread that owns the dock's UI.
    pub fn build(self) -> DockResult<(Dock<V>, DockUi<V>)> {
        let DockBuilder {
            name,
            screen,
            mut view,
            position,
            pinned,
            show,
            hide,
            quiet_period,
            queue_capacity,
            touch_delay,
            initial_show,
            clock,
            pointer,
            sink,
        } = self;

        let side = position.side();
        let markers = SideMarkers::for_side(side);
        view.set_markers(markers);
        let size = view.adopt_side(side);
        let limit = screen.sliding_extent(side);
        let extent = sliding_extent(size, side);
        let (coordinate, relative) = match position {
            Position::Absolute { coordinate, .. } => (clamp_coordinate(coordinate, limit, extent), None),
            Position::Relative(relative) => (relative.coordinate(limit, extent), Some(relative)),
        };
        let hidden = hidden_offset(&screen, side, size);
        let stage = with_sliding(Rect::from_parts(Point::default(), size), side, coordinate);
        let stage = with_docking(stage, side, hidden);

        let props = DockProperties {
            stage: Observable::new(stage),
            side: Observable::new(side),
            state: Observable::new(DockState::Hidden),
            position: Observable::new(CurrentPosition {
                side,
                coordinate,
                relative,
            }),
            pinned: Observable::new(pinned),
        };
        let areas = DockAreas::new(screen, props.stage.clone(), props.side.clone());
        let pointer = pointer.unwrap_or_else(|| Arc::new(LastPointer::default()) as Arc<dyn PointerSource>);

        let (ui, ui_loop) = ui_channel::<DockCore<V>>();
        let can_deactivate = {
            let areas = areas.clone();
            let pointer = Arc::clone(&pointer);
            Arc::new(move || !pointer.pointer().is_some_and(|point| areas.is_over_dock(point)))
        };
        let hooks = SessionHooks {
            on_activation: Arc::new(|core: &mut DockCore<V>, kind: TouchKind| core.on_activated(kind)),
            on_deactivation: Arc::new(|core: &mut DockCore<V>| core.on_deactivated()),
            can_deactivate,
        };
        let session = Session::new(
            SessionConfig {
                name: name.clone(),
                quiet_period,
            },
            ui.clone(),
            hooks,
        )?;
        let watch = TouchWatch::new(areas.clone(), session.clone(), Arc::new(OnTouchDelay::new(touch_delay)))?;

        let gate = Arc::new(Gate::new());
        let queue = Arc::new(CommandQueue::new(queue_capacity));
        let core = DockCore {
            name: name.clone(),
            controller: DockingController::new(screen),
            view,
            props: props.clone(),
            markers,
            relative,
            content_visible: false,
            draggable: true,
            animation: ShowHideAnimation::new(clock.unwrap_or_default(), show, hide, hidden),
            gate: Arc::clone(&gate),
            session: session.clone(),
            queue: Arc::clone(&queue),
            grab: None,
            pointer: Arc::clone(&pointer),
        };
        let worker = spawn_worker(
            format!("{name}-queue"),
            Arc::clone(&queue),
            gate,
            ui,
            |core: &mut DockCore<V>, command: Command<V::Content>| core.apply(command),
        )?;

        let subscriptions = match sink {
            Some(sink) => snapshot_subscriptions(&name, &props, show, hide, sink),
            None => Vec::new(),
        };

        if initial_show {
            let hold = if show.is_instant() {
                INITIAL_SHOW_HOLD_INSTANT
            } else {
                show.duration() + INITIAL_SHOW_HOLD_EXTRA
            };
            session.touch_and_block(TouchKind::Programmatic, INITIAL_SHOW_BLOCK, Some(hold));
        }
        info!(dock = %name, %side, coordinate, "dock built");

        let dock = Dock {
            name,
            props,
            areas,
            session,
            queue,
            watch,
            pointer,
            show,
            hide,
            worker: Mutex::new(Some(worker)),
            closed: AtomicBool::new(false),
            _subscriptions: subscriptions,
        };
        Ok((dock, DockUi { core, ui_loop }))
    }
}

fn snapshot_subscriptions(
    name: &str,
    props: &DockProperties,
    show: Behavior,
    hide: Behavior,
    sink: SnapshotSink,
) -> Vec<Subscription> {
    let publish: Arc<dyn Fn() + Send + Sync> = {
        let name = name.to_string();
        let position = props.position.clone();
        let pinned = props.pinned.clone();
        Arc::new(move || sink(&DockSnapshot::capture(&name, position.get(), pinned.get(), show, hide)))
    };
    let on_move = Arc::clone(&publish);
    vec![
        props.position.subscribe(move |_| on_move()),
        props.pinned.subscribe(move |_| publish()),
    ]
}

/// Thread-safe control handle. Requests are queued and applied in order on
/// the UI thread; reads return the last published values.
pub struct Dock<V: ContentView> {
    name: String,
    props: DockProperties,
    areas: DockAreas,
    session: Session<DockCore<V>>,
    queue: Arc<CommandQueue<Command<V::Content>>>,
    watch: TouchWatch<DockCore<V>>,
    pointer: Arc<dyn PointerSource>,
    show: Behavior,
    hide: Behavior,
    worker: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
    _subscriptions: Vec<Subscription>,
}

impl<V: ContentView> std::fmt::Debug for Dock<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dock")
            .field("name", &self.name)
            .field("props", &self.props)
            .field("session", &self.session)
            .field("closed", &self.closed)
            .finish()
    }
}

impl<V: ContentView> Dock<V> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &DockProperties {
        &self.props
    }

    pub fn areas(&self) -> &DockAreas {
        &self.areas
    }

    pub fn state(&self) -> DockState {
        self.props.state.get()
    }

    pub fn side(&self) -> Side {
        self.props.side.get()
    }

    pub fn stage(&self) -> Rect {
        self.props.stage.get()
    }

    pub fn position(&self) -> CurrentPosition {
        self.props.position.get()
    }

    pub fn is_pinned(&self) -> bool {
        self.props.pinned.get()
    }

    pub fn set_pinned(&self, pinned: bool) {
        if self.props.pinned.set(pinned) {
            info!(dock = %self.name, pinned, "pin changed");
        }
    }

    pub fn on_touch_delay(&self) -> &OnTouchDelay {
        self.watch.delay()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_active()
    }

    pub fn is_blocked(&self) -> bool {
        self.session.is_blocked()
    }

    pub fn has_block(&self, name: &str) -> bool {
        self.session.has_block(name)
    }

    /// Moves along the current side.
    pub fn move_to(&self, coordinate: f64) -> DockResult<()> {
        self.queue.put(Command::Move { side: None, coordinate })
    }

    pub fn move_to_side(&self, side: Side, coordinate: f64) -> DockResult<()> {
        self.queue.put(Command::Move {
            side: Some(side),
            coordinate,
        })
    }

    pub fn move_to_relative(&self, relative: RelativePosition) -> DockResult<()> {
        self.queue.put(Command::MoveRelative(relative))
    }

    pub fn move_to_position(&self, position: Position) -> DockResult<()> {
        match position {
            Position::Absolute { side, coordinate } => self.move_to_side(side, coordinate),
            Position::Relative(relative) => self.move_to_relative(relative),
        }
    }

    /// Mutates the content on the UI thread, then re-lays the dock out.
    pub fn change_content(&self, change: impl FnOnce(&mut V::Content) + Send + 'static) -> DockResult<()> {
        self.queue.put(Command::ContentChange(Box::new(change)))
    }

    pub fn touch(&self) -> DockResult<()> {
        self.directive(SessionDirective::Touch)
    }

    pub fn touch_and_block(&self, name: impl Into<String>, ttl: Option<Duration>) -> DockResult<()> {
        self.directive(SessionDirective::TouchAndBlock {
            name: name.into(),
            ttl,
        })
    }

    pub fn block(&self, name: impl Into<String>, ttl: Option<Duration>) -> DockResult<()> {
        self.directive(SessionDirective::Block {
            name: name.into(),
            ttl,
        })
    }

    pub fn unblock(&self, name: impl Into<String>) -> DockResult<()> {
        self.directive(SessionDirective::Unblock(name.into()))
    }

    pub fn unblock_all(&self) -> DockResult<()> {
        self.directive(SessionDirective::UnblockAll)
    }

    pub fn add_touch_listener(&self, listener: impl Fn(TouchKind) + Send + Sync + 'static) -> ListenerId {
        self.session.add_touch_listener(listener)
    }

    pub fn remove_touch_listener(&self, id: ListenerId) -> bool {
        self.session.remove_touch_listener(id)
    }

    /// Feeds a pointer sample to the touch watch and the pointer source.
    pub fn pointer_moved(&self, point: Point) {
        self.pointer.report(point);
        self.watch.on_pointer(point);
    }

    pub fn snapshot(&self) -> DockSnapshot {
        DockSnapshot::capture(&self.name, self.position(), self.is_pinned(), self.show, self.hide)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Stops the dock: pending commands are dropped, timers cancelled and
    /// the worker joined within a bounded wait. The worker can only finish
    /// a command in flight while the UI loop is pumped or gone, so call this
    /// after dropping the [`DockUi`] or from a thread other than the UI one.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let dropped = self.queue.close();
        self.session.dispose();
        self.watch.shutdown(SHUTDOWN_WAIT);
        if let Some(worker) = self.worker.lock().take() {
            let deadline = Instant::now() + SHUTDOWN_WAIT;
            while !worker.is_finished() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(5));
            }
            if !worker.is_finished() {
                warn!(dock = %self.name, "queue worker did not stop in time");
            } else if worker.join().is_err() {
                error!(dock = %self.name, "queue worker panicked");
            }
        }
        info!(dock = %self.name, dropped, "dock closed");
    }

    fn directive(&self, directive: SessionDirective) -> DockResult<()> {
        debug!(dock = %self.name, ?directive, "session directive queued");
        self.queue.put(Command::Session(directive))
    }
}

impl<V: ContentView> Drop for Dock<V> {
    fn drop(&mut self) {
        self.close();
    }
}

/// UI-thread half of a dock. Pump it regularly; nothing the dock does
/// becomes visible otherwise.
pub struct DockUi<V: ContentView> {
    core: DockCore<V>,
    ui_loop: UiLoop<DockCore<V>>,
}

impl<V: ContentView> std::fmt::Debug for DockUi<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DockUi").field("core", &self.core).finish()
    }
}

impl<V: ContentView> DockUi<V> {
    pub fn core(&self) -> &DockCore<V> {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut DockCore<V> {
        &mut self.core
    }

    /// Runs every posted task. Returns how many ran.
    pub fn pump(&mut self) -> usize {
        self.ui_loop.pump(&mut self.core)
    }

    pub fn pump_timeout(&mut self, timeout: Duration) -> usize {
        self.ui_loop.pump_timeout(&mut self.core, timeout)
    }

    /// One frame: posted tasks first, then the animation step.
    pub fn frame(&mut self) -> usize {
        let ran = self.pump();
        self.core.tick();
        ran
    }

    /// Keeps running frames until `done` holds or `timeout` passes. Returns
    /// whether `done` held.
    pub fn pump_until(&mut self, timeout: Duration, mut done: impl FnMut(&DockCore<V>) -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.frame();
            if done(&self.core) {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            self.pump_timeout((deadline - now).min(FRAME_INTERVAL));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Item, ItemStrip};
    use crate::geometry::Size;
    use std::sync::atomic::AtomicUsize;

    const SCREEN: Screen = Screen::new(1920.0, 1080.0);
    const WAIT: Duration = Duration::from_secs(3);

    fn strip() -> ItemStrip {
        ItemStrip::new(vec![Item::new("files"), Item::new("shell")])
    }

    fn build(builder: DockBuilder<ItemStrip>) -> (Dock<ItemStrip>, DockUi<ItemStrip>) {
        builder
            .show(Behavior::Instant)
            .hide(Behavior::Instant)
            .quiet_period(Duration::from_millis(40))
            .build()
            .unwrap()
    }

    fn close(dock: Dock<ItemStrip>, ui: DockUi<ItemStrip>) {
        drop(ui);
        dock.close();
    }

    #[test]
    fn starts_hidden_and_centred() {
        let (dock, ui) = build(DockBuilder::new(SCREEN, strip()).initial_show(false));
        let size = ui.core().view().size();
        assert_eq!(size, Size::new(17.0, 3.0));
        assert_eq!(dock.stage(), Rect::new((1920.0 - 17.0) / 2.0, -4.0, 17.0, 3.0));
        assert_eq!(dock.state(), DockState::Hidden);
        assert_eq!(dock.position().relative, Some(RelativePosition::TopCenter));
        assert!(!ui.core().is_content_visible());
        close(dock, ui);
    }

    #[test]
    fn initial_show_then_hides_after_hold() {
        let (dock, mut ui) = build(DockBuilder::new(SCREEN, strip()));
        assert!(dock.has_block(INITIAL_SHOW_BLOCK));
        assert!(ui.pump_until(WAIT, |core| core.state() == DockState::Shown));
        assert_eq!(dock.stage().y, 0.0);
        assert!(ui.core().is_content_visible());
        // instant show holds for two seconds, then the quiet period runs out
        assert!(ui.pump_until(Duration::from_secs(5), |core| core.state() == DockState::Hidden));
        assert!(!dock.has_block(INITIAL_SHOW_BLOCK));
        assert!(!ui.core().is_content_visible());
        close(dock, ui);
    }

    #[test]
    fn deactivation_under_the_pointer_keeps_dock_up_quietly() {
        let pointer = Arc::new(LastPointer::default());
        let (dock, mut ui) = build(
            DockBuilder::new(SCREEN, strip())
                .initial_show(false)
                .pointer_source(Arc::clone(&pointer) as Arc<dyn PointerSource>),
        );
        dock.touch().unwrap();
        assert!(ui.pump_until(WAIT, |core| core.state() == DockState::Shown));
        let touches = Arc::new(AtomicUsize::new(0));
        {
            let touches = Arc::clone(&touches);
            dock.add_touch_listener(move |_| {
                touches.fetch_add(1, Ordering::SeqCst);
            });
        }

        // the session gives up while the UI thread is busy, then the pointer
        // lands on the dock before the hide is applied
        thread::sleep(Duration::from_millis(200));
        assert!(!dock.is_active());
        pointer.report(Point::new(955.0, 1.0));
        assert!(!ui.pump_until(Duration::from_millis(150), |core| core.state() != DockState::Shown));
        assert!(dock.is_active());
        assert_eq!(touches.load(Ordering::SeqCst), 0);

        pointer.clear();
        assert!(ui.pump_until(WAIT, |core| core.state() == DockState::Hidden));
        assert_eq!(touches.load(Ordering::SeqCst), 0);
        close(dock, ui);
    }

    #[test]
    fn pinned_dock_ignores_moves() {
        let (dock, mut ui) = build(DockBuilder::new(SCREEN, strip()).initial_show(false).pinned(true));
        let before = dock.stage();
        dock.move_to_side(Side::Right, 100.0).unwrap();
        dock.touch().unwrap();
        assert!(ui.pump_until(WAIT, |core| core.state() == DockState::Shown));
        assert_eq!(dock.side(), Side::Top);
        assert_eq!(dock.stage().x, before.x);
        close(dock, ui);
    }

    #[test]
    fn relative_placement_follows_content_size() {
        let (dock, mut ui) = build(DockBuilder::new(SCREEN, strip()).initial_show(false));
        dock.change_content(|items: &mut Vec<Item>| items.push(Item::new("mail"))).unwrap();
        assert!(ui.pump_until(WAIT, |core| core.view().items().len() == 3));
        let stage = dock.stage();
        assert_eq!(stage.width, 24.0);
        assert_eq!(stage.x, (1920.0 - 24.0) / 2.0);
        assert_eq!(stage.y, -4.0);
        close(dock, ui);
    }

    #[test]
    fn snapshot_sink_sees_moves() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink: SnapshotSink = {
            let seen = Arc::clone(&seen);
            Arc::new(move |snapshot: &DockSnapshot| seen.lock().push(snapshot.clone()))
        };
        let (dock, mut ui) = build(DockBuilder::new(SCREEN, strip()).initial_show(false).snapshot_sink(sink));
        dock.move_to_side(Side::Bottom, 40.0).unwrap();
        assert!(ui.pump_until(WAIT, |core| core.side() == Side::Bottom));
        let last = seen.lock().last().cloned().unwrap();
        assert_eq!(
            last.position(),
            Position::Absolute {
                side: Side::Bottom,
                coordinate: 40.0
            }
        );
        dock.set_pinned(true);
        assert!(seen.lock().last().unwrap().pinned);
        close(dock, ui);
    }

    #[test]
    fn closed_dock_refuses_commands() {
        let (dock, ui) = build(DockBuilder::new(SCREEN, strip()).initial_show(false));
        drop(ui);
        dock.close();
        assert!(dock.is_closed());
        assert!(dock.touch().is_err());
        assert!(dock.move_to(1.0).is_err());
    }
}

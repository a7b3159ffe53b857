//! UI-thread half of a dock: owns the content view and the animation, and
//! is the only place the stage rectangle is ever written.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use super::{DockProperties, PointerSource};
use crate::animation::{AnimationEvent, ShowHideAnimation};
use crate::areas::{
    docking_coordinate, hidden_offset, shown_offset, sliding_coordinate, sliding_extent, with_docking, with_sliding,
};
use crate::command::{Command, Mutation, SessionDirective};
use crate::constants::MOVING_BLOCK;
use crate::content::ContentView;
use crate::docking::{DockGeometry, DockingController, MoveDecision, MoveRequest, SideSwitch};
use crate::error::DockResult;
use crate::gate::Gate;
use crate::geometry::{Point, Rect, Screen, Side, SideMarkers, Size};
use crate::position::{CurrentPosition, RelativePosition, clamp_coordinate};
use crate::queue::CommandQueue;
use crate::session::{Session, TouchKind};
use crate::state::DockState;

#[derive(Debug, Clone, Copy, PartialEq)]
enum MoveTarget {
    Absolute { side: Side, coordinate: f64 },
    Relative(RelativePosition),
}

pub struct DockCore<V: ContentView> {
    pub(super) name: String,
    pub(super) controller: DockingController,
    pub(super) view: V,
    pub(super) props: DockProperties,
    pub(super) markers: SideMarkers,
    pub(super) relative: Option<RelativePosition>,
    pub(super) content_visible: bool,
    pub(super) draggable: bool,
    pub(super) animation: ShowHideAnimation,
    pub(super) gate: Arc<Gate>,
    pub(super) session: Session<DockCore<V>>,
    pub(super) queue: Arc<CommandQueue<Command<V::Content>>>,
    /// Pointer offset inside the stage while a drag is in progress.
    pub(super) grab: Option<Point>,
    pub(super) pointer: Arc<dyn PointerSource>,
}

impl<V: ContentView> std::fmt::Debug for DockCore<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DockCore")
            .field("name", &self.name)
            .field("stage", &self.stage())
            .field("side", &self.side())
            .field("state", &self.state())
            .field("relative", &self.relative)
            .field("content_visible", &self.content_visible)
            .field("draggable", &self.draggable)
            .finish()
    }
}

impl<V: ContentView> DockCore<V> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn screen(&self) -> Screen {
        self.controller.screen()
    }

    pub fn stage(&self) -> Rect {
        self.props.stage.get()
    }

    pub fn side(&self) -> Side {
        self.props.side.get()
    }

    pub fn state(&self) -> DockState {
        self.props.state.get()
    }

    pub fn position(&self) -> CurrentPosition {
        self.props.position.get()
    }

    pub fn markers(&self) -> SideMarkers {
        self.markers
    }

    pub fn relative(&self) -> Option<RelativePosition> {
        self.relative
    }

    pub fn is_pinned(&self) -> bool {
        self.props.pinned.get()
    }

    pub fn is_content_visible(&self) -> bool {
        self.content_visible
    }

    pub fn is_draggable(&self) -> bool {
        self.draggable
    }

    pub fn is_dragging(&self) -> bool {
        self.grab.is_some()
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_animating()
    }

    /// Advances a running show or hide transition to the clock's time.
    pub fn tick(&mut self) {
        let events = self.animation.tick();
        self.apply_events(events);
    }

    /// Applies one dequeued command. Runs on the UI thread.
    pub fn apply(&mut self, command: Command<V::Content>) {
        trace!(dock = %self.name, kind = command.kind(), "applying command");
        match command {
            Command::ContentChange(mutation) => self.change_content(mutation),
            Command::Session(directive) => self.apply_directive(directive),
            command => self.apply_move(command),
        }
    }

    /// Starts a pointer drag grabbing the stage at `pointer`. Refused while
    /// pinned or during a transition.
    pub fn begin_drag(&mut self, pointer: Point) -> bool {
        if !self.draggable || self.is_pinned() {
            return false;
        }
        let stage = self.stage();
        self.grab = Some(Point::new(pointer.x - stage.x, pointer.y - stage.y));
        self.session.block(MOVING_BLOCK, None);
        debug!(dock = %self.name, ?pointer, "drag started");
        true
    }

    pub fn drag_to(&mut self, pointer: Point) -> DockResult<()> {
        let Some(grab) = self.grab else {
            return Ok(());
        };
        let current = self.geometry();
        let request = MoveRequest::by_pointer(pointer.x - grab.x, pointer.y - grab.y, pointer);
        let controller = self.controller;
        if let MoveDecision::Apply { x, y, side } = controller.intercept(current, request, self)? {
            self.place(x, y, side);
            self.relative = None;
            self.publish_position();
        }
        Ok(())
    }

    pub fn end_drag(&mut self) {
        if self.grab.take().is_none() {
            return;
        }
        debug!(dock = %self.name, stage = ?self.stage(), "drag finished");
        self.session.unblock(MOVING_BLOCK);
        self.publish_position();
    }

    pub(super) fn on_activated(&mut self, kind: TouchKind) {
        debug!(dock = %self.name, ?kind, "dock activated");
        self.show();
    }

    pub(super) fn on_deactivated(&mut self) {
        if self.is_hovered() {
            debug!(dock = %self.name, "pointer still over the dock, keeping it up");
            self.session.keep_alive();
            return;
        }
        self.hide();
    }

    fn show(&mut self) {
        if matches!(self.state(), DockState::Shown | DockState::Showing) {
            return;
        }
        self.content_visible = true;
        let (hidden, shown) = self.docking_targets();
        let events = self.animation.show(hidden, shown);
        self.apply_events(events);
    }

    fn hide(&mut self) {
        if matches!(self.state(), DockState::Hidden | DockState::Hiding) {
            return;
        }
        let (hidden, shown) = self.docking_targets();
        let events = self.animation.hide(hidden, shown);
        self.apply_events(events);
    }

    fn apply_events(&mut self, events: Vec<AnimationEvent>) {
        for event in events {
            match event {
                AnimationEvent::ShowingBegins => self.begin_transition(DockState::Showing),
                AnimationEvent::HidingBegins => self.begin_transition(DockState::Hiding),
                AnimationEvent::ShowingFinished => self.end_transition(DockState::Shown),
                AnimationEvent::HidingFinished => {
                    self.content_visible = false;
                    self.end_transition(DockState::Hidden);
                }
                AnimationEvent::Value(value) => {
                    let side = self.side();
                    self.props
                        .stage
                        .update(|stage| *stage = with_docking(*stage, side, value));
                }
            }
        }
    }

    fn begin_transition(&mut self, state: DockState) {
        self.gate.forbid();
        self.draggable = false;
        self.props.state.set(state);
        trace!(dock = %self.name, state = state.label(), "transition started");
    }

    fn end_transition(&mut self, state: DockState) {
        self.props.state.set(state);
        // The content may have been resized while the tween ran.
        let side = self.side();
        let offset = self.docking_offset(side, self.view.size());
        self.props
            .stage
            .update(|stage| *stage = with_docking(*stage, side, offset));
        self.animation.sync_value(offset);
        self.draggable = true;
        self.gate.allow();
        debug!(dock = %self.name, state = state.label(), "transition finished");
    }

    fn apply_move(&mut self, command: Command<V::Content>) {
        if self.is_pinned() {
            debug!(dock = %self.name, ?command, "move dropped, dock is pinned");
            return;
        }
        if self.state().is_in_move() {
            debug!(dock = %self.name, ?command, "dock in transition, move re-queued");
            if self.queue.requeue(command).is_err() {
                debug!(dock = %self.name, "queue closed, move dropped");
            }
            return;
        }
        let target = match command {
            Command::Move { side, coordinate } => MoveTarget::Absolute {
                side: side.unwrap_or_else(|| self.side()),
                coordinate,
            },
            Command::MoveRelative(relative) => MoveTarget::Relative(relative),
            Command::ContentChange(_) | Command::Session(_) => return,
        };
        self.move_to(target);
    }

    fn move_to(&mut self, target: MoveTarget) {
        let (side, relative) = match target {
            MoveTarget::Absolute { side, .. } => (side, None),
            MoveTarget::Relative(relative) => (relative.side(), Some(relative)),
        };
        let switched = (side != self.side()).then_some(side);
        let size = match switched {
            Some(side) => self.prepare_side(side),
            None => self.view.size(),
        };
        let coordinate = match target {
            MoveTarget::Absolute { coordinate, .. } => coordinate,
            MoveTarget::Relative(relative) => {
                relative.coordinate(self.screen().sliding_extent(side), sliding_extent(size, side))
            }
        };
        let proposed = Rect::from_parts(Point::default(), size);
        let proposed = with_sliding(proposed, side, coordinate);
        let proposed = with_docking(proposed, side, self.docking_offset(side, size));

        let current = DockGeometry {
            side,
            stage: proposed,
            pinned: self.is_pinned(),
        };
        let controller = self.controller;
        match controller.intercept(current, MoveRequest::programmatic(proposed.x, proposed.y), self) {
            Ok(MoveDecision::Apply { x, y, .. }) => self.place(x, y, switched),
            Ok(MoveDecision::Ignore) => {}
            Err(err) => warn!(dock = %self.name, %err, "move rejected"),
        }
        self.relative = relative;
        self.publish_position();
    }

    fn change_content(&mut self, mutation: Mutation<V::Content>) {
        let size = self.view.apply(mutation);
        self.relayout(size);
    }

    /// Re-positions after a size change: keeps the dock on screen, re-applies
    /// a relative placement and keeps it flush with (or hidden behind) its
    /// edge. A running transition keeps the docking axis.
    fn relayout(&mut self, size: Size) {
        let side = self.side();
        let stage = self.stage();
        let limit = self.screen().sliding_extent(side);
        let extent = sliding_extent(size, side);
        let sliding = match self.relative {
            Some(relative) => relative.on_side(side).coordinate(limit, extent),
            None => clamp_coordinate(sliding_coordinate(&stage, side), limit, extent),
        };
        let docking = if self.animation.is_animating() {
            docking_coordinate(&stage, side)
        } else {
            self.docking_offset(side, size)
        };
        let proposed = with_docking(with_sliding(stage.with_size(size), side, sliding), side, docking);

        let current = self.geometry();
        let controller = self.controller;
        match controller.intercept(current, MoveRequest::adjustment(proposed.x, proposed.y), self) {
            Ok(MoveDecision::Apply { x, y, .. }) => self.place(x, y, None),
            Ok(MoveDecision::Ignore) => {}
            Err(err) => warn!(dock = %self.name, %err, "adjustment rejected"),
        }
        self.publish_position();
    }

    fn apply_directive(&mut self, directive: SessionDirective) {
        let session = &self.session;
        match directive {
            SessionDirective::Touch => {
                session.touch(TouchKind::Programmatic);
            }
            SessionDirective::TouchAndBlock { name, ttl } => {
                session.touch_and_block(TouchKind::Programmatic, name, ttl);
            }
            SessionDirective::Block { name, ttl } => session.block(name, ttl),
            SessionDirective::Unblock(name) => {
                session.unblock(&name);
            }
            SessionDirective::UnblockAll => session.unblock_all(),
        }
    }

    /// Moves the stage to `(x, y)` at the view's current size, switching the
    /// side afterwards when asked to.
    fn place(&mut self, x: f64, y: f64, side: Option<Side>) {
        let size = self.view.size();
        let stage = Rect::new(x, y, size.width, size.height);
        self.props.stage.set(stage);
        if let Some(side) = side {
            self.props.side.set(side);
        }
        let side = self.side();
        self.animation.sync_value(docking_coordinate(&stage, side));
    }

    fn publish_position(&mut self) {
        let side = self.side();
        let position = CurrentPosition {
            side,
            coordinate: sliding_coordinate(&self.stage(), side),
            relative: self.relative.map(|relative| relative.on_side(side)),
        };
        if self.props.position.set(position) {
            debug!(dock = %self.name, %side, coordinate = position.coordinate, "dock position changed");
        }
    }

    fn geometry(&self) -> DockGeometry {
        DockGeometry {
            side: self.side(),
            stage: self.stage(),
            pinned: self.is_pinned(),
        }
    }

    fn docking_targets(&self) -> (f64, f64) {
        let screen = self.screen();
        let side = self.side();
        let size = self.view.size();
        (hidden_offset(&screen, side, size), shown_offset(&screen, side, size))
    }

    /// Docking coordinate a settled dock of `size` on `side` rests at.
    fn docking_offset(&self, side: Side, size: Size) -> f64 {
        let screen = self.screen();
        match self.state() {
            DockState::Shown | DockState::Showing => shown_offset(&screen, side, size),
            DockState::Hidden | DockState::Hiding => hidden_offset(&screen, side, size),
        }
    }

    fn is_hovered(&self) -> bool {
        self.pointer
            .pointer()
            .is_some_and(|point| self.stage().contains(point))
    }
}

impl<V: ContentView> SideSwitch for DockCore<V> {
    fn prepare_side(&mut self, side: Side) -> Size {
        self.markers = SideMarkers::for_side(side);
        self.view.set_markers(self.markers);
        self.view.adopt_side(side)
    }
}

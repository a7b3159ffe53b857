//! Touch, hidden and shown rectangles of the dock.
//!
//! Areas are derived on read from the live stage rectangle and side, so they
//! can never lag behind a move or a side switch.

use crate::constants::{HIDDEN_OVERSHOOT, TOUCH_STRIP_THICKNESS};
use crate::geometry::{Orientation, Point, Rect, Screen, Side, Size};
use crate::observe::Observable;

/// Coordinate of `rect` on the axis perpendicular to `side`'s edge.
pub fn docking_coordinate(rect: &Rect, side: Side) -> f64 {
    match side.orientation() {
        Orientation::Horizontal => rect.y,
        Orientation::Vertical => rect.x,
    }
}

/// Coordinate of `rect` along `side`'s edge.
pub fn sliding_coordinate(rect: &Rect, side: Side) -> f64 {
    match side.orientation() {
        Orientation::Horizontal => rect.x,
        Orientation::Vertical => rect.y,
    }
}

pub fn sliding_extent(size: Size, side: Side) -> f64 {
    match side.orientation() {
        Orientation::Horizontal => size.width,
        Orientation::Vertical => size.height,
    }
}

pub fn with_docking(rect: Rect, side: Side, value: f64) -> Rect {
    match side.orientation() {
        Orientation::Horizontal => rect.with_origin(rect.x, value),
        Orientation::Vertical => rect.with_origin(value, rect.y),
    }
}

pub fn with_sliding(rect: Rect, side: Side, value: f64) -> Rect {
    match side.orientation() {
        Orientation::Horizontal => rect.with_origin(value, rect.y),
        Orientation::Vertical => rect.with_origin(rect.x, value),
    }
}

/// Docking coordinate of a fully retracted dock: one overshoot past the edge.
pub fn hidden_offset(screen: &Screen, side: Side, size: Size) -> f64 {
    match side {
        Side::Top => -size.height - HIDDEN_OVERSHOOT,
        Side::Left => -size.width - HIDDEN_OVERSHOOT,
        Side::Right => screen.width + HIDDEN_OVERSHOOT,
        Side::Bottom => screen.height + HIDDEN_OVERSHOOT,
    }
}

/// Docking coordinate of a fully visible dock, flush with the edge.
pub fn shown_offset(screen: &Screen, side: Side, size: Size) -> f64 {
    match side {
        Side::Top | Side::Left => 0.0,
        Side::Right => screen.width - size.width,
        Side::Bottom => screen.height - size.height,
    }
}

pub fn touch_area(screen: &Screen, side: Side, stage: &Rect) -> Rect {
    let t = TOUCH_STRIP_THICKNESS;
    match side {
        Side::Top => Rect::new(stage.x, 0.0, stage.width, t),
        Side::Left => Rect::new(0.0, stage.y, t, stage.height),
        Side::Right => Rect::new(screen.width - t, stage.y, t, stage.height),
        Side::Bottom => Rect::new(stage.x, screen.height - t, stage.width, t),
    }
}

pub fn hidden_area(screen: &Screen, side: Side, stage: &Rect) -> Rect {
    with_docking(*stage, side, hidden_offset(screen, side, stage.size()))
}

pub fn shown_area(screen: &Screen, side: Side, stage: &Rect) -> Rect {
    with_docking(*stage, side, shown_offset(screen, side, stage.size()))
}

/// Live view of the three areas, readable from any thread.
#[derive(Debug, Clone)]
pub struct DockAreas {
    screen: Screen,
    stage: Observable<Rect>,
    side: Observable<Side>,
}

impl DockAreas {
    pub fn new(screen: Screen, stage: Observable<Rect>, side: Observable<Side>) -> Self {
        Self {
            screen,
            stage,
            side,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn side(&self) -> Side {
        self.side.get()
    }

    pub fn stage(&self) -> Rect {
        self.stage.get()
    }

    pub fn touch(&self) -> Rect {
        touch_area(&self.screen, self.side.get(), &self.stage.get())
    }

    pub fn hidden(&self) -> Rect {
        hidden_area(&self.screen, self.side.get(), &self.stage.get())
    }

    pub fn shown(&self) -> Rect {
        shown_area(&self.screen, self.side.get(), &self.stage.get())
    }

    pub fn is_in_touch(&self, point: Point) -> bool {
        self.touch().contains(point)
    }

    /// Whether the pointer is over the dock as it is drawn right now.
    pub fn is_over_dock(&self, point: Point) -> bool {
        self.stage.get().contains(point)
    }
}

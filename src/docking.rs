//! Decides where a proposed dock move really lands and whether it switches
//! the dock to another screen side.

use tracing::debug;

use crate::areas::{hidden_offset, shown_offset, sliding_extent};
use crate::error::{DockError, DockResult};
use crate::geometry::{Corner, Orientation, Point, Rect, Screen, ScreenArea, Side, Size};
use crate::position::clamp_coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveReason {
    /// The user drags the dock.
    ByPointer,
    /// A queued move command.
    Programmatic,
    /// Re-positioning after the dock changed size.
    Adjustment,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveRequest {
    /// Proposed stage origin.
    pub x: f64,
    pub y: f64,
    /// Pointer location driving the move; only meaningful for drags.
    pub pointer: Point,
    pub reason: MoveReason,
}

impl MoveRequest {
    pub fn programmatic(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            pointer: Point::new(x, y),
            reason: MoveReason::Programmatic,
        }
    }

    pub fn adjustment(x: f64, y: f64) -> Self {
        Self {
            reason: MoveReason::Adjustment,
            ..Self::programmatic(x, y)
        }
    }

    pub fn by_pointer(x: f64, y: f64, pointer: Point) -> Self {
        Self {
            x,
            y,
            pointer,
            reason: MoveReason::ByPointer,
        }
    }
}

/// What the controller needs to know about the dock before a move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DockGeometry {
    pub side: Side,
    pub stage: Rect,
    pub pinned: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveDecision {
    Ignore,
    /// Move the stage to `(x, y)`; when `side` is set the caller must make it
    /// the current side once the stage has moved.
    Apply { x: f64, y: f64, side: Option<Side> },
}

/// The part of a side switch that has to happen before the new coordinate
/// can be computed: markers first, then re-layout for the new orientation.
pub trait SideSwitch {
    /// Returns the dock size after the re-layout.
    fn prepare_side(&mut self, side: Side) -> Size;
}

#[derive(Debug, Clone, Copy)]
pub struct DockingController {
    screen: Screen,
}

impl DockingController {
    pub fn new(screen: Screen) -> Self {
        Self { screen }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Whether the whole stage lies within the screen.
    pub fn is_on_screen(&self, stage: &Rect) -> bool {
        self.screen.contains(stage.x, stage.y) && self.screen.contains(stage.right(), stage.bottom())
    }

    pub fn intercept(
        &self,
        current: DockGeometry,
        request: MoveRequest,
        switch: &mut dyn SideSwitch,
    ) -> DockResult<MoveDecision> {
        if current.pinned && request.reason != MoveReason::Adjustment {
            debug!(reason = ?request.reason, "move ignored, dock is pinned");
            return Ok(MoveDecision::Ignore);
        }
        match request.reason {
            MoveReason::Adjustment => Ok(MoveDecision::Apply {
                x: request.x,
                y: request.y,
                side: None,
            }),
            MoveReason::Programmatic => {
                let (x, y) = self.clamp_sliding(current.side, current.stage.size(), request.x, request.y);
                Ok(MoveDecision::Apply { x, y, side: None })
            }
            MoveReason::ByPointer if self.is_on_screen(&current.stage) => {
                Ok(self.on_screen(current, request, switch))
            }
            MoveReason::ByPointer => self.off_screen(current, request, switch),
        }
    }

    /// Drag of a visible dock: clamp into the screen, then stick to the side
    /// nearest the pointer unless the pointer is deep inside the screen.
    fn on_screen(&self, current: DockGeometry, request: MoveRequest, switch: &mut dyn SideSwitch) -> MoveDecision {
        let size = current.stage.size();
        let x = clamp_coordinate(request.x, self.screen.width, size.width);
        let y = clamp_coordinate(request.y, self.screen.height, size.height);

        let near = self.screen.nearest_side(request.pointer);
        if near.distance > self.active_distance(current.side, size) || near.side == current.side {
            let (x, y) = self.flush(current.side, size, x, y);
            return MoveDecision::Apply { x, y, side: None };
        }

        debug!(from = %current.side, to = %near.side, "dock switches side");
        let size = switch.prepare_side(near.side);
        let (x, y) = self.flush(near.side, size, x, y);
        MoveDecision::Apply {
            x,
            y,
            side: Some(near.side),
        }
    }

    /// Drag of a retracted dock: the pointer is outside the screen and picks
    /// the side; the dock stays pinned at that side's hidden offset.
    fn off_screen(
        &self,
        current: DockGeometry,
        request: MoveRequest,
        switch: &mut dyn SideSwitch,
    ) -> DockResult<MoveDecision> {
        let size = current.stage.size();
        let target = match self.screen.area_of(request.pointer) {
            ScreenArea::Inside => {
                return Err(DockError::PointerInsideScreen {
                    x: request.pointer.x,
                    y: request.pointer.y,
                });
            }
            ScreenArea::OutsideToSide(side) => side,
            ScreenArea::OutsideToCorner(corner) => self.closer_hidden_side(corner, request.pointer, size),
        };

        let (side, size, switched) = if target == current.side {
            (target, size, None)
        } else {
            debug!(from = %current.side, to = %target, "hidden dock switches side");
            (target, switch.prepare_side(target), Some(target))
        };
        let (x, y) = self.clamp_sliding(side, size, request.x, request.y);
        let (x, y) = set_docking(side, x, y, hidden_offset(&self.screen, side, size));
        Ok(MoveDecision::Apply { x, y, side: switched })
    }

    /// Distance from the screen edge within which a drag may switch sides:
    /// the dock's thickness plus its smaller dimension, at most half the
    /// screen across the current side.
    pub fn active_distance(&self, side: Side, size: Size) -> f64 {
        let thickness = match side.orientation() {
            Orientation::Horizontal => size.height,
            Orientation::Vertical => size.width,
        };
        (thickness + size.width.min(size.height)).min(self.screen.cross_extent(side) / 2.0)
    }

    /// Of the two sides meeting at `corner`, the one whose hidden line is
    /// closer to `pointer`.
    pub fn closer_hidden_side(&self, corner: Corner, pointer: Point, size: Size) -> Side {
        let (horizontal, vertical) = corner.sides();
        let to_horizontal = (pointer.y - hidden_offset(&self.screen, horizontal, size)).abs();
        let to_vertical = (pointer.x - hidden_offset(&self.screen, vertical, size)).abs();
        if to_vertical < to_horizontal {
            vertical
        } else {
            horizontal
        }
    }

    fn clamp_sliding(&self, side: Side, size: Size, x: f64, y: f64) -> (f64, f64) {
        let limit = self.screen.sliding_extent(side);
        let extent = sliding_extent(size, side);
        match side.orientation() {
            Orientation::Horizontal => (clamp_coordinate(x, limit, extent), y),
            Orientation::Vertical => (x, clamp_coordinate(y, limit, extent)),
        }
    }

    fn flush(&self, side: Side, size: Size, x: f64, y: f64) -> (f64, f64) {
        let (x, y) = self.clamp_sliding(side, size, x, y);
        set_docking(side, x, y, shown_offset(&self.screen, side, size))
    }
}

fn set_docking(side: Side, x: f64, y: f64, value: f64) -> (f64, f64) {
    match side.orientation() {
        Orientation::Horizontal => (x, value),
        Orientation::Vertical => (value, y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: Screen = Screen::new(1920.0, 1080.0);

    /// Rotates the dock on every switch: 200x40 along horizontal sides,
    /// 40x200 along vertical ones.
    #[derive(Default)]
    struct Rotating {
        prepared: Vec<Side>,
    }

    impl SideSwitch for Rotating {
        fn prepare_side(&mut self, side: Side) -> Size {
            self.prepared.push(side);
            if side.is_vertical() {
                Size::new(40.0, 200.0)
            } else {
                Size::new(200.0, 40.0)
            }
        }
    }

    fn top_shown() -> DockGeometry {
        DockGeometry {
            side: Side::Top,
            stage: Rect::new(860.0, 0.0, 200.0, 40.0),
            pinned: false,
        }
    }

    #[test]
    fn pinned_ignores_all_but_adjustments() {
        let controller = DockingController::new(SCREEN);
        let mut switch = Rotating::default();
        let pinned = DockGeometry {
            pinned: true,
            ..top_shown()
        };
        let decision = controller
            .intercept(pinned, MoveRequest::programmatic(10.0, 0.0), &mut switch)
            .unwrap();
        assert_eq!(decision, MoveDecision::Ignore);
        let decision = controller
            .intercept(pinned, MoveRequest::adjustment(10.0, 0.0), &mut switch)
            .unwrap();
        assert_eq!(
            decision,
            MoveDecision::Apply {
                x: 10.0,
                y: 0.0,
                side: None
            }
        );
    }

    #[test]
    fn programmatic_clamps_sliding_axis() {
        let controller = DockingController::new(SCREEN);
        let mut switch = Rotating::default();
        let decision = controller
            .intercept(top_shown(), MoveRequest::programmatic(5000.0, 0.0), &mut switch)
            .unwrap();
        assert_eq!(
            decision,
            MoveDecision::Apply {
                x: 1720.0,
                y: 0.0,
                side: None
            }
        );
        assert!(switch.prepared.is_empty());
    }

    #[test]
    fn drag_near_current_side_slides_flush() {
        let controller = DockingController::new(SCREEN);
        let mut switch = Rotating::default();
        let request = MoveRequest::by_pointer(400.0, 30.0, Point::new(500.0, 40.0));
        let decision = controller.intercept(top_shown(), request, &mut switch).unwrap();
        assert_eq!(
            decision,
            MoveDecision::Apply {
                x: 400.0,
                y: 0.0,
                side: None
            }
        );
    }

    #[test]
    fn drag_towards_right_edge_switches_side() {
        let controller = DockingController::new(SCREEN);
        let mut switch = Rotating::default();
        let request = MoveRequest::by_pointer(1800.0, 500.0, Point::new(1910.0, 520.0));
        let decision = controller.intercept(top_shown(), request, &mut switch).unwrap();
        assert_eq!(
            decision,
            MoveDecision::Apply {
                x: 1880.0,
                y: 500.0,
                side: Some(Side::Right)
            }
        );
        assert_eq!(switch.prepared, vec![Side::Right]);
    }

    #[test]
    fn dead_zone_never_switches() {
        let controller = DockingController::new(SCREEN);
        let mut switch = Rotating::default();
        let request = MoveRequest::by_pointer(900.0, 500.0, Point::new(960.0, 540.0));
        let decision = controller.intercept(top_shown(), request, &mut switch).unwrap();
        assert_eq!(
            decision,
            MoveDecision::Apply {
                x: 900.0,
                y: 0.0,
                side: None
            }
        );
        assert!(switch.prepared.is_empty());
    }

    #[test]
    fn active_distance_is_capped() {
        let controller = DockingController::new(Screen::new(300.0, 100.0));
        assert_eq!(controller.active_distance(Side::Top, Size::new(200.0, 40.0)), 50.0);
        let controller = DockingController::new(SCREEN);
        assert_eq!(controller.active_distance(Side::Top, Size::new(200.0, 40.0)), 80.0);
    }

    #[test]
    fn off_screen_drag_pins_hidden_offset() {
        let controller = DockingController::new(SCREEN);
        let mut switch = Rotating::default();
        let hidden = DockGeometry {
            stage: Rect::new(860.0, -41.0, 200.0, 40.0),
            ..top_shown()
        };
        let request = MoveRequest::by_pointer(-50.0, -30.0, Point::new(300.0, -5.0));
        let decision = controller.intercept(hidden, request, &mut switch).unwrap();
        assert_eq!(
            decision,
            MoveDecision::Apply {
                x: 0.0,
                y: -41.0,
                side: None
            }
        );
    }

    #[test]
    fn off_screen_corner_picks_closer_hidden_side() {
        let controller = DockingController::new(SCREEN);
        let mut switch = Rotating::default();
        let hidden = DockGeometry {
            stage: Rect::new(860.0, -41.0, 200.0, 40.0),
            ..top_shown()
        };
        // top hidden line is 39 away, left hidden line 156 away
        let request = MoveRequest::by_pointer(-45.0, -2.0, Point::new(-45.0, -2.0));
        let decision = controller.intercept(hidden, request, &mut switch).unwrap();
        assert!(matches!(decision, MoveDecision::Apply { side: None, .. }));

        // top hidden line is 59 away, left hidden line 11 away
        let request = MoveRequest::by_pointer(-190.0, 30.0, Point::new(-190.0, -100.0));
        let decision = controller.intercept(hidden, request, &mut switch).unwrap();
        assert_eq!(
            decision,
            MoveDecision::Apply {
                x: -41.0,
                y: 30.0,
                side: Some(Side::Left)
            }
        );
    }

    #[test]
    fn off_screen_drag_with_pointer_inside_is_an_error() {
        let controller = DockingController::new(SCREEN);
        let mut switch = Rotating::default();
        let hidden = DockGeometry {
            stage: Rect::new(860.0, -41.0, 200.0, 40.0),
            ..top_shown()
        };
        let request = MoveRequest::by_pointer(0.0, 0.0, Point::new(100.0, 100.0));
        assert!(matches!(
            controller.intercept(hidden, request, &mut switch),
            Err(DockError::PointerInsideScreen { .. })
        ));
    }
}

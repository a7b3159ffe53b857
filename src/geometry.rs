//! Plain geometry values: screen sides, points, rectangles and the screen
//! classification helpers the docking controller relies on.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// The dock runs along the x axis (TOP / BOTTOM).
    Horizontal,
    /// The dock runs along the y axis (LEFT / RIGHT).
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Left,
    Right,
    Bottom,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Top, Side::Left, Side::Right, Side::Bottom];

    pub const fn orientation(self) -> Orientation {
        match self {
            Side::Top | Side::Bottom => Orientation::Horizontal,
            Side::Left | Side::Right => Orientation::Vertical,
        }
    }

    pub const fn is_vertical(self) -> bool {
        matches!(self.orientation(), Orientation::Vertical)
    }

    /// Style class name a view can attach for this side.
    pub const fn class_name(self) -> &'static str {
        match self {
            Side::Top => "top",
            Side::Left => "left",
            Side::Right => "right",
            Side::Bottom => "bottom",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.class_name())
    }
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "top" => Ok(Side::Top),
            "left" => Ok(Side::Left),
            "right" => Ok(Side::Right),
            "bottom" => Ok(Side::Bottom),
            other => Err(format!("unknown side `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    /// The two sides meeting at this corner, horizontal side first.
    pub const fn sides(self) -> (Side, Side) {
        match self {
            Corner::TopLeft => (Side::Top, Side::Left),
            Corner::TopRight => (Side::Top, Side::Right),
            Corner::BottomLeft => (Side::Bottom, Side::Left),
            Corner::BottomRight => (Side::Bottom, Side::Right),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_parts(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Inclusive on all four edges, so a 1-unit strip along the screen border
    /// still catches a pointer resting on the border itself.
    pub fn contains(&self, point: Point) -> bool {
        self.x <= point.x && point.x <= self.right() && self.y <= point.y && point.y <= self.bottom()
    }

    pub fn with_origin(self, x: f64, y: f64) -> Self {
        Self { x, y, ..self }
    }

    pub fn with_size(self, size: Size) -> Self {
        Self {
            width: size.width,
            height: size.height,
            ..self
        }
    }
}

/// Where a point lies relative to the screen rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScreenArea {
    Inside,
    OutsideToSide(Side),
    OutsideToCorner(Corner),
}

/// Nearest screen side to a point inside the screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointToSide {
    pub side: Side,
    pub distance: f64,
}

/// The single rectangular screen the dock lives on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Screen {
    pub width: f64,
    pub height: f64,
}

impl Screen {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        (0.0..=self.width).contains(&x) && (0.0..=self.height).contains(&y)
    }

    /// Length of the screen along the axis the dock slides on for `side`.
    pub fn sliding_extent(&self, side: Side) -> f64 {
        match side.orientation() {
            Orientation::Horizontal => self.width,
            Orientation::Vertical => self.height,
        }
    }

    /// Length of the screen across the docking axis for `side`.
    pub fn cross_extent(&self, side: Side) -> f64 {
        match side.orientation() {
            Orientation::Horizontal => self.height,
            Orientation::Vertical => self.width,
        }
    }

    pub fn area_of(&self, point: Point) -> ScreenArea {
        let left = point.x < 0.0;
        let right = point.x > self.width;
        let top = point.y < 0.0;
        let bottom = point.y > self.height;
        match (top, bottom, left, right) {
            (true, _, true, _) => ScreenArea::OutsideToCorner(Corner::TopLeft),
            (true, _, _, true) => ScreenArea::OutsideToCorner(Corner::TopRight),
            (_, true, true, _) => ScreenArea::OutsideToCorner(Corner::BottomLeft),
            (_, true, _, true) => ScreenArea::OutsideToCorner(Corner::BottomRight),
            (true, _, _, _) => ScreenArea::OutsideToSide(Side::Top),
            (_, true, _, _) => ScreenArea::OutsideToSide(Side::Bottom),
            (_, _, true, _) => ScreenArea::OutsideToSide(Side::Left),
            (_, _, _, true) => ScreenArea::OutsideToSide(Side::Right),
            _ => ScreenArea::Inside,
        }
    }

    /// Nearest side to a point inside the screen. Ties resolve in
    /// [`Side::ALL`] order.
    pub fn nearest_side(&self, point: Point) -> PointToSide {
        let x = point.x.clamp(0.0, self.width);
        let y = point.y.clamp(0.0, self.height);
        let candidates = [
            (Side::Top, y),
            (Side::Left, x),
            (Side::Right, self.width - x),
            (Side::Bottom, self.height - y),
        ];
        let mut best = PointToSide {
            side: Side::Top,
            distance: f64::INFINITY,
        };
        for (side, distance) in candidates {
            if distance < best.distance {
                best = PointToSide { side, distance };
            }
        }
        best
    }
}

/// Which side markers are active; the pure replacement for a per-side
/// lookup table. Exactly one marker is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SideMarkers {
    pub top: bool,
    pub left: bool,
    pub right: bool,
    pub bottom: bool,
}

impl SideMarkers {
    pub const fn for_side(side: Side) -> Self {
        Self {
            top: matches!(side, Side::Top),
            left: matches!(side, Side::Left),
            right: matches!(side, Side::Right),
            bottom: matches!(side, Side::Bottom),
        }
    }

    pub fn is_active(&self, side: Side) -> bool {
        match side {
            Side::Top => self.top,
            Side::Left => self.left,
            Side::Right => self.right,
            Side::Bottom => self.bottom,
        }
    }

    /// `(class name, active)` pairs in [`Side::ALL`] order.
    pub fn entries(&self) -> [(&'static str, bool); 4] {
        Side::ALL.map(|side| (side.class_name(), self.is_active(side)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientation_per_side() {
        assert_eq!(Side::Top.orientation(), Orientation::Horizontal);
        assert_eq!(Side::Bottom.orientation(), Orientation::Horizontal);
        assert!(Side::Left.is_vertical());
        assert!(Side::Right.is_vertical());
    }

    #[test]
    fn area_of_classifies_sides_and_corners() {
        let screen = Screen::new(100.0, 50.0);
        assert_eq!(screen.area_of(Point::new(10.0, 10.0)), ScreenArea::Inside);
        assert_eq!(
            screen.area_of(Point::new(50.0, -3.0)),
            ScreenArea::OutsideToSide(Side::Top)
        );
        assert_eq!(
            screen.area_of(Point::new(101.0, 20.0)),
            ScreenArea::OutsideToSide(Side::Right)
        );
        assert_eq!(
            screen.area_of(Point::new(-1.0, 60.0)),
            ScreenArea::OutsideToCorner(Corner::BottomLeft)
        );
        assert_eq!(
            screen.area_of(Point::new(120.0, -5.0)),
            ScreenArea::OutsideToCorner(Corner::TopRight)
        );
    }

    #[test]
    fn nearest_side_picks_smallest_distance() {
        let screen = Screen::new(1920.0, 1080.0);
        let near = screen.nearest_side(Point::new(1900.0, 500.0));
        assert_eq!(near.side, Side::Right);
        assert_eq!(near.distance, 20.0);
        let near = screen.nearest_side(Point::new(900.0, 1070.0));
        assert_eq!(near.side, Side::Bottom);
    }

    #[test]
    fn markers_have_exactly_one_active_side() {
        for side in Side::ALL {
            let markers = SideMarkers::for_side(side);
            let entries = markers.entries();
            let active: Vec<_> = entries.iter().filter(|(_, on)| *on).collect();
            assert_eq!(active.len(), 1);
            assert_eq!(active[0].0, side.class_name());
        }
    }

    #[test]
    fn side_parses_case_insensitively() {
        assert_eq!("RIGHT".parse::<Side>(), Ok(Side::Right));
        assert!("middle".parse::<Side>().is_err());
    }
}

use serde::{Deserialize, Serialize};

use crate::geometry::Side;

/// Symbolic placement along a side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Place {
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelativePosition {
    TopCenter,
    LeftCenter,
    RightCenter,
    BottomCenter,
}

impl RelativePosition {
    pub const fn new(side: Side, place: Place) -> Self {
        match (side, place) {
            (Side::Top, Place::Center) => RelativePosition::TopCenter,
            (Side::Left, Place::Center) => RelativePosition::LeftCenter,
            (Side::Right, Place::Center) => RelativePosition::RightCenter,
            (Side::Bottom, Place::Center) => RelativePosition::BottomCenter,
        }
    }

    pub const fn side(self) -> Side {
        match self {
            RelativePosition::TopCenter => Side::Top,
            RelativePosition::LeftCenter => Side::Left,
            RelativePosition::RightCenter => Side::Right,
            RelativePosition::BottomCenter => Side::Bottom,
        }
    }

    pub const fn place(self) -> Place {
        Place::Center
    }

    /// Same placement carried over to another side.
    pub const fn on_side(self, side: Side) -> Self {
        Self::new(side, self.place())
    }

    /// Sliding-axis coordinate realising this placement for a dock of
    /// `dock_extent` on a side of `screen_extent`.
    pub fn coordinate(self, screen_extent: f64, dock_extent: f64) -> f64 {
        match self.place() {
            Place::Center => ((screen_extent - dock_extent) / 2.0).max(0.0),
        }
    }
}

/// Where the dock is asked to sit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Absolute { side: Side, coordinate: f64 },
    Relative(RelativePosition),
}

impl Position {
    pub fn side(&self) -> Side {
        match self {
            Position::Absolute { side, .. } => *side,
            Position::Relative(relative) => relative.side(),
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::Relative(RelativePosition::TopCenter)
    }
}

impl From<RelativePosition> for Position {
    fn from(value: RelativePosition) -> Self {
        Position::Relative(value)
    }
}

/// Where the dock actually is. `relative` remembers the placement that
/// produced `coordinate` so it can be re-applied after side switches and
/// content resizes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrentPosition {
    pub side: Side,
    pub coordinate: f64,
    pub relative: Option<RelativePosition>,
}

impl CurrentPosition {
    pub fn absolute(side: Side, coordinate: f64) -> Self {
        Self {
            side,
            coordinate,
            relative: None,
        }
    }

    pub fn has_relative(&self) -> bool {
        self.relative.is_some()
    }
}

impl From<CurrentPosition> for Position {
    fn from(value: CurrentPosition) -> Self {
        match value.relative {
            Some(relative) => Position::Relative(relative),
            None => Position::Absolute {
                side: value.side,
                coordinate: value.coordinate,
            },
        }
    }
}

/// Clamps a sliding-axis coordinate so the dock stays fully on screen.
pub fn clamp_coordinate(coordinate: f64, screen_extent: f64, dock_extent: f64) -> f64 {
    coordinate.clamp(0.0, (screen_extent - dock_extent).max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_maps_sides_both_ways() {
        for side in Side::ALL {
            let relative = RelativePosition::new(side, Place::Center);
            assert_eq!(relative.side(), side);
        }
        assert_eq!(
            RelativePosition::TopCenter.on_side(Side::Left),
            RelativePosition::LeftCenter
        );
    }

    #[test]
    fn center_coordinate() {
        assert_eq!(RelativePosition::TopCenter.coordinate(1920.0, 200.0), 860.0);
        // never negative when the dock is wider than the screen
        assert_eq!(RelativePosition::TopCenter.coordinate(100.0, 200.0), 0.0);
    }

    #[test]
    fn clamp_keeps_dock_on_screen() {
        assert_eq!(clamp_coordinate(-5.0, 1080.0, 200.0), 0.0);
        assert_eq!(clamp_coordinate(2000.0, 1080.0, 200.0), 880.0);
        assert_eq!(clamp_coordinate(300.0, 1080.0, 200.0), 300.0);
    }

    #[test]
    fn current_position_converts_back() {
        let current = CurrentPosition {
            side: Side::Right,
            coordinate: 440.0,
            relative: Some(RelativePosition::RightCenter),
        };
        assert_eq!(
            Position::from(current),
            Position::Relative(RelativePosition::RightCenter)
        );
        let current = CurrentPosition::absolute(Side::Right, 300.0);
        assert!(!current.has_relative());
        assert_eq!(
            Position::from(current),
            Position::Absolute {
                side: Side::Right,
                coordinate: 300.0
            }
        );
    }

    #[test]
    fn position_json_shape() {
        let json = serde_json::to_string(&Position::Absolute {
            side: Side::Left,
            coordinate: 12.0,
        })
        .unwrap();
        assert_eq!(json, r#"{"absolute":{"side":"left","coordinate":12.0}}"#);
        let back: Position = serde_json::from_str(&json).unwrap();
        assert_eq!(back.side(), Side::Left);
        let relative: Position = serde_json::from_str(r#"{"relative":"bottom-center"}"#).unwrap();
        assert_eq!(relative, Position::Relative(RelativePosition::BottomCenter));
    }
}

//! What the dock shows, and how it lays itself out per side.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::warn;

use crate::command::Mutation;
use crate::error::panic_message;
use crate::geometry::{Orientation, Rect, Side, SideMarkers, Size};

/// The dock's content as the dock sees it: something that can be re-laid
/// out for a side, mutated, and told which side markers are active.
pub trait ContentView: Send + 'static {
    type Content: 'static;

    /// Re-lays the content out for `side`; returns the resulting dock size.
    fn adopt_side(&mut self, side: Side) -> Size;

    /// Applies `mutation`; returns the resulting dock size.
    fn apply(&mut self, mutation: Mutation<Self::Content>) -> Size;

    fn set_markers(&mut self, markers: SideMarkers);

    fn size(&self) -> Size;
}

type ItemAction = Arc<dyn Fn() -> Result<(), String> + Send + Sync>;

/// One entry of an [`ItemStrip`].
#[derive(Clone)]
pub struct Item {
    pub name: String,
    action: Option<ItemAction>,
}

impl std::fmt::Debug for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Item")
            .field("name", &self.name)
            .field("runnable", &self.action.is_some())
            .finish()
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Item {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action: None,
        }
    }

    pub fn with_action(mut self, action: impl Fn() -> Result<(), String> + Send + Sync + 'static) -> Self {
        self.action = Some(Arc::new(action));
        self
    }

    /// Runs the item's action. Failures, panics included, come back as the
    /// error message and never reach the dock.
    pub fn run(&self) -> Result<(), String> {
        let Some(action) = &self.action else {
            return Ok(());
        };
        match catch_unwind(AssertUnwindSafe(|| action())) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(message)) => {
                warn!(item = %self.name, "item failed: {message}");
                Err(message)
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(item = %self.name, "item panicked: {message}");
                Err(message)
            }
        }
    }

    /// Extent of the item along the direction items run.
    fn length(&self) -> f64 {
        self.name.chars().count() as f64 + 2.0
    }
}

/// Whether items run along the docked edge or across it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    ParallelToSide,
    PerpendicularToSide,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StripMetrics {
    /// Extent of one item across the direction items run.
    pub thickness: f64,
    pub gap: f64,
    pub padding: f64,
}

impl Default for StripMetrics {
    fn default() -> Self {
        Self {
            thickness: 3.0,
            gap: 1.0,
            padding: 1.0,
        }
    }
}

/// Labels laid out in a row or column, one cell per character.
#[derive(Debug, Clone)]
pub struct ItemStrip {
    items: Vec<Item>,
    alignment: Alignment,
    metrics: StripMetrics,
    side: Side,
    markers: SideMarkers,
    size: Size,
}

impl ItemStrip {
    pub fn new(items: Vec<Item>) -> Self {
        Self::with_layout(items, Alignment::default(), StripMetrics::default())
    }

    pub fn with_layout(items: Vec<Item>, alignment: Alignment, metrics: StripMetrics) -> Self {
        let mut strip = Self {
            items,
            alignment,
            metrics,
            side: Side::Top,
            markers: SideMarkers::for_side(Side::Top),
            size: Size::default(),
        };
        strip.size = strip.measure();
        strip
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn markers(&self) -> SideMarkers {
        self.markers
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    /// Whether items currently run horizontally.
    pub fn runs_horizontally(&self) -> bool {
        matches!(
            (self.side.orientation(), self.alignment),
            (Orientation::Horizontal, Alignment::ParallelToSide)
                | (Orientation::Vertical, Alignment::PerpendicularToSide)
        )
    }

    /// Item rectangles relative to the dock's origin.
    pub fn item_rects(&self) -> Vec<(Rect, &Item)> {
        let StripMetrics {
            thickness,
            gap,
            padding,
        } = self.metrics;
        let horizontal = self.runs_horizontally();
        let mut offset = padding;
        self.items
            .iter()
            .map(|item| {
                let length = item.length();
                let rect = if horizontal {
                    Rect::new(offset, 0.0, length, thickness)
                } else {
                    Rect::new(0.0, offset, thickness, length)
                };
                offset += length + gap;
                (rect, item)
            })
            .collect()
    }

    /// Runs the item at `index`; unknown indices are an error message too.
    pub fn invoke(&self, index: usize) -> Result<(), String> {
        match self.items.get(index) {
            Some(item) => item.run(),
            None => Err(format!("no item at {index}")),
        }
    }

    fn measure(&self) -> Size {
        let StripMetrics {
            thickness,
            gap,
            padding,
        } = self.metrics;
        let lengths: f64 = self.items.iter().map(Item::length).sum();
        let gaps = gap * self.items.len().saturating_sub(1) as f64;
        let run = (lengths + gaps + 2.0 * padding).max(1.0);
        if self.runs_horizontally() {
            Size::new(run, thickness)
        } else {
            Size::new(thickness, run)
        }
    }
}

impl ContentView for ItemStrip {
    type Content = Vec<Item>;

    fn adopt_side(&mut self, side: Side) -> Size {
        self.side = side;
        self.size = self.measure();
        self.size
    }

    fn apply(&mut self, mutation: Mutation<Vec<Item>>) -> Size {
        mutation(&mut self.items);
        self.size = self.measure();
        self.size
    }

    fn set_markers(&mut self, markers: SideMarkers) {
        self.markers = markers;
    }

    fn size(&self) -> Size {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip() -> ItemStrip {
        ItemStrip::new(vec![Item::new("one"), Item::new("three")])
    }

    #[test]
    fn parallel_strip_rotates_with_side() {
        let mut strip = strip();
        // (3+2) + (5+2) + gap 1 + padding 2
        assert_eq!(strip.size(), Size::new(15.0, 3.0));
        assert_eq!(strip.adopt_side(Side::Left), Size::new(3.0, 15.0));
        assert_eq!(strip.adopt_side(Side::Bottom), Size::new(15.0, 3.0));
    }

    #[test]
    fn perpendicular_strip_runs_across_the_edge() {
        let mut strip = ItemStrip::with_layout(
            vec![Item::new("a")],
            Alignment::PerpendicularToSide,
            StripMetrics::default(),
        );
        assert_eq!(strip.adopt_side(Side::Top), Size::new(3.0, 5.0));
        assert_eq!(strip.adopt_side(Side::Right), Size::new(5.0, 3.0));
    }

    #[test]
    fn apply_mutates_and_remeasures() {
        let mut strip = strip();
        let size = strip.apply(Box::new(|items: &mut Vec<Item>| items.push(Item::new("x"))));
        assert_eq!(size, Size::new(19.0, 3.0));
        assert_eq!(strip.items().len(), 3);
    }

    #[test]
    fn item_rects_follow_orientation() {
        let mut strip = strip();
        let rects: Vec<Rect> = strip.item_rects().into_iter().map(|(r, _)| r).collect();
        assert_eq!(rects[0], Rect::new(1.0, 0.0, 5.0, 3.0));
        assert_eq!(rects[1], Rect::new(7.0, 0.0, 7.0, 3.0));
        strip.adopt_side(Side::Right);
        let (first, _) = strip.item_rects()[0];
        assert_eq!(first, Rect::new(0.0, 1.0, 3.0, 5.0));
    }

    #[test]
    fn failing_items_report_without_panicking() {
        let strip = ItemStrip::new(vec![
            Item::new("ok").with_action(|| Ok(())),
            Item::new("err").with_action(|| Err("disk full".to_string())),
            Item::new("boom").with_action(|| panic!("exploded")),
        ]);
        assert_eq!(strip.invoke(0), Ok(()));
        assert_eq!(strip.invoke(1), Err("disk full".to_string()));
        assert_eq!(strip.invoke(2), Err("exploded".to_string()));
        assert!(strip.invoke(9).is_err());
    }
}

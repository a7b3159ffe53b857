#![allow(dead_code)]

use std::time::Duration;

use edge_dock::command::Mutation;
use edge_dock::geometry::SideMarkers;
use edge_dock::{Behavior, ContentView, Dock, DockBuilder, DockUi, Screen, Side, Size};

pub const SCREEN: Screen = Screen::new(1920.0, 1080.0);
pub const WAIT: Duration = Duration::from_secs(3);
pub const QUIET: Duration = Duration::from_millis(40);

/// Content with a fixed 200x40 footprint on every side. Records the side
/// it was laid out for and every line pushed into it.
#[derive(Debug, Default)]
pub struct Panel {
    pub lines: Vec<String>,
    pub side: Option<Side>,
    pub markers: SideMarkers,
}

impl ContentView for Panel {
    type Content = Vec<String>;

    fn adopt_side(&mut self, side: Side) -> Size {
        self.side = Some(side);
        self.size()
    }

    fn apply(&mut self, mutation: Mutation<Vec<String>>) -> Size {
        mutation(&mut self.lines);
        self.size()
    }

    fn set_markers(&mut self, markers: SideMarkers) {
        self.markers = markers;
    }

    fn size(&self) -> Size {
        Size::new(200.0, 40.0)
    }
}

pub fn builder() -> DockBuilder<Panel> {
    DockBuilder::new(SCREEN, Panel::default())
        .name("test")
        .show(Behavior::Instant)
        .hide(Behavior::Instant)
        .quiet_period(QUIET)
        .initial_show(false)
}

pub fn close<V: ContentView>(dock: Dock<V>, ui: DockUi<V>) {
    drop(ui);
    dock.close();
}

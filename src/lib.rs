//! Core of an auto-hiding dock that docks against a screen edge.
//!
//! A [`dock::Dock`] retracts behind its edge and slides out when the pointer
//! touches a thin strip along that edge or when a caller touches it. Moves,
//! content changes and session directives are queued and applied one at a
//! time on the UI thread, never while a show or hide transition runs.

pub mod animation;
pub mod areas;
pub mod command;
pub mod config;
pub mod constants;
pub mod content;
pub mod dock;
pub mod docking;
pub mod drivers;
pub mod error;
pub mod event_loop;
pub mod gate;
pub mod geometry;
pub mod log_buffer;
pub mod observe;
pub mod position;
pub mod queue;
pub mod render;
pub mod scheduler;
pub mod session;
pub mod snapshot;
pub mod state;
pub mod theme;
pub mod touch_watch;
pub mod tracing_sub;
pub mod ui;
pub mod ui_thread;

pub use config::{Behavior, DockConfig};
pub use content::{ContentView, Item, ItemStrip};
pub use dock::{Dock, DockBuilder, DockCore, DockUi};
pub use error::{DockError, DockResult};
pub use geometry::{Point, Rect, Screen, Side, Size};
pub use position::{Position, RelativePosition};
pub use state::DockState;

//! Shared crate-wide constants.

use std::time::Duration;

/// Quiet period after the last touch before the session asks whether it may
/// deactivate. Continuous touching keeps pushing this deadline forward.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(500);

/// Capacity of the command queue. Producers block once this many commands
/// are waiting; re-queued moves are exempt.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// Transitions configured shorter than this (in seconds) are applied
/// instantly instead of being animated.
pub const INSTANT_THRESHOLD_SECS: f64 = 0.01;

/// Longest show or hide transition, in seconds. Longer ones are clamped.
pub const MAX_TRANSITION_SECS: f64 = 60.0;

/// Thickness of the touch-sensing strip along the docked screen edge.
pub const TOUCH_STRIP_THICKNESS: f64 = 1.0;

/// How far past the screen edge the dock rests when fully hidden.
///
/// Units: screen pixels (terminal cells in the playground). The hidden dock
/// sits this far outside the screen so that not even its border is visible.
pub const HIDDEN_OVERSHOOT: f64 = 1.0;

/// Name of the block held while the freshly built dock shows itself.
pub const INITIAL_SHOW_BLOCK: &str = "INITIAL_SHOW";

/// Hold for the initial show when showing is instant.
pub const INITIAL_SHOW_HOLD_INSTANT: Duration = Duration::from_millis(2000);

/// Extra hold added on top of the show duration for smooth initial shows.
pub const INITIAL_SHOW_HOLD_EXTRA: Duration = Duration::from_millis(1000);

/// Name of the block held while the dock is dragged by the pointer.
pub const MOVING_BLOCK: &str = "MOVING";

/// Upper bound for joining background threads during dispose.
pub const SHUTDOWN_WAIT: Duration = Duration::from_millis(1000);

/// Slice the queue worker sleeps on a closed gate before re-checking whether
/// the queue was closed underneath it.
pub const GATE_POLL: Duration = Duration::from_millis(50);

/// Frame pacing used by [`crate::dock::DockUi::pump_until`] between ticks.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

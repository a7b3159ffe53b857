use std::time::Duration;

use crate::geometry::Side;
use crate::position::RelativePosition;

pub type Mutation<C> = Box<dyn FnOnce(&mut C) + Send>;

/// Session directive carried through the queue so it is applied in order
/// with moves and content changes.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionDirective {
    Touch,
    TouchAndBlock { name: String, ttl: Option<Duration> },
    Block { name: String, ttl: Option<Duration> },
    Unblock(String),
    UnblockAll,
}

/// Everything a caller can ask the dock to do.
pub enum Command<C> {
    /// Move along `side` (or the current side when `None`).
    Move { side: Option<Side>, coordinate: f64 },
    MoveRelative(RelativePosition),
    ContentChange(Mutation<C>),
    Session(SessionDirective),
}

impl<C> Command<C> {
    pub fn kind(&self) -> &'static str {
        match self {
            Command::Move { .. } => "move",
            Command::MoveRelative(_) => "move-relative",
            Command::ContentChange(_) => "content-change",
            Command::Session(_) => "session",
        }
    }

    pub fn is_move(&self) -> bool {
        matches!(self, Command::Move { .. } | Command::MoveRelative(_))
    }
}

impl<C> std::fmt::Debug for Command<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Move { side, coordinate } => f
                .debug_struct("Move")
                .field("side", side)
                .field("coordinate", coordinate)
                .finish(),
            Command::MoveRelative(relative) => f.debug_tuple("MoveRelative").field(relative).finish(),
            Command::ContentChange(_) => f.write_str("ContentChange"),
            Command::Session(directive) => f.debug_tuple("Session").field(directive).finish(),
        }
    }
}

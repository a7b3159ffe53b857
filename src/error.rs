use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DockError {
    #[error("dock command queue is closed")]
    QueueClosed,

    #[error("ui loop is no longer running")]
    UiDisconnected,

    #[error("ui task panicked: {0}")]
    TaskPanicked(String),

    #[error("pointer at ({x}, {y}) is inside the screen while the dock is off-screen")]
    PointerInsideScreen { x: f64, y: f64 },

    #[error("failed to spawn thread `{name}`: {source}")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type DockResult<T> = Result<T, DockError>;

/// Renders a panic payload the way the panic hook would.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "<non-string panic>".to_string()
    }
}

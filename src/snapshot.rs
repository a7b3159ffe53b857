//! Persistable description of where a dock sits and how it behaves.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{Behavior, DockConfig};
use crate::error::DockResult;
use crate::geometry::Side;
use crate::position::{CurrentPosition, Place, Position, RelativePosition};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Absolute(f64),
    Relative(Place),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DockSnapshot {
    pub name: String,
    pub side: Side,
    pub placement: Placement,
    pub pinned: bool,
    pub show: Behavior,
    pub hide: Behavior,
}

/// Receives a fresh snapshot whenever the dock's position or pin state
/// changes.
pub type SnapshotSink = Arc<dyn Fn(&DockSnapshot) + Send + Sync>;

impl DockSnapshot {
    pub fn capture(name: &str, position: CurrentPosition, pinned: bool, show: Behavior, hide: Behavior) -> Self {
        let placement = match position.relative {
            Some(relative) => Placement::Relative(relative.place()),
            None => Placement::Absolute(position.coordinate),
        };
        Self {
            name: name.to_string(),
            side: position.side,
            placement,
            pinned,
            show,
            hide,
        }
    }

    pub fn position(&self) -> Position {
        match self.placement {
            Placement::Absolute(coordinate) => Position::Absolute {
                side: self.side,
                coordinate,
            },
            Placement::Relative(place) => Position::Relative(RelativePosition::new(self.side, place)),
        }
    }

    /// Overlays this snapshot onto `config`, keeping its queue and session
    /// settings.
    pub fn apply_to(&self, config: &mut DockConfig) {
        config.name = self.name.clone();
        config.position = self.position();
        config.pinned = self.pinned;
        config.show = self.show;
        config.hide = self.hide;
    }

    pub fn to_json(&self) -> DockResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> DockResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn save(&self, path: &Path) -> DockResult<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        debug!(path = %path.display(), side = %self.side, "dock snapshot saved");
        Ok(())
    }

    pub fn load(path: &Path) -> DockResult<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::{DEFAULT_QUEUE_CAPACITY, DEFAULT_QUIET_PERIOD, INSTANT_THRESHOLD_SECS, MAX_TRANSITION_SECS};
use crate::error::DockResult;
use crate::position::Position;

/// How a show or hide transition is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Behavior {
    Instant,
    Smooth { seconds: f64 },
}

impl Default for Behavior {
    fn default() -> Self {
        Behavior::Smooth { seconds: 0.3 }
    }
}

impl Behavior {
    /// Smooth transition, or instant when `seconds` is too short to notice.
    pub fn smooth(seconds: f64) -> Self {
        Behavior::Smooth { seconds }.normalized()
    }

    /// Instant for unnoticeably short or non-finite durations, otherwise
    /// smooth with the duration clamped to [`MAX_TRANSITION_SECS`].
    pub fn normalized(self) -> Self {
        match self {
            Behavior::Smooth { seconds } if seconds.is_finite() && seconds >= INSTANT_THRESHOLD_SECS => {
                Behavior::Smooth {
                    seconds: seconds.min(MAX_TRANSITION_SECS),
                }
            }
            _ => Behavior::Instant,
        }
    }

    pub fn is_instant(self) -> bool {
        matches!(self.normalized(), Behavior::Instant)
    }

    pub fn duration(self) -> Duration {
        match self.normalized() {
            Behavior::Instant => Duration::ZERO,
            Behavior::Smooth { seconds } => {
                Duration::try_from_secs_f64(seconds).unwrap_or(Duration::from_secs(MAX_TRANSITION_SECS as u64))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DockConfig {
    pub name: String,
    pub position: Position,
    pub pinned: bool,
    pub show: Behavior,
    pub hide: Behavior,
    pub quiet_period_ms: u64,
    pub queue_capacity: usize,
    pub touch_delay_ms: u64,
    pub initial_show: bool,
}

impl Default for DockConfig {
    fn default() -> Self {
        Self {
            name: "dock".to_string(),
            position: Position::default(),
            pinned: false,
            show: Behavior::default(),
            hide: Behavior::default(),
            quiet_period_ms: DEFAULT_QUIET_PERIOD.as_millis() as u64,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            touch_delay_ms: 0,
            initial_show: true,
        }
    }
}

impl DockConfig {
    pub fn from_json(text: &str) -> DockResult<Self> {
        let mut config: Self = serde_json::from_str(text)?;
        for behavior in [&mut config.show, &mut config.hide] {
            let normalized = behavior.normalized();
            if normalized != *behavior {
                warn!(configured = ?behavior, using = ?normalized, "transition duration out of range");
                *behavior = normalized;
            }
        }
        Ok(config)
    }

    /// Reads `path`, falling back to defaults when it is missing or broken.
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                warn!(path = %path.display(), %err, "dock config unreadable, using defaults");
                return Self::default();
            }
        };
        Self::from_json(&text).unwrap_or_else(|err| {
            warn!(path = %path.display(), %err, "dock config invalid, using defaults");
            Self::default()
        })
    }

    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_period_ms.max(1))
    }

    pub fn touch_delay(&self) -> Option<Duration> {
        (self.touch_delay_ms > 0).then(|| Duration::from_millis(self.touch_delay_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Side;
    use crate::position::RelativePosition;
    use indoc::indoc;
    use std::io::Write;

    #[test]
    fn short_smooth_becomes_instant() {
        assert_eq!(Behavior::smooth(0.005), Behavior::Instant);
        assert_eq!(Behavior::smooth(0.2), Behavior::Smooth { seconds: 0.2 });
        assert!(Behavior::Smooth { seconds: f64::NAN }.is_instant());
        assert_eq!(Behavior::Instant.duration(), Duration::ZERO);
        assert_eq!(Behavior::smooth(0.5).duration(), Duration::from_millis(500));
    }

    #[test]
    fn huge_transition_is_clamped() {
        let limit = Duration::from_secs_f64(MAX_TRANSITION_SECS);
        assert_eq!(Behavior::Smooth { seconds: 1e300 }.duration(), limit);
        assert_eq!(Behavior::smooth(f64::MAX).duration(), limit);

        let config = DockConfig::from_json(indoc! {r#"
            {
                "show": { "kind": "smooth", "seconds": 1e300 },
                "hide": { "kind": "smooth", "seconds": 0.001 }
            }
        "#})
        .unwrap();
        assert_eq!(
            config.show,
            Behavior::Smooth {
                seconds: MAX_TRANSITION_SECS
            }
        );
        assert_eq!(config.show.duration(), limit);
        assert_eq!(config.hide, Behavior::Instant);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = DockConfig::from_json(indoc! {r#"
            {
                "name": "tools",
                "position": { "absolute": { "side": "right", "coordinate": 300.0 } },
                "show": { "kind": "instant" }
            }
        "#})
        .unwrap();
        assert_eq!(config.name, "tools");
        assert_eq!(config.position.side(), Side::Right);
        assert_eq!(config.show, Behavior::Instant);
        assert_eq!(config.hide, Behavior::default());
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert_eq!(config.quiet_period(), DEFAULT_QUIET_PERIOD);
        assert_eq!(config.touch_delay(), None);
    }

    #[test]
    fn load_falls_back_on_missing_or_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert_eq!(DockConfig::load(&missing), DockConfig::default());

        let broken = dir.path().join("broken.json");
        std::fs::File::create(&broken)
            .unwrap()
            .write_all(b"{ not json")
            .unwrap();
        assert_eq!(DockConfig::load(&broken), DockConfig::default());
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "position": {{ "relative": "left-center" }}, "touch_delay_ms": 150 }}"#
        )
        .unwrap();
        let config = DockConfig::load(file.path());
        assert_eq!(
            config.position,
            Position::Relative(RelativePosition::LeftCenter)
        );
        assert_eq!(config.touch_delay(), Some(Duration::from_millis(150)));
    }
}

//! Show / hide transition of the dock's docking-axis coordinate.
//!
//! The animation does not own the dock. Every call returns the events the
//! caller must apply, in order: begin/finish notifications and new values of
//! the coordinate.

use std::time::Duration;

use keyframe::EasingFunction;
use keyframe::functions::{EaseInQuad, EaseOutQuad};

use crate::config::Behavior;

mod clock;
pub use clock::Clock;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimationEvent {
    ShowingBegins,
    ShowingFinished,
    HidingBegins,
    HidingFinished,
    /// The docking-axis coordinate moved to this value.
    Value(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Show,
    Hide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    EaseInQuad,
    EaseOutQuad,
}

impl Curve {
    pub fn y(self, x: f64) -> f64 {
        match self {
            Curve::EaseInQuad => EaseInQuad.y(x),
            Curve::EaseOutQuad => EaseOutQuad.y(x),
        }
    }
}

#[derive(Debug, Clone)]
struct Tween {
    direction: Direction,
    from: f64,
    to: f64,
    start: Duration,
    duration: Duration,
    curve: Curve,
}

impl Tween {
    fn value_at(&self, at: Duration) -> f64 {
        if at <= self.start {
            return self.from;
        }
        if self.start + self.duration <= at {
            return self.to;
        }
        let passed = (at - self.start).as_secs_f64();
        let x = (passed / self.duration.as_secs_f64()).clamp(0., 1.);
        self.curve.y(x) * (self.to - self.from) + self.from
    }

    fn is_done(&self, at: Duration) -> bool {
        at >= self.start + self.duration
    }
}

#[derive(Debug)]
pub struct ShowHideAnimation {
    clock: Clock,
    show: Behavior,
    hide: Behavior,
    tween: Option<Tween>,
    value: f64,
}

impl ShowHideAnimation {
    pub fn new(clock: Clock, show: Behavior, hide: Behavior, initial: f64) -> Self {
        Self {
            clock,
            show: show.normalized(),
            hide: hide.normalized(),
            tween: None,
            value: initial,
        }
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn show_behavior(&self) -> Behavior {
        self.show
    }

    pub fn hide_behavior(&self) -> Behavior {
        self.hide
    }

    /// Last value handed out.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Keeps the idle value in step with moves made outside the animation.
    pub fn sync_value(&mut self, value: f64) {
        if self.tween.is_none() {
            self.value = value;
        }
    }

    pub fn direction(&self) -> Option<Direction> {
        self.tween.as_ref().map(|tween| tween.direction)
    }

    pub fn is_animating(&self) -> bool {
        self.tween.is_some()
    }

    pub fn show(&mut self, hidden: f64, shown: f64) -> Vec<AnimationEvent> {
        self.start(Direction::Show, hidden, shown)
    }

    pub fn hide(&mut self, hidden: f64, shown: f64) -> Vec<AnimationEvent> {
        self.start(Direction::Hide, hidden, shown)
    }

    /// Drops a running tween where it is. Safe to call at any time.
    pub fn stop(&mut self) {
        self.tween = None;
    }

    /// Advances the running tween to the clock's current time.
    pub fn tick(&mut self) -> Vec<AnimationEvent> {
        let Some(tween) = &self.tween else {
            return Vec::new();
        };
        let now = self.clock.now();
        if tween.is_done(now) || self.clock.should_complete_instantly() {
            let direction = tween.direction;
            let to = tween.to;
            self.tween = None;
            return self.finish(direction, to);
        }
        let value = tween.value_at(now);
        if value == self.value {
            return Vec::new();
        }
        self.value = value;
        vec![AnimationEvent::Value(value)]
    }

    fn start(&mut self, direction: Direction, hidden: f64, shown: f64) -> Vec<AnimationEvent> {
        let (behavior, from_start, to, curve) = match direction {
            Direction::Show => (self.show, hidden, shown, Curve::EaseInQuad),
            Direction::Hide => (self.hide, shown, hidden, Curve::EaseOutQuad),
        };

        let running = self.direction();
        if running == Some(direction) {
            return Vec::new();
        }
        let reversing = running.is_some();
        if reversing {
            // Continue from wherever the opposite tween got to.
            self.value = self.current_value();
            self.tween = None;
        }

        let instant = match behavior {
            Behavior::Instant => true,
            Behavior::Smooth { .. } => from_start == to || self.clock.should_complete_instantly(),
        };
        if instant {
            return self.finish(direction, to);
        }

        let full = behavior.duration();
        let (from, duration) = if reversing {
            (self.value, full / 2)
        } else {
            (from_start, full)
        };
        self.value = from;
        self.tween = Some(Tween {
            direction,
            from,
            to,
            start: self.clock.now(),
            duration,
            curve,
        });
        vec![begins(direction), AnimationEvent::Value(from)]
    }

    fn current_value(&self) -> f64 {
        match &self.tween {
            Some(tween) => tween.value_at(self.clock.now()),
            None => self.value,
        }
    }

    fn finish(&mut self, direction: Direction, to: f64) -> Vec<AnimationEvent> {
        self.value = to;
        vec![AnimationEvent::Value(to), finished(direction)]
    }
}

fn begins(direction: Direction) -> AnimationEvent {
    match direction {
        Direction::Show => AnimationEvent::ShowingBegins,
        Direction::Hide => AnimationEvent::HidingBegins,
    }
}

fn finished(direction: Direction) -> AnimationEvent {
    match direction {
        Direction::Show => AnimationEvent::ShowingFinished,
        Direction::Hide => AnimationEvent::HidingFinished,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HIDDEN: f64 = -41.0;
    const SHOWN: f64 = 0.0;

    fn smooth(clock: &Clock, secs: f64) -> ShowHideAnimation {
        ShowHideAnimation::new(
            clock.clone(),
            Behavior::Smooth { seconds: secs },
            Behavior::Smooth { seconds: secs },
            HIDDEN,
        )
    }

    #[test]
    fn instant_show_finishes_synchronously() {
        let clock = Clock::manual(Duration::ZERO);
        let mut anim = ShowHideAnimation::new(clock, Behavior::Instant, Behavior::Instant, HIDDEN);
        let events = anim.show(HIDDEN, SHOWN);
        assert_eq!(
            events,
            vec![AnimationEvent::Value(SHOWN), AnimationEvent::ShowingFinished]
        );
        assert!(!anim.is_animating());
        assert_eq!(anim.value(), SHOWN);
    }

    #[test]
    fn smooth_show_runs_to_completion() {
        let clock = Clock::manual(Duration::ZERO);
        let mut anim = smooth(&clock, 1.0);
        let events = anim.show(HIDDEN, SHOWN);
        assert_eq!(
            events,
            vec![AnimationEvent::ShowingBegins, AnimationEvent::Value(HIDDEN)]
        );
        assert_eq!(anim.direction(), Some(Direction::Show));

        clock.advance(Duration::from_millis(500));
        let events = anim.tick();
        assert_eq!(events.len(), 1);
        let AnimationEvent::Value(mid) = events[0] else {
            panic!("expected a value, got {events:?}");
        };
        assert!(HIDDEN < mid && mid < SHOWN);

        clock.advance(Duration::from_millis(600));
        assert_eq!(
            anim.tick(),
            vec![AnimationEvent::Value(SHOWN), AnimationEvent::ShowingFinished]
        );
        assert!(anim.tick().is_empty());
    }

    #[test]
    fn show_while_showing_is_noop() {
        let clock = Clock::manual(Duration::ZERO);
        let mut anim = smooth(&clock, 1.0);
        anim.show(HIDDEN, SHOWN);
        assert!(anim.show(HIDDEN, SHOWN).is_empty());
    }

    #[test]
    fn reversal_resumes_from_interrupted_value() {
        let clock = Clock::manual(Duration::ZERO);
        let mut anim = smooth(&clock, 1.0);
        anim.sync_value(SHOWN);
        anim.hide(HIDDEN, SHOWN);

        clock.advance(Duration::from_millis(400));
        anim.tick();
        let at_interrupt = anim.value();
        assert!(HIDDEN < at_interrupt && at_interrupt < SHOWN);

        let events = anim.show(HIDDEN, SHOWN);
        assert_eq!(
            events,
            vec![
                AnimationEvent::ShowingBegins,
                AnimationEvent::Value(at_interrupt)
            ]
        );

        // Half the configured duration brings it home.
        clock.advance(Duration::from_millis(250));
        let events = anim.tick();
        let AnimationEvent::Value(v) = events[0] else {
            panic!("expected a value, got {events:?}");
        };
        assert!(at_interrupt <= v && v < SHOWN);
        clock.advance(Duration::from_millis(250));
        assert_eq!(
            anim.tick(),
            vec![AnimationEvent::Value(SHOWN), AnimationEvent::ShowingFinished]
        );
    }

    #[test]
    fn zero_distance_degrades_to_instant() {
        let clock = Clock::manual(Duration::ZERO);
        let mut anim = smooth(&clock, 1.0);
        assert_eq!(
            anim.hide(5.0, 5.0),
            vec![AnimationEvent::Value(5.0), AnimationEvent::HidingFinished]
        );
    }

    #[test]
    fn complete_instantly_short_circuits_running_tween() {
        let clock = Clock::manual(Duration::ZERO);
        let mut anim = smooth(&clock, 10.0);
        anim.show(HIDDEN, SHOWN);
        clock.set_complete_instantly(true);
        assert_eq!(
            anim.tick(),
            vec![AnimationEvent::Value(SHOWN), AnimationEvent::ShowingFinished]
        );
    }

    #[test]
    fn tiny_durations_are_instant() {
        let clock = Clock::manual(Duration::ZERO);
        let mut anim = ShowHideAnimation::new(
            clock,
            Behavior::Smooth { seconds: 0.001 },
            Behavior::Instant,
            HIDDEN,
        );
        assert_eq!(anim.show_behavior(), Behavior::Instant);
        assert_eq!(anim.show(HIDDEN, SHOWN).last(), Some(&AnimationEvent::ShowingFinished));
    }
}

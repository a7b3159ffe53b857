use std::io;
use std::time::{Duration, Instant};

use crossterm::event::Event;

use crate::drivers::InputDriver;

pub enum ControlFlow {
    Continue,
    Quit,
}

/// Drives the UI thread: the thread that owns the dock's UI half.
///
/// The handler is called with `None` once per frame (the place to pump the
/// dock and redraw) and with `Some(event)` for every input event in between.
/// Frames keep their pace while input arrives in bursts.
pub struct EventLoop<D> {
    driver: D,
    frame_interval: Duration,
}

impl<D: InputDriver> EventLoop<D> {
    pub fn new(driver: D, frame_interval: Duration) -> Self {
        Self {
            driver,
            frame_interval,
        }
    }

    pub fn driver(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn run<F>(&mut self, mut handler: F) -> io::Result<()>
    where
        F: FnMut(&mut D, Option<Event>) -> io::Result<ControlFlow>,
    {
        loop {
            if let ControlFlow::Quit = handler(&mut self.driver, None)? {
                return Ok(());
            }
            let next_frame = Instant::now() + self.frame_interval;
            loop {
                let left = next_frame.saturating_duration_since(Instant::now());
                if left.is_zero() || !self.driver.poll(left)? {
                    break;
                }
                let event = self.driver.read()?;
                if let ControlFlow::Quit = handler(&mut self.driver, Some(event))? {
                    return Ok(());
                }
            }
        }
    }
}

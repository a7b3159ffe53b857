use std::collections::VecDeque;
use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::event::{DisableMouseCapture, EnableMouseCapture, Event, MouseEventKind};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use super::{InputDriver, OutputDriver};
use crate::ui::UiFrame;

/// Terminal input. Bursts of identical mouse motion collapse into their last
/// sample, so a fast drag feeds the dock one pointer position per burst.
#[derive(Debug, Default)]
pub struct ConsoleInputDriver {
    pending: VecDeque<Event>,
}

impl ConsoleInputDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_raw(&mut self) -> io::Result<Event> {
        match self.pending.pop_front() {
            Some(event) => Ok(event),
            None => crossterm::event::read(),
        }
    }

    fn coalesce(&mut self, mut event: Event) -> io::Result<Event> {
        while motion_kind(&event).is_some() {
            let next = if let Some(front) = self.pending.front() {
                if !same_motion(&event, front) {
                    break;
                }
                self.pending.pop_front()
            } else if crossterm::event::poll(Duration::ZERO)? {
                let next = crossterm::event::read()?;
                if !same_motion(&event, &next) {
                    self.pending.push_back(next);
                    break;
                }
                Some(next)
            } else {
                None
            };
            match next {
                Some(next) => event = next,
                None => break,
            }
        }
        Ok(event)
    }
}

fn motion_kind(event: &Event) -> Option<MouseEventKind> {
    match event {
        Event::Mouse(mouse) if matches!(mouse.kind, MouseEventKind::Moved | MouseEventKind::Drag(_)) => {
            Some(mouse.kind)
        }
        _ => None,
    }
}

fn same_motion(a: &Event, b: &Event) -> bool {
    matches!((motion_kind(a), motion_kind(b)), (Some(x), Some(y)) if x == y)
}

impl InputDriver for ConsoleInputDriver {
    fn poll(&mut self, timeout: Duration) -> io::Result<bool> {
        if !self.pending.is_empty() {
            return Ok(true);
        }
        crossterm::event::poll(timeout)
    }

    fn read(&mut self) -> io::Result<Event> {
        let event = self.next_raw()?;
        self.coalesce(event)
    }

    fn set_mouse_capture(&mut self, enabled: bool) -> io::Result<()> {
        if enabled {
            execute!(io::stdout(), EnableMouseCapture)
        } else {
            execute!(io::stdout(), DisableMouseCapture)
        }
    }
}

pub struct ConsoleOutputDriver {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    entered: bool,
}

impl ConsoleOutputDriver {
    pub fn new() -> io::Result<Self> {
        let backend = CrosstermBackend::new(io::stdout());
        let terminal = Terminal::new(backend)?;
        Ok(Self {
            terminal,
            entered: false,
        })
    }
}

impl OutputDriver for ConsoleOutputDriver {
    fn enter(&mut self) -> io::Result<()> {
        if self.entered {
            return Ok(());
        }
        execute!(self.terminal.backend_mut(), EnterAlternateScreen, EnableMouseCapture)?;
        terminal::enable_raw_mode()?;
        self.terminal.hide_cursor()?;
        self.entered = true;
        Ok(())
    }

    fn exit(&mut self) -> io::Result<()> {
        if !self.entered {
            return Ok(());
        }
        terminal::disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        self.entered = false;
        Ok(())
    }

    fn size(&self) -> io::Result<(u16, u16)> {
        terminal::size()
    }

    fn draw<F>(&mut self, f: F) -> io::Result<()>
    where
        F: FnOnce(UiFrame<'_>),
    {
        self.terminal
            .draw(move |frame| f(UiFrame::new(frame)))
            .map(|_| ())
            .map_err(|err| io::Error::other(err.to_string()))
    }
}

impl Drop for ConsoleOutputDriver {
    fn drop(&mut self) {
        let _ = self.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent};

    fn mouse(kind: MouseEventKind, column: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row: 0,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn motion_bursts_collapse_to_last_sample() {
        let mut driver = ConsoleInputDriver::new();
        driver.pending.push_back(mouse(MouseEventKind::Moved, 1));
        driver.pending.push_back(mouse(MouseEventKind::Moved, 2));
        driver.pending.push_back(mouse(MouseEventKind::Moved, 3));
        driver
            .pending
            .push_back(Event::Key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert_eq!(driver.read().unwrap(), mouse(MouseEventKind::Moved, 3));
        assert!(matches!(driver.read().unwrap(), Event::Key(_)));
    }

    #[test]
    fn different_motions_are_kept_apart() {
        let mut driver = ConsoleInputDriver::new();
        driver.pending.push_back(mouse(MouseEventKind::Moved, 1));
        driver
            .pending
            .push_back(mouse(MouseEventKind::Drag(MouseButton::Left), 2));
        driver
            .pending
            .push_back(mouse(MouseEventKind::Up(MouseButton::Left), 2));
        assert_eq!(driver.read().unwrap(), mouse(MouseEventKind::Moved, 1));
        assert_eq!(
            driver.read().unwrap(),
            mouse(MouseEventKind::Drag(MouseButton::Left), 2)
        );
        assert_eq!(
            driver.read().unwrap(),
            mouse(MouseEventKind::Up(MouseButton::Left), 2)
        );
    }

    #[test]
    fn poll_sees_pending_events() {
        let mut driver = ConsoleInputDriver::new();
        driver
            .pending
            .push_back(Event::Key(KeyEvent::new(KeyCode::Char('z'), KeyModifiers::NONE)));
        assert!(driver.poll(Duration::ZERO).unwrap());
    }
}

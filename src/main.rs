use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

use clap::Parser;
use crossterm::event::{Event, KeyCode, KeyEventKind, MouseButton, MouseEventKind};
use ratatui::layout::Rect as CellRect;
use tracing::{Level, info, warn};

use edge_dock::constants::FRAME_INTERVAL;
use edge_dock::drivers::console::{ConsoleInputDriver, ConsoleOutputDriver};
use edge_dock::drivers::{InputDriver, OutputDriver};
use edge_dock::event_loop::{ControlFlow, EventLoop};
use edge_dock::log_buffer::{self, LogHandle};
use edge_dock::position::Place;
use edge_dock::render::{render_dock, render_footer, render_touch_strip};
use edge_dock::snapshot::{DockSnapshot, SnapshotSink};
use edge_dock::{
    Behavior, Dock, DockBuilder, DockConfig, DockUi, Item, ItemStrip, Point, Position, RelativePosition, Screen, Side,
    tracing_sub,
};

const FOOTER_HEIGHT: u16 = 5;
const USER_BLOCK: &str = "USER";

#[derive(Parser, Debug)]
#[command(
    name = "edge-dock",
    version = env!("CARGO_PKG_VERSION"),
    about = "Terminal playground for the auto-hiding edge dock"
)]
struct Cli {
    /// JSON dock configuration.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Screen side to dock against.
    #[arg(long, value_name = "SIDE")]
    side: Option<Side>,

    /// Keep the dock centred on its side.
    #[arg(long)]
    center: bool,

    /// Start pinned: the dock cannot be moved.
    #[arg(long)]
    pinned: bool,

    #[arg(long, value_name = "SECONDS")]
    show_secs: Option<f64>,

    #[arg(long, value_name = "SECONDS")]
    hide_secs: Option<f64>,

    /// Delay between reaching the touch strip and the dock showing.
    #[arg(long, value_name = "MILLIS")]
    touch_delay_ms: Option<u64>,

    /// Where the dock remembers its position between runs.
    #[arg(long, value_name = "PATH")]
    state_file: Option<PathBuf>,

    /// Also append log output to this file.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn dock_config(&self) -> DockConfig {
        let mut config = self
            .config
            .as_deref()
            .map(DockConfig::load)
            .unwrap_or_default();
        if let Some(path) = self.state_file.as_deref().filter(|path| path.exists()) {
            match DockSnapshot::load(path) {
                Ok(snapshot) => snapshot.apply_to(&mut config),
                Err(err) => warn!(path = %path.display(), %err, "ignoring unreadable dock state"),
            }
        }
        let side = self.side.unwrap_or_else(|| config.position.side());
        if self.center {
            config.position = Position::Relative(RelativePosition::new(side, Place::Center));
        } else if self.side.is_some() {
            config.position = Position::Absolute { side, coordinate: 0.0 };
        }
        config.pinned |= self.pinned;
        if let Some(seconds) = self.show_secs {
            config.show = Behavior::smooth(seconds);
        }
        if let Some(seconds) = self.hide_secs {
            config.hide = Behavior::smooth(seconds);
        }
        if let Some(millis) = self.touch_delay_ms {
            config.touch_delay_ms = millis;
        }
        config
    }
}

/// Control requests run on their own thread: a full command queue blocks the
/// caller until the UI thread drains it, and the UI thread must never wait on
/// itself.
type Control = Box<dyn FnOnce(&Dock<ItemStrip>) + Send>;

fn main() -> io::Result<()> {
    let cli = Cli::parse();

    let log = LogHandle::default();
    log_buffer::set_global_log(log.clone());
    log_buffer::install_panic_hook();
    if let Some(path) = &cli.log_file {
        tracing_sub::set_log_file(path)?;
    }
    tracing_sub::init(Level::DEBUG);

    let config = cli.dock_config();
    let mut output = ConsoleOutputDriver::new()?;
    let (columns, rows) = output.size()?;
    let screen = Screen::new(columns as f64, rows.saturating_sub(FOOTER_HEIGHT) as f64);

    let items = Vec::from(["files", "shell", "mail", "notes"].map(Item::new));
    let mut builder = DockBuilder::from_config(screen, ItemStrip::new(items), &config);
    if let Some(path) = cli.state_file.clone() {
        let sink: SnapshotSink = Arc::new(move |snapshot: &DockSnapshot| {
            if let Err(err) = snapshot.save(&path) {
                warn!(%err, "dock state not saved");
            }
        });
        builder = builder.snapshot_sink(sink);
    }
    let (dock, mut ui) = builder.build().map_err(io::Error::other)?;
    let dock = Arc::new(dock);

    let (control, requests) = mpsc::channel::<Control>();
    let controller = {
        let dock = Arc::clone(&dock);
        thread::Builder::new()
            .name("playground-control".into())
            .spawn(move || {
                for request in requests {
                    request(&dock);
                }
            })?
    };

    output.enter()?;
    let mut input = ConsoleInputDriver::new();
    input.set_mouse_capture(true)?;
    let mut playground = Playground {
        dock: Arc::clone(&dock),
        control,
        log,
        added: 0,
    };
    let result = EventLoop::new(input, FRAME_INTERVAL).run(|_, event| match event {
        None => {
            ui.frame();
            playground.draw(&mut output, &ui)?;
            Ok(ControlFlow::Continue)
        }
        Some(event) => Ok(playground.handle(event, &mut ui)),
    });
    output.exit()?;

    drop(playground);
    if controller.join().is_err() {
        warn!("control thread panicked");
    }
    if let Some(path) = &cli.state_file
        && let Err(err) = dock.snapshot().save(path)
    {
        eprintln!("dock state not saved: {err}");
    }
    drop(ui);
    dock.close();
    result
}

struct Playground {
    dock: Arc<Dock<ItemStrip>>,
    control: mpsc::Sender<Control>,
    log: LogHandle,
    added: usize,
}

impl Playground {
    fn request(&self, request: impl FnOnce(&Dock<ItemStrip>) -> edge_dock::DockResult<()> + Send + 'static) {
        let posted = self.control.send(Box::new(move |dock| {
            if let Err(err) = request(dock) {
                warn!(%err, "dock request failed");
            }
        }));
        if posted.is_err() {
            warn!("control thread is gone");
        }
    }

    fn handle(&mut self, event: Event, ui: &mut DockUi<ItemStrip>) -> ControlFlow {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => return self.handle_key(key.code, ui),
            Event::Mouse(mouse) => {
                let point = Point::new(mouse.column as f64, mouse.row as f64);
                self.dock.pointer_moved(point);
                let core = ui.core_mut();
                match mouse.kind {
                    MouseEventKind::Down(MouseButton::Left) if core.stage().contains(point) => {
                        core.begin_drag(point);
                    }
                    MouseEventKind::Drag(MouseButton::Left) => {
                        if let Err(err) = core.drag_to(point) {
                            warn!(%err, "drag step rejected");
                        }
                    }
                    MouseEventKind::Up(MouseButton::Left) => core.end_drag(),
                    _ => {}
                }
            }
            Event::Resize(columns, rows) => {
                info!(columns, rows, "terminal resized; restart to re-measure the screen");
            }
            _ => {}
        }
        ControlFlow::Continue
    }

    fn handle_key(&mut self, code: KeyCode, ui: &mut DockUi<ItemStrip>) -> ControlFlow {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return ControlFlow::Quit,
            KeyCode::Up => self.move_to_side(Side::Top),
            KeyCode::Down => self.move_to_side(Side::Bottom),
            KeyCode::Left => self.move_to_side(Side::Left),
            KeyCode::Right => self.move_to_side(Side::Right),
            KeyCode::Char('c') => {
                let relative = RelativePosition::new(self.dock.side(), Place::Center);
                self.request(move |dock| dock.move_to_relative(relative));
            }
            KeyCode::Char('+') => {
                self.added += 1;
                let name = format!("new{}", self.added);
                self.request(move |dock| dock.change_content(move |items: &mut Vec<Item>| items.push(Item::new(name))));
            }
            KeyCode::Char('-') => {
                self.request(|dock| {
                    dock.change_content(|items: &mut Vec<Item>| {
                        items.pop();
                    })
                });
            }
            KeyCode::Char('t') => self.request(|dock| dock.touch()),
            KeyCode::Char('b') => {
                if self.dock.has_block(USER_BLOCK) {
                    self.request(|dock| dock.unblock(USER_BLOCK));
                } else {
                    self.request(|dock| dock.block(USER_BLOCK, None));
                }
            }
            KeyCode::Char('p') => self.dock.set_pinned(!self.dock.is_pinned()),
            KeyCode::Char(digit @ '1'..='9') => {
                let index = digit as usize - '1' as usize;
                match ui.core().view().invoke(index) {
                    Ok(()) => info!(index, "item ran"),
                    Err(message) => warn!(index, "item failed: {message}"),
                }
            }
            _ => {}
        }
        ControlFlow::Continue
    }

    /// Keeps the dock's relative spot along the edge when changing sides.
    fn move_to_side(&self, side: Side) {
        let position = self.dock.position();
        let screen = self.dock.areas().screen();
        let fraction = position.coordinate / screen.sliding_extent(position.side).max(1.0);
        let coordinate = (fraction * screen.sliding_extent(side)).round();
        self.request(move |dock| dock.move_to_side(side, coordinate));
    }

    fn draw(&self, output: &mut ConsoleOutputDriver, ui: &DockUi<ItemStrip>) -> io::Result<()> {
        let core = ui.core();
        let touch = self.dock.areas().touch();
        let status = format!(
            "{} | {} {:.0} | {}{}{} | q quit, arrows side, c centre, +/- items, t touch, b block, p pin",
            core.state().label(),
            core.side(),
            core.position().coordinate,
            if self.dock.is_active() { "active" } else { "idle" },
            if self.dock.is_pinned() { " pinned" } else { "" },
            if self.dock.is_blocked() { " blocked" } else { "" },
        );
        let lines = self.log.tail(FOOTER_HEIGHT as usize - 1);
        if log_buffer::take_panic_pending() {
            warn!("a dock thread panicked, see the log above");
        }
        output.draw(|mut frame| {
            let area = frame.area();
            let footer_height = FOOTER_HEIGHT.min(area.height);
            let footer = CellRect::new(
                area.x,
                area.y + area.height - footer_height,
                area.width,
                footer_height,
            );
            render_touch_strip(&mut frame, &touch);
            render_dock(&mut frame, core);
            render_footer(&mut frame, footer, &status, &lines);
        })
    }
}

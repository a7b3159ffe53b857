use std::io;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{Level, warn};

use edge_dock::command::Mutation;
use edge_dock::{Behavior, ContentView, Dock, DockBuilder, Screen, Side, Size, geometry::SideMarkers, tracing_sub};

#[derive(Parser, Debug)]
#[command(
    name = "dock-bench",
    version = env!("CARGO_PKG_VERSION"),
    about = "Floods a dock's command queue from several threads and checks the apply order"
)]
struct BenchCli {
    /// Number of producer threads.
    #[arg(short = 'p', long = "producers", value_name = "COUNT", default_value_t = 4)]
    producers: usize,

    /// Commands each producer posts.
    #[arg(short = 'n', long = "commands", value_name = "COUNT", default_value_t = 10_000)]
    commands: u64,

    /// Command queue capacity. Small values exercise blocking producers.
    #[arg(short = 'c', long = "capacity", value_name = "SLOTS", default_value_t = 64)]
    capacity: usize,

    /// Every Nth command is a move instead of a content change. 0 disables moves.
    #[arg(short = 'm', long = "move-every", value_name = "N", default_value_t = 10)]
    move_every: u64,

    /// Give up after this many seconds.
    #[arg(short = 't', long = "timeout", value_name = "SECONDS", default_value_t = 60.0)]
    timeout_seconds: f64,
}

struct BenchConfig {
    producers: usize,
    commands: u64,
    capacity: usize,
    move_every: u64,
    timeout: Duration,
}

impl TryFrom<&BenchCli> for BenchConfig {
    type Error = String;

    fn try_from(cli: &BenchCli) -> Result<Self, Self::Error> {
        if !(1..=64).contains(&cli.producers) {
            return Err("producers must be between 1 and 64".to_string());
        }
        if cli.commands == 0 {
            return Err("commands must be at least 1".to_string());
        }
        if cli.capacity == 0 {
            return Err("capacity must be at least 1".to_string());
        }
        if !(0.5..=3600.0).contains(&cli.timeout_seconds) {
            return Err("timeout must be between 0.5 and 3600 seconds".to_string());
        }
        Ok(Self {
            producers: cli.producers,
            commands: cli.commands,
            capacity: cli.capacity,
            move_every: cli.move_every,
            timeout: Duration::from_secs_f64(cli.timeout_seconds),
        })
    }
}

impl BenchConfig {
    fn changes_per_producer(&self) -> u64 {
        match self.move_every {
            0 => self.commands,
            every => self.commands - self.commands / every,
        }
    }
}

/// Fixed-size content that records which producer's change landed when.
#[derive(Default)]
struct Recorder {
    applied: Vec<(usize, u64)>,
}

impl ContentView for Recorder {
    type Content = Vec<(usize, u64)>;

    fn adopt_side(&mut self, _side: Side) -> Size {
        self.size()
    }

    fn apply(&mut self, mutation: Mutation<Self::Content>) -> Size {
        mutation(&mut self.applied);
        self.size()
    }

    fn set_markers(&mut self, _markers: SideMarkers) {}

    fn size(&self) -> Size {
        Size::new(200.0, 40.0)
    }
}

struct BenchStats {
    applied: usize,
    elapsed: Duration,
    violations: Vec<usize>,
    completed: bool,
}

impl BenchStats {
    fn final_report(&self, config: &BenchConfig) -> String {
        let secs = self.elapsed.as_secs_f64().max(f64::EPSILON);
        let posted = config.producers as u64 * config.commands;
        let mut report = format!(
            "dock-bench: {} producers x {} commands, capacity {}\n\
             applied {} content changes in {:.3}s ({:.0} commands/s posted)\n",
            config.producers,
            config.commands,
            config.capacity,
            self.applied,
            secs,
            posted as f64 / secs,
        );
        for (producer, violations) in self.violations.iter().enumerate() {
            report.push_str(&format!("  producer {producer}: {violations} ordering violations\n"));
        }
        if !self.completed {
            report.push_str("timed out before every change was applied\n");
        }
        report
    }
}

fn main() -> io::Result<()> {
    let args = BenchCli::parse();
    let config =
        BenchConfig::try_from(&args).map_err(|msg| io::Error::new(io::ErrorKind::InvalidInput, msg))?;
    tracing_sub::init(Level::WARN);

    let (dock, mut ui) = DockBuilder::new(Screen::new(1920.0, 1080.0), Recorder::default())
        .name("bench")
        .show(Behavior::Instant)
        .hide(Behavior::Instant)
        .initial_show(false)
        .queue_capacity(config.capacity)
        .build()
        .map_err(io::Error::other)?;
    let dock = Arc::new(dock);

    let started = Instant::now();
    let producers = (0..config.producers)
        .map(|producer| {
            let dock = Arc::clone(&dock);
            let (commands, move_every) = (config.commands, config.move_every);
            thread::Builder::new()
                .name(format!("bench-producer-{producer}"))
                .spawn(move || produce(&dock, producer, commands, move_every))
        })
        .collect::<io::Result<Vec<_>>>()?;

    let expected = config.producers * config.changes_per_producer() as usize;
    let completed = ui.pump_until(config.timeout, |core| core.view().applied.len() >= expected);
    let elapsed = started.elapsed();

    for producer in producers {
        if producer.join().is_err() {
            warn!("producer thread panicked");
        }
    }

    let applied = &ui.core().view().applied;
    let stats = BenchStats {
        applied: applied.len(),
        elapsed,
        violations: count_violations(applied, config.producers),
        completed,
    };
    drop(ui);
    dock.close();

    println!("{}", stats.final_report(&config));
    Ok(())
}

fn produce(dock: &Dock<Recorder>, producer: usize, commands: u64, move_every: u64) {
    for seq in 0..commands {
        let posted = if move_every > 0 && seq % move_every == move_every - 1 {
            dock.move_to((seq % 1000) as f64)
        } else {
            dock.change_content(move |applied: &mut Vec<(usize, u64)>| applied.push((producer, seq)))
        };
        if let Err(err) = posted {
            warn!(producer, %err, "producer stopped early");
            return;
        }
    }
}

/// Counts, per producer, the changes that landed after a later one of the
/// same producer.
fn count_violations(applied: &[(usize, u64)], producers: usize) -> Vec<usize> {
    let mut last: Vec<Option<u64>> = vec![None; producers];
    let mut violations = vec![0; producers];
    for &(producer, seq) in applied {
        if let Some(previous) = last[producer]
            && seq <= previous
        {
            violations[producer] += 1;
        }
        last[producer] = Some(seq);
    }
    violations
}

//! hamster: drive a hamster behavior over a grid world in the terminal.
//!
//! Interactive by default: frames are printed as the session steps, and
//! single-key commands are read from stdin.  With `--steps N` the session is
//! stepped `N` times without a driver thread and only the final world is
//! printed.
//!
//! Logs go to stderr; set `RUST_LOG=debug` to see grants and resets.

mod input;
mod render;

use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use hs_agent::{Behavior, IdleBehavior, RandomWalk, WallFollower};
use hs_core::{AgentState, Grid, Heading, Position, World, load_grid_csv};
use hs_gate::StepRate;
use hs_session::{Driver, SessionBuilder, SessionConfig, SessionObserver, SimulationSession};
use tracing::{info, warn};

use render::AsciiRenderer;

// ── Arguments ─────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, ValueEnum)]
enum BehaviorKind {
    WallFollower,
    RandomWalk,
    Idle,
}

impl BehaviorKind {
    fn build(self, seed: u64) -> Arc<dyn Behavior> {
        match self {
            BehaviorKind::WallFollower => Arc::new(WallFollower),
            BehaviorKind::RandomWalk   => Arc::new(RandomWalk::new(seed)),
            BehaviorKind::Idle         => Arc::new(IdleBehavior),
        }
    }
}

/// Command line arguments for the hamster sandbox
#[derive(Parser, Debug)]
#[command(name = "hamster")]
#[command(about = "Step a hamster behavior through a grid world")]
struct Args {
    /// CSV map: `X` for obstacles, a food count for everything else.
    /// Defaults to the built-in 8x9 demo room.
    #[arg(long)]
    map: Option<PathBuf>,

    /// Start cell as `col,row`
    #[arg(long, value_parser = parse_position, default_value = "1,1")]
    start: Position,

    /// Initial heading (up, right, down, left)
    #[arg(long, default_value = "down")]
    heading: Heading,

    #[arg(long, value_enum, default_value_t = BehaviorKind::WallFollower)]
    behavior: BehaviorKind,

    /// Speed control, 0 (slowest) to 100 (fastest)
    #[arg(long, default_value_t = StepRate::DEFAULT.control(),
          value_parser = clap::value_parser!(u8).range(0..=100))]
    rate: u8,

    /// Start playing instead of paused
    #[arg(long)]
    play: bool,

    /// Invoke the behavior again whenever it returns
    #[arg(long)]
    repeat: bool,

    /// Seed for the random walk
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Step this many times headlessly, print the result, and exit
    #[arg(long)]
    steps: Option<u64>,

    /// Print the final world as JSON
    #[arg(long)]
    json: bool,
}

fn parse_position(s: &str) -> Result<Position, String> {
    let (col, row) = s.split_once(',').ok_or_else(|| format!("expected col,row, got {s:?}"))?;
    let col = col.trim().parse().map_err(|e| format!("bad column {col:?}: {e}"))?;
    let row = row.trim().parse().map_err(|e| format!("bad row {row:?}: {e}"))?;
    Ok(Position::new(col, row))
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let grid = match &args.map {
        Some(path) => load_grid_csv(path).with_context(|| format!("loading {}", path.display()))?,
        None => Grid::demo(),
    };
    let world = World::new(grid, AgentState::new(args.start, args.heading))?;

    let config = SessionConfig {
        rate:            StepRate::new(args.rate),
        playing:         args.play,
        repeat_behavior: args.repeat,
        ..SessionConfig::default()
    };
    let session = SessionBuilder::shared(world, args.behavior.build(args.seed))
        .config(config)
        .build()?;
    info!(behavior = session.behavior_name(), rate = %session.rate(), "session ready");

    let final_world = match args.steps {
        Some(steps) => run_headless(session, steps)?,
        None => run_interactive(session)?,
    };

    if args.json {
        let mut out = io::stdout().lock();
        serde_json::to_writer_pretty(&mut out, &final_world)?;
        writeln!(out)?;
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();
}

// ── Modes ─────────────────────────────────────────────────────────────────────

/// Grant `steps` single steps back to back, stopping early if the run ends.
fn run_headless(mut session: SimulationSession, steps: u64) -> Result<World> {
    let mut renderer = AsciiRenderer::new(io::stdout());
    let mut last = None;

    for _ in 0..steps {
        session.request_single_step();
        let report = session.tick(Instant::now());
        if !report.stepped {
            warn!(step = report.step, "behavior did not take the step; stopping");
            break;
        }
        let ended = report.outcome.is_some();
        if let Some(outcome) = &report.outcome {
            renderer.on_outcome(report.run, outcome);
        }
        last = Some(report);
        if ended {
            break;
        }
    }

    let world = session.world();
    if let Some(report) = &last {
        renderer.on_frame(report, &world);
    }
    session.shutdown();
    Ok(world)
}

/// Run the driver on this thread and read keys from stdin on another.
fn run_interactive(session: SimulationSession) -> Result<World> {
    eprintln!("{}", input::HELP);
    let (driver, control) = Driver::new(session, AsciiRenderer::new(io::stdout()));
    let _reader = input::spawn_reader(BufReader::new(io::stdin()), control);

    let renderer = driver.run()?;
    match renderer.last_world() {
        Some(world) => Ok(world.clone()),
        None => bail!("driver stopped before rendering a frame"),
    }
}

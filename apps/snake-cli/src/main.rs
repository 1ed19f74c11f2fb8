use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use snake_common::{Direction, GridPosition};
use snake_kernel::{GameConfig, SimEvent, SimState, SnakeSimulation, TickOutcome};
use snake_render::{DebugTextRenderer, Renderer, Scene};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "snake-cli", about = "Headless snake runner")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Play a scripted game and print the final board
    Run {
        /// Ticks to simulate; defaults to the number of scripted moves
        #[arg(short, long)]
        ticks: Option<u64>,
        /// One character per tick: n/s/e/w (or u/d/r/l) to steer, '.' for no input
        #[arg(short, long, default_value = "")]
        moves: String,
        /// RNG seed for fruit placement; overrides the config file
        #[arg(short, long)]
        seed: Option<u64>,
        /// Game config (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print a JSON summary instead of the board
        #[arg(long)]
        json: bool,
    },
}

const DEFAULT_SEED: u64 = 42;

#[derive(Serialize)]
struct RunSummary {
    seed: u64,
    ticks: u64,
    state: SimState,
    length: usize,
    score: u32,
    head: GridPosition,
    fruit: Option<GridPosition>,
    segments: Vec<GridPosition>,
    events: Vec<SimEvent>,
}

/// Parse a move script into one optional steering input per tick.
fn parse_moves(script: &str) -> Result<Vec<Option<Direction>>> {
    script
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .enumerate()
        .map(|(i, c)| match c {
            '.' | '-' => Ok(None),
            c => c
                .to_string()
                .parse::<Direction>()
                .map(Some)
                .with_context(|| format!("move {} ('{c}')", i + 1)),
        })
        .collect()
}

fn run_script(
    sim: &mut SnakeSimulation,
    moves: &[Option<Direction>],
    ticks: u64,
) -> Vec<SimEvent> {
    let mut events = Vec::new();
    for tick in 0..ticks {
        if let Some(Some(direction)) = moves.get(tick as usize) {
            if !sim.set_direction(*direction) {
                tracing::debug!(tick, ?direction, "steer rejected");
            }
        }
        let outcome = sim.tick();
        events.extend(sim.drain_events());
        if let TickOutcome::Died(cause) = outcome {
            tracing::info!(tick, ?cause, "snake died");
            break;
        }
    }
    events
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info => {
            println!("snake-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", snake_common::crate_info());
            println!("kernel: {}", snake_kernel::crate_info());
            println!("render: {}", snake_render::crate_info());
            println!("input: {}", snake_input::crate_info());
            let defaults = GameConfig::default();
            println!(
                "defaults: board={0}x{0}, start={1}, length={2}, tick={3}s",
                defaults.board_size(),
                defaults.start,
                defaults.initial_length,
                defaults.tick_interval
            );
        }
        Commands::Run {
            ticks,
            moves,
            seed,
            config,
            json,
        } => {
            let config = match config {
                Some(path) => GameConfig::load(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => GameConfig::default(),
            };
            let seed = seed.or(config.seed).unwrap_or(DEFAULT_SEED);
            let moves = parse_moves(&moves)?;
            let ticks = ticks.unwrap_or(moves.len() as u64);
            if ticks == 0 && moves.is_empty() {
                bail!("nothing to run: pass --moves and/or --ticks");
            }

            let mut sim = SnakeSimulation::new(config, seed)?;
            let events = run_script(&mut sim, &moves, ticks);

            if json {
                let summary = RunSummary {
                    seed,
                    ticks: sim.ticks(),
                    state: sim.state(),
                    length: sim.len(),
                    score: sim.score(),
                    head: sim.head().position,
                    fruit: sim.fruit(),
                    segments: sim.segments().iter().map(|s| s.position).collect(),
                    events,
                };
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print!("{}", DebugTextRenderer::new().render(&Scene::capture(&sim, 0.0)));
            }
        }
    }

    Ok(())
}

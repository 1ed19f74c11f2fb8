//! Snake kernel: authoritative game state, fixed-step ticking, fruit spawning.
//!
//! # Invariants
//! - All state mutations flow through explicit operations on [`SnakeSimulation`].
//! - Given the same config, seed and inputs, a game replays identically.
//! - The simulation tick is separate from the render frame rate.

pub mod config;
pub mod fruit;
pub mod game;
pub mod rng;
pub mod simulation;
pub mod timestep;

pub use config::{ConfigError, GameConfig, MAX_GRID_SIZE};
pub use fruit::FruitSpawner;
pub use game::GameLoop;
pub use simulation::{CollisionKind, Segment, SimEvent, SimState, SnakeSimulation, TickOutcome};
pub use timestep::FixedTimestep;

pub fn crate_info() -> &'static str {
    "snake-kernel v0.1.0"
}

use crate::config::{ConfigError, GameConfig};
use crate::rng::splitmix64_mix;
use crate::simulation::{SimEvent, SimState, SnakeSimulation, TickOutcome};
use crate::timestep::FixedTimestep;
use snake_common::Direction;

/// Drives a [`SnakeSimulation`] at a fixed rate from variable frame times.
pub struct GameLoop {
    sim: SnakeSimulation,
    timestep: FixedTimestep,
    seed: u64,
}

impl GameLoop {
    pub fn new(config: GameConfig, seed: u64) -> Result<Self, ConfigError> {
        let timestep = FixedTimestep::new(config.tick_interval);
        let sim = SnakeSimulation::new(config, seed)?;
        Ok(Self {
            sim,
            timestep,
            seed,
        })
    }

    pub fn simulation(&self) -> &SnakeSimulation {
        &self.sim
    }

    pub fn timestep(&self) -> &FixedTimestep {
        &self.timestep
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Interpolation factor between the last tick and the next one.
    pub fn alpha(&self) -> f32 {
        self.timestep.alpha()
    }

    /// Advance real time by `dt` seconds. Returns the number of ticks run.
    pub fn update(&mut self, dt: f32) -> u32 {
        if self.sim.state() != SimState::Running || !dt.is_finite() {
            return 0;
        }
        self.timestep
            .accumulate(dt.min(self.sim.config().max_frame_delta));

        let mut ticks = 0;
        while self.timestep.consume_step() {
            ticks += 1;
            if let TickOutcome::Died(_) = self.sim.tick() {
                self.timestep.reset();
                break;
            }
        }
        if ticks > 1 {
            tracing::trace!(ticks, "caught up on tick backlog");
        }
        ticks
    }

    pub fn steer(&mut self, direction: Direction) -> bool {
        self.sim.set_direction(direction)
    }

    /// Running <-> Paused. The accumulator is left untouched.
    pub fn toggle_pause(&mut self) -> SimState {
        self.sim.toggle_pause()
    }

    /// Replace the simulation with a fresh one, reseeded from the previous seed.
    pub fn restart(&mut self) {
        self.seed = splitmix64_mix(self.seed.wrapping_add(1));
        match SnakeSimulation::new(self.sim.config().clone(), self.seed) {
            Ok(sim) => {
                self.sim = sim;
                self.timestep.reset();
                tracing::info!(seed = self.seed, "game restarted");
            }
            // The config was validated when this loop was built.
            Err(e) => tracing::error!("restart failed: {e}"),
        }
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.sim.drain_events()
    }
}

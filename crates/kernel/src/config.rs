use serde::{Deserialize, Serialize};
use snake_common::GridPosition;
use std::path::Path;

/// Errors raised while loading or validating a [`GameConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("grid_size must be at least 1, got {0}")]
    GridTooSmall(i32),
    #[error("grid_size must be at most {max}, got {got}")]
    GridTooLarge { got: i32, max: i32 },
    #[error("start cell {start} lies outside the board [1, {max}]")]
    StartOutOfBounds { start: GridPosition, max: i32 },
    #[error("initial_length must be between 1 and {max}, got {got}")]
    InitialLength { got: usize, max: usize },
    #[error("tick_interval must be a positive number of seconds, got {0}")]
    TickInterval(f32),
    #[error("max_frame_delta must be positive, got {0}")]
    MaxFrameDelta(f32),
}

/// Largest accepted `grid_size`; keeps the board side, the cell count and the
/// per-cell GPU instance buffer well inside integer and allocation limits.
pub const MAX_GRID_SIZE: i32 = 256;

/// Static game parameters.
///
/// The board is `2 * grid_size` cells on each side; cells are numbered from 1.
/// Defaults match the classic 10x10 board with a half-second tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Half the board side length, in cells.
    pub grid_size: i32,
    /// Cell the snake starts coiled on.
    pub start: GridPosition,
    /// Number of segments (head included) at game start.
    pub initial_length: usize,
    /// Seconds between simulation ticks.
    pub tick_interval: f32,
    /// Upper bound on a single frame's delta, in seconds.
    pub max_frame_delta: f32,
    /// Fixed RNG seed. `None` lets the application pick one.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: 5,
            start: GridPosition::new(5, 5),
            initial_length: 4,
            tick_interval: 0.5,
            max_frame_delta: 1.0,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Cells per board side.
    pub fn board_size(&self) -> i32 {
        self.grid_size * 2
    }

    pub fn cell_count(&self) -> usize {
        let side = self.board_size().max(0) as usize;
        side * side
    }

    pub fn in_bounds(&self, pos: GridPosition) -> bool {
        let max = self.board_size();
        (1..=max).contains(&pos.x) && (1..=max).contains(&pos.y)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size < 1 {
            return Err(ConfigError::GridTooSmall(self.grid_size));
        }
        if self.grid_size > MAX_GRID_SIZE {
            return Err(ConfigError::GridTooLarge {
                got: self.grid_size,
                max: MAX_GRID_SIZE,
            });
        }
        if !self.in_bounds(self.start) {
            return Err(ConfigError::StartOutOfBounds {
                start: self.start,
                max: self.board_size(),
            });
        }
        if self.initial_length == 0 || self.initial_length >= self.cell_count() {
            return Err(ConfigError::InitialLength {
                got: self.initial_length,
                max: self.cell_count() - 1,
            });
        }
        if !(self.tick_interval.is_finite() && self.tick_interval > 0.0) {
            return Err(ConfigError::TickInterval(self.tick_interval));
        }
        if !(self.max_frame_delta.is_finite() && self.max_frame_delta > 0.0) {
            return Err(ConfigError::MaxFrameDelta(self.max_frame_delta));
        }
        Ok(())
    }

    /// Parse and validate a YAML document. Missing keys take their defaults.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded game config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let c = GameConfig::default();
        c.validate().unwrap();
        assert_eq!(c.board_size(), 10);
        assert_eq!(c.cell_count(), 100);
    }

    #[test]
    fn bounds_are_one_based_inclusive() {
        let c = GameConfig::default();
        assert!(c.in_bounds(GridPosition::new(1, 1)));
        assert!(c.in_bounds(GridPosition::new(10, 10)));
        assert!(!c.in_bounds(GridPosition::new(0, 5)));
        assert!(!c.in_bounds(GridPosition::new(5, 11)));
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let c = GameConfig::from_yaml_str("grid_size: 8\ntick_interval: 0.25\n").unwrap();
        assert_eq!(c.grid_size, 8);
        assert_eq!(c.tick_interval, 0.25);
        assert_eq!(c.start, GridPosition::new(5, 5));
        assert_eq!(c.initial_length, 4);
    }

    #[test]
    fn yaml_start_and_seed() {
        let c = GameConfig::from_yaml_str("start: { x: 2, y: 3 }\nseed: 99\n").unwrap();
        assert_eq!(c.start, GridPosition::new(2, 3));
        assert_eq!(c.seed, Some(99));
    }

    #[test]
    fn rejects_start_outside_board() {
        let err = GameConfig::from_yaml_str("start: { x: 11, y: 1 }").unwrap_err();
        assert!(matches!(err, ConfigError::StartOutOfBounds { .. }));
    }

    #[test]
    fn rejects_bad_tick_interval() {
        let c = GameConfig {
            tick_interval: 0.0,
            ..GameConfig::default()
        };
        assert!(matches!(c.validate(), Err(ConfigError::TickInterval(_))));
    }

    #[test]
    fn rejects_zero_length() {
        let c = GameConfig {
            initial_length: 0,
            ..GameConfig::default()
        };
        assert!(matches!(c.validate(), Err(ConfigError::InitialLength { .. })));
    }

    #[test]
    fn huge_grid_is_an_error_not_an_overflow() {
        let err = GameConfig::from_yaml_str("grid_size: 1500000000").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::GridTooLarge { got: 1_500_000_000, max: MAX_GRID_SIZE }
        ));
    }

    #[test]
    fn largest_grid_is_accepted() {
        let c = GameConfig {
            grid_size: MAX_GRID_SIZE,
            ..GameConfig::default()
        };
        c.validate().unwrap();
        assert_eq!(c.cell_count(), 512 * 512);
    }

    #[test]
    fn rejects_malformed_yaml() {
        assert!(matches!(
            GameConfig::from_yaml_str("grid_size: [1, 2"),
            Err(ConfigError::Yaml(_))
        ));
    }
}

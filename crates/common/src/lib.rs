//! Shared types: grid cells, headings and spatial transforms.

mod types;

pub use types::{Direction, GridPosition, ParseDirectionError, Transform};

pub fn crate_info() -> &'static str {
    "snake-common v0.1.0"
}

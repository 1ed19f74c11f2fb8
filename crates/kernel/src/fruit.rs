use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{RngExt, SeedableRng};
use snake_common::GridPosition;
use std::collections::HashSet;

/// Picks free cells for the fruit.
///
/// Candidates are drawn uniformly and rejected while occupied. The number of
/// draws is capped; once the cap is hit the free cells are enumerated and one
/// of them is drawn instead, so a nearly full board still terminates.
#[derive(Debug)]
pub struct FruitSpawner {
    rng: StdRng,
    board_size: i32,
}

impl FruitSpawner {
    pub fn new(board_size: i32, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            board_size,
        }
    }

    fn max_attempts(&self) -> usize {
        let side = self.board_size.max(0) as usize;
        4 * side * side
    }

    /// A uniformly random cell in `[1, board_size]^2` not in `occupied`,
    /// or `None` when every cell is taken.
    pub fn respawn(&mut self, occupied: &HashSet<GridPosition>) -> Option<GridPosition> {
        for _ in 0..self.max_attempts() {
            let candidate = GridPosition::new(
                self.rng.random_range(1..=self.board_size),
                self.rng.random_range(1..=self.board_size),
            );
            if !occupied.contains(&candidate) {
                return Some(candidate);
            }
        }

        let free: Vec<GridPosition> = (1..=self.board_size)
            .flat_map(|y| (1..=self.board_size).map(move |x| GridPosition::new(x, y)))
            .filter(|p| !occupied.contains(p))
            .collect();
        tracing::debug!(
            free = free.len(),
            "fruit rejection sampling exhausted, choosing from free cells"
        );
        free.choose(&mut self.rng).copied()
    }
}

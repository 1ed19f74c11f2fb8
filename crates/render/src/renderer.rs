use crate::scene::{Scene, SpriteKind};
use snake_common::GridPosition;
use snake_kernel::SimState;
use std::fmt::Write;

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A renderer reads a captured [`Scene`] and produces output. It never
/// touches the simulation the scene was captured from.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame.
    fn render(&self, scene: &Scene) -> Self::Output;
}

/// Draws the board as ASCII, top row first.
///
/// Useful for CLI output, logging, and testing the render interface.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    /// Omit the status line above the board.
    pub bare: bool,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bare() -> Self {
        Self { bare: true }
    }

    fn glyph(kind: SpriteKind, state: SimState) -> char {
        match (kind, state) {
            (SpriteKind::Head, SimState::Dead) => 'X',
            (SpriteKind::Head, _) => 'H',
            (SpriteKind::Segment, _) => 'o',
            (SpriteKind::Fruit, _) => '*',
        }
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &Scene) -> String {
        let n = scene.board_size.max(0) as usize;
        let mut grid = vec![vec!['.'; n]; n];

        // Later sprites overwrite earlier ones, so the head wins over a
        // coiled body on the same cell.
        for sprite in scene.sprites() {
            if let Some((col, row)) = cell_index(sprite.cell, n) {
                grid[row][col] = Self::glyph(sprite.kind, scene.state);
            }
        }

        let mut out = String::new();
        if !self.bare {
            let _ = writeln!(
                out,
                "=== Snake (tick={}, length={}, score={}, state={:?}) ===",
                scene.tick,
                scene.body.len() + 1,
                scene.score,
                scene.state
            );
        }
        let border: String = std::iter::repeat_n('#', n + 2).collect();
        out.push_str(&border);
        out.push('\n');
        for row in grid.iter().rev() {
            out.push('#');
            out.extend(row.iter());
            out.push_str("#\n");
        }
        out.push_str(&border);
        out.push('\n');
        out
    }
}

/// Zero-based `(column, row)` with row 0 at the bottom.
fn cell_index(cell: GridPosition, n: usize) -> Option<(usize, usize)> {
    let col = usize::try_from(cell.x - 1).ok()?;
    let row = usize::try_from(cell.y - 1).ok()?;
    (col < n && row < n).then_some((col, row))
}

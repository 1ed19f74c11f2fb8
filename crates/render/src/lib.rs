//! Rendering adapter: renderer-agnostic interface.
//!
//! # Invariants
//! - Renderers never mutate simulation state.
//! - Render state derives from the simulation plus an interpolation factor.
//!
//! GPU backends consume [`Scene`] values and [`Renderable`] shapes; the
//! [`DebugTextRenderer`] draws the same scene as ASCII for the CLI and tests.

mod image;
mod mesh;
mod renderer;
mod scene;

pub use image::{ImageLoadError, RgbaImage};
pub use mesh::{
    BoardLines, BufferLayout, FruitShape, HeadShape, Renderable, ScalarType, SegmentShape,
    Topology, VertexAttribute,
};
pub use renderer::{DebugTextRenderer, Renderer};
pub use scene::{Scene, Sprite, SpriteKind};

pub fn crate_info() -> &'static str {
    "snake-render v0.1.0"
}

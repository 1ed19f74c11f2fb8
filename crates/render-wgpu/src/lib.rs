//! wgpu render backend for the snake game.
//!
//! Draws board lines, a textured fruit, one quad per body segment and a
//! textured head, all from a captured [`snake_render::Scene`].
//!
//! # Invariants
//! - The renderer never mutates simulation state.
//! - GPU handles are owned by exactly one wrapper and released through
//!   `dispose()`; using a disposed wrapper is a logged no-op.
//! - The simulation tick is separate from the render frame rate.

mod camera;
mod error;
mod mesh;
mod program;
mod renderer;
pub mod shaders;
mod texture;

pub use camera::{FlyCamera, GridCamera};
pub use error::GpuError;
pub use mesh::GpuMesh;
pub use program::{
    BindState, ProgramDescriptor, ProgramId, ShaderProgram, primitive_topology, uniform_layout,
    vertex_attributes,
};
pub use renderer::{InstanceData, SnakeRenderer, SnakeStyle};
pub use texture::{DEPTH_FORMAT, Texture, check_dimensions, depth_view};

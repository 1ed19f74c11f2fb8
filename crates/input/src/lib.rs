//! Input: raw key codes mapped to high-level game actions.
//!
//! # Invariants
//! - The game loop consumes actions, never raw input events.

pub mod action;
pub mod bindings;

pub use action::Action;
pub use bindings::KeyBindings;

pub fn crate_info() -> &'static str {
    "snake-input v0.1.0"
}

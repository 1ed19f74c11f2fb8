use snake_common::Direction;

/// A high-level action produced from player input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Request a new heading for the next tick.
    Steer(Direction),
    /// Running <-> Paused.
    TogglePause,
    /// Start a new game.
    Restart,
    /// Show or hide the HUD overlay.
    ToggleHud,
    Quit,
}

impl Action {
    /// Actions that should only fire once per physical key press.
    pub fn is_edge_triggered(self) -> bool {
        !matches!(self, Action::Steer(_))
    }
}

use crate::action::Action;
use snake_common::Direction;
use std::collections::HashMap;
use winit::keyboard::KeyCode;

/// Key code to action table.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    map: HashMap<KeyCode, Action>,
}

impl Default for KeyBindings {
    /// Arrows and WASD steer, Space/P pause, R restarts, H toggles the HUD,
    /// Escape quits.
    fn default() -> Self {
        let mut b = Self::empty();
        b.bind(KeyCode::ArrowUp, Action::Steer(Direction::North));
        b.bind(KeyCode::ArrowDown, Action::Steer(Direction::South));
        b.bind(KeyCode::ArrowRight, Action::Steer(Direction::East));
        b.bind(KeyCode::ArrowLeft, Action::Steer(Direction::West));
        b.bind(KeyCode::KeyW, Action::Steer(Direction::North));
        b.bind(KeyCode::KeyS, Action::Steer(Direction::South));
        b.bind(KeyCode::KeyD, Action::Steer(Direction::East));
        b.bind(KeyCode::KeyA, Action::Steer(Direction::West));
        b.bind(KeyCode::Space, Action::TogglePause);
        b.bind(KeyCode::KeyP, Action::TogglePause);
        b.bind(KeyCode::KeyR, Action::Restart);
        b.bind(KeyCode::KeyH, Action::ToggleHud);
        b.bind(KeyCode::Escape, Action::Quit);
        b
    }
}

impl KeyBindings {
    pub fn empty() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Bind `key` to `action`, returning the action it replaced.
    pub fn bind(&mut self, key: KeyCode, action: Action) -> Option<Action> {
        let old = self.map.insert(key, action);
        if let Some(old) = old {
            tracing::debug!(?key, ?old, new = ?action, "rebound key");
        }
        old
    }

    pub fn unbind(&mut self, key: KeyCode) -> Option<Action> {
        self.map.remove(&key)
    }

    pub fn action_for(&self, key: KeyCode) -> Option<Action> {
        self.map.get(&key).copied()
    }

    /// Keys bound to `action`, in no particular order.
    pub fn keys_for(&self, action: Action) -> Vec<KeyCode> {
        self.map
            .iter()
            .filter(|(_, a)| **a == action)
            .map(|(k, _)| *k)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_steering_keys() {
        let b = KeyBindings::default();
        assert_eq!(
            b.action_for(KeyCode::ArrowUp),
            Some(Action::Steer(Direction::North))
        );
        assert_eq!(
            b.action_for(KeyCode::KeyA),
            Some(Action::Steer(Direction::West))
        );
        assert_eq!(b.action_for(KeyCode::Space), Some(Action::TogglePause));
        assert_eq!(b.action_for(KeyCode::F12), None);
    }

    #[test]
    fn every_direction_is_reachable() {
        let b = KeyBindings::default();
        for d in Direction::ALL {
            assert_eq!(b.keys_for(Action::Steer(d)).len(), 2);
        }
    }

    #[test]
    fn rebinding_replaces() {
        let mut b = KeyBindings::default();
        let old = b.bind(KeyCode::Space, Action::Restart);
        assert_eq!(old, Some(Action::TogglePause));
        assert_eq!(b.action_for(KeyCode::Space), Some(Action::Restart));
        assert_eq!(b.unbind(KeyCode::Space), Some(Action::Restart));
        assert_eq!(b.action_for(KeyCode::Space), None);
    }
}

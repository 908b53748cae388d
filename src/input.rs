use std::collections::{HashMap, HashSet};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Identifier for a physical keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    Named(NamedKey),
    Character(char),
}

/// Friendly names for the non-character keys the demo reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedKey {
    Space,
    Left,
    Right,
    Up,
    Down,
    Escape,
    PageUp,
    PageDown,
}

/// Semantic inputs that stay active for as long as their key is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveMode,
    CameraForward,
    CameraBackward,
    CameraLeft,
    CameraRight,
    LightForward,
    LightBackward,
    LightLeft,
    LightRight,
    LightUp,
    LightDown,
}

/// Inputs that fire once when their key goes down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Quit,
    ToggleSpin,
    ToggleWireframe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Hold(InputAction),
    Press(Command),
}

/// Maps physical keys to semantic bindings.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    bindings: HashMap<KeyCode, Binding>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        use InputAction::*;
        use NamedKey::*;
        let bindings = [
            (KeyCode::Named(Escape), Binding::Press(Command::Quit)),
            (KeyCode::Character('P'), Binding::Press(Command::ToggleSpin)),
            (KeyCode::Character('L'), Binding::Press(Command::ToggleWireframe)),
            (KeyCode::Named(Space), Binding::Hold(MoveMode)),
            (KeyCode::Character('W'), Binding::Hold(CameraForward)),
            (KeyCode::Character('S'), Binding::Hold(CameraBackward)),
            (KeyCode::Character('A'), Binding::Hold(CameraLeft)),
            (KeyCode::Character('D'), Binding::Hold(CameraRight)),
            (KeyCode::Named(Up), Binding::Hold(LightForward)),
            (KeyCode::Named(Down), Binding::Hold(LightBackward)),
            (KeyCode::Named(Left), Binding::Hold(LightLeft)),
            (KeyCode::Named(Right), Binding::Hold(LightRight)),
            (KeyCode::Named(PageUp), Binding::Hold(LightUp)),
            (KeyCode::Named(PageDown), Binding::Hold(LightDown)),
        ];
        Self {
            bindings: bindings.into_iter().collect(),
        }
    }
}

impl KeyBindings {
    pub fn binding(&self, key: KeyCode) -> Option<Binding> {
        self.bindings.get(&key).copied()
    }
}

/// Held actions, physically-down keys and the last cursor sample.
#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<InputAction>,
    down_keys: HashSet<KeyCode>,
    last_cursor: Option<Vec2>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, action: InputAction) {
        self.held.insert(action);
    }

    pub fn release(&mut self, action: InputAction) {
        self.held.remove(&action);
    }

    pub fn is_held(&self, action: InputAction) -> bool {
        self.held.contains(&action)
    }

    /// `true` when exactly one of two opposing actions is held.
    pub fn exclusive(&self, a: InputAction, b: InputAction) -> bool {
        self.is_held(a) ^ self.is_held(b)
    }

    /// Marks `key` as down. Returns `true` only on the up-to-down edge, so
    /// auto-repeated presses report `false`.
    pub fn key_down(&mut self, key: KeyCode) -> bool {
        self.down_keys.insert(key)
    }

    pub fn key_up(&mut self, key: KeyCode) {
        self.down_keys.remove(&key);
    }

    /// Forgets every held action and key, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.held.clear();
        self.down_keys.clear();
    }

    /// Records a cursor position and returns the offset since the previous
    /// sample, with y pointing up. The very first sample only establishes the
    /// baseline.
    pub fn cursor_moved(&mut self, position: Vec2) -> Option<Vec2> {
        let previous = self.last_cursor.replace(position)?;
        Some(Vec2::new(position.x - previous.x, previous.y - position.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bindings_cover_controls() {
        let bindings = KeyBindings::default();
        assert_eq!(
            bindings.binding(KeyCode::Character('W')),
            Some(Binding::Hold(InputAction::CameraForward))
        );
        assert_eq!(
            bindings.binding(KeyCode::Named(NamedKey::PageDown)),
            Some(Binding::Hold(InputAction::LightDown))
        );
        assert_eq!(
            bindings.binding(KeyCode::Named(NamedKey::Escape)),
            Some(Binding::Press(Command::Quit))
        );
        assert_eq!(bindings.binding(KeyCode::Character('Q')), None);
    }

    #[test]
    fn input_state_tracks_actions() {
        let mut state = InputState::new();
        state.press(InputAction::CameraLeft);
        assert!(state.is_held(InputAction::CameraLeft));
        assert!(state.exclusive(InputAction::CameraLeft, InputAction::CameraRight));
        state.press(InputAction::CameraRight);
        assert!(!state.exclusive(InputAction::CameraLeft, InputAction::CameraRight));
        state.release(InputAction::CameraLeft);
        assert!(!state.is_held(InputAction::CameraLeft));
        state.release_all();
        assert!(!state.is_held(InputAction::CameraRight));
    }

    #[test]
    fn repeated_key_down_is_not_an_edge() {
        let mut state = InputState::new();
        let key = KeyCode::Character('P');
        assert!(state.key_down(key));
        assert!(!state.key_down(key));
        state.key_up(key);
        assert!(state.key_down(key));
        state.release_all();
        assert!(state.key_down(key));
    }

    #[test]
    fn first_cursor_sample_yields_no_delta() {
        let mut state = InputState::new();
        assert_eq!(state.cursor_moved(Vec2::new(640.0, 360.0)), None);
        assert_eq!(
            state.cursor_moved(Vec2::new(650.0, 350.0)),
            Some(Vec2::new(10.0, 10.0))
        );
    }
}

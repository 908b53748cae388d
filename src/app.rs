use glam::{Vec2, Vec3};
use log::{info, warn};
use thiserror::Error;

use crate::camera::{Camera, CameraMovement};
use crate::input::{Binding, Command, InputAction, InputState, KeyBindings, KeyCode};
use crate::lights::{axis_compensation, LightDirection, LightSet};
use crate::params::RenderParameters;

const CAMERA_START: Vec3 = Vec3::new(0.0, 1.8, 5.0);
/// Units per second for the active light.
pub const LIGHT_SPEED: f32 = 5.0;

const LIGHT_AXES: [(InputAction, LightDirection, InputAction, LightDirection); 3] = [
    (
        InputAction::LightForward,
        LightDirection::Forward,
        InputAction::LightBackward,
        LightDirection::Backward,
    ),
    (
        InputAction::LightRight,
        LightDirection::Right,
        InputAction::LightLeft,
        LightDirection::Left,
    ),
    (
        InputAction::LightUp,
        LightDirection::Up,
        InputAction::LightDown,
        LightDirection::Down,
    ),
];

/// Everything the frame loop mutates: parameters, lights, camera and input.
#[derive(Debug)]
pub struct AppState {
    pub params: RenderParameters,
    pub lights: LightSet,
    pub camera: Camera,
    pub input: InputState,
    pub bindings: KeyBindings,
    /// Spin angle around Y shared by every scene object, in radians.
    pub orientation: f32,
    pub quit_requested: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            params: RenderParameters::default(),
            lights: LightSet::new(),
            camera: Camera::new(CAMERA_START, true),
            input: InputState::new(),
            bindings: KeyBindings::default(),
            orientation: 1.0,
            quit_requested: false,
        }
    }

    /// Routes a key event through the bindings. Press commands fire once per
    /// physical press; auto-repeat events are ignored until the key is released.
    pub fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        let edge = if pressed {
            self.input.key_down(key)
        } else {
            self.input.key_up(key);
            false
        };
        match self.bindings.binding(key) {
            Some(Binding::Hold(action)) if pressed => self.input.press(action),
            Some(Binding::Hold(action)) => self.input.release(action),
            Some(Binding::Press(command)) if edge => self.run_command(command),
            _ => {}
        }
    }

    pub fn run_command(&mut self, command: Command) {
        match command {
            Command::Quit => self.quit_requested = true,
            Command::ToggleSpin => {
                self.params.spinning = !self.params.spinning;
                info!("spinning {}", on_off(self.params.spinning));
            }
            Command::ToggleWireframe => {
                self.params.wireframe = !self.params.wireframe;
                info!("wireframe {}", on_off(self.params.wireframe));
            }
        }
    }

    /// Feeds a cursor position. The camera only turns while move mode is held,
    /// but the baseline is tracked regardless so that engaging move mode does
    /// not cause a jump.
    pub fn handle_cursor(&mut self, position: Vec2) {
        let Some(delta) = self.input.cursor_moved(position) else {
            return;
        };
        if self.input.is_held(InputAction::MoveMode) {
            self.camera.process_mouse_movement(delta.x, delta.y);
        }
    }

    pub fn add_light(&mut self) {
        match self.lights.add_light() {
            Ok(index) => info!("added light {}", index + 1),
            Err(err) => warn!("{err}"),
        }
    }

    pub fn remove_light(&mut self) {
        match self.lights.remove_light() {
            Ok(_) => info!("removed light, {} left", self.lights.len()),
            Err(err) => warn!("{err}"),
        }
    }

    /// Per-frame simulation step run before the frame is drawn.
    pub fn update(&mut self, delta_time: f32) {
        self.apply_camera_movements(delta_time);
        self.apply_light_movements(delta_time);
        self.advance_spin(delta_time);
    }

    pub fn advance_spin(&mut self, delta_time: f32) {
        if self.params.spinning {
            self.orientation += delta_time * self.params.spin_speed;
        }
    }

    fn apply_camera_movements(&mut self, delta_time: f32) {
        use InputAction::*;
        // XOR so that W+A+D does not count as a diagonal.
        let diagonal = self.input.exclusive(CameraForward, CameraBackward)
            && self.input.exclusive(CameraLeft, CameraRight);
        self.camera.set_movement_compensation(diagonal);

        for (action, movement) in [
            (CameraForward, CameraMovement::Forward),
            (CameraBackward, CameraMovement::Backward),
            (CameraLeft, CameraMovement::Left),
            (CameraRight, CameraMovement::Right),
        ] {
            if self.input.is_held(action) {
                self.camera.process_keyboard(movement, delta_time);
            }
        }
    }

    fn apply_light_movements(&mut self, delta_time: f32) {
        if self.lights.active().is_none() {
            return;
        }
        let engaged = LIGHT_AXES
            .iter()
            .filter(|(a, _, b, _)| self.input.exclusive(*a, *b))
            .count();
        let velocity = LIGHT_SPEED * delta_time * axis_compensation(engaged);
        let basis = self.camera.basis();

        for (positive, positive_dir, negative, negative_dir) in LIGHT_AXES {
            if self.input.is_held(positive) {
                self.lights.move_active(positive_dir, &basis, velocity);
            }
            if self.input.is_held(negative) {
                self.lights.move_active(negative_dir, &basis, velocity);
            }
        }
    }
}

/// Failures that keep the demo from opening its window. Both end the process
/// with [`StartupError::EXIT_CODE`].
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to create window: {0}")]
    Window(String),
    #[error("failed to initialise graphics context: {0}")]
    GraphicsContext(String),
}

impl StartupError {
    pub const EXIT_CODE: i32 = -1;
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

/// Counts frames and reports the average rate once per second.
#[derive(Debug, Default)]
pub struct FpsCounter {
    frames: u32,
    elapsed: f32,
}

impl FpsCounter {
    pub fn tick(&mut self, delta_time: f32) -> Option<f32> {
        self.frames += 1;
        self.elapsed += delta_time;
        if self.elapsed < 1.0 {
            return None;
        }
        let fps = self.frames as f32 / self.elapsed;
        self.frames = 0;
        self.elapsed = 0.0;
        Some(fps)
    }
}

pub fn window_title(base: &str, fps: f32) -> String {
    format!("{base} - {fps:.1} fps")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::NamedKey;

    fn held(state: &mut AppState, keys: &[KeyCode]) {
        for key in keys {
            state.handle_key(*key, true);
        }
    }

    #[test]
    fn spin_advances_by_speed_times_delta() {
        let mut state = AppState::new();
        state.params.spin_speed = 0.5;
        let before = state.orientation;
        state.advance_spin(2.0);
        assert!((state.orientation - before - 1.0).abs() < 1e-6);

        state.run_command(Command::ToggleSpin);
        state.advance_spin(2.0);
        assert!((state.orientation - before - 1.0).abs() < 1e-6);
    }

    #[test]
    fn toggle_keys_flip_flags_once_per_press() {
        let mut state = AppState::new();
        // the second press is an OS auto-repeat of the first
        state.handle_key(KeyCode::Character('L'), true);
        state.handle_key(KeyCode::Character('L'), true);
        state.handle_key(KeyCode::Character('L'), false);
        assert!(state.params.wireframe);
        state.handle_key(KeyCode::Character('L'), true);
        assert!(!state.params.wireframe);
        state.handle_key(KeyCode::Character('P'), true);
        state.handle_key(KeyCode::Character('P'), true);
        state.handle_key(KeyCode::Character('P'), true);
        assert!(!state.params.spinning);
        state.handle_key(KeyCode::Named(NamedKey::Escape), true);
        assert!(state.quit_requested);
    }

    #[test]
    fn camera_diagonal_matches_single_axis() {
        let mut single = AppState::new();
        held(&mut single, &[KeyCode::Character('W')]);
        single.update(0.25);

        let mut diagonal = AppState::new();
        held(&mut diagonal, &[KeyCode::Character('W'), KeyCode::Character('D')]);
        diagonal.update(0.25);

        let start = AppState::new().camera.position();
        let a = (single.camera.position() - start).length();
        let b = (diagonal.camera.position() - start).length();
        assert!(a > 0.0);
        assert!((a - b).abs() < 1e-5);
    }

    #[test]
    fn light_diagonal_matches_single_axis() {
        let mut single = AppState::new();
        held(&mut single, &[KeyCode::Named(NamedKey::Up)]);
        single.update(0.1);

        let mut diagonal = AppState::new();
        held(
            &mut diagonal,
            &[KeyCode::Named(NamedKey::Up), KeyCode::Named(NamedKey::Right)],
        );
        diagonal.update(0.1);

        let a = single.lights.positions()[0].length();
        let b = diagonal.lights.positions()[0].length();
        assert!((a - LIGHT_SPEED * 0.1).abs() < 1e-5);
        assert!((a - b).abs() < 1e-5);
    }

    #[test]
    fn light_keys_ignored_without_lights() {
        let mut state = AppState::new();
        state.remove_light();
        held(&mut state, &[KeyCode::Named(NamedKey::PageUp)]);
        state.update(1.0);
        assert!(state.lights.is_empty());
    }

    #[test]
    fn mouse_only_turns_camera_in_move_mode() {
        let mut state = AppState::new();
        state.handle_cursor(Vec2::new(100.0, 100.0));
        state.handle_cursor(Vec2::new(200.0, 100.0));
        assert_eq!(state.camera.yaw(), -90.0);

        state.handle_key(KeyCode::Named(NamedKey::Space), true);
        state.handle_cursor(Vec2::new(240.0, 100.0));
        assert!((state.camera.yaw() - -80.0).abs() < 1e-5);

        state.handle_key(KeyCode::Named(NamedKey::Space), false);
        state.handle_cursor(Vec2::new(400.0, 100.0));
        assert!((state.camera.yaw() - -80.0).abs() < 1e-5);
    }

    #[test]
    fn adding_four_lights_fills_the_set() {
        let mut state = AppState::new();
        for _ in 0..6 {
            state.add_light();
        }
        assert_eq!(state.lights.len(), 5);
        assert_eq!(state.lights.active(), Some(4));
    }

    #[test]
    fn fps_is_reported_once_per_second() {
        let mut counter = FpsCounter::default();
        assert_eq!(counter.tick(0.5), None);
        assert_eq!(counter.tick(0.25), None);
        assert_eq!(counter.tick(0.25), Some(3.0));
        assert_eq!(counter.tick(0.5), None);
        assert_eq!(window_title("Demo", 59.94), "Demo - 59.9 fps");
    }
}

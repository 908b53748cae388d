use glam::{Mat4, Vec3};

/// Scale applied to each axis when two perpendicular directions are held, so
/// that diagonal movement is as fast as axis-aligned movement.
pub const DIAGONAL_COMPENSATION: f32 = std::f32::consts::FRAC_1_SQRT_2;

const DEFAULT_YAW: f32 = -90.0;
const DEFAULT_PITCH: f32 = 0.0;
const DEFAULT_SPEED: f32 = 3.0;
const DEFAULT_SENSITIVITY: f32 = 0.25;
const PITCH_LIMIT: f32 = 89.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMovement {
    Forward,
    Backward,
    Left,
    Right,
}

/// Orthonormal frame of the camera, also used to move lights relative to the
/// current view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Basis {
    pub front: Vec3,
    pub right: Vec3,
    pub up: Vec3,
}

/// First-person camera driven by yaw/pitch angles.
///
/// When `on_ground` is set, forward movement follows the horizontal
/// projection of the view direction so that looking up or down never changes
/// the eye height.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    front: Vec3,
    world_front: Vec3,
    up: Vec3,
    right: Vec3,
    world_up: Vec3,
    on_ground: bool,
    yaw: f32,
    pitch: f32,
    movement_speed: f32,
    mouse_sensitivity: f32,
    diagonal_compensation: f32,
    movement_compensation: f32,
}

impl Camera {
    pub fn new(position: Vec3, on_ground: bool) -> Self {
        let mut camera = Self {
            position,
            front: Vec3::NEG_Z,
            world_front: Vec3::NEG_Z,
            up: Vec3::Y,
            right: Vec3::X,
            world_up: Vec3::Y,
            on_ground,
            yaw: DEFAULT_YAW,
            pitch: DEFAULT_PITCH,
            movement_speed: DEFAULT_SPEED,
            mouse_sensitivity: DEFAULT_SENSITIVITY,
            diagonal_compensation: DIAGONAL_COMPENSATION,
            movement_compensation: 1.0,
        };
        camera.update_vectors();
        camera
    }

    /// Overrides the factor used by [`Camera::set_movement_compensation`].
    pub fn with_diagonal_compensation(mut self, factor: f32) -> Self {
        self.diagonal_compensation = factor;
        self
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn basis(&self) -> Basis {
        Basis {
            front: self.front,
            right: self.right,
            up: self.up,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    pub fn set_movement_compensation(&mut self, diagonal: bool) {
        self.movement_compensation = if diagonal {
            self.diagonal_compensation
        } else {
            1.0
        };
    }

    pub fn process_keyboard(&mut self, direction: CameraMovement, delta_time: f32) {
        let velocity = self.movement_speed * delta_time * self.movement_compensation;
        let forward = if self.on_ground {
            self.world_front
        } else {
            self.front
        };
        match direction {
            CameraMovement::Forward => self.position += forward * velocity,
            CameraMovement::Backward => self.position -= forward * velocity,
            CameraMovement::Left => self.position -= self.right * velocity,
            CameraMovement::Right => self.position += self.right * velocity,
        }
    }

    /// Rotates the view. Positive `y_offset` looks up.
    pub fn process_mouse_movement(&mut self, x_offset: f32, y_offset: f32) {
        self.yaw += x_offset * self.mouse_sensitivity;
        let pitch = self.pitch + y_offset * self.mouse_sensitivity;
        self.pitch = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_vectors();
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front =
            Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize();
        self.world_front = Vec3::new(yaw.cos(), 0.0, yaw.sin()).normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::new(Vec3::new(0.0, 1.8, 5.0), true)
    }

    #[test]
    fn starts_looking_down_negative_z() {
        let basis = camera().basis();
        assert!((basis.front - Vec3::NEG_Z).length() < 1e-5);
        assert!((basis.right - Vec3::X).length() < 1e-5);
        assert!((basis.up - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn diagonal_movement_matches_axis_speed() {
        let mut straight = camera();
        straight.set_movement_compensation(false);
        straight.process_keyboard(CameraMovement::Forward, 0.5);
        let axis = (straight.position() - camera().position()).length();

        let mut diagonal = camera();
        diagonal.set_movement_compensation(true);
        diagonal.process_keyboard(CameraMovement::Forward, 0.5);
        diagonal.process_keyboard(CameraMovement::Right, 0.5);
        let both = (diagonal.position() - camera().position()).length();

        assert!((axis - 1.5).abs() < 1e-5);
        assert!((both - axis).abs() < 1e-5);
    }

    #[test]
    fn compensation_factor_can_be_overridden() {
        let mut cam = camera().with_diagonal_compensation(0.5);
        cam.set_movement_compensation(true);
        cam.process_keyboard(CameraMovement::Left, 1.0);
        assert!(((cam.position() - camera().position()).length() - 1.5).abs() < 1e-5);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut cam = camera();
        cam.process_mouse_movement(0.0, 10_000.0);
        assert_eq!(cam.pitch(), 89.0);
        cam.process_mouse_movement(0.0, -100_000.0);
        assert_eq!(cam.pitch(), -89.0);
        assert!(cam.basis().front.y > -1.0);
    }

    #[test]
    fn ground_camera_keeps_height_when_looking_up() {
        let mut cam = camera();
        cam.process_mouse_movement(0.0, 120.0);
        cam.process_keyboard(CameraMovement::Forward, 1.0);
        assert!((cam.position().y - 1.8).abs() < 1e-5);

        let mut flying = Camera::new(Vec3::new(0.0, 1.8, 5.0), false);
        flying.process_mouse_movement(0.0, 120.0);
        flying.process_keyboard(CameraMovement::Forward, 1.0);
        assert!(flying.position().y > 1.8);
    }

    #[test]
    fn view_matrix_maps_eye_to_origin() {
        let cam = camera();
        let eye = cam.view_matrix().transform_point3(cam.position());
        assert!(eye.length() < 1e-5);
    }
}

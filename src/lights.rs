use glam::Vec3;
use thiserror::Error;

use crate::camera::Basis;

/// Upper bound on simultaneous point lights; the shaders size their light
/// arrays with this value.
pub const MAX_LIGHTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LightSetError {
    #[error("maximum number of lights ({0}) reached")]
    CapacityReached(usize),
    #[error("there are no lights left to remove")]
    Empty,
}

/// Direction in which the active light is moved, relative to the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightDirection {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

/// Ordered set of point lights with an optional active entry.
///
/// The active index is always inside the set; it is `None` only when the set
/// is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct LightSet {
    positions: Vec<Vec3>,
    active: Option<usize>,
}

impl Default for LightSet {
    fn default() -> Self {
        Self::new()
    }
}

impl LightSet {
    /// One light at the origin, selected.
    pub fn new() -> Self {
        Self {
            positions: vec![Vec3::ZERO],
            active: Some(0),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// Appends a light at the origin and makes it the active one.
    pub fn add_light(&mut self) -> Result<usize, LightSetError> {
        if self.positions.len() >= MAX_LIGHTS {
            return Err(LightSetError::CapacityReached(MAX_LIGHTS));
        }
        self.positions.push(Vec3::ZERO);
        let index = self.positions.len() - 1;
        self.active = Some(index);
        Ok(index)
    }

    /// Removes the most recently added light.
    pub fn remove_light(&mut self) -> Result<Vec3, LightSetError> {
        let removed = self.positions.pop().ok_or(LightSetError::Empty)?;
        self.active = match (self.active, self.positions.len()) {
            (_, 0) => None,
            (Some(active), len) => Some(active.min(len - 1)),
            (None, _) => Some(0),
        };
        Ok(removed)
    }

    /// Selects the light receiving movement input. Returns `false` when
    /// `index` is out of range.
    pub fn set_active(&mut self, index: usize) -> bool {
        if index < self.positions.len() {
            self.active = Some(index);
            true
        } else {
            false
        }
    }

    /// Translates the active light along the camera basis. Does nothing when
    /// no light is active.
    pub fn move_active(&mut self, direction: LightDirection, basis: &Basis, velocity: f32) {
        let Some(position) = self.active.and_then(|i| self.positions.get_mut(i)) else {
            return;
        };
        let offset = match direction {
            LightDirection::Forward => basis.front,
            LightDirection::Backward => -basis.front,
            LightDirection::Right => basis.right,
            LightDirection::Left => -basis.right,
            LightDirection::Up => basis.up,
            LightDirection::Down => -basis.up,
        };
        *position += offset * velocity;
    }
}

/// Velocity scale for light movement given the number of axis pairs
/// (forward/back, left/right, up/down) that currently have exactly one key
/// held. Keeps the total speed equal to single-axis speed.
pub fn axis_compensation(engaged_axes: usize) -> f32 {
    if engaged_axes >= 2 {
        1.0 / (engaged_axes as f32).sqrt()
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basis() -> Basis {
        Basis {
            front: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
        }
    }

    #[test]
    fn add_light_grows_until_capacity() {
        let mut lights = LightSet::new();
        for n in 1..MAX_LIGHTS {
            let before = lights.positions().to_vec();
            assert_eq!(lights.add_light(), Ok(n));
            assert_eq!(lights.len(), n + 1);
            assert_eq!(&lights.positions()[..n], &before[..]);
        }
        assert_eq!(lights.active(), Some(4));
        assert_eq!(
            lights.add_light(),
            Err(LightSetError::CapacityReached(MAX_LIGHTS))
        );
        assert_eq!(lights.len(), MAX_LIGHTS);
        assert_eq!(lights.active(), Some(4));
    }

    #[test]
    fn remove_light_clamps_active_and_stops_at_zero() {
        let mut lights = LightSet::new();
        for _ in 0..4 {
            lights.add_light().unwrap();
        }
        assert!(lights.set_active(4));
        for expected in (0..MAX_LIGHTS).rev() {
            lights.remove_light().unwrap();
            assert_eq!(lights.len(), expected);
            match lights.active() {
                Some(active) => assert!(active < lights.len()),
                None => assert!(lights.is_empty()),
            }
        }
        assert_eq!(lights.active(), None);
        assert_eq!(lights.remove_light(), Err(LightSetError::Empty));
        assert_eq!(lights.len(), 0);
    }

    #[test]
    fn removing_keeps_lower_active_index() {
        let mut lights = LightSet::new();
        lights.add_light().unwrap();
        lights.add_light().unwrap();
        lights.set_active(0);
        lights.remove_light().unwrap();
        assert_eq!(lights.active(), Some(0));
    }

    #[test]
    fn adding_after_emptying_selects_new_light() {
        let mut lights = LightSet::new();
        lights.remove_light().unwrap();
        assert_eq!(lights.add_light(), Ok(0));
        assert_eq!(lights.active(), Some(0));
    }

    #[test]
    fn set_active_rejects_out_of_range() {
        let mut lights = LightSet::new();
        assert!(!lights.set_active(1));
        assert_eq!(lights.active(), Some(0));
    }

    #[test]
    fn move_active_only_touches_selected_light() {
        let mut lights = LightSet::new();
        lights.add_light().unwrap();
        lights.move_active(LightDirection::Up, &basis(), 2.0);
        lights.move_active(LightDirection::Forward, &basis(), 1.0);
        assert_eq!(lights.positions()[0], Vec3::ZERO);
        assert_eq!(lights.positions()[1], Vec3::new(0.0, 2.0, -1.0));
    }

    #[test]
    fn move_without_lights_is_a_no_op() {
        let mut lights = LightSet::new();
        lights.remove_light().unwrap();
        lights.move_active(LightDirection::Left, &basis(), 1.0);
        assert!(lights.is_empty());
    }

    #[test]
    fn compensation_keeps_speed_constant() {
        for axes in 1..=3usize {
            let factor = axis_compensation(axes);
            let magnitude = (axes as f32 * factor * factor).sqrt();
            assert!((magnitude - 1.0).abs() < 1e-6);
        }
        assert_eq!(axis_compensation(0), 1.0);
    }
}

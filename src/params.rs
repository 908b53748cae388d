use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::technique::Technique;

pub const WEIGHT_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const SHININESS_RANGE: RangeInclusive<f32> = 0.0..=128.0;
pub const REPEAT_RANGE: RangeInclusive<u32> = 1..=5;
pub const HEIGHT_SCALE_RANGE: RangeInclusive<f32> = 0.0..=3.0;
pub const SPIN_SPEED_RANGE: RangeInclusive<f32> = 0.0..=10.0;

/// Material, animation and technique settings edited from the control panels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderParameters {
    pub kd: f32,
    pub ks: f32,
    pub ka: f32,
    pub specular_color: [f32; 3],
    pub ambient_color: [f32; 3],
    pub shininess: f32,
    pub repeat: u32,
    pub height_scale: f32,
    pub spin_speed: f32,
    pub spinning: bool,
    pub wireframe: bool,
    pub technique: Technique,
    pub texture_set: usize,
}

impl Default for RenderParameters {
    fn default() -> Self {
        Self {
            kd: 0.65,
            ks: 0.1,
            ka: 0.05,
            specular_color: [1.0, 1.0, 1.0],
            ambient_color: [0.1, 0.1, 0.1],
            shininess: 32.0,
            repeat: 1,
            height_scale: 1.5,
            spin_speed: 0.5,
            spinning: true,
            wireframe: false,
            technique: Technique::Plain,
            texture_set: 0,
        }
    }
}

impl RenderParameters {
    /// Clamps the texture-set selection to the number of loaded sets.
    pub fn clamp_texture_set(&mut self, set_count: usize) {
        self.texture_set = self.texture_set.min(set_count.saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_sit_inside_ui_ranges() {
        let params = RenderParameters::default();
        for weight in [params.kd, params.ks, params.ka] {
            assert!(WEIGHT_RANGE.contains(&weight));
        }
        assert!(SHININESS_RANGE.contains(&params.shininess));
        assert!(REPEAT_RANGE.contains(&params.repeat));
        assert!(HEIGHT_SCALE_RANGE.contains(&params.height_scale));
        assert!(SPIN_SPEED_RANGE.contains(&params.spin_speed));
        assert_eq!(params.technique, Technique::Plain);
    }

    #[test]
    fn texture_set_is_clamped() {
        let mut params = RenderParameters {
            texture_set: 7,
            ..RenderParameters::default()
        };
        params.clamp_texture_set(3);
        assert_eq!(params.texture_set, 2);
    }
}

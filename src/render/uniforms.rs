use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};

use crate::lights::MAX_LIGHTS;
use crate::params::RenderParameters;

/// Per-frame values shared by every draw. Mirrors `Globals` in
/// `shaders/common.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GlobalUniform {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub view_position: [f32; 4],
    pub specular_color: [f32; 4],
    pub ambient_color: [f32; 4],
    pub light_positions: [[f32; 4]; MAX_LIGHTS],
    pub light_count: u32,
    pub repeat_count: f32,
    pub ka: f32,
    pub kd: f32,
    pub ks: f32,
    pub shininess: f32,
    pub height_scale: f32,
    pub _padding: f32,
}

impl GlobalUniform {
    /// Packs the frame state. `height_scale` is taken as given so the caller
    /// decides whether the current technique reads it.
    pub fn new(
        projection: Mat4,
        view: Mat4,
        view_position: Vec3,
        params: &RenderParameters,
        lights: &[Vec3],
        height_scale: f32,
    ) -> Self {
        let mut light_positions = [[0.0; 4]; MAX_LIGHTS];
        for (slot, light) in light_positions.iter_mut().zip(lights) {
            *slot = light.extend(1.0).to_array();
        }
        Self {
            projection: projection.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            view_position: view_position.extend(1.0).to_array(),
            specular_color: rgb_to_vec4(params.specular_color),
            ambient_color: rgb_to_vec4(params.ambient_color),
            light_positions,
            light_count: lights.len().min(MAX_LIGHTS) as u32,
            repeat_count: params.repeat as f32,
            ka: params.ka,
            kd: params.kd,
            ks: params.ks,
            shininess: params.shininess,
            height_scale,
            _padding: 0.0,
        }
    }
}

/// Per-draw transform. Mirrors `Object` in `shaders/common.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 3],
    pub _padding: [u32; 4],
}

impl ObjectUniform {
    pub fn new(model: Mat4, normal: Mat3) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            normal: mat3_to_3x4(normal),
            _padding: [0; 4],
        }
    }
}

fn rgb_to_vec4(rgb: [f32; 3]) -> [f32; 4] {
    [rgb[0], rgb[1], rgb[2], 1.0]
}

fn mat3_to_3x4(matrix: Mat3) -> [[f32; 4]; 3] {
    [
        matrix.x_axis.extend(0.0).to_array(),
        matrix.y_axis.extend(0.0).to_array(),
        matrix.z_axis.extend(0.0).to_array(),
    ]
}

/// Rounds `size` up to the next multiple of `alignment` (a power of two).
pub fn aligned_stride(size: u64, alignment: u64) -> u64 {
    debug_assert!(alignment.is_power_of_two());
    (size + alignment - 1) & !(alignment - 1)
}

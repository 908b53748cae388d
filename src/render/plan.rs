use glam::Mat4;

use crate::app::AppState;
use crate::scene::{light_marker_matrix, normal_matrix, MeshKind, Scene};
use crate::technique::Technique;

use super::uniforms::{GlobalUniform, ObjectUniform};

pub const FIELD_OF_VIEW_DEGREES: f32 = 45.0;
pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 10000.0;

/// Mesh used for the light markers.
pub const LIGHT_MARKER_MESH: MeshKind = MeshKind::Sphere;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonFill {
    Fill,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectDraw {
    pub mesh: MeshKind,
    pub uniform: ObjectUniform,
}

/// Everything the renderer needs to draw one frame, captured from the
/// application state before the UI gets a chance to change it.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    pub technique: Technique,
    pub texture_set: usize,
    pub polygon_fill: PolygonFill,
    /// Draw the subdivided patch meshes instead of the triangle meshes.
    pub tessellated: bool,
    pub globals: GlobalUniform,
    pub objects: Vec<ObjectDraw>,
    /// Empty when there are no lights.
    pub light_markers: Vec<ObjectUniform>,
}

pub fn projection_matrix(aspect_ratio: f32) -> Mat4 {
    Mat4::perspective_rh(
        FIELD_OF_VIEW_DEGREES.to_radians(),
        aspect_ratio,
        NEAR_PLANE,
        FAR_PLANE,
    )
}

impl FramePlan {
    pub fn build(state: &AppState, scene: &Scene, aspect_ratio: f32) -> Self {
        let params = &state.params;
        let technique = params.technique;
        let height_scale = if technique.uniforms().height_scale {
            params.height_scale
        } else {
            0.0
        };
        let globals = GlobalUniform::new(
            projection_matrix(aspect_ratio),
            state.camera.view_matrix(),
            state.camera.position(),
            params,
            state.lights.positions(),
            height_scale,
        );

        let objects = scene
            .objects
            .iter()
            .map(|object| {
                let model = object.model_matrix(state.orientation);
                ObjectDraw {
                    mesh: object.mesh,
                    uniform: ObjectUniform::new(model, normal_matrix(model)),
                }
            })
            .collect();

        let light_markers = state
            .lights
            .positions()
            .iter()
            .map(|position| {
                let model = light_marker_matrix(*position);
                ObjectUniform::new(model, normal_matrix(model))
            })
            .collect();

        Self {
            technique,
            texture_set: params.texture_set,
            polygon_fill: if params.wireframe {
                PolygonFill::Line
            } else {
                PolygonFill::Fill
            },
            tessellated: technique.uses_tessellation(),
            globals,
            objects,
            light_markers,
        }
    }
}

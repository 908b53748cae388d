use glam::{Mat3, Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Size of the marker sphere drawn at each light position.
pub const LIGHT_MARKER_SCALE: f32 = 0.2;

/// The three meshes the demo knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeshKind {
    Plane,
    Pot,
    Sphere,
}

impl MeshKind {
    pub const ALL: [MeshKind; 3] = [MeshKind::Plane, MeshKind::Pot, MeshKind::Sphere];

    pub fn name(self) -> &'static str {
        match self {
            MeshKind::Plane => "plane",
            MeshKind::Pot => "pot",
            MeshKind::Sphere => "sphere",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Object placed in the demo scene. Its transform is rebuilt every frame
/// from the shared spin angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub mesh: MeshKind,
    pub position: Vec3,
    /// Fixed rotation around X applied before the spin, in radians.
    pub tilt: f32,
    pub scale: f32,
}

impl SceneObject {
    pub fn model_matrix(&self, spin: f32) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_y(spin)
            * Mat4::from_rotation_x(self.tilt)
            * Mat4::from_scale(Vec3::splat(self.scale))
    }
}

/// Fixed set of objects drawn in the object pass, in draw order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
}

impl Scene {
    /// Plane, pot and sphere side by side.
    pub fn demo() -> Self {
        let object = |mesh: MeshKind, position: Vec3, tilt: f32, scale: f32| SceneObject {
            mesh,
            position,
            tilt,
            scale,
        };
        Self {
            objects: vec![
                object(
                    MeshKind::Plane,
                    Vec3::new(0.0, 0.0, -10.0),
                    90f32.to_radians(),
                    1.0,
                ),
                object(MeshKind::Pot, Vec3::new(10.0, 0.0, -10.0), 0.0, 3.0),
                object(MeshKind::Sphere, Vec3::new(-10.0, 0.0, -10.0), 0.0, 2.0),
            ],
        }
    }
}

/// Inverse-transpose of the upper 3x3 of `model`, used to transform normals.
pub fn normal_matrix(model: Mat4) -> Mat3 {
    Mat3::from_mat4(model).inverse().transpose()
}

pub fn light_marker_matrix(position: Vec3) -> Mat4 {
    Mat4::from_translation(position) * Mat4::from_scale(Vec3::splat(LIGHT_MARKER_SCALE))
}

//! Interactive comparison of surface-detail shading techniques.
//!
//! Three meshes are drawn with Blinn-Phong lighting and one of six programs
//! (plain, bump, normal, parallax, displacement, light marker). Everything
//! except [`Renderer`] is plain data and can be driven without a window,
//! which is how the `--summary-only` mode and the tests use it.

pub mod app;
pub mod assets;
pub mod camera;
pub mod config;
pub mod input;
pub mod lights;
pub mod obj;
pub mod params;
pub mod render;
pub mod scene;
pub mod technique;
pub mod texture;
pub mod ui;

pub use app::{window_title, AppState, FpsCounter, StartupError};
pub use assets::{DemoAssets, MeshAsset, MissingTexturePolicy};
pub use camera::{Camera, CameraMovement};
pub use config::DemoConfig;
pub use input::{InputAction, InputState, KeyCode, NamedKey};
pub use lights::{LightSet, LightSetError, MAX_LIGHTS};
pub use obj::{load_obj_from_str, ObjMesh};
pub use params::RenderParameters;
pub use render::{FramePlan, Renderer};
pub use scene::{MeshKind, Scene, SceneObject};
pub use technique::Technique;
pub use texture::{MipLevel, TextureError, TextureImage, TextureMap};
pub use ui::show_control_panels;

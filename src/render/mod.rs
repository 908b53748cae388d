mod native;
mod overlay;
pub mod plan;
pub mod shaders;
pub mod uniforms;

pub use native::Renderer;
pub use plan::{FramePlan, ObjectDraw, PolygonFill};
pub use uniforms::{GlobalUniform, ObjectUniform};

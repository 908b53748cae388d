use serde::{Deserialize, Serialize};

/// One of the six shader programs the demo can draw with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Technique {
    Plain,
    Bump,
    Normal,
    Parallax,
    Displacement,
    LightMarker,
}

/// Optional inputs a program reads on top of the shared globals and object
/// transform. Every program is built against the same pipeline layout;
/// `textures` decides whether the material declarations are compiled into
/// its shader and `height_scale` whether the slider value is uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformSurface {
    pub textures: bool,
    pub height_scale: bool,
}

impl Technique {
    pub const ALL: [Technique; 6] = [
        Technique::Plain,
        Technique::Bump,
        Technique::Normal,
        Technique::Parallax,
        Technique::Displacement,
        Technique::LightMarker,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Technique::Plain => "PLAIN",
            Technique::Bump => "BUMP",
            Technique::Normal => "NORMAL",
            Technique::Parallax => "PARALLAX",
            Technique::Displacement => "DISPLACEMENT",
            Technique::LightMarker => "LIGHT",
        }
    }

    /// Only displacement mapping draws subdivided patches.
    pub fn uses_tessellation(self) -> bool {
        matches!(self, Technique::Displacement)
    }

    pub fn uniforms(self) -> UniformSurface {
        UniformSurface {
            textures: self != Technique::LightMarker,
            height_scale: self == Technique::Displacement,
        }
    }
}

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::RgbaImage;
use thiserror::Error;

/// Role of an image inside a texture set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureMap {
    Diffuse = 0,
    Normal = 1,
    Height = 2,
}

impl TextureMap {
    pub const ALL: [TextureMap; 3] = [TextureMap::Diffuse, TextureMap::Normal, TextureMap::Height];

    pub fn name(self) -> &'static str {
        match self {
            TextureMap::Diffuse => "diffuse",
            TextureMap::Normal => "normal",
            TextureMap::Height => "height",
        }
    }

    /// Colour maps are sampled with sRGB decoding; normal and height maps hold
    /// linear data.
    pub fn is_srgb(self) -> bool {
        matches!(self, TextureMap::Diffuse)
    }

    /// Single texel used when the image for this map cannot be decoded.
    pub fn placeholder_texel(self) -> [u8; 4] {
        match self {
            TextureMap::Diffuse => [200, 200, 200, 255],
            TextureMap::Normal => [128, 128, 255, 255],
            TextureMap::Height => [0, 0, 0, 255],
        }
    }
}

/// Position of a map in the flat texture table: `3 * set + map`.
pub fn texture_slot(set: usize, map: TextureMap) -> usize {
    3 * set + map as usize
}

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to load texture {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("texture {path} has zero size")]
    Empty { path: PathBuf },
}

/// One level of a mip chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MipLevel {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Decoded RGBA8 pixels ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    pub placeholder: bool,
}

impl TextureImage {
    /// Loads an image from disk, flipped so that row zero is the bottom of the
    /// picture to match OBJ texture coordinates.
    pub fn load(path: &Path) -> Result<Self, TextureError> {
        let decoded = image::open(path).map_err(|source| TextureError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let rgba = decoded.flipv().into_rgba8();
        if rgba.width() == 0 || rgba.height() == 0 {
            return Err(TextureError::Empty {
                path: path.to_path_buf(),
            });
        }
        Ok(Self {
            label: path.display().to_string(),
            width: rgba.width(),
            height: rgba.height(),
            rgba: rgba.into_raw(),
            placeholder: false,
        })
    }

    pub fn placeholder(map: TextureMap, label: &str) -> Self {
        Self {
            label: format!("{label} ({} placeholder)", map.name()),
            width: 1,
            height: 1,
            rgba: map.placeholder_texel().to_vec(),
            placeholder: true,
        }
    }

    /// Full mip chain, level 0 first, halving each side down to 1x1.
    pub fn mip_chain(&self) -> Vec<MipLevel> {
        let base = MipLevel {
            width: self.width,
            height: self.height,
            rgba: self.rgba.clone(),
        };
        let Some(mut current) = RgbaImage::from_raw(self.width, self.height, self.rgba.clone())
        else {
            return vec![base];
        };
        let mut levels = vec![base];
        while current.width() > 1 || current.height() > 1 {
            let width = (current.width() / 2).max(1);
            let height = (current.height() / 2).max(1);
            current = imageops::resize(&current, width, height, FilterType::Triangle);
            levels.push(MipLevel {
                width,
                height,
                rgba: current.as_raw().clone(),
            });
        }
        levels
    }
}

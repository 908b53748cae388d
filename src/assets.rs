use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};

use crate::config::{DemoConfig, MaterialPaths};
use crate::obj::{load_obj_from_str, patch_level, subdivide, ObjMesh};
use crate::scene::MeshKind;
use crate::texture::{texture_slot, TextureError, TextureImage, TextureMap};

/// What to do when a texture image cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingTexturePolicy {
    /// Substitute a flat 1x1 texel and keep going.
    #[default]
    Placeholder,
    /// Refuse to start.
    Fail,
}

/// Triangle mesh plus the pre-subdivided variant drawn by displacement
/// mapping.
#[derive(Debug, Clone)]
pub struct MeshAsset {
    pub kind: MeshKind,
    pub triangles: ObjMesh,
    pub patches: ObjMesh,
    pub patch_level: u32,
}

impl MeshAsset {
    pub fn from_mesh(kind: MeshKind, triangles: ObjMesh) -> Self {
        let level = patch_level(triangles.face_count());
        let patches = subdivide(&triangles, level);
        Self {
            kind,
            triangles,
            patches,
            patch_level: level,
        }
    }

    pub fn face_count(&self) -> u32 {
        self.triangles.face_count()
    }
}

/// CPU-side copies of everything the renderer uploads at startup.
#[derive(Debug, Clone)]
pub struct DemoAssets {
    /// Indexed by [`MeshKind::index`].
    pub meshes: Vec<MeshAsset>,
    /// Flat table indexed by [`texture_slot`].
    pub textures: Vec<TextureImage>,
    pub material_names: Vec<String>,
}

impl DemoAssets {
    pub fn load(config: &DemoConfig, policy: MissingTexturePolicy) -> Result<Self> {
        let meshes = MeshKind::ALL
            .into_iter()
            .map(|kind| load_mesh(kind, config.meshes.path(kind)))
            .collect::<Result<Vec<_>>>()?;

        let mut textures = Vec::with_capacity(config.materials.len() * 3);
        for material in &config.materials {
            for map in TextureMap::ALL {
                textures.push(load_texture(material, map, policy)?);
            }
        }

        Ok(Self {
            meshes,
            textures,
            material_names: config.materials.iter().map(|m| m.name.clone()).collect(),
        })
    }

    pub fn mesh(&self, kind: MeshKind) -> &MeshAsset {
        &self.meshes[kind.index()]
    }

    pub fn texture(&self, set: usize, map: TextureMap) -> &TextureImage {
        &self.textures[texture_slot(set, map)]
    }

    pub fn texture_set_count(&self) -> usize {
        self.textures.len() / 3
    }

    pub fn placeholder_count(&self) -> usize {
        self.textures.iter().filter(|t| t.placeholder).count()
    }
}

fn load_mesh(kind: MeshKind, path: &Path) -> Result<MeshAsset> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("unable to read {} mesh {}", kind.name(), path.display()))?;
    let mesh = load_obj_from_str(&contents)
        .with_context(|| format!("failed to parse OBJ mesh {}", path.display()))?;
    let asset = MeshAsset::from_mesh(kind, mesh);
    info!(
        "loaded {} mesh: {} faces, patch level {}",
        kind.name(),
        asset.face_count(),
        asset.patch_level
    );
    Ok(asset)
}

fn load_texture(
    material: &MaterialPaths,
    map: TextureMap,
    policy: MissingTexturePolicy,
) -> Result<TextureImage, TextureError> {
    let path = match map {
        TextureMap::Diffuse => &material.diffuse,
        TextureMap::Normal => &material.normal,
        TextureMap::Height => &material.height,
    };
    match TextureImage::load(path) {
        Ok(image) => Ok(image),
        Err(err) if policy == MissingTexturePolicy::Placeholder => {
            warn!("{err}; using a placeholder {} map", map.name());
            Ok(TextureImage::placeholder(map, &material.name))
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    const TRIANGLE: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nf 1/1 2/2 3/3\n";

    fn write_config(dir: &Path, with_images: bool) -> DemoConfig {
        for kind in MeshKind::ALL {
            fs::write(dir.join(format!("{}.obj", kind.name())), TRIANGLE).unwrap();
        }
        let material = MaterialPaths {
            name: "test".to_string(),
            diffuse: dir.join("d.png"),
            normal: dir.join("n.png"),
            height: dir.join("h.png"),
        };
        if with_images {
            for path in [&material.diffuse, &material.normal, &material.height] {
                image::RgbImage::new(2, 2).save(path).unwrap();
            }
        }
        let mut config = DemoConfig::default();
        config.meshes.plane = dir.join("plane.obj");
        config.meshes.pot = dir.join("pot.obj");
        config.meshes.sphere = dir.join("sphere.obj");
        config.materials = vec![material];
        config
    }

    #[test]
    fn loads_meshes_and_texture_sets() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path(), true);
        let assets = DemoAssets::load(&config, MissingTexturePolicy::Fail).unwrap();
        for kind in MeshKind::ALL {
            assert_eq!(assets.mesh(kind).face_count(), 1);
        }
        assert_eq!(assets.texture_set_count(), 1);
        assert_eq!(assets.placeholder_count(), 0);
        assert_eq!(assets.texture(0, TextureMap::Height).width, 2);
        let plane = assets.mesh(MeshKind::Plane);
        assert_eq!(
            plane.patches.face_count(),
            plane.patch_level * plane.patch_level
        );
    }

    #[test]
    fn missing_textures_follow_policy() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path(), false);

        let assets = DemoAssets::load(&config, MissingTexturePolicy::Placeholder).unwrap();
        assert_eq!(assets.placeholder_count(), 3);
        assert_eq!(assets.texture(0, TextureMap::Normal).rgba, vec![128, 128, 255, 255]);

        assert!(DemoAssets::load(&config, MissingTexturePolicy::Fail).is_err());
    }

    #[test]
    fn missing_mesh_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = write_config(dir.path(), true);
        config.meshes.pot = PathBuf::from("nowhere/pot.obj");
        let err = DemoAssets::load(&config, MissingTexturePolicy::Placeholder).unwrap_err();
        assert!(format!("{err:#}").contains("pot mesh"));
    }
}

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::scene::MeshKind;

/// Startup description of the demo: window, meshes and texture sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoConfig {
    pub window: WindowConfig,
    pub meshes: MeshPaths,
    pub materials: Vec<MaterialPaths>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshPaths {
    pub plane: PathBuf,
    pub pot: PathBuf,
    pub sphere: PathBuf,
}

impl MeshPaths {
    pub fn path(&self, kind: MeshKind) -> &Path {
        match kind {
            MeshKind::Plane => &self.plane,
            MeshKind::Pot => &self.pot,
            MeshKind::Sphere => &self.sphere,
        }
    }

    fn path_mut(&mut self, kind: MeshKind) -> &mut PathBuf {
        match kind {
            MeshKind::Plane => &mut self.plane,
            MeshKind::Pot => &mut self.pot,
            MeshKind::Sphere => &mut self.sphere,
        }
    }
}

/// Diffuse/normal/height image paths of one material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialPaths {
    pub name: String,
    pub diffuse: PathBuf,
    pub normal: PathBuf,
    pub height: PathBuf,
}

impl MaterialPaths {
    fn in_dir(name: &str, dir: &str, extension: &str) -> Self {
        let root = Path::new("assets/textures").join(dir);
        Self {
            name: name.to_string(),
            diffuse: root.join(format!("diffuse.{extension}")),
            normal: root.join(format!("normal.{extension}")),
            height: root.join(format!("height.{extension}")),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig {
                title: "Bump Mapping".to_string(),
                width: 1920,
                height: 1080,
            },
            meshes: MeshPaths {
                plane: PathBuf::from("assets/models/plane.obj"),
                pot: PathBuf::from("assets/models/pot.obj"),
                sphere: PathBuf::from("assets/models/sphere.obj"),
            },
            materials: vec![
                MaterialPaths::in_dir("cobble", "cobble", "png"),
                MaterialPaths::in_dir("brick wall", "bw", "png"),
                MaterialPaths::in_dir("sofa", "sofa", "jpg"),
            ],
        }
    }
}

impl DemoConfig {
    /// Reads a config file; relative asset paths resolve against its directory.
    pub fn load(path: &Path) -> Result<Self> {
        let xml = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        Self::from_xml(&xml, base_dir)
    }

    /// Parses the demo XML. Elements that are left out keep their defaults.
    pub fn from_xml(xml: &str, base_dir: &Path) -> Result<Self> {
        let document = Document::parse(xml).context("invalid config XML")?;
        let root = document.root_element();
        if !root.has_tag_name("demo") {
            return Err(anyhow!(
                "expected <demo> root element, found <{}>",
                root.tag_name().name()
            ));
        }

        let mut config = Self::default();

        if let Some(window) = root.children().find(|n| n.has_tag_name("window")) {
            if let Some(title) = optional_text(&window, "title") {
                config.window.title = title;
            }
            config.window.width =
                parse_dimension(optional_text(&window, "width"), config.window.width)
                    .context("invalid window width")?;
            config.window.height =
                parse_dimension(optional_text(&window, "height"), config.window.height)
                    .context("invalid window height")?;
        }

        for node in root.children().filter(|n| n.has_tag_name("mesh")) {
            let name = required_text(&node, "name")?;
            let kind = MeshKind::from_name(&name)
                .ok_or_else(|| anyhow!("unknown mesh <name> {name:?}"))?;
            *config.meshes.path_mut(kind) = base_dir.join(required_text(&node, "path")?);
        }

        let materials = root
            .children()
            .filter(|n| n.has_tag_name("material"))
            .map(|node| parse_material(&node, base_dir))
            .collect::<Result<Vec<_>>>()?;
        if !materials.is_empty() {
            config.materials = materials;
        }

        Ok(config)
    }
}

fn parse_material(node: &Node<'_, '_>, base_dir: &Path) -> Result<MaterialPaths> {
    let name = required_text(node, "name")?;
    let path = |tag: &str| -> Result<PathBuf> {
        let value = required_text(node, tag)
            .with_context(|| format!("material {name:?} is incomplete"))?;
        Ok(base_dir.join(value))
    };
    Ok(MaterialPaths {
        diffuse: path("diffuse")?,
        normal: path("normal")?,
        height: path("height")?,
        name,
    })
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_dimension(value: Option<String>, default: u32) -> Result<u32> {
    let Some(value) = value else {
        return Ok(default);
    };
    let parsed = value
        .parse::<u32>()
        .map_err(|err| anyhow!("failed to parse {value:?}: {err}"))?;
    if parsed == 0 {
        return Err(anyhow!("window dimensions must be positive"));
    }
    Ok(parsed)
}

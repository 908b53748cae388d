use std::borrow::Cow;

use crate::technique::Technique;

const COMMON: &str = include_str!("shaders/common.wgsl");
const MATERIAL: &str = include_str!("shaders/material.wgsl");

fn body(technique: Technique) -> &'static str {
    match technique {
        Technique::Plain => include_str!("shaders/plain.wgsl"),
        Technique::Bump => include_str!("shaders/bump.wgsl"),
        Technique::Normal => include_str!("shaders/normal.wgsl"),
        Technique::Parallax => include_str!("shaders/parallax.wgsl"),
        Technique::Displacement => include_str!("shaders/displacement.wgsl"),
        Technique::LightMarker => include_str!("shaders/light.wgsl"),
    }
}

/// Full WGSL module for a technique: shared declarations, material helpers
/// when the program samples textures, then the entry points.
pub fn shader_source(technique: Technique) -> Cow<'static, str> {
    let mut source = String::from(COMMON);
    if technique.uniforms().textures {
        source.push('\n');
        source.push_str(MATERIAL);
    }
    source.push('\n');
    source.push_str(body(technique));
    Cow::Owned(source)
}

pub fn shader_module(device: &wgpu::Device, technique: Technique) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(technique.name()),
        source: wgpu::ShaderSource::Wgsl(shader_source(technique)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_program_has_both_entry_points() {
        for technique in Technique::ALL {
            let source = shader_source(technique);
            assert!(source.contains("fn vs_main"), "{}", technique.name());
            assert!(source.contains("fn fs_main"), "{}", technique.name());
            assert!(source.contains("struct Globals"));
        }
    }

    #[test]
    fn light_marker_skips_material_bindings() {
        assert!(!shader_source(Technique::LightMarker).contains("diffuse_map"));
        assert!(shader_source(Technique::Bump).contains("height_map"));
    }

    #[test]
    fn only_displacement_reads_height_scale() {
        for technique in Technique::ALL {
            let reads = shader_source(technique).contains("globals.height_scale");
            assert_eq!(reads, technique.uniforms().height_scale, "{}", technique.name());
        }
    }
}

use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Number of `f32` components per interleaved vertex.
pub const VERTEX_STRIDE: usize = 14;

/// GPU ready mesh buffers produced from an OBJ file.
///
/// Vertices are laid out as `position.xyz`, `normal.xyz`, `uv.xy`,
/// `tangent.xyz` and `bitangent.xyz`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ObjMesh {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl ObjMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VERTEX_STRIDE
    }

    pub fn face_count(&self) -> u32 {
        (self.indices.len() / 3) as u32
    }

    fn vertex(&self, index: usize) -> Vertex {
        Vertex::read(&self.vertices[index * VERTEX_STRIDE..(index + 1) * VERTEX_STRIDE])
    }
}

/// Parses an OBJ file from memory and returns interleaved vertex/index arrays.
pub fn load_obj_from_str(data: &str) -> Result<ObjMesh> {
    let mut positions = Vec::new();
    let mut texcoords = Vec::new();
    let mut normals = Vec::new();
    let mut faces: Vec<[FaceIndex; 3]> = Vec::new();

    for (line_no, line) in data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };
        match tag {
            "v" => positions.push(
                parse_vec3(parts)
                    .with_context(|| format!("invalid vertex on line {}", line_no + 1))?,
            ),
            "vt" => texcoords.push(parse_vec2(parts).with_context(|| {
                format!("invalid texture coordinate on line {}", line_no + 1)
            })?),
            "vn" => normals.push(
                parse_vec3(parts)
                    .with_context(|| format!("invalid normal on line {}", line_no + 1))?,
            ),
            "f" => {
                let polygon = parse_face(parts)
                    .with_context(|| format!("invalid face on line {}", line_no + 1))?;
                triangulate_face(&polygon, &mut faces);
            }
            _ => {}
        }
    }

    if positions.is_empty() {
        return Err(anyhow!("OBJ file does not define any vertices"));
    }

    let mut mesh = build_mesh(&positions, &texcoords, &normals, &faces)?;
    if needs_normals(&mesh.vertices) {
        compute_normals(&mut mesh);
    }
    compute_tangents(&mut mesh);
    Ok(mesh)
}

/// Picks how many segments each triangle edge is split into for the patch
/// variant of a mesh. Coarse meshes get finer patches so that every object
/// ends up with a comparable amount of displaced geometry.
pub fn patch_level(face_count: u32) -> u32 {
    const TARGET_FACES: f32 = 32_768.0;
    const MAX_LEVEL: u32 = 64;
    if face_count == 0 {
        return 1;
    }
    let level = (TARGET_FACES / face_count as f32).sqrt().floor() as u32;
    level.clamp(1, MAX_LEVEL)
}

/// Splits every triangle of `mesh` into `level * level` smaller triangles,
/// interpolating all vertex attributes barycentrically.
pub fn subdivide(mesh: &ObjMesh, level: u32) -> ObjMesh {
    let level = level.max(1);
    if level == 1 {
        return mesh.clone();
    }

    let n = level as usize;
    let grid_vertices = (n + 1) * (n + 2) / 2;
    let mut vertices = Vec::with_capacity(mesh.indices.len() / 3 * grid_vertices * VERTEX_STRIDE);
    let mut indices = Vec::with_capacity(mesh.indices.len() * n * n);

    for triangle in mesh.indices.chunks_exact(3) {
        let corners = [
            mesh.vertex(triangle[0] as usize),
            mesh.vertex(triangle[1] as usize),
            mesh.vertex(triangle[2] as usize),
        ];
        let base = (vertices.len() / VERTEX_STRIDE) as u32;

        for row in 0..=n {
            for col in 0..=(n - row) {
                let w1 = col as f32 / n as f32;
                let w2 = row as f32 / n as f32;
                let w0 = 1.0 - w1 - w2;
                Vertex::blend(&corners, [w0, w1, w2]).write(&mut vertices);
            }
        }

        let at = |row: usize, col: usize| -> u32 {
            base + (row * (n + 1) - row * row.saturating_sub(1) / 2 + col) as u32
        };
        for row in 0..n {
            for col in 0..(n - row) {
                indices.extend_from_slice(&[at(row, col), at(row, col + 1), at(row + 1, col)]);
                if col + 1 < n - row {
                    indices.extend_from_slice(&[
                        at(row, col + 1),
                        at(row + 1, col + 1),
                        at(row + 1, col),
                    ]);
                }
            }
        }
    }

    ObjMesh { vertices, indices }
}

fn parse_vec3<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Vec3> {
    let x = parts
        .next()
        .ok_or_else(|| anyhow!("missing vector component"))?
        .parse::<f32>()?;
    let y = parts
        .next()
        .ok_or_else(|| anyhow!("missing vector component"))?
        .parse::<f32>()?;
    let z = parts
        .next()
        .ok_or_else(|| anyhow!("missing vector component"))?
        .parse::<f32>()?;
    Ok(Vec3::new(x, y, z))
}

fn parse_vec2<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Vec2> {
    let u = parts
        .next()
        .ok_or_else(|| anyhow!("missing texture coordinate"))?
        .parse::<f32>()?;
    let v = match parts.next() {
        Some(v) => v.parse::<f32>()?,
        None => 0.0,
    };
    Ok(Vec2::new(u, v))
}

fn parse_face<'a>(parts: impl Iterator<Item = &'a str>) -> Result<Vec<FaceIndex>> {
    let mut indices = Vec::new();
    for part in parts {
        let mut segments = part.split('/');
        let v = segments
            .next()
            .ok_or_else(|| anyhow!("missing vertex index"))?
            .parse::<i32>()?;
        let vt = parse_optional_index(segments.next())?;
        let vn = parse_optional_index(segments.next())?;
        indices.push(FaceIndex { v, vt, vn });
    }
    if indices.len() < 3 {
        return Err(anyhow!("faces must reference at least 3 vertices"));
    }
    Ok(indices)
}

fn parse_optional_index(segment: Option<&str>) -> Result<i32> {
    match segment {
        Some(s) if !s.is_empty() => Ok(s.parse::<i32>()?),
        _ => Ok(0),
    }
}

fn triangulate_face(polygon: &[FaceIndex], faces: &mut Vec<[FaceIndex; 3]>) {
    if polygon.len() < 3 {
        return;
    }
    for i in 1..(polygon.len() - 1) {
        faces.push([polygon[0], polygon[i], polygon[i + 1]]);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Key {
    position: usize,
    texcoord: Option<usize>,
    normal: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
struct FaceIndex {
    v: i32,
    vt: i32,
    vn: i32,
}

#[derive(Debug, Clone, Copy, Default)]
struct Vertex {
    position: Vec3,
    normal: Vec3,
    uv: Vec2,
    tangent: Vec3,
    bitangent: Vec3,
}

impl Vertex {
    fn read(chunk: &[f32]) -> Self {
        Self {
            position: Vec3::from_slice(&chunk[0..3]),
            normal: Vec3::from_slice(&chunk[3..6]),
            uv: Vec2::from_slice(&chunk[6..8]),
            tangent: Vec3::from_slice(&chunk[8..11]),
            bitangent: Vec3::from_slice(&chunk[11..14]),
        }
    }

    fn write(&self, out: &mut Vec<f32>) {
        out.extend_from_slice(&self.position.to_array());
        out.extend_from_slice(&self.normal.to_array());
        out.extend_from_slice(&self.uv.to_array());
        out.extend_from_slice(&self.tangent.to_array());
        out.extend_from_slice(&self.bitangent.to_array());
    }

    fn blend(corners: &[Vertex; 3], weights: [f32; 3]) -> Self {
        let mut out = Vertex::default();
        for (corner, weight) in corners.iter().zip(weights) {
            out.position += corner.position * weight;
            out.normal += corner.normal * weight;
            out.uv += corner.uv * weight;
            out.tangent += corner.tangent * weight;
            out.bitangent += corner.bitangent * weight;
        }
        out.normal = out.normal.normalize_or_zero();
        out.tangent = out.tangent.normalize_or_zero();
        out.bitangent = out.bitangent.normalize_or_zero();
        out
    }
}

fn build_mesh(
    positions: &[Vec3],
    texcoords: &[Vec2],
    normals: &[Vec3],
    faces: &[[FaceIndex; 3]],
) -> Result<ObjMesh> {
    let mut lookup: HashMap<Key, u32> = HashMap::new();
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for face in faces {
        for idx in face {
            let pos_index =
                fix_index(idx.v, positions.len()).ok_or_else(|| anyhow!("invalid vertex index"))?;
            let key = Key {
                position: pos_index,
                texcoord: fix_index(idx.vt, texcoords.len()),
                normal: fix_index(idx.vn, normals.len()),
            };
            let next_index = (vertices.len() / VERTEX_STRIDE) as u32;
            let entry = lookup.entry(key).or_insert_with(|| {
                Vertex {
                    position: positions[pos_index],
                    normal: key.normal.map(|i| normals[i]).unwrap_or(Vec3::ZERO),
                    uv: key.texcoord.map(|i| texcoords[i]).unwrap_or(Vec2::ZERO),
                    ..Vertex::default()
                }
                .write(&mut vertices);
                next_index
            });
            indices.push(*entry);
        }
    }

    Ok(ObjMesh { vertices, indices })
}

fn fix_index(index: i32, len: usize) -> Option<usize> {
    if index > 0 {
        let zero_based = index as usize - 1;
        (zero_based < len).then_some(zero_based)
    } else if index < 0 {
        let abs = index.unsigned_abs() as usize;
        (abs <= len).then_some(len - abs)
    } else {
        None
    }
}

fn needs_normals(vertices: &[f32]) -> bool {
    vertices
        .chunks_exact(VERTEX_STRIDE)
        .any(|chunk| chunk[3] == 0.0 && chunk[4] == 0.0 && chunk[5] == 0.0)
}

fn compute_normals(mesh: &mut ObjMesh) {
    let mut accum = vec![Vec3::ZERO; mesh.vertex_count()];

    for triangle in mesh.indices.chunks_exact(3) {
        let [i0, i1, i2] = [triangle[0] as usize, triangle[1] as usize, triangle[2] as usize];
        let p0 = mesh.vertex(i0).position;
        let p1 = mesh.vertex(i1).position;
        let p2 = mesh.vertex(i2).position;
        let normal = (p1 - p0).cross(p2 - p0);
        if normal.length_squared() > f32::EPSILON {
            let normal = normal.normalize();
            accum[i0] += normal;
            accum[i1] += normal;
            accum[i2] += normal;
        }
    }

    for (i, normal) in accum.into_iter().enumerate() {
        let normal = normal.normalize_or_zero();
        mesh.vertices[i * VERTEX_STRIDE + 3..i * VERTEX_STRIDE + 6]
            .copy_from_slice(&normal.to_array());
    }
}

/// Accumulates per-triangle tangent frames from the UV layout and
/// orthogonalises them against the vertex normal (Gram-Schmidt).
fn compute_tangents(mesh: &mut ObjMesh) {
    let vertex_count = mesh.vertex_count();
    let mut tangents = vec![Vec3::ZERO; vertex_count];
    let mut bitangents = vec![Vec3::ZERO; vertex_count];

    for triangle in mesh.indices.chunks_exact(3) {
        let [i0, i1, i2] = [triangle[0] as usize, triangle[1] as usize, triangle[2] as usize];
        let (v0, v1, v2) = (mesh.vertex(i0), mesh.vertex(i1), mesh.vertex(i2));
        let edge1 = v1.position - v0.position;
        let edge2 = v2.position - v0.position;
        let duv1 = v1.uv - v0.uv;
        let duv2 = v2.uv - v0.uv;
        let det = duv1.x * duv2.y - duv2.x * duv1.y;
        if det.abs() <= f32::EPSILON {
            continue;
        }
        let r = 1.0 / det;
        let tangent = (edge1 * duv2.y - edge2 * duv1.y) * r;
        let bitangent = (edge2 * duv1.x - edge1 * duv2.x) * r;
        for i in [i0, i1, i2] {
            tangents[i] += tangent;
            bitangents[i] += bitangent;
        }
    }

    for i in 0..vertex_count {
        let normal = mesh.vertex(i).normal;
        let mut tangent = (tangents[i] - normal * normal.dot(tangents[i])).normalize_or_zero();
        if tangent == Vec3::ZERO {
            tangent = fallback_tangent(normal);
        }
        let mut bitangent = normal.cross(tangent);
        if bitangent.dot(bitangents[i]) < 0.0 {
            bitangent = -bitangent;
        }
        let base = i * VERTEX_STRIDE;
        mesh.vertices[base + 8..base + 11].copy_from_slice(&tangent.to_array());
        mesh.vertices[base + 11..base + 14].copy_from_slice(&bitangent.to_array());
    }
}

fn fallback_tangent(normal: Vec3) -> Vec3 {
    let axis = if normal.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    (axis - normal * normal.dot(axis)).normalize_or_zero()
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
v -1 0 -1
v 1 0 -1
v 1 0 1
v -1 0 1
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 1 0
f 1/1/1 4/4/1 3/3/1 2/2/1
";

    #[test]
    fn parses_simple_triangle() {
        let obj = "\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let mesh = load_obj_from_str(obj).unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.vertices.len(), 3 * VERTEX_STRIDE);
        assert_eq!(mesh.face_count(), 1);
    }

    #[test]
    fn computes_missing_normals() {
        let obj = "\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let mesh = load_obj_from_str(obj).unwrap();
        for i in 0..mesh.vertex_count() {
            assert!((mesh.vertex(i).normal.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn quads_are_triangulated_with_tangent_frames() {
        let mesh = load_obj_from_str(QUAD).unwrap();
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.vertex_count(), 4);
        for i in 0..mesh.vertex_count() {
            let vertex = mesh.vertex(i);
            assert!(vertex.tangent.dot(vertex.normal).abs() < 1e-5);
            assert!((vertex.tangent.length() - 1.0).abs() < 1e-5);
            assert!((vertex.bitangent.length() - 1.0).abs() < 1e-5);
        }
        // u grows along +x in the quad above
        assert!((mesh.vertex(0).tangent - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn missing_vertices_are_rejected() {
        assert!(load_obj_from_str("# nothing here\n").is_err());
        assert!(load_obj_from_str("v 0 0 0\nf 1 2\n").is_err());
    }

    #[test]
    fn most_negative_face_index_is_an_error() {
        let source = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -2147483648 2 3\n";
        assert!(load_obj_from_str(source).is_err());
        assert!(load_obj_from_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n").is_ok());
    }

    #[test]
    fn subdivision_multiplies_faces_by_level_squared() {
        let mesh = load_obj_from_str(QUAD).unwrap();
        for level in 1..=5 {
            let patched = subdivide(&mesh, level);
            assert_eq!(patched.face_count(), mesh.face_count() * level * level);
            let max_index = *patched.indices.iter().max().unwrap() as usize;
            assert!(max_index < patched.vertex_count());
        }
    }

    #[test]
    fn subdivision_keeps_vertices_on_the_original_surface() {
        let mesh = load_obj_from_str(QUAD).unwrap();
        let patched = subdivide(&mesh, 4);
        for i in 0..patched.vertex_count() {
            let vertex = patched.vertex(i);
            assert!(vertex.position.y.abs() < 1e-6);
            assert!(vertex.position.x.abs() <= 1.0 + 1e-6);
            assert!((vertex.normal - Vec3::Y).length() < 1e-5);
        }
    }

    #[test]
    fn subdivision_preserves_winding() {
        let mesh = load_obj_from_str(QUAD).unwrap();
        let patched = subdivide(&mesh, 3);
        for triangle in patched.indices.chunks_exact(3) {
            let p0 = patched.vertex(triangle[0] as usize).position;
            let p1 = patched.vertex(triangle[1] as usize).position;
            let p2 = patched.vertex(triangle[2] as usize).position;
            let normal = (p1 - p0).cross(p2 - p0);
            assert!(normal.y > 0.0);
        }
    }

    #[test]
    fn patch_level_scales_inversely_with_face_count() {
        assert_eq!(patch_level(0), 1);
        assert_eq!(patch_level(2), 64);
        assert_eq!(patch_level(2048), 4);
        assert_eq!(patch_level(1_000_000), 1);
    }
}

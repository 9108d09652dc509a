use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use glam::{Vec2, Vec3, Vec4};
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};
use tracing::debug;

use super::file_stem;
use crate::error::ImportError;
use crate::model::source::{PrimitiveKind, SourceMaterial, SourceMesh, SourceNode, SourceScene};

/// Load the `vertex` and `face` elements of a PLY file as one mesh.
/// Polygons are fanned into triangles.
pub fn load(path: &Path) -> Result<SourceScene, ImportError> {
    let scene_error = |reason: String| ImportError::SceneLoad {
        path: path.to_path_buf(),
        reason,
    };
    let file = File::open(path).map_err(|e| scene_error(e.to_string()))?;
    let ply = Parser::<DefaultElement>::new()
        .read_ply(&mut BufReader::new(file))
        .map_err(|e| scene_error(e.to_string()))?;

    let vertices = ply.payload.get("vertex").map(Vec::as_slice).unwrap_or_default();
    let faces = ply.payload.get("face").map(Vec::as_slice).unwrap_or_default();
    debug!("PLY '{}': {} vertices, {} faces", path.display(), vertices.len(), faces.len());

    let name = file_stem(path);
    let mut mesh = SourceMesh::new(name.clone(), PrimitiveKind::Triangle);
    mesh.positions = vertices
        .iter()
        .map(|v| {
            let axis = |key| scalar(v, key).unwrap_or(0.0);
            Vec3::new(axis("x"), axis("y"), axis("z"))
        })
        .collect();
    mesh.normals = vertices
        .iter()
        .map(|v| Some(Vec3::new(scalar(v, "nx")?, scalar(v, "ny")?, scalar(v, "nz")?)))
        .collect();
    mesh.tex_coords = vertices
        .iter()
        .map(|v| {
            let u = scalar(v, "u").or_else(|| scalar(v, "s"))?;
            let w = scalar(v, "v").or_else(|| scalar(v, "t"))?;
            Some(Vec2::new(u, w))
        })
        .collect();
    mesh.colors = vertices
        .iter()
        .map(|v| {
            let channel = |key| color_channel(v, key);
            Some(Vec4::new(channel("red")?, channel("green")?, channel("blue")?, channel("alpha").unwrap_or(1.0)))
        })
        .collect();

    for face in faces {
        let Some(polygon) = face_indices(face) else {
            continue;
        };
        if let Some((&first, rest)) = polygon.split_first() {
            for pair in rest.windows(2) {
                mesh.indices.extend_from_slice(&[first, pair[0], pair[1]]);
            }
        }
    }

    let mut root = SourceNode::new(name);
    root.meshes.push(0);
    Ok(SourceScene {
        root,
        meshes: vec![mesh],
        materials: vec![SourceMaterial::default()],
    })
}

fn scalar(element: &DefaultElement, key: &str) -> Option<f32> {
    let value = match element.get(key)? {
        Property::Char(v) => f32::from(*v),
        Property::UChar(v) => f32::from(*v),
        Property::Short(v) => f32::from(*v),
        Property::UShort(v) => f32::from(*v),
        Property::Int(v) => *v as f32,
        Property::UInt(v) => *v as f32,
        Property::Float(v) => *v,
        Property::Double(v) => *v as f32,
        _ => return None,
    };
    Some(value)
}

/// Colour channel in `0..=1`. Integer channels are 8-bit.
fn color_channel(element: &DefaultElement, key: &str) -> Option<f32> {
    match element.get(key)? {
        Property::Float(v) => Some(*v),
        Property::Double(v) => Some(*v as f32),
        _ => scalar(element, key).map(|v| v / 255.0),
    }
}

fn face_indices(face: &DefaultElement) -> Option<Vec<u32>> {
    let list = face.get("vertex_indices").or_else(|| face.get("vertex_index"))?;
    let indices = match list {
        Property::ListUChar(v) => v.iter().map(|&i| u32::from(i)).collect(),
        Property::ListUShort(v) => v.iter().map(|&i| u32::from(i)).collect(),
        Property::ListUInt(v) => v.clone(),
        Property::ListChar(v) => v.iter().filter_map(|&i| u32::try_from(i).ok()).collect(),
        Property::ListShort(v) => v.iter().filter_map(|&i| u32::try_from(i).ok()).collect(),
        Property::ListInt(v) => v.iter().filter_map(|&i| u32::try_from(i).ok()).collect(),
        _ => return None,
    };
    Some(indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLORED_QUAD: &str = "\
ply
format ascii 1.0
element vertex 4
property float x
property float y
property float z
property float nx
property float ny
property float nz
property uchar red
property uchar green
property uchar blue
element face 1
property list uchar int vertex_indices
end_header
0 0 0 0 0 1 255 0 0
1 0 0 0 0 1 0 255 0
1 1 0 0 0 1 0 0 255
0 1 0 0 0 1 255 255 255
4 0 1 2 3
";

    #[test]
    fn loads_vertex_attributes_and_fans_polygons() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tile.ply");
        std::fs::write(&path, COLORED_QUAD).unwrap();

        let scene = load(&path).unwrap();
        assert_eq!(scene.root.name, "tile");
        let mesh = &scene.meshes[0];
        assert_eq!(mesh.positions[2], Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(mesh.indices, [0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.normals.as_ref().unwrap()[3], Vec3::Z);
        assert!(mesh.tex_coords.is_none());
        let colors = mesh.colors.as_ref().unwrap();
        assert_eq!(colors[0], Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(colors[3], Vec4::ONE);
    }

    #[test]
    fn positions_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri.ply");
        std::fs::write(
            &path,
            "ply\nformat ascii 1.0\nelement vertex 3\nproperty float x\nproperty float y\nproperty float z\n\
             element face 1\nproperty list uchar uint vertex_index\nend_header\n0 0 0\n1 0 0\n0 1 0\n3 0 1 2\n",
        )
        .unwrap();

        let scene = load(&path).unwrap();
        let mesh = &scene.meshes[0];
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.indices, [0, 1, 2]);
        assert!(mesh.normals.is_none());
        assert!(mesh.colors.is_none());
    }

    #[test]
    fn malformed_header_is_a_scene_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.ply");
        std::fs::write(&path, "not a ply file\n").unwrap();
        assert!(matches!(load(&path), Err(ImportError::SceneLoad { .. })));
    }
}

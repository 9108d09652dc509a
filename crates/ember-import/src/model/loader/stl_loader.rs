use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use glam::Vec3;

use super::file_stem;
use crate::error::ImportError;
use crate::model::source::{PrimitiveKind, SourceMaterial, SourceMesh, SourceNode, SourceScene};

/// Load an ASCII or binary STL file as a single mesh on the root node.
///
/// STL carries face normals only; vertex normals are left to the
/// post-process steps.
pub fn load(path: &Path) -> Result<SourceScene, ImportError> {
    let scene_error = |reason: String| ImportError::SceneLoad {
        path: path.to_path_buf(),
        reason,
    };
    let file = File::open(path).map_err(|e| scene_error(e.to_string()))?;
    let stl = stl_io::read_stl(&mut BufReader::new(file)).map_err(|e| scene_error(e.to_string()))?;

    let name = file_stem(path);
    let mut mesh = SourceMesh::new(name.clone(), PrimitiveKind::Triangle);
    mesh.positions = stl.vertices.iter().map(|v| Vec3::new(v[0], v[1], v[2])).collect();
    mesh.indices = stl
        .faces
        .iter()
        .flat_map(|face| face.vertices)
        .filter_map(|index| u32::try_from(index).ok())
        .collect();

    let mut root = SourceNode::new(name);
    root.meshes.push(0);
    Ok(SourceScene {
        root,
        meshes: vec![mesh],
        materials: vec![SourceMaterial::default()],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Binary STL: 80 byte header, triangle count, then per triangle a
    /// normal, three corners and a 2 byte attribute.
    fn binary_stl(triangles: &[[[f32; 3]; 3]]) -> Vec<u8> {
        let mut bytes = vec![0u8; 80];
        bytes.extend_from_slice(&(triangles.len() as u32).to_le_bytes());
        for triangle in triangles {
            for value in [0.0f32, 0.0, 1.0] {
                bytes.extend_from_slice(&value.to_le_bytes());
            }
            for corner in triangle {
                for value in corner {
                    bytes.extend_from_slice(&value.to_le_bytes());
                }
            }
            bytes.extend_from_slice(&[0, 0]);
        }
        bytes
    }

    #[test]
    fn shared_corners_become_indexed_vertices() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plate.stl");
        let quad = [
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]],
            [[0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
        ];
        std::fs::write(&path, binary_stl(&quad)).unwrap();

        let scene = load(&path).unwrap();
        assert_eq!(scene.root.name, "plate");
        assert_eq!(scene.root.meshes, [0]);
        let mesh = &scene.meshes[0];
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.indices.len(), 6);
        assert!(mesh.normals.is_none());
        assert_eq!(mesh.positions[mesh.indices[2] as usize], Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(scene.materials.len(), 1);
    }

    #[test]
    fn missing_file_is_a_scene_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load(&dir.path().join("absent.stl")),
            Err(ImportError::SceneLoad { .. })
        ));
    }
}

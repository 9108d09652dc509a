use std::collections::BTreeMap;
use std::path::Path;

use glam::{Vec2, Vec3, Vec4};
use tracing::warn;

use super::file_stem;
use crate::error::ImportError;
use crate::model::source::{PrimitiveKind, SourceMaterial, SourceMesh, SourceNode, SourceScene};
use crate::model::textures::TextureSlot;

/// Load a Wavefront OBJ file and its material library. Each object becomes
/// a child of the root with one mesh.
pub fn load(path: &Path) -> Result<SourceScene, ImportError> {
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|e| ImportError::SceneLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let materials: Vec<SourceMaterial> = match materials {
        Ok(materials) => materials.iter().map(read_material).collect(),
        Err(e) => {
            warn!("No materials for '{}': {}", path.display(), e);
            Vec::new()
        }
    };

    let mut root = SourceNode::new(file_stem(path));
    let mut meshes = Vec::with_capacity(models.len());
    for (i, model) in models.iter().enumerate() {
        let name = if model.name.is_empty() {
            format!("Object{i}")
        } else {
            model.name.clone()
        };
        let mesh = &model.mesh;

        let mut source = SourceMesh::new(name.clone(), PrimitiveKind::Triangle);
        source.positions = mesh.positions.chunks_exact(3).map(Vec3::from_slice).collect();
        source.normals = (!mesh.normals.is_empty())
            .then(|| mesh.normals.chunks_exact(3).map(Vec3::from_slice).collect());
        source.tex_coords = (!mesh.texcoords.is_empty())
            .then(|| mesh.texcoords.chunks_exact(2).map(Vec2::from_slice).collect());
        source.colors = (!mesh.vertex_color.is_empty()).then(|| {
            mesh.vertex_color
                .chunks_exact(3)
                .map(|c| Vec3::from_slice(c).extend(1.0))
                .collect()
        });
        source.indices = mesh.indices.clone();
        // Objects without `usemtl` share a default material added below.
        source.material_index = mesh.material_id.unwrap_or(usize::MAX);

        let mut node = SourceNode::new(name);
        node.meshes.push(i);
        root.children.push(node);
        meshes.push(source);
    }

    let mut materials = materials;
    if meshes.iter().any(|mesh| mesh.material_index == usize::MAX) {
        let default_material = materials.len();
        materials.push(SourceMaterial::default());
        for mesh in meshes.iter_mut().filter(|mesh| mesh.material_index == usize::MAX) {
            mesh.material_index = default_material;
        }
    }

    Ok(SourceScene {
        root,
        meshes,
        materials,
    })
}

/// Parse an `r g b` colour statement.
fn parse_rgb(value: &str) -> Option<Vec3> {
    let channels: Vec<f32> = value
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    match channels.as_slice() {
        [r, g, b] => Some(Vec3::new(*r, *g, *b)),
        _ => None,
    }
}

fn read_material(material: &tobj::Material) -> SourceMaterial {
    let emissive = material
        .unknown_param
        .get("Ke")
        .and_then(|value| parse_rgb(value))
        .filter(|color| *color != Vec3::ZERO);

    let slots = [
        (TextureSlot::Diffuse, material.diffuse_texture.as_deref()),
        (TextureSlot::Normal, material.normal_texture.as_deref()),
        (TextureSlot::Surface, material.unknown_param.get("map_Pr").map(String::as_str)),
        (TextureSlot::Emissive, material.unknown_param.get("map_Ke").map(String::as_str)),
    ];
    let textures: BTreeMap<TextureSlot, String> = slots
        .into_iter()
        .filter_map(|(slot, path)| Some((slot, path.filter(|p| !p.is_empty())?.to_string())))
        .collect();

    SourceMaterial {
        name: (!material.name.is_empty()).then(|| material.name.clone()),
        diffuse: material.diffuse.map(|[r, g, b]| Vec4::new(r, g, b, material.dissolve.unwrap_or(1.0))),
        emissive: emissive.map(|color| color.extend(1.0)),
        textures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // `usemtl` carries over to later objects, so the object without a
    // material has to come first.
    const CUBE_FACE: &str = "\
mtllib scene.mtl
o Loose
v 0 0 1
v 1 0 1
v 0 1 1
f 1 2 3
o Panel
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
usemtl Painted
f 4/1/1 5/2/1 6/3/1 7/4/1
o Trim
v 0 0 2
v 1 0 2
v 0 1 2
f 8 9 10
";

    const LIBRARY: &str = "\
newmtl Painted
Kd 0.5 0.25 1.0
Ke 1 0 0
map_Kd C:/art/Textures/paint.png
map_Ke glow.png
";

    #[test]
    fn loads_objects_materials_and_textures() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("scene.mtl"), LIBRARY).unwrap();
        let path = dir.path().join("scene.obj");
        std::fs::write(&path, CUBE_FACE).unwrap();

        let scene = load(&path).unwrap();
        assert_eq!(scene.root.name, "scene");
        let children: Vec<_> = scene.root.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(children, ["Loose", "Panel", "Trim"]);

        let loose = &scene.meshes[0];
        assert!(loose.normals.is_none());
        assert_eq!(loose.material_index, 1);
        assert_eq!(scene.materials.len(), 2);
        assert_eq!(scene.materials[1], SourceMaterial::default());

        let panel = &scene.meshes[1];
        assert_eq!(panel.indices.len(), 6);
        assert_eq!(panel.vertex_count(), 4);
        assert!(panel.normals.is_some());
        assert!(panel.tex_coords.is_some());
        assert_eq!(panel.material_index, 0);

        // Inherits the material of the object before it.
        assert_eq!(scene.meshes[2].material_index, 0);

        let painted = &scene.materials[0];
        assert_eq!(painted.name.as_deref(), Some("Painted"));
        assert_eq!(painted.diffuse, Some(Vec4::new(0.5, 0.25, 1.0, 1.0)));
        assert_eq!(painted.emissive, Some(Vec4::new(1.0, 0.0, 0.0, 1.0)));
        assert_eq!(painted.textures[&TextureSlot::Diffuse], "C:/art/Textures/paint.png");
        assert_eq!(painted.textures[&TextureSlot::Emissive], "glow.png");
        assert!(!painted.textures.contains_key(&TextureSlot::Normal));
    }

    #[test]
    fn missing_library_keeps_geometry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.obj");
        std::fs::write(&path, CUBE_FACE).unwrap();

        let scene = load(&path).unwrap();
        assert_eq!(scene.meshes.len(), 3);
        let default_material = scene.materials.len() - 1;
        assert_eq!(scene.materials[default_material], SourceMaterial::default());
        assert_eq!(scene.meshes[0].material_index, default_material);
    }

    #[test]
    fn missing_file_is_a_scene_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load(&dir.path().join("absent.obj")),
            Err(ImportError::SceneLoad { .. })
        ));
    }

    #[test]
    fn rgb_statements() {
        assert_eq!(parse_rgb("0.1 0.2 0.3"), Some(Vec3::new(0.1, 0.2, 0.3)));
        assert_eq!(parse_rgb("0.1 0.2"), None);
        assert_eq!(parse_rgb("a b c"), None);
    }
}

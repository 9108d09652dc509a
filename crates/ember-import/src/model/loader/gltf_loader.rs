use std::collections::{BTreeMap, HashMap};
use std::ops::Range;
use std::path::Path;

use glam::{Mat4, Vec2, Vec3, Vec4};
use gltf::mesh::Mode;
use tracing::debug;

use super::file_stem;
use crate::error::ImportError;
use crate::model::source::{
    PrimitiveKind, SourceBone, SourceMaterial, SourceMesh, SourceNode, SourceScene, VertexWeight,
};
use crate::model::textures::TextureSlot;

/// Load a glTF 2.0 file. Every primitive becomes its own source mesh and the
/// scene's nodes hang under a root named after the file.
///
/// Only buffers are read. Images stay paths so the importer can bind them
/// to texture assets.
pub fn load(path: &Path) -> Result<SourceScene, ImportError> {
    let fail = |reason: String| ImportError::SceneLoad {
        path: path.to_path_buf(),
        reason,
    };
    let gltf::Gltf { document, blob } = gltf::Gltf::open(path).map_err(|e| fail(e.to_string()))?;
    let buffers = gltf::import_buffers(&document, path.parent(), blob).map_err(|e| fail(e.to_string()))?;
    let buffer_data = |buffer: gltf::Buffer<'_>| buffers.get(buffer.index()).map(|data| data.0.as_slice());

    let mut materials: Vec<SourceMaterial> = document.materials().map(read_material).collect();
    let default_material = materials.len();
    let mut needs_default_material = false;

    // Skin of the first node instancing each mesh.
    let mut skins = HashMap::new();
    for node in document.nodes() {
        if let (Some(mesh), Some(skin)) = (node.mesh(), node.skin()) {
            skins.entry(mesh.index()).or_insert(skin);
        }
    }

    let mut meshes = Vec::new();
    let mut mesh_ranges: Vec<Range<usize>> = Vec::new();
    for mesh in document.meshes() {
        let start = meshes.len();
        let base_name = mesh
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Mesh{}", mesh.index()));
        let primitive_count = mesh.primitives().count();

        for primitive in mesh.primitives() {
            let name = if primitive_count == 1 {
                base_name.clone()
            } else {
                format!("{base_name}_{}", primitive.index())
            };
            let reader = primitive.reader(buffer_data);

            let mut source = SourceMesh::new(name, primitive_kind(primitive.mode()));
            source.positions = reader
                .read_positions()
                .map(|iter| iter.map(Vec3::from).collect())
                .unwrap_or_default();
            source.normals = reader.read_normals().map(|iter| iter.map(Vec3::from).collect());
            source.tangents = reader
                .read_tangents()
                .map(|iter| iter.map(|t| Vec3::new(t[0], t[1], t[2])).collect());
            source.tex_coords = reader
                .read_tex_coords(0)
                .map(|tc| tc.into_f32().map(Vec2::from).collect());
            source.colors = reader
                .read_colors(0)
                .map(|c| c.into_rgba_f32().map(Vec4::from).collect());
            let vertex_count = source.positions.len() as u32;
            source.indices = reader
                .read_indices()
                .map(|idx| idx.into_u32().collect())
                .unwrap_or_else(|| (0..vertex_count).collect());

            source.material_index = primitive.material().index().unwrap_or_else(|| {
                needs_default_material = true;
                default_material
            });

            if let (Some(skin), Some(joints), Some(weights)) =
                (skins.get(&mesh.index()), reader.read_joints(0), reader.read_weights(0))
            {
                let inverse_binds: Vec<Mat4> = skin
                    .reader(buffer_data)
                    .read_inverse_bind_matrices()
                    .map(|iter| iter.map(|m| Mat4::from_cols_array_2d(&m)).collect())
                    .unwrap_or_default();
                source.bones = skin
                    .joints()
                    .enumerate()
                    .map(|(j, joint)| SourceBone {
                        name: node_name(&joint),
                        offset: inverse_binds.get(j).copied().unwrap_or(Mat4::IDENTITY),
                        weights: Vec::new(),
                    })
                    .collect();

                for (vertex, (joint_set, weight_set)) in joints.into_u16().zip(weights.into_f32()).enumerate() {
                    for (joint, weight) in joint_set.into_iter().zip(weight_set) {
                        if weight <= 0.0 {
                            continue;
                        }
                        if let Some(bone) = source.bones.get_mut(joint as usize) {
                            bone.weights.push(VertexWeight {
                                vertex: vertex as u32,
                                weight,
                            });
                        }
                    }
                }
            }

            meshes.push(source);
        }
        mesh_ranges.push(start..meshes.len());
    }

    if needs_default_material {
        materials.push(SourceMaterial::default());
    }

    let mut root = SourceNode::new(file_stem(path));
    if let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) {
        root.children = scene.nodes().map(|node| read_node(&node, &mesh_ranges)).collect();
    }

    debug!(
        "glTF '{}': {} primitives, {} materials",
        path.display(),
        meshes.len(),
        materials.len()
    );

    Ok(SourceScene {
        root,
        meshes,
        materials,
    })
}

fn primitive_kind(mode: Mode) -> PrimitiveKind {
    match mode {
        Mode::Points => PrimitiveKind::Point,
        Mode::Lines | Mode::LineLoop | Mode::LineStrip => PrimitiveKind::Line,
        Mode::Triangles => PrimitiveKind::Triangle,
        Mode::TriangleStrip => PrimitiveKind::TriangleStrip,
        Mode::TriangleFan => PrimitiveKind::TriangleFan,
    }
}

fn node_name(node: &gltf::Node<'_>) -> String {
    node.name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("Node{}", node.index()))
}

fn read_node(node: &gltf::Node<'_>, mesh_ranges: &[Range<usize>]) -> SourceNode {
    let mut out = SourceNode::new(node_name(node));
    out.transform = Mat4::from_cols_array_2d(&node.transform().matrix());
    if let Some(mesh) = node.mesh() {
        out.meshes = mesh_ranges.get(mesh.index()).cloned().unwrap_or_default().collect();
    }
    out.children = node.children().map(|child| read_node(&child, mesh_ranges)).collect();
    out
}

fn read_material(material: gltf::Material<'_>) -> SourceMaterial {
    let pbr = material.pbr_metallic_roughness();
    let emissive = Vec3::from(material.emissive_factor());

    let slots = [
        (TextureSlot::Diffuse, pbr.base_color_texture().map(|info| info.texture())),
        (TextureSlot::Normal, material.normal_texture().map(|normal| normal.texture())),
        (TextureSlot::Surface, pbr.metallic_roughness_texture().map(|info| info.texture())),
        (TextureSlot::Emissive, material.emissive_texture().map(|info| info.texture())),
    ];
    let mut textures = BTreeMap::new();
    for (slot, texture) in slots {
        if let Some(uri) = texture.as_ref().and_then(texture_uri) {
            textures.insert(slot, uri);
        }
    }

    SourceMaterial {
        name: material.name().map(str::to_string),
        diffuse: Some(Vec4::from(pbr.base_color_factor())),
        emissive: (emissive != Vec3::ZERO).then(|| emissive.extend(1.0)),
        textures,
    }
}

/// File path of an external image. Embedded images have none.
fn texture_uri(texture: &gltf::Texture<'_>) -> Option<String> {
    match texture.source().source() {
        gltf::image::Source::Uri { uri, .. } if !uri.starts_with("data:") => Some(uri.to_string()),
        _ => None,
    }
}

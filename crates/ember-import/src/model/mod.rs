//! Model import.
//!
//! A model file is loaded into a [`SourceScene`], post-processed according
//! to [`ModelImportSettings`], and converted into a [`Prefab`] main object
//! whose renderers reference mesh and material sub-objects of the same
//! asset.

mod loader;
mod postprocess;
mod settings;
mod skinning;
mod source;
mod textures;

use std::path::Path;

use ember_assets::{
    AssetLookup, AssetRef, ImportContext, Material, Mesh, MeshRenderer, NodeId, Prefab, Shader,
    Texture2D, Vertex,
};
use ember_core::{Color, Transform};
use glam::Vec3;
use tracing::info;

use crate::diagnostics::{Anomaly, Diagnostics, SkipReason};
use crate::error::ImportError;
use crate::importer::{check_extension, AssetImporter, ImportSettings};

pub use loader::load_scene;
pub use postprocess::{apply as post_process, PostProcessSteps};
pub use settings::ModelImportSettings;
pub use skinning::{assign_influence, normalize_weights, MAX_BONE_INDEX, MAX_INFLUENCES};
pub use source::{
    PrimitiveKind, SourceBone, SourceMaterial, SourceMesh, SourceNode, SourceScene, VertexWeight,
};
pub use textures::{find_texture, TextureSlot};

/// Shader every imported material uses.
pub const STANDARD_SHADER_PATH: &str = "Defaults/Standard.shader";

/// Name of materials with neither a source name nor a texture.
pub const DEFAULT_MATERIAL_NAME: &str = "StandardMat";

#[derive(Debug, Default, Clone, Copy)]
pub struct ModelImporter;

impl AssetImporter for ModelImporter {
    fn name(&self) -> &'static str {
        "model"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["obj", "blend", "dae", "fbx", "gltf", "ply", "pmx", "stl"]
    }

    fn import(
        &self,
        source: &Path,
        settings: &ImportSettings,
        lookup: &dyn AssetLookup,
        ctx: &mut dyn ImportContext,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), ImportError> {
        check_extension(self, source)?;
        let settings = &settings.model;

        let mut scene = load_scene(source)?;
        post_process(&mut scene, settings.post_process_steps(), settings.global_scale_factor);
        import_scene(&scene, source, settings, lookup, ctx, diagnostics)
    }
}

/// Imported mesh and the material it renders with.
struct MeshBinding {
    name: String,
    mesh: AssetRef<Mesh>,
    material: AssetRef<Material>,
    /// First bone of a skinned mesh.
    root_bone: Option<String>,
}

/// Convert a post-processed scene loaded from `source` into `ctx`.
///
/// Textures are looked up beside `source` and bound through `lookup`.
pub fn import_scene(
    scene: &SourceScene,
    source: &Path,
    settings: &ModelImportSettings,
    lookup: &dyn AssetLookup,
    ctx: &mut dyn ImportContext,
    diagnostics: &mut Diagnostics,
) -> Result<(), ImportError> {
    if scene.meshes.is_empty() {
        return Err(ImportError::NoMeshes(source.to_path_buf()));
    }
    let source_dir = source.parent().unwrap_or(Path::new("."));

    let mut prefab = Prefab::new(scene.root.name.clone());
    let mut node_meshes = Vec::new();
    build_nodes(&scene.root, None, &mut prefab, &mut node_meshes);

    let shader = AssetRef::<Shader>::from_path(Path::new(STANDARD_SHADER_PATH), lookup);
    let mut materials: Vec<AssetRef<Material>> = Vec::with_capacity(scene.materials.len());
    for source_material in &scene.materials {
        let material = build_material(source_material, &shader, source_dir, lookup, diagnostics);
        materials.push(AssetRef::from_identity(ctx.add_sub_object(material.into())?));
    }

    let mut fallback_material: Option<AssetRef<Material>> = None;
    let mut bindings = Vec::with_capacity(scene.meshes.len());
    for source_mesh in &scene.meshes {
        let Some(mesh) = build_mesh(source_mesh, &prefab, diagnostics) else {
            bindings.push(None);
            continue;
        };

        let material = match materials.get(source_mesh.material_index) {
            Some(material) => material.clone(),
            None => {
                diagnostics.report(Anomaly::MissingMaterial {
                    mesh: source_mesh.name.clone(),
                    index: source_mesh.material_index,
                });
                match fallback_material.clone() {
                    Some(material) => material,
                    None => {
                        let material =
                            build_material(&SourceMaterial::default(), &shader, source_dir, lookup, diagnostics);
                        let material = AssetRef::from_identity(ctx.add_sub_object(material.into())?);
                        fallback_material = Some(material.clone());
                        material
                    }
                }
            }
        };

        let root_bone = mesh.bone_names.as_ref().and_then(|names| names.first().cloned());
        let name = mesh.name.clone();
        let mesh = AssetRef::from_identity(ctx.add_sub_object(mesh.into())?);
        bindings.push(Some(MeshBinding {
            name,
            mesh,
            material,
            root_bone,
        }));
    }

    // A single mesh renders on its node, several get one child node each.
    for (node, mesh_indices) in node_meshes {
        let mut bound = mesh_indices
            .iter()
            .filter_map(|&index| bindings.get(index).and_then(Option::as_ref));
        if mesh_indices.len() == 1 {
            if let Some(binding) = bound.next() {
                attach_renderer(&mut prefab, node, binding);
            }
            continue;
        }
        for binding in bound {
            let child = prefab.add_node(Some(node), binding.name.clone(), Transform::IDENTITY);
            attach_renderer(&mut prefab, child, binding);
        }
    }

    if settings.unit_scale != 1.0 {
        if let Some(root) = prefab.node_mut(NodeId::ROOT) {
            root.transform.scale = Vec3::splat(settings.unit_scale);
        }
    }

    let imported = bindings.iter().flatten().count();
    info!(
        "Imported model '{}': {} of {} meshes, {} materials, {} nodes",
        prefab.name,
        imported,
        scene.meshes.len(),
        materials.len() + usize::from(fallback_material.is_some()),
        prefab.len()
    );
    ctx.set_main_object(prefab.into());
    Ok(())
}

/// Add `node` and its subtree depth-first, recording which meshes each
/// node carries.
fn build_nodes<'s>(
    node: &'s SourceNode,
    parent: Option<NodeId>,
    prefab: &mut Prefab,
    node_meshes: &mut Vec<(NodeId, &'s [usize])>,
) {
    let id = prefab.add_node(parent, node.name.clone(), Transform::from_matrix(node.transform));
    node_meshes.push((id, &node.meshes));
    for child in &node.children {
        build_nodes(child, Some(id), prefab, node_meshes);
    }
}

fn attach_renderer(prefab: &mut Prefab, node: NodeId, binding: &MeshBinding) {
    let renderer = match &binding.root_bone {
        Some(bone) => MeshRenderer::Skinned {
            mesh: binding.mesh.clone(),
            material: binding.material.clone(),
            root_bone: prefab.find_by_name(NodeId::ROOT, bone).unwrap_or(NodeId::ROOT),
        },
        None => MeshRenderer::Static {
            mesh: binding.mesh.clone(),
            material: binding.material.clone(),
        },
    };
    if let Some(node) = prefab.node_mut(node) {
        node.renderer = Some(renderer);
    }
}

/// File name without extension of a stored texture path, whichever
/// separator it was written with.
fn texture_stem(stored: &str) -> Option<String> {
    let file_name = stored.rsplit(&['/', '\\'][..]).next()?;
    Path::new(file_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
}

fn default_texture(slot: TextureSlot, lookup: &dyn AssetLookup) -> AssetRef<Texture2D> {
    AssetRef::from_path(Path::new(slot.default_path()), lookup)
}

/// Reference to the imported texture asset for `stored`, if the file is
/// found next to the model and has been imported.
fn bind_texture(
    slot: TextureSlot,
    stored: &str,
    source_dir: &Path,
    lookup: &dyn AssetLookup,
    diagnostics: &mut Diagnostics,
) -> Option<AssetRef<Texture2D>> {
    let Some(file) = find_texture(stored, source_dir) else {
        diagnostics.report(Anomaly::UnresolvedTexture {
            slot: slot.property(),
            path: stored.to_string(),
        });
        return None;
    };
    match lookup.resolve_path_to_identity(&file) {
        Some(identity) => Some(AssetRef::from_identity(identity)),
        None => {
            diagnostics.report(Anomaly::UnregisteredTexture {
                slot: slot.property(),
                path: file,
            });
            None
        }
    }
}

fn build_material(
    source: &SourceMaterial,
    shader: &AssetRef<Shader>,
    source_dir: &Path,
    lookup: &dyn AssetLookup,
    diagnostics: &mut Diagnostics,
) -> Material {
    let mut name = source.name.clone();
    let mut material = Material::new(String::new(), shader.clone());

    material.set_color("_MainColor", source.diffuse.map(Color::from).unwrap_or(Color::WHITE));
    match source.emissive {
        Some(emissive) => {
            material.set_float("_EmissionIntensity", 1.0);
            material.set_color("_EmissiveColor", Color::from(emissive));
        }
        None => {
            material.set_float("_EmissionIntensity", 0.0);
            material.set_color("_EmissiveColor", Color::BLACK);
        }
    }

    for slot in TextureSlot::ALL {
        let bound = source.textures.get(&slot).and_then(|stored| {
            if name.is_none() {
                name = texture_stem(stored);
            }
            bind_texture(slot, stored, source_dir, lookup, diagnostics)
        });
        let texture = match bound {
            Some(texture) => {
                if slot == TextureSlot::Emissive {
                    material.set_float("_EmissionIntensity", 1.0);
                }
                texture
            }
            None => default_texture(slot, lookup),
        };
        material.set_texture(slot.property(), texture);
    }

    material.name = name.unwrap_or_else(|| DEFAULT_MATERIAL_NAME.to_string());
    material
}

fn skipped(mesh: &SourceMesh, reason: SkipReason, diagnostics: &mut Diagnostics) -> Option<Mesh> {
    diagnostics.report(Anomaly::MeshSkipped {
        mesh: mesh.name.clone(),
        reason,
    });
    None
}

/// Convert one source mesh to the fixed vertex format, or `None` if it
/// can't be represented.
fn build_mesh(source: &SourceMesh, prefab: &Prefab, diagnostics: &mut Diagnostics) -> Option<Mesh> {
    if source.primitive != PrimitiveKind::Triangle {
        return skipped(source, SkipReason::NotTriangles, diagnostics);
    }
    let Some(normals) = &source.normals else {
        return skipped(source, SkipReason::NoNormals, diagnostics);
    };
    let Some(tangents) = &source.tangents else {
        return skipped(source, SkipReason::NoTangents, diagnostics);
    };
    let count = source.vertex_count();
    if count > usize::from(u16::MAX) + 1 {
        return skipped(source, SkipReason::TooManyVertices(count), diagnostics);
    }

    let vec3_at = |values: &[Vec3], i: usize| values.get(i).copied().unwrap_or(Vec3::ZERO).to_array();
    let mut mesh = Mesh::new(source.name.clone());
    mesh.vertices = source
        .positions
        .iter()
        .enumerate()
        .map(|(i, position)| Vertex {
            position: position.to_array(),
            tex_coord: source
                .tex_coords
                .as_ref()
                .and_then(|uvs| uvs.get(i))
                .map_or([0.0; 2], |uv| uv.to_array()),
            normal: vec3_at(normals, i),
            color: source
                .colors
                .as_ref()
                .and_then(|colors| colors.get(i))
                .map_or([1.0; 3], |color| color.truncate().to_array()),
            tangent: vec3_at(tangents, i),
            ..Vertex::default()
        })
        .collect();

    if source.has_bones() {
        bind_bones(source, &mut mesh, prefab, diagnostics);
    }

    mesh.indices = source
        .indices
        .chunks_exact(3)
        .filter(|tri| tri.iter().all(|&i| (i as usize) < count))
        .flatten()
        .map(|&i| i as u16)
        .collect();
    Some(mesh)
}

fn bind_bones(source: &SourceMesh, mesh: &mut Mesh, prefab: &Prefab, diagnostics: &mut Diagnostics) {
    let mut names = Vec::with_capacity(source.bones.len());
    let mut bind_poses = Vec::with_capacity(source.bones.len());

    for (i, bone) in source.bones.iter().enumerate() {
        names.push(bone.name.clone());
        let pose = prefab
            .find_by_name(NodeId::ROOT, &bone.name)
            .and_then(|node| prefab.node(node))
            .map(|node| node.transform);
        bind_poses.push(pose.unwrap_or_else(|| {
            diagnostics.report(Anomaly::MissingBoneNode {
                bone: bone.name.clone(),
            });
            Transform::IDENTITY
        }));

        if bone.weights.is_empty() {
            continue;
        }
        if i > MAX_BONE_INDEX {
            diagnostics.report(Anomaly::BoneIndexOverflow {
                mesh: source.name.clone(),
                bone: bone.name.clone(),
            });
            continue;
        }
        let slot = (i + 1) as u8;
        for weight in &bone.weights {
            let Some(vertex) = mesh.vertices.get_mut(weight.vertex as usize) else {
                continue;
            };
            if !assign_influence(vertex, slot, weight.weight) {
                diagnostics.report(Anomaly::ExcessBoneInfluence {
                    vertex: weight.vertex as usize,
                    bone: bone.name.clone(),
                });
            }
        }
    }

    mesh.vertices.iter_mut().for_each(normalize_weights);
    mesh.bone_names = Some(names);
    mesh.bind_poses = Some(bind_poses);
}

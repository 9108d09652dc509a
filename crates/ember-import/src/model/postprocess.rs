//! Scene rewrites run between loading and conversion.

use std::collections::{HashMap, HashSet};

use bitflags::bitflags;
use glam::{Mat4, Vec2, Vec3};
use tracing::debug;

use super::skinning::MAX_INFLUENCES;
use super::source::{PrimitiveKind, SourceMesh, SourceScene, VertexWeight};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PostProcessSteps: u32 {
        const LIMIT_BONE_WEIGHTS = 1 << 0;
        const GENERATE_UV_COORDS = 1 << 1;
        const TRIANGULATE = 1 << 2;
        /// Per-face normals. Shared vertices are split.
        const GENERATE_NORMALS = 1 << 3;
        /// Normals averaged over every vertex at the same position.
        const GENERATE_SMOOTH_NORMALS = 1 << 4;
        const CALCULATE_TANGENT_SPACE = 1 << 5;
        /// Mirror the scene along Z.
        const MAKE_LEFT_HANDED = 1 << 6;
        const FLIP_UVS = 1 << 7;
        /// Drop degenerate triangles and unreferenced vertices.
        const OPTIMIZE_MESHES = 1 << 8;
        const FLIP_WINDING_ORDER = 1 << 9;
        const JOIN_IDENTICAL_VERTICES = 1 << 10;
        const INVERT_NORMALS = 1 << 11;
        const GLOBAL_SCALE = 1 << 12;
    }
}

/// Run `steps` over `scene` in a fixed order. Normals and UVs are only
/// generated for meshes that lack them.
pub fn apply(scene: &mut SourceScene, steps: PostProcessSteps, global_scale_factor: f32) {
    debug!("Post-processing {} meshes with {:?}", scene.meshes.len(), steps);

    if steps.contains(PostProcessSteps::TRIANGULATE) {
        scene.meshes.iter_mut().for_each(triangulate);
    }
    if steps.contains(PostProcessSteps::MAKE_LEFT_HANDED) {
        make_left_handed(scene);
    }

    for mesh in &mut scene.meshes {
        if steps.contains(PostProcessSteps::GENERATE_SMOOTH_NORMALS) {
            generate_smooth_normals(mesh);
        } else if steps.contains(PostProcessSteps::GENERATE_NORMALS) {
            generate_flat_normals(mesh);
        }
        if steps.contains(PostProcessSteps::GENERATE_UV_COORDS) {
            generate_uv_coords(mesh);
        }
        if steps.contains(PostProcessSteps::CALCULATE_TANGENT_SPACE) {
            calculate_tangents(mesh);
        }
        if steps.contains(PostProcessSteps::JOIN_IDENTICAL_VERTICES) {
            join_identical_vertices(mesh);
        }
        if steps.contains(PostProcessSteps::LIMIT_BONE_WEIGHTS) {
            limit_bone_weights(mesh);
        }
        if steps.contains(PostProcessSteps::FLIP_UVS) {
            flip_uvs(mesh);
        }
        if steps.contains(PostProcessSteps::FLIP_WINDING_ORDER) {
            flip_winding(mesh);
        }
        if steps.contains(PostProcessSteps::INVERT_NORMALS) {
            invert_normals(mesh);
        }
        if steps.contains(PostProcessSteps::OPTIMIZE_MESHES) {
            optimize(mesh);
        }
    }

    if steps.contains(PostProcessSteps::GLOBAL_SCALE) && global_scale_factor != 1.0 {
        scene.root.transform = Mat4::from_scale(Vec3::splat(global_scale_factor)) * scene.root.transform;
    }
}

fn is_triangles(mesh: &SourceMesh) -> bool {
    mesh.primitive == PrimitiveKind::Triangle
}

/// Turn strips and fans into triangle lists. Points and lines are left
/// as they are.
fn triangulate(mesh: &mut SourceMesh) {
    if matches!(mesh.primitive, PrimitiveKind::Point | PrimitiveKind::Line) {
        return;
    }
    let indices = if mesh.indices.is_empty() {
        (0..mesh.vertex_count() as u32).collect()
    } else {
        std::mem::take(&mut mesh.indices)
    };

    mesh.indices = match mesh.primitive {
        PrimitiveKind::TriangleStrip => indices
            .windows(3)
            .enumerate()
            .flat_map(|(i, w)| if i % 2 == 0 { [w[0], w[1], w[2]] } else { [w[1], w[0], w[2]] })
            .collect(),
        PrimitiveKind::TriangleFan if indices.len() >= 3 => indices[1..]
            .windows(2)
            .flat_map(|w| [indices[0], w[0], w[1]])
            .collect(),
        PrimitiveKind::TriangleFan => Vec::new(),
        _ => {
            let mut indices = indices;
            indices.truncate(indices.len() / 3 * 3);
            indices
        }
    };
    mesh.primitive = PrimitiveKind::Triangle;
}

fn mirror_z(v: &mut Vec3) {
    v.z = -v.z;
}

fn make_left_handed(scene: &mut SourceScene) {
    let mirror = Mat4::from_scale(Vec3::new(1.0, 1.0, -1.0));
    scene.root.walk_mut(&mut |node| node.transform = mirror * node.transform * mirror);

    for mesh in &mut scene.meshes {
        mesh.positions.iter_mut().for_each(mirror_z);
        if let Some(normals) = &mut mesh.normals {
            normals.iter_mut().for_each(mirror_z);
        }
        if let Some(tangents) = &mut mesh.tangents {
            tangents.iter_mut().for_each(mirror_z);
        }
        for bone in &mut mesh.bones {
            bone.offset = mirror * bone.offset * mirror;
        }
    }
}

/// Rebuild the per-vertex data so that new vertex `i` is a copy of old
/// vertex `order[i]`. Bone weights follow every copy of their vertex.
/// Indices are left for the caller to rewrite.
fn reorder(mesh: &mut SourceMesh, order: &[u32]) {
    fn pick<T: Copy + Default>(values: &[T], order: &[u32]) -> Vec<T> {
        order
            .iter()
            .map(|&i| values.get(i as usize).copied().unwrap_or_default())
            .collect()
    }

    mesh.positions = pick(&mesh.positions, order);
    mesh.normals = mesh.normals.as_deref().map(|values| pick(values, order));
    mesh.tangents = mesh.tangents.as_deref().map(|values| pick(values, order));
    mesh.tex_coords = mesh.tex_coords.as_deref().map(|values| pick(values, order));
    mesh.colors = mesh.colors.as_deref().map(|values| pick(values, order));

    let mut copies: HashMap<u32, Vec<u32>> = HashMap::new();
    for (new, &old) in order.iter().enumerate() {
        copies.entry(old).or_default().push(new as u32);
    }
    for bone in &mut mesh.bones {
        bone.weights = bone
            .weights
            .iter()
            .flat_map(|w| {
                copies
                    .get(&w.vertex)
                    .into_iter()
                    .flatten()
                    .map(move |&vertex| VertexWeight { vertex, weight: w.weight })
            })
            .collect();
    }
}

fn corners(tri: &[u32]) -> [usize; 3] {
    [tri[0] as usize, tri[1] as usize, tri[2] as usize]
}

fn generate_flat_normals(mesh: &mut SourceMesh) {
    if mesh.normals.is_some() || !is_triangles(mesh) {
        return;
    }
    let mut order = std::mem::take(&mut mesh.indices);
    order.truncate(order.len() / 3 * 3);
    reorder(mesh, &order);
    mesh.indices = (0..order.len() as u32).collect();

    let normals = mesh
        .positions
        .chunks_exact(3)
        .flat_map(|tri| {
            let normal = (tri[1] - tri[0]).cross(tri[2] - tri[0]).normalize_or_zero();
            [normal; 3]
        })
        .collect();
    mesh.normals = Some(normals);
}

fn generate_smooth_normals(mesh: &mut SourceMesh) {
    if mesh.normals.is_some() || !is_triangles(mesh) {
        return;
    }
    let count = mesh.vertex_count();
    let mut face_sums = vec![Vec3::ZERO; count];
    for tri in mesh.indices.chunks_exact(3) {
        let [a, b, c] = corners(tri);
        if a.max(b).max(c) >= count {
            continue;
        }
        let p = &mesh.positions;
        // Unnormalized cross product weights faces by area.
        let normal = (p[b] - p[a]).cross(p[c] - p[a]);
        face_sums[a] += normal;
        face_sums[b] += normal;
        face_sums[c] += normal;
    }

    let key = |p: &Vec3| p.to_array().map(f32::to_bits);
    let mut by_position: HashMap<[u32; 3], Vec3> = HashMap::new();
    for (position, sum) in mesh.positions.iter().zip(&face_sums) {
        *by_position.entry(key(position)).or_default() += *sum;
    }
    let normals = mesh
        .positions
        .iter()
        .map(|p| {
            by_position
                .get(&key(p))
                .copied()
                .unwrap_or(Vec3::ZERO)
                .normalize_or_zero()
        })
        .collect();
    mesh.normals = Some(normals);
}

/// Planar projection onto the two largest extents of the bounding box.
fn generate_uv_coords(mesh: &mut SourceMesh) {
    if mesh.tex_coords.is_some() || mesh.positions.is_empty() {
        return;
    }
    let (min, max) = mesh
        .positions
        .iter()
        .fold((Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)), |(min, max), p| {
            (min.min(*p), max.max(*p))
        });
    let extent = max - min;
    let (u, v) = if extent.x <= extent.y && extent.x <= extent.z {
        (1, 2)
    } else if extent.y <= extent.z {
        (0, 2)
    } else {
        (0, 1)
    };
    let unit = |value: f32, axis: usize| {
        if extent[axis] > 0.0 {
            (value - min[axis]) / extent[axis]
        } else {
            0.0
        }
    };
    let tex_coords = mesh
        .positions
        .iter()
        .map(|p| Vec2::new(unit(p[u], u), unit(p[v], v)))
        .collect();
    mesh.tex_coords = Some(tex_coords);
}

/// Per-vertex tangents from UV derivatives, orthogonalized against the
/// normal.
fn calculate_tangents(mesh: &mut SourceMesh) {
    if mesh.tangents.is_some() || !is_triangles(mesh) {
        return;
    }
    let (Some(normals), Some(uvs)) = (&mesh.normals, &mesh.tex_coords) else {
        return;
    };
    let count = mesh.vertex_count().min(normals.len()).min(uvs.len());
    let positions = &mesh.positions;

    let mut sums = vec![Vec3::ZERO; count];
    for tri in mesh.indices.chunks_exact(3) {
        let [a, b, c] = corners(tri);
        if a.max(b).max(c) >= count {
            continue;
        }
        let (e1, e2) = (positions[b] - positions[a], positions[c] - positions[a]);
        let (d1, d2) = (uvs[b] - uvs[a], uvs[c] - uvs[a]);
        let det = d1.x * d2.y - d2.x * d1.y;
        if det.abs() <= f32::EPSILON {
            continue;
        }
        let tangent = (e1 * d2.y - e2 * d1.y) / det;
        sums[a] += tangent;
        sums[b] += tangent;
        sums[c] += tangent;
    }

    let tangents = (0..mesh.vertex_count())
        .map(|i| {
            let normal = normals.get(i).copied().unwrap_or(Vec3::ZERO);
            let sum = sums.get(i).copied().unwrap_or(Vec3::ZERO);
            (sum - normal * normal.dot(sum)).try_normalize().unwrap_or_else(|| {
                normal
                    .try_normalize()
                    .map(|n| n.any_orthonormal_vector())
                    .unwrap_or(Vec3::X)
            })
        })
        .collect();
    mesh.tangents = Some(tangents);
}

/// Merge vertices whose attributes and bone influences are bit-identical.
fn join_identical_vertices(mesh: &mut SourceMesh) {
    let count = mesh.vertex_count();
    let mut influences: Vec<Vec<(u32, u32)>> = vec![Vec::new(); count];
    for (bone_index, bone) in mesh.bones.iter().enumerate() {
        for w in &bone.weights {
            if let Some(list) = influences.get_mut(w.vertex as usize) {
                list.push((bone_index as u32, w.weight.to_bits()));
            }
        }
    }

    let mut first_of: HashMap<Vec<u32>, u32> = HashMap::new();
    let mut order = Vec::new();
    let mut remap = Vec::with_capacity(count);
    for (v, vertex_influences) in influences.iter_mut().enumerate() {
        let mut key: Vec<u32> = mesh.positions[v].to_array().map(f32::to_bits).to_vec();
        if let Some(n) = mesh.normals.as_ref().and_then(|n| n.get(v)) {
            key.extend(n.to_array().map(f32::to_bits));
        }
        if let Some(t) = mesh.tangents.as_ref().and_then(|t| t.get(v)) {
            key.extend(t.to_array().map(f32::to_bits));
        }
        if let Some(uv) = mesh.tex_coords.as_ref().and_then(|uv| uv.get(v)) {
            key.extend(uv.to_array().map(f32::to_bits));
        }
        if let Some(c) = mesh.colors.as_ref().and_then(|c| c.get(v)) {
            key.extend(c.to_array().map(f32::to_bits));
        }
        vertex_influences.sort_unstable();
        key.extend(vertex_influences.iter().flat_map(|&(bone, weight)| [bone, weight]));

        let next = order.len() as u32;
        let index = *first_of.entry(key).or_insert_with(|| {
            order.push(v as u32);
            next
        });
        remap.push(index);
    }

    if order.len() == count {
        return;
    }
    debug!("Welded '{}': {} -> {} vertices", mesh.name, count, order.len());
    reorder(mesh, &order);
    for index in &mut mesh.indices {
        *index = remap.get(*index as usize).copied().unwrap_or(*index);
    }
}

/// Keep the strongest [`MAX_INFLUENCES`] weights per vertex and rescale
/// them to sum to 1.
fn limit_bone_weights(mesh: &mut SourceMesh) {
    // vertex -> (bone, weight slot, weight)
    let mut per_vertex: HashMap<u32, Vec<(usize, usize, f32)>> = HashMap::new();
    for (b, bone) in mesh.bones.iter().enumerate() {
        for (slot, w) in bone.weights.iter().enumerate() {
            per_vertex.entry(w.vertex).or_default().push((b, slot, w.weight));
        }
    }

    let mut removed = HashSet::new();
    let mut rescaled = HashMap::new();
    for (_, mut influences) in per_vertex {
        if influences.len() <= MAX_INFLUENCES {
            continue;
        }
        influences.sort_by(|a, b| b.2.total_cmp(&a.2));
        let (kept, dropped) = influences.split_at(MAX_INFLUENCES);
        let total: f32 = kept.iter().map(|&(_, _, weight)| weight).sum();
        if total > 0.0 {
            for &(b, slot, weight) in kept {
                rescaled.insert((b, slot), weight / total);
            }
        }
        removed.extend(dropped.iter().map(|&(b, slot, _)| (b, slot)));
    }
    if removed.is_empty() {
        return;
    }

    for (b, bone) in mesh.bones.iter_mut().enumerate() {
        bone.weights = bone
            .weights
            .iter()
            .enumerate()
            .filter(|(slot, _)| !removed.contains(&(b, *slot)))
            .map(|(slot, w)| VertexWeight {
                vertex: w.vertex,
                weight: rescaled.get(&(b, slot)).copied().unwrap_or(w.weight),
            })
            .collect();
    }
}

fn flip_uvs(mesh: &mut SourceMesh) {
    if let Some(uvs) = &mut mesh.tex_coords {
        for uv in uvs {
            uv.y = 1.0 - uv.y;
        }
    }
}

fn flip_winding(mesh: &mut SourceMesh) {
    if is_triangles(mesh) {
        for tri in mesh.indices.chunks_exact_mut(3) {
            tri.swap(1, 2);
        }
    }
}

fn invert_normals(mesh: &mut SourceMesh) {
    if let Some(normals) = &mut mesh.normals {
        for normal in normals {
            *normal = -*normal;
        }
    }
}

fn optimize(mesh: &mut SourceMesh) {
    if !is_triangles(mesh) {
        return;
    }
    let count = mesh.vertex_count();
    mesh.indices = mesh
        .indices
        .chunks_exact(3)
        .filter(|tri| {
            tri[0] != tri[1] && tri[1] != tri[2] && tri[0] != tri[2] && tri.iter().all(|&i| (i as usize) < count)
        })
        .flatten()
        .copied()
        .collect();

    let mut remap = vec![u32::MAX; count];
    let mut order = Vec::new();
    for index in &mut mesh.indices {
        let slot = &mut remap[*index as usize];
        if *slot == u32::MAX {
            *slot = order.len() as u32;
            order.push(*index);
        }
        *index = *slot;
    }
    reorder(mesh, &order);
}

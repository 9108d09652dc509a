use ember_assets::Vertex;

/// Bone influences a vertex can hold.
pub const MAX_INFLUENCES: usize = 4;

/// Highest bone index that fits the `u8` slot encoding (index + 1 ≤ 255).
pub const MAX_BONE_INDEX: usize = u8::MAX as usize - 1;

/// Put `weight` for the bone stored as `bone_slot` into the first unused
/// influence of `vertex`. Returns `false` when all slots are taken.
pub fn assign_influence(vertex: &mut Vertex, bone_slot: u8, weight: f32) -> bool {
    match vertex.bone_indices.iter().position(|&index| index == 0) {
        Some(slot) => {
            vertex.bone_indices[slot] = bone_slot;
            vertex.bone_weights[slot] = weight;
            true
        }
        None => false,
    }
}

/// Scale the weights of `vertex` to sum to 1. Vertices without weight are
/// left alone.
pub fn normalize_weights(vertex: &mut Vertex) {
    let total: f32 = vertex.bone_weights.iter().sum();
    if total == 0.0 {
        return;
    }
    for weight in &mut vertex.bone_weights {
        *weight /= total;
    }
}

use bytemuck::{Pod, Zeroable};
use ember_core::Transform;

/// What a vertex element feeds in the shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexSemantic {
    Position,
    TexCoord,
    Normal,
    Color,
    Tangent,
    BoneIndex,
    BoneWeight,
}

/// Component type of a vertex element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexType {
    Float,
    UnsignedByte,
}

impl VertexType {
    pub fn size(self) -> usize {
        match self {
            Self::Float => 4,
            Self::UnsignedByte => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexElement {
    pub semantic: VertexSemantic,
    pub ty: VertexType,
    pub count: u8,
}

impl VertexElement {
    pub const fn new(semantic: VertexSemantic, ty: VertexType, count: u8) -> Self {
        Self { semantic, ty, count }
    }

    pub fn size(&self) -> usize {
        self.ty.size() * self.count as usize
    }
}

/// Ordered vertex layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexFormat {
    pub elements: Vec<VertexElement>,
}

impl VertexFormat {
    /// The layout of [`Vertex`]: position, texcoord, normal, color, tangent,
    /// four bone indices and four bone weights.
    pub fn standard() -> Self {
        use VertexSemantic::*;
        use VertexType::*;
        Self {
            elements: vec![
                VertexElement::new(Position, Float, 3),
                VertexElement::new(TexCoord, Float, 2),
                VertexElement::new(Normal, Float, 3),
                VertexElement::new(Color, Float, 3),
                VertexElement::new(Tangent, Float, 3),
                VertexElement::new(BoneIndex, UnsignedByte, 4),
                VertexElement::new(BoneWeight, Float, 4),
            ],
        }
    }

    /// Size of one vertex in bytes.
    pub fn stride(&self) -> usize {
        self.elements.iter().map(VertexElement::size).sum()
    }
}

/// One vertex in the standard format.
///
/// `bone_indices` stores bone `i` as `i + 1`; 0 marks an unused slot.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub tex_coord: [f32; 2],
    pub normal: [f32; 3],
    pub color: [f32; 3],
    pub tangent: [f32; 3],
    pub bone_indices: [u8; 4],
    pub bone_weights: [f32; 4],
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            tex_coord: [0.0; 2],
            normal: [0.0; 3],
            color: [1.0; 3],
            tangent: [0.0; 3],
            bone_indices: [0; 4],
            bone_weights: [0.0; 4],
        }
    }
}

/// An imported triangle mesh with 16-bit indices.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,
    pub format: VertexFormat,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
    pub bone_names: Option<Vec<String>>,
    /// Bind pose per bone, aligned with `bone_names`.
    pub bind_poses: Option<Vec<Transform>>,
}

impl Mesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            format: VertexFormat::standard(),
            vertices: Vec::new(),
            indices: Vec::new(),
            bone_names: None,
            bind_poses: None,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_skinned(&self) -> bool {
        self.bone_names.as_ref().is_some_and(|names| !names.is_empty())
    }

    /// Raw vertex buffer contents.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_stride_matches_format() {
        assert_eq!(VertexFormat::standard().stride(), 76);
        assert_eq!(std::mem::size_of::<Vertex>(), VertexFormat::standard().stride());
    }

    #[test]
    fn vertex_bytes_cover_all_vertices() {
        let mut mesh = Mesh::new("quad");
        mesh.vertices = vec![Vertex::default(); 4];
        assert_eq!(mesh.vertex_bytes().len(), 4 * 76);
        assert!(!mesh.is_skinned());
    }

    #[test]
    fn default_vertex_is_white_and_unskinned() {
        let vertex = Vertex::default();
        assert_eq!(vertex.color, [1.0; 3]);
        assert_eq!(vertex.bone_indices, [0; 4]);
    }
}

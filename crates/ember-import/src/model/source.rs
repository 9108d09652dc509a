//! Loader-neutral scene description. Backends fill it in, post-processing
//! rewrites it, and the importer turns it into engine objects.

use std::collections::BTreeMap;

use glam::{Mat4, Vec2, Vec3, Vec4};

use super::textures::TextureSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Point,
    Line,
    Triangle,
    TriangleStrip,
    TriangleFan,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexWeight {
    pub vertex: u32,
    pub weight: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceBone {
    pub name: String,
    /// Mesh space to bone space.
    pub offset: Mat4,
    pub weights: Vec<VertexWeight>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceMesh {
    pub name: String,
    pub primitive: PrimitiveKind,
    pub positions: Vec<Vec3>,
    pub normals: Option<Vec<Vec3>>,
    pub tangents: Option<Vec<Vec3>>,
    pub tex_coords: Option<Vec<Vec2>>,
    pub colors: Option<Vec<Vec4>>,
    pub indices: Vec<u32>,
    pub bones: Vec<SourceBone>,
    pub material_index: usize,
}

impl SourceMesh {
    pub fn new(name: impl Into<String>, primitive: PrimitiveKind) -> Self {
        Self {
            name: name.into(),
            primitive,
            positions: Vec::new(),
            normals: None,
            tangents: None,
            tex_coords: None,
            colors: None,
            indices: Vec::new(),
            bones: Vec::new(),
            material_index: 0,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn has_bones(&self) -> bool {
        !self.bones.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceMaterial {
    pub name: Option<String>,
    pub diffuse: Option<Vec4>,
    pub emissive: Option<Vec4>,
    /// Texture paths as stored in the source file.
    pub textures: BTreeMap<TextureSlot, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceNode {
    pub name: String,
    /// Local transform relative to the parent.
    pub transform: Mat4,
    pub children: Vec<SourceNode>,
    /// Indices into [`SourceScene::meshes`].
    pub meshes: Vec<usize>,
}

impl SourceNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Mat4::IDENTITY,
            children: Vec::new(),
            meshes: Vec::new(),
        }
    }

    /// Visit this node and its descendants depth-first, parents first.
    pub fn walk_mut(&mut self, f: &mut impl FnMut(&mut SourceNode)) {
        f(self);
        for child in &mut self.children {
            child.walk_mut(f);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceScene {
    pub root: SourceNode,
    pub meshes: Vec<SourceMesh>,
    pub materials: Vec<SourceMaterial>,
}

use std::fmt;

use ember_core::Transform;

use crate::handle::AssetRef;
use crate::material::Material;
use crate::mesh::Mesh;

/// Index of a node inside a [`Prefab`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

/// Renderer binding of a node. Mesh and material reference sub-objects of
/// the same asset file.
#[derive(Debug, Clone, PartialEq)]
pub enum MeshRenderer {
    Static {
        mesh: AssetRef<Mesh>,
        material: AssetRef<Material>,
    },
    Skinned {
        mesh: AssetRef<Mesh>,
        material: AssetRef<Material>,
        /// Top of the bone hierarchy the mesh is deformed by.
        root_bone: NodeId,
    },
}

impl MeshRenderer {
    pub fn mesh(&self) -> &AssetRef<Mesh> {
        match self {
            Self::Static { mesh, .. } | Self::Skinned { mesh, .. } => mesh,
        }
    }

    pub fn material(&self) -> &AssetRef<Material> {
        match self {
            Self::Static { material, .. } | Self::Skinned { material, .. } => material,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    /// Local transform relative to the parent.
    pub transform: Transform,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub renderer: Option<MeshRenderer>,
}

/// A node tree stored in an arena. The first node added is the root.
#[derive(Debug, Clone)]
pub struct Prefab {
    pub name: String,
    nodes: Vec<SceneNode>,
}

impl Prefab {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
        }
    }

    /// Append a node under `parent` (or as a root) and return its id.
    pub fn add_node(&mut self, parent: Option<NodeId>, name: impl Into<String>, transform: Transform) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(SceneNode {
            name: name.into(),
            transform,
            parent,
            children: Vec::new(),
            renderer: None,
        });
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(p.index())) {
            parent.children.push(id);
        }
        id
    }

    pub fn root(&self) -> Option<NodeId> {
        (!self.nodes.is_empty()).then_some(NodeId::ROOT)
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.index())
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id.index())
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i as u32), node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Depth-first search of the subtree at `start` (inclusive) for a node
    /// called `name`.
    pub fn find_by_name(&self, start: NodeId, name: &str) -> Option<NodeId> {
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let node = self.node(id)?;
            if node.name == name {
                return Some(id);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    /// Path of names from the root down to `id`, joined with `/`.
    pub fn path(&self, id: NodeId) -> String {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current.and_then(|id| self.node(id)) {
            names.push(node.name.as_str());
            current = node.parent;
        }
        names.reverse();
        names.join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skeleton() -> Prefab {
        let mut prefab = Prefab::new("rig");
        let root = prefab.add_node(None, "rig", Transform::IDENTITY);
        let hips = prefab.add_node(Some(root), "Hips", Transform::IDENTITY);
        prefab.add_node(Some(hips), "Spine", Transform::IDENTITY);
        prefab.add_node(Some(root), "Mesh", Transform::IDENTITY);
        prefab
    }

    #[test]
    fn nodes_link_parent_and_children() {
        let prefab = skeleton();
        assert_eq!(prefab.root(), Some(NodeId::ROOT));
        let root = prefab.node(NodeId::ROOT).unwrap();
        assert_eq!(root.children.len(), 2);
        let spine = prefab.find_by_name(NodeId::ROOT, "Spine").unwrap();
        assert_eq!(prefab.path(spine), "rig/Hips/Spine");
    }

    #[test]
    fn find_searches_only_the_subtree() {
        let prefab = skeleton();
        let hips = prefab.find_by_name(NodeId::ROOT, "Hips").unwrap();
        assert!(prefab.find_by_name(hips, "Mesh").is_none());
        assert_eq!(prefab.find_by_name(hips, "Hips"), Some(hips));
        assert!(prefab.find_by_name(NodeId::ROOT, "Tail").is_none());
    }

    #[test]
    fn empty_prefab_has_no_root() {
        assert!(Prefab::new("empty").root().is_none());
    }
}

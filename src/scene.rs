//! Raw scene data as handed over by a geometry importer.
//!
//! A [`RawScene`] is an index arena of nodes; node 0 is the implicit scene
//! root and is the only node without a parent. Importers fill it in, the
//! piece extractor reads it and nothing else keeps it around.

use crate::math::quat::Quat;
use crate::math::vec2::Vec2;
use crate::math::vec3::Vec3;

pub type NodeId = usize;

/// Node transform decomposed into scale, rotation and translation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for RawTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl RawTransform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug)]
pub struct RawNode {
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub transform: RawTransform,
    /// Indices into [`RawScene::meshes`].
    pub meshes: Vec<usize>,
}

/// Triangle mesh data attached to a node.
///
/// `normals`, `tangents` and `tex_coords` are either empty or run parallel
/// to `positions`. A NaN component marks a vertex without that attribute.
#[derive(Clone, Debug, Default)]
pub struct RawMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tangents: Vec<Vec3>,
    pub tex_coords: Vec<Vec2>,
    /// Triangles as indices into `positions`.
    pub faces: Vec<[u32; 3]>,
}

#[derive(Clone, Debug)]
pub struct RawScene {
    nodes: Vec<RawNode>,
    meshes: Vec<RawMesh>,
}

impl RawScene {
    /// A scene holding only its root node.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            nodes: vec![RawNode {
                name: root_name.into(),
                parent: None,
                children: Vec::new(),
                transform: RawTransform::default(),
                meshes: Vec::new(),
            }],
            meshes: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        0
    }

    /// Append a node under `parent` and return its id.
    ///
    /// # Panics
    /// If `parent` is not a node of this scene.
    pub fn add_node(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        transform: RawTransform,
    ) -> NodeId {
        assert!(parent < self.nodes.len(), "parent node {parent} out of range");
        let id = self.nodes.len();
        self.nodes.push(RawNode {
            name: name.into(),
            parent: Some(parent),
            children: Vec::new(),
            transform,
            meshes: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    /// Attach a mesh to `node` and return its mesh index.
    pub fn add_mesh(&mut self, node: NodeId, mesh: RawMesh) -> usize {
        let index = self.meshes.len();
        self.meshes.push(mesh);
        self.nodes[node].meshes.push(index);
        index
    }

    pub fn set_transform(&mut self, node: NodeId, transform: RawTransform) {
        self.nodes[node].transform = transform;
    }

    pub fn node(&self, id: NodeId) -> &RawNode {
        &self.nodes[id]
    }

    pub fn mesh(&self, index: usize) -> &RawMesh {
        &self.meshes[index]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nodes_link_both_ways() {
        let mut scene = RawScene::new("base");
        let arm = scene.add_node(scene.root(), "arm", RawTransform::default());

        assert_eq!(scene.node(arm).parent, Some(0));
        assert_eq!(scene.node(0).children, vec![arm]);
        assert_eq!(scene.node(0).parent, None);
    }

    #[test]
    fn meshes_attach_to_nodes() {
        let mut scene = RawScene::new("root");
        let index = scene.add_mesh(0, RawMesh::default());
        assert_eq!(scene.node(0).meshes, vec![index]);
        assert_eq!(scene.mesh_count(), 1);
    }
}

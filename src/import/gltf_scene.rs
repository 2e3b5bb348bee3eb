//! glTF 2.0 (`.gltf` / `.glb`) through the `gltf` crate.
//!
//! The default scene's node tree is copied as-is. Each triangle primitive of
//! a node's mesh becomes one raw mesh on that node; other primitive modes
//! are skipped. A scene with a single top-level node uses that node as the
//! scene root. Several top-level nodes hang off a synthesized root named
//! after the file.

use std::path::Path;

use gltf::mesh::Mode;
use log::{debug, warn};

use super::{scene_root_name, SceneImporter};
use crate::error::ImportError;
use crate::math::quat::Quat;
use crate::math::vec2::Vec2;
use crate::math::vec3::Vec3;
use crate::scene::{NodeId, RawMesh, RawScene, RawTransform};

pub struct GltfImporter;

impl SceneImporter for GltfImporter {
    fn import(&self, path: &Path) -> Result<RawScene, ImportError> {
        let (document, buffers, _images) = gltf::import(path).map_err(|source| ImportError::Gltf {
            path: path.to_path_buf(),
            source,
        })?;

        let gltf_scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or_else(|| ImportError::NoScene(path.to_path_buf()))?;

        let top_level: Vec<gltf::Node<'_>> = gltf_scene.nodes().collect();
        let scene = match top_level.as_slice() {
            [single] => {
                let mut scene = RawScene::new(node_name(single));
                let root = scene.root();
                fill_node(&mut scene, root, single, &buffers);
                scene
            }
            nodes => {
                let mut scene = RawScene::new(scene_root_name(path));
                let root = scene.root();
                for node in nodes {
                    add_node(&mut scene, root, node, &buffers);
                }
                scene
            }
        };
        Ok(scene)
    }
}

fn node_name(node: &gltf::Node<'_>) -> String {
    node.name()
        .map(String::from)
        .unwrap_or_else(|| format!("node_{}", node.index()))
}

fn add_node(scene: &mut RawScene, parent: NodeId, node: &gltf::Node<'_>, buffers: &[gltf::buffer::Data]) {
    let id = scene.add_node(parent, node_name(node), RawTransform::default());
    fill_node(scene, id, node, buffers);
}

/// Copy the transform, meshes and children of `node` into scene node `id`.
fn fill_node(scene: &mut RawScene, id: NodeId, node: &gltf::Node<'_>, buffers: &[gltf::buffer::Data]) {
    let (translation, rotation, scale) = node.transform().decomposed();
    scene.set_transform(
        id,
        RawTransform {
            translation: Vec3::from(translation),
            rotation: Quat::from(rotation),
            scale: Vec3::from(scale),
        },
    );

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if primitive.mode() != Mode::Triangles {
                warn!(
                    "Skipping non-triangle primitive {} of node '{}'",
                    primitive.index(),
                    scene.node(id).name
                );
                continue;
            }
            if let Some(raw) = read_primitive(&primitive, buffers) {
                scene.add_mesh(id, raw);
            }
        }
    }

    for child in node.children() {
        add_node(scene, id, &child, buffers);
    }
}

fn read_primitive(primitive: &gltf::Primitive<'_>, buffers: &[gltf::buffer::Data]) -> Option<RawMesh> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

    let positions: Vec<Vec3> = reader.read_positions()?.map(Vec3::from).collect();
    let normals: Vec<Vec3> = reader
        .read_normals()
        .map(|normals| normals.map(Vec3::from).collect())
        .unwrap_or_default();
    let tangents: Vec<Vec3> = reader
        .read_tangents()
        .map(|tangents| tangents.map(|t| Vec3::new(t[0], t[1], t[2])).collect())
        .unwrap_or_default();
    let tex_coords: Vec<Vec2> = reader
        .read_tex_coords(0)
        .map(|coords| coords.into_f32().map(Vec2::from).collect())
        .unwrap_or_default();

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    let faces = indices
        .chunks_exact(3)
        .map(|t| [t[0], t[1], t[2]])
        .collect();

    debug!(
        "glTF primitive {}: {} vertices, {} indices",
        primitive.index(),
        positions.len(),
        indices.len()
    );

    Some(RawMesh {
        positions,
        normals,
        tangents,
        tex_coords,
        faces,
    })
}

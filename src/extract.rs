//! First loading pass: raw scene nodes to canonical pieces.
//!
//! Every node of the raw scene becomes exactly one piece. Metadata for the
//! piece (looked up under `pieces.<name>`) overrides the node's placement and
//! parent link. Parents are recorded by name only here; the hierarchy pass
//! turns names into links once every piece exists.

use log::{debug, trace};

use crate::collision::CollisionVolume;
use crate::math::aabb::Aabb;
use crate::math::vec3::Vec3;
use crate::metadata::MetadataTable;
use crate::model::ModelBuilder;
use crate::loader::LoadWarning;
use crate::piece::{MeshGeometry, ModelPiece, PieceGeometry, PieceId, Vertex, ROOT_PIECE_NAME};
use crate::scene::{NodeId, RawScene, RawTransform};
use crate::transform::Transform;

const DEGREES_TO_RADIANS: f32 = std::f32::consts::PI / 180.0;

/// Extract the whole scene, starting at its root node.
pub(crate) fn extract_scene<M: MetadataTable>(model: &mut ModelBuilder, scene: &RawScene, meta: &M) {
    let pieces_table = meta.sub_table("pieces");
    extract_piece(model, scene, scene.root(), &pieces_table);
}

/// Turn `node` and, recursively, its children into pieces of `model`.
///
/// A piece is registered by name after its children, so with duplicate names
/// the last one registered wins lookups.
pub(crate) fn extract_piece<M: MetadataTable>(
    model: &mut ModelBuilder,
    scene: &RawScene,
    node_id: NodeId,
    pieces_table: &M,
) -> PieceId {
    let node = scene.node(node_id);
    let name = match node.parent {
        Some(_) => node.name.clone(),
        None => {
            model.root_alias = Some(node.name.clone());
            ROOT_PIECE_NAME.to_string()
        }
    };
    debug!("Converting node '{}' to piece '{name}' ({} meshes)", node.name, node.meshes.len());

    let meta = pieces_table.sub_table(&name);
    if meta.is_valid() {
        debug!("Found metadata for piece '{name}'");
    }

    let placement = resolve_placement(&node.transform, &meta);
    let (geometry, bounds, dropped) = extract_geometry(scene, &node.meshes);
    if dropped > 0 {
        model.report.push(LoadWarning::InvalidFaces {
            piece: name.clone(),
            count: dropped,
        });
    }

    let parent_name = if meta.key_exists("parent") {
        meta.get_string("parent", "")
    } else {
        match node.parent {
            Some(parent) if scene.node(parent).parent.is_none() => ROOT_PIECE_NAME.to_string(),
            Some(parent) => scene.node(parent).name.clone(),
            None => String::new(),
        }
    };

    trace!("Piece '{name}' offset: {:?}", placement.position());
    trace!("Piece '{name}' rotation: {:?}", placement.rotation());
    trace!("Piece '{name}' scale: {:?}", placement.scale());
    trace!("Piece '{name}' bounds: {:?} .. {:?}", bounds.mins, bounds.maxs);
    trace!("Piece '{name}' parent: '{parent_name}'");

    let collision = CollisionVolume::enclosing(&bounds, placement.position());
    model.extents = Some(match model.extents {
        Some(extents) => extents.union(&bounds),
        None => bounds,
    });

    let id = model.pieces.len();
    model.pieces.push(ModelPiece {
        name: name.clone(),
        format: model.format,
        geometry,
        placement,
        bounds,
        parent_name,
        parent: None,
        children: Vec::new(),
        global_offset: Vec3::ZERO,
        collision,
        draw_list: None,
    });

    for &child in &node.children {
        extract_piece(model, scene, child, pieces_table);
    }

    model.register(name, id);
    id
}

/// Placement from the node transform with metadata overrides applied.
///
/// Per-axis keys beat the vector key, which beats the node transform.
/// Metadata angles are degrees.
fn resolve_placement<M: MetadataTable>(raw: &RawTransform, meta: &M) -> Transform {
    let offset = resolve_vector(meta, "offset", raw.translation, 0.0, 1.0);
    let rotation = resolve_vector(
        meta,
        "rotate",
        raw.rotation.to_radian_angles(),
        0.0,
        DEGREES_TO_RADIANS,
    );
    let scale = resolve_vector(meta, "scale", raw.scale, 1.0, 1.0);
    Transform::from_parts(offset, rotation, scale)
}

fn resolve_vector<M: MetadataTable>(meta: &M, key: &str, raw: Vec3, default: f32, factor: f32) -> Vec3 {
    let mut value = if meta.key_exists(key) {
        meta.get_float3(key, Vec3::splat(default)) * factor
    } else {
        raw
    };

    let axis_key = |axis: char| format!("{key}{axis}");
    let x = axis_key('x');
    if meta.key_exists(&x) {
        value.x = meta.get_float(&x, default) * factor;
    }
    let y = axis_key('y');
    if meta.key_exists(&y) {
        value.y = meta.get_float(&y, default) * factor;
    }
    let z = axis_key('z');
    if meta.key_exists(&z) {
        value.z = meta.get_float(&z, default) * factor;
    }
    value
}

/// Concatenate the node's meshes into one vertex list.
///
/// Returns the geometry, its bounds (seeded with the unit box) and the
/// number of faces dropped for indexing outside their mesh.
fn extract_geometry(scene: &RawScene, meshes: &[usize]) -> (PieceGeometry, Aabb, usize) {
    let mut bounds = Aabb::UNIT;
    let mut out = MeshGeometry::default();
    let mut dropped = 0;

    for &mesh_index in meshes {
        let mesh = scene.mesh(mesh_index);
        let base = out.vertices.len() as u32;
        let count = mesh.positions.len() as u32;

        for (i, &position) in mesh.positions.iter().enumerate() {
            bounds.include(position);

            let normal = mesh.normals.get(i).copied().filter(Vec3::is_finite);
            let tangent = mesh.tangents.get(i).copied().filter(Vec3::is_finite);
            let bitangent = tangent.zip(normal).map(|(t, n)| t.cross(n));

            out.vertices.push(Vertex {
                position,
                normal,
                tangent,
                bitangent,
                tex_coord: mesh.tex_coords.get(i).copied(),
            });
        }

        for face in &mesh.faces {
            if face.iter().all(|&index| index < count) {
                out.indices.extend(face.iter().map(|&index| base + index));
            } else {
                dropped += 1;
            }
        }
    }

    let geometry = if out.vertices.is_empty() {
        PieceGeometry::Empty
    } else {
        PieceGeometry::Mesh(out)
    };
    (geometry, bounds, dropped)
}

//! Canonical model pieces.
//!
//! A [`ModelPiece`] is one node of an imported model's shared scene graph.
//! Pieces live in their model's arena and refer to each other by
//! [`PieceId`]; once the model is built they are never mutated again.

use crate::collision::CollisionVolume;
use crate::draw::{DrawList, DrawListId};
use crate::import::ModelFormat;
use crate::math::aabb::Aabb;
use crate::math::vec2::Vec2;
use crate::math::vec3::Vec3;
use crate::transform::Transform;

/// Index of a piece in its model's arena. Also the index of the mirroring
/// piece in every instance of that model.
pub type PieceId = usize;

/// Name given to the scene root, whatever the source called it.
pub const ROOT_PIECE_NAME: &str = "root";

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Option<Vec3>,
    pub tangent: Option<Vec3>,
    /// `tangent × normal`, present only when both exist.
    pub bitangent: Option<Vec3>,
    pub tex_coord: Option<Vec2>,
}

/// Triangles over a single concatenated vertex list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshGeometry {
    pub vertices: Vec<Vertex>,
    /// Flattened index triples.
    pub indices: Vec<u32>,
}

impl MeshGeometry {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex positions of each triangle.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| {
            [
                self.vertices[t[0] as usize].position,
                self.vertices[t[1] as usize].position,
                self.vertices[t[2] as usize].position,
            ]
        })
    }
}

/// Format-specific payload of a piece.
#[derive(Clone, Debug, PartialEq)]
pub enum PieceGeometry {
    /// Triangles extracted from an imported mesh.
    Mesh(MeshGeometry),
    /// Transform-only node: takes part in the hierarchy, draws nothing.
    Empty,
}

#[derive(Debug)]
pub struct ModelPiece {
    pub(crate) name: String,
    pub(crate) format: ModelFormat,
    pub(crate) geometry: PieceGeometry,
    pub(crate) placement: Transform,
    pub(crate) bounds: Aabb,
    pub(crate) parent_name: String,
    pub(crate) parent: Option<PieceId>,
    pub(crate) children: Vec<PieceId>,
    pub(crate) global_offset: Vec3,
    pub(crate) collision: CollisionVolume,
    pub(crate) draw_list: Option<DrawList>,
}

impl ModelPiece {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> ModelFormat {
        self.format
    }

    pub fn geometry(&self) -> &PieceGeometry {
        &self.geometry
    }

    /// The extracted mesh, if the piece has one.
    pub fn mesh(&self) -> Option<&MeshGeometry> {
        match &self.geometry {
            PieceGeometry::Mesh(mesh) => Some(mesh),
            PieceGeometry::Empty => None,
        }
    }

    /// True when the piece carries no drawable geometry.
    pub fn is_empty(&self) -> bool {
        matches!(self.geometry, PieceGeometry::Empty)
    }

    pub fn vertex_count(&self) -> usize {
        self.mesh().map_or(0, MeshGeometry::vertex_count)
    }

    pub fn vertex_position(&self, index: usize) -> Option<Vec3> {
        self.mesh()?.vertices.get(index).map(|v| v.position)
    }

    // ============ Placement ============

    /// Default placement relative to the parent piece.
    pub fn placement(&self) -> &Transform {
        &self.placement
    }

    pub fn offset(&self) -> Vec3 {
        self.placement.position()
    }

    /// Radians about X, Y and Z.
    pub fn rotation(&self) -> Vec3 {
        self.placement.rotation()
    }

    pub fn scale(&self) -> Vec3 {
        self.placement.scale()
    }

    /// Sum of offsets from the model root down to this piece.
    pub fn global_offset(&self) -> Vec3 {
        self.global_offset
    }

    // ============ Bounds ============

    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    pub fn mins(&self) -> Vec3 {
        self.bounds.mins
    }

    pub fn maxs(&self) -> Vec3 {
        self.bounds.maxs
    }

    pub fn collision_volume(&self) -> &CollisionVolume {
        &self.collision
    }

    // ============ Hierarchy ============

    /// Parent name after metadata overrides; empty means "attach to root".
    pub fn parent_name(&self) -> &str {
        &self.parent_name
    }

    pub fn parent(&self) -> Option<PieceId> {
        self.parent
    }

    pub fn children(&self) -> &[PieceId] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn draw_list(&self) -> Option<DrawListId> {
        self.draw_list.as_ref().map(DrawList::id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangles_resolve_indices() {
        let vertex = |x: f32| Vertex {
            position: Vec3::new(x, 0.0, 0.0),
            ..Vertex::default()
        };
        let mesh = MeshGeometry {
            vertices: vec![vertex(0.0), vertex(1.0), vertex(2.0)],
            indices: vec![2, 1, 0],
        };
        let triangles: Vec<_> = mesh.triangles().collect();
        assert_eq!(triangles.len(), 1);
        assert_eq!(triangles[0][0].x, 2.0);
        assert_eq!(mesh.triangle_count(), 1);
    }
}

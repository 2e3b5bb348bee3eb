//! Wavefront OBJ through `tobj`.
//!
//! OBJ has no node hierarchy: every object/group becomes a child of the
//! implicit root with an identity transform, and metadata supplies any
//! deeper structure.

use std::path::Path;

use log::debug;

use super::{scene_root_name, SceneImporter};
use crate::error::ImportError;
use crate::math::vec2::Vec2;
use crate::math::vec3::Vec3;
use crate::scene::{RawMesh, RawScene, RawTransform};

pub struct ObjImporter {
    triangulate: bool,
}

impl ObjImporter {
    pub fn new(triangulate: bool) -> Self {
        Self { triangulate }
    }
}

impl Default for ObjImporter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl SceneImporter for ObjImporter {
    fn import(&self, path: &Path) -> Result<RawScene, ImportError> {
        let options = tobj::LoadOptions {
            single_index: true,
            triangulate: self.triangulate,
            ignore_points: true,
            ignore_lines: true,
            ..Default::default()
        };
        let (models, _materials) =
            tobj::load_obj(path, &options).map_err(|source| ImportError::Obj {
                path: path.to_path_buf(),
                source,
            })?;

        let mut scene = RawScene::new(scene_root_name(path));
        for model in &models {
            debug!(
                "OBJ object '{}': {} vertices, {} indices",
                model.name,
                model.mesh.positions.len() / 3,
                model.mesh.indices.len()
            );
            let node = scene.add_node(scene.root(), model.name.clone(), RawTransform::default());
            scene.add_mesh(node, convert_mesh(&model.mesh));
        }
        Ok(scene)
    }
}

fn convert_mesh(mesh: &tobj::Mesh) -> RawMesh {
    let positions: Vec<Vec3> = mesh
        .positions
        .chunks_exact(3)
        .map(|p| Vec3::new(p[0], p[1], p[2]))
        .collect();
    let normals = mesh
        .normals
        .chunks_exact(3)
        .map(|n| Vec3::new(n[0], n[1], n[2]))
        .collect();
    let tex_coords = mesh
        .texcoords
        .chunks_exact(2)
        .map(|t| Vec2::new(t[0], t[1]))
        .collect();

    RawMesh {
        positions,
        normals,
        tangents: Vec::new(),
        tex_coords,
        faces: triangles(&mesh.indices, &mesh.face_arities),
    }
}

/// Split polygon index runs into triangle fans. An empty arity list means
/// tobj already triangulated everything.
fn triangles(indices: &[u32], face_arities: &[u32]) -> Vec<[u32; 3]> {
    if face_arities.is_empty() {
        return indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .collect();
    }

    let mut faces = Vec::new();
    let mut start = 0usize;
    for &arity in face_arities {
        let arity = arity as usize;
        let Some(polygon) = indices.get(start..start + arity) else {
            break;
        };
        for i in 1..arity.saturating_sub(1) {
            faces.push([polygon[0], polygon[i], polygon[i + 1]]);
        }
        start += arity;
    }
    faces
}

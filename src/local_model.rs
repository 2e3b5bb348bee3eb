//! Per-entity model instances.
//!
//! A [`LocalModel`] mirrors the piece tree of a shared [`Model`] in its own
//! arena, index for index. Instance pieces carry the mutable state (pose,
//! visibility, collision volume, LOD lists) and point back at their
//! canonical piece only to read static data.

use std::sync::Arc;

use log::{debug, warn};

use crate::collision::CollisionVolume;
use crate::draw::{DrawBackend, DrawList, DrawListId};
use crate::import::ModelFormat;
use crate::math::mat4::Mat4;
use crate::math::vec3::Vec3;
use crate::model::Model;
use crate::piece::{ModelPiece, PieceId};
use crate::transform::Transform;

/// Mutable mirror of one canonical piece.
#[derive(Debug)]
pub struct LocalModelPiece {
    original: PieceId,
    transform: Transform,
    visible: bool,
    collision: CollisionVolume,
    parent: Option<PieceId>,
    children: Vec<PieceId>,
    draw_list: Option<DrawListId>,
    lod_lists: Vec<Option<DrawList>>,
}

impl LocalModelPiece {
    fn new(id: PieceId, original: &ModelPiece) -> Self {
        Self {
            original: id,
            transform: *original.placement(),
            visible: !original.is_empty(),
            collision: original.collision_volume().clone(),
            parent: original.parent(),
            children: original.children().to_vec(),
            draw_list: original.draw_list(),
            lod_lists: vec![None],
        }
    }

    /// Index of the canonical piece this one mirrors.
    pub fn original(&self) -> PieceId {
        self.original
    }

    // ============ Pose ============

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position()
    }

    pub fn set_position(&mut self, position: Vec3) -> &mut Self {
        self.transform.set_position(position);
        self
    }

    pub fn rotation(&self) -> Vec3 {
        self.transform.rotation()
    }

    pub fn set_rotation(&mut self, rotation: Vec3) -> &mut Self {
        self.transform.set_rotation(rotation);
        self
    }

    pub fn scale(&self) -> Vec3 {
        self.transform.scale()
    }

    pub fn set_scale(&mut self, scale: Vec3) -> &mut Self {
        self.transform.set_scale(scale);
        self
    }

    /// Transform relative to the parent piece.
    pub fn relative_matrix(&self) -> Mat4 {
        self.transform.to_matrix()
    }

    // ============ State ============

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) -> &mut Self {
        self.visible = visible;
        self
    }

    pub fn collision_volume(&self) -> &CollisionVolume {
        &self.collision
    }

    pub fn collision_volume_mut(&mut self) -> &mut CollisionVolume {
        &mut self.collision
    }

    pub fn parent(&self) -> Option<PieceId> {
        self.parent
    }

    pub fn children(&self) -> &[PieceId] {
        &self.children
    }

    // ============ Draw lists ============

    /// Full-detail list shared with the canonical piece.
    pub fn draw_list(&self) -> Option<DrawListId> {
        self.draw_list
    }

    pub fn lod_slots(&self) -> usize {
        self.lod_lists.len()
    }

    pub fn lod_list(&self, lod: usize) -> Option<DrawListId> {
        self.lod_lists.get(lod)?.as_ref().map(DrawList::id)
    }

    /// List for `lod`, clamped to the last slot, falling back to the
    /// full-detail list when that slot was never filled.
    fn select_list(&self, lod: usize) -> Option<DrawListId> {
        let slot = lod.min(self.lod_lists.len() - 1);
        self.lod_list(slot).or(self.draw_list)
    }
}

/// One entity's instance of a [`Model`].
#[derive(Debug)]
pub struct LocalModel {
    model: Arc<Model>,
    format: ModelFormat,
    lod_count: usize,
    pieces: Vec<LocalModelPiece>,
}

impl LocalModel {
    /// Mirror every piece of `model`, detached ones included.
    pub fn new(model: Arc<Model>) -> Self {
        let pieces = model
            .pieces()
            .iter()
            .enumerate()
            .map(|(id, piece)| LocalModelPiece::new(id, piece))
            .collect();
        debug!("Instantiated model {} ({} pieces)", model.name(), model.piece_count());
        Self {
            format: model.format(),
            model,
            lod_count: 0,
            pieces,
        }
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    pub fn format(&self) -> ModelFormat {
        self.format
    }

    // ============ Pieces ============

    pub fn root(&self) -> &LocalModelPiece {
        &self.pieces[0]
    }

    pub fn piece(&self, id: PieceId) -> Option<&LocalModelPiece> {
        self.pieces.get(id)
    }

    pub fn piece_mut(&mut self, id: PieceId) -> Option<&mut LocalModelPiece> {
        self.pieces.get_mut(id)
    }

    pub fn pieces(&self) -> &[LocalModelPiece] {
        &self.pieces
    }

    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    pub fn find_piece(&self, name: &str) -> Option<PieceId> {
        self.model.find_piece_id(name)
    }

    /// Canonical piece mirrored by `id`.
    ///
    /// # Panics
    /// If `id` is not a piece of this instance.
    pub fn original(&self, id: PieceId) -> &ModelPiece {
        &self.model.pieces()[self.pieces[id].original]
    }

    // ============ Level of detail ============

    pub fn lod_count(&self) -> usize {
        self.lod_count
    }

    /// Give every piece `count + 1` LOD slots. Lists in dropped slots are
    /// released.
    pub fn set_lod_count(&mut self, count: usize) {
        self.lod_count = count;
        for piece in &mut self.pieces {
            piece.lod_lists.resize_with(count + 1, || None);
        }
    }

    /// Store `list` in slot `lod` of piece `id`.
    ///
    /// Hands the list back when the piece or the slot does not exist.
    pub fn set_lod_list(&mut self, id: PieceId, lod: usize, list: DrawList) -> Result<(), DrawList> {
        match self.pieces.get_mut(id).and_then(|p| p.lod_lists.get_mut(lod)) {
            Some(slot) => {
                *slot = Some(list);
                Ok(())
            }
            None => {
                warn!("No LOD slot {lod} on piece {id} (lod count {})", self.lod_count);
                Err(list)
            }
        }
    }

    // ============ Transform queries ============

    /// Transform of `id` relative to its parent.
    ///
    /// # Panics
    /// If `id` is not a piece of this instance.
    pub fn relative_matrix(&self, id: PieceId) -> Mat4 {
        self.pieces[id].relative_matrix()
    }

    /// Transform of `id` relative to the model origin.
    ///
    /// # Panics
    /// If `id` is not a piece of this instance.
    pub fn piece_matrix(&self, id: PieceId) -> Mat4 {
        let mut matrix = self.pieces[id].relative_matrix();
        let mut current = self.pieces[id].parent;
        while let Some(parent) = current {
            matrix = self.pieces[parent].relative_matrix() * matrix;
            current = self.pieces[parent].parent;
        }
        matrix
    }

    /// Origin of `id` in model space.
    ///
    /// # Panics
    /// If `id` is not a piece of this instance.
    pub fn piece_position(&self, id: PieceId) -> Vec3 {
        self.piece_matrix(id).position()
    }

    /// Pointing direction of `id` in model space.
    ///
    /// Taken from the first two vertices (first minus second) for pieces
    /// that have them, otherwise the piece's forward axis.
    ///
    /// # Panics
    /// If `id` is not a piece of this instance.
    pub fn piece_direction(&self, id: PieceId) -> Vec3 {
        let original = self.original(id);
        let local = match (original.vertex_position(0), original.vertex_position(1)) {
            (Some(v0), Some(v1)) => v0 - v1,
            _ => Vec3::FORWARD,
        };
        self.piece_matrix(id).transform_direction(local)
    }

    /// Emit position and direction for `id` in model space.
    ///
    /// With two or more vertices the first marks the position and the
    /// second the direction; with a single vertex the piece origin is the
    /// position and the vertex gives the direction; without vertices the
    /// origin and forward axis are used.
    ///
    /// # Panics
    /// If `id` is not a piece of this instance.
    pub fn emit_dir_pos(&self, id: PieceId) -> (Vec3, Vec3) {
        let matrix = self.piece_matrix(id);
        let original = self.original(id);
        match (original.vertex_position(0), original.vertex_position(1)) {
            (Some(v0), Some(v1)) => {
                let pos = matrix * v0;
                (pos, matrix * v1 - pos)
            }
            (Some(v0), None) => {
                let pos = matrix.position();
                (pos, matrix * v0 - pos)
            }
            _ => (matrix.position(), matrix.transform_direction(Vec3::FORWARD)),
        }
    }

    // ============ Drawing ============

    /// Draw every visible piece reachable from the root at full detail.
    pub fn draw<B: DrawBackend + ?Sized>(&self, backend: &mut B, world: &Mat4) {
        self.draw_piece(backend, 0, world, None);
    }

    /// Like [`draw`](Self::draw) with each piece's list for `lod`; see
    /// [`set_lod_count`](Self::set_lod_count).
    pub fn draw_lod<B: DrawBackend + ?Sized>(&self, backend: &mut B, world: &Mat4, lod: usize) {
        self.draw_piece(backend, 0, world, Some(lod));
    }

    fn draw_piece<B: DrawBackend + ?Sized>(
        &self,
        backend: &mut B,
        id: PieceId,
        parent: &Mat4,
        lod: Option<usize>,
    ) {
        let piece = &self.pieces[id];
        let matrix = *parent * piece.relative_matrix();

        if piece.visible && !self.original(id).is_empty() {
            let list = match lod {
                Some(lod) => piece.select_list(lod),
                None => piece.draw_list,
            };
            if let Some(list) = list {
                backend.draw(list, &matrix);
            }
        }

        for &child in &piece.children {
            self.draw_piece(backend, child, &matrix, lod);
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::draw::SoftwareBackend;
    use crate::loader::ModelLoader;
    use crate::metadata::MetaTable;
    use crate::scene::{RawMesh, RawScene, RawTransform};

    fn strip(points: &[Vec3]) -> RawMesh {
        RawMesh {
            positions: points.to_vec(),
            faces: (0..points.len() as u32 / 3).map(|t| [t * 3, t * 3 + 1, t * 3 + 2]).collect(),
            ..RawMesh::default()
        }
    }

    fn turret_model(meta: &str) -> Model {
        let mut scene = RawScene::new("tank");
        let base = scene.add_node(scene.root(), "base", RawTransform::default());
        scene.add_mesh(
            base,
            strip(&[
                Vec3::ZERO,
                Vec3::RIGHT,
                Vec3::UP,
                Vec3::ZERO,
                Vec3::UP,
                Vec3::FORWARD,
            ]),
        );
        let turret = scene.add_node(
            base,
            "turret",
            RawTransform::from_translation(Vec3::new(0.0, 2.0, 0.0)),
        );
        scene.add_mesh(
            turret,
            strip(&[Vec3::new(0.0, 0.0, 3.0), Vec3::new(0.0, 0.0, 1.0), Vec3::UP]),
        );
        let flare = scene.add_node(turret, "flare", RawTransform::default());
        scene.add_mesh(
            flare,
            RawMesh {
                positions: vec![Vec3::new(0.0, 0.0, 4.0)],
                ..RawMesh::default()
            },
        );
        scene.add_node(turret, "socket", RawTransform::default());

        ModelLoader::default()
            .load_scene("tank", ModelFormat::Other, &scene, &MetaTable::parse(meta).unwrap())
            .unwrap()
    }

    #[test]
    fn instance_mirrors_canonical_tree() {
        let model = Arc::new(turret_model(""));
        let local = LocalModel::new(Arc::clone(&model));

        assert_eq!(local.piece_count(), model.piece_count());
        for (id, piece) in local.pieces().iter().enumerate() {
            assert_eq!(piece.original(), id);
            assert_eq!(piece.parent(), model.pieces()[id].parent());
            assert_eq!(piece.children(), model.pieces()[id].children());
            assert_eq!(piece.transform(), model.pieces()[id].placement());
        }
        assert_eq!(local.root().parent(), None);
    }

    #[test]
    fn instances_are_independent() {
        let model = Arc::new(turret_model(""));
        let mut a = LocalModel::new(Arc::clone(&model));
        let b = LocalModel::new(Arc::clone(&model));
        let turret = a.find_piece("turret").unwrap();

        a.piece_mut(turret).unwrap().set_position(Vec3::new(9.0, 9.0, 9.0));
        a.piece_mut(turret)
            .unwrap()
            .collision_volume_mut()
            .resize(Vec3::splat(5.0));

        assert_eq!(b.piece(turret).unwrap().position(), Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(model.pieces()[turret].offset(), Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(
            b.piece(turret).unwrap().collision_volume(),
            model.pieces()[turret].collision_volume()
        );
    }

    #[test]
    fn empty_pieces_start_invisible() {
        let local = LocalModel::new(Arc::new(turret_model("")));
        let socket = local.find_piece("socket").unwrap();
        assert!(!local.piece(socket).unwrap().visible());
        assert!(!local.root().visible());
        assert!(local.piece(local.find_piece("base").unwrap()).unwrap().visible());
    }

    #[test]
    fn shrinking_lod_count_releases_lists() {
        let mut backend = SoftwareBackend::new();
        let model = Arc::new(turret_model(""));
        let mut local = LocalModel::new(Arc::clone(&model));

        local.set_lod_count(3);
        assert!(local.pieces().iter().all(|p| p.lod_slots() == 4));

        let base = local.find_piece("base").unwrap();
        for lod in 1..=3 {
            let list = backend.compile_lod(local.original(base), lod as u32).unwrap();
            local.set_lod_list(base, lod, list).unwrap();
        }
        assert_eq!(backend.live_lists(), 3);

        local.set_lod_count(1);
        assert!(local.pieces().iter().all(|p| p.lod_slots() == 2));
        assert!(local.piece(base).unwrap().lod_list(1).is_some());
        assert_eq!(backend.collect_garbage(), 2);
        assert_eq!(backend.live_lists(), 1);
    }

    #[test]
    fn set_lod_list_hands_back_out_of_range_lists() {
        let backend = SoftwareBackend::new();
        let mut local = LocalModel::new(Arc::new(turret_model("")));
        let list = backend.pool().allocate();
        let id = list.id();

        let returned = local.set_lod_list(0, 2, list).unwrap_err();
        assert_eq!(returned.id(), id);
    }

    #[test]
    fn draw_lod_clamps_and_falls_back() {
        let mut backend = SoftwareBackend::new();
        let mut model = turret_model("");
        model.compile(&mut backend);
        let model = Arc::new(model);
        let mut local = LocalModel::new(Arc::clone(&model));
        let base = local.find_piece("base").unwrap();
        let turret = local.find_piece("turret").unwrap();

        local.set_lod_count(1);
        let reduced = backend.compile_lod(local.original(base), 1).unwrap();
        let reduced_id = reduced.id();
        local.set_lod_list(base, 1, reduced).unwrap();

        local.draw_lod(&mut backend, &Mat4::identity(), 5);
        let frame = backend.take_frame();
        let lists: Vec<_> = frame.iter().map(|t| t.list).collect();
        // Base drawn with its single-triangle reduced list, the rest at full
        // detail; the one-vertex flare has no triangles.
        assert_eq!(lists.len(), 2);
        assert_eq!(lists[0], reduced_id);
        assert_eq!(Some(lists[1]), local.piece(turret).unwrap().draw_list());
    }

    #[test]
    fn hidden_pieces_are_skipped_but_children_drawn() {
        let mut backend = SoftwareBackend::new();
        let mut model = turret_model("");
        model.compile(&mut backend);
        let mut local = LocalModel::new(Arc::new(model));
        let base = local.find_piece("base").unwrap();

        local.piece_mut(base).unwrap().set_visible(false);
        local.draw(&mut backend, &Mat4::identity());

        assert_eq!(backend.frame().len(), 1);
        assert_eq!(backend.frame()[0].points[0], Vec3::new(0.0, 2.0, 3.0));
    }

    #[test]
    fn positions_follow_the_instance_pose() {
        let mut local = LocalModel::new(Arc::new(turret_model("")));
        let base = local.find_piece("base").unwrap();
        let turret = local.find_piece("turret").unwrap();

        local.piece_mut(base).unwrap().set_position(Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(local.piece_position(turret), Vec3::new(1.0, 2.0, 0.0));

        local
            .piece_mut(base)
            .unwrap()
            .set_rotation(Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0));
        // Turret vertices (0,0,3) - (0,0,1) point along +Z; a quarter turn
        // about Y maps that to +X.
        let dir = local.piece_direction(turret);
        assert_relative_eq!(dir.x, 2.0, epsilon = 1e-5);
        assert_relative_eq!(dir.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(dir.z, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn emit_dir_pos_by_vertex_count() {
        let local = LocalModel::new(Arc::new(turret_model("")));

        let turret = local.find_piece("turret").unwrap();
        let (pos, dir) = local.emit_dir_pos(turret);
        assert_eq!(pos, Vec3::new(0.0, 2.0, 3.0));
        assert_eq!(dir, Vec3::new(0.0, 0.0, -2.0));

        let flare = local.find_piece("flare").unwrap();
        let (pos, dir) = local.emit_dir_pos(flare);
        assert_eq!(pos, Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(dir, Vec3::new(0.0, 0.0, 4.0));

        let socket = local.find_piece("socket").unwrap();
        let (pos, dir) = local.emit_dir_pos(socket);
        assert_eq!(pos, Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(dir, Vec3::FORWARD);
    }

    #[test]
    #[should_panic]
    fn piece_matrix_rejects_unknown_ids() {
        let local = LocalModel::new(Arc::new(turret_model("")));
        local.piece_matrix(local.piece_count());
    }
}

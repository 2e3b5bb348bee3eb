//! Canonical imported models.
//!
//! A [`Model`] owns the pieces of one imported file in an arena laid out in
//! pre-order from the root, followed by any pieces that could not be
//! attached. It is built once by the loader, optionally compiled against a
//! draw backend, then shared read-only (usually as `Arc<Model>`) by every
//! [`LocalModel`](crate::local_model::LocalModel) instantiated from it.

use std::collections::HashMap;

use log::{debug, error, info};

use crate::draw::DrawBackend;
use crate::error::LoadError;
use crate::import::ModelFormat;
use crate::loader::{ImportOptions, LoadReport, LoadWarning};
use crate::math::aabb::Aabb;
use crate::math::mat4::Mat4;
use crate::math::vec3::Vec3;
use crate::metadata::MetadataTable;
use crate::piece::{ModelPiece, PieceId, ROOT_PIECE_NAME};

/// Texture names and how to post-process them.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureNames {
    /// Diffuse color plus team color in alpha.
    pub tex1: String,
    /// Glow, reflectivity and transparency.
    pub tex2: String,
    pub flip_y: bool,
    /// Invert tex1's alpha (team color) channel.
    pub invert_alpha: bool,
}

/// Pieces under construction, shared by the extraction and hierarchy passes.
pub(crate) struct ModelBuilder {
    pub(crate) name: String,
    pub(crate) format: ModelFormat,
    pub(crate) pieces: Vec<ModelPiece>,
    pub(crate) by_name: HashMap<String, PieceId>,
    pub(crate) root: Option<PieceId>,
    /// Source name of the scene root before it was renamed.
    pub(crate) root_alias: Option<String>,
    /// Running union of piece-local bounds.
    pub(crate) extents: Option<Aabb>,
    pub(crate) report: LoadReport,
}

impl ModelBuilder {
    pub(crate) fn new(name: impl Into<String>, format: ModelFormat, report: LoadReport) -> Self {
        Self {
            name: name.into(),
            format,
            pieces: Vec::new(),
            by_name: HashMap::new(),
            root: None,
            root_alias: None,
            extents: None,
            report,
        }
    }

    /// Make `id` the piece found under `name`.
    pub(crate) fn register(&mut self, name: String, id: PieceId) {
        if self.by_name.insert(name.clone(), id).is_some() {
            self.report.push(LoadWarning::DuplicatePiece { name });
        }
    }

    /// Fix the piece order, derive the aggregate values and apply the
    /// model-level metadata.
    pub(crate) fn finish<M: MetadataTable>(self, meta: &M, options: &ImportOptions) -> Result<Model, LoadError> {
        let Some(root) = self.root else {
            error!("Model {} has no root piece, load failed", self.name);
            return Err(LoadError::MissingRoot(self.name));
        };

        let (order, attached) = enumerate(&self.pieces, root);
        let mut new_index = vec![0; order.len()];
        for (new, &old) in order.iter().enumerate() {
            new_index[old] = new;
        }

        let mut slots: Vec<Option<ModelPiece>> = self.pieces.into_iter().map(Some).collect();
        let mut pieces: Vec<ModelPiece> = Vec::with_capacity(slots.len());
        for &old in &order {
            if let Some(mut piece) = slots[old].take() {
                piece.parent = piece.parent.map(|p| new_index[p]);
                for child in &mut piece.children {
                    *child = new_index[*child];
                }
                pieces.push(piece);
            }
        }
        let by_name = self
            .by_name
            .into_iter()
            .map(|(name, id)| (name, new_index[id]))
            .collect();

        // Parents precede children, so one forward sweep sees every parent done.
        let mut absolute = Vec::with_capacity(pieces.len());
        for id in 0..pieces.len() {
            let (parent_offset, parent_matrix) = match pieces[id].parent {
                Some(parent) => (pieces[parent].global_offset, absolute[parent]),
                None => (Vec3::ZERO, Mat4::identity()),
            };
            pieces[id].global_offset = parent_offset + pieces[id].offset();
            absolute.push(parent_matrix * pieces[id].placement().to_matrix());
        }

        let computed = pieces[..attached]
            .iter()
            .zip(&absolute)
            .map(|(piece, matrix)| piece.bounds().transformed(matrix))
            .reduce(|a, b| a.union(&b))
            .unwrap_or(Aabb::UNIT);

        let bounds = Aabb::new(
            meta.get_float3("mins", computed.mins),
            meta.get_float3("maxs", computed.maxs),
        );
        let size = bounds.size();
        let model = Model {
            name: self.name,
            format: self.format,
            pieces,
            by_name,
            attached,
            bounds,
            height: meta.get_float("height", size.y),
            radius: meta.get_float("radius", size.length() * 0.5),
            relative_mid_pos: meta.get_float3("midpos", bounds.center()),
            piece_extents: self.extents.unwrap_or(Aabb::UNIT),
            textures: TextureNames {
                tex1: meta.get_string("tex1", &options.default_texture),
                tex2: meta.get_string("tex2", ""),
                flip_y: meta.get_bool("fliptextures", true),
                invert_alpha: meta.get_bool("invertteamcolor", true),
            },
            report: self.report,
        };
        model.log_summary();
        Ok(model)
    }
}

/// Pre-order from `root`, then every other top-level subtree in arena
/// order. Returns the order and how many pieces the root reaches.
fn enumerate(pieces: &[ModelPiece], root: PieceId) -> (Vec<PieceId>, usize) {
    let mut order = Vec::with_capacity(pieces.len());
    let mut visited = vec![false; pieces.len()];

    pre_order(pieces, root, &mut visited, &mut order);
    let attached = order.len();
    for (id, piece) in pieces.iter().enumerate() {
        if piece.parent.is_none() {
            pre_order(pieces, id, &mut visited, &mut order);
        }
    }
    (order, attached)
}

fn pre_order(pieces: &[ModelPiece], start: PieceId, visited: &mut [bool], order: &mut Vec<PieceId>) {
    let mut stack = vec![start];
    while let Some(id) = stack.pop() {
        if std::mem::replace(&mut visited[id], true) {
            continue;
        }
        order.push(id);
        stack.extend(pieces[id].children.iter().rev());
    }
}

/// A fully resolved model.
#[derive(Debug)]
pub struct Model {
    name: String,
    format: ModelFormat,
    pieces: Vec<ModelPiece>,
    by_name: HashMap<String, PieceId>,
    attached: usize,
    bounds: Aabb,
    height: f32,
    radius: f32,
    relative_mid_pos: Vec3,
    piece_extents: Aabb,
    textures: TextureNames,
    report: LoadReport,
}

impl Model {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> ModelFormat {
        self.format
    }

    // ============ Pieces ============

    pub fn root_id(&self) -> PieceId {
        0
    }

    pub fn root(&self) -> &ModelPiece {
        &self.pieces[0]
    }

    pub fn piece(&self, id: PieceId) -> Option<&ModelPiece> {
        self.pieces.get(id)
    }

    /// All pieces; the root's tree first, in pre-order.
    pub fn pieces(&self) -> &[ModelPiece] {
        &self.pieces
    }

    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    pub fn find_piece_id(&self, name: &str) -> Option<PieceId> {
        self.by_name.get(name).copied()
    }

    pub fn find_piece(&self, name: &str) -> Option<&ModelPiece> {
        self.find_piece_id(name).map(|id| &self.pieces[id])
    }

    /// Number of pieces reachable from the root.
    pub fn attached_count(&self) -> usize {
        self.attached
    }

    /// Pieces the root cannot reach: their parent was missing or part of a
    /// cycle. They can still be found by name but are never drawn.
    pub fn detached_pieces(&self) -> &[ModelPiece] {
        &self.pieces[self.attached..]
    }

    // ============ Aggregates ============

    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    pub fn mins(&self) -> Vec3 {
        self.bounds.mins
    }

    pub fn maxs(&self) -> Vec3 {
        self.bounds.maxs
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn relative_mid_pos(&self) -> Vec3 {
        self.relative_mid_pos
    }

    /// Union of every piece's local bounds, untransformed.
    pub fn piece_extents(&self) -> &Aabb {
        &self.piece_extents
    }

    pub fn textures(&self) -> &TextureNames {
        &self.textures
    }

    /// Recoverable problems met while loading.
    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    // ============ Transforms and drawing ============

    /// Default transform of `id` relative to the model origin.
    ///
    /// # Panics
    /// If `id` is not a piece of this model.
    pub fn piece_matrix(&self, id: PieceId) -> Mat4 {
        let mut matrix = self.pieces[id].placement().to_matrix();
        let mut current = self.pieces[id].parent;
        while let Some(parent) = current {
            matrix = self.pieces[parent].placement().to_matrix() * matrix;
            current = self.pieces[parent].parent;
        }
        matrix
    }

    /// Compile every piece with geometry. Returns how many lists were made.
    ///
    /// Must happen before the model is shared; instances copy the list ids
    /// when they are created.
    pub fn compile<B: DrawBackend + ?Sized>(&mut self, backend: &mut B) -> usize {
        let mut compiled = 0;
        for piece in &mut self.pieces {
            piece.draw_list = backend.compile(piece);
            if piece.draw_list.is_some() {
                compiled += 1;
            }
        }
        debug!("Compiled {compiled} draw lists for model {}", self.name);
        compiled
    }

    /// Draw the model in its default pose.
    pub fn draw_static<B: DrawBackend + ?Sized>(&self, backend: &mut B, world: &Mat4) {
        self.draw_piece(backend, 0, world);
    }

    fn draw_piece<B: DrawBackend + ?Sized>(&self, backend: &mut B, id: PieceId, parent: &Mat4) {
        let piece = &self.pieces[id];
        let matrix = *parent * piece.placement().to_matrix();
        if let Some(list) = piece.draw_list() {
            backend.draw(list, &matrix);
        }
        for &child in piece.children() {
            self.draw_piece(backend, child, &matrix);
        }
    }

    fn log_summary(&self) {
        info!(
            "Model {}: {} pieces ({} detached)",
            self.name,
            self.pieces.len(),
            self.pieces.len() - self.attached
        );
        debug!("Model {} mins: {:?}", self.name, self.bounds.mins);
        debug!("Model {} maxs: {:?}", self.name, self.bounds.maxs);
        debug!("Model {} radius: {}", self.name, self.radius);
        debug!("Model {} height: {}", self.name, self.height);
        debug!("Model {} midpos: {:?}", self.name, self.relative_mid_pos);
        debug!("Model {} tex1: '{}' tex2: '{}'", self.name, self.textures.tex1, self.textures.tex2);
        debug_assert_eq!(self.pieces[0].name(), ROOT_PIECE_NAME);
    }
}

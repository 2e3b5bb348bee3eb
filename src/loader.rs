//! The import pipeline: metadata, geometry, extraction, hierarchy.
//!
//! [`ModelLoader`] strings the stages together. Conditions the pipeline can
//! recover from are collected as [`LoadWarning`]s in the model's
//! [`LoadReport`] (and logged) instead of failing the load.

use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::error::LoadError;
use crate::extract;
use crate::hierarchy;
use crate::import::{ImporterDispatcher, ModelFormat};
use crate::metadata::{MetaTable, MetadataTable};
use crate::model::{Model, ModelBuilder};
use crate::scene::RawScene;

/// Loader settings.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImportOptions {
    /// Extension of the metadata sidecar next to each model file.
    pub metadata_extension: String,
    /// Let the OBJ reader split polygons into triangles.
    pub triangulate: bool,
    /// First texture name when metadata names none.
    pub default_texture: String,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            metadata_extension: "toml".to_string(),
            triangulate: true,
            default_texture: "default.png".to_string(),
        }
    }
}

impl ImportOptions {
    pub fn from_toml_str(source: &str) -> Result<Self, LoadError> {
        Ok(toml::from_str(source)?)
    }
}

/// Something went wrong but the model is still usable.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum LoadWarning {
    #[error("no metadata file '{}', using defaults", path.display())]
    MetadataMissing { path: PathBuf },

    #[error("error in metadata file '{}': {message}; using defaults", path.display())]
    MetadataInvalid { path: PathBuf, message: String },

    #[error("duplicate piece name '{name}'; the last one registered wins name lookups")]
    DuplicatePiece { name: String },

    #[error("missing piece '{parent}' declared as parent of '{piece}'")]
    MissingParent { piece: String, parent: String },

    #[error("no root piece to adopt orphan '{piece}'")]
    MissingRoot { piece: String },

    #[error("piece '{piece}' is part of a parent cycle and was detached")]
    ParentCycle { piece: String },

    #[error("dropped {count} face(s) of piece '{piece}' with out-of-range indices")]
    InvalidFaces { piece: String, count: usize },
}

/// Warnings collected while loading one model.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadReport {
    warnings: Vec<LoadWarning>,
}

impl LoadReport {
    /// Record and log a warning.
    pub fn push(&mut self, warning: LoadWarning) {
        match warning {
            LoadWarning::MetadataMissing { .. } => info!("{warning}"),
            _ => warn!("{warning}"),
        }
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// `(piece, parent)` pairs whose declared parent does not exist.
    pub fn missing_parents(&self) -> impl Iterator<Item = (&str, &str)> {
        self.warnings.iter().filter_map(|w| match w {
            LoadWarning::MissingParent { piece, parent } => Some((piece.as_str(), parent.as_str())),
            _ => None,
        })
    }
}

/// Turns model files (or already imported scenes) into [`Model`]s.
#[derive(Default)]
pub struct ModelLoader {
    options: ImportOptions,
    importers: ImporterDispatcher,
}

impl ModelLoader {
    pub fn new(options: ImportOptions) -> Self {
        let importers = ImporterDispatcher::new(options.triangulate);
        Self { options, importers }
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// Load a model file and its metadata sidecar.
    ///
    /// Fails when the format is unsupported, the geometry library rejects
    /// the file, or no root piece comes out of the hierarchy.
    pub fn load(&self, path: &Path) -> Result<Model, LoadError> {
        info!("Loading model: {}", path.display());
        let format = ModelFormat::from_path(path)?;

        let mut report = LoadReport::default();
        let meta = MetaTable::load_for_model(path, &self.options.metadata_extension, &mut report);

        let (_, scene) = self.importers.import(path)?;
        info!(
            "Processing scene for model: {} ({} nodes / {} meshes)",
            path.display(),
            scene.node_count(),
            scene.mesh_count()
        );

        self.build(path.display().to_string(), format, &scene, &meta, report)
    }

    /// Run extraction and resolution on a scene the caller imported.
    pub fn load_scene<M: MetadataTable>(
        &self,
        name: impl Into<String>,
        format: ModelFormat,
        scene: &RawScene,
        meta: &M,
    ) -> Result<Model, LoadError> {
        self.build(name.into(), format, scene, meta, LoadReport::default())
    }

    fn build<M: MetadataTable>(
        &self,
        name: String,
        format: ModelFormat,
        scene: &RawScene,
        meta: &M,
        report: LoadReport,
    ) -> Result<Model, LoadError> {
        let mut builder = ModelBuilder::new(name, format, report);
        extract::extract_scene(&mut builder, scene, meta);
        hierarchy::resolve(&mut builder);
        let model = builder.finish(meta, &self.options)?;
        info!("Model {} imported ({} pieces)", model.name(), model.piece_count());
        Ok(model)
    }
}

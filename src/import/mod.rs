//! Geometry importers.
//!
//! Each importer turns a file into a [`RawScene`]. The loader picks one by
//! file extension through [`ImporterDispatcher`]; callers with their own
//! source can hand a scene straight to `ModelLoader::load_scene` instead.

mod gltf_scene;
mod obj_scene;

pub use gltf_scene::GltfImporter;
pub use obj_scene::ObjImporter;

use std::path::Path;

use crate::error::{ImportError, LoadError};
use crate::scene::RawScene;

/// Source format tag carried by models and their pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFormat {
    Obj,
    Gltf,
    /// Scene built by the caller rather than read by one of our importers.
    Other,
}

impl ModelFormat {
    /// Pick a format from a file extension, case-insensitively.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "obj" => Some(ModelFormat::Obj),
            "gltf" | "glb" => Some(ModelFormat::Gltf),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        Self::from_extension(extension).ok_or_else(|| LoadError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension: extension.to_string(),
        })
    }
}

impl std::fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelFormat::Obj => write!(f, "OBJ"),
            ModelFormat::Gltf => write!(f, "glTF"),
            ModelFormat::Other => write!(f, "other"),
        }
    }
}

/// Anything that can read a file into a raw scene.
pub trait SceneImporter {
    fn import(&self, path: &Path) -> Result<RawScene, ImportError>;
}

/// Holds one importer per supported format.
pub struct ImporterDispatcher {
    obj: ObjImporter,
    gltf: GltfImporter,
}

impl ImporterDispatcher {
    pub fn new(triangulate_obj: bool) -> Self {
        Self {
            obj: ObjImporter::new(triangulate_obj),
            gltf: GltfImporter,
        }
    }

    /// Import `path` with the importer matching its extension.
    pub fn import(&self, path: &Path) -> Result<(ModelFormat, RawScene), LoadError> {
        let format = ModelFormat::from_path(path)?;
        let scene = match format {
            ModelFormat::Obj => self.obj.import(path)?,
            ModelFormat::Gltf => self.gltf.import(path)?,
            ModelFormat::Other => {
                return Err(LoadError::UnsupportedFormat {
                    path: path.to_path_buf(),
                    extension: String::new(),
                })
            }
        };
        Ok((format, scene))
    }
}

impl Default for ImporterDispatcher {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Name for the implicit scene root: the file stem, or the whole path.
pub(crate) fn scene_root_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

//! Error types

use std::path::PathBuf;

use thiserror::Error;

/// The geometry library could not produce a scene.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("failed to read OBJ file '{}': {source}", path.display())]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("failed to read glTF file '{}': {source}", path.display())]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("glTF file '{}' contains no scene", .0.display())]
    NoScene(PathBuf),
}

/// A model could not be loaded. Nothing partial is returned alongside it.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("unsupported model format '{extension}' for '{}'", path.display())]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("model '{0}' has no root piece")]
    MissingRoot(String),

    #[error("invalid import options: {0}")]
    Options(#[from] toml::de::Error),
}

#[derive(Error, Debug)]
pub enum TextureError {
    #[error("failed to load texture '{}': {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

//! Piece-hierarchy model import and instancing.
//!
//! Model files are imported into a canonical, read-only [`Model`]: a tree of
//! named pieces with default placements, bounds and collision volumes,
//! optionally overridden by a TOML metadata sidecar. Each in-world entity
//! gets its own [`LocalModel`], a mutable mirror of that tree it can pose,
//! hide and draw at different levels of detail.
//!
//! # Quick Start
//!
//! ```ignore
//! use piecework::prelude::*;
//!
//! let model = Arc::new(ModelLoader::default().load(Path::new("tank.obj"))?);
//! let mut tank = LocalModel::new(Arc::clone(&model));
//! let turret = tank.find_piece("turret").unwrap();
//! tank.piece_mut(turret).unwrap().transform_mut().rotate_y(0.5);
//! ```

// Public API - exposed to library consumers
pub mod cache;
pub mod collision;
pub mod draw;
pub mod error;
pub mod import;
pub mod loader;
pub mod local_model;
pub mod math;
pub mod metadata;
pub mod model;
pub mod piece;
pub mod scene;
pub mod texture;
pub mod transform;

// Internal modules - the two loading passes
pub(crate) mod extract;
pub(crate) mod hierarchy;

// Re-export commonly needed types at crate root for convenience
pub use cache::ModelCache;
pub use error::{ImportError, LoadError, TextureError};
pub use loader::{ImportOptions, LoadReport, LoadWarning, ModelLoader};
pub use local_model::{LocalModel, LocalModelPiece};
pub use model::Model;
pub use piece::{ModelPiece, PieceId};
pub use transform::Transform;

/// Prelude module for convenient imports.
///
/// # Example
/// ```ignore
/// use piecework::prelude::*;
/// ```
pub mod prelude {
    // Loading
    pub use crate::cache::ModelCache;
    pub use crate::error::{ImportError, LoadError, TextureError};
    pub use crate::import::{ModelFormat, SceneImporter};
    pub use crate::loader::{ImportOptions, LoadReport, LoadWarning, ModelLoader};
    pub use crate::metadata::{MetaTable, MetadataTable};
    pub use crate::scene::{RawMesh, RawScene, RawTransform};

    // Models
    pub use crate::collision::CollisionVolume;
    pub use crate::local_model::{LocalModel, LocalModelPiece};
    pub use crate::model::{Model, TextureNames};
    pub use crate::piece::{ModelPiece, PieceId, ROOT_PIECE_NAME};
    pub use crate::texture::{ModelTextures, Texture};

    // Transform
    pub use crate::transform::Transform;

    // Math
    pub use crate::math::aabb::Aabb;
    pub use crate::math::mat4::Mat4;
    pub use crate::math::quat::Quat;
    pub use crate::math::vec2::Vec2;
    pub use crate::math::vec3::Vec3;

    // Drawing
    pub use crate::draw::{DrawBackend, DrawList, DrawListId, DrawListPool, SoftwareBackend};
}

//! Side-band model metadata.
//!
//! A model file may come with a sidecar table that overrides what the
//! geometry source says: model-level sizes and texture names, and per-piece
//! placement and parent links under a `pieces` sub-table:
//!
//! ```toml
//! radius = 12.5
//! tex1 = "tank_diffuse.png"
//!
//! [pieces.turret]
//! parent = "base"
//! offset = [0.0, 4.0, 0.0]
//! rotatey = 90.0
//! ```
//!
//! The loader only reads through [`MetadataTable`]; [`MetaTable`] is the
//! TOML-backed implementation.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::loader::{LoadReport, LoadWarning};
use crate::math::vec3::Vec3;

/// Read-only view of a nested key/value table.
///
/// Every getter falls back to `default` when the key is missing or holds a
/// value of the wrong type. Looking up a missing sub-table yields an
/// invalid, empty table rather than an error.
pub trait MetadataTable: Sized {
    fn is_valid(&self) -> bool;
    fn key_exists(&self, key: &str) -> bool;
    fn get_float(&self, key: &str, default: f32) -> f32;
    fn get_float3(&self, key: &str, default: Vec3) -> Vec3;
    fn get_string(&self, key: &str, default: &str) -> String;
    fn get_bool(&self, key: &str, default: bool) -> bool;
    fn sub_table(&self, key: &str) -> Self;
}

/// TOML-backed metadata table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetaTable {
    table: Option<toml::Table>,
}

impl MetaTable {
    /// An invalid table: every lookup returns its default.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_table(table: toml::Table) -> Self {
        Self { table: Some(table) }
    }

    pub fn parse(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<toml::Table>(source).map(Self::from_table)
    }

    /// Sidecar path for `model_path`: `<model>.<ext>` if it exists,
    /// otherwise `<model-without-extension>.<ext>`.
    pub fn locate(model_path: &Path, extension: &str) -> PathBuf {
        let mut full = model_path.as_os_str().to_os_string();
        full.push(".");
        full.push(extension);
        let full = PathBuf::from(full);
        if full.exists() {
            full
        } else {
            model_path.with_extension(extension)
        }
    }

    /// Load the sidecar table for a model, falling back to an empty table.
    ///
    /// A missing or unparseable file is not an error; it is noted in
    /// `report` and every key takes its default.
    pub fn load_for_model(model_path: &Path, extension: &str, report: &mut LoadReport) -> Self {
        let path = Self::locate(model_path, extension);
        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(err) => {
                debug!("Cannot read '{}': {err}", path.display());
                report.push(LoadWarning::MetadataMissing { path });
                return Self::empty();
            }
        };

        match Self::parse(&source) {
            Ok(table) => {
                info!("Found valid model metadata in '{}'", path.display());
                table
            }
            Err(err) => {
                report.push(LoadWarning::MetadataInvalid {
                    path,
                    message: err.to_string(),
                });
                Self::empty()
            }
        }
    }

    fn get(&self, key: &str) -> Option<&toml::Value> {
        self.table.as_ref()?.get(key)
    }
}

fn as_f32(value: &toml::Value) -> Option<f32> {
    match value {
        toml::Value::Float(f) => Some(*f as f32),
        toml::Value::Integer(i) => Some(*i as f32),
        _ => None,
    }
}

impl MetadataTable for MetaTable {
    fn is_valid(&self) -> bool {
        self.table.is_some()
    }

    fn key_exists(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn get_float(&self, key: &str, default: f32) -> f32 {
        self.get(key).and_then(as_f32).unwrap_or(default)
    }

    fn get_float3(&self, key: &str, default: Vec3) -> Vec3 {
        let Some(value) = self.get(key) else {
            return default;
        };
        let parsed = value.as_array().and_then(|items| match items.as_slice() {
            [x, y, z] => Some(Vec3::new(as_f32(x)?, as_f32(y)?, as_f32(z)?)),
            _ => None,
        });
        parsed.unwrap_or_else(|| {
            debug!("Metadata key '{key}' is not a 3-element number array");
            default
        })
    }

    fn get_string(&self, key: &str, default: &str) -> String {
        self.get(key)
            .and_then(toml::Value::as_str)
            .unwrap_or(default)
            .to_string()
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key)
            .and_then(toml::Value::as_bool)
            .unwrap_or(default)
    }

    fn sub_table(&self, key: &str) -> Self {
        Self {
            table: self.get(key).and_then(toml::Value::as_table).cloned(),
        }
    }
}

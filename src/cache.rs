//! Shared model cache keyed by file path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;

use crate::draw::DrawBackend;
use crate::error::LoadError;
use crate::loader::ModelLoader;
use crate::model::Model;

/// Loads each model file once and hands out shared references.
///
/// Failed loads are not remembered; asking again retries.
#[derive(Default)]
pub struct ModelCache {
    loader: ModelLoader,
    models: HashMap<PathBuf, Arc<Model>>,
}

impl ModelCache {
    pub fn new(loader: ModelLoader) -> Self {
        Self {
            loader,
            models: HashMap::new(),
        }
    }

    pub fn get(&self, path: &Path) -> Option<Arc<Model>> {
        self.models.get(path).cloned()
    }

    pub fn get_or_load(&mut self, path: &Path) -> Result<Arc<Model>, LoadError> {
        self.get_or_load_with(path, |_| {})
    }

    /// Like [`get_or_load`](Self::get_or_load), compiling freshly loaded
    /// models against `backend` before they are shared.
    pub fn get_or_load_compiled<B: DrawBackend + ?Sized>(
        &mut self,
        path: &Path,
        backend: &mut B,
    ) -> Result<Arc<Model>, LoadError> {
        self.get_or_load_with(path, |model| {
            model.compile(backend);
        })
    }

    fn get_or_load_with(
        &mut self,
        path: &Path,
        prepare: impl FnOnce(&mut Model),
    ) -> Result<Arc<Model>, LoadError> {
        if let Some(model) = self.models.get(path) {
            debug!("Model cache hit: {}", path.display());
            return Ok(Arc::clone(model));
        }

        let mut model = self.loader.load(path)?;
        prepare(&mut model);
        let model = Arc::new(model);
        self.models.insert(path.to_path_buf(), Arc::clone(&model));
        Ok(model)
    }

    /// Forget a model. Instances still holding it keep it alive.
    pub fn remove(&mut self, path: &Path) -> Option<Arc<Model>> {
        self.models.remove(path)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn clear(&mut self) {
        self.models.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_are_not_cached() {
        let mut cache = ModelCache::default();
        let path = Path::new("/nonexistent/piecework/tank.obj");

        assert!(cache.get_or_load(path).is_err());
        assert!(cache.is_empty());
        assert!(cache.get(path).is_none());
    }
}

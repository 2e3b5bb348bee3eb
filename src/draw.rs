//! Compiled draw lists and the rendering backend seam.
//!
//! A compiled list is identified by an opaque [`DrawListId`]. Ownership is
//! expressed through [`DrawList`]: whoever holds it owns the compiled
//! resource, and dropping it hands the id back to its [`DrawListPool`] so
//! the backend can free the resource on its own thread. Nothing is
//! reference counted; a canonical piece owns its full-detail list and every
//! instance piece owns its own LOD lists.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::trace;
use parking_lot::Mutex;

use crate::math::mat4::Mat4;
use crate::math::vec3::Vec3;
use crate::piece::{ModelPiece, PieceGeometry};

/// Opaque handle understood by a render backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DrawListId(u32);

impl DrawListId {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DrawListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Default)]
struct PoolState {
    next: u32,
    released: Vec<DrawListId>,
}

/// Hands out list ids and collects the ones whose owners were dropped.
#[derive(Clone, Debug, Default)]
pub struct DrawListPool {
    state: Arc<Mutex<PoolState>>,
}

impl DrawListPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a fresh id owned by the returned handle.
    pub fn allocate(&self) -> DrawList {
        let mut state = self.state.lock();
        state.next += 1;
        DrawList {
            id: DrawListId(state.next),
            pool: Arc::clone(&self.state),
        }
    }

    /// Ids released since the last call.
    pub fn drain_released(&self) -> Vec<DrawListId> {
        std::mem::take(&mut self.state.lock().released)
    }

    /// Number of released ids not yet drained.
    pub fn pending_releases(&self) -> usize {
        self.state.lock().released.len()
    }
}

/// Owning handle to a compiled list. Released on drop.
pub struct DrawList {
    id: DrawListId,
    pool: Arc<Mutex<PoolState>>,
}

impl DrawList {
    pub fn id(&self) -> DrawListId {
        self.id
    }
}

impl fmt::Debug for DrawList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DrawList").field(&self.id).finish()
    }
}

impl Drop for DrawList {
    fn drop(&mut self) {
        trace!("Releasing draw list {}", self.id);
        self.pool.lock().released.push(self.id);
    }
}

/// What the scene-graph walkers need from a renderer.
pub trait DrawBackend {
    /// Compile a piece's geometry. Pieces without geometry yield `None`.
    fn compile(&mut self, piece: &ModelPiece) -> Option<DrawList>;

    /// Issue one compiled list with the given absolute transform.
    fn draw(&mut self, list: DrawListId, world: &Mat4);
}

/// A world-space triangle emitted by [`SoftwareBackend`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldTriangle {
    pub list: DrawListId,
    pub points: [Vec3; 3],
}

/// CPU backend: compiled lists are triangle soups, drawing transforms them
/// into a frame list.
#[derive(Debug, Default)]
pub struct SoftwareBackend {
    pool: DrawListPool,
    lists: HashMap<DrawListId, Vec<[Vec3; 3]>>,
    frame: Vec<WorldTriangle>,
}

impl SoftwareBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pool(&self) -> &DrawListPool {
        &self.pool
    }

    /// Compile a reduced list keeping every `(level + 1)`-th triangle.
    pub fn compile_lod(&mut self, piece: &ModelPiece, level: u32) -> Option<DrawList> {
        let PieceGeometry::Mesh(mesh) = piece.geometry() else {
            return None;
        };
        let triangles: Vec<[Vec3; 3]> = mesh
            .triangles()
            .step_by(level as usize + 1)
            .collect();
        Some(self.store(triangles))
    }

    fn store(&mut self, triangles: Vec<[Vec3; 3]>) -> DrawList {
        let list = self.pool.allocate();
        self.lists.insert(list.id(), triangles);
        list
    }

    /// Free every list whose handle was dropped; returns how many.
    pub fn collect_garbage(&mut self) -> usize {
        let released = self.pool.drain_released();
        for id in &released {
            self.lists.remove(id);
        }
        released.len()
    }

    pub fn live_lists(&self) -> usize {
        self.lists.len()
    }

    pub fn frame(&self) -> &[WorldTriangle] {
        &self.frame
    }

    pub fn take_frame(&mut self) -> Vec<WorldTriangle> {
        std::mem::take(&mut self.frame)
    }
}

impl DrawBackend for SoftwareBackend {
    fn compile(&mut self, piece: &ModelPiece) -> Option<DrawList> {
        self.compile_lod(piece, 0)
    }

    fn draw(&mut self, list: DrawListId, world: &Mat4) {
        let Some(triangles) = self.lists.get(&list) else {
            trace!("Draw of unknown list {list} ignored");
            return;
        };
        self.frame.extend(triangles.iter().map(|t| WorldTriangle {
            list,
            points: [*world * t[0], *world * t[1], *world * t[2]],
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropped_lists_are_released_once() {
        let pool = DrawListPool::new();
        let a = pool.allocate();
        let b = pool.allocate();
        assert_ne!(a.id(), b.id());

        let id = a.id();
        drop(a);
        assert_eq!(pool.drain_released(), vec![id]);
        assert!(pool.drain_released().is_empty());
        drop(b);
        assert_eq!(pool.pending_releases(), 1);
    }

    #[test]
    fn pool_is_shared_between_clones() {
        let pool = DrawListPool::new();
        let other = pool.clone();
        drop(other.allocate());
        assert_eq!(pool.pending_releases(), 1);
    }
}

//! Point store.
//!
//! Owns the coordinate slots all primitives are built from. Handles are
//! append-only indices that are never reused; a recency list (most recently
//! touched first) decides which points keep their last value when the
//! constraint set leaves degrees of freedom.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque handle to a point in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointHandle(pub u32);

impl PointHandle {
    /// Index of this point's x unknown in the constraint matrix.
    pub fn x_unknown(self) -> usize {
        2 * self.0 as usize
    }

    /// Index of this point's y unknown in the constraint matrix.
    pub fn y_unknown(self) -> usize {
        2 * self.0 as usize + 1
    }
}

/// The set of live points with coordinates and a recency order.
#[derive(Debug, Clone, Default)]
pub struct PointStore {
    next_index: u32,
    coords: HashMap<PointHandle, (f64, f64)>,
    // Most recently touched first.
    recency: Vec<PointHandle>,
}

impl PointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new point at the given coordinates.
    ///
    /// Handles are never reused, so the sequence of indices is append-only
    /// even across deletions.
    pub fn alloc(&mut self, x: f64, y: f64) -> PointHandle {
        let handle = PointHandle(self.next_index);
        self.next_index += 1;
        self.coords.insert(handle, (x, y));
        self.recency.push(handle);
        handle
    }

    /// Release a point. The caller must guarantee no primitive still
    /// references the handle (deletion cascades resolve this first).
    pub fn free(&mut self, handle: PointHandle) {
        let existed = self.coords.remove(&handle).is_some();
        debug_assert!(existed, "freed a dead point handle {:?}", handle);
        self.recency.retain(|&h| h != handle);
    }

    /// Move a handle to the front of the recency list, marking it as the
    /// point whose value we should try hardest to keep.
    pub fn touch(&mut self, handle: PointHandle) {
        if let Some(pos) = self.recency.iter().position(|&h| h == handle) {
            self.recency.remove(pos);
            self.recency.insert(0, handle);
        }
    }

    pub fn contains(&self, handle: PointHandle) -> bool {
        self.coords.contains_key(&handle)
    }

    pub fn coords(&self, handle: PointHandle) -> (f64, f64) {
        self.coords[&handle]
    }

    pub fn x(&self, handle: PointHandle) -> f64 {
        self.coords[&handle].0
    }

    pub fn y(&self, handle: PointHandle) -> f64 {
        self.coords[&handle].1
    }

    /// Set coordinates explicitly (e.g. from a drag). Touches the handle.
    pub fn set_coords(&mut self, handle: PointHandle, x: f64, y: f64) {
        debug_assert!(self.coords.contains_key(&handle));
        self.touch(handle);
        self.coords.insert(handle, (x, y));
    }

    /// Write coordinates without affecting recency (solver write-back).
    pub fn write_coords(&mut self, handle: PointHandle, x: f64, y: f64) {
        self.coords.insert(handle, (x, y));
    }

    /// Number of live points.
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Live handles, most recently touched first.
    pub fn recency(&self) -> &[PointHandle] {
        &self.recency
    }

    /// Live handles in unspecified order.
    pub fn live(&self) -> impl Iterator<Item = PointHandle> + '_ {
        self.coords.keys().copied()
    }

    /// The next index that would be allocated (persisted so reloads keep
    /// the append-only property).
    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    /// Rebuild the store from persisted state. `order` is the recency list,
    /// most recently touched first.
    pub fn restore(
        next_index: u32,
        coords: HashMap<PointHandle, (f64, f64)>,
        order: Vec<PointHandle>,
    ) -> Self {
        debug_assert!(order.iter().all(|h| coords.contains_key(h)));
        Self {
            next_index,
            coords,
            recency: order,
        }
    }

    /// Snapshot of all coordinates (used by the solver write-back).
    pub fn snapshot(&self) -> HashMap<PointHandle, (f64, f64)> {
        self.coords.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_never_reuses_indices() {
        let mut store = PointStore::new();
        let a = store.alloc(0.0, 0.0);
        let b = store.alloc(1.0, 1.0);
        store.free(a);
        let c = store.alloc(2.0, 2.0);
        assert_ne!(c, a);
        assert_ne!(c, b);
        assert_eq!(store.len(), 2);
        assert_eq!(store.next_index(), 3);
    }

    #[test]
    fn test_touch_moves_to_front() {
        let mut store = PointStore::new();
        let a = store.alloc(0.0, 0.0);
        let b = store.alloc(1.0, 1.0);
        let c = store.alloc(2.0, 2.0);
        assert_eq!(store.recency(), &[a, b, c]);
        store.touch(b);
        assert_eq!(store.recency(), &[b, a, c]);
    }

    #[test]
    fn test_set_coords_touches() {
        let mut store = PointStore::new();
        let a = store.alloc(0.0, 0.0);
        let b = store.alloc(1.0, 1.0);
        store.set_coords(b, 5.0, 6.0);
        assert_eq!(store.coords(b), (5.0, 6.0));
        assert_eq!(store.recency()[0], b);
        assert_eq!(store.recency()[1], a);
    }

    #[test]
    fn test_free_removes_from_recency() {
        let mut store = PointStore::new();
        let a = store.alloc(0.0, 0.0);
        let b = store.alloc(1.0, 1.0);
        store.free(a);
        assert_eq!(store.recency(), &[b]);
        assert!(!store.contains(a));
    }
}

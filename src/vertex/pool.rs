use std::{
    cmp::Ordering,
    collections::{btree_map::Entry, BTreeMap},
    fmt,
};

use super::{weld_cmp, WeldVertex};


/// Welds near-duplicate vertices into a compact, indexed vertex buffer.
///
/// Each vertex submitted via [`get_index`][VertexPool::get_index] is compared
/// against the vertices already in the pool (see [`weld_cmp`]). If a match is
/// found, its index is returned; otherwise the vertex is appended. Indices are
/// 0-based and follow insertion order.
///
/// The pool is meant to live for the duration of one import: feed it a
/// triangle soup, take the buffer out and drop the pool.
pub struct VertexPool<V: WeldVertex> {
    vertices: Vec<V>,
    index: BTreeMap<WeldKey<V>, u32>,
}

impl<V: WeldVertex> VertexPool<V> {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            index: BTreeMap::new(),
        }
    }

    /// Returns the index of a vertex in the pool that compares equal to `v`,
    /// inserting `v` if there is none.
    pub fn get_index(&mut self, v: V) -> u32 {
        match self.index.entry(WeldKey(v)) {
            Entry::Occupied(e) => *e.get(),
            Entry::Vacant(e) => {
                let idx = self.vertices.len() as u32;
                self.vertices.push(v);
                e.insert(idx);
                idx
            }
        }
    }

    /// All unique vertices so far, in insertion order.
    pub fn buffer(&self) -> &[V] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.index.clear();
    }

    /// Consumes the pool and returns the vertex buffer.
    pub fn into_vec(self) -> Vec<V> {
        self.vertices
    }
}

impl<V: WeldVertex> Default for VertexPool<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: WeldVertex + fmt::Debug> fmt::Debug for VertexPool<V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("VertexPool")
            .field("vertices", &self.vertices)
            .finish()
    }
}


/// Key of the ordered index. Ordered by [`weld_cmp`], which is not a total
/// order in the strict sense (equality within tolerance is not transitive).
/// The map still behaves deterministically for a given insertion sequence.
struct WeldKey<V>(V);

impl<V: WeldVertex> PartialEq for WeldKey<V> {
    fn eq(&self, other: &Self) -> bool {
        weld_cmp(&self.0, &other.0) == Ordering::Equal
    }
}

impl<V: WeldVertex> Eq for WeldKey<V> {}

impl<V: WeldVertex> PartialOrd for WeldKey<V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<V: WeldVertex> Ord for WeldKey<V> {
    fn cmp(&self, other: &Self) -> Ordering {
        weld_cmp(&self.0, &other.0)
    }
}

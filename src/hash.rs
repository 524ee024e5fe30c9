//! A uniform grid spatial hash of axis aligned boxes.

use cgmath::Point3;
use fxhash::FxHashMap;
use smallvec::SmallVec;

use crate::algo::bounding::BoundingBox;


/// Candidate ids returned by [`MeshHash::query_unique`].
pub type Candidates = SmallVec<[u32; 16]>;

type Cell = (i32, i32, i32);

/// Spatial hash mapping grid cells to the ids of all boxes overlapping them.
///
/// Boxes are registered in every cell they touch. A point query returns the
/// ids registered in the single cell containing the point, so only boxes
/// "near" the point are returned (a box sharing the cell but not containing
/// the point is a possible false positive; a box containing the point is
/// never missed).
#[derive(Debug, Clone)]
pub struct MeshHash {
    cell_size: f32,
    inv_cell_size: f32,
    cells: FxHashMap<Cell, SmallVec<[u32; 4]>>,
}

impl MeshHash {
    /// Creates an empty hash. Non-positive or non-finite cell sizes are
    /// replaced by 1.
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 { cell_size } else { 1.0 };
        Self {
            cell_size,
            inv_cell_size: 1.0 / cell_size,
            cells: FxHashMap::default(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Removes all boxes.
    pub fn reset(&mut self) {
        self.cells.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Registers the box `bounds` with the given id. Invalid boxes are
    /// ignored.
    pub fn add(&mut self, bounds: &BoundingBox<f32>, id: u32) {
        if !bounds.is_valid() {
            return;
        }

        let (x0, y0, z0) = self.cell_of(bounds.min());
        let (x1, y1, z1) = self.cell_of(bounds.max());
        for x in x0..=x1 {
            for y in y0..=y1 {
                for z in z0..=z1 {
                    self.cells.entry((x, y, z)).or_default().push(id);
                }
            }
        }
    }

    /// Returns the ids of all boxes registered in the cell containing `p`,
    /// sorted and without duplicates.
    pub fn query_unique(&self, p: Point3<f32>) -> Candidates {
        let mut out = Candidates::new();
        if let Some(ids) = self.cells.get(&self.cell_of(p)) {
            out.extend(ids.iter().copied());
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    fn cell_of(&self, p: Point3<f32>) -> Cell {
        let c = |v: f32| (v * self.inv_cell_size).floor() as i32;
        (c(p.x), c(p.y), c(p.z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bb(min: [f32; 3], max: [f32; 3]) -> BoundingBox<f32> {
        BoundingBox::around(vec![min, max])
    }

    #[test]
    fn query_finds_containing_boxes() {
        let mut hash = MeshHash::new(1.0);
        hash.add(&bb([0.0, 0.0, 0.0], [0.5, 0.5, 0.5]), 0);
        hash.add(&bb([2.0, 2.0, 2.0], [3.5, 3.5, 3.5]), 1);
        hash.add(&bb([0.2, 0.2, 0.2], [2.5, 2.5, 2.5]), 2);

        assert_eq!(hash.query_unique(Point3::new(0.25, 0.25, 0.25)).as_slice(), &[0, 2]);
        assert_eq!(hash.query_unique(Point3::new(2.2, 2.2, 2.2)).as_slice(), &[1, 2]);
        assert_eq!(hash.query_unique(Point3::new(3.2, 3.2, 3.2)).as_slice(), &[1]);
        assert!(hash.query_unique(Point3::new(-3.0, 0.0, 0.0)).is_empty());
    }

    #[test]
    fn query_is_unique() {
        let mut hash = MeshHash::new(0.5);
        hash.add(&bb([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]), 7);
        hash.add(&bb([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]), 7);
        assert_eq!(hash.query_unique(Point3::new(0.1, 0.1, 0.1)).as_slice(), &[7]);
    }

    #[test]
    fn negative_coordinates() {
        let mut hash = MeshHash::new(1.0);
        hash.add(&bb([-1.5, -1.5, -1.5], [-1.2, -1.2, -1.2]), 3);
        assert_eq!(hash.query_unique(Point3::new(-1.3, -1.3, -1.3)).as_slice(), &[3]);
        assert!(hash.query_unique(Point3::new(-0.3, -0.3, -0.3)).is_empty());
    }

    #[test]
    fn bad_cell_size_and_reset() {
        let mut hash = MeshHash::new(0.0);
        assert_eq!(hash.cell_size(), 1.0);
        assert_eq!(MeshHash::new(f32::NAN).cell_size(), 1.0);

        hash.add(&bb([0.0, 0.0, 0.0], [0.1, 0.1, 0.1]), 1);
        hash.add(&BoundingBox::new(), 2);
        assert!(!hash.is_empty());
        hash.reset();
        assert!(hash.is_empty());
    }
}

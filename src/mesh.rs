//! A plain indexed triangle mesh.
//!
//! This is the exchange format between the editing stages: source meshes,
//! simplified surfaces and iso surfaces are all `TriMesh`es.

use cgmath::{Point3, Vector3};

use crate::algo::{
    bounding::{ritter_sphere, BoundingBox, BoundingSphere},
    ray::ray_triangle,
};


/// Direction used for ray-parity inside tests. Deliberately not axis aligned
/// so that rays rarely graze edges of grid aligned meshes.
const PARITY_DIR: Vector3<f32> = Vector3 { x: 0.8129, y: 0.4711, z: 0.3423 };

/// An indexed triangle mesh with only vertex positions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriMesh {
    pub positions: Vec<Point3<f32>>,
    pub triangles: Vec<[u32; 3]>,
}

impl TriMesh {
    pub fn new(positions: Vec<Point3<f32>>, triangles: Vec<[u32; 3]>) -> Self {
        Self { positions, triangles }
    }

    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Returns the three corner positions of the triangle `t`.
    pub fn corners(&self, t: usize) -> [Point3<f32>; 3] {
        let [a, b, c] = self.triangles[t];
        [
            self.positions[a as usize],
            self.positions[b as usize],
            self.positions[c as usize],
        ]
    }

    /// Unnormalized normal of triangle `t` (its length is twice the area).
    pub fn face_normal(&self, t: usize) -> Vector3<f32> {
        let [a, b, c] = self.corners(t);
        (b - a).cross(c - a)
    }

    pub fn bounding_box(&self) -> BoundingBox<f32> {
        BoundingBox::around(self.positions.iter().copied())
    }

    pub fn bounding_sphere(&self) -> Option<BoundingSphere<f32>> {
        ritter_sphere(self.positions.iter().copied())
    }

    /// Returns `true` if all triangle indices are in range.
    pub fn is_valid(&self) -> bool {
        let n = self.positions.len() as u32;
        self.triangles.iter().all(|t| t.iter().all(|&i| i < n))
    }

    /// Checks whether `p` lies inside the volume enclosed by this mesh.
    ///
    /// Counts the triangles hit by a ray starting at `p`; an odd count means
    /// inside. Only meaningful for closed meshes.
    pub fn contains_point(&self, p: Point3<f32>) -> bool {
        let hits = (0..self.triangles.len())
            .filter(|&t| {
                let [a, b, c] = self.corners(t);
                ray_triangle(p, PARITY_DIR, a, b, c).is_some()
            })
            .count();

        hits % 2 == 1
    }
}

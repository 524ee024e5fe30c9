//! Tetrahedral meshes, the graphics models linked to them and the editing
//! pipeline producing them.

use cgmath::{
    prelude::*,
    Point3, Vector3,
};

pub mod maker;
mod mesh;
mod model;
mod render;


pub use self::{
    maker::{GridTetraMaker, TetraMaker},
    mesh::{barycentric, LinkStats, Pick, PickHit, TetraMesh},
    model::{EditState, Material, Section, TetraModel},
    render::RenderBuffer,
};


/// Associates one graphics vertex with a host tetrahedron.
///
/// `bary` holds the weights of the first three corners; the fourth weight is
/// `1 - bary.x - bary.y - bary.z`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TetraLink {
    pub tetra: u32,
    pub bary: Vector3<f32>,
}

impl TetraLink {
    /// The link assigned when no usable host tetrahedron exists.
    pub const UNLINKED: TetraLink = TetraLink {
        tetra: 0,
        bary: Vector3 { x: 0.0, y: 0.0, z: 0.0 },
    };

    pub fn new(tetra: u32, bary: Vector3<f32>) -> Self {
        Self { tetra, bary }
    }

    /// All four corner weights.
    pub fn weights(&self) -> [f32; 4] {
        let b = self.bary;
        [b.x, b.y, b.z, 1.0 - b.x - b.y - b.z]
    }

    /// `true` if all four weights lie in `[0, 1]`.
    pub fn is_inside(&self) -> bool {
        let b = self.bary;
        b.x >= 0.0 && b.y >= 0.0 && b.z >= 0.0
            && b.x <= 1.0 && b.y <= 1.0 && b.z <= 1.0
            && b.x + b.y + b.z <= 1.0
    }

    /// Sum of the amounts by which the weights leave `[0, 1]`. Zero for
    /// points inside the tetrahedron.
    pub fn outside_distance(&self) -> f32 {
        self.weights()
            .iter()
            .map(|&w| if w < 0.0 { -w } else if w > 1.0 { w - 1.0 } else { 0.0 })
            .sum()
    }

    /// Affine combination of the four corners with this link's weights.
    pub fn interpolate(
        &self,
        p0: Point3<f32>,
        p1: Point3<f32>,
        p2: Point3<f32>,
        p3: Point3<f32>,
    ) -> Point3<f32> {
        let [w0, w1, w2, w3] = self.weights();
        Point3::from_vec(p0.to_vec() * w0 + p1.to_vec() * w1 + p2.to_vec() * w2 + p3.to_vec() * w3)
    }
}

//! Geometric algorithms: bounding volumes, ray tests and mesh smoothing.

use cgmath::{
    prelude::*,
    Point3, Vector3,
};
use num_traits::Zero;
use smallvec::SmallVec;

use crate::mesh::TriMesh;

pub mod bounding;
pub mod ray;



/// Moves every vertex to the centroid of its ring-1 neighbors.
///
/// Vertices without neighbors keep their position. Topology is unchanged.
pub fn smooth_simple(mesh: &TriMesh) -> TriMesh {
    let mut neighbors = vec![SmallVec::<[u32; 8]>::new(); mesh.num_vertices()];
    let mut connect = |a: u32, b: u32| {
        let list = &mut neighbors[a as usize];
        if !list.contains(&b) {
            list.push(b);
        }
    };
    for &[a, b, c] in &mesh.triangles {
        connect(a, b);
        connect(a, c);
        connect(b, a);
        connect(b, c);
        connect(c, a);
        connect(c, b);
    }

    let positions = mesh.positions.iter()
        .zip(&neighbors)
        .map(|(&p, ring)| {
            if ring.is_empty() {
                return p;
            }

            let sum = ring.iter()
                .map(|&n| mesh.positions[n as usize].to_vec())
                .fold(Vector3::zero(), |acc, v| acc + v);
            Point3::from_vec(sum / ring.len() as f32)
        })
        .collect();

    TriMesh::new(positions, mesh.triangles.clone())
}

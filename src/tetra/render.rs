use cgmath::{
    prelude::*,
    Point3,
};

use crate::vertex::{TetraVertex, VertexPool};
use super::mesh::TetraMesh;


/// Flat shaded triangles of all non-deleted tetrahedra of a [`TetraMesh`],
/// ready to be handed to a renderer.
#[derive(Debug, Clone)]
pub struct RenderBuffer {
    vertices: Vec<TetraVertex>,
    indices: Vec<u32>,
    shrink: f32,
}

impl RenderBuffer {
    pub(crate) fn build(mesh: &TetraMesh, shrink: f32) -> Self {
        let mut pool = VertexPool::new();
        let mut indices = Vec::new();

        for t in mesh.live_tetrahedra() {
            let corners = mesh.corners(t);
            let center = Point3::centroid(&corners);
            let idx = mesh.tetra(t);
            let shrunk = |i: u32| {
                let k = idx.iter().position(|&x| x == i).unwrap_or(0);
                center + (corners[k] - center) * shrink
            };

            for face in mesh.oriented_faces(t).iter() {
                let [a, b, c] = [shrunk(face[0]), shrunk(face[1]), shrunk(face[2])];
                let n = (b - a).cross(c - a);
                let normal = if n.magnitude2() > 0.0 { n.normalize() } else { n };

                for &pos in &[a, b, c] {
                    indices.push(pool.get_index(TetraVertex { pos, normal, tetra: t }));
                }
            }
        }

        Self {
            vertices: pool.into_vec(),
            indices,
            shrink,
        }
    }

    pub fn vertices(&self) -> &[TetraVertex] {
        &self.vertices
    }

    /// Triangle list, three indices per triangle.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn shrink(&self) -> f32 {
        self.shrink
    }
}

//! Shared fixtures for unit tests.

use cgmath::Point3;

use crate::{
    mesh::TriMesh,
    tetra::TetraMesh,
};


pub(crate) fn p(x: f32, y: f32, z: f32) -> Point3<f32> {
    Point3::new(x, y, z)
}

/// Corner `c` of the axis aligned cube `[0, size]³`. Bits of `c`: 1 = +x,
/// 2 = +y, 4 = +z.
fn cube_corner(c: u32, size: f32) -> Point3<f32> {
    p(
        (c & 1) as f32 * size,
        ((c >> 1) & 1) as f32 * size,
        ((c >> 2) & 1) as f32 * size,
    )
}

/// Closed, outward oriented surface of the cube `[0, size]³` (8 vertices,
/// 12 triangles).
pub(crate) fn cube_surface(size: f32) -> TriMesh {
    let positions = (0..8).map(|c| cube_corner(c, size)).collect();
    let quads = [
        [1, 3, 7, 5],
        [0, 4, 6, 2],
        [2, 6, 7, 3],
        [0, 1, 5, 4],
        [4, 5, 7, 6],
        [0, 2, 3, 1],
    ];
    let triangles = quads.iter()
        .flat_map(|q| vec![[q[0], q[1], q[2]], [q[0], q[2], q[3]]])
        .collect();

    TriMesh::new(positions, triangles)
}

/// The unit cube split into 6 tetrahedra along its main diagonal.
pub(crate) fn kuhn_cube() -> TetraMesh {
    let positions = (0..8).map(|c| cube_corner(c, 1.0)).collect();
    let indices = vec![
        0, 1, 3, 7,
        0, 1, 5, 7,
        0, 2, 3, 7,
        0, 2, 6, 7,
        0, 4, 5, 7,
        0, 4, 6, 7,
    ];

    TetraMesh::new(positions, indices).unwrap()
}

/// `n` disjoint unit corner tetrahedra, tetrahedron `k` shifted by `3k`
/// along the x axis.
pub(crate) fn tetra_row(n: u32) -> TetraMesh {
    let mut positions = Vec::new();
    let mut indices = Vec::new();
    for k in 0..n {
        let x = 3.0 * k as f32;
        positions.extend_from_slice(&[
            p(x, 0.0, 0.0),
            p(x + 1.0, 0.0, 0.0),
            p(x, 1.0, 0.0),
            p(x, 0.0, 1.0),
        ]);
        indices.extend((0..4).map(|i| 4 * k + i));
    }

    TetraMesh::new(positions, indices).unwrap()
}

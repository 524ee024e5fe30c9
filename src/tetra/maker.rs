//! Surface simplification, iso surfaces and tetrahedralization.
//!
//! [`TetraMaker`] is the interface the editing pipeline uses; it treats the
//! implementation as an oracle. [`GridTetraMaker`] is a simple voxel based
//! implementation that works for any closed surface.

use cgmath::{
    prelude::*,
    Point3, Vector3,
};
use fxhash::{FxHashMap, FxHashSet};
use num_traits::Zero;
use tracing::{debug, info};

use crate::{
    Error,
    algo::smooth_simple,
    mesh::TriMesh,
    vertex::{PosVertex, VertexPool},
};
use super::mesh::{signed_volume6, TetraMesh};


/// Turns surfaces into tetrahedral meshes.
pub trait TetraMaker {
    /// Sets the resolution of iso surfaces and tetrahedralizations.
    fn set_subdivision_level(&mut self, level: u32);

    /// Returns a simplified version of `surface`. `detail` lies in `(0, 1]`,
    /// where 1 means "keep everything".
    fn simplify_surface(&mut self, detail: f32, surface: &TriMesh) -> Result<TriMesh, Error>;

    /// Extracts a closed iso surface approximating the volume enclosed by
    /// `surface`. With `single_pass`, no additional smoothing pass is done.
    fn create_iso_surface(&mut self, surface: &TriMesh, single_pass: bool) -> Result<TriMesh, Error>;

    /// Fills the volume enclosed by `surface` with tetrahedra.
    fn create_tetra_mesh(&mut self, surface: &TriMesh) -> Result<TetraMesh, Error>;
}

/// Maximum accepted subdivision level.
pub const MAX_SUBDIVISION: u32 = 128;

/// Clusters per longest axis used by simplification at detail level 1.
const SIMPLIFY_RESOLUTION: f32 = 64.0;

/// Voxel grid based [`TetraMaker`].
///
/// The bounding box of the input surface is divided into cubes with
/// `subdivision` cubes along the longest axis. A cube is occupied if its
/// center lies inside the surface (ray parity test).
#[derive(Debug, Clone)]
pub struct GridTetraMaker {
    subdivision: u32,
}

impl GridTetraMaker {
    pub fn new(subdivision: u32) -> Self {
        let mut out = Self { subdivision: 0 };
        out.set_subdivision_level(subdivision);
        out
    }

    pub fn subdivision_level(&self) -> u32 {
        self.subdivision
    }

    fn voxelize(&self, surface: &TriMesh) -> Result<Voxels, Error> {
        if surface.is_empty() {
            return Err(Error::EmptyMesh);
        }

        let bb = surface.bounding_box();
        let longest = bb.longest_side();
        if !bb.is_valid() || longest <= 0.0 {
            return Err(Error::Maker("surface has no extent".into()));
        }

        let cell = longest / self.subdivision as f32;
        let extent = bb.max() - bb.min();
        let dim = |e: f32| ((e / cell).ceil() as u32).max(1);
        let dims = [dim(extent.x), dim(extent.y), dim(extent.z)];

        let mut voxels = Voxels {
            origin: bb.min(),
            cell,
            dims,
            occupied: vec![false; (dims[0] * dims[1] * dims[2]) as usize],
        };
        let mut count = 0;
        for k in 0..dims[2] {
            for j in 0..dims[1] {
                for i in 0..dims[0] {
                    let center = voxels.corner(i, j, k) + Vector3::new(cell, cell, cell) * 0.5;
                    if surface.contains_point(center) {
                        let idx = voxels.index(i, j, k);
                        voxels.occupied[idx] = true;
                        count += 1;
                    }
                }
            }
        }

        debug!("voxelized surface into {:?} cells, {} occupied", dims, count);
        if count == 0 {
            return Err(Error::Maker(format!(
                "surface does not enclose any volume at subdivision level {}",
                self.subdivision,
            )));
        }

        Ok(voxels)
    }
}

impl Default for GridTetraMaker {
    fn default() -> Self {
        Self::new(20)
    }
}

impl TetraMaker for GridTetraMaker {
    fn set_subdivision_level(&mut self, level: u32) {
        self.subdivision = level.max(1).min(MAX_SUBDIVISION);
    }

    fn simplify_surface(&mut self, detail: f32, surface: &TriMesh) -> Result<TriMesh, Error> {
        if surface.is_empty() {
            return Err(Error::EmptyMesh);
        }
        if !(detail < 1.0) {
            return Ok(surface.clone());
        }

        let bb = surface.bounding_box();
        let cells = (detail.max(0.0) * SIMPLIFY_RESOLUTION).ceil().max(1.0);
        let cell = bb.longest_side() / cells;
        if !(cell > 0.0) {
            return Ok(surface.clone());
        }

        // Cluster vertices per cell, the new position is the cluster mean.
        let mut clusters: FxHashMap<(i32, i32, i32), u32> = FxHashMap::default();
        let mut sums: Vec<(Vector3<f32>, u32)> = Vec::new();
        let remap = surface.positions.iter()
            .map(|&p| {
                let d = (p - bb.min()) / cell;
                let key = (d.x.floor() as i32, d.y.floor() as i32, d.z.floor() as i32);
                let idx = *clusters.entry(key).or_insert_with(|| {
                    sums.push((Vector3::zero(), 0));
                    sums.len() as u32 - 1
                });
                let sum = &mut sums[idx as usize];
                sum.0 += p.to_vec();
                sum.1 += 1;
                idx
            })
            .collect::<Vec<_>>();

        let mut seen = FxHashSet::default();
        let mut triangles = Vec::new();
        for &[a, b, c] in &surface.triangles {
            let tri = [remap[a as usize], remap[b as usize], remap[c as usize]];
            if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
                continue;
            }

            let mut key = tri;
            key.sort_unstable();
            if seen.insert(key) {
                triangles.push(tri);
            }
        }

        let positions = sums.into_iter()
            .map(|(sum, n)| Point3::from_vec(sum / n as f32))
            .collect();
        let out = TriMesh::new(positions, triangles);
        info!(
            "simplified surface (detail {}): {} -> {} triangles",
            detail,
            surface.num_triangles(),
            out.num_triangles(),
        );

        Ok(out)
    }

    fn create_iso_surface(&mut self, surface: &TriMesh, single_pass: bool) -> Result<TriMesh, Error> {
        let voxels = self.voxelize(surface)?;

        let mut pool = VertexPool::new();
        let mut triangles = Vec::new();
        for (i, j, k) in voxels.occupied_cells() {
            for (offset, quad) in &CUBE_FACES {
                let (ni, nj, nk) = (i as i64 + offset[0], j as i64 + offset[1], k as i64 + offset[2]);
                if voxels.is_occupied(ni, nj, nk) {
                    continue;
                }

                let q = quad.map_corners(|c| pool.get_index(PosVertex::new(voxels.cube_corner(i, j, k, c))));
                triangles.push([q[0], q[1], q[2]]);
                triangles.push([q[0], q[2], q[3]]);
            }
        }

        let positions = pool.into_vec().into_iter().map(|v| v.pos).collect();
        let mut out = TriMesh::new(positions, triangles);
        if !single_pass {
            out = smooth_simple(&out);
        }

        info!(
            "created iso surface: {} triangles, {} vertices (subdivision {})",
            out.num_triangles(),
            out.num_vertices(),
            self.subdivision,
        );
        Ok(out)
    }

    fn create_tetra_mesh(&mut self, surface: &TriMesh) -> Result<TetraMesh, Error> {
        let voxels = self.voxelize(surface)?;

        let mut pool = VertexPool::new();
        let mut indices = Vec::new();
        for (i, j, k) in voxels.occupied_cells() {
            for tet in &KUHN_TETRAHEDRA {
                let mut corners = [0u32; 4];
                let mut positions = [Point3::new(0.0, 0.0, 0.0); 4];
                for (n, &c) in tet.iter().enumerate() {
                    positions[n] = voxels.cube_corner(i, j, k, c);
                    corners[n] = pool.get_index(PosVertex::new(positions[n]));
                }

                if signed_volume6(positions) < 0.0 {
                    corners.swap(2, 3);
                }
                indices.extend_from_slice(&corners);
            }
        }

        let positions = pool.into_vec().into_iter().map(|v| v.pos).collect::<Vec<_>>();
        info!(
            "created tetrahedral mesh: {} tetrahedra, {} vertices (subdivision {})",
            indices.len() / 4,
            positions.len(),
            self.subdivision,
        );

        TetraMesh::new(positions, indices)
    }
}


// ===========================================================================
// ===== Voxel grid
// ===========================================================================

/// Cube corners are numbered by bits: 1 = +x, 2 = +y, 4 = +z.
const KUHN_TETRAHEDRA: [[u8; 4]; 6] = [
    [0, 1, 3, 7],
    [0, 1, 5, 7],
    [0, 2, 3, 7],
    [0, 2, 6, 7],
    [0, 4, 5, 7],
    [0, 4, 6, 7],
];

#[derive(Clone, Copy)]
struct Quad([u8; 4]);

impl Quad {
    fn map_corners(&self, mut f: impl FnMut(u8) -> u32) -> [u32; 4] {
        [f(self.0[0]), f(self.0[1]), f(self.0[2]), f(self.0[3])]
    }
}

/// Neighbor offset and outward wound corner quad of each cube face.
const CUBE_FACES: [([i64; 3], Quad); 6] = [
    ([1, 0, 0], Quad([1, 3, 7, 5])),
    ([-1, 0, 0], Quad([0, 4, 6, 2])),
    ([0, 1, 0], Quad([2, 6, 7, 3])),
    ([0, -1, 0], Quad([0, 1, 5, 4])),
    ([0, 0, 1], Quad([4, 5, 7, 6])),
    ([0, 0, -1], Quad([0, 2, 3, 1])),
];

struct Voxels {
    origin: Point3<f32>,
    cell: f32,
    dims: [u32; 3],
    occupied: Vec<bool>,
}

impl Voxels {
    fn index(&self, i: u32, j: u32, k: u32) -> usize {
        ((k * self.dims[1] + j) * self.dims[0] + i) as usize
    }

    fn is_occupied(&self, i: i64, j: i64, k: i64) -> bool {
        let inside = |v: i64, d: u32| v >= 0 && v < d as i64;
        inside(i, self.dims[0]) && inside(j, self.dims[1]) && inside(k, self.dims[2])
            && self.occupied[self.index(i as u32, j as u32, k as u32)]
    }

    fn occupied_cells(&self) -> impl Iterator<Item = (u32, u32, u32)> + '_ {
        let [dx, dy, dz] = self.dims;
        (0..dz)
            .flat_map(move |k| (0..dy).flat_map(move |j| (0..dx).map(move |i| (i, j, k))))
            .filter(move |&(i, j, k)| self.occupied[self.index(i, j, k)])
    }

    /// The minimum corner of cell `(i, j, k)`. Computed from integer
    /// coordinates so that neighboring cells share bitwise equal corners.
    fn corner(&self, i: u32, j: u32, k: u32) -> Point3<f32> {
        self.origin + Vector3::new(i as f32, j as f32, k as f32) * self.cell
    }

    fn cube_corner(&self, i: u32, j: u32, k: u32, c: u8) -> Point3<f32> {
        self.corner(
            i + (c & 1) as u32,
            j + ((c >> 1) & 1) as u32,
            k + ((c >> 2) & 1) as u32,
        )
    }
}

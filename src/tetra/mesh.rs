use cgmath::{
    prelude::*,
    Point3, Vector3,
};
use fxhash::FxHashMap;
use num_traits::Zero;
use tracing::{debug, info};

use crate::{
    Error,
    algo::{
        bounding::{ritter_sphere, BoundingBox, BoundingSphere},
        ray::{ray_sphere, ray_triangle},
    },
    hash::MeshHash,
    mesh::TriMesh,
    vertex::{GraphicsVertex, PosVertex, VertexPool},
};
use super::{
    TetraLink,
    render::RenderBuffer,
};


/// The spatial hash cell size as fraction of the bounding sphere diameter.
const HASH_CELL_FRACTION: f32 = 0.1;

/// Corner indices (into a tetrahedron's four corners) of its faces. Face `i`
/// lies opposite of corner `i` and points outwards for positively oriented
/// tetrahedra.
pub(crate) const TETRA_FACES: [[usize; 3]; 4] = [
    [1, 2, 3],
    [0, 3, 2],
    [0, 1, 3],
    [0, 2, 1],
];

/// Counters describing the result of [`TetraMesh::build_links`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Vertices lying inside their host tetrahedron.
    pub inside: usize,

    /// Vertices outside of all candidates, linked to the closest one.
    pub nearest: usize,

    /// Vertices for which the spatial hash returned nothing, so all
    /// tetrahedra were searched.
    pub exhaustive: usize,

    /// Vertices without any usable tetrahedron (linked to
    /// [`TetraLink::UNLINKED`]).
    pub unlinked: usize,
}

/// Result of a pick ray cast against a tetrahedral mesh.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pick {
    /// Nearest hit tetrahedron that is not deleted.
    pub hit: Option<PickHit>,

    /// Nearest hit tetrahedron that is deleted.
    pub deleted_hit: Option<PickHit>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub tetra: u32,
    pub t: f32,
}

/// A tetrahedral simulation mesh plus the link table binding a graphics
/// mesh to it.
///
/// The tetrahedra are stored as four consecutive indices into `positions`.
/// Tetrahedra can be flagged as deleted; deleted tetrahedra are skipped by
/// link building, surface extraction and rendering, but the link table is
/// *not* touched by deletions. A graphics vertex linked to a tetrahedron that
/// gets deleted afterwards keeps that link until the next
/// [`build_links`][TetraMesh::build_links].
#[derive(Debug, Clone)]
pub struct TetraMesh {
    positions: Vec<Point3<f32>>,
    indices: Vec<u32>,
    deletions: Option<Vec<bool>>,
    links: Vec<TetraLink>,
    sphere: Option<BoundingSphere<f32>>,
    render_cache: Option<RenderBuffer>,
}

impl TetraMesh {
    /// Creates a tetra mesh from corner positions and indices (four per
    /// tetrahedron).
    pub fn new(positions: Vec<Point3<f32>>, indices: Vec<u32>) -> Result<Self, Error> {
        if indices.len() % 4 != 0 {
            return Err(Error::InvalidTetraMesh(format!(
                "number of indices ({}) is not a multiple of 4",
                indices.len(),
            )));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(Error::InvalidTetraMesh(format!(
                "index {} out of range ({} vertices)",
                bad,
                positions.len(),
            )));
        }

        let sphere = ritter_sphere(positions.iter().copied());
        Ok(Self {
            positions,
            indices,
            deletions: None,
            links: Vec::new(),
            sphere,
            render_cache: None,
        })
    }

    pub fn positions(&self) -> &[Point3<f32>] {
        &self.positions
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    pub fn num_tetrahedra(&self) -> usize {
        self.indices.len() / 4
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// The four corner indices of tetrahedron `t`.
    pub fn tetra(&self, t: u32) -> [u32; 4] {
        let b = t as usize * 4;
        [self.indices[b], self.indices[b + 1], self.indices[b + 2], self.indices[b + 3]]
    }

    /// The four corner positions of tetrahedron `t`.
    pub fn corners(&self, t: u32) -> [Point3<f32>; 4] {
        let [a, b, c, d] = self.tetra(t);
        [
            self.positions[a as usize],
            self.positions[b as usize],
            self.positions[c as usize],
            self.positions[d as usize],
        ]
    }

    /// Ritter bounding sphere of all corner positions.
    pub fn bounding_sphere(&self) -> Option<BoundingSphere<f32>> {
        self.sphere
    }

    // ----- Deletions -------------------------------------------------------

    pub fn is_deleted(&self, t: u32) -> bool {
        self.deletions.as_ref().map_or(false, |d| d[t as usize])
    }

    pub fn set_deleted(&mut self, t: u32, deleted: bool) {
        if self.is_deleted(t) == deleted {
            return;
        }

        let n = self.num_tetrahedra();
        self.deletions.get_or_insert_with(|| vec![false; n])[t as usize] = deleted;
        self.render_cache = None;
    }

    pub fn toggle_deleted(&mut self, t: u32) {
        let deleted = self.is_deleted(t);
        self.set_deleted(t, !deleted);
    }

    /// Restores all deleted tetrahedra.
    pub fn clear_deletions(&mut self) {
        if self.deletions.take().is_some() {
            self.render_cache = None;
        }
    }

    pub fn num_deleted(&self) -> usize {
        self.deletions.as_ref().map_or(0, |d| d.iter().filter(|&&x| x).count())
    }

    /// The deletion mask, if any tetrahedron was ever flagged.
    pub fn deletion_mask(&self) -> Option<&[bool]> {
        self.deletions.as_deref()
    }

    /// Replaces the deletion mask. Masks of the wrong length are ignored.
    pub fn set_deletion_mask(&mut self, mask: Option<Vec<bool>>) {
        if mask.as_ref().map_or(true, |m| m.len() == self.num_tetrahedra()) {
            self.deletions = mask;
            self.render_cache = None;
        }
    }

    /// Iterates over the indices of all tetrahedra that are not deleted.
    pub fn live_tetrahedra(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.num_tetrahedra() as u32).filter(move |&t| !self.is_deleted(t))
    }

    /// Physically removes all deleted tetrahedra and the vertices no longer
    /// used by any tetrahedron. Returns the number of removed tetrahedra.
    ///
    /// Tetrahedron indices change, so the link table is cleared and has to be
    /// rebuilt.
    pub fn remove_deleted(&mut self) -> usize {
        let removed = self.num_deleted();
        if removed == 0 {
            return 0;
        }

        let mut pool = VertexPool::new();
        let mut indices = Vec::with_capacity((self.num_tetrahedra() - removed) * 4);
        for t in self.live_tetrahedra() {
            for &i in &self.tetra(t) {
                indices.push(pool.get_index(PosVertex::new(self.positions[i as usize])));
            }
        }

        self.positions = pool.into_vec().into_iter().map(|v| v.pos).collect();
        self.indices = indices;
        self.deletions = None;
        self.links.clear();
        self.sphere = ritter_sphere(self.positions.iter().copied());
        self.render_cache = None;

        info!(
            "removed {} deleted tetrahedra ({} tetrahedra, {} vertices left)",
            removed,
            self.num_tetrahedra(),
            self.positions.len(),
        );
        removed
    }

    // ----- Links -----------------------------------------------------------

    pub fn links(&self) -> &[TetraLink] {
        &self.links
    }

    pub fn set_links(&mut self, links: Vec<TetraLink>) {
        self.links = links;
    }

    /// Barycentric coordinates of `p` with respect to tetrahedron `t`.
    ///
    /// Returns `None` for degenerate (flat) tetrahedra.
    pub fn barycentric(&self, t: u32, p: Point3<f32>) -> Option<Vector3<f32>> {
        barycentric(self.corners(t), p)
    }

    /// Links every vertex in `vertices` to a host tetrahedron and stores the
    /// resulting link table (one link per vertex, same order).
    ///
    /// Deleted tetrahedra never become hosts. Every vertex gets a link: if it
    /// is not inside any tetrahedron, the one with the smallest
    /// [outside distance][TetraLink::outside_distance] is used; if there is
    /// no usable tetrahedron at all, [`TetraLink::UNLINKED`].
    pub fn build_links(&mut self, vertices: &[Point3<f32>]) -> LinkStats {
        let mut stats = LinkStats::default();

        let cell_size = self.sphere.map_or(1.0, |s| s.diameter() * HASH_CELL_FRACTION);
        let mut hash = MeshHash::new(cell_size);
        for t in self.live_tetrahedra() {
            hash.add(&BoundingBox::around(self.corners(t).iter().copied()), t);
        }

        let mut links = Vec::with_capacity(vertices.len());
        for &p in vertices {
            let candidates = hash.query_unique(p);
            let found = if candidates.is_empty() {
                stats.exhaustive += 1;
                self.find_host(p, self.live_tetrahedra())
            } else {
                self.find_host(p, candidates.iter().copied())
            };

            let link = match found {
                Some(link) => {
                    if link.is_inside() {
                        stats.inside += 1;
                    } else {
                        stats.nearest += 1;
                    }
                    link
                }
                None => {
                    stats.unlinked += 1;
                    TetraLink::UNLINKED
                }
            };
            links.push(link);
        }

        self.links = links;
        debug!(
            "built {} links (inside: {}, nearest: {}, exhaustive searches: {}, unlinked: {})",
            vertices.len(),
            stats.inside,
            stats.nearest,
            stats.exhaustive,
            stats.unlinked,
        );
        stats
    }

    /// Finds the best host of `p` among the given tetrahedra. The first
    /// tetrahedron containing `p` wins, otherwise the one with the smallest
    /// outside distance.
    fn find_host(&self, p: Point3<f32>, candidates: impl Iterator<Item = u32>) -> Option<TetraLink> {
        let mut best: Option<(f32, TetraLink)> = None;
        for t in candidates {
            let bary = match self.barycentric(t, p) {
                Some(b) => b,
                None => continue,
            };

            let link = TetraLink { tetra: t, bary };
            if link.is_inside() {
                return Some(link);
            }

            let dist = link.outside_distance();
            if best.map_or(true, |(best_dist, _)| dist < best_dist) {
                best = Some((dist, link));
            }
        }

        best.map(|(_, link)| link)
    }

    /// Recomputes graphics vertex positions from the live tetrahedron
    /// positions and indices (as written by the physics engine).
    ///
    /// `out[i]` is reconstructed from link `i`. Normals are set to zero; they
    /// have to be accumulated from the faces afterwards. Vertices whose host
    /// tetrahedron is not present in the live buffers are left untouched.
    pub fn apply_links(
        &self,
        out: &mut [GraphicsVertex],
        live_positions: &[Point3<f32>],
        live_indices: &[u32],
    ) {
        for (v, link) in out.iter_mut().zip(&self.links) {
            let base = link.tetra as usize * 4;
            let corners = match live_indices.get(base..base + 4) {
                Some(c) => c,
                None => continue,
            };
            if corners.iter().any(|&i| i as usize >= live_positions.len()) {
                continue;
            }

            let [p0, p1, p2, p3] = [
                live_positions[corners[0] as usize],
                live_positions[corners[1] as usize],
                live_positions[corners[2] as usize],
                live_positions[corners[3] as usize],
            ];
            v.pos = link.interpolate(p0, p1, p2, p3);
            v.normal = Vector3::zero();
        }
    }

    // ----- Surface, picking and rendering ----------------------------------

    /// Returns the boundary of all non-deleted tetrahedra: every face that is
    /// used by exactly one of them, oriented outwards. Unused vertices are
    /// dropped.
    pub fn surface(&self) -> TriMesh {
        // Sorted corner indices -> (use count, oriented face)
        let mut faces: FxHashMap<[u32; 3], (u32, [u32; 3])> = FxHashMap::default();
        let mut order = Vec::new();
        for t in self.live_tetrahedra() {
            for face in self.oriented_faces(t).iter() {
                let mut key = *face;
                key.sort_unstable();
                let entry = faces.entry(key).or_insert_with(|| {
                    order.push(key);
                    (0, *face)
                });
                entry.0 += 1;
            }
        }

        let mut remap = vec![None; self.positions.len()];
        let mut positions = Vec::new();
        let mut triangles = Vec::new();
        for key in order {
            let (count, face) = faces[&key];
            if count != 1 {
                continue;
            }

            let mut tri = [0; 3];
            for (dst, &src) in tri.iter_mut().zip(&face) {
                *dst = *remap[src as usize].get_or_insert_with(|| {
                    positions.push(self.positions[src as usize]);
                    positions.len() as u32 - 1
                });
            }
            triangles.push(tri);
        }

        TriMesh::new(positions, triangles)
    }

    /// The four faces of tetrahedron `t` as vertex indices, oriented outwards
    /// regardless of the orientation of the tetrahedron.
    pub(crate) fn oriented_faces(&self, t: u32) -> [[u32; 3]; 4] {
        let idx = self.tetra(t);
        let flip = signed_volume6(self.corners(t)) < 0.0;

        let mut out = [[0; 3]; 4];
        for (dst, face) in out.iter_mut().zip(&TETRA_FACES) {
            *dst = if flip {
                [idx[face[0]], idx[face[2]], idx[face[1]]]
            } else {
                [idx[face[0]], idx[face[1]], idx[face[2]]]
            };
        }
        out
    }

    /// Casts a ray against all tetrahedra.
    ///
    /// In a single pass, this tracks the nearest hit non-deleted tetrahedron
    /// (a candidate for deletion) and the nearest hit deleted tetrahedron (a
    /// candidate for restoring).
    pub fn pick(&self, origin: Point3<f32>, dir: Vector3<f32>) -> Pick {
        let mut pick = Pick::default();
        match self.sphere {
            Some(s) if ray_sphere(origin, dir, s.center, s.radius).is_some() => {}
            _ => return pick,
        }

        for t in 0..self.num_tetrahedra() as u32 {
            let corners = self.corners(t);
            let nearest = TETRA_FACES.iter()
                .filter_map(|f| {
                    ray_triangle(origin, dir, corners[f[0]], corners[f[1]], corners[f[2]])
                })
                .fold(None, |acc: Option<f32>, hit| Some(acc.map_or(hit, |a| a.min(hit))));

            if let Some(dist) = nearest {
                let tracker = if self.is_deleted(t) { &mut pick.deleted_hit } else { &mut pick.hit };
                if tracker.map_or(true, |h| dist < h.t) {
                    *tracker = Some(PickHit { tetra: t, t: dist });
                }
            }
        }

        pick
    }

    /// Returns the render buffer of all non-deleted tetrahedra, each shrunk
    /// towards its centroid by `shrink` (1 = original size).
    ///
    /// The buffer is cached until the deletions or the geometry change.
    pub fn render_buffer(&mut self, shrink: f32) -> &RenderBuffer {
        let cache = match self.render_cache.take() {
            Some(cache) if cache.shrink() == shrink => cache,
            _ => RenderBuffer::build(self, shrink),
        };

        self.render_cache.get_or_insert(cache)
    }

    /// Returns `true` if a render buffer is cached.
    pub fn has_render_cache(&self) -> bool {
        self.render_cache.is_some()
    }
}

/// Six times the signed volume of a tetrahedron.
pub(crate) fn signed_volume6([p0, p1, p2, p3]: [Point3<f32>; 4]) -> f32 {
    (p1 - p0).dot((p2 - p0).cross(p3 - p0))
}

/// Barycentric coordinates of `p` with respect to the tetrahedron with the
/// given corners, via Cramer's rule. The weight of the fourth corner is
/// implied (`1 - x - y - z`).
///
/// Returns `None` if the determinant vanishes relative to the edge lengths.
pub fn barycentric([p0, p1, p2, p3]: [Point3<f32>; 4], p: Point3<f32>) -> Option<Vector3<f32>> {
    let a = p0 - p3;
    let b = p1 - p3;
    let c = p2 - p3;
    let d = p - p3;

    let det = a.dot(b.cross(c));
    let scale = a.magnitude() * b.magnitude() * c.magnitude();
    if det.abs() <= f32::EPSILON * scale || !det.is_finite() {
        return None;
    }

    Some(Vector3::new(
        d.dot(b.cross(c)) / det,
        a.dot(d.cross(c)) / det,
        a.dot(b.cross(d)) / det,
    ))
}

//! Vertex record flavors and the tolerance based comparison used to weld
//! them.
//!
//! All flavors share the same conceptual role (a position plus optional
//! attributes) and are deduplicated by the generic [`VertexPool`]. Two
//! vertices are considered equal when their positions are closer than
//! [`POSITION_TOLERANCE`], their normals closer than [`NORMAL_TOLERANCE`],
//! their texture coordinates closer than [`TEXEL_TOLERANCE`] and bone
//! assignments match. Otherwise they are ordered lexicographically by
//! position, normal, texel, bones and tag.
//!
//! Note that this "equality" is not transitive: `a ≈ b` and `b ≈ c` does not
//! imply `a ≈ c`. Which vertices end up welded therefore depends on the order
//! in which they are submitted.

use std::cmp::Ordering;

use cgmath::{
    prelude::*,
    Point3, Vector3,
};
use static_assertions::assert_eq_size;

mod pool;

#[cfg(test)]
mod tests;

pub use self::pool::VertexPool;


/// Positions closer than this are welded.
pub const POSITION_TOLERANCE: f32 = 1e-5;

/// Normals whose difference vector is shorter than this are welded.
pub const NORMAL_TOLERANCE: f32 = 0.05;

/// Texture coordinates closer than this are welded. Also used for bone
/// weights.
pub const TEXEL_TOLERANCE: f32 = 0.001;


/// A vertex record that can be welded by a [`VertexPool`].
///
/// Only `position` is required. All other attributes default to "not
/// present" and are skipped by [`weld_cmp`].
pub trait WeldVertex: Copy {
    fn position(&self) -> Point3<f32>;

    fn normal(&self) -> Option<Vector3<f32>> {
        None
    }

    fn texel(&self) -> Option<[f32; 2]> {
        None
    }

    fn bone_weights(&self) -> Option<([u16; 4], [f32; 4])> {
        None
    }

    /// An additional integer that has to match exactly.
    fn tag(&self) -> Option<u32> {
        None
    }
}

/// Compares two vertices with the welding tolerances (see module docs).
pub fn weld_cmp<V: WeldVertex>(a: &V, b: &V) -> Ordering {
    let pa = a.position();
    let pb = b.position();
    let ord = cmp_within(
        pa.distance2(pb) < POSITION_TOLERANCE * POSITION_TOLERANCE,
        &[pa.x, pa.y, pa.z],
        &[pb.x, pb.y, pb.z],
    );
    if ord != Ordering::Equal {
        return ord;
    }

    if let (Some(na), Some(nb)) = (a.normal(), b.normal()) {
        let ord = cmp_within(
            na.distance2(nb) < NORMAL_TOLERANCE * NORMAL_TOLERANCE,
            &[na.x, na.y, na.z],
            &[nb.x, nb.y, nb.z],
        );
        if ord != Ordering::Equal {
            return ord;
        }
    }

    if let (Some(ta), Some(tb)) = (a.texel(), b.texel()) {
        let dx = ta[0] - tb[0];
        let dy = ta[1] - tb[1];
        let ord = cmp_within(dx * dx + dy * dy < TEXEL_TOLERANCE * TEXEL_TOLERANCE, &ta, &tb);
        if ord != Ordering::Equal {
            return ord;
        }
    }

    if let (Some((ba, wa)), Some((bb, wb))) = (a.bone_weights(), b.bone_weights()) {
        let ord = ba.cmp(&bb);
        if ord != Ordering::Equal {
            return ord;
        }

        let close = wa.iter().zip(&wb).all(|(x, y)| (x - y).abs() < TEXEL_TOLERANCE);
        let ord = cmp_within(close, &wa, &wb);
        if ord != Ordering::Equal {
            return ord;
        }
    }

    a.tag().cmp(&b.tag())
}

/// `Equal` if `close`, otherwise the lexicographic order of the components.
fn cmp_within(close: bool, a: &[f32], b: &[f32]) -> Ordering {
    if close {
        return Ordering::Equal;
    }

    a.iter()
        .zip(b)
        .map(|(x, y)| x.partial_cmp(y).unwrap_or(Ordering::Equal))
        .find(|&ord| ord != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}


// ===========================================================================
// ===== Vertex flavors
// ===========================================================================

/// Only a position. Used to weld tetrahedron corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PosVertex {
    pub pos: Point3<f32>,
}

impl PosVertex {
    pub fn new(pos: Point3<f32>) -> Self {
        Self { pos }
    }
}

impl WeldVertex for PosVertex {
    fn position(&self) -> Point3<f32> {
        self.pos
    }
}

/// A vertex of a graphics mesh: position, normal and texture coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphicsVertex {
    pub pos: Point3<f32>,
    pub normal: Vector3<f32>,
    pub texel: [f32; 2],
}

impl GraphicsVertex {
    pub fn new(pos: Point3<f32>, normal: Vector3<f32>, texel: [f32; 2]) -> Self {
        Self { pos, normal, texel }
    }

    /// A vertex with only a position; normal and texel are zero.
    pub fn at(pos: Point3<f32>) -> Self {
        Self::new(pos, Vector3::new(0.0, 0.0, 0.0), [0.0; 2])
    }
}

impl WeldVertex for GraphicsVertex {
    fn position(&self) -> Point3<f32> {
        self.pos
    }
    fn normal(&self) -> Option<Vector3<f32>> {
        Some(self.normal)
    }
    fn texel(&self) -> Option<[f32; 2]> {
        Some(self.texel)
    }
}

/// A render vertex of a tetrahedral mesh, tagged with the tetrahedron it
/// belongs to. Vertices of different tetrahedra are never welded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TetraVertex {
    pub pos: Point3<f32>,
    pub normal: Vector3<f32>,
    pub tetra: u32,
}

impl WeldVertex for TetraVertex {
    fn position(&self) -> Point3<f32> {
        self.pos
    }
    fn normal(&self) -> Option<Vector3<f32>> {
        Some(self.normal)
    }
    fn tag(&self) -> Option<u32> {
        Some(self.tetra)
    }
}

/// A vertex deformed by up to four bones.
///
/// The weights are supposed to sum up to 1. This is not checked on
/// construction, but established by the weight inference of
/// [`SkinnedMesh`][crate::skinned::SkinnedMesh].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeformVertex {
    pub pos: Point3<f32>,
    pub normal: Vector3<f32>,
    pub texel: [f32; 2],
    pub bones: [u16; 4],
    pub weights: [f32; 4],
}

impl DeformVertex {
    pub fn unweighted(v: GraphicsVertex) -> Self {
        Self {
            pos: v.pos,
            normal: v.normal,
            texel: v.texel,
            bones: [0; 4],
            weights: [0.0; 4],
        }
    }

    pub fn graphics(&self) -> GraphicsVertex {
        GraphicsVertex::new(self.pos, self.normal, self.texel)
    }
}

impl WeldVertex for DeformVertex {
    fn position(&self) -> Point3<f32> {
        self.pos
    }
    fn normal(&self) -> Option<Vector3<f32>> {
        Some(self.normal)
    }
    fn texel(&self) -> Option<[f32; 2]> {
        Some(self.texel)
    }
    fn bone_weights(&self) -> Option<([u16; 4], [f32; 4])> {
        Some((self.bones, self.weights))
    }
}

// These are handed to renderers as raw vertex streams.
assert_eq_size!(PosVertex, [f32; 3]);
assert_eq_size!(GraphicsVertex, [f32; 8]);
assert_eq_size!(TetraVertex, [f32; 7]);
assert_eq_size!(DeformVertex, [f32; 14]);

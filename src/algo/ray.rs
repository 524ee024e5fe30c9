//! Ray intersection tests used for picking and inside/outside classification.

use cgmath::{
    prelude::*,
    Point3, Vector3,
};


/// Determinants with an absolute value below this are treated as "ray
/// parallel to triangle".
const PARALLEL_EPSILON: f32 = 1e-12;

/// Intersects a ray with a triangle (Möller–Trumbore).
///
/// Both triangle sides are hit. Returns the ray parameter `t` of the hit
/// point `origin + t * dir`, but only for hits strictly in front of the
/// origin (`t > 0`). Points on the triangle edges count as hits.
pub fn ray_triangle(
    origin: Point3<f32>,
    dir: Vector3<f32>,
    v0: Point3<f32>,
    v1: Point3<f32>,
    v2: Point3<f32>,
) -> Option<f32> {
    let e1 = v1 - v0;
    let e2 = v2 - v0;

    let p = dir.cross(e2);
    let det = e1.dot(p);
    if det.abs() < PARALLEL_EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;

    let s = origin - v0;
    let u = s.dot(p) * inv_det;
    if u < 0.0 || u > 1.0 {
        return None;
    }

    let q = s.cross(e1);
    let v = dir.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = e2.dot(q) * inv_det;
    if t > 0.0 {
        Some(t)
    } else {
        None
    }
}

/// Intersects a ray with a sphere and returns the ray parameter of the hit.
///
/// For origins outside of the sphere this is the entry point; spheres behind
/// the origin are never hit. An origin inside the sphere (or exactly on its
/// surface) always hits: the entry point is computed along the reversed
/// direction and mirrored, which yields the exit point with `t >= 0`. The
/// textbook version returns a negative `t` in that case.
pub fn ray_sphere(
    origin: Point3<f32>,
    dir: Vector3<f32>,
    center: Point3<f32>,
    radius: f32,
) -> Option<f32> {
    let w = center - origin;
    let wsq = w.magnitude2();
    let rsq = radius * radius;
    let proj = w.dot(dir);
    let inside = wsq <= rsq;

    if proj < 0.0 && !inside {
        return None;
    }

    let vsq = dir.magnitude2();
    if vsq == 0.0 {
        return None;
    }

    // Squared distance of the sphere center to the ray, scaled by `vsq²`.
    let disc = vsq * rsq - (vsq * wsq - proj * proj);
    if disc < 0.0 {
        return None;
    }
    let root = disc.sqrt();

    let t = if inside {
        let back_proj = w.dot(-dir);
        -((back_proj - root) / vsq)
    } else {
        (proj - root) / vsq
    };

    Some(t)
}

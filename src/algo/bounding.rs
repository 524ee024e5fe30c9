use std::fmt;

use cgmath::{
    prelude::*,
    BaseFloat, Point3,
};

use crate::prop::Pos3Like;


/// A bounding sphere defined by a center and a radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere<F: BaseFloat> {
    pub center: Point3<F>,
    pub radius: F,
}

impl<F: BaseFloat> BoundingSphere<F> {
    /// Returns `true` if `p` lies within the sphere, allowing for a distance
    /// of `eps` beyond the radius.
    pub fn contains(&self, p: Point3<F>, eps: F) -> bool {
        p.distance(self.center) <= self.radius + eps
    }

    pub fn diameter(&self) -> F {
        self.radius + self.radius
    }
}

/// Calculates a bounding sphere with the algorithm by Jack Ritter.
///
/// The first pass looks at the six axis-extremal points (minimum and maximum
/// along x, y and z) and uses the pair with the largest distance as initial
/// diameter. The second pass grows the sphere just enough to include every
/// point lying outside of it, shifting the center towards that point.
///
/// The returned sphere contains all points but is usually not minimal. The
/// result depends on the order of the points. Returns `None` if the iterator
/// is empty.
///
/// Reference: Ritter, Jack. "An efficient bounding sphere."
/// Graphics gems 1 (1990): 301-303.
pub fn ritter_sphere<I, ScalarT>(positions: I) -> Option<BoundingSphere<ScalarT>>
where
    I: Iterator + Clone,
    I::Item: Pos3Like<Scalar = ScalarT>,
    ScalarT: BaseFloat + fmt::Debug,
{
    let first = positions.clone().next()?.to_point3();

    // Extremal points, in the order min x, max x, min y, max y, min z, max z.
    let mut extremes = [first; 6];
    for p in positions.clone().map(|p| p.to_point3()) {
        if p.x < extremes[0].x { extremes[0] = p; }
        if p.x > extremes[1].x { extremes[1] = p; }
        if p.y < extremes[2].y { extremes[2] = p; }
        if p.y > extremes[3].y { extremes[3] = p; }
        if p.z < extremes[4].z { extremes[4] = p; }
        if p.z > extremes[5].z { extremes[5] = p; }
    }

    // Pick the most separated pair as initial diameter. Ties keep the
    // earlier axis.
    let span = |axis: usize| extremes[2 * axis].distance2(extremes[2 * axis + 1]);
    let mut axis = 0;
    for candidate in 1..3 {
        if span(candidate) > span(axis) {
            axis = candidate;
        }
    }
    let (a, b) = (extremes[2 * axis], extremes[2 * axis + 1]);

    let one = ScalarT::one();
    let half = one / (one + one);
    let mut center = Point3::centroid(&[a, b]);
    let mut radius = a.distance(b) * half;

    // Grow the sphere to include all points outside of it.
    for p in positions.map(|p| p.to_point3()) {
        let dist = p.distance(center);
        if dist > radius {
            let new_radius = (radius + dist) * half;
            let shift = dist - new_radius;
            center = center + (p - center) * (shift / dist);
            radius = new_radius;
        }
    }

    Some(BoundingSphere { center, radius })
}


/// An axis aligned bounding box.
#[derive(Clone, Copy, PartialEq)]
pub struct BoundingBox<F: BaseFloat> {
    min: Point3<F>,
    max: Point3<F>,
}

impl<F: BaseFloat> BoundingBox<F> {
    /// Creates an invalid bounding box: all lower bounds are ∞, all upper
    /// bounds are -∞. Once you added a single point, the bounding box will be
    /// valid.
    pub fn new() -> Self {
        Self {
            min: Point3::new(F::infinity(), F::infinity(), F::infinity()),
            max: Point3::new(F::neg_infinity(), F::neg_infinity(), F::neg_infinity()),
        }
    }

    /// Creates a bounding box around all points of the given iterator. If the
    /// iterator is empty, an invalid bounding box is returned (see
    /// [`BoundingBox::new`]).
    pub fn around<I>(iter: I) -> Self
    where
        I: IntoIterator,
        I::Item: Pos3Like<Scalar = F>,
    {
        let mut out = Self::new();
        for pos in iter {
            out.add_point(pos);
        }
        out
    }

    pub fn min(&self) -> Point3<F> {
        self.min
    }

    pub fn max(&self) -> Point3<F> {
        self.max
    }

    /// Returns the center of this bounding box.
    pub fn center(&self) -> Point3<F> {
        Point3::centroid(&[self.min, self.max])
    }

    /// Returns the length of the longest side.
    pub fn longest_side(&self) -> F {
        let d = self.max - self.min;
        d.x.max(d.y).max(d.z)
    }

    /// Adds a point to the bounding box, enlarging it if the point lies
    /// outside of the box.
    pub fn add_point<P: Pos3Like<Scalar = F>>(&mut self, p: P) {
        let p = p.to_point3();
        self.min = Point3::new(self.min.x.min(p.x), self.min.y.min(p.y), self.min.z.min(p.z));
        self.max = Point3::new(self.max.x.max(p.x), self.max.y.max(p.y), self.max.z.max(p.z));
    }

    /// Returns `true` if the point lies inside or on the border of the box.
    pub fn contains(&self, p: Point3<F>) -> bool {
        p.x >= self.min.x && p.x <= self.max.x
            && p.y >= self.min.y && p.y <= self.max.y
            && p.z >= self.min.z && p.z <= self.max.z
    }

    /// Returns `true` if all bounds are finite.
    pub fn is_valid(&self) -> bool {
        self.min.x.is_finite() && self.min.y.is_finite() && self.min.z.is_finite()
            && self.max.x.is_finite() && self.max.y.is_finite() && self.max.z.is_finite()
    }
}

impl<F: BaseFloat> Default for BoundingBox<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: BaseFloat> fmt::Debug for BoundingBox<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("BoundingBox")
            .field("x", &(self.min.x..self.max.x))
            .field("y", &(self.min.y..self.max.y))
            .field("z", &(self.min.z..self.max.z))
            .finish()
    }
}

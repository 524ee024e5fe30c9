//! Reading positions out of the different point and vertex types.

use std::fmt::Debug;

use cgmath::{BaseFloat, Point3};

use crate::vertex::{DeformVertex, GraphicsVertex, PosVertex, TetraVertex};


/// Types that have a 3D position.
///
/// Implemented for `cgmath::Point3`, plain `[T; 3]` arrays and all vertex
/// flavors, so that geometric helpers like
/// [`ritter_sphere`][crate::algo::bounding::ritter_sphere] can work on vertex
/// buffers directly.
pub trait Pos3Like: Copy {
    /// The type of each component.
    type Scalar: BaseFloat + Debug;

    fn x(&self) -> Self::Scalar;
    fn y(&self) -> Self::Scalar;
    fn z(&self) -> Self::Scalar;

    fn to_point3(&self) -> Point3<Self::Scalar> {
        Point3::new(self.x(), self.y(), self.z())
    }
}

impl<T: BaseFloat + Debug> Pos3Like for Point3<T> {
    type Scalar = T;
    fn x(&self) -> Self::Scalar { self.x }
    fn y(&self) -> Self::Scalar { self.y }
    fn z(&self) -> Self::Scalar { self.z }
    fn to_point3(&self) -> Point3<T> { *self }
}

impl<T: BaseFloat + Debug> Pos3Like for [T; 3] {
    type Scalar = T;
    fn x(&self) -> Self::Scalar { self[0] }
    fn y(&self) -> Self::Scalar { self[1] }
    fn z(&self) -> Self::Scalar { self[2] }
}

macro_rules! impl_pos3_like_for_vertex {
    ($($ty:ident),*) => {
        $(
            impl Pos3Like for $ty {
                type Scalar = f32;
                fn x(&self) -> f32 { self.pos.x }
                fn y(&self) -> f32 { self.pos.y }
                fn z(&self) -> f32 { self.pos.z }
                fn to_point3(&self) -> Point3<f32> { self.pos }
            }
        )*
    };
}

impl_pos3_like_for_vertex!(PosVertex, GraphicsVertex, TetraVertex, DeformVertex);

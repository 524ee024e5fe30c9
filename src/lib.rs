//! Linking dense graphics meshes to sparse, deformable tetrahedral meshes.
//!
//! The core of this library is the [`TetraMesh`][tetra::TetraMesh]: a
//! tetrahedral simulation mesh that knows, for every vertex of a static
//! graphics mesh, which tetrahedron hosts it and with which barycentric
//! coordinates. With that link table, the graphics mesh can be reconstructed
//! each frame from nothing but the live (deformed) tetrahedron corners.
//!
//! Around that sit:
//!
//! - [`vertex::VertexPool`]: welds near-duplicate vertices of triangle soups
//!   into an indexed buffer,
//! - [`hash::MeshHash`]: the spatial hash used to find host tetrahedra,
//! - [`algo`]: ray intersection and bounding sphere math,
//! - [`tetra::TetraModel`]: graphics mesh + tetra mesh + the editing state
//!   machine (source mesh → surface → tetrahedra → simulation),
//! - [`system::SoftBodySystem`]: the command driven owner of all models and
//!   simulated soft bodies,
//! - [`skinned`]: bone weighted meshes driven by rigid actor hierarchies.

pub mod algo;
pub mod error;
pub mod files;
pub mod hash;
pub mod io;
pub mod mesh;
pub mod physics;
pub mod prop;
pub mod skinned;
pub mod system;
pub mod tetra;
pub mod vertex;

#[cfg(test)]
mod test_utils;

pub use cgmath;

pub use self::{
    error::Error,
    mesh::TriMesh,
    system::{Command, SoftBodySystem, SoftContext},
    tetra::{TetraLink, TetraMesh, TetraModel},
    vertex::{GraphicsVertex, VertexPool},
};

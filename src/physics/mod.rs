//! The interface to the physics engine simulating soft bodies.
//!
//! The engine is a collaborator: it receives a tetrahedral mesh plus a
//! [`SoftBodyDesc`] and, each step, writes the deformed tetrahedron corner
//! positions into a caller owned [`SoftBodyBuffer`]. [`KinematicScene`] is a
//! simple built-in engine without real soft body dynamics.

use cgmath::{Matrix4, Point3};
use derive_more::{Display, From};

use crate::{
    Error,
    tetra::TetraMesh,
};

mod kinematic;

#[cfg(test)]
mod tests;

pub use self::kinematic::KinematicScene;


/// Identifies a soft body inside a [`SoftBodyScene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, From)]
#[display(fmt = "soft body #{}", _0)]
pub struct SimHandle(pub u32);

/// Boolean switches of a [`SoftBodyDesc`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftBodyFlags {
    pub gravity: bool,
    pub volume_conservation: bool,
    pub damping: bool,
    pub self_collision: bool,

    /// Simulate on dedicated hardware. Changing this requires recreating the
    /// soft body.
    pub hardware: bool,
    pub visualization: bool,
}

impl Default for SoftBodyFlags {
    fn default() -> Self {
        Self {
            gravity: true,
            volume_conservation: true,
            damping: false,
            self_collision: false,
            hardware: false,
            visualization: false,
        }
    }
}

/// Simulation parameters of a soft body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoftBodyDesc {
    pub particle_radius: f32,
    pub volume_stiffness: f32,
    pub stretching_stiffness: f32,
    pub damping_coefficient: f32,
    pub friction: f32,
    pub collision_response_coefficient: f32,
    pub attachment_response_coefficient: f32,
    pub solver_iterations: u32,
    pub flags: SoftBodyFlags,
}

impl Default for SoftBodyDesc {
    fn default() -> Self {
        Self {
            particle_radius: 0.1,
            volume_stiffness: 1.0,
            stretching_stiffness: 1.0,
            damping_coefficient: 0.5,
            friction: 0.5,
            collision_response_coefficient: 0.2,
            attachment_response_coefficient: 0.2,
            solver_iterations: 5,
            flags: SoftBodyFlags::default(),
        }
    }
}

/// A physics engine able to simulate soft bodies.
pub trait SoftBodyScene {
    /// Whether soft bodies can be simulated with
    /// [`SoftBodyFlags::hardware`] set.
    fn hardware_available(&self) -> bool;

    /// Creates a soft body from the tetrahedral mesh, placed with `pose`.
    fn create_soft_body(
        &mut self,
        desc: &SoftBodyDesc,
        mesh: &TetraMesh,
        pose: Matrix4<f32>,
    ) -> Result<SimHandle, Error>;

    /// Removes the soft body. Unknown handles are ignored.
    fn release_soft_body(&mut self, handle: SimHandle);

    /// Applies changed parameters to a live soft body. Flags requiring
    /// recreation (hardware) are ignored here.
    fn update_soft_body(&mut self, handle: SimHandle, desc: &SoftBodyDesc) -> Result<(), Error>;

    /// Advances the simulation by `dt` seconds.
    fn simulate(&mut self, dt: f32);

    /// Writes the current state of the soft body into the back side of
    /// `buffer`.
    fn fetch_results(&mut self, handle: SimHandle, buffer: &mut SoftBodyBuffer) -> Result<(), Error>;

    /// Removes all soft bodies.
    fn reset(&mut self);
}


// ===========================================================================
// ===== Receive buffer
// ===========================================================================

#[derive(Debug, Clone, Default)]
struct BufferSide {
    positions: Vec<Point3<f32>>,
    indices: Vec<u32>,
    num_positions: usize,
    num_indices: usize,
}

impl BufferSide {
    fn with_capacity(max_positions: usize, max_indices: usize) -> Self {
        Self {
            positions: vec![Point3::new(0.0, 0.0, 0.0); max_positions],
            indices: vec![0; max_indices],
            num_positions: 0,
            num_indices: 0,
        }
    }
}

/// Double buffered receive area for the deformed mesh of one soft body.
///
/// Both sides are allocated once with a fixed capacity. The engine writes
/// into the back side ([`write`][SoftBodyBuffer::write]), and
/// [`swap`][SoftBodyBuffer::swap] publishes it as the front side that is
/// read by the renderer.
#[derive(Debug, Clone, Default)]
pub struct SoftBodyBuffer {
    front: BufferSide,
    back: BufferSide,
}

impl SoftBodyBuffer {
    pub fn new(max_positions: usize, max_indices: usize) -> Self {
        Self {
            front: BufferSide::with_capacity(max_positions, max_indices),
            back: BufferSide::with_capacity(max_positions, max_indices),
        }
    }

    /// A buffer with exactly the capacity needed for `mesh`.
    pub fn for_mesh(mesh: &TetraMesh) -> Self {
        Self::new(mesh.num_vertices(), mesh.indices().len())
    }

    pub fn max_positions(&self) -> usize {
        self.back.positions.len()
    }

    pub fn max_indices(&self) -> usize {
        self.back.indices.len()
    }

    /// Copies positions and indices into the back side. Data beyond the
    /// capacity is dropped; the written counts never exceed the capacity.
    pub fn write(&mut self, positions: &[Point3<f32>], indices: &[u32]) {
        let back = &mut self.back;

        back.num_positions = positions.len().min(back.positions.len());
        back.positions[..back.num_positions].copy_from_slice(&positions[..back.num_positions]);

        back.num_indices = indices.len().min(back.indices.len());
        back.indices[..back.num_indices].copy_from_slice(&indices[..back.num_indices]);
    }

    /// Publishes the back side.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.front, &mut self.back);
    }

    /// The published positions.
    pub fn positions(&self) -> &[Point3<f32>] {
        &self.front.positions[..self.front.num_positions]
    }

    /// The published tetrahedron indices.
    pub fn indices(&self) -> &[u32] {
        &self.front.indices[..self.front.num_indices]
    }

    pub fn num_written_positions(&self) -> usize {
        self.front.num_positions
    }

    pub fn num_written_indices(&self) -> usize {
        self.front.num_indices
    }
}

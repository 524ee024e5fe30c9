use std::{fmt, path::PathBuf};

use cgmath::{Matrix4, Point3, Vector3};


/// Everything a [`SoftBodySystem`][super::SoftBodySystem] can be asked to
/// do.
///
/// Commands that work on a file carry an optional path. If it is `None`,
/// the path is asked from the
/// [`SoftFileInterface`][crate::files::SoftFileInterface].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // ----- Scene and files -------------------------------------------------
    /// Releases all soft bodies and skinned mesh instances. Imported models
    /// are kept unless `discard_models` is set.
    ResetScene { discard_models: bool },

    /// Imports an OBJ file (plus its `.tet` sidecar, if present) and makes
    /// it the edit target.
    ImportObj(Option<PathBuf>),

    /// Exports the edit target as OBJ (plus `.tet` sidecar).
    ExportObj(Option<PathBuf>),

    SaveCoreDump(Option<PathBuf>),
    LoadCoreDump(Option<PathBuf>),

    // ----- Editing ---------------------------------------------------------
    CopySurface { detail: f32 },
    CopyIsoSurface { single_pass: bool },
    SetSubdivisionLevel(u32),
    CreateTetrahedra,
    RebuildLinks,
    Pick { origin: Point3<f32>, dir: Vector3<f32> },
    DeletePicked,
    RestorePicked,
    ClearDeletions,
    RemoveDeleted,

    // ----- Simulation ------------------------------------------------------
    /// Adds a soft body of the edit target, placed with `pose`.
    CreateSoftBody { pose: Matrix4<f32> },

    /// Recreates all soft bodies of the edit target with the current
    /// parameters (including staged ones). Creates one at the origin if
    /// there is none.
    CreateSimulation,

    /// Releases all soft bodies of the edit target.
    ReleaseSimulation,

    Simulate { dt: f32 },

    // ----- Parameters ------------------------------------------------------
    SetParticleRadius(f32),
    SetVolumeStiffness(f32),
    SetStretchingStiffness(f32),
    SetDampingCoefficient(f32),
    SetFriction(f32),
    SetSolverIterations(u32),
    SetGravity(bool),
    SetVolumeConservation(bool),
    SetDamping(bool),
    SetSelfCollision(bool),

    /// Staged: takes effect with the next `CreateSimulation`.
    SetHardware(bool),
}

impl Command {
    /// Short human readable name used in messages.
    pub fn name(&self) -> &'static str {
        match self {
            Command::ResetScene { .. } => "reset scene",
            Command::ImportObj(_) => "import OBJ",
            Command::ExportObj(_) => "export OBJ",
            Command::SaveCoreDump(_) => "save core dump",
            Command::LoadCoreDump(_) => "load core dump",
            Command::CopySurface { .. } => "copy surface",
            Command::CopyIsoSurface { .. } => "copy iso surface",
            Command::SetSubdivisionLevel(_) => "set subdivision level",
            Command::CreateTetrahedra => "create tetrahedra",
            Command::RebuildLinks => "rebuild links",
            Command::Pick { .. } => "pick",
            Command::DeletePicked => "delete tetrahedron",
            Command::RestorePicked => "restore tetrahedron",
            Command::ClearDeletions => "clear deletions",
            Command::RemoveDeleted => "remove deleted tetrahedra",
            Command::CreateSoftBody { .. } => "create soft body",
            Command::CreateSimulation => "create simulation",
            Command::ReleaseSimulation => "release simulation",
            Command::Simulate { .. } => "simulate",
            Command::SetParticleRadius(_) => "set particle radius",
            Command::SetVolumeStiffness(_) => "set volume stiffness",
            Command::SetStretchingStiffness(_) => "set stretching stiffness",
            Command::SetDampingCoefficient(_) => "set damping coefficient",
            Command::SetFriction(_) => "set friction",
            Command::SetSolverIterations(_) => "set solver iterations",
            Command::SetGravity(_) => "set gravity",
            Command::SetVolumeConservation(_) => "set volume conservation",
            Command::SetDamping(_) => "set damping",
            Command::SetSelfCollision(_) => "set self collision",
            Command::SetHardware(_) => "set hardware",
        }
    }

    /// Whether the command changes the tetrahedral mesh or its links and
    /// thus requires the simulation of the edit target to be released
    /// first.
    pub fn edits_mesh(&self) -> bool {
        match self {
            Command::CopySurface { .. }
            | Command::CopyIsoSurface { .. }
            | Command::CreateTetrahedra
            | Command::RebuildLinks
            | Command::DeletePicked
            | Command::RestorePicked
            | Command::ClearDeletions
            | Command::RemoveDeleted => true,
            _ => false,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.name().fmt(f)
    }
}

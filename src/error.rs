//! The error type of all fallible high level operations.

use std::fmt;

use failure::Fail;

use crate::io;


/// Everything that can go wrong while editing, linking or simulating.
///
/// None of these errors are fatal: the command dispatcher reports them to the
/// user and continues as if the command had never been issued.
#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "{}", _0)]
    Io(#[fail(cause)] io::Error),

    #[fail(display = "no model is currently being edited")]
    NoEditTarget,

    #[fail(display = "model '{}' has no tetrahedral mesh", _0)]
    NoTetraMesh(String),

    #[fail(display = "model '{}' has no surface mesh, copy a surface first", _0)]
    NoSurfaceMesh(String),

    #[fail(display = "the mesh is empty")]
    EmptyMesh,

    #[fail(display = "invalid tetrahedral mesh: {}", _0)]
    InvalidTetraMesh(String),

    #[fail(display = "hardware soft body simulation is not available")]
    HardwareUnavailable,

    #[fail(display = "'{}' is not possible in state {}", op, state)]
    InvalidState {
        op: &'static str,
        state: EditStateName,
    },

    #[fail(display = "operation cancelled")]
    Cancelled,

    #[fail(display = "tetra maker failed: {}", _0)]
    Maker(String),

    #[fail(display = "simulation error: {}", _0)]
    Simulation(String),

    #[fail(display = "unknown model '{}'", _0)]
    UnknownModel(String),
}

impl From<io::Error> for Error {
    fn from(src: io::Error) -> Self {
        Error::Io(src)
    }
}

impl From<std::io::Error> for Error {
    fn from(src: std::io::Error) -> Self {
        Error::Io(io::Error::Io(src))
    }
}

/// Human readable name of an edit state, used in [`Error::InvalidState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditStateName(pub &'static str);

impl fmt::Display for EditStateName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

//! Reading and writing models, tetrahedral meshes and core dumps.
//!
//! Supported formats:
//!
//! - Wavefront OBJ (`.obj`): the graphics mesh with normals, texture
//!   coordinates and one section per `usemtl`.
//! - Tetra sidecar (`.tet`): the tetrahedral mesh and link table of an OBJ
//!   model, stored next to it with the same file stem.
//! - Core dump (`.sbd`): little endian binary snapshot of a soft body's
//!   parameters and tetrahedral mesh.

use std::{
    fmt,
    fs::File,
    io::{self, BufWriter, Cursor, Write},
    path::{Path, PathBuf},
};

use failure::Fail;

pub mod dump;
pub mod obj;
pub mod tet;

#[cfg(test)]
mod tests;


/// Everything that can go wrong while reading or writing files.
#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "IO error: {}", _0)]
    Io(#[fail(cause)] io::Error),

    #[fail(display = "parse error in line {}: {}", line, msg)]
    Parse {
        line: usize,
        msg: String,
    },

    #[fail(display = "index {} in line {} is out of range ({} elements)", index, line, len)]
    IndexOutOfRange {
        line: usize,
        index: i64,
        len: usize,
    },

    #[fail(display = "unknown file format of {:?}", _0)]
    UnknownFormat(PathBuf),

    #[fail(display = "not a soft body core dump (bad magic number)")]
    BadMagic,

    #[fail(display = "unsupported core dump version {}", _0)]
    UnsupportedVersion(u32),

    #[fail(display = "invalid data: {}", _0)]
    InvalidData(String),
}

impl From<io::Error> for Error {
    fn from(src: io::Error) -> Self {
        Error::Io(src)
    }
}

impl Error {
    pub(crate) fn parse(line: usize, msg: impl Into<String>) -> Self {
        Error::Parse { line, msg: msg.into() }
    }
}

/// Types that serialize some data already stored within the type.
///
/// The main method is `write_to` which writes into a given `io::Write`
/// destination. The provided methods write to a file or to memory.
pub trait Writer {
    /// Writes all data into the given `Write` instance.
    fn write_to(&self, writer: impl Write) -> Result<(), Error>;

    /// Writes to the file given by the filename. Overwrites the file if it
    /// already exists.
    fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let mut w = BufWriter::new(File::create(path)?);
        self.write_to(&mut w)?;
        w.flush()?;
        Ok(())
    }

    /// Writes into a `Vec<u8>` which is returned on success.
    fn write_to_memory(&self) -> Result<Vec<u8>, Error> {
        let mut w = Cursor::new(Vec::new());
        self.write_to(&mut w)?;
        Ok(w.into_inner())
    }
}

/// Represents one of the supported file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Obj,
    Tet,
    CoreDump,
}

impl FileFormat {
    /// Tries to guess the file format from the file extension.
    ///
    /// Returns `None` if:
    /// - the path/file has no extension in its name, or
    /// - the extension is no valid UTF8, or
    /// - the file extension is not known.
    pub fn from_extension(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| {
                match ext.to_ascii_lowercase().as_str() {
                    "obj" => Some(FileFormat::Obj),
                    "tet" => Some(FileFormat::Tet),
                    "sbd" => Some(FileFormat::CoreDump),
                    _ => None,
                }
            })
    }

    /// Like `from_extension`, but returns an error for unknown extensions.
    pub fn of_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::from_extension(&path).ok_or_else(|| Error::UnknownFormat(path.as_ref().to_owned()))
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Obj => "obj",
            FileFormat::Tet => "tet",
            FileFormat::CoreDump => "sbd",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FileFormat::Obj => "OBJ",
            FileFormat::Tet => "TET",
            FileFormat::CoreDump => "core dump",
        }.fmt(f)
    }
}

/// Path of the `.tet` sidecar belonging to the OBJ file `obj`.
pub fn sidecar_path(obj: impl AsRef<Path>) -> PathBuf {
    obj.as_ref().with_extension(FileFormat::Tet.extension())
}

/// Splits off the next whitespace separated token and parses it.
pub(crate) fn parse_next<'a, T: std::str::FromStr>(
    tokens: &mut impl Iterator<Item = &'a str>,
    line: usize,
    what: &str,
) -> Result<T, Error> {
    let token = tokens.next().ok_or_else(|| Error::parse(line, format!("expected {}", what)))?;
    token.parse().map_err(|_| Error::parse(line, format!("invalid {} '{}'", what, token)))
}

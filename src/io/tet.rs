//! The `.tet` sidecar storing the tetrahedral mesh of a model.
//!
//! Line based text format:
//!
//! ```text
//! # comment
//! v x y z              tetrahedron corner
//! t i0 i1 i2 i3        tetrahedron (0-based corner indices)
//! l tetra bx by bz     link of the next graphics vertex
//! ```
//!
//! Link lines are optional.

use std::{
    fs::File,
    io::{BufRead, BufReader, Write},
    path::Path,
};

use cgmath::{Point3, Vector3};

use crate::tetra::{TetraLink, TetraMesh};
use super::{parse_next, Error, Writer};


pub fn read_file(path: impl AsRef<Path>) -> Result<TetraMesh, Error> {
    read(BufReader::new(File::open(path)?))
}

/// Reads a tetrahedral mesh. If the file contains link lines, they are
/// stored as the mesh's link table.
pub fn read(reader: impl BufRead) -> Result<TetraMesh, Error> {
    let mut positions = Vec::new();
    let mut indices = Vec::new();
    let mut links = Vec::new();

    // Link hosts can only be checked once all tetrahedra are known.
    let mut link_lines = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let line = line?;
        let mut tokens = line.split_whitespace();

        match tokens.next() {
            Some("v") => {
                let x = parse_next(&mut tokens, line_no, "x coordinate")?;
                let y = parse_next(&mut tokens, line_no, "y coordinate")?;
                let z = parse_next(&mut tokens, line_no, "z coordinate")?;
                positions.push(Point3::new(x, y, z));
            }
            Some("t") => {
                for _ in 0..4 {
                    let idx: u32 = parse_next(&mut tokens, line_no, "corner index")?;
                    if idx as usize >= positions.len() {
                        return Err(Error::IndexOutOfRange {
                            line: line_no,
                            index: idx.into(),
                            len: positions.len(),
                        });
                    }
                    indices.push(idx);
                }
            }
            Some("l") => {
                let tetra: u32 = parse_next(&mut tokens, line_no, "tetrahedron index")?;
                let x = parse_next(&mut tokens, line_no, "barycentric x")?;
                let y = parse_next(&mut tokens, line_no, "barycentric y")?;
                let z = parse_next(&mut tokens, line_no, "barycentric z")?;
                links.push(TetraLink::new(tetra, Vector3::new(x, y, z)));
                link_lines.push(line_no);
            }
            Some(s) if s.starts_with('#') => {}
            None => {}
            Some(other) => {
                return Err(Error::parse(line_no, format!("unexpected keyword '{}'", other)));
            }
        }
    }

    let num_tetrahedra = indices.len() / 4;
    for (link, &line) in links.iter().zip(&link_lines) {
        if link.tetra as usize >= num_tetrahedra && num_tetrahedra > 0 {
            return Err(Error::IndexOutOfRange {
                line,
                index: link.tetra.into(),
                len: num_tetrahedra,
            });
        }
    }

    let mut mesh = TetraMesh::new(positions, indices)
        .map_err(|e| Error::InvalidData(e.to_string()))?;
    mesh.set_links(links);
    Ok(mesh)
}

/// Writes the corners, tetrahedra and links of a tetrahedral mesh.
/// Deletions are not stored; deleted tetrahedra are written like all others.
#[derive(Debug, Clone, Copy)]
pub struct TetWriter<'a> {
    mesh: &'a TetraMesh,
}

impl<'a> TetWriter<'a> {
    pub fn new(mesh: &'a TetraMesh) -> Self {
        Self { mesh }
    }
}

impl Writer for TetWriter<'_> {
    fn write_to(&self, mut w: impl Write) -> Result<(), Error> {
        let mesh = self.mesh;
        writeln!(
            w,
            "# {} vertices, {} tetrahedra, {} links",
            mesh.num_vertices(),
            mesh.num_tetrahedra(),
            mesh.links().len(),
        )?;

        for p in mesh.positions() {
            writeln!(w, "v {} {} {}", p.x, p.y, p.z)?;
        }
        for t in mesh.indices().chunks_exact(4) {
            writeln!(w, "t {} {} {} {}", t[0], t[1], t[2], t[3])?;
        }
        for l in mesh.links() {
            writeln!(w, "l {} {} {} {}", l.tetra, l.bary.x, l.bary.y, l.bary.z)?;
        }

        Ok(())
    }
}

//! Wavefront OBJ.
//!
//! Only the geometry subset is supported: `v`, `vt`, `vn`, `f` and `usemtl`.
//! Faces with more than three corners are triangulated as fans. Material
//! libraries, object/group names and smoothing groups are ignored.

use std::{
    fs::File,
    io::{BufRead, BufReader, Write},
    path::Path,
};

use cgmath::{
    prelude::*,
    Point3, Vector3,
};
use tracing::debug;

use crate::{
    tetra::{Material, Section},
    vertex::{GraphicsVertex, VertexPool},
};
use super::{parse_next, Error, Writer};


/// The graphics mesh stored in an OBJ file.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjMesh {
    pub vertices: Vec<GraphicsVertex>,
    pub sections: Vec<Section>,
    pub materials: Vec<Material>,
}

impl ObjMesh {
    pub fn num_triangles(&self) -> usize {
        self.sections.iter().map(|s| s.indices.len() / 3).sum()
    }
}

pub fn read_file(path: impl AsRef<Path>) -> Result<ObjMesh, Error> {
    read(BufReader::new(File::open(path)?))
}

/// Reads an OBJ file, welding all face corners into an indexed vertex
/// buffer. Vertices without a normal get the normalized sum of the normals
/// of their adjacent faces.
pub fn read(reader: impl BufRead) -> Result<ObjMesh, Error> {
    let mut positions: Vec<Point3<f32>> = Vec::new();
    let mut texels: Vec<[f32; 2]> = Vec::new();
    let mut normals: Vec<Vector3<f32>> = Vec::new();

    let mut pool = VertexPool::new();
    let mut materials: Vec<Material> = Vec::new();
    let mut sections: Vec<Section> = Vec::new();

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
            Some("vt") => {
                let u = parse_next(&mut tokens, line_no, "u coordinate")?;
                let v = tokens.next()
                    .map(|t| t.parse().map_err(|_| Error::parse(line_no, format!("invalid v coordinate '{}'", t))))
                    .transpose()?
                    .unwrap_or(0.0);
                texels.push([u, v]);
            }
            Some("vn") => {
                let x = parse_next(&mut tokens, line_no, "normal x")?;
                let y = parse_next(&mut tokens, line_no, "normal y")?;
                let z = parse_next(&mut tokens, line_no, "normal z")?;
                normals.push(Vector3::new(x, y, z));
            }
            Some("usemtl") => {
                let name = tokens.next().unwrap_or("default");
                let material = match materials.iter().position(|m| m.name == name) {
                    Some(idx) => idx,
                    None => {
                        materials.push(Material { name: name.into(), ..Material::default() });
                        materials.len() - 1
                    }
                };

                match sections.last_mut() {
                    Some(s) if s.indices.is_empty() => s.material = material,
                    _ => sections.push(Section { material, indices: vec![] }),
                }
            }
            Some("f") => {
                let mut corners = Vec::with_capacity(4);
                for token in tokens {
                    let v = parse_corner(token, line_no, &positions, &texels, &normals)?;
                    corners.push(v);
                }
                if corners.len() < 3 {
                    return Err(Error::parse(line_no, "face with less than three corners"));
                }

                if sections.is_empty() {
                    if materials.is_empty() {
                        materials.push(Material::default());
                    }
                    sections.push(Section { material: 0, indices: vec![] });
                }
                let section = sections.last_mut().map(|s| &mut s.indices);
                if let Some(indices) = section {
                    let first = pool.get_index(corners[0]);
                    for pair in corners[1..].windows(2) {
                        indices.push(first);
                        indices.push(pool.get_index(pair[0]));
                        indices.push(pool.get_index(pair[1]));
                    }
                }
            }
            // Comments, empty lines and everything we do not care about
            _ => {}
        }
    }

    sections.retain(|s| !s.indices.is_empty());
    if materials.is_empty() {
        materials.push(Material::default());
    }

    let mut vertices = pool.into_vec();
    fill_missing_normals(&mut vertices, &sections);

    debug!(
        "read OBJ: {} vertices ({} positions in file), {} sections",
        vertices.len(),
        positions.len(),
        sections.len(),
    );
    Ok(ObjMesh { vertices, sections, materials })
}

/// Parses one face corner (`v`, `v/t`, `v//n` or `v/t/n`).
fn parse_corner(
    token: &str,
    line: usize,
    positions: &[Point3<f32>],
    texels: &[[f32; 2]],
    normals: &[Vector3<f32>],
) -> Result<GraphicsVertex, Error> {
    let mut parts = token.split('/');

    let pos = match parts.next() {
        Some(s) if !s.is_empty() => positions[resolve(s, line, positions.len())?],
        _ => return Err(Error::parse(line, format!("invalid face corner '{}'", token))),
    };
    let texel = match parts.next() {
        Some(s) if !s.is_empty() => texels[resolve(s, line, texels.len())?],
        _ => [0.0; 2],
    };
    let normal = match parts.next() {
        Some(s) if !s.is_empty() => normals[resolve(s, line, normals.len())?],
        _ => Vector3::new(0.0, 0.0, 0.0),
    };

    Ok(GraphicsVertex::new(pos, normal, texel))
}

/// Converts a 1-based (or negative, relative) OBJ index into a 0-based one.
fn resolve(s: &str, line: usize, len: usize) -> Result<usize, Error> {
    let index: i64 = s.parse()
        .map_err(|_| Error::parse(line, format!("invalid index '{}'", s)))?;

    let resolved = if index < 0 { len as i64 + index } else { index - 1 };
    if index == 0 || resolved < 0 || resolved >= len as i64 {
        return Err(Error::IndexOutOfRange { line, index, len });
    }

    Ok(resolved as usize)
}

fn fill_missing_normals(vertices: &mut [GraphicsVertex], sections: &[Section]) {
    let missing = vertices.iter().map(|v| v.normal.magnitude2() == 0.0).collect::<Vec<_>>();
    if !missing.iter().any(|&m| m) {
        return;
    }

    for tri in sections.iter().flat_map(|s| s.indices.chunks_exact(3)) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let n = (vertices[b].pos - vertices[a].pos).cross(vertices[c].pos - vertices[a].pos);
        if n.magnitude2() == 0.0 {
            continue;
        }

        let n = n.normalize();
        for &i in &[a, b, c] {
            if missing[i] {
                vertices[i].normal += n;
            }
        }
    }

    for (v, &m) in vertices.iter_mut().zip(&missing) {
        if m && v.normal.magnitude2() > 0.0 {
            v.normal = v.normal.normalize();
        }
    }
}


// ===========================================================================
// ===== Writer
// ===========================================================================

/// Writes a graphics mesh as OBJ. Every vertex gets a `v`, `vt` and `vn`
/// line; faces reference all three.
#[derive(Debug, Clone)]
pub struct ObjWriter<'a> {
    vertices: &'a [GraphicsVertex],
    sections: &'a [Section],
    materials: &'a [Material],
    name: Option<&'a str>,
}

impl<'a> ObjWriter<'a> {
    pub fn new(
        vertices: &'a [GraphicsVertex],
        sections: &'a [Section],
        materials: &'a [Material],
    ) -> Self {
        Self { vertices, sections, materials, name: None }
    }

    pub fn from_mesh(mesh: &'a ObjMesh) -> Self {
        Self::new(&mesh.vertices, &mesh.sections, &mesh.materials)
    }

    /// Adds an `o` line with the given object name.
    pub fn with_name(self, name: &'a str) -> Self {
        Self { name: Some(name), ..self }
    }
}

impl Writer for ObjWriter<'_> {
    fn write_to(&self, mut w: impl Write) -> Result<(), Error> {
        writeln!(w, "# {} vertices, {} sections", self.vertices.len(), self.sections.len())?;
        if let Some(name) = self.name {
            writeln!(w, "o {}", name)?;
        }

        for v in self.vertices {
            writeln!(w, "v {} {} {}", v.pos.x, v.pos.y, v.pos.z)?;
        }
        for v in self.vertices {
            writeln!(w, "vt {} {}", v.texel[0], v.texel[1])?;
        }
        for v in self.vertices {
            writeln!(w, "vn {} {} {}", v.normal.x, v.normal.y, v.normal.z)?;
        }

        for section in self.sections {
            let material = self.materials.get(section.material).map_or("default", |m| m.name.as_str());
            writeln!(w, "usemtl {}", material)?;
            for tri in section.indices.chunks_exact(3) {
                let [a, b, c] = [tri[0] + 1, tri[1] + 1, tri[2] + 1];
                writeln!(w, "f {0}/{0}/{0} {1}/{1}/{1} {2}/{2}/{2}", a, b, c)?;
            }
        }

        Ok(())
    }
}

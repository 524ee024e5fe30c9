//! Binary core dump of a soft body (`.sbd`).
//!
//! All values are little endian:
//!
//! | Field            | Encoding                                             |
//! |------------------|------------------------------------------------------|
//! | magic            | `b"SBDY"`                                            |
//! | version          | `u32`, currently 1                                   |
//! | name             | `u32` length + UTF-8 bytes                           |
//! | desc             | 7 × `f32`, `u32` iterations, `u8` flag bits          |
//! | positions        | `u32` count + count × 3 × `f32`                      |
//! | indices          | `u32` count + count × `u32`                          |
//! | deletion mask    | `u8` present flag (+ `u32` count + count × `u8`)     |
//! | links            | `u32` count + count × (`u32` tetra, 3 × `f32`)       |

use std::{
    fs::File,
    io::{BufReader, Read, Write},
    path::Path,
};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use cgmath::{Point3, Vector3};

use crate::{
    physics::{SoftBodyDesc, SoftBodyFlags},
    tetra::{TetraLink, TetraMesh},
};
use super::{Error, Writer};


pub const MAGIC: &[u8; 4] = b"SBDY";
pub const VERSION: u32 = 1;

/// Upper bound for element counts, protects against absurd allocations when
/// reading corrupt files.
const MAX_COUNT: u32 = 1 << 28;

/// Everything stored in a core dump.
#[derive(Debug, Clone)]
pub struct CoreDump {
    pub name: String,
    pub desc: SoftBodyDesc,
    pub mesh: TetraMesh,
}

pub fn read_file(path: impl AsRef<Path>) -> Result<CoreDump, Error> {
    read(BufReader::new(File::open(path)?))
}

pub fn read(mut r: impl Read) -> Result<CoreDump, Error> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(Error::BadMagic);
    }

    let version = r.read_u32::<LittleEndian>()?;
    if version != VERSION {
        return Err(Error::UnsupportedVersion(version));
    }

    let name_len = read_count(&mut r)?;
    let mut name = vec![0; name_len];
    r.read_exact(&mut name)?;
    let name = String::from_utf8(name)
        .map_err(|_| Error::InvalidData("model name is not valid UTF-8".into()))?;

    let desc = read_desc(&mut r)?;

    let num_positions = read_count(&mut r)?;
    let mut positions = Vec::with_capacity(num_positions);
    for _ in 0..num_positions {
        let [x, y, z] = read_f32x3(&mut r)?;
        positions.push(Point3::new(x, y, z));
    }

    let num_indices = read_count(&mut r)?;
    let mut indices = vec![0; num_indices];
    r.read_u32_into::<LittleEndian>(&mut indices)?;

    let mask = match r.read_u8()? {
        0 => None,
        _ => {
            let len = read_count(&mut r)?;
            let mut bytes = vec![0; len];
            r.read_exact(&mut bytes)?;
            Some(bytes.into_iter().map(|b| b != 0).collect::<Vec<_>>())
        }
    };

    let num_links = read_count(&mut r)?;
    let mut links = Vec::with_capacity(num_links);
    for _ in 0..num_links {
        let tetra = r.read_u32::<LittleEndian>()?;
        let [x, y, z] = read_f32x3(&mut r)?;
        links.push(TetraLink::new(tetra, Vector3::new(x, y, z)));
    }

    let mut mesh = TetraMesh::new(positions, indices)
        .map_err(|e| Error::InvalidData(e.to_string()))?;
    if let Some(mask) = mask {
        if mask.len() != mesh.num_tetrahedra() {
            return Err(Error::InvalidData(format!(
                "deletion mask has {} entries, but there are {} tetrahedra",
                mask.len(),
                mesh.num_tetrahedra(),
            )));
        }
        mesh.set_deletion_mask(Some(mask));
    }
    mesh.set_links(links);

    Ok(CoreDump { name, desc, mesh })
}

fn read_count(r: &mut impl Read) -> Result<usize, Error> {
    let count = r.read_u32::<LittleEndian>()?;
    if count > MAX_COUNT {
        return Err(Error::InvalidData(format!("element count {} too large", count)));
    }
    Ok(count as usize)
}

fn read_f32x3(r: &mut impl Read) -> Result<[f32; 3], Error> {
    Ok([
        r.read_f32::<LittleEndian>()?,
        r.read_f32::<LittleEndian>()?,
        r.read_f32::<LittleEndian>()?,
    ])
}

fn read_desc(r: &mut impl Read) -> Result<SoftBodyDesc, Error> {
    let mut floats = [0.0; 7];
    r.read_f32_into::<LittleEndian>(&mut floats)?;
    let solver_iterations = r.read_u32::<LittleEndian>()?;
    let bits = r.read_u8()?;
    let flag = |bit: u8| bits & (1 << bit) != 0;

    Ok(SoftBodyDesc {
        particle_radius: floats[0],
        volume_stiffness: floats[1],
        stretching_stiffness: floats[2],
        damping_coefficient: floats[3],
        friction: floats[4],
        collision_response_coefficient: floats[5],
        attachment_response_coefficient: floats[6],
        solver_iterations,
        flags: SoftBodyFlags {
            gravity: flag(0),
            volume_conservation: flag(1),
            damping: flag(2),
            self_collision: flag(3),
            hardware: flag(4),
            visualization: flag(5),
        },
    })
}

fn flag_bits(flags: &SoftBodyFlags) -> u8 {
    let all = [
        flags.gravity,
        flags.volume_conservation,
        flags.damping,
        flags.self_collision,
        flags.hardware,
        flags.visualization,
    ];

    let mut bits = 0;
    for (bit, &set) in all.iter().enumerate() {
        if set {
            bits |= 1 << bit;
        }
    }
    bits
}


// ===========================================================================
// ===== Writer
// ===========================================================================

/// Writes a core dump of a named soft body.
#[derive(Debug, Clone, Copy)]
pub struct DumpWriter<'a> {
    name: &'a str,
    desc: &'a SoftBodyDesc,
    mesh: &'a TetraMesh,
}

impl<'a> DumpWriter<'a> {
    pub fn new(name: &'a str, desc: &'a SoftBodyDesc, mesh: &'a TetraMesh) -> Self {
        Self { name, desc, mesh }
    }
}

impl Writer for DumpWriter<'_> {
    fn write_to(&self, mut w: impl Write) -> Result<(), Error> {
        let mesh = self.mesh;
        let desc = self.desc;

        w.write_all(MAGIC)?;
        w.write_u32::<LittleEndian>(VERSION)?;

        w.write_u32::<LittleEndian>(self.name.len() as u32)?;
        w.write_all(self.name.as_bytes())?;

        for &v in &[
            desc.particle_radius,
            desc.volume_stiffness,
            desc.stretching_stiffness,
            desc.damping_coefficient,
            desc.friction,
            desc.collision_response_coefficient,
            desc.attachment_response_coefficient,
        ] {
            w.write_f32::<LittleEndian>(v)?;
        }
        w.write_u32::<LittleEndian>(desc.solver_iterations)?;
        w.write_u8(flag_bits(&desc.flags))?;

        w.write_u32::<LittleEndian>(mesh.num_vertices() as u32)?;
        for p in mesh.positions() {
            w.write_f32::<LittleEndian>(p.x)?;
            w.write_f32::<LittleEndian>(p.y)?;
            w.write_f32::<LittleEndian>(p.z)?;
        }

        w.write_u32::<LittleEndian>(mesh.indices().len() as u32)?;
        for &i in mesh.indices() {
            w.write_u32::<LittleEndian>(i)?;
        }

        match mesh.deletion_mask() {
            None => w.write_u8(0)?,
            Some(mask) => {
                w.write_u8(1)?;
                w.write_u32::<LittleEndian>(mask.len() as u32)?;
                for &deleted in mask {
                    w.write_u8(deleted as u8)?;
                }
            }
        }

        w.write_u32::<LittleEndian>(mesh.links().len() as u32)?;
        for l in mesh.links() {
            w.write_u32::<LittleEndian>(l.tetra)?;
            w.write_f32::<LittleEndian>(l.bary.x)?;
            w.write_f32::<LittleEndian>(l.bary.y)?;
            w.write_f32::<LittleEndian>(l.bary.z)?;
        }

        Ok(())
    }
}

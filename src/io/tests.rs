use std::io::Cursor;

use approx::assert_relative_eq;
use cgmath::{prelude::*, Vector3};

use crate::{
    physics::SoftBodyDesc,
    test_utils::{kuhn_cube, p},
};
use super::{
    *,
    dump::DumpWriter,
    obj::ObjWriter,
    tet::TetWriter,
};


const QUAD_OBJ: &str = "\
# a unit quad and a triangle
mtllib quad.mtl
o quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
usemtl red
f 1/1/1 2/2/1 3/3/1 4/4/1
usemtl blue
s off
f -4//1 -3//1 -1//1
";

#[test]
fn obj_read_sections_and_fans() {
    let mesh = obj::read(QUAD_OBJ.as_bytes()).unwrap();

    assert_eq!(mesh.materials.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(), ["red", "blue"]);
    assert_eq!(mesh.sections.len(), 2);
    assert_eq!(mesh.sections[0].material, 0);
    assert_eq!(mesh.sections[0].indices, [0, 1, 2, 0, 2, 3]);
    assert_eq!(mesh.sections[1].material, 1);
    assert_eq!(mesh.num_triangles(), 3);

    // The untextured corner at the origin matches the first textured one
    assert_eq!(mesh.vertices.len(), 6);
    assert_eq!(mesh.sections[1].indices, [0, 4, 5]);
    assert_eq!(mesh.vertices[2].texel, [1.0, 1.0]);
    assert_eq!(mesh.vertices[4].pos, p(1.0, 0.0, 0.0));
    assert_eq!(mesh.vertices[4].texel, [0.0, 0.0]);
}

#[test]
fn obj_welds_repeated_corners() {
    let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 0 0 1\nf 1 2 3\nf 1 3 4\nf 1 4 2\n";
    let mesh = obj::read(src.as_bytes()).unwrap();

    assert_eq!(mesh.vertices.len(), 4);
    assert_eq!(mesh.materials.len(), 1);
    assert_eq!(mesh.sections[0].indices, [0, 1, 2, 0, 2, 3, 0, 3, 1]);

    // Missing normals are computed from the faces.
    for v in &mesh.vertices {
        assert_relative_eq!(v.normal.magnitude(), 1.0, epsilon = 1e-5);
    }
    assert_relative_eq!(mesh.vertices[2].normal, Vector3::new(1.0, 0.0, 1.0).normalize(), epsilon = 1e-5);
}

#[test]
fn obj_errors() {
    let cases = [
        ("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 4\n", 4),
        ("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0 1 2\n", 4),
        ("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -4 1 2\n", 4),
    ];
    for &(src, line_no) in &cases {
        match obj::read(src.as_bytes()) {
            Err(Error::IndexOutOfRange { line, .. }) => assert_eq!(line, line_no),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    match obj::read("v 0 zero 0\n".as_bytes()) {
        Err(Error::Parse { line: 1, .. }) => {}
        other => panic!("unexpected result: {:?}", other),
    }
    match obj::read("v 0 0 0\nv 1 0 0\n\nf 1 2\n".as_bytes()) {
        Err(Error::Parse { line: 4, .. }) => {}
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn obj_write_read() {
    let mesh = obj::read(QUAD_OBJ.as_bytes()).unwrap();
    let data = ObjWriter::from_mesh(&mesh).with_name("quad").write_to_memory().unwrap();

    let text = String::from_utf8(data.clone()).unwrap();
    assert!(text.contains("o quad\n"));
    assert!(text.contains("usemtl blue\n"));

    let reread = obj::read(Cursor::new(data)).unwrap();
    assert_eq!(reread, mesh);
}

#[test]
fn tet_write_read() {
    let mut mesh = kuhn_cube();
    mesh.build_links(&[p(0.5, 0.5, 0.5), p(0.1, 0.2, 0.3), p(2.0, 0.0, 0.0)]);

    let data = TetWriter::new(&mesh).write_to_memory().unwrap();
    let reread = tet::read(Cursor::new(data)).unwrap();

    assert_eq!(reread.positions(), mesh.positions());
    assert_eq!(reread.indices(), mesh.indices());
    assert_eq!(reread.links(), mesh.links());
}

#[test]
fn tet_without_links() {
    let src = "# corner\nv 0 0 0\nv 1 0 0\nv 0 1 0\nv 0 0 1\n\nt 0 1 2 3\n";
    let mesh = tet::read(src.as_bytes()).unwrap();
    assert_eq!(mesh.num_tetrahedra(), 1);
    assert!(mesh.links().is_empty());
}

#[test]
fn tet_errors() {
    match tet::read("v 0 0 0\nt 0 0 0 1\n".as_bytes()) {
        Err(Error::IndexOutOfRange { line: 2, index: 1, len: 1 }) => {}
        other => panic!("unexpected result: {:?}", other),
    }
    match tet::read("v 0 0 0\nt 0 0 0 0\nl 3 0 0 0\n".as_bytes()) {
        Err(Error::IndexOutOfRange { line: 3, .. }) => {}
        other => panic!("unexpected result: {:?}", other),
    }
    match tet::read("v 0 0 0\nx 1\n".as_bytes()) {
        Err(Error::Parse { line: 2, .. }) => {}
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn core_dump_write_read() {
    let mut mesh = kuhn_cube();
    mesh.build_links(&[p(0.5, 0.5, 0.5), p(0.9, 0.1, 0.2)]);
    mesh.set_deleted(4, true);

    let mut desc = SoftBodyDesc::default();
    desc.friction = 0.25;
    desc.solver_iterations = 11;
    desc.flags.self_collision = true;
    desc.flags.gravity = false;

    let data = DumpWriter::new("jelly", &desc, &mesh).write_to_memory().unwrap();
    assert_eq!(&data[..4], b"SBDY");

    let dump = dump::read(Cursor::new(data)).unwrap();
    assert_eq!(dump.name, "jelly");
    assert_eq!(dump.desc, desc);
    assert_eq!(dump.mesh.positions(), mesh.positions());
    assert_eq!(dump.mesh.indices(), mesh.indices());
    assert_eq!(dump.mesh.deletion_mask(), mesh.deletion_mask());
    assert_eq!(dump.mesh.links(), mesh.links());
}

#[test]
fn core_dump_rejects_bad_headers() {
    match dump::read(Cursor::new(b"PLY\0\x01\0\0\0".to_vec())) {
        Err(Error::BadMagic) => {}
        other => panic!("unexpected result: {:?}", other),
    }
    match dump::read(Cursor::new(b"SBDY\x07\0\0\0".to_vec())) {
        Err(Error::UnsupportedVersion(7)) => {}
        other => panic!("unexpected result: {:?}", other),
    }
    match dump::read(Cursor::new(b"SBDY\x01\0\0".to_vec())) {
        Err(Error::Io(_)) => {}
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn file_format_from_extension() {
    assert_eq!(FileFormat::from_extension("foo/bar.obj"), Some(FileFormat::Obj));
    assert_eq!(FileFormat::from_extension("bar.TET"), Some(FileFormat::Tet));
    assert_eq!(FileFormat::from_extension("bar.sbd"), Some(FileFormat::CoreDump));
    assert_eq!(FileFormat::from_extension("bar.ply"), None);
    assert_eq!(FileFormat::from_extension("bar"), None);
    match FileFormat::of_path("x.stl") {
        Err(e @ Error::UnknownFormat(_)) => {
            assert_eq!(e.to_string(), "unknown file format of \"x.stl\"");
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(sidecar_path("models/jelly.obj"), std::path::Path::new("models/jelly.tet"));
}

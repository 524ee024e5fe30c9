use std::cmp::Ordering;

use cgmath::{Point3, Vector3};

use super::*;


fn gv(pos: [f32; 3], normal: [f32; 3], texel: [f32; 2]) -> GraphicsVertex {
    GraphicsVertex::new(pos.into(), normal.into(), texel)
}

fn pv(x: f32, y: f32, z: f32) -> PosVertex {
    PosVertex::new(Point3::new(x, y, z))
}

#[test]
fn same_vertex_twice() {
    let mut pool = VertexPool::new();
    let v = gv([1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [0.5, 0.5]);

    let a = pool.get_index(v);
    let b = pool.get_index(v);
    assert_eq!(a, 0);
    assert_eq!(a, b);
    assert_eq!(pool.len(), 1);
}

#[test]
fn indices_follow_insertion_order() {
    let mut pool = VertexPool::new();
    assert_eq!(pool.get_index(pv(5.0, 0.0, 0.0)), 0);
    assert_eq!(pool.get_index(pv(-5.0, 0.0, 0.0)), 1);
    assert_eq!(pool.get_index(pv(0.0, 0.0, 0.0)), 2);
    assert_eq!(pool.get_index(pv(-5.0, 0.0, 0.0)), 1);

    assert_eq!(pool.buffer(), &[pv(5.0, 0.0, 0.0), pv(-5.0, 0.0, 0.0), pv(0.0, 0.0, 0.0)]);
}

#[test]
fn weld_within_tolerance() {
    let mut pool = VertexPool::new();
    let a = pool.get_index(gv([1.0, 1.0, 1.0], [0.0, 0.0, 1.0], [0.25, 0.75]));
    let b = pool.get_index(gv([1.000_003, 1.0, 0.999_998], [0.01, 0.0, 1.0], [0.2504, 0.75]));
    assert_eq!(a, b);

    // The first submitted vertex is the one kept.
    assert_eq!(pool.buffer()[0].pos, Point3::new(1.0, 1.0, 1.0));
}

#[test]
fn distinct_positions() {
    let mut pool = VertexPool::new();
    let a = pool.get_index(pv(0.0, 0.0, 0.0));
    let b = pool.get_index(pv(0.0, 0.0, 1e-4));
    assert_ne!(a, b);
}

#[test]
fn distinct_normals_split_vertex() {
    let mut pool = VertexPool::new();
    let a = pool.get_index(gv([0.0; 3], [0.0, 0.0, 1.0], [0.0; 2]));
    let b = pool.get_index(gv([0.0; 3], [0.0, 1.0, 0.0], [0.0; 2]));
    let c = pool.get_index(gv([0.0; 3], [0.0, 0.03, 1.0], [0.0; 2]));
    assert_ne!(a, b);
    assert_eq!(a, c);
    assert_eq!(pool.len(), 2);
}

#[test]
fn distinct_texels_split_vertex() {
    let mut pool = VertexPool::new();
    let a = pool.get_index(gv([0.0; 3], [0.0, 0.0, 1.0], [0.0, 0.0]));
    let b = pool.get_index(gv([0.0; 3], [0.0, 0.0, 1.0], [0.0, 0.01]));
    assert_ne!(a, b);
}

#[test]
fn tetra_tag_never_welded() {
    let mut pool = VertexPool::new();
    let v = TetraVertex {
        pos: Point3::new(1.0, 0.0, 0.0),
        normal: Vector3::new(0.0, 1.0, 0.0),
        tetra: 3,
    };
    let a = pool.get_index(v);
    let b = pool.get_index(TetraVertex { tetra: 4, .. v });
    let c = pool.get_index(v);
    assert_ne!(a, b);
    assert_eq!(a, c);
}

#[test]
fn deform_bones_compared() {
    let base = DeformVertex {
        pos: Point3::new(0.0, 0.0, 0.0),
        normal: Vector3::new(0.0, 1.0, 0.0),
        texel: [0.0; 2],
        bones: [0, 1, 0, 0],
        weights: [0.5, 0.5, 0.0, 0.0],
    };

    let mut pool = VertexPool::new();
    let a = pool.get_index(base);
    let b = pool.get_index(DeformVertex { bones: [0, 2, 0, 0], .. base });
    let c = pool.get_index(DeformVertex { weights: [0.5004, 0.4996, 0.0, 0.0], .. base });
    let d = pool.get_index(DeformVertex { weights: [0.7, 0.3, 0.0, 0.0], .. base });
    assert_ne!(a, b);
    assert_eq!(a, c);
    assert_ne!(a, d);
    assert_eq!(pool.len(), 3);
}

#[test]
fn weld_cmp_is_lexicographic_outside_tolerance() {
    assert_eq!(weld_cmp(&pv(0.0, 5.0, 0.0), &pv(1.0, 0.0, 0.0)), Ordering::Less);
    assert_eq!(weld_cmp(&pv(1.0, 0.0, 0.0), &pv(1.0, -1.0, 0.0)), Ordering::Greater);
    assert_eq!(weld_cmp(&pv(1.0, 0.0, 0.0), &pv(1.0, 0.0, 0.000_001)), Ordering::Equal);
}

#[test]
fn welding_depends_on_insertion_order() {
    // v1 ≈ v2 and v2 ≈ v3, but v1 and v3 are too far apart.
    let v1 = pv(0.0, 0.0, 0.0);
    let v2 = pv(0.6e-5, 0.0, 0.0);
    let v3 = pv(1.2e-5, 0.0, 0.0);
    assert_eq!(weld_cmp(&v1, &v2), Ordering::Equal);
    assert_eq!(weld_cmp(&v2, &v3), Ordering::Equal);
    assert_eq!(weld_cmp(&v1, &v3), Ordering::Less);

    // v1, v3, v2: v2 is matched against v1 and welded into it.
    let mut pool = VertexPool::new();
    let indices = [v1, v3, v2].iter().map(|&v| pool.get_index(v)).collect::<Vec<_>>();
    assert_eq!(indices, [0, 1, 0]);
    assert_eq!(pool.len(), 2);

    // v1, v2, v3: v3 doesn't match v1, which is all the pool knows.
    let mut pool = VertexPool::new();
    let indices = [v1, v2, v3].iter().map(|&v| pool.get_index(v)).collect::<Vec<_>>();
    assert_eq!(indices, [0, 0, 1]);
    assert_eq!(pool.len(), 2);

    // v2 first: everything collapses into one vertex.
    let mut pool = VertexPool::new();
    let indices = [v2, v1, v3].iter().map(|&v| pool.get_index(v)).collect::<Vec<_>>();
    assert_eq!(indices, [0, 0, 0]);
    assert_eq!(pool.len(), 1);

    // Same sequence again gives the same result.
    let mut again = VertexPool::new();
    let repeat = [v2, v1, v3].iter().map(|&v| again.get_index(v)).collect::<Vec<_>>();
    assert_eq!(repeat, indices);
}

#[test]
fn clear_and_into_vec() {
    let mut pool = VertexPool::new();
    pool.get_index(pv(1.0, 2.0, 3.0));
    pool.get_index(pv(4.0, 5.0, 6.0));
    assert!(!pool.is_empty());

    pool.clear();
    assert!(pool.is_empty());
    assert_eq!(pool.get_index(pv(4.0, 5.0, 6.0)), 0);
    assert_eq!(pool.into_vec(), vec![pv(4.0, 5.0, 6.0)]);
}

use approx::assert_relative_eq;
use cgmath::{Matrix4, Vector3};

use crate::test_utils::p;
use super::*;


fn bone(name: &str, x: f32) -> Bone {
    Bone { name: name.into(), parent: None, bind: p(x, 0.0, 0.0) }
}

fn skeleton() -> Skeleton {
    Skeleton::new(vec![bone("a", 0.0), bone("b", 2.0), bone("c", 4.0)])
}

fn v(x: f32) -> GraphicsVertex {
    GraphicsVertex::new(p(x, 0.0, 0.0), Vector3::new(0.0, 0.0, 1.0), [0.0; 2])
}

/// Two triangles sharing the edge between x = 0 and x = 2.
fn mesh() -> SkinnedMesh {
    let soup = [v(0.0), v(2.0), v(0.5), v(2.0), v(0.0), v(4.0)];
    SkinnedMesh::from_triangles("worm", skeleton(), &soup)
}

/// Inverse squared distance weights of the vertex at x = 0.5.
fn weights_at_half() -> [f32; 3] {
    let raw = [1.0 / 0.25, 1.0 / 2.25, 1.0 / 12.25];
    let sum: f32 = raw.iter().sum();
    [raw[0] / sum, raw[1] / sum, raw[2] / sum]
}

#[test]
fn welds_soup() {
    let mesh = mesh();
    assert_eq!(mesh.vertices().len(), 4);
    assert_eq!(mesh.indices(), &[0, 1, 2, 1, 0, 3]);
}

#[test]
fn infers_weights() {
    let mesh = mesh();
    let verts = mesh.vertices();

    // Vertices sitting exactly on a bone belong to it alone
    assert_eq!(verts[0].bones[0], 0);
    assert_eq!(verts[0].weights, [1.0, 0.0, 0.0, 0.0]);
    assert_eq!(verts[1].bones[0], 1);
    assert_eq!(verts[3].bones[0], 2);

    let expected = weights_at_half();
    assert_eq!(&verts[2].bones[..3], &[0, 1, 2]);
    for k in 0..3 {
        assert_relative_eq!(verts[2].weights[k], expected[k], epsilon = 1e-6);
    }
    assert_eq!(verts[2].weights[3], 0.0);
    assert_relative_eq!(verts[2].weights.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
}

#[test]
fn only_four_nearest_bones() {
    let bones = (0..6).map(|i| bone(&i.to_string(), i as f32)).collect();
    let mesh = SkinnedMesh::from_triangles("many", Skeleton::new(bones), &[v(0.2), v(1.2), v(5.1)]);

    let first = mesh.vertices()[0];
    assert_eq!(first.bones, [0, 1, 2, 3]);
    assert!(first.weights.iter().all(|&w| w > 0.0));
    assert_relative_eq!(first.weights.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
}

#[test]
fn skins_bind_pose() {
    let mesh = mesh();
    let inst = SkinnedMeshInstance::new(&mesh);

    let mut out = vec![];
    inst.skin(&mesh, &mut out);
    assert_eq!(out.len(), 4);
    for (skinned, original) in out.iter().zip(mesh.vertices()) {
        assert_relative_eq!(skinned.pos, original.pos, epsilon = 1e-6);
    }
}

#[test]
fn actor_and_joint_events() {
    let mesh = mesh();
    let mut inst = SkinnedMeshInstance::new(&mesh);
    let lift = Matrix4::from_translation(Vector3::new(2.0, 1.0, 0.0));

    assert!(inst.notify(&mesh, &SceneEvent::Actor { name: "b".into(), pose: lift }));
    assert!(!inst.notify(&mesh, &SceneEvent::Actor { name: "zz".into(), pose: lift }));
    assert!(!inst.notify(&mesh, &SceneEvent::Other("material".into())));

    let w = weights_at_half();
    let mut out = vec![];
    inst.skin(&mesh, &mut out);
    assert_relative_eq!(out[0].pos, p(0.0, 0.0, 0.0), epsilon = 1e-6);
    assert_relative_eq!(out[1].pos, p(2.0, 1.0, 0.0), epsilon = 1e-6);
    assert_relative_eq!(out[2].pos, p(0.5, w[1], 0.0), epsilon = 1e-5);
    assert_relative_eq!(out[3].pos, p(4.0, 0.0, 0.0), epsilon = 1e-6);
    assert_relative_eq!(out[2].normal, Vector3::new(0.0, 0.0, 1.0), epsilon = 1e-6);

    // Bone c now follows b
    let joint = SceneEvent::Joint { parent: "b".into(), child: "c".into() };
    assert!(inst.notify(&mesh, &joint));
    inst.skin(&mesh, &mut out);
    assert_relative_eq!(out[3].pos, p(4.0, 1.0, 0.0), epsilon = 1e-6);
    assert_relative_eq!(out[2].pos, p(0.5, w[1] + w[2], 0.0), epsilon = 1e-5);
}

#[test]
fn joint_cycle_terminates() {
    let mesh = mesh();
    let mut inst = SkinnedMeshInstance::new(&mesh);
    inst.notify(&mesh, &SceneEvent::Joint { parent: "a".into(), child: "b".into() });
    inst.notify(&mesh, &SceneEvent::Joint { parent: "b".into(), child: "a".into() });

    let transforms = inst.bone_transforms(&mesh);
    assert_eq!(transforms.len(), 3);
    assert_eq!(transforms[0], Matrix4::from_scale(1.0));
}

#[test]
fn empty_skeleton_keeps_bind_pose() {
    let mesh = SkinnedMesh::from_triangles("static", Skeleton::default(), &[v(0.0), v(1.0), v(2.0)]);
    assert!(mesh.vertices().iter().all(|v| v.weights == [0.0; 4]));

    let mut out = vec![];
    SkinnedMeshInstance::new(&mesh).skin(&mesh, &mut out);
    assert_eq!(out[1].pos, p(1.0, 0.0, 0.0));
}

#[test]
fn system_instances() {
    let mut system = SoftMeshSystem::new();
    system.add_mesh(mesh());

    match system.create_instance("nope") {
        Err(Error::UnknownModel(name)) => assert_eq!(name, "nope"),
        other => panic!("unexpected result: {:?}", other),
    }

    let first = system.create_instance("worm").unwrap();
    let second = system.create_instance("worm").unwrap();
    assert_eq!((first, second), (0, 1));

    let lift = Matrix4::from_translation(Vector3::new(0.0, 3.0, 0.0));
    assert_eq!(system.notify(&SceneEvent::Actor { name: "a".into(), pose: lift }), 2);

    let mut out = vec![];
    system.skin(second, &mut out).unwrap();
    assert_relative_eq!(out[0].pos, p(0.0, 3.0, 0.0), epsilon = 1e-6);
    assert!(system.skin(7, &mut out).is_err());

    system.reset(false);
    assert_eq!(system.num_instances(), 0);
    assert_eq!(system.num_meshes(), 1);

    system.reset(true);
    assert_eq!(system.num_meshes(), 0);
}

/// The same mesh name with a single bone at the origin.
fn shrunk_mesh() -> SkinnedMesh {
    let soup = [v(0.0), v(2.0), v(4.0)];
    SkinnedMesh::from_triangles("worm", Skeleton::new(vec![bone("a", 0.0)]), &soup)
}

#[test]
fn replaced_mesh_resets_instances() {
    let mut system = SoftMeshSystem::new();
    system.add_mesh(mesh());
    let idx = system.create_instance("worm").unwrap();
    let lift = Matrix4::from_translation(Vector3::new(0.0, 3.0, 0.0));
    assert_eq!(system.notify(&SceneEvent::Actor { name: "c".into(), pose: lift }), 1);

    system.add_mesh(shrunk_mesh());
    assert_eq!(system.num_instances(), 1);

    let mut out = vec![];
    system.skin(idx, &mut out).unwrap();
    assert_eq!(out.len(), 3);
    for (o, x) in out.iter().zip(&[0.0, 2.0, 4.0]) {
        assert_relative_eq!(o.pos, p(*x, 0.0, 0.0), epsilon = 1e-6);
    }
}

#[test]
fn transforms_ignore_bones_missing_from_skeleton() {
    let mut inst = SkinnedMeshInstance::new(&mesh());
    let lift = Matrix4::from_translation(Vector3::new(0.0, 3.0, 0.0));
    assert!(inst.notify(&mesh(), &SceneEvent::Actor { name: "c".into(), pose: lift }));

    let transforms = inst.bone_transforms(&shrunk_mesh());
    assert_eq!(transforms.len(), 3);
    assert!(transforms.iter().all(|m| *m == Matrix4::identity()));
}

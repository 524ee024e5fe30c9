use approx::assert_relative_eq;
use cgmath::{Matrix4, SquareMatrix, Vector3};

use crate::{
    Error,
    test_utils::{kuhn_cube, p},
};
use super::*;


#[test]
fn desc_defaults() {
    let desc = SoftBodyDesc::default();
    assert_relative_eq!(desc.particle_radius, 0.1);
    assert_eq!(desc.solver_iterations, 5);
    assert!(desc.flags.gravity);
    assert!(desc.flags.volume_conservation);
    assert!(!desc.flags.hardware);
}

#[test]
fn buffer_is_double_buffered() {
    let mut buffer = SoftBodyBuffer::new(3, 4);
    assert!(buffer.positions().is_empty());

    buffer.write(&[p(1.0, 0.0, 0.0), p(2.0, 0.0, 0.0)], &[0, 1, 1, 0]);
    assert!(buffer.positions().is_empty());

    buffer.swap();
    assert_eq!(buffer.positions(), &[p(1.0, 0.0, 0.0), p(2.0, 0.0, 0.0)]);
    assert_eq!(buffer.indices(), &[0, 1, 1, 0]);

    // The next write does not touch the published side
    buffer.write(&[p(5.0, 0.0, 0.0)], &[]);
    assert_eq!(buffer.num_written_positions(), 2);
    buffer.swap();
    assert_eq!(buffer.positions(), &[p(5.0, 0.0, 0.0)]);
    assert!(buffer.indices().is_empty());
}

#[test]
fn buffer_truncates_at_capacity() {
    let mut buffer = SoftBodyBuffer::new(2, 4);
    buffer.write(&[p(1.0, 0.0, 0.0), p(2.0, 0.0, 0.0), p(3.0, 0.0, 0.0)], &[0, 1, 2, 3, 4, 5]);
    buffer.swap();

    assert_eq!(buffer.num_written_positions(), 2);
    assert_eq!(buffer.num_written_indices(), 4);
    assert_eq!(buffer.max_positions(), 2);
    assert_eq!(buffer.indices(), &[0, 1, 2, 3]);
}

#[test]
fn kinematic_scene_applies_pose() {
    let mesh = kuhn_cube();
    let mut scene = KinematicScene::new();
    let mut desc = SoftBodyDesc::default();
    desc.flags.gravity = false;

    let pose = Matrix4::from_translation(Vector3::new(0.0, 3.0, 0.0));
    let handle = scene.create_soft_body(&desc, &mesh, pose).unwrap();

    let mut buffer = SoftBodyBuffer::for_mesh(&mesh);
    scene.simulate(0.1);
    scene.fetch_results(handle, &mut buffer).unwrap();
    buffer.swap();

    assert_eq!(buffer.indices(), mesh.indices());
    for (live, rest) in buffer.positions().iter().zip(mesh.positions()) {
        assert_relative_eq!(live.y, rest.y + 3.0);
    }

    scene.set_pose(handle, Matrix4::identity()).unwrap();
    scene.fetch_results(handle, &mut buffer).unwrap();
    buffer.swap();
    assert_eq!(buffer.positions(), mesh.positions());
}

#[test]
fn kinematic_scene_gravity_and_ground() {
    let mesh = kuhn_cube();
    let mut scene = KinematicScene::new();
    let pose = Matrix4::from_translation(Vector3::new(0.0, 1.0, 0.0));
    let handle = scene.create_soft_body(&SoftBodyDesc::default(), &mesh, pose).unwrap();
    let mut buffer = SoftBodyBuffer::for_mesh(&mesh);

    scene.simulate(0.1);
    scene.fetch_results(handle, &mut buffer).unwrap();
    buffer.swap();
    let lowest = buffer.positions().iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
    assert!(lowest < 1.0 && lowest > 0.0);

    for _ in 0..100 {
        scene.simulate(0.1);
    }
    scene.fetch_results(handle, &mut buffer).unwrap();
    buffer.swap();
    let lowest = buffer.positions().iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
    assert_relative_eq!(lowest, 0.0, epsilon = 1e-5);
    assert_relative_eq!(scene.time(), 10.1, epsilon = 1e-3);
}

#[test]
fn kinematic_scene_rejects_hardware() {
    let mut scene = KinematicScene::new();
    let mut desc = SoftBodyDesc::default();
    desc.flags.hardware = true;

    assert!(!scene.hardware_available());
    match scene.create_soft_body(&desc, &kuhn_cube(), Matrix4::identity()) {
        Err(Error::HardwareUnavailable) => {}
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn kinematic_scene_release_and_reset() {
    let mut scene = KinematicScene::new();
    let a = scene.create_soft_body(&SoftBodyDesc::default(), &kuhn_cube(), Matrix4::identity()).unwrap();
    let b = scene.create_soft_body(&SoftBodyDesc::default(), &kuhn_cube(), Matrix4::identity()).unwrap();
    assert_ne!(a, b);
    assert_eq!(scene.num_bodies(), 2);

    scene.release_soft_body(a);
    assert_eq!(scene.num_bodies(), 1);
    assert!(scene.update_soft_body(a, &SoftBodyDesc::default()).is_err());
    assert!(scene.update_soft_body(b, &SoftBodyDesc::default()).is_ok());

    scene.reset();
    assert_eq!(scene.num_bodies(), 0);
    let mut buffer = SoftBodyBuffer::default();
    assert!(scene.fetch_results(b, &mut buffer).is_err());
}

use cgmath::{
    prelude::*,
    Matrix4, Point3, Vector3,
};
use fxhash::FxHashMap;
use tracing::debug;

use crate::{
    Error,
    tetra::TetraMesh,
};
use super::{SimHandle, SoftBodyBuffer, SoftBodyDesc, SoftBodyScene};


/// Downwards acceleration in m/s².
const GRAVITY: f32 = 9.81;

#[derive(Debug, Clone)]
struct Body {
    rest: Vec<Point3<f32>>,
    indices: Vec<u32>,
    desc: SoftBodyDesc,
    pose: Matrix4<f32>,

    /// Vertical displacement from the posed rest shape (<= 0 while falling).
    drop: f32,
    velocity: f32,
}

impl Body {
    fn posed(&self) -> impl Iterator<Item = Point3<f32>> + '_ {
        let pose = self.pose;
        self.rest.iter().map(move |&p| pose.transform_point(p))
    }

    fn current(&self) -> Vec<Point3<f32>> {
        let offset = Vector3::new(0.0, self.drop, 0.0);
        self.posed().map(|p| p + offset).collect()
    }

    fn step(&mut self, dt: f32) {
        if !self.desc.flags.gravity {
            return;
        }

        self.velocity -= GRAVITY * dt;
        if self.desc.flags.damping {
            self.velocity *= (1.0 - self.desc.damping_coefficient * dt).max(0.0);
        }
        self.drop += self.velocity * dt;

        // Ground plane at y = 0
        let lowest = self.posed().map(|p| p.y).fold(std::f32::INFINITY, f32::min);
        if lowest.is_finite() && lowest + self.drop < 0.0 {
            self.drop = -lowest;
            self.velocity = 0.0;
        }
    }
}

/// A scene moving soft bodies rigidly.
///
/// Each body keeps its rest shape. The published positions are the rest
/// positions transformed by the body's pose, optionally falling under gravity
/// until the lowest vertex touches the ground plane `y = 0`. Hardware
/// simulation is never available.
#[derive(Debug, Clone, Default)]
pub struct KinematicScene {
    bodies: FxHashMap<SimHandle, Body>,
    next_id: u32,
    time: f32,
}

impl KinematicScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_bodies(&self) -> usize {
        self.bodies.len()
    }

    /// Simulated time in seconds.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Places a body with a new rigid transform.
    pub fn set_pose(&mut self, handle: SimHandle, pose: Matrix4<f32>) -> Result<(), Error> {
        self.body_mut(handle)?.pose = pose;
        Ok(())
    }

    fn body_mut(&mut self, handle: SimHandle) -> Result<&mut Body, Error> {
        self.bodies
            .get_mut(&handle)
            .ok_or_else(|| Error::Simulation(format!("{} does not exist", handle)))
    }
}

impl SoftBodyScene for KinematicScene {
    fn hardware_available(&self) -> bool {
        false
    }

    fn create_soft_body(
        &mut self,
        desc: &SoftBodyDesc,
        mesh: &TetraMesh,
        pose: Matrix4<f32>,
    ) -> Result<SimHandle, Error> {
        if desc.flags.hardware {
            return Err(Error::HardwareUnavailable);
        }
        if mesh.is_empty() {
            return Err(Error::EmptyMesh);
        }

        let handle = SimHandle(self.next_id);
        self.next_id += 1;
        self.bodies.insert(handle, Body {
            rest: mesh.positions().to_vec(),
            indices: mesh.indices().to_vec(),
            desc: *desc,
            pose,
            drop: 0.0,
            velocity: 0.0,
        });

        debug!("created {} with {} tetrahedra", handle, mesh.num_tetrahedra());
        Ok(handle)
    }

    fn release_soft_body(&mut self, handle: SimHandle) {
        if self.bodies.remove(&handle).is_some() {
            debug!("released {}", handle);
        }
    }

    fn update_soft_body(&mut self, handle: SimHandle, desc: &SoftBodyDesc) -> Result<(), Error> {
        let body = self.body_mut(handle)?;
        let hardware = body.desc.flags.hardware;
        body.desc = *desc;
        body.desc.flags.hardware = hardware;
        Ok(())
    }

    fn simulate(&mut self, dt: f32) {
        if !(dt > 0.0) {
            return;
        }

        for body in self.bodies.values_mut() {
            body.step(dt);
        }
        self.time += dt;
    }

    fn fetch_results(&mut self, handle: SimHandle, buffer: &mut SoftBodyBuffer) -> Result<(), Error> {
        let body = self.body_mut(handle)?;
        buffer.write(&body.current(), &body.indices);
        Ok(())
    }

    fn reset(&mut self) {
        self.bodies.clear();
        self.time = 0.0;
    }
}

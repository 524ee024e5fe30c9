//! The command driven owner of all models and soft bodies.
//!
//! [`SoftBodySystem::process_command`] is the single entry point used by
//! menus, consoles and scripts alike. The system never talks to the outside
//! world directly: files, the physics engine and the tetra maker are
//! collaborators handed in through a [`SoftContext`].

use std::path::{Path, PathBuf};

use ahash::AHashMap;
use boolinator::Boolinator;
use cgmath::{prelude::*, Matrix4};
use stable_vec::StableVec;
use tracing::{debug, info, warn};

use crate::{
    Error,
    files::SoftFileInterface,
    io::{
        self, FileFormat, Writer,
        dump::{self, DumpWriter},
        obj::{self, ObjWriter},
        tet::{self, TetWriter},
    },
    physics::{SimHandle, SoftBodyBuffer, SoftBodyDesc, SoftBodyScene},
    skinned::SoftMeshSystem,
    tetra::{EditState, TetraMaker, TetraModel},
    vertex::GraphicsVertex,
};

mod command;


pub use self::command::Command;


/// The collaborators a command may need.
pub struct SoftContext<'a> {
    pub scene: &'a mut dyn SoftBodyScene,
    pub files: &'a mut dyn SoftFileInterface,
    pub maker: &'a mut dyn TetraMaker,
}

/// One simulated instance of a [`TetraModel`].
#[derive(Debug, Clone)]
pub struct SoftBody {
    model: String,
    handle: SimHandle,
    pose: Matrix4<f32>,
    buffer: SoftBodyBuffer,
}

impl SoftBody {
    /// Name of the model this body simulates.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn handle(&self) -> SimHandle {
        self.handle
    }

    /// The pose the body was created with.
    pub fn pose(&self) -> Matrix4<f32> {
        self.pose
    }

    /// The deformed tetrahedral mesh published by the last step.
    pub fn buffer(&self) -> &SoftBodyBuffer {
        &self.buffer
    }
}

/// Owns all models, soft bodies and skinned meshes of a scene plus the
/// simulation parameters applied to the soft bodies.
#[derive(Debug)]
pub struct SoftBodySystem {
    models: AHashMap<String, TetraModel>,
    bodies: StableVec<SoftBody>,
    edit: Option<String>,
    desc: SoftBodyDesc,
    staged_hardware: bool,
    hardware_ok: bool,
    meshes: SoftMeshSystem,
}

impl SoftBodySystem {
    /// Creates an empty system bound to `scene`. Whether hardware
    /// simulation is possible is determined once, here.
    pub fn new(scene: &dyn SoftBodyScene) -> Self {
        let hardware_ok = scene.hardware_available();
        debug!("soft body system created (hardware available: {})", hardware_ok);

        Self {
            models: AHashMap::new(),
            bodies: StableVec::new(),
            edit: None,
            desc: SoftBodyDesc::default(),
            staged_hardware: false,
            hardware_ok,
            meshes: SoftMeshSystem::new(),
        }
    }

    // ----- Accessors -------------------------------------------------------

    pub fn model(&self, name: &str) -> Option<&TetraModel> {
        self.models.get(name)
    }

    pub fn num_models(&self) -> usize {
        self.models.len()
    }

    /// The model currently being edited.
    pub fn edit_target(&self) -> Option<&TetraModel> {
        self.edit.as_ref().and_then(|name| self.models.get(name))
    }

    /// Makes the named model the edit target.
    pub fn set_edit_target(&mut self, name: &str) -> Result<(), Error> {
        if !self.models.contains_key(name) {
            return Err(Error::UnknownModel(name.to_owned()));
        }
        self.edit = Some(name.to_owned());
        Ok(())
    }

    /// Adds a model (replacing one with the same name) and makes it the edit
    /// target.
    pub fn add_model(&mut self, model: TetraModel) {
        let name = model.name().to_owned();
        self.models.insert(name.clone(), model);
        self.edit = Some(name);
    }

    /// The parameters applied to live soft bodies.
    pub fn desc(&self) -> &SoftBodyDesc {
        &self.desc
    }

    /// The hardware flag the next `CreateSimulation` will use.
    pub fn staged_hardware(&self) -> bool {
        self.staged_hardware
    }

    pub fn hardware_ok(&self) -> bool {
        self.hardware_ok
    }

    pub fn num_soft_bodies(&self) -> usize {
        self.bodies.num_elements()
    }

    pub fn soft_bodies(&self) -> impl Iterator<Item = &SoftBody> {
        self.bodies.values()
    }

    pub fn skinned_meshes(&self) -> &SoftMeshSystem {
        &self.meshes
    }

    pub fn skinned_meshes_mut(&mut self) -> &mut SoftMeshSystem {
        &mut self.meshes
    }

    /// Computes the deformed graphics mesh of the `n`-th soft body (in
    /// creation order).
    pub fn skin_soft_body(&self, n: usize, out: &mut Vec<GraphicsVertex>) -> Result<(), Error> {
        let body = self.bodies.values()
            .nth(n)
            .ok_or_else(|| Error::Simulation(format!("there is no soft body #{}", n)))?;
        let model = self.models.get(&body.model)
            .ok_or_else(|| Error::UnknownModel(body.model.clone()))?;

        model.skin(body.buffer.positions(), body.buffer.indices(), out)
    }

    // ----- Dispatch --------------------------------------------------------

    /// Executes a command. Returns `true` on success. Failures never panic,
    /// they are reported via [`SoftFileInterface::message_report`].
    pub fn process_command(&mut self, ctx: &mut SoftContext<'_>, cmd: Command) -> bool {
        debug!("command: {:?}", cmd);

        let name = cmd.name();
        match self.execute(ctx, cmd) {
            Ok(()) => true,
            Err(e) => {
                let msg = format!("{} failed: {}", name, e);
                warn!("{}", msg);
                ctx.files.message_report(&msg);
                false
            }
        }
    }

    fn execute(&mut self, ctx: &mut SoftContext<'_>, cmd: Command) -> Result<(), Error> {
        if cmd.edits_mesh() {
            let simulating = self.edit_target().map_or(false, |m| m.state() == EditState::Simulating);
            if simulating {
                self.release_simulation(ctx.scene)?;
            }
        }

        match cmd {
            Command::ResetScene { discard_models } => {
                self.reset_scene(ctx.scene, discard_models);
            }
            Command::ImportObj(path) => {
                let path = ask_load(ctx.files, path, FileFormat::Obj, "Wavefront OBJ")?;
                self.import_obj(ctx, &path)?;
            }
            Command::ExportObj(path) => {
                self.edit_model()?;
                let path = ask_save(ctx.files, path, FileFormat::Obj, "Wavefront OBJ")?;
                self.export_obj(ctx.files, &path)?;
            }
            Command::SaveCoreDump(path) => {
                self.edit_model()?;
                let path = ask_save(ctx.files, path, FileFormat::CoreDump, "soft body core dump")?;
                self.save_core_dump(ctx.files, &path)?;
            }
            Command::LoadCoreDump(path) => {
                let path = ask_load(ctx.files, path, FileFormat::CoreDump, "soft body core dump")?;
                self.load_core_dump(ctx, &path)?;
            }

            Command::CopySurface { detail } => {
                self.edit_model_mut()?.copy_surface(ctx.maker, detail)?;
            }
            Command::CopyIsoSurface { single_pass } => {
                self.edit_model_mut()?.copy_iso_surface(ctx.maker, single_pass)?;
            }
            Command::SetSubdivisionLevel(level) => {
                ctx.maker.set_subdivision_level(level);
            }
            Command::CreateTetrahedra => {
                let stats = self.edit_model_mut()?.create_tetrahedra(ctx.maker)?;
                ctx.files.message_report(&format!(
                    "linked {} vertices inside and {} to the nearest tetrahedron",
                    stats.inside,
                    stats.nearest,
                ));
            }
            Command::RebuildLinks => {
                self.edit_model_mut()?.build_links()?;
            }
            Command::Pick { origin, dir } => {
                self.edit_model_mut()?.pick(origin, dir)?;
            }
            Command::DeletePicked => {
                self.edit_model_mut()?.delete_picked()?;
            }
            Command::RestorePicked => {
                self.edit_model_mut()?.restore_picked()?;
            }
            Command::ClearDeletions => {
                self.edit_model_mut()?.clear_deletions()?;
            }
            Command::RemoveDeleted => {
                let removed = self.edit_model_mut()?.remove_deleted()?;
                ctx.files.message_report(&format!("removed {} tetrahedra", removed));
            }

            Command::CreateSoftBody { pose } => {
                self.create_soft_body(ctx.scene, pose)?;
            }
            Command::CreateSimulation => {
                self.create_simulation(ctx.scene)?;
            }
            Command::ReleaseSimulation => {
                self.release_simulation(ctx.scene)?;
            }
            Command::Simulate { dt } => {
                self.simulate(ctx.scene, dt)?;
            }

            Command::SetParticleRadius(v) => self.update_desc(ctx.scene, |d| d.particle_radius = v)?,
            Command::SetVolumeStiffness(v) => self.update_desc(ctx.scene, |d| d.volume_stiffness = v)?,
            Command::SetStretchingStiffness(v) => {
                self.update_desc(ctx.scene, |d| d.stretching_stiffness = v)?
            }
            Command::SetDampingCoefficient(v) => {
                self.update_desc(ctx.scene, |d| d.damping_coefficient = v)?
            }
            Command::SetFriction(v) => self.update_desc(ctx.scene, |d| d.friction = v)?,
            Command::SetSolverIterations(v) => self.update_desc(ctx.scene, |d| d.solver_iterations = v)?,
            Command::SetGravity(v) => self.update_desc(ctx.scene, |d| d.flags.gravity = v)?,
            Command::SetVolumeConservation(v) => {
                self.update_desc(ctx.scene, |d| d.flags.volume_conservation = v)?
            }
            Command::SetDamping(v) => self.update_desc(ctx.scene, |d| d.flags.damping = v)?,
            Command::SetSelfCollision(v) => self.update_desc(ctx.scene, |d| d.flags.self_collision = v)?,
            Command::SetHardware(on) => {
                (!on || self.hardware_ok).as_result((), Error::HardwareUnavailable)?;
                self.staged_hardware = on;
                ctx.files.message_report(&format!(
                    "{} simulation takes effect with the next simulation",
                    if on { "hardware" } else { "software" },
                ));
            }
        }

        Ok(())
    }

    fn edit_model(&self) -> Result<&TetraModel, Error> {
        self.edit_target().ok_or(Error::NoEditTarget)
    }

    fn edit_model_mut(&mut self) -> Result<&mut TetraModel, Error> {
        let models = &mut self.models;
        self.edit.as_ref()
            .and_then(move |name| models.get_mut(name))
            .ok_or(Error::NoEditTarget)
    }

    // ----- Scene -----------------------------------------------------------

    fn reset_scene(&mut self, scene: &mut dyn SoftBodyScene, discard_models: bool) {
        scene.reset();
        self.bodies.clear();
        self.meshes.reset(discard_models);

        if discard_models {
            self.models.clear();
            self.edit = None;
        } else {
            for model in self.models.values_mut() {
                model.end_simulation();
            }
        }

        debug!("scene reset (models discarded: {})", discard_models);
    }

    // ----- Files -----------------------------------------------------------

    fn import_obj(&mut self, ctx: &mut SoftContext<'_>, path: &Path) -> Result<(), Error> {
        self.reset_scene(ctx.scene, false);

        let mesh = obj::read_file(path)?;
        let sidecar = io::sidecar_path(path);
        let tetra = sidecar.is_file()
            .as_some_from(|| tet::read_file(&sidecar))
            .transpose()?;

        let mut model = TetraModel::new(model_name(path), mesh.vertices, mesh.sections, mesh.materials);
        if let Some(tetra) = tetra {
            model.attach_tetra_mesh(tetra);
        }

        let msg = format!(
            "imported '{}': {} vertices, {} triangles, {} tetrahedra",
            path.display(),
            model.vertices().len(),
            model.num_triangles(),
            model.tetra().map_or(0, |t| t.num_tetrahedra()),
        );
        info!("{}", msg);
        ctx.files.message_report(&msg);

        self.add_model(model);
        Ok(())
    }

    fn export_obj(&self, files: &mut dyn SoftFileInterface, path: &Path) -> Result<(), Error> {
        let model = self.edit_model()?;
        ObjWriter::new(model.vertices(), model.sections(), model.materials())
            .with_name(model.name())
            .write_to_file(path)?;

        if let Some(tetra) = model.tetra() {
            TetWriter::new(tetra).write_to_file(io::sidecar_path(path))?;
        }

        files.message_report(&format!("saved '{}' to '{}'", model.name(), path.display()));
        Ok(())
    }

    fn save_core_dump(&self, files: &mut dyn SoftFileInterface, path: &Path) -> Result<(), Error> {
        let model = self.edit_model()?;
        let tetra = model.tetra().ok_or_else(|| Error::NoTetraMesh(model.name().to_owned()))?;

        let mut desc = self.desc;
        desc.flags.hardware = self.staged_hardware;
        DumpWriter::new(model.name(), &desc, tetra).write_to_file(path)?;

        files.message_report(&format!("saved core dump of '{}' to '{}'", model.name(), path.display()));
        Ok(())
    }

    /// Loads a core dump. The tetrahedral mesh is attached to the model of
    /// the same name if it exists; otherwise a new model is created whose
    /// graphics mesh is the surface of the tetrahedral mesh.
    fn load_core_dump(&mut self, ctx: &mut SoftContext<'_>, path: &Path) -> Result<(), Error> {
        let dump = dump::read_file(path)?;
        self.reset_scene(ctx.scene, false);

        self.desc = dump.desc;
        if self.desc.flags.hardware && !self.hardware_ok {
            warn!("core dump requests hardware simulation, which is not available");
            self.desc.flags.hardware = false;
        }
        self.staged_hardware = self.desc.flags.hardware;

        let mut model = match self.models.remove(&dump.name) {
            Some(model) => model,
            None => TetraModel::from_tri_mesh(dump.name.clone(), &dump.mesh.surface()),
        };
        model.attach_linked_tetra_mesh(dump.mesh);
        self.add_model(model);

        ctx.files.message_report(&format!("loaded core dump of '{}'", dump.name));
        Ok(())
    }

    // ----- Simulation ------------------------------------------------------

    fn create_soft_body(&mut self, scene: &mut dyn SoftBodyScene, pose: Matrix4<f32>) -> Result<(), Error> {
        let desc = self.desc;
        let model = self.edit_model_mut()?;
        let was_simulating = model.state() == EditState::Simulating;
        let name = model.name().to_owned();

        let mesh = if was_simulating {
            model.tetra().ok_or_else(|| Error::NoTetraMesh(name.clone()))?
        } else {
            model.begin_simulation()?
        };
        let mut buffer = SoftBodyBuffer::for_mesh(mesh);

        let created = scene.create_soft_body(&desc, mesh, pose)
            .and_then(|handle| match scene.fetch_results(handle, &mut buffer) {
                Ok(()) => Ok(handle),
                Err(e) => {
                    scene.release_soft_body(handle);
                    Err(e)
                }
            });
        let handle = match created {
            Ok(handle) => handle,
            Err(e) => {
                if !was_simulating {
                    model.end_simulation();
                }
                return Err(e);
            }
        };

        buffer.swap();
        info!("created {} of model '{}'", handle, name);
        self.bodies.push(SoftBody { model: name, handle, pose, buffer });
        Ok(())
    }

    fn create_simulation(&mut self, scene: &mut dyn SoftBodyScene) -> Result<(), Error> {
        let name = self.edit_model()?.name().to_owned();
        let mut poses = self.bodies.values()
            .filter(|b| b.model == name)
            .map(|b| b.pose)
            .collect::<Vec<_>>();
        if poses.is_empty() {
            poses.push(Matrix4::identity());
        }

        self.release_simulation(scene)?;
        self.desc.flags.hardware = self.staged_hardware;
        for pose in poses {
            if let Err(e) = self.create_soft_body(scene, pose) {
                self.release_simulation(scene)?;
                return Err(e);
            }
        }

        Ok(())
    }

    fn release_simulation(&mut self, scene: &mut dyn SoftBodyScene) -> Result<(), Error> {
        let model = self.edit_model_mut()?;
        model.end_simulation();
        let name = model.name().to_owned();

        let doomed = self.bodies.indices()
            .filter(|&i| self.bodies.get(i).map_or(false, |b| b.model == name))
            .collect::<Vec<_>>();
        for i in doomed {
            if let Some(body) = self.bodies.remove(i) {
                scene.release_soft_body(body.handle);
            }
        }

        Ok(())
    }

    fn simulate(&mut self, scene: &mut dyn SoftBodyScene, dt: f32) -> Result<(), Error> {
        scene.simulate(dt);
        for body in self.bodies.values_mut() {
            scene.fetch_results(body.handle, &mut body.buffer)?;
            body.buffer.swap();
        }
        Ok(())
    }

    fn update_desc(
        &mut self,
        scene: &mut dyn SoftBodyScene,
        change: impl FnOnce(&mut SoftBodyDesc),
    ) -> Result<(), Error> {
        change(&mut self.desc);
        for body in self.bodies.values() {
            scene.update_soft_body(body.handle, &self.desc)?;
        }
        Ok(())
    }
}

/// Models are identified by the file stem of the file they were imported
/// from.
fn model_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unnamed".into())
}

fn ask_load(
    files: &mut dyn SoftFileInterface,
    path: Option<PathBuf>,
    format: FileFormat,
    description: &str,
) -> Result<PathBuf, Error> {
    path.or_else(|| files.load_file_name(format.extension(), description))
        .ok_or(Error::Cancelled)
}

fn ask_save(
    files: &mut dyn SoftFileInterface,
    path: Option<PathBuf>,
    format: FileFormat,
    description: &str,
) -> Result<PathBuf, Error> {
    path.or_else(|| files.save_file_name(format.extension(), description))
        .ok_or(Error::Cancelled)
}

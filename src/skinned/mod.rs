//! Graphics meshes deformed by a hierarchy of rigid bodies.
//!
//! A [`SkinnedMesh`] is a welded, bone weighted vertex buffer bound to a
//! [`Skeleton`]. A [`SkinnedMeshInstance`] follows a simulated scene: it
//! learns about actor poses and joints through [`SceneEvent`]s and skins the
//! mesh with linear blend skinning.

use cgmath::{
    prelude::*,
    Matrix4, Point3, Vector3,
};
use ahash::AHashMap;
use num_traits::Zero;
use smallvec::SmallVec;
use tracing::debug;

use crate::{
    Error,
    vertex::{DeformVertex, GraphicsVertex, VertexPool},
};

#[cfg(test)]
mod tests;


/// Maximum number of bones influencing one vertex.
pub const MAX_INFLUENCES: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    pub parent: Option<usize>,

    /// Position of the bone in the bind pose.
    pub bind: Point3<f32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skeleton {
    pub bones: Vec<Bone>,
}

impl Skeleton {
    pub fn new(bones: Vec<Bone>) -> Self {
        Self { bones }
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn bone_index(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    /// Inverse of the bind transform of bone `b`, `None` if there is no
    /// such bone.
    fn bind_inverse(&self, b: usize) -> Option<Matrix4<f32>> {
        self.bones.get(b).map(|bone| Matrix4::from_translation(-bone.bind.to_vec()))
    }
}

/// A welded triangle mesh with per vertex bone weights.
#[derive(Debug, Clone)]
pub struct SkinnedMesh {
    name: String,
    skeleton: Skeleton,
    vertices: Vec<DeformVertex>,
    indices: Vec<u32>,
}

impl SkinnedMesh {
    /// Welds a triangle soup (three vertices per triangle, a trailing
    /// incomplete triangle is ignored) and infers the bone weights of every
    /// vertex: the up to [`MAX_INFLUENCES`] nearest bones, weighted by
    /// inverse squared distance and normalized to sum up to 1.
    ///
    /// With an empty skeleton, all weights are zero and skinning leaves the
    /// mesh in its bind pose.
    pub fn from_triangles(
        name: impl Into<String>,
        skeleton: Skeleton,
        soup: &[GraphicsVertex],
    ) -> Self {
        let mut pool = VertexPool::new();
        let mut indices = Vec::with_capacity(soup.len());
        for tri in soup.chunks_exact(3) {
            for &v in tri {
                indices.push(pool.get_index(DeformVertex::unweighted(v)));
            }
        }

        let mut vertices = pool.into_vec();
        for v in &mut vertices {
            let (bones, weights) = infer_weights(&skeleton, v.pos);
            v.bones = bones;
            v.weights = weights;
        }

        let name = name.into();
        debug!(
            "skinned mesh '{}': {} soup vertices welded to {}, {} bones",
            name,
            soup.len(),
            vertices.len(),
            skeleton.len(),
        );

        Self { name, skeleton, vertices, indices }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn vertices(&self) -> &[DeformVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }
}

fn infer_weights(skeleton: &Skeleton, pos: Point3<f32>) -> ([u16; 4], [f32; 4]) {
    // Nearest bones, sorted by squared distance
    let mut nearest: SmallVec<[(f32, usize); MAX_INFLUENCES + 1]> = SmallVec::new();
    for (i, bone) in skeleton.bones.iter().enumerate() {
        let d2 = bone.bind.distance2(pos);
        let at = nearest.iter().position(|&(d, _)| d2 < d).unwrap_or(nearest.len());
        if at < MAX_INFLUENCES {
            nearest.insert(at, (d2, i));
            nearest.truncate(MAX_INFLUENCES);
        }
    }

    let mut bones = [0; 4];
    let mut weights = [0.0; 4];
    if let Some(&(d2, i)) = nearest.first() {
        if d2 <= f32::EPSILON {
            bones[0] = i as u16;
            weights[0] = 1.0;
            return (bones, weights);
        }
    }

    for (k, &(d2, i)) in nearest.iter().enumerate() {
        bones[k] = i as u16;
        weights[k] = 1.0 / d2;
    }
    let sum: f32 = weights.iter().sum();
    if sum > 0.0 {
        for w in &mut weights {
            *w /= sum;
        }
    }

    (bones, weights)
}


// ===========================================================================
// ===== Instances
// ===========================================================================

/// Things happening in the simulated scene that skinned meshes care about.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    /// A rigid actor was created or moved. Actors are matched to bones by
    /// name.
    Actor {
        name: String,
        pose: Matrix4<f32>,
    },

    /// Two actors were connected by a joint. Makes `child` follow `parent`
    /// while it has no pose of its own.
    Joint {
        parent: String,
        child: String,
    },

    /// Anything else (materials, shapes, ...). Ignored.
    Other(String),
}

/// One posed copy of a [`SkinnedMesh`].
#[derive(Debug, Clone)]
pub struct SkinnedMeshInstance {
    mesh: String,
    parents: Vec<Option<usize>>,
    poses: Vec<Option<Matrix4<f32>>>,
}

impl SkinnedMeshInstance {
    /// Creates an instance in bind pose.
    pub fn new(mesh: &SkinnedMesh) -> Self {
        let bones = &mesh.skeleton.bones;
        Self {
            mesh: mesh.name.clone(),
            parents: bones.iter().map(|b| b.parent).collect(),
            poses: vec![None; bones.len()],
        }
    }

    /// Name of the skinned mesh this is an instance of.
    pub fn mesh_name(&self) -> &str {
        &self.mesh
    }

    /// Applies a scene event. Returns `true` if the event changed the
    /// instance.
    pub fn notify(&mut self, mesh: &SkinnedMesh, event: &SceneEvent) -> bool {
        let skeleton = &mesh.skeleton;
        match event {
            SceneEvent::Actor { name, pose } => {
                match skeleton.bone_index(name) {
                    Some(b) if b < self.poses.len() => {
                        self.poses[b] = Some(*pose);
                        true
                    }
                    _ => false,
                }
            }
            SceneEvent::Joint { parent, child } => {
                match (skeleton.bone_index(parent), skeleton.bone_index(child)) {
                    (Some(p), Some(c)) if p != c && c < self.parents.len() => {
                        self.parents[c] = Some(p);
                        true
                    }
                    _ => false,
                }
            }
            SceneEvent::Other(_) => false,
        }
    }

    /// The bone whose actor pose drives bone `b`: `b` itself if it is
    /// posed, otherwise the nearest posed ancestor.
    fn posed_ancestor(&self, b: usize) -> Option<usize> {
        let mut current = b;
        // Bounded walk, the joint graph may contain cycles.
        for _ in 0..self.poses.len() {
            if self.poses[current].is_some() {
                return Some(current);
            }
            match self.parents[current] {
                Some(p) if p < self.poses.len() => current = p,
                _ => return None,
            }
        }
        None
    }

    /// Per bone skinning matrices: `pose * bind_inverse` of the driving
    /// bone, identity for bones without a posed ancestor.
    pub fn bone_transforms(&self, mesh: &SkinnedMesh) -> Vec<Matrix4<f32>> {
        (0..self.poses.len())
            .map(|b| {
                self.posed_ancestor(b)
                    .and_then(|a| Some(self.poses[a]? * mesh.skeleton.bind_inverse(a)?))
                    .unwrap_or_else(Matrix4::identity)
            })
            .collect()
    }

    /// Linear blend skinning of all vertices of `mesh` into `out`.
    pub fn skin(&self, mesh: &SkinnedMesh, out: &mut Vec<GraphicsVertex>) {
        let transforms = self.bone_transforms(mesh);

        out.clear();
        out.extend(mesh.vertices.iter().map(|v| {
            let mut pos = Vector3::zero();
            let mut normal = Vector3::zero();
            let mut total = 0.0;
            for (&b, &w) in v.bones.iter().zip(&v.weights) {
                if w == 0.0 {
                    continue;
                }
                if let Some(m) = transforms.get(b as usize) {
                    pos += m.transform_point(v.pos).to_vec() * w;
                    normal += m.transform_vector(v.normal) * w;
                    total += w;
                }
            }

            if total == 0.0 {
                return v.graphics();
            }
            if normal.magnitude2() > 0.0 {
                normal = normal.normalize();
            }
            GraphicsVertex::new(Point3::from_vec(pos / total), normal, v.texel)
        }));
    }
}


// ===========================================================================
// ===== System
// ===========================================================================

/// Owns all skinned meshes (by name) and their instances in the current
/// scene.
#[derive(Debug, Clone, Default)]
pub struct SoftMeshSystem {
    meshes: AHashMap<String, SkinnedMesh>,
    instances: Vec<SkinnedMeshInstance>,
}

impl SoftMeshSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a mesh, replacing one with the same name. Instances of a
    /// replaced mesh are reset to the bind pose of the new skeleton.
    pub fn add_mesh(&mut self, mesh: SkinnedMesh) {
        for inst in self.instances.iter_mut().filter(|i| i.mesh == mesh.name) {
            *inst = SkinnedMeshInstance::new(&mesh);
        }
        self.meshes.insert(mesh.name.clone(), mesh);
    }

    pub fn mesh(&self, name: &str) -> Option<&SkinnedMesh> {
        self.meshes.get(name)
    }

    pub fn num_meshes(&self) -> usize {
        self.meshes.len()
    }

    pub fn num_instances(&self) -> usize {
        self.instances.len()
    }

    /// Creates an instance of the named mesh and returns its index.
    pub fn create_instance(&mut self, mesh: &str) -> Result<usize, Error> {
        let mesh = self.meshes.get(mesh).ok_or_else(|| Error::UnknownModel(mesh.to_owned()))?;
        self.instances.push(SkinnedMeshInstance::new(mesh));
        Ok(self.instances.len() - 1)
    }

    pub fn instance(&self, idx: usize) -> Option<&SkinnedMeshInstance> {
        self.instances.get(idx)
    }

    /// Forwards the event to every instance. Returns how many instances
    /// were affected.
    pub fn notify(&mut self, event: &SceneEvent) -> usize {
        let meshes = &self.meshes;
        self.instances.iter_mut()
            .filter_map(|inst| meshes.get(&inst.mesh).map(|m| inst.notify(m, event)))
            .filter(|&changed| changed)
            .count()
    }

    pub fn skin(&self, idx: usize, out: &mut Vec<GraphicsVertex>) -> Result<(), Error> {
        let inst = self.instances.get(idx)
            .ok_or_else(|| Error::UnknownModel(format!("skinned mesh instance #{}", idx)))?;
        let mesh = self.meshes.get(&inst.mesh)
            .ok_or_else(|| Error::UnknownModel(inst.mesh.clone()))?;
        inst.skin(mesh, out);
        Ok(())
    }

    /// Removes all instances. Meshes survive unless `discard_meshes` is set.
    pub fn reset(&mut self, discard_meshes: bool) {
        self.instances.clear();
        if discard_meshes {
            self.meshes.clear();
        }
    }
}

use std::fmt;

use cgmath::{
    prelude::*,
    Point3, Vector3,
};
use num_traits::Zero;
use tracing::{debug, info};

use crate::{
    Error,
    error::EditStateName,
    mesh::TriMesh,
    vertex::GraphicsVertex,
};
use super::{
    maker::TetraMaker,
    mesh::{LinkStats, Pick, TetraMesh},
};


/// The editing stage a [`TetraModel`] is in.
///
/// The normal progression is `SourceMesh → SurfaceMesh → TetraMesh →
/// Simulating`. Deletions can only be edited in `TetraMesh`; while
/// `Simulating`, the tetrahedral topology is frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    /// Only the imported graphics mesh exists.
    SourceMesh,

    /// A candidate boundary surface for tetrahedralization exists.
    SurfaceMesh,

    /// A tetrahedral mesh exists and is linked to the graphics mesh.
    TetraMesh,

    /// The tetrahedral mesh is bound to a live soft body.
    Simulating,
}

impl EditState {
    pub fn name(self) -> EditStateName {
        EditStateName(match self {
            EditState::SourceMesh => "source mesh",
            EditState::SurfaceMesh => "surface mesh",
            EditState::TetraMesh => "tetra mesh",
            EditState::Simulating => "simulating",
        })
    }
}

impl fmt::Display for EditState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.name().fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub diffuse: [f32; 3],
    pub texture: Option<String>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "default".into(),
            diffuse: [0.8, 0.8, 0.8],
            texture: None,
        }
    }
}

/// Triangles sharing one material. `indices` holds three vertex indices per
/// triangle.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub material: usize,
    pub indices: Vec<u32>,
}

/// States in which a new surface candidate may be created.
const SURFACE_EDITABLE: &[EditState] = &[
    EditState::SourceMesh,
    EditState::SurfaceMesh,
    EditState::TetraMesh,
];

/// A static graphics mesh plus, optionally, the tetrahedral mesh driving it.
#[derive(Debug, Clone)]
pub struct TetraModel {
    name: String,
    vertices: Vec<GraphicsVertex>,
    sections: Vec<Section>,
    materials: Vec<Material>,
    surface: Option<TriMesh>,
    tetra: Option<TetraMesh>,
    state: EditState,
    last_pick: Pick,
}

impl TetraModel {
    /// Creates a model in state [`EditState::SourceMesh`]. If `materials` is
    /// empty, a default material is added.
    pub fn new(
        name: impl Into<String>,
        vertices: Vec<GraphicsVertex>,
        sections: Vec<Section>,
        mut materials: Vec<Material>,
    ) -> Self {
        if materials.is_empty() {
            materials.push(Material::default());
        }

        Self {
            name: name.into(),
            vertices,
            sections,
            materials,
            surface: None,
            tetra: None,
            state: EditState::SourceMesh,
            last_pick: Pick::default(),
        }
    }

    /// Creates a single section model from a triangle mesh. Normals are
    /// averaged from the adjacent faces, texture coordinates are zero.
    pub fn from_tri_mesh(name: impl Into<String>, mesh: &TriMesh) -> Self {
        let mut vertices = mesh.positions.iter().map(|&p| GraphicsVertex::at(p)).collect::<Vec<_>>();
        let indices = mesh.triangles.iter().flat_map(|t| t.iter().copied()).collect::<Vec<_>>();
        accumulate_normals(&mut vertices, &indices);

        let sections = vec![Section { material: 0, indices }];
        Self::new(name, vertices, sections, vec![])
    }

    // ----- Accessors -------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertices(&self) -> &[GraphicsVertex] {
        &self.vertices
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    pub fn surface(&self) -> Option<&TriMesh> {
        self.surface.as_ref()
    }

    pub fn tetra(&self) -> Option<&TetraMesh> {
        self.tetra.as_ref()
    }

    /// Mutable access to the tetra mesh. `None` while simulating.
    pub fn tetra_mut(&mut self) -> Option<&mut TetraMesh> {
        match self.state {
            EditState::Simulating => None,
            _ => self.tetra.as_mut(),
        }
    }

    /// The result of the last [`pick`][TetraModel::pick].
    pub fn last_pick(&self) -> Pick {
        self.last_pick
    }

    pub fn num_triangles(&self) -> usize {
        self.sections.iter().map(|s| s.indices.len() / 3).sum()
    }

    /// The graphics mesh as a single triangle mesh (all sections merged).
    pub fn source_mesh(&self) -> TriMesh {
        let positions = self.vertices.iter().map(|v| v.pos).collect();
        let triangles = self.sections.iter()
            .flat_map(|s| s.indices.chunks_exact(3))
            .map(|t| [t[0], t[1], t[2]])
            .collect();

        TriMesh::new(positions, triangles)
    }

    fn tetra_or_err(&self) -> Result<&TetraMesh, Error> {
        self.tetra.as_ref().ok_or_else(|| Error::NoTetraMesh(self.name.clone()))
    }

    fn require_state(&self, op: &'static str, allowed: &[EditState]) -> Result<(), Error> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(Error::InvalidState { op, state: self.state.name() })
        }
    }

    // ----- Editing pipeline ------------------------------------------------

    /// Creates the surface candidate by simplifying the graphics mesh.
    /// Discards an existing tetrahedral mesh.
    pub fn copy_surface(&mut self, maker: &mut dyn TetraMaker, detail: f32) -> Result<(), Error> {
        self.require_state("copy surface", SURFACE_EDITABLE)?;

        let source = self.source_mesh();
        if source.is_empty() {
            return Err(Error::EmptyMesh);
        }

        let surface = maker.simplify_surface(detail, &source)?;
        debug!(
            "copied surface of '{}': {} triangles",
            self.name,
            surface.num_triangles(),
        );

        self.surface = Some(surface);
        self.tetra = None;
        self.last_pick = Pick::default();
        self.state = EditState::SurfaceMesh;
        Ok(())
    }

    /// Replaces the surface candidate (or, if there is none, the graphics
    /// mesh) by its iso surface. Discards an existing tetrahedral mesh.
    pub fn copy_iso_surface(&mut self, maker: &mut dyn TetraMaker, single_pass: bool) -> Result<(), Error> {
        self.require_state("copy iso surface", SURFACE_EDITABLE)?;

        let iso = match &self.surface {
            Some(surface) => maker.create_iso_surface(surface, single_pass)?,
            None => maker.create_iso_surface(&self.source_mesh(), single_pass)?,
        };

        self.surface = Some(iso);
        self.tetra = None;
        self.last_pick = Pick::default();
        self.state = EditState::SurfaceMesh;
        Ok(())
    }

    /// Tetrahedralizes the surface candidate and links the graphics mesh to
    /// the result.
    pub fn create_tetrahedra(&mut self, maker: &mut dyn TetraMaker) -> Result<LinkStats, Error> {
        self.require_state("create tetrahedra", &[EditState::SurfaceMesh, EditState::TetraMesh])?;

        let surface = self.surface.as_ref().ok_or_else(|| Error::NoSurfaceMesh(self.name.clone()))?;
        let mesh = maker.create_tetra_mesh(surface)?;
        if mesh.is_empty() {
            return Err(Error::EmptyMesh);
        }

        Ok(self.attach_tetra_mesh(mesh))
    }

    /// Sets the tetrahedral mesh (e.g. one loaded from a file), rebuilds the
    /// links and switches to [`EditState::TetraMesh`].
    pub fn attach_tetra_mesh(&mut self, mesh: TetraMesh) -> LinkStats {
        self.tetra = Some(mesh);
        self.last_pick = Pick::default();
        self.state = EditState::TetraMesh;

        let stats = self.relink();
        info!(
            "model '{}': {} tetrahedra linked to {} vertices",
            self.name,
            self.tetra.as_ref().map_or(0, |t| t.num_tetrahedra()),
            self.vertices.len(),
        );
        stats
    }

    /// Like [`attach_tetra_mesh`][Self::attach_tetra_mesh], but keeps the
    /// link table stored in `mesh` if it has one in-range link per graphics
    /// vertex. Links to deleted tetrahedra survive this way. Returns `None`
    /// if the stored links were kept.
    pub fn attach_linked_tetra_mesh(&mut self, mesh: TetraMesh) -> Option<LinkStats> {
        let num_tetrahedra = mesh.num_tetrahedra();
        let complete = !self.vertices.is_empty()
            && mesh.links().len() == self.vertices.len()
            && mesh.links().iter().all(|l| (l.tetra as usize) < num_tetrahedra);
        if !complete {
            return Some(self.attach_tetra_mesh(mesh));
        }

        self.tetra = Some(mesh);
        self.last_pick = Pick::default();
        self.state = EditState::TetraMesh;
        debug!("model '{}': kept {} stored links", self.name, self.vertices.len());
        None
    }

    /// Rebuilds the link table of the tetrahedral mesh.
    pub fn build_links(&mut self) -> Result<LinkStats, Error> {
        self.tetra_or_err()?;
        Ok(self.relink())
    }

    fn relink(&mut self) -> LinkStats {
        let positions = self.vertices.iter().map(|v| v.pos).collect::<Vec<_>>();
        match &mut self.tetra {
            Some(tetra) => tetra.build_links(&positions),
            None => LinkStats::default(),
        }
    }

    // ----- Interactive deletion --------------------------------------------

    /// Casts a pick ray against the tetrahedral mesh and remembers the
    /// result for [`delete_picked`][TetraModel::delete_picked] and
    /// [`restore_picked`][TetraModel::restore_picked].
    pub fn pick(&mut self, origin: Point3<f32>, dir: Vector3<f32>) -> Result<Pick, Error> {
        let pick = self.tetra_or_err()?.pick(origin, dir);
        self.last_pick = pick;
        Ok(pick)
    }

    /// Deletes the tetrahedron hit by the last pick. Returns its index, or
    /// `None` if the last pick did not hit a live tetrahedron.
    pub fn delete_picked(&mut self) -> Result<Option<u32>, Error> {
        self.require_state("delete tetrahedron", &[EditState::TetraMesh])?;
        let hit = self.last_pick.hit.take();
        self.set_picked(hit.map(|h| h.tetra), true)
    }

    /// Restores the deleted tetrahedron hit by the last pick.
    pub fn restore_picked(&mut self) -> Result<Option<u32>, Error> {
        self.require_state("restore tetrahedron", &[EditState::TetraMesh])?;
        let hit = self.last_pick.deleted_hit.take();
        self.set_picked(hit.map(|h| h.tetra), false)
    }

    fn set_picked(&mut self, t: Option<u32>, deleted: bool) -> Result<Option<u32>, Error> {
        let name = self.name.clone();
        let tetra = self.tetra.as_mut().ok_or(Error::NoTetraMesh(name))?;
        if let Some(t) = t {
            tetra.set_deleted(t, deleted);
            debug!("tetrahedron {} {}", t, if deleted { "deleted" } else { "restored" });
        }
        Ok(t)
    }

    pub fn clear_deletions(&mut self) -> Result<(), Error> {
        self.require_state("clear deletions", &[EditState::TetraMesh])?;
        let name = self.name.clone();
        self.tetra.as_mut().ok_or(Error::NoTetraMesh(name))?.clear_deletions();
        self.last_pick = Pick::default();
        Ok(())
    }

    /// Removes deleted tetrahedra for good and relinks the graphics mesh.
    pub fn remove_deleted(&mut self) -> Result<usize, Error> {
        self.require_state("remove deleted tetrahedra", &[EditState::TetraMesh])?;
        let name = self.name.clone();
        let removed = self.tetra.as_mut().ok_or(Error::NoTetraMesh(name))?.remove_deleted();
        if removed > 0 {
            self.relink();
        }
        self.last_pick = Pick::default();
        Ok(removed)
    }

    // ----- Simulation ------------------------------------------------------

    /// Switches to [`EditState::Simulating`].
    pub fn begin_simulation(&mut self) -> Result<&TetraMesh, Error> {
        self.require_state("create simulation", &[EditState::TetraMesh])?;
        self.tetra_or_err()?;
        self.state = EditState::Simulating;
        self.tetra_or_err()
    }

    /// Switches back from [`EditState::Simulating`] to
    /// [`EditState::TetraMesh`]. Does nothing in other states.
    pub fn end_simulation(&mut self) {
        if self.state == EditState::Simulating {
            self.state = EditState::TetraMesh;
        }
    }

    /// Computes the deformed graphics vertices from the live tetrahedron
    /// positions and indices of the simulation.
    ///
    /// Positions come from the link table. Normals are the sum of the unit
    /// face normals of all adjacent triangles, normalized once.
    pub fn skin(
        &self,
        live_positions: &[Point3<f32>],
        live_indices: &[u32],
        out: &mut Vec<GraphicsVertex>,
    ) -> Result<(), Error> {
        let tetra = self.tetra_or_err()?;

        out.clear();
        out.extend_from_slice(&self.vertices);
        tetra.apply_links(out, live_positions, live_indices);

        for v in out.iter_mut() {
            v.normal = Vector3::zero();
        }
        for section in &self.sections {
            add_face_normals(out, &section.indices);
        }
        normalize_normals(out);

        Ok(())
    }
}

/// Adds the unit normal of every triangle in `indices` to its three
/// vertices and normalizes the result.
fn accumulate_normals(vertices: &mut [GraphicsVertex], indices: &[u32]) {
    add_face_normals(vertices, indices);
    normalize_normals(vertices);
}

fn add_face_normals(vertices: &mut [GraphicsVertex], indices: &[u32]) {
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a.max(b).max(c) >= vertices.len() {
            continue;
        }

        let n = (vertices[b].pos - vertices[a].pos).cross(vertices[c].pos - vertices[a].pos);
        if n.magnitude2() == 0.0 {
            continue;
        }

        let n = n.normalize();
        vertices[a].normal += n;
        vertices[b].normal += n;
        vertices[c].normal += n;
    }
}

fn normalize_normals(vertices: &mut [GraphicsVertex]) {
    for v in vertices {
        if v.normal.magnitude2() > 0.0 {
            v.normal = v.normal.normalize();
        }
    }
}

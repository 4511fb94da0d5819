// Copyright @yucwang 2023

use super::bounds::recenter_on_bounds;
use super::normals::{ compute_face_normals, compute_face_volumes, compute_vertex_normals,
                      GeometryDiagnostics, VertexFaceAdjacency };

use crate::io::obj_utils;
use crate::io::obj_utils::{ ObjLoadError, ObjParser, RawMesh };
use crate::math::constants::{ Float, Vector2f, Vector3f };

use std::fmt;
use std::path::Path;

#[derive(Debug)]
pub enum MeshError {
    Load(ObjLoadError),
    /// The source held no vertex positions to measure.
    EmptyMesh,
    /// Buffers disagree with each other.
    InvalidMesh(String),
}

impl From<ObjLoadError> for MeshError {
    fn from(err: ObjLoadError) -> Self {
        MeshError::Load(err)
    }
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshError::Load(err) => write!(f, "load error: {}", err),
            MeshError::EmptyMesh => write!(f, "mesh has no vertices"),
            MeshError::InvalidMesh(msg) => write!(f, "invalid mesh: {}", msg),
        }
    }
}

impl std::error::Error for MeshError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MeshError::Load(err) => Some(err),
            _ => None,
        }
    }
}

/// A loaded, centered and shaded triangle mesh.
///
/// Positions are stored relative to the center of their original bounding
/// box; `bounds_center` records where that center was.
#[derive(Clone, Debug, PartialEq)]
pub struct TriangleMesh {
    vertices: Vec<Vector3f>,
    tex_coords: Vec<Vector2f>,
    faces: Vec<[usize; 3]>,
    face_normals: Vec<Vector3f>,
    vertex_normals: Vec<Vector3f>,
    face_volumes: Vec<f64>,
    bounds_center: Vector3f,
    bounds_diagonal: Float,
    diagnostics: GeometryDiagnostics,
}

impl Default for TriangleMesh {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            tex_coords: Vec::new(),
            faces: Vec::new(),
            face_normals: Vec::new(),
            vertex_normals: Vec::new(),
            face_volumes: Vec::new(),
            bounds_center: Vector3f::zeros(),
            bounds_diagonal: 0.0,
            diagnostics: GeometryDiagnostics::default(),
        }
    }
}

impl TriangleMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_obj<P: AsRef<Path>>(path: P) -> Result<Self, MeshError> {
        Self::from_obj_with(path, ObjParser::Native)
    }

    pub fn from_obj_with<P: AsRef<Path>>(path: P, parser: ObjParser) -> Result<Self, MeshError> {
        let mut mesh = Self::new();
        mesh.reload_from_file(path, parser)?;
        Ok(mesh)
    }

    pub fn from_obj_str(input: &str) -> Result<Self, MeshError> {
        let mut mesh = Self::new();
        mesh.reload_from_str(input)?;
        Ok(mesh)
    }

    pub fn from_raw(raw: RawMesh) -> Result<Self, MeshError> {
        raw.check_finite()?;
        raw.check_indices()?;
        let mut mesh = Self::new();
        mesh.vertices = raw.vertices;
        mesh.tex_coords = raw.tex_coords;
        mesh.faces = raw.faces;
        mesh.process()?;
        Ok(mesh)
    }

    /// Replace this mesh with the contents of `input`. On failure the mesh is
    /// left empty.
    pub fn reload_from_str(&mut self, input: &str) -> Result<(), MeshError> {
        self.clear();
        let mut raw = RawMesh::default();
        obj_utils::load_obj_into(input, &mut raw)?;
        self.install(raw)
    }

    pub fn reload_from_file<P: AsRef<Path>>(&mut self, path: P, parser: ObjParser) -> Result<(), MeshError> {
        self.clear();
        let raw = obj_utils::load_obj_from_file(&path, parser)?;
        self.install(raw)?;
        log::info!("Loaded {}: {} vertices, {} triangles.",
                   path.as_ref().display(), self.vertex_count(), self.face_count());
        Ok(())
    }

    fn install(&mut self, raw: RawMesh) -> Result<(), MeshError> {
        self.vertices = raw.vertices;
        self.tex_coords = raw.tex_coords;
        self.faces = raw.faces;
        let result = self.process();
        if result.is_err() {
            self.clear();
        }
        result
    }

    fn clear(&mut self) {
        *self = Self::default();
    }

    // Bounds, then face normals, then vertex normals. Each stage reads what
    // the previous one wrote.
    fn process(&mut self) -> Result<(), MeshError> {
        self.normalize_bounds()?;
        self.compute_face_normals();
        self.compute_vertex_normals();

        let diagnostics = &self.diagnostics;
        if !diagnostics.is_clean() && !diagnostics.zero_diagonal {
            log::warn!("{} degenerate faces, {} orphan vertices, {} undetermined vertex normals.",
                       diagnostics.degenerate_faces.len(),
                       diagnostics.orphan_vertices.len(),
                       diagnostics.undetermined_vertices.len());
        }
        Ok(())
    }

    fn normalize_bounds(&mut self) -> Result<(), MeshError> {
        let info = recenter_on_bounds(&mut self.vertices).ok_or(MeshError::EmptyMesh)?;
        self.bounds_center = info.center;
        self.bounds_diagonal = info.diagonal;
        self.diagnostics.zero_diagonal = info.diagonal == 0.0;
        Ok(())
    }

    fn compute_face_normals(&mut self) {
        let (normals, degenerate) = compute_face_normals(&self.vertices, &self.faces);
        self.face_normals = normals;
        self.diagnostics.degenerate_faces = degenerate;
    }

    fn compute_vertex_normals(&mut self) {
        self.face_volumes = compute_face_volumes(&self.vertices, &self.faces);
        let adjacency = VertexFaceAdjacency::build(self.vertices.len(), &self.faces);
        let (normals, orphans, undetermined) =
            compute_vertex_normals(&adjacency, &self.face_normals, &self.face_volumes);
        self.vertex_normals = normals;
        self.diagnostics.orphan_vertices = orphans;
        self.diagnostics.undetermined_vertices = undetermined;
    }

    /// Checks index ranges and buffer lengths.
    pub fn validate(&self) -> Result<(), MeshError> {
        let n = self.vertices.len();
        if self.vertex_normals.len() != n {
            return Err(MeshError::InvalidMesh(format!(
                "{} vertex normals for {} vertices", self.vertex_normals.len(), n)));
        }
        if self.face_normals.len() != self.faces.len() || self.face_volumes.len() != self.faces.len() {
            return Err(MeshError::InvalidMesh(format!(
                "{} face normals and {} face volumes for {} faces",
                self.face_normals.len(), self.face_volumes.len(), self.faces.len())));
        }
        for (face, indices) in self.faces.iter().enumerate() {
            if let Some(idx) = indices.iter().find(|&&idx| idx >= n) {
                return Err(MeshError::InvalidMesh(format!(
                    "face {} references vertex {} of {}", face, idx, n)));
            }
        }
        Ok(())
    }

    pub fn vertices(&self) -> &[Vector3f] {
        &self.vertices
    }

    pub fn tex_coords(&self) -> &[Vector2f] {
        &self.tex_coords
    }

    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }

    pub fn face_normals(&self) -> &[Vector3f] {
        &self.face_normals
    }

    pub fn vertex_normals(&self) -> &[Vector3f] {
        &self.vertex_normals
    }

    pub fn face_volumes(&self) -> &[f64] {
        &self.face_volumes
    }

    pub fn bounds_center(&self) -> Vector3f {
        self.bounds_center
    }

    pub fn bounds_diagonal(&self) -> Float {
        self.bounds_diagonal
    }

    pub fn diagnostics(&self) -> &GeometryDiagnostics {
        &self.diagnostics
    }

    pub fn has_texture(&self) -> bool {
        !self.tex_coords.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }
}

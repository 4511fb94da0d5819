// Copyright @yucwang 2023

//! Flat and smooth shading normals for indexed triangle meshes.
//!
//! Smooth normals are the weighted average of the normals of every face
//! touching a vertex. Faces and vertices for which no direction can be
//! determined receive `DEFAULT_NORMAL` and are listed in
//! [`GeometryDiagnostics`] so a renderer can choose to skip them.

use super::triangle::Triangle;

use crate::math::constants::{ default_normal, narrow, widen, Vector3d, Vector3f, NORMAL_EPSILON };

/// Elements that fell back to `DEFAULT_NORMAL` while shading a mesh.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeometryDiagnostics {
    /// Faces with a zero-length cross product (collinear or collapsed).
    pub degenerate_faces: Vec<usize>,
    /// Vertices referenced by no face.
    pub orphan_vertices: Vec<usize>,
    /// Vertices whose incident faces have no area or whose weighted
    /// normals cancel out.
    pub undetermined_vertices: Vec<usize>,
    /// Set when every vertex shares one position.
    pub zero_diagonal: bool,
}

impl GeometryDiagnostics {
    pub fn is_clean(&self) -> bool {
        self.degenerate_faces.is_empty()
            && self.orphan_vertices.is_empty()
            && self.undetermined_vertices.is_empty()
            && !self.zero_diagonal
    }
}

/// For each vertex, the faces that reference it, in face order.
#[derive(Clone, Debug, PartialEq)]
pub struct VertexFaceAdjacency {
    vertex_faces: Vec<Vec<usize>>,
}

impl VertexFaceAdjacency {
    /// Single pass over `faces`. Every index must be below `vertex_count`.
    pub fn build(vertex_count: usize, faces: &[[usize; 3]]) -> Self {
        let mut vertex_faces: Vec<Vec<usize>> = vec![Vec::new(); vertex_count];
        for (face_idx, face) in faces.iter().enumerate() {
            for &v in face {
                vertex_faces[v].push(face_idx);
            }
        }
        Self { vertex_faces }
    }

    pub fn faces_of(&self, vertex: usize) -> &[usize] {
        self.vertex_faces.get(vertex).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_faces.len()
    }
}

/// One unit normal per face. Degenerate faces get `DEFAULT_NORMAL`; their
/// indices are returned alongside.
pub fn compute_face_normals(vertices: &[Vector3f], faces: &[[usize; 3]]) -> (Vec<Vector3f>, Vec<usize>) {
    let mut normals = Vec::with_capacity(faces.len());
    let mut degenerate = Vec::new();
    for (face_idx, face) in faces.iter().enumerate() {
        match Triangle::from_indices(vertices, face).face_normal() {
            Some(n) => normals.push(n),
            None => {
                degenerate.push(face_idx);
                normals.push(default_normal());
            }
        }
    }
    (normals, degenerate)
}

pub fn compute_face_volumes(vertices: &[Vector3f], faces: &[[usize; 3]]) -> Vec<f64> {
    faces.iter()
        .map(|face| Triangle::from_indices(vertices, face).volume_weight())
        .collect()
}

/// Smooth normals from per-face normals and weights.
///
/// Returns the normals plus the orphan and undetermined vertex lists. Sums
/// are taken in f64; a vertex whose total weight or summed normal is zero or
/// not finite is undetermined.
pub fn compute_vertex_normals(adjacency: &VertexFaceAdjacency,
                              face_normals: &[Vector3f],
                              face_volumes: &[f64]) -> (Vec<Vector3f>, Vec<usize>, Vec<usize>) {
    let epsilon = NORMAL_EPSILON as f64;
    let vertex_count = adjacency.vertex_count();
    let mut normals = Vec::with_capacity(vertex_count);
    let mut orphans = Vec::new();
    let mut undetermined = Vec::new();

    for v in 0..vertex_count {
        let incident = adjacency.faces_of(v);
        if incident.is_empty() {
            orphans.push(v);
            normals.push(default_normal());
            continue;
        }

        let total_volume: f64 = incident.iter().map(|&f| face_volumes[f]).sum();
        if !total_volume.is_finite() || total_volume <= epsilon {
            undetermined.push(v);
            normals.push(default_normal());
            continue;
        }

        let mut sum = Vector3d::zeros();
        for &f in incident {
            sum += (face_volumes[f] / total_volume) * widen(&face_normals[f]);
        }

        let length = sum.norm();
        if !length.is_finite() || length <= epsilon {
            undetermined.push(v);
            normals.push(default_normal());
        } else {
            normals.push(narrow(&(sum / length)));
        }
    }

    (normals, orphans, undetermined)
}

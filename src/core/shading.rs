// Copyright @yucwang 2023

//! What a renderer reads from a processed mesh: the uniform display scale and
//! the per-corner stream for flat or smooth shading.

use crate::math::constants::{ Float, Matrix4f, Vector2f, Vector3f, EPSILON, PI };
use crate::shapes::triangle_mesh::TriangleMesh;

use nalgebra::{ Rotation3, Vector3 };
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShadingMode {
    /// One normal per face.
    Flat,
    /// Per-vertex normals interpolated across each face.
    Smooth,
}

impl Default for ShadingMode {
    fn default() -> Self {
        ShadingMode::Smooth
    }
}

impl ShadingMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "flat" => Some(ShadingMode::Flat),
            "smooth" => Some(ShadingMode::Smooth),
            _ => None,
        }
    }
}

/// Uniform scale that makes the mesh's bounding diagonal `desired_size` long.
/// A mesh with a (near) zero diagonal is drawn unscaled.
pub fn display_scale(mesh: &TriangleMesh, desired_size: Float) -> Float {
    let diagonal = mesh.bounds_diagonal();
    if diagonal < EPSILON {
        log::warn!("Bounding diagonal {} too small to scale; using 1.0.", diagonal);
        return 1.0;
    }
    desired_size / diagonal
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadedVertex {
    pub position: Vector3f,
    pub normal: Vector3f,
    pub tex_coord: Option<Vector2f>,
}

/// Three corners per face, in face order.
pub fn shaded_vertices(mesh: &TriangleMesh, mode: ShadingMode) -> Vec<ShadedVertex> {
    let vertices = mesh.vertices();
    let tex_coords = mesh.tex_coords();
    let mut out = Vec::with_capacity(mesh.face_count() * 3);

    for (face_idx, face) in mesh.faces().iter().enumerate() {
        for &v in face {
            let normal = match mode {
                ShadingMode::Flat => mesh.face_normals()[face_idx],
                ShadingMode::Smooth => mesh.vertex_normals()[v],
            };
            out.push(ShadedVertex {
                position: vertices[v],
                normal,
                tex_coord: tex_coords.get(v).cloned(),
            });
        }
    }
    out
}

/// Where and how one model is drawn.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelPlacement {
    pub translate: Vector3f,
    /// Degrees about x, then y, then z.
    pub rotate: Vector3f,
    /// Desired bounding diagonal in world units.
    pub size: Float,
    pub color: Vector3f,
    pub shading: ShadingMode,
    pub texture: Option<PathBuf>,
}

impl Default for ModelPlacement {
    fn default() -> Self {
        Self {
            translate: Vector3f::zeros(),
            rotate: Vector3f::zeros(),
            size: 10.0,
            color: Vector3f::new(1.0, 1.0, 1.0),
            shading: ShadingMode::Smooth,
            texture: None,
        }
    }
}

impl ModelPlacement {
    /// `scale * translate(t / scale) * Rx * Ry * Rz`: the mesh is rotated about
    /// its centered origin, scaled, and its origin lands on `translate`.
    pub fn model_matrix(&self, mesh: &TriangleMesh) -> Matrix4f {
        let s = display_scale(mesh, self.size);
        let to_rad = PI / 180.0;
        let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), self.rotate.x * to_rad);
        let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), self.rotate.y * to_rad);
        let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), self.rotate.z * to_rad);

        Matrix4f::new_scaling(s)
            * Matrix4f::new_translation(&(self.translate / s))
            * (rx * ry * rz).to_homogeneous()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    const QUAD: &str = "\
v 0 0 0
v 4 0 0
v 4 3 0
v 0 3 0
vt 0 0
vt 1 0
vt 1 1
f 1/1 2/2 3/3 4
";

    #[test]
    fn test_display_scale() {
        let mesh = TriangleMesh::from_obj_str(QUAD).unwrap();
        assert_relative_eq!(mesh.bounds_diagonal(), 5.0);
        assert_relative_eq!(display_scale(&mesh, 10.0), 2.0);
    }

    #[test]
    fn test_display_scale_zero_diagonal_fallback() {
        let mesh = TriangleMesh::from_obj_str("v 2 2 2\nv 2 2 2\nv 2 2 2\nf 1 2 3\n").unwrap();
        assert_eq!(display_scale(&mesh, 10.0), 1.0);
    }

    #[test]
    fn test_stream_selects_normals() {
        // Fold the quad so face and vertex normals differ.
        let folded = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 1\nf 1 2 3\nf 1 3 4\n";
        let mesh = TriangleMesh::from_obj_str(folded).unwrap();

        let flat = shaded_vertices(&mesh, ShadingMode::Flat);
        let smooth = shaded_vertices(&mesh, ShadingMode::Smooth);
        assert_eq!(flat.len(), 6);
        assert_eq!(smooth.len(), 6);

        for corner in &flat[0..3] {
            assert_eq!(corner.normal, mesh.face_normals()[0]);
        }
        assert_eq!(smooth[0].normal, mesh.vertex_normals()[0]);
        assert_eq!(smooth[5].normal, mesh.vertex_normals()[3]);
        assert_eq!(smooth[5].position, mesh.vertices()[3]);
        assert_ne!(flat[0].normal, smooth[0].normal);
    }

    #[test]
    fn test_stream_tex_coords() {
        let mesh = TriangleMesh::from_obj_str(QUAD).unwrap();
        let stream = shaded_vertices(&mesh, ShadingMode::Smooth);
        assert_eq!(stream[1].tex_coord, Some(Vector2f::new(1.0, 0.0)));
        // Vertex 4 has no matching texture coordinate.
        assert_eq!(stream[5].tex_coord, None);

        let plain = TriangleMesh::from_obj_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        assert!(shaded_vertices(&plain, ShadingMode::Flat).iter().all(|c| c.tex_coord.is_none()));
    }

    #[test]
    fn test_model_matrix() {
        let mesh = TriangleMesh::from_obj_str(QUAD).unwrap();
        let placement = ModelPlacement {
            translate: Vector3f::new(5.0, 5.0, 0.0),
            rotate: Vector3f::new(0.0, 0.0, 90.0),
            size: 10.0,
            ..ModelPlacement::default()
        };
        let m = placement.model_matrix(&mesh);

        let origin = m.transform_point(&Point3::origin());
        assert_relative_eq!(origin, Point3::new(5.0, 5.0, 0.0), epsilon = 1e-4);

        // +x rotated a quarter turn about z, then doubled.
        let x = m.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(x, Point3::new(5.0, 7.0, 0.0), epsilon = 1e-4);
    }

    #[test]
    fn test_shading_names() {
        assert_eq!(ShadingMode::from_name("flat"), Some(ShadingMode::Flat));
        assert_eq!(ShadingMode::from_name("smooth"), Some(ShadingMode::Smooth));
        assert_eq!(ShadingMode::from_name("gouraud"), None);
        assert_eq!(ShadingMode::default(), ShadingMode::Smooth);
    }
}

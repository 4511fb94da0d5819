// Copyright @yucwang 2023

use crate::math::constants::{ narrow, widen, Vector3d, Vector3f, NORMAL_EPSILON };

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Triangle {
    p0: Vector3f,
    p1: Vector3f,
    p2: Vector3f
}

impl Triangle {
    pub fn new(new_p0: Vector3f, new_p1: Vector3f, new_p2: Vector3f) -> Self {
        Triangle {
            p0: new_p0,
            p1: new_p1,
            p2: new_p2,
        }
    }

    pub fn from_indices(vertices: &[Vector3f], face: &[usize; 3]) -> Self {
        Self::new(vertices[face[0]], vertices[face[1]], vertices[face[2]])
    }

    /// Unnormalized normal `(p1 - p0) x (p2 - p1)`. The second edge runs from
    /// p1 to p2, so counter-clockwise faces point towards the viewer.
    pub fn raw_normal(&self) -> Vector3d {
        let edge0 = widen(&self.p1) - widen(&self.p0);
        let edge1 = widen(&self.p2) - widen(&self.p1);
        edge0.cross(&edge1)
    }

    /// Unit face normal, or `None` for a collinear or collapsed triangle.
    pub fn face_normal(&self) -> Option<Vector3f> {
        let n = self.raw_normal();
        let length = n.norm();
        if !length.is_finite() || length <= NORMAL_EPSILON as f64 {
            return None;
        }
        Some(narrow(&(n / length)))
    }

    /// Weight of this face in vertex normal averaging:
    /// `0.5 * |cx + cy + cz|` of `c = (p1 - p0) x (p2 - p0)`.
    pub fn volume_weight(&self) -> f64 {
        let edge0 = widen(&self.p1) - widen(&self.p0);
        let edge1 = widen(&self.p2) - widen(&self.p0);
        let c = edge0.cross(&edge1);
        0.5 * (c.x + c.y + c.z).abs()
    }
}

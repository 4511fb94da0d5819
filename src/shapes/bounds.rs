// Copyright @yucwang 2023

use crate::math::aabb::AABB;
use crate::math::constants::{ Float, Vector3f };

/// Bounding box metadata recorded before vertices are re-centered.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BoundsInfo {
    pub center: Vector3f,
    pub diagonal: Float,
}

/// Moves `vertices` so the center of their bounding box is the origin.
///
/// The box is measured over every vertex before any is moved. Returns `None`
/// (and leaves the slice alone) when there are no vertices.
pub fn recenter_on_bounds(vertices: &mut [Vector3f]) -> Option<BoundsInfo> {
    let bound = AABB::from_points(vertices.iter())?;
    let info = BoundsInfo {
        center: bound.center(),
        diagonal: bound.diagonal_length(),
    };

    for v in vertices.iter_mut() {
        *v -= info.center;
    }

    if info.diagonal == 0.0 {
        log::warn!("Bounding box has zero diagonal ({} vertices at one position).", vertices.len());
    }
    Some(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_recenter_tetrahedron() {
        let mut vertices = vec![Vector3f::new(0.0, 0.0, 0.0),
                                Vector3f::new(2.0, 0.0, 0.0),
                                Vector3f::new(0.0, 2.0, 0.0),
                                Vector3f::new(0.0, 0.0, 2.0)];
        let info = recenter_on_bounds(&mut vertices).unwrap();
        assert_eq!(info.center, Vector3f::new(1.0, 1.0, 1.0));
        assert_relative_eq!(info.diagonal, (12.0f32).sqrt(), epsilon = 1e-6);
        assert_eq!(vertices[0], Vector3f::new(-1.0, -1.0, -1.0));
        assert_eq!(vertices[3], Vector3f::new(-1.0, -1.0, 1.0));
    }

    #[test]
    fn test_every_vertex_counts() {
        // The extreme point sits last; a loop bound of len / 3 would miss it.
        let mut vertices = vec![Vector3f::new(0.0, 0.0, 0.0),
                                Vector3f::new(1.0, 0.0, 0.0),
                                Vector3f::new(0.0, 1.0, 0.0),
                                Vector3f::new(10.0, 10.0, 10.0)];
        let info = recenter_on_bounds(&mut vertices).unwrap();
        assert_eq!(info.center, Vector3f::new(5.0, 5.0, 5.0));
    }

    #[test]
    fn test_single_position() {
        let mut vertices = vec![Vector3f::new(3.0, -2.0, 1.0); 4];
        let info = recenter_on_bounds(&mut vertices).unwrap();
        assert_eq!(info.diagonal, 0.0);
        assert_eq!(info.center, Vector3f::new(3.0, -2.0, 1.0));
        assert!(vertices.iter().all(|v| *v == Vector3f::zeros()));
    }

    #[test]
    fn test_empty() {
        let mut vertices: Vec<Vector3f> = Vec::new();
        assert!(recenter_on_bounds(&mut vertices).is_none());
    }
}

/* Copyright 2020 @Yuchen Wong */

pub type Float = f32;

pub type Vector2f = nalgebra::Vector2<Float>;
pub type Vector3f = nalgebra::Vector3<Float>;
pub type Matrix4f = nalgebra::Matrix4<Float>;
pub type Vector3d = nalgebra::Vector3<f64>;

pub const EPSILON: Float = 1e-4;
pub const PI: Float = 3.14159265359;

// Lengths below this are treated as zero when normalizing.
pub const NORMAL_EPSILON: Float = 1e-12;

// Sentinel for normals of degenerate faces and orphan vertices.
pub const DEFAULT_NORMAL: [Float; 3] = [0.0, 1.0, 0.0];

pub fn default_normal() -> Vector3f {
    Vector3f::new(DEFAULT_NORMAL[0], DEFAULT_NORMAL[1], DEFAULT_NORMAL[2])
}

// Products of f32 coordinates overflow long before f64 does.
pub fn widen(v: &Vector3f) -> Vector3d {
    Vector3d::new(v.x as f64, v.y as f64, v.z as f64)
}

pub fn narrow(v: &Vector3d) -> Vector3f {
    Vector3f::new(v.x as Float, v.y as Float, v.z as Float)
}

// Copyright @yucwang 2021

pub mod bounds;
pub mod normals;
pub mod triangle;
pub mod triangle_mesh;

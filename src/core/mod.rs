// Copyright @yucwang 2021

pub mod scene;
pub mod scene_loader;
pub mod shading;

// Copyright 2020 TwoCookingMice

use pavlova::core::scene::Scene;
use pavlova::core::scene_loader::{ load_scene_description, ModelDescription, SceneDescription };
use pavlova::core::shading::{ display_scale, shaded_vertices, ModelPlacement, ShadingMode };
use pavlova::io::obj_utils::ObjParser;
use pavlova::math::constants::Float;
use pavlova::textures::image::{ load_cube_map, TextureImage, TextureParams };

use console::style;
use std::env;
use std::path::{ Path, PathBuf };

fn usage(program: &str) {
    eprintln!("Usage: {} <scene.xml | mesh.obj ...> [--flat] [--size N] [--parser native|wavefront] [--textures]",
              program);
}

fn main() {
    env::set_var("RUST_LOG", "info");
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage(&args[0]);
        std::process::exit(1);
    }

    let mut inputs: Vec<PathBuf> = Vec::new();
    let mut shading: Option<ShadingMode> = None;
    let mut size_override: Option<Float> = None;
    let mut parser = ObjParser::Native;
    let mut decode_textures = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--flat" => {
                shading = Some(ShadingMode::Flat);
            }
            "--size" => {
                i += 1;
                size_override = args.get(i).and_then(|v| v.parse::<Float>().ok());
            }
            "--parser" => {
                i += 1;
                parser = match args.get(i).map(String::as_str) {
                    Some("wavefront") => ObjParser::Wavefront,
                    _ => ObjParser::Native,
                };
            }
            "--textures" => {
                decode_textures = true;
            }
            other => inputs.push(PathBuf::from(other)),
        }
        i += 1;
    }

    if inputs.is_empty() {
        usage(&args[0]);
        std::process::exit(1);
    }

    let mut description = match build_description(&inputs) {
        Ok(description) => description,
        Err(err) => {
            eprintln!("{} {}", style("error:").red().bold(), err);
            std::process::exit(1);
        }
    };

    for model in description.models.iter_mut() {
        if let Some(mode) = shading {
            model.placement.shading = mode;
        }
        if let Some(size) = size_override {
            model.placement.size = size;
        }
    }

    let (scene, failures) = Scene::from_description(&description, parser);
    print_summary(&scene);

    let mut texture_failures = 0;
    if decode_textures {
        texture_failures = decode_scene_textures(&scene);
    }

    for (id, err) in &failures {
        eprintln!("{} {}: {}", style("failed").red().bold(), id, err);
    }

    if !failures.is_empty() || texture_failures > 0 {
        std::process::exit(1);
    }
}

/// A single `.xml` argument is a scene manifest; anything else is a list of
/// OBJ files keyed by file stem.
fn build_description(inputs: &[PathBuf]) -> Result<SceneDescription, String> {
    let is_manifest = |p: &Path| p.extension().map_or(false, |ext| ext == "xml");
    if inputs.len() == 1 && is_manifest(&inputs[0]) {
        return load_scene_description(&inputs[0]).map_err(|err| err.to_string());
    }

    let mut description = SceneDescription::default();
    for path in inputs {
        let id = path.file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .ok_or_else(|| format!("cannot derive an id from {}", path.display()))?;
        if description.models.iter().any(|m| m.id == id) {
            return Err(format!("duplicate model id: {}", id));
        }
        description.models.push(ModelDescription {
            id,
            filename: path.clone(),
            placement: ModelPlacement::default(),
        });
    }
    Ok(description)
}

fn print_summary(scene: &Scene) {
    for (id, object) in scene.objects() {
        let mesh = &object.mesh;
        let diagnostics = mesh.diagnostics();
        let corners = shaded_vertices(mesh, object.placement.shading).len();

        println!("{} {} vertices, {} faces, {} corners ({:?})",
                 style(id).cyan().bold(),
                 mesh.vertex_count(), mesh.face_count(), corners, object.placement.shading);
        println!("    diagonal {:.4}, display scale {:.4}, textured {}",
                 mesh.bounds_diagonal(),
                 display_scale(mesh, object.placement.size),
                 mesh.has_texture());

        if diagnostics.is_clean() {
            println!("    {}", style("geometry ok").green());
        } else {
            println!("    {} {} degenerate faces, {} orphan vertices, {} undetermined normals",
                     style("warning").yellow(),
                     diagnostics.degenerate_faces.len(),
                     diagnostics.orphan_vertices.len(),
                     diagnostics.undetermined_vertices.len());
        }
    }
}

/// Returns the number of textures that failed to decode.
fn decode_scene_textures(scene: &Scene) -> usize {
    let mut failures = 0;
    let mut report = |label: &str, params: TextureParams, result: Result<(u32, u32), String>| {
        match result {
            Ok((w, h)) => println!("{} {} {}x{} ({:?}, {:?})",
                                   style("texture").magenta(), label, w, h, params.wrap, params.filter),
            Err(err) => {
                eprintln!("{} {}: {}", style("failed").red().bold(), label, err);
                failures += 1;
            }
        }
    };

    for (id, object) in scene.objects() {
        if let Some(path) = &object.placement.texture {
            let result = TextureImage::from_file(path).map(|t| t.dimensions()).map_err(|e| e.to_string());
            report(id, TextureParams::surface(), result);
        }
    }
    if let Some(texture) = scene.ground().and_then(|g| g.texture.as_ref()) {
        let result = TextureImage::from_file(texture).map(|t| t.dimensions()).map_err(|e| e.to_string());
        report("ground", TextureParams::surface(), result);
    }
    if let Some(skybox) = scene.skybox() {
        let result = load_cube_map(&skybox.faces)
            .map(|faces| faces[0].dimensions())
            .map_err(|e| e.to_string());
        report("skybox", TextureParams::cube_face(), result);
    }
    failures
}

// Copyright @yucwang 2023

use crate::core::scene_loader::{ GroundDescription, ModelDescription, SceneDescription, SkyboxDescription };
use crate::core::shading::ModelPlacement;
use crate::io::obj_utils::ObjParser;
use crate::shapes::triangle_mesh::{ MeshError, TriangleMesh };

use indicatif::{ ProgressBar, ProgressStyle };
use std::collections::HashMap;
use std::sync::atomic::{ AtomicUsize, Ordering };
use std::sync::{ mpsc, Arc };
use std::thread;

/// A processed mesh and how it is placed. The mesh is shared read-only once
/// published; reloading an object publishes a fresh `Arc`.
#[derive(Clone, Debug)]
pub struct SceneObject {
    pub mesh: Arc<TriangleMesh>,
    pub placement: ModelPlacement,
}

#[derive(Clone, Debug, Default)]
pub struct Scene {
    objects: HashMap<String, SceneObject>,
    order: Vec<String>,
    ground: Option<GroundDescription>,
    skybox: Option<SkyboxDescription>,
}

/// Meshes that failed to load, by object id. The rest of the scene still loads.
pub type LoadFailures = Vec<(String, MeshError)>;

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every model of `description` in parallel.
    pub fn from_description(description: &SceneDescription, parser: ObjParser) -> (Self, LoadFailures) {
        let (mut scene, failures) = Self::load_models(&description.models, parser);
        scene.ground = description.ground.clone();
        scene.skybox = description.skybox.clone();
        (scene, failures)
    }

    pub fn load_models(models: &[ModelDescription], parser: ObjParser) -> (Self, LoadFailures) {
        let mut scene = Scene::new();
        let mut failures = LoadFailures::new();

        for (idx, result) in load_meshes_parallel(models, parser) {
            let model = &models[idx];
            match result {
                Ok(mesh) => {
                    log::info!("Loaded {}: {} vertices, {} faces.",
                               model.id, mesh.vertex_count(), mesh.face_count());
                    scene.insert(model.id.clone(), mesh, model.placement.clone());
                }
                Err(err) => {
                    log::error!("Failed to load {} from {}: {}.", model.id, model.filename.display(), err);
                    failures.push((model.id.clone(), err));
                }
            }
        }
        (scene, failures)
    }

    /// Publishes `mesh` under `id`, returning the object it replaced.
    pub fn insert(&mut self, id: String, mesh: TriangleMesh, placement: ModelPlacement) -> Option<SceneObject> {
        let object = SceneObject { mesh: Arc::new(mesh), placement };
        let previous = self.objects.insert(id.clone(), object);
        if previous.is_none() {
            self.order.push(id);
        }
        previous
    }

    pub fn get(&self, id: &str) -> Option<&SceneObject> {
        self.objects.get(id)
    }

    pub fn mesh(&self, id: &str) -> Option<Arc<TriangleMesh>> {
        self.objects.get(id).map(|object| Arc::clone(&object.mesh))
    }

    /// Object ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn objects(&self) -> impl Iterator<Item = (&str, &SceneObject)> {
        self.order.iter().filter_map(move |id| self.objects.get(id).map(|o| (id.as_str(), o)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn ground(&self) -> Option<&GroundDescription> {
        self.ground.as_ref()
    }

    pub fn skybox(&self) -> Option<&SkyboxDescription> {
        self.skybox.as_ref()
    }
}

/// Results come back sorted by model index.
fn load_meshes_parallel(models: &[ModelDescription],
                        parser: ObjParser) -> Vec<(usize, Result<TriangleMesh, MeshError>)> {
    let total = models.len();
    if total == 0 {
        return Vec::new();
    }

    let progress = ProgressBar::new(total as u64);
    progress.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} meshes")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let next_model = Arc::new(AtomicUsize::new(0));
    let thread_count = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(total);
    let (tx, rx) = mpsc::channel::<(usize, Result<TriangleMesh, MeshError>)>();
    let mut results = Vec::with_capacity(total);

    thread::scope(|scope| {
        for _ in 0..thread_count {
            let next_model = Arc::clone(&next_model);
            let tx = tx.clone();
            scope.spawn(move || {
                loop {
                    let idx = next_model.fetch_add(1, Ordering::Relaxed);
                    if idx >= total {
                        break;
                    }

                    let result = TriangleMesh::from_obj_with(&models[idx].filename, parser);
                    if tx.send((idx, result)).is_err() {
                        break;
                    }
                }
            });
        }

        drop(tx);
        for item in rx.iter() {
            results.push(item);
            progress.inc(1);
        }
    });
    progress.finish_and_clear();

    results.sort_by_key(|(idx, _)| *idx);
    results
}

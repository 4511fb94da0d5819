// Copyright @yucwang 2023

use std::collections::{ HashMap, HashSet };
use std::fmt;
use std::fs;
use std::path::{ Path, PathBuf };

use quick_xml::events::{ BytesStart, Event };
use quick_xml::Reader;

use crate::core::shading::{ ModelPlacement, ShadingMode };
use crate::math::constants::{ Float, Vector3f };

#[derive(Debug)]
pub enum SceneLoadError {
    Io(std::io::Error),
    Parse(String),
    MissingField(&'static str),
    DuplicateObject(String),
}

impl From<std::io::Error> for SceneLoadError {
    fn from(err: std::io::Error) -> Self {
        SceneLoadError::Io(err)
    }
}

impl fmt::Display for SceneLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneLoadError::Io(err) => write!(f, "io error: {}", err),
            SceneLoadError::Parse(msg) => write!(f, "parse error: {}", msg),
            SceneLoadError::MissingField(field) => write!(f, "missing field: {}", field),
            SceneLoadError::DuplicateObject(id) => write!(f, "duplicate model id: {}", id),
        }
    }
}

impl std::error::Error for SceneLoadError {}

#[derive(Clone, Debug, PartialEq)]
pub struct ModelDescription {
    pub id: String,
    pub filename: PathBuf,
    pub placement: ModelPlacement,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GroundDescription {
    pub texture: Option<PathBuf>,
    /// Half the side length of the square ground plane.
    pub extent: Float,
    /// Times the texture tiles across the plane.
    pub repeat: Float,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SkyboxDescription {
    /// +x, -x, +y, -y, +z, -z.
    pub faces: [PathBuf; 6],
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneDescription {
    pub models: Vec<ModelDescription>,
    pub ground: Option<GroundDescription>,
    pub skybox: Option<SkyboxDescription>,
}

const SKYBOX_FACES: [&str; 6] = ["posx", "negx", "posy", "negy", "posz", "negz"];
const SKYBOX_FIELDS: [&str; 6] = ["skybox.posx", "skybox.negx", "skybox.posy",
                                  "skybox.negy", "skybox.posz", "skybox.negz"];

pub fn load_scene_description<P: AsRef<Path>>(path: P) -> Result<SceneDescription, SceneLoadError> {
    let path = path.as_ref();
    log::info!("Loading scene manifest: {}.", path.display());
    let xml = fs::read_to_string(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    parse_scene_description(&xml, base_dir)
}

#[derive(Default)]
struct ModelBuilder {
    id: Option<String>,
    filename: Option<String>,
    placement: ModelPlacement,
}

pub fn parse_scene_description(xml: &str, base_dir: &Path) -> Result<SceneDescription, SceneLoadError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut defaults: HashMap<String, String> = HashMap::new();
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut description = SceneDescription::default();
    let mut current_model: Option<ModelBuilder> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                handle_element(&e, false, base_dir, &mut defaults, &mut seen_ids,
                               &mut description, &mut current_model)?;
            }
            Ok(Event::Empty(e)) => {
                handle_element(&e, true, base_dir, &mut defaults, &mut seen_ids,
                               &mut description, &mut current_model)?;
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"model" {
                    if let Some(builder) = current_model.take() {
                        finish_model(builder, base_dir, &mut seen_ids, &mut description)?;
                    }
                }
            }
            Err(e) => {
                return Err(SceneLoadError::Parse(e.to_string()));
            }
            _ => {}
        }

        buf.clear();
    }

    log::debug!("Scene manifest lists {} models.", description.models.len());
    Ok(description)
}

fn handle_element(e: &BytesStart,
                  is_empty: bool,
                  base_dir: &Path,
                  defaults: &mut HashMap<String, String>,
                  seen_ids: &mut HashSet<String>,
                  description: &mut SceneDescription,
                  current_model: &mut Option<ModelBuilder>) -> Result<(), SceneLoadError> {
    let attrs = read_attributes(e, defaults);
    match e.name().as_ref() {
        b"default" => {
            if let (Some(k), Some(v)) = (attrs.get("name"), attrs.get("value")) {
                defaults.insert(k.clone(), v.clone());
            }
        }
        b"model" => {
            let mut builder = ModelBuilder {
                id: attrs.get("id").cloned(),
                filename: attrs.get("filename").cloned(),
                placement: ModelPlacement::default(),
            };
            if let Some(shading) = attrs.get("shading") {
                builder.placement.shading = ShadingMode::from_name(shading)
                    .ok_or_else(|| SceneLoadError::Parse(format!("unknown shading: {}", shading)))?;
            }
            if let Some(size) = attrs.get("size") {
                builder.placement.size = parse_float(size)?;
            }
            if is_empty {
                finish_model(builder, base_dir, seen_ids, description)?;
            } else {
                *current_model = Some(builder);
            }
        }
        b"translate" => {
            if let Some(builder) = current_model.as_mut() {
                builder.placement.translate = parse_xyz(&attrs)?;
            }
        }
        b"rotate" => {
            if let Some(builder) = current_model.as_mut() {
                builder.placement.rotate = parse_xyz(&attrs)?;
            }
        }
        b"rgb" => {
            if let Some(builder) = current_model.as_mut() {
                if attrs.get("name").map(String::as_str) == Some("color") {
                    let value = attrs.get("value").ok_or(SceneLoadError::MissingField("rgb.value"))?;
                    builder.placement.color = parse_vec3(value)?;
                }
            }
        }
        b"string" => {
            if let Some(builder) = current_model.as_mut() {
                if let (Some(name), Some(value)) = (attrs.get("name"), attrs.get("value")) {
                    match name.as_str() {
                        "texture" => builder.placement.texture = Some(resolve_path(value, base_dir)),
                        "filename" => builder.filename = Some(value.clone()),
                        _ => {}
                    }
                }
            }
        }
        b"ground" => {
            let extent = match attrs.get("extent") {
                Some(v) => parse_float(v)?,
                None => 100.0,
            };
            let repeat = match attrs.get("repeat") {
                Some(v) => parse_float(v)?,
                None => 8.0,
            };
            description.ground = Some(GroundDescription {
                texture: attrs.get("texture").map(|t| resolve_path(t, base_dir)),
                extent,
                repeat,
            });
        }
        b"skybox" => {
            let mut faces: Vec<PathBuf> = Vec::with_capacity(6);
            for (name, field) in SKYBOX_FACES.iter().zip(SKYBOX_FIELDS.iter()) {
                let value = attrs.get(*name).ok_or(SceneLoadError::MissingField(*field))?;
                faces.push(resolve_path(value, base_dir));
            }
            let faces = [faces[0].clone(), faces[1].clone(), faces[2].clone(),
                         faces[3].clone(), faces[4].clone(), faces[5].clone()];
            description.skybox = Some(SkyboxDescription { faces });
        }
        _ => {}
    }
    Ok(())
}

fn finish_model(builder: ModelBuilder,
                base_dir: &Path,
                seen_ids: &mut HashSet<String>,
                description: &mut SceneDescription) -> Result<(), SceneLoadError> {
    let id = builder.id.ok_or(SceneLoadError::MissingField("model.id"))?;
    let filename = builder.filename.ok_or(SceneLoadError::MissingField("model.filename"))?;
    if !seen_ids.insert(id.clone()) {
        return Err(SceneLoadError::DuplicateObject(id));
    }

    description.models.push(ModelDescription {
        id,
        filename: resolve_path(&filename, base_dir),
        placement: builder.placement,
    });
    Ok(())
}

fn read_attributes(e: &BytesStart, defaults: &HashMap<String, String>) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = resolve_value(&attr.unescape_value().unwrap_or_default(), defaults);
        attrs.insert(key, value);
    }
    attrs
}

fn resolve_value(raw: &str, defaults: &HashMap<String, String>) -> String {
    let mut out = raw.to_string();
    for (k, v) in defaults {
        out = out.replace(&format!("${}", k), v);
    }
    out
}

fn resolve_path(filename: &str, base_dir: &Path) -> PathBuf {
    if Path::new(filename).is_absolute() {
        PathBuf::from(filename)
    } else {
        base_dir.join(filename)
    }
}

fn parse_float(value: &str) -> Result<Float, SceneLoadError> {
    value.trim().parse::<Float>().map_err(|_| SceneLoadError::Parse(format!("invalid float: {}", value)))
}

fn parse_xyz(attrs: &HashMap<String, String>) -> Result<Vector3f, SceneLoadError> {
    let mut v = Vector3f::zeros();
    for (idx, key) in ["x", "y", "z"].iter().enumerate() {
        if let Some(value) = attrs.get(*key) {
            v[idx] = parse_float(value)?;
        }
    }
    Ok(v)
}

fn parse_vec3(value: &str) -> Result<Vector3f, SceneLoadError> {
    let mut parts = value.split(',').map(|s| s.trim()).filter(|s| !s.is_empty());
    let x = parts.next().ok_or_else(|| SceneLoadError::Parse("invalid vec3".to_string()))?;
    let y = parts.next().ok_or_else(|| SceneLoadError::Parse("invalid vec3".to_string()))?;
    let z = parts.next().ok_or_else(|| SceneLoadError::Parse("invalid vec3".to_string()))?;
    Ok(Vector3f::new(parse_float(x)?, parse_float(y)?, parse_float(z)?))
}

// Copyright @yucwang 2023

use std::fmt;
use std::fs;
use std::path::Path;

use wavefront_obj::{obj, ParseError};

use crate::math::constants::{ Float, Vector2f, Vector3f };

#[derive(Debug)]
pub enum ObjLoadError {
    Io(std::io::Error),
    /// A numeric field on `line` (1-based) could not be parsed.
    MalformedToken { line: usize, token: String },
    /// A `v` or `vt` line carried fewer components than required.
    MissingComponent { line: usize, kind: &'static str, expected: usize, found: usize },
    /// A position read by the `wavefront_obj` backend is NaN or infinite.
    NonFiniteVertex { vertex: usize },
    /// `file_index` is the index as written in the file (1-based).
    IndexOutOfRange { face: usize, file_index: i64, vertex_count: usize },
    WavefrontParse(ParseError),
}

impl From<std::io::Error> for ObjLoadError {
    fn from(err: std::io::Error) -> Self {
        ObjLoadError::Io(err)
    }
}

impl From<ParseError> for ObjLoadError {
    fn from(err: ParseError) -> Self {
        ObjLoadError::WavefrontParse(err)
    }
}

impl fmt::Display for ObjLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjLoadError::Io(err) => write!(f, "io error: {}", err),
            ObjLoadError::MalformedToken { line, token } => {
                write!(f, "line {}: malformed token '{}'", line, token)
            }
            ObjLoadError::MissingComponent { line, kind, expected, found } => {
                write!(f, "line {}: {} needs {} components, found {}", line, kind, expected, found)
            }
            ObjLoadError::IndexOutOfRange { face, file_index, vertex_count } => {
                write!(f, "face {} references vertex {} but the mesh has {} vertices",
                       face, file_index, vertex_count)
            }
            ObjLoadError::NonFiniteVertex { vertex } => {
                write!(f, "vertex {} has a non-finite coordinate", vertex)
            }
            ObjLoadError::WavefrontParse(err) => write!(f, "parse error: {}", err),
        }
    }
}

impl std::error::Error for ObjLoadError {}

/// Which reader turns OBJ text into a `RawMesh`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjParser {
    /// Line reader in this module: strict numbers, `#` truncates any line.
    Native,
    /// The `wavefront_obj` crate, after fan-triangulating polygon lines.
    Wavefront,
}

impl Default for ObjParser {
    fn default() -> Self {
        ObjParser::Native
    }
}

/// Geometry exactly as read from a mesh source, before any processing.
/// Face indices are 0-based.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawMesh {
    pub vertices: Vec<Vector3f>,
    pub tex_coords: Vec<Vector2f>,
    pub faces: Vec<[usize; 3]>,
}

impl RawMesh {
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.tex_coords.clear();
        self.faces.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.tex_coords.is_empty() && self.faces.is_empty()
    }

    pub fn check_indices(&self) -> Result<(), ObjLoadError> {
        let vertex_count = self.vertices.len();
        for (face, indices) in self.faces.iter().enumerate() {
            if let Some(&idx) = indices.iter().find(|&&idx| idx >= vertex_count) {
                return Err(ObjLoadError::IndexOutOfRange {
                    face,
                    file_index: idx as i64 + 1,
                    vertex_count,
                });
            }
        }
        Ok(())
    }

    pub fn check_finite(&self) -> Result<(), ObjLoadError> {
        match self.vertices.iter().position(|v| !v.iter().all(|c| c.is_finite())) {
            Some(vertex) => Err(ObjLoadError::NonFiniteVertex { vertex }),
            None => Ok(()),
        }
    }
}

pub fn load_obj_from_str<S: AsRef<str>>(input: S) -> Result<RawMesh, ObjLoadError> {
    let mut raw = RawMesh::default();
    load_obj_into(input.as_ref(), &mut raw)?;
    Ok(raw)
}

pub fn load_obj_from_file<P: AsRef<Path>>(path: P, parser: ObjParser) -> Result<RawMesh, ObjLoadError> {
    log::info!("Reading mesh source: {}.", path.as_ref().display());
    let data = fs::read_to_string(path)?;
    match parser {
        ObjParser::Native => load_obj_from_str(data),
        ObjParser::Wavefront => load_wavefront_from_str(data),
    }
}

/// Parse `input` into `raw`, replacing whatever it held. On error `raw` is
/// left empty.
pub fn load_obj_into(input: &str, raw: &mut RawMesh) -> Result<(), ObjLoadError> {
    raw.clear();
    let result = parse_lines(input, raw).and_then(|_| raw.check_indices());
    match result {
        Ok(()) => {
            log::debug!("Parsed {} vertices, {} texture coordinates, {} triangles.",
                        raw.vertices.len(), raw.tex_coords.len(), raw.faces.len());
            Ok(())
        }
        Err(err) => {
            raw.clear();
            Err(err)
        }
    }
}

fn parse_lines(input: &str, raw: &mut RawMesh) -> Result<(), ObjLoadError> {
    for (line_idx, line) in input.lines().enumerate() {
        let line_no = line_idx + 1;
        let mut tokens = strip_comment(line).split_whitespace();
        match tokens.next() {
            Some("v") => {
                // An optional fourth (w) component is ignored.
                let mut p = [0.0; 3];
                parse_components(tokens, line_no, "vertex", &mut p)?;
                raw.vertices.push(Vector3f::new(p[0], p[1], p[2]));
            }
            Some("vt") => {
                let mut uv = [0.0; 2];
                parse_components(tokens, line_no, "texture coordinate", &mut uv)?;
                raw.tex_coords.push(Vector2f::new(uv[0], uv[1]));
            }
            Some("f") => {
                parse_face(tokens, line_no, raw)?;
            }
            _ => {}
        }
    }
    Ok(())
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn parse_components<'a, I>(tokens: I,
                           line: usize,
                           kind: &'static str,
                           out: &mut [Float]) -> Result<(), ObjLoadError>
where
    I: Iterator<Item = &'a str>,
{
    let expected = out.len();
    let mut found = 0;
    for token in tokens.take(expected) {
        // `nan` and `inf` parse as floats but are not coordinates.
        out[found] = token.parse::<Float>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| ObjLoadError::MalformedToken { line, token: token.to_string() })?;
        found += 1;
    }

    if found < expected {
        return Err(ObjLoadError::MissingComponent { line, kind, expected, found });
    }
    Ok(())
}

// Fan-triangulates around the first vertex: (a, b, c, d) -> (a, b, c), (a, c, d).
fn parse_face<'a, I>(tokens: I, line: usize, raw: &mut RawMesh) -> Result<(), ObjLoadError>
where
    I: Iterator<Item = &'a str>,
{
    let mut indices: Vec<usize> = Vec::new();
    for group in tokens {
        indices.push(parse_vertex_reference(group, line, raw)?);
    }

    if indices.len() < 3 {
        log::warn!("line {}: face with {} vertices skipped.", line, indices.len());
        return Ok(());
    }

    let anchor = indices[0];
    for pair in indices[1..].windows(2) {
        raw.faces.push([anchor, pair[0], pair[1]]);
    }
    Ok(())
}

// Only the leading vertex index of `v/vt/vn` groups is kept.
fn parse_vertex_reference(group: &str, line: usize, raw: &RawMesh) -> Result<usize, ObjLoadError> {
    let leading = group.split('/').next().unwrap_or(group);
    let file_index = leading.parse::<i64>().map_err(|_| ObjLoadError::MalformedToken {
        line,
        token: group.to_string(),
    })?;

    if file_index < 1 {
        return Err(ObjLoadError::IndexOutOfRange {
            face: raw.faces.len(),
            file_index,
            vertex_count: raw.vertices.len(),
        });
    }
    Ok((file_index - 1) as usize)
}

/// Parse through `wavefront_obj`. Every object in the set is appended into a
/// single mesh, with its indices shifted past the vertices already read.
pub fn load_wavefront_from_str<S: AsRef<str>>(input: S) -> Result<RawMesh, ObjLoadError> {
    let triangulated = triangulate_faces(input.as_ref());
    let obj_set = obj::parse(triangulated)?;
    let raw = raw_mesh_from_obj_set(&obj_set);
    raw.check_finite()?;
    raw.check_indices()?;
    Ok(raw)
}

pub fn raw_mesh_from_obj_set(obj_set: &obj::ObjSet) -> RawMesh {
    let mut raw = RawMesh::default();
    for object in &obj_set.objects {
        let base = raw.vertices.len();
        for v in &object.vertices {
            raw.vertices.push(Vector3f::new(v.x as Float, v.y as Float, v.z as Float));
        }
        for vt in &object.tex_vertices {
            raw.tex_coords.push(Vector2f::new(vt.u as Float, vt.v as Float));
        }
        for geom in &object.geometry {
            for shape in &geom.shapes {
                if let obj::Primitive::Triangle(a, b, c) = shape.primitive {
                    raw.faces.push([base + a.0, base + b.0, base + c.0]);
                }
            }
        }
    }
    raw
}

fn triangulate_faces(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + input.len() / 4);
    for line in input.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("f ") || trimmed.starts_with("f\t") {
            let parts: Vec<&str> = strip_comment(trimmed).split_whitespace().collect();
            if parts.len() > 4 {
                let base = parts[1];
                for i in 2..(parts.len() - 1) {
                    out.push_str("f ");
                    out.push_str(base);
                    out.push(' ');
                    out.push_str(parts[i]);
                    out.push(' ');
                    out.push_str(parts[i + 1]);
                    out.push('\n');
                }
                continue;
            }
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const PENTAGON: &str = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.5 1.0 0.0
v 0.5 1.5 0.0
v -0.5 1.0 0.0
f 1 2 3 4 5
";

    #[test]
    fn test_counts_match_source_lines() {
        let input = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
v 0.0 0.0 1.0
f 1 2 3
f 1 3 4
f 1 4 2
";
        let raw = load_obj_from_str(input).expect("failed to parse obj");
        assert_eq!(raw.vertices.len(), 4);
        assert_eq!(raw.faces.len(), 3);
        assert!(raw.tex_coords.is_empty());
        assert_eq!(raw.faces[1], [0, 2, 3]);
    }

    #[test]
    fn test_fan_triangulation_order() {
        let raw = load_obj_from_str(PENTAGON).unwrap();
        assert_eq!(raw.faces, vec![[0, 1, 2], [0, 2, 3], [0, 3, 4]]);
    }

    #[test]
    fn test_sub_indices_and_homogeneous_components_ignored() {
        let input = "\
v 0.0 0.0 0.0 1.0
v 1.0 0.0 0.0 1.0
v 0.0 1.0 0.0 1.0
vt 0.0 0.0 0.0
vt 1.0 0.0
vt 0.0 1.0
vn 0.0 0.0 1.0
f 1/1/1 2/2/1 3//1
";
        let raw = load_obj_from_str(input).unwrap();
        assert_eq!(raw.vertices[1], Vector3f::new(1.0, 0.0, 0.0));
        assert_eq!(raw.tex_coords.len(), 3);
        assert_eq!(raw.tex_coords[1], Vector2f::new(1.0, 0.0));
        assert_eq!(raw.faces, vec![[0, 1, 2]]);
    }

    #[test]
    fn test_comment_truncates_line() {
        let input = "\
# header comment
v 0.0 0.0 0.0
v 1.0 0.0 0.0 # trailing comment
v 0.0 1.0 0.0
v 1.0 1.0 0.0
f 1 2 3# 4
f 2 4 # 3
";
        let raw = load_obj_from_str(input).unwrap();
        assert_eq!(raw.vertices.len(), 4);
        assert_eq!(raw.faces, vec![[0, 1, 2]]);
    }

    #[test]
    fn test_unknown_lines_skipped() {
        let input = "\
mtllib scene.mtl
o Bunny
g body
v 0.0 0.0 0.0
v 1.0 0.0 0.0
usemtl fur
s off
v 0.0 1.0 0.0
f 1 2 3
";
        let raw = load_obj_from_str(input).unwrap();
        assert_eq!(raw.vertices.len(), 3);
        assert_eq!(raw.faces.len(), 1);
    }

    #[test]
    fn test_malformed_token_rejects_file() {
        let input = "\
v 0.0 0.0 0.0
v 1.0 abc 0.0
";
        match load_obj_from_str(input) {
            Err(ObjLoadError::MalformedToken { line, token }) => {
                assert_eq!(line, 2);
                assert_eq!(token, "abc");
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let bad_face = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 x/2 3\n";
        assert!(matches!(load_obj_from_str(bad_face),
                         Err(ObjLoadError::MalformedToken { line: 4, .. })));
    }

    #[test]
    fn test_non_finite_numbers_rejected() {
        for token in &["nan", "inf", "-inf", "infinity", "NaN"] {
            let input = format!("v 0 0 0\nv {} 0 0\nv 0 1 0\nf 1 2 3\n", token);
            match load_obj_from_str(&input) {
                Err(ObjLoadError::MalformedToken { line, token: found }) => {
                    assert_eq!(line, 2);
                    assert_eq!(found, *token);
                }
                other => panic!("unexpected result: {:?}", other),
            }
        }

        assert!(matches!(load_obj_from_str("vt inf 0\n"),
                         Err(ObjLoadError::MalformedToken { line: 1, .. })));
    }

    #[test]
    fn test_check_finite() {
        let mut raw = load_obj_from_str(PENTAGON).unwrap();
        assert!(raw.check_finite().is_ok());
        raw.vertices[3].y = Float::NAN;
        assert!(matches!(raw.check_finite(), Err(ObjLoadError::NonFiniteVertex { vertex: 3 })));
    }

    #[test]
    fn test_missing_component() {
        let input = "v 1.0 2.0\n";
        assert!(matches!(load_obj_from_str(input),
                         Err(ObjLoadError::MissingComponent { line: 1, expected: 3, found: 2, .. })));
    }

    #[test]
    fn test_index_out_of_range() {
        let input = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 4\n";
        match load_obj_from_str(input) {
            Err(ObjLoadError::IndexOutOfRange { face, file_index, vertex_count }) => {
                assert_eq!(face, 0);
                assert_eq!(file_index, 4);
                assert_eq!(vertex_count, 3);
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let zero = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0 1 2\n";
        assert!(matches!(load_obj_from_str(zero),
                         Err(ObjLoadError::IndexOutOfRange { file_index: 0, .. })));
    }

    #[test]
    fn test_short_face_is_skipped() {
        let input = "v 0 0 0\nv 1 0 0\nf 1 2\n";
        let raw = load_obj_from_str(input).unwrap();
        assert!(raw.faces.is_empty());
    }

    #[test]
    fn test_reload_clears_previous_contents() {
        let mut raw = RawMesh::default();
        load_obj_into(PENTAGON, &mut raw).unwrap();
        let first = raw.clone();
        load_obj_into(PENTAGON, &mut raw).unwrap();
        assert_eq!(raw, first);

        assert!(load_obj_into("v 0 0 nope\n", &mut raw).is_err());
        assert!(raw.is_empty());
    }

    #[test]
    fn test_missing_file() {
        let result = load_obj_from_file("/definitely/not/here.obj", ObjParser::Native);
        assert!(matches!(result, Err(ObjLoadError::Io(_))));
    }

    #[test]
    fn test_wavefront_parser_agrees() {
        let native = load_obj_from_str(PENTAGON).unwrap();
        let wavefront = load_wavefront_from_str(PENTAGON).expect("failed to parse obj");
        assert_eq!(wavefront.vertices, native.vertices);
        assert_eq!(wavefront.faces, native.faces);
    }
}

// Copyright @yucwang 2023

use image::io::Reader as ImageReader;
use image::GenericImageView;
use std::fmt;
use std::path::Path;

#[derive(Debug)]
pub enum TextureError {
    Io(std::io::Error),
    Decode(image::ImageError),
    /// Pixel buffer length does not match the stated dimensions.
    BadDimensions { width: u32, height: u32, len: usize },
    /// Cube faces must all share one size.
    MismatchedCubeFace { face: usize, expected: (u32, u32), found: (u32, u32) },
}

impl From<std::io::Error> for TextureError {
    fn from(err: std::io::Error) -> Self {
        TextureError::Io(err)
    }
}

impl From<image::ImageError> for TextureError {
    fn from(err: image::ImageError) -> Self {
        TextureError::Decode(err)
    }
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureError::Io(err) => write!(f, "io error: {}", err),
            TextureError::Decode(err) => write!(f, "decode error: {}", err),
            TextureError::BadDimensions { width, height, len } => {
                write!(f, "{} bytes cannot hold a {}x{} RGBA image", len, width, height)
            }
            TextureError::MismatchedCubeFace { face, expected, found } => {
                write!(f, "cube face {} is {}x{}, expected {}x{}",
                       face, found.0, found.1, expected.0, expected.1)
            }
        }
    }
}

impl std::error::Error for TextureError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterMode {
    Nearest,
    Linear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WrapMode {
    Repeat,
    ClampToEdge,
}

/// Sampling state a renderer applies when it uploads a texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureParams {
    pub wrap: WrapMode,
    pub filter: FilterMode,
}

impl TextureParams {
    /// Tiled model and ground textures.
    pub fn surface() -> Self {
        Self { wrap: WrapMode::Repeat, filter: FilterMode::Nearest }
    }

    /// Skybox faces; clamped so seams do not bleed.
    pub fn cube_face() -> Self {
        Self { wrap: WrapMode::ClampToEdge, filter: FilterMode::Linear }
    }
}

/// Decoded image: width, height and tightly packed RGBA8 rows.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl TextureImage {
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, TextureError> {
        if data.len() != (width as usize) * (height as usize) * 4 {
            return Err(TextureError::BadDimensions { width, height, len: data.len() });
        }
        Ok(Self { width, height, data })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        let path = path.as_ref();
        log::info!("Decoding texture: {}.", path.display());

        let img = ImageReader::open(path)?
            .with_guessed_format()?
            .decode()?;
        let (width, height) = img.dimensions();
        let rgba = img.to_rgba8();

        log::debug!("Texture {} decoded, width = {}, height = {}.", path.display(), width, height);
        Self::from_rgba(width, height, rgba.into_raw())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Loads six cube faces in +x, -x, +y, -y, +z, -z order.
pub fn load_cube_map<P: AsRef<Path>>(faces: &[P; 6]) -> Result<Vec<TextureImage>, TextureError> {
    let mut images: Vec<TextureImage> = Vec::with_capacity(6);
    for (face, path) in faces.iter().enumerate() {
        let image = TextureImage::from_file(path)?;
        if let Some(first) = images.first() {
            if first.dimensions() != image.dimensions() {
                return Err(TextureError::MismatchedCubeFace {
                    face,
                    expected: first.dimensions(),
                    found: image.dimensions(),
                });
            }
        }
        images.push(image);
    }
    Ok(images)
}

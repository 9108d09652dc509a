use std::path::Path;

use crate::error::AssetError;

/// Pixel format of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    Rgba8,
}

impl TextureFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8 => 4,
        }
    }
}

/// A 2D texture with raw pixel data.
#[derive(Debug, Clone)]
pub struct Texture2D {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub data: Vec<u8>,
}

impl Texture2D {
    /// A texture filled with one RGBA8 color.
    pub fn solid(name: impl Into<String>, width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = width as usize * height as usize;
        Self {
            name: name.into(),
            width,
            height,
            format: TextureFormat::Rgba8,
            data: rgba.repeat(pixels),
        }
    }
}

/// Decode an image file into an RGBA8 texture named after the file stem.
pub fn load_texture(path: &Path) -> Result<Texture2D, AssetError> {
    let img = image::open(path)
        .map_err(|e| AssetError::ImageLoadFailed(path.to_path_buf(), e.to_string()))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(Texture2D {
        name,
        width,
        height,
        format: TextureFormat::Rgba8,
        data: rgba.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_png_as_rgba8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checker.png");
        let mut img = image::RgbImage::new(2, 3);
        img.put_pixel(1, 2, image::Rgb([255, 0, 0]));
        img.save(&path).unwrap();

        let texture = load_texture(&path).unwrap();
        assert_eq!(texture.name, "checker");
        assert_eq!((texture.width, texture.height), (2, 3));
        assert_eq!(texture.data.len(), 2 * 3 * texture.format.bytes_per_pixel());
        assert_eq!(&texture.data[20..24], &[255, 0, 0, 255]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = load_texture(Path::new("/nonexistent/texture.png"));
        assert!(matches!(result, Err(AssetError::ImageLoadFailed(..))));
    }
}

//! Texture images

use crate::error::IoError;
use std::path::Path;

/// A decoded texture in tightly packed RGBA8
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    /// Whether rows should be flipped on upload
    pub flip_y: bool,
}

impl TextureImage {
    /// Decode an image file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, IoError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(IoError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let rgba = image::open(path)?.to_rgba8();
        Ok(Self {
            width: rgba.width(),
            height: rgba.height(),
            pixels: rgba.into_raw(),
            // Scan textures are authored top-down
            flip_y: false,
        })
    }

    /// Decode an in-memory encoded image
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IoError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        Ok(Self {
            width: rgba.width(),
            height: rgba.height(),
            pixels: rgba.into_raw(),
            flip_y: false,
        })
    }

    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_png_from_memory() {
        let mut img = image::RgbaImage::new(2, 3);
        img.put_pixel(1, 2, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageOutputFormat::Png,
        )
        .unwrap();

        let texture = TextureImage::from_bytes(&bytes).unwrap();
        assert_eq!((texture.width, texture.height), (2, 3));
        assert_eq!(texture.pixel_count(), 6);
        assert_eq!(&texture.pixels[(2 * 2 + 1) * 4..(2 * 2 + 1) * 4 + 4], &[10, 20, 30, 255]);
        assert!(!texture.flip_y);
    }

    #[test]
    fn test_missing_texture() {
        let result = TextureImage::open("no/such/texture.jpg");
        assert!(matches!(result, Err(IoError::FileNotFound { .. })));
    }

    #[test]
    fn test_undecodable_bytes() {
        assert!(matches!(
            TextureImage::from_bytes(b"definitely not an image"),
            Err(IoError::Image(_))
        ));
    }
}

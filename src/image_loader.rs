// Image loading module
// Decodes an image file into a flat RGBA buffer

use image::DynamicImage;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Loaded image data ready for display
#[derive(Debug, Clone)]
pub struct ImageData {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Channel count of the source file (the buffer is always RGBA)
    pub channels: u8,
    /// Raw RGBA pixel data (4 bytes per pixel, row-major)
    pub rgba_data: Vec<u8>,
}

/// Reasons an image could not be loaded
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read image file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unrecognized image format in {}: {source}", .path.display())]
    UnknownFormat {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl ImageData {
    /// RGBA value of the pixel at `(x, y)`
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y as usize * self.width as usize) + x as usize) * 4;
        [
            self.rgba_data[idx],
            self.rgba_data[idx + 1],
            self.rgba_data[idx + 2],
            self.rgba_data[idx + 3],
        ]
    }
}

impl From<DynamicImage> for ImageData {
    fn from(img: DynamicImage) -> Self {
        let channels = img.color().channel_count();
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        Self {
            width,
            height,
            channels,
            rgba_data: rgba.into_raw(),
        }
    }
}

/// Load an image file and normalize it to RGBA
pub fn load_image(path: &Path) -> Result<ImageData, LoadError> {
    let data = fs::read(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    load_from_bytes(path, &data).map(ImageData::from)
}

/// Load an image from raw bytes, auto-detecting the format
fn load_from_bytes(path: &Path, data: &[u8]) -> Result<DynamicImage, LoadError> {
    let format = image::guess_format(data).map_err(|source| LoadError::UnknownFormat {
        path: path.to_path_buf(),
        source,
    })?;

    image::load(Cursor::new(data), format).map_err(|source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

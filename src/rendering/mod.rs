//! Rendering: element layout, display list and rasterization

pub mod layout;
pub mod paint;
pub mod raster;

pub use raster::{BoxRasterizer, Rasterizer};

use image::{Rgba, RgbaImage};
use sha2::{Digest, Sha256};

/// An RGBA8 pixel buffer produced by a rasterizer.
///
/// Bitmaps are transient: one is produced per export call and dropped once
/// it has been encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    pixels: RgbaImage,
}

impl Bitmap {
    /// A bitmap of the given size filled with `fill`
    pub fn new(width: u32, height: u32, fill: [u8; 4]) -> Self {
        Self { pixels: RgbaImage::from_pixel(width, height, Rgba(fill)) }
    }

    pub fn from_image(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels.get_pixel(x, y).0
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }

    /// Hex SHA-256 over the dimensions and raw pixels; equal bitmaps share it
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.width().to_be_bytes());
        hasher.update(self.height().to_be_bytes());
        hasher.update(self.pixels.as_raw());
        hex::encode(hasher.finalize())
    }
}

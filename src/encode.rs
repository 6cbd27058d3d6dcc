//! Bitmap encoding to PNG/JPEG and the `data:` URL string form

use std::fmt;
use std::str::FromStr;

use base64::Engine as Base64Engine;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};

use crate::rendering::Bitmap;
use crate::{Error, ExportConfig, Result};

/// Raster formats an element can be downloaded as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    #[serde(rename = "jpg", alias = "jpeg")]
    Jpeg,
}

impl ImageFormat {
    /// File extension without the dot; doubles as the format tag
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ImageFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
            other => Err(Error::ConfigError(format!("unsupported image format `{}` (expected png or jpg)", other))),
        }
    }
}

/// An encoded image tagged with its format
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl EncodedImage {
    /// Format tag, e.g. `"png"` or `"jpg"`
    pub fn tag(&self) -> &'static str {
        self.format.extension()
    }

    /// `data:<mime>;base64,<payload>`
    pub fn data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime_type(),
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

/// Encode `bitmap` in `format`.
///
/// JPEG has no alpha channel, so translucent pixels are flattened onto
/// `config.background` first.
pub fn encode(bitmap: &Bitmap, format: ImageFormat, config: &ExportConfig) -> Result<EncodedImage> {
    let bytes = match format {
        ImageFormat::Png => encode_png(bitmap)?,
        ImageFormat::Jpeg => encode_jpeg(bitmap, config.jpeg_quality, config.background)?,
    };
    log::debug!("encoded {}x{} bitmap as {} ({} bytes)", bitmap.width(), bitmap.height(), format, bytes.len());
    Ok(EncodedImage {
        format,
        width: bitmap.width(),
        height: bitmap.height(),
        bytes,
    })
}

pub fn encode_png(bitmap: &Bitmap) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf).write_image(
        bitmap.as_image().as_raw(),
        bitmap.width(),
        bitmap.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(buf)
}

pub fn encode_jpeg(bitmap: &Bitmap, quality: u8, background: [u8; 4]) -> Result<Vec<u8>> {
    if !(1..=100).contains(&quality) {
        return Err(Error::EncodeError(format!("JPEG quality {} out of range", quality)));
    }
    let rgb = flatten(bitmap, background);
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality).write_image(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(buf)
}

/// Composite every pixel over an opaque version of `background`
pub fn flatten(bitmap: &Bitmap, background: [u8; 4]) -> RgbImage {
    let img = bitmap.as_image();
    RgbImage::from_fn(img.width(), img.height(), |x, y| {
        let [r, g, b, a] = img.get_pixel(x, y).0;
        let a = a as u32;
        let mix = |c: u8, bg: u8| ((c as u32 * a + bg as u32 * (255 - a) + 127) / 255) as u8;
        image::Rgb([mix(r, background[0]), mix(g, background[1]), mix(b, background[2])])
    })
}

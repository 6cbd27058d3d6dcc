/// Clipboard image payloads and the system clipboard writer

use crate::{Error, Result};

/// A PNG-typed clipboard payload
#[derive(Debug, Clone, PartialEq)]
pub struct ClipboardImage {
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
    /// PNG-encoded image
    pub data: Vec<u8>,
}

impl ClipboardImage {
    pub fn png(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self { mime_type: "image/png", width, height, data }
    }

    /// Decode the payload to straight RGBA8 rows
    pub fn to_rgba(&self) -> Result<image::RgbaImage> {
        let decoded = image::load_from_memory_with_format(&self.data, image::ImageFormat::Png)?;
        Ok(decoded.to_rgba8())
    }
}

#[cfg(feature = "clipboard")]
pub(crate) fn write_system_clipboard(image: &ClipboardImage) -> Result<()> {
    use std::borrow::Cow;

    let rgba = image.to_rgba()?;
    let mut clipboard = arboard::Clipboard::new().map_err(|e| Error::ClipboardError(format!("access: {}", e)))?;
    clipboard.set_image(arboard::ImageData {
        width: rgba.width() as usize,
        height: rgba.height() as usize,
        bytes: Cow::Borrowed(rgba.as_raw()),
    })?;
    log::debug!("wrote {}x{} image to the system clipboard", image.width, image.height);
    Ok(())
}

#[cfg(not(feature = "clipboard"))]
pub(crate) fn write_system_clipboard(_image: &ClipboardImage) -> Result<()> {
    Err(Error::ClipboardError("built without the `clipboard` feature".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode_png;
    use crate::rendering::Bitmap;

    #[test]
    fn png_payload_decodes_back() {
        let bitmap = Bitmap::new(3, 2, [1, 2, 3, 255]);
        let payload = ClipboardImage::png(3, 2, encode_png(&bitmap).unwrap());
        assert_eq!(payload.mime_type, "image/png");
        let rgba = payload.to_rgba().unwrap();
        assert_eq!(rgba.dimensions(), (3, 2));
        assert_eq!(rgba.get_pixel(2, 1).0, [1, 2, 3, 255]);
    }
}

//! elemshot
//!
//! Capture a rendered HTML element as a raster image and hand it to the
//! clipboard, to an image download (PNG/JPEG), or to a single-page PDF.
//!
//! # Features
//!
//! - **clipboard** (default): system clipboard support through `arboard`
//! - **fetch**: load documents over HTTP(S)
//! - **Swappable collaborators**: the rasterizer and the output platform
//!   are traits, so tests and embedders can supply their own
//!
//! # Example
//!
//! ```no_run
//! use elemshot::{Document, ExportConfig, Exporter, ImageFormat};
//!
//! # async fn run() -> elemshot::Result<()> {
//! let doc = Document::from_html("<div id=\"card\" style=\"background: #369\">Hi</div>");
//! let card = doc.element("#card")?;
//!
//! let exporter = Exporter::desktop(ExportConfig::default())?;
//! exporter.download_as_image(&card, Some("card"), Some(ImageFormat::Jpeg)).await?;
//! exporter.download_as_pdf(&card, None).await?;
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

pub mod error;
pub use error::{Error, Result};

pub mod dom;
pub mod encode;
pub mod export;
pub mod pdf;
pub mod platform;
pub mod rendering;

pub use dom::{Document, Element};
pub use encode::{EncodedImage, ImageFormat};
pub use export::{copy_to_clipboard, download_as_image, download_as_pdf, Exporter};
pub use platform::{ClipboardImage, Delivery, DesktopPlatform, Platform};
pub use rendering::{Bitmap, BoxRasterizer, Rasterizer};

/// A4 width in PDF points (210 mm)
pub const A4_WIDTH_PT: f32 = 595.2756;
/// A4 height in PDF points (297 mm)
pub const A4_HEIGHT_PT: f32 = 841.8898;

/// Configuration shared by the rasterizer, encoders and output sinks
///
/// The defaults mirror what a browser produces for an element snapshot:
/// an opaque white canvas at device scale 1, JPEG quality 92 and an A4
/// page width for PDFs.
///
/// # Examples
///
/// ```
/// let cfg = elemshot::ExportConfig::default();
/// assert_eq!(cfg.default_filename, "image");
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Layout viewport; the width constrains block layout, the height caps it
    pub viewport: Viewport,
    /// Device pixel ratio applied to the bitmap
    pub scale: f32,
    /// Canvas fill colour (RGBA), also used to flatten JPEG output
    pub background: [u8; 4],
    /// Quality for JPEG output (1..=100)
    pub jpeg_quality: u8,
    /// PDF page width in points
    pub pdf_page_width_pt: f32,
    /// PDF page height in points, used by `PdfPageFit::StandardPage`
    pub pdf_page_height_pt: f32,
    /// How the PDF page height is chosen
    pub pdf_page_fit: PdfPageFit,
    /// Base filename used when the caller provides none
    pub default_filename: String,
    /// Directory downloads are written to; `None` disables downloads
    pub download_dir: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            scale: 1.0,
            background: [255, 255, 255, 255],
            jpeg_quality: 92,
            pdf_page_width_pt: A4_WIDTH_PT,
            pdf_page_height_pt: A4_HEIGHT_PT,
            pdf_page_fit: PdfPageFit::ScaledHeight,
            default_filename: "image".to_string(),
            download_dir: std::env::current_dir().ok(),
        }
    }
}

impl ExportConfig {
    /// Check the configuration for values no export can work with
    pub fn validate(&self) -> Result<()> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(Error::ConfigError(format!("scale must be positive, got {}", self.scale)));
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(Error::ConfigError("viewport must not be empty".into()));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(Error::ConfigError(format!(
                "jpeg_quality must be within 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        if !(self.pdf_page_width_pt.is_finite() && self.pdf_page_width_pt > 0.0) {
            return Err(Error::ConfigError("pdf_page_width_pt must be positive".into()));
        }
        if self.pdf_page_fit == PdfPageFit::StandardPage
            && !(self.pdf_page_height_pt.is_finite() && self.pdf_page_height_pt > 0.0)
        {
            return Err(Error::ConfigError("pdf_page_height_pt must be positive".into()));
        }
        if self.default_filename.trim().is_empty() {
            return Err(Error::ConfigError("default_filename must not be empty".into()));
        }
        Ok(())
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Page sizing policy for PDF export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PdfPageFit {
    /// Page height is the image height scaled to the page width
    #[default]
    ScaledHeight,
    /// Keep the standard page height and place the image at the top
    StandardPage,
}

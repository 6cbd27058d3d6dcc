//! The three export operations.
//!
//! Each operation is independent: it rasterizes and encodes the element on
//! blocking workers, awaits the result, then performs its platform calls in
//! order.
//! Nothing is cached between calls and errors are returned to the caller
//! untouched.

use std::sync::Arc;

use crate::dom::Element;
use crate::encode::{encode, encode_png, ImageFormat};
use crate::pdf::PdfComposer;
use crate::platform::{sanitize_filename, ClipboardImage, Delivery, DesktopPlatform, Platform};
use crate::rendering::{Bitmap, BoxRasterizer, Rasterizer};
use crate::{ExportConfig, Result};

/// Runs exports against a rasterizer and a platform
#[derive(Clone)]
pub struct Exporter {
    config: ExportConfig,
    rasterizer: Arc<dyn Rasterizer>,
    platform: Arc<dyn Platform>,
}

impl Exporter {
    pub fn new(config: ExportConfig, rasterizer: Arc<dyn Rasterizer>, platform: Arc<dyn Platform>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, rasterizer, platform })
    }

    /// Built-in rasterizer, system clipboard and `config.download_dir`
    pub fn desktop(config: ExportConfig) -> Result<Self> {
        let platform = DesktopPlatform::new(config.download_dir.clone());
        Self::new(config, Arc::new(BoxRasterizer::new()), Arc::new(platform))
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    async fn rasterize(&self, element: &Element) -> Result<Bitmap> {
        let rasterizer = Arc::clone(&self.rasterizer);
        let element = element.clone();
        let config = self.config.clone();
        off_thread(move || rasterizer.rasterize(&element, &config)).await
    }

    /// Rasterize `element` and put it on the clipboard as a PNG image.
    pub async fn copy_to_clipboard(&self, element: &Element) -> Result<Delivery> {
        let bitmap = self.rasterize(element).await?;
        let (width, height) = (bitmap.width(), bitmap.height());
        let png = off_thread(move || encode_png(&bitmap)).await?;

        self.platform.write_clipboard_image(&ClipboardImage::png(width, height, png))?;
        Ok(Delivery::Clipboard { width, height })
    }

    /// Rasterize `element` and download it as `<filename>.<png|jpg>`.
    ///
    /// `filename` defaults to `config.default_filename`, `format` to PNG.
    /// When the platform cannot download, the image is opened in a new
    /// viewing context instead.
    pub async fn download_as_image(
        &self,
        element: &Element,
        filename: Option<&str>,
        format: Option<ImageFormat>,
    ) -> Result<Delivery> {
        let format = format.unwrap_or_default();
        let name = format!(
            "{}.{}",
            sanitize_filename(filename, &self.config.default_filename),
            format.extension()
        );

        let bitmap = self.rasterize(element).await?;
        let config = self.config.clone();
        let encoded = off_thread(move || encode(&bitmap, format, &config)).await?;

        if self.platform.supports_download() {
            let path = self.platform.download(&name, &encoded.bytes)?;
            Ok(Delivery::Saved { path })
        } else {
            log::warn!("downloads unavailable, opening {} in a viewer instead", name);
            let path = self.platform.open_in_new_context(&encoded, &name)?;
            Ok(Delivery::Opened { path })
        }
    }

    /// Rasterize `element` onto a single PDF page and download it as
    /// `<filename>.pdf`.
    pub async fn download_as_pdf(&self, element: &Element, filename: Option<&str>) -> Result<Delivery> {
        let name = format!("{}.pdf", sanitize_filename(filename, &self.config.default_filename));

        let bitmap = self.rasterize(element).await?;
        let mut composer = PdfComposer::new(&self.config);
        let (geometry, bytes) = off_thread(move || {
            let geometry = composer.place_image(bitmap)?;
            Ok((geometry, composer.save()?))
        })
        .await?;
        log::debug!(
            "pdf page {:.2}x{:.2}pt for `{}`",
            geometry.page_width,
            geometry.page_height,
            element.selector()
        );

        let path = self.platform.download(&name, &bytes)?;
        Ok(Delivery::Saved { path })
    }
}

/// Run CPU-bound work (layout, pixel fills, compression) on the blocking pool
async fn off_thread<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}

/// Copy `element` to the system clipboard with the default configuration
pub async fn copy_to_clipboard(element: &Element) -> Result<Delivery> {
    Exporter::desktop(ExportConfig::default())?.copy_to_clipboard(element).await
}

/// Download `element` into the current directory with the default configuration
pub async fn download_as_image(
    element: &Element,
    filename: Option<&str>,
    format: Option<ImageFormat>,
) -> Result<Delivery> {
    Exporter::desktop(ExportConfig::default())?
        .download_as_image(element, filename, format)
        .await
}

/// Download `element` as a PDF into the current directory with the default configuration
pub async fn download_as_pdf(element: &Element, filename: Option<&str>) -> Result<Delivery> {
    Exporter::desktop(ExportConfig::default())?.download_as_pdf(element, filename).await
}

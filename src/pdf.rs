//! Single-page PDF composition
//!
//! The page is as wide as the configured standard page (A4 by default). Its
//! height either follows the image's aspect ratio or stays at the standard
//! page height, depending on `PdfPageFit`. The image is embedded as a JPEG
//! XObject and drawn across the full page width from the top edge.

use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref, TextStr};

use crate::encode::encode_jpeg;
use crate::rendering::Bitmap;
use crate::{Error, ExportConfig, PdfPageFit, Result};

const PDF_IMAGE_QUALITY: u8 = 95;

/// Page size and image placement, in PDF points (origin bottom-left)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub page_width: f64,
    pub page_height: f64,
    pub image_x: f64,
    pub image_y: f64,
    pub image_width: f64,
    pub image_height: f64,
}

/// Height of an image scaled to `page_width` with its aspect ratio kept:
/// `page_width * image_height / image_width`.
pub fn scaled_height(page_width: f64, image_width: u32, image_height: u32) -> Result<f64> {
    if image_width == 0 || image_height == 0 {
        return Err(Error::PdfError(format!("image has no area ({}x{})", image_width, image_height)));
    }
    Ok(page_width * image_height as f64 / image_width as f64)
}

/// Builds a one-page document holding one image
pub struct PdfComposer {
    page_width: f64,
    standard_height: f64,
    fit: PdfPageFit,
    background: [u8; 4],
    placed: Option<(PageGeometry, Bitmap)>,
}

impl PdfComposer {
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            page_width: config.pdf_page_width_pt as f64,
            standard_height: config.pdf_page_height_pt as f64,
            fit: config.pdf_page_fit,
            background: config.background,
            placed: None,
        }
    }

    pub fn page_width(&self) -> f64 {
        self.page_width
    }

    /// Current page height; before an image is placed this is the standard height
    pub fn page_height(&self) -> f64 {
        self.placed
            .as_ref()
            .map(|(g, _)| g.page_height)
            .unwrap_or(self.standard_height)
    }

    /// Geometry the page would get for an image of the given pixel size
    pub fn geometry_for(&self, image_width: u32, image_height: u32) -> Result<PageGeometry> {
        let image_height_pt = scaled_height(self.page_width, image_width, image_height)?;
        let page_height = match self.fit {
            PdfPageFit::ScaledHeight => image_height_pt,
            PdfPageFit::StandardPage => self.standard_height,
        };
        Ok(PageGeometry {
            page_width: self.page_width,
            page_height,
            image_x: 0.0,
            image_y: page_height - image_height_pt,
            image_width: self.page_width,
            image_height: image_height_pt,
        })
    }

    /// Place `bitmap` on the page, replacing any earlier image
    pub fn place_image(&mut self, bitmap: Bitmap) -> Result<PageGeometry> {
        let geometry = self.geometry_for(bitmap.width(), bitmap.height())?;
        self.placed = Some((geometry, bitmap));
        Ok(geometry)
    }

    /// Serialize the document
    pub fn save(self) -> Result<Vec<u8>> {
        let (geometry, bitmap) = self
            .placed
            .ok_or_else(|| Error::PdfError("no image placed on the page".into()))?;
        let jpeg = encode_jpeg(&bitmap, PDF_IMAGE_QUALITY, self.background)?;

        let catalog_id = Ref::new(1);
        let page_tree_id = Ref::new(2);
        let page_id = Ref::new(3);
        let image_id = Ref::new(4);
        let content_id = Ref::new(5);
        let info_id = Ref::new(6);
        let image_name = Name(b"Im1");

        let mut pdf = Pdf::new();
        pdf.catalog(catalog_id).pages(page_tree_id);
        pdf.pages(page_tree_id).kids([page_id]).count(1);

        let mut page = pdf.page(page_id);
        page.media_box(Rect::new(
            0.0,
            0.0,
            geometry.page_width as f32,
            geometry.page_height as f32,
        ));
        page.parent(page_tree_id);
        page.contents(content_id);
        let mut resources = page.resources();
        resources.x_objects().pair(image_name, image_id);
        resources.finish();
        page.finish();

        let mut image = pdf.image_xobject(image_id, &jpeg);
        image.filter(Filter::DctDecode);
        image.width(bitmap.width() as i32);
        image.height(bitmap.height() as i32);
        image.color_space().device_rgb();
        image.bits_per_component(8);
        image.finish();

        let mut content = Content::new();
        content.save_state();
        content.transform([
            geometry.image_width as f32,
            0.0,
            0.0,
            geometry.image_height as f32,
            geometry.image_x as f32,
            geometry.image_y as f32,
        ]);
        content.x_object(image_name);
        content.restore_state();
        pdf.stream(content_id, &content.finish());

        pdf.document_info(info_id).producer(TextStr("elemshot"));

        Ok(pdf.finish())
    }
}

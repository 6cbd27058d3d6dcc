/// Rasterizer seam and the built-in box rasterizer

use crate::dom::Element;
use crate::rendering::layout::{layout_element, Rgba, CHAR_WIDTH, LINE_HEIGHT};
use crate::rendering::paint::{build_display_list, PaintCommand};
use crate::rendering::Bitmap;
use crate::{Error, ExportConfig, Result};
use image::RgbaImage;
use tiny_skia::{Color, Paint, Pixmap, Transform};

/// Largest bitmap side the built-in rasterizer will allocate
pub const MAX_DIMENSION: u32 = 16384;

/// Turns an element into pixels.
///
/// Implementations run on a blocking worker thread, hence `Send + Sync`.
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, element: &Element, config: &ExportConfig) -> Result<Bitmap>;
}

/// Lays out the element's subtree as boxes and fills them.
///
/// Text is drawn as one solid cell per glyph rather than shaped glyphs;
/// geometry and colours follow the element's inline styles.
#[derive(Debug, Default, Clone, Copy)]
pub struct BoxRasterizer;

impl BoxRasterizer {
    pub fn new() -> Self {
        BoxRasterizer
    }
}

impl Rasterizer for BoxRasterizer {
    fn rasterize(&self, element: &Element, config: &ExportConfig) -> Result<Bitmap> {
        config.validate()?;
        let root = element.with_resolved(|el| layout_element(el, config.viewport))?;
        let width = scaled_len(root.rect.width, config.scale);
        let height = scaled_len(root.rect.height, config.scale);
        if width == 0 || height == 0 {
            return Err(Error::RenderError(format!(
                "element `{}` has no area ({}x{})",
                element.selector(),
                root.rect.width,
                root.rect.height
            )));
        }
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(Error::RenderError(format!(
                "bitmap of {}x{} exceeds the {}px limit",
                width, height, MAX_DIMENSION
            )));
        }

        let commands = build_display_list(&root);
        let bitmap = paint_commands(&commands, width, height, config.scale, config.background)?;
        log::debug!(
            "rasterized `{}`[{}] to {}x{} ({} commands)",
            element.selector(),
            element.index(),
            width,
            height,
            commands.len()
        );
        Ok(bitmap)
    }
}

fn scaled_len(len: u32, scale: f32) -> u32 {
    (len as f32 * scale).ceil() as u32
}

/// Execute a display list onto a fresh bitmap filled with `background`.
///
/// Fills are non-antialiased so that integer boxes land on whole pixels and
/// output is reproducible across runs.
pub fn paint_commands(
    commands: &[PaintCommand],
    width: u32,
    height: u32,
    scale: f32,
    background: Rgba,
) -> Result<Bitmap> {
    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| Error::RenderError(format!("cannot allocate a {}x{} canvas", width, height)))?;
    let [r, g, b, a] = background;
    pixmap.fill(Color::from_rgba8(r, g, b, a));

    for cmd in commands {
        match cmd {
            PaintCommand::SolidRect { x, y, width, height, rgba } => {
                fill_rect(&mut pixmap, scale, *x, *y, *width, *height, *rgba);
            }
            PaintCommand::Text { x, y, text, scale: text_scale, rgba } => {
                let s = (*text_scale).max(1);
                let cell = (CHAR_WIDTH * s) as i32;
                for (i, ch) in text.chars().enumerate() {
                    if ch.is_whitespace() {
                        continue;
                    }
                    let gx = x.saturating_add((i as i32).saturating_mul(cell)).saturating_add(s as i32);
                    let gy = y.saturating_add(2 * s as i32);
                    fill_rect(&mut pixmap, scale, gx, gy, (CHAR_WIDTH - 2) * s, (LINE_HEIGHT - 4) * s, *rgba);
                }
            }
        }
    }

    Ok(Bitmap::from_image(into_straight_alpha(&pixmap)))
}

fn fill_rect(pixmap: &mut Pixmap, scale: f32, x: i32, y: i32, width: u32, height: u32, rgba: Rgba) {
    if rgba[3] == 0 || width == 0 || height == 0 {
        return;
    }
    let Some(rect) = tiny_skia::Rect::from_xywh(
        x as f32 * scale,
        y as f32 * scale,
        width as f32 * scale,
        height as f32 * scale,
    ) else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color_rgba8(rgba[0], rgba[1], rgba[2], rgba[3]);
    paint.anti_alias = false;
    pixmap.fill_rect(rect, &paint, Transform::identity(), None);
}

/// tiny-skia keeps premultiplied pixels; `Bitmap` holds straight alpha
fn into_straight_alpha(pixmap: &Pixmap) -> RgbaImage {
    let mut raw = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        raw.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), raw)
        .unwrap_or_else(|| RgbaImage::new(pixmap.width(), pixmap.height()))
}

/// Block layout for a single element subtree
///
/// Stacks block-level children vertically, gathers inline content into
/// wrapped text runs, and reads a small subset of inline `style`
/// declarations (colours, box sizes, uniform margin/padding/border).

use crate::rendering::raster::MAX_DIMENSION;
use crate::Viewport;
use scraper::{ElementRef, Node};

/// Width of one glyph cell at text scale 1, in CSS pixels
pub const CHAR_WIDTH: u32 = 8;
/// Height of one text line at text scale 1, in CSS pixels
pub const LINE_HEIGHT: u32 = 10;

const DEFAULT_IMAGE_SIZE: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoxModel {
    pub margin: u32,
    pub border: u32,
    pub padding: u32,
}

/// RGBA colour
pub type Rgba = [u8; 4];

/// Resolved presentation of one box
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStyle {
    pub box_model: BoxModel,
    pub background: Option<Rgba>,
    pub border_color: Rgba,
    pub color: Rgba,
    pub text_scale: u32,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub hidden: bool,
}

impl Default for BoxStyle {
    fn default() -> Self {
        Self {
            box_model: BoxModel::default(),
            background: None,
            border_color: [0, 0, 0, 255],
            color: [0, 0, 0, 255],
            text_scale: 1,
            width: None,
            height: None,
            hidden: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Block,
    Text { lines: Vec<String> },
    Image { alt: String },
}

/// A positioned box. `rect` is the border box relative to the captured
/// element's top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub rect: Rect,
    pub style: BoxStyle,
    pub kind: NodeKind,
    pub children: Vec<LayoutNode>,
}

impl LayoutNode {
    pub fn content_width(&self) -> u32 {
        let inset = 2 * (self.style.box_model.border + self.style.box_model.padding);
        self.rect.width.saturating_sub(inset)
    }
}

/// Lay out `element` as the root of a capture.
///
/// The root's own margin is not part of the capture, so its border box
/// starts at (0, 0).
pub fn layout_element(element: ElementRef<'_>, viewport: Viewport) -> LayoutNode {
    let mut style = element_style(element, viewport.width, viewport);
    style.box_model.margin = 0;
    style.hidden = false;
    layout_block(element, style, 0, 0, viewport.width, viewport)
}

fn layout_block(
    element: ElementRef<'_>,
    style: BoxStyle,
    x: i32,
    y: i32,
    available: u32,
    viewport: Viewport,
) -> LayoutNode {
    let m = style.box_model;
    let insets = edge_insets(m);
    let width = style
        .width
        .map(|w| w.saturating_add(insets))
        .unwrap_or_else(|| available.saturating_sub(m.margin.saturating_mul(2)));
    let rect_x = offset(x, m.margin);
    let rect_y = offset(y, m.margin);
    let content_x = offset(rect_x, m.border.saturating_add(m.padding));
    let content_top = offset(rect_y, m.border.saturating_add(m.padding));
    let content_width = width.saturating_sub(insets);

    let mut children = Vec::new();
    let mut cursor = content_top;
    let mut run = String::new();

    for child in element.children() {
        match child.value() {
            Node::Text(text) => push_text(&mut run, text),
            Node::Element(_) => {
                let Some(child_el) = ElementRef::wrap(child) else { continue };
                let name = child_el.value().name();
                if is_skipped(name) {
                    continue;
                }
                if name == "br" {
                    run.push('\n');
                    continue;
                }
                let child_style = element_style(child_el, content_width, viewport);
                if child_style.hidden {
                    continue;
                }
                if name == "img" {
                    flush_run(&mut run, &mut children, &mut cursor, content_x, content_width, &style);
                    let node = image_box(child_el, child_style, content_x, cursor, content_width);
                    cursor = offset(cursor, outer_height(&node));
                    children.push(node);
                } else if is_block(name) {
                    flush_run(&mut run, &mut children, &mut cursor, content_x, content_width, &style);
                    let node = layout_block(child_el, child_style, content_x, cursor, content_width, viewport);
                    cursor = offset(cursor, outer_height(&node));
                    children.push(node);
                } else {
                    push_inline_text(child_el, &mut run);
                }
            }
            _ => {}
        }
    }
    flush_run(&mut run, &mut children, &mut cursor, content_x, content_width, &style);

    let content_height = (cursor as i64 - content_top as i64).clamp(0, u32::MAX as i64) as u32;
    let height = style
        .height
        .unwrap_or(content_height)
        .saturating_add(insets);

    LayoutNode {
        rect: Rect { x: rect_x, y: rect_y, width, height },
        style,
        kind: NodeKind::Block,
        children,
    }
}

/// Border plus padding on both sides
fn edge_insets(m: BoxModel) -> u32 {
    m.border.saturating_add(m.padding).saturating_mul(2)
}

/// `base + by`, saturating at `i32::MAX`
fn offset(base: i32, by: u32) -> i32 {
    base.saturating_add(by.min(i32::MAX as u32) as i32)
}

fn outer_height(node: &LayoutNode) -> u32 {
    node.rect
        .height
        .saturating_add(node.style.box_model.margin.saturating_mul(2))
}

fn image_box(element: ElementRef<'_>, style: BoxStyle, x: i32, y: i32, available: u32) -> LayoutNode {
    let attr_px = |name: &str| {
        element
            .value()
            .attr(name)
            .and_then(|v| v.trim().parse::<u32>().ok())
            .map(|v| v.min(MAX_DIMENSION))
    };
    let width = style.width.or_else(|| attr_px("width")).unwrap_or(DEFAULT_IMAGE_SIZE).min(available.max(1));
    let height = style.height.or_else(|| attr_px("height")).unwrap_or(DEFAULT_IMAGE_SIZE);
    let m = style.box_model;
    LayoutNode {
        rect: Rect {
            x: offset(x, m.margin),
            y: offset(y, m.margin),
            width,
            height,
        },
        kind: NodeKind::Image {
            alt: element.value().attr("alt").unwrap_or_default().to_string(),
        },
        style,
        children: Vec::new(),
    }
}

fn flush_run(
    run: &mut String,
    children: &mut Vec<LayoutNode>,
    cursor: &mut i32,
    x: i32,
    width: u32,
    parent: &BoxStyle,
) {
    let text = std::mem::take(run);
    if text.trim().is_empty() {
        return;
    }
    let scale = parent.text_scale.max(1);
    let lines = wrap_text(&text, width, scale);
    if lines.is_empty() {
        return;
    }
    let height = (lines.len() as u32).saturating_mul(LINE_HEIGHT * scale);
    children.push(LayoutNode {
        rect: Rect { x, y: *cursor, width, height },
        style: BoxStyle {
            color: parent.color,
            text_scale: scale,
            ..BoxStyle::default()
        },
        kind: NodeKind::Text { lines },
        children: Vec::new(),
    });
    *cursor = offset(*cursor, height);
}

/// Greedy word wrap into lines that fit `width` pixels.
///
/// Explicit newlines (from `<br>`) always break. Words longer than a line
/// are split.
pub fn wrap_text(text: &str, width: u32, scale: u32) -> Vec<String> {
    let cell = CHAR_WIDTH * scale.max(1);
    let per_line = ((width / cell) as usize).max(1);
    let mut lines = Vec::new();

    for segment in text.split('\n') {
        let mut cur = String::new();
        for word in segment.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > per_line {
                if !cur.is_empty() {
                    lines.push(std::mem::take(&mut cur));
                }
                let rest = word.split_off(per_line);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            let cur_len = cur.chars().count();
            if !cur.is_empty() && cur_len + 1 + word.len() > per_line {
                lines.push(std::mem::take(&mut cur));
            }
            if !cur.is_empty() {
                cur.push(' ');
            }
            cur.extend(word);
        }
        if !cur.is_empty() {
            lines.push(cur);
        }
    }
    lines
}

fn push_text(run: &mut String, text: &str) {
    if text.trim().is_empty() {
        if !run.is_empty() && !run.ends_with(char::is_whitespace) {
            run.push(' ');
        }
        return;
    }
    run.push_str(text);
}

fn push_inline_text(element: ElementRef<'_>, run: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => push_text(run, text),
            Node::Element(el) if el.name() == "br" => run.push('\n'),
            Node::Element(el) if is_skipped(el.name()) => {}
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    push_inline_text(child_el, run);
                }
            }
            _ => {}
        }
    }
}

fn is_skipped(name: &str) -> bool {
    matches!(name, "script" | "style" | "head" | "template" | "noscript" | "meta" | "link" | "title")
}

fn is_block(name: &str) -> bool {
    matches!(
        name,
        "html" | "body" | "div" | "p" | "section" | "article" | "header" | "footer" | "main"
            | "nav" | "aside" | "ul" | "ol" | "li" | "table" | "tr" | "form" | "figure"
            | "figcaption" | "blockquote" | "pre" | "hr" | "h1" | "h2" | "h3" | "h4" | "h5"
            | "h6" | "dl" | "dt" | "dd" | "canvas" | "svg"
    )
}

/// Tag defaults followed by the element's inline `style` declarations
fn element_style(element: ElementRef<'_>, available: u32, viewport: Viewport) -> BoxStyle {
    let mut style = BoxStyle::default();
    match element.value().name() {
        "h1" => {
            style.text_scale = 2;
            style.box_model = BoxModel { margin: 8, border: 0, padding: 8 };
        }
        "h2" | "h3" => {
            style.text_scale = 2;
            style.box_model.margin = 6;
        }
        "p" | "ul" | "ol" | "blockquote" => style.box_model = BoxModel { margin: 6, border: 0, padding: 6 },
        "hr" => {
            style.box_model = BoxModel { margin: 4, border: 1, padding: 0 };
            style.border_color = [128, 128, 128, 255];
        }
        "img" => style.background = Some([220, 220, 220, 255]),
        _ => {}
    }

    if let Some(inline) = element.value().attr("style") {
        apply_declarations(&mut style, inline, available, viewport);
    }
    style
}

fn apply_declarations(style: &mut BoxStyle, inline: &str, available: u32, viewport: Viewport) {
    for decl in inline.split(';') {
        let Some((prop, value)) = decl.split_once(':') else { continue };
        let prop = prop.trim().to_ascii_lowercase();
        let value = value.trim().trim_end_matches("!important").trim();
        match prop.as_str() {
            "background" | "background-color" => {
                style.background =
                    parse_color(value).or_else(|| value.split_whitespace().find_map(parse_color));
                if value.eq_ignore_ascii_case("transparent") {
                    style.background = None;
                }
            }
            "color" => {
                if let Some(c) = parse_color(value) {
                    style.color = c;
                }
            }
            "width" => style.width = parse_length(value, available, viewport),
            "height" => style.height = parse_length(value, viewport.height, viewport),
            "margin" => style.box_model.margin = first_length(value, available, viewport),
            "padding" => style.box_model.padding = first_length(value, available, viewport),
            "border" => {
                for token in value.split_whitespace() {
                    if let Some(c) = parse_color(token) {
                        style.border_color = c;
                    } else if let Some(w) = parse_length(token, available, viewport) {
                        style.box_model.border = w;
                    } else if token.eq_ignore_ascii_case("none") {
                        style.box_model.border = 0;
                    }
                }
            }
            "border-width" => style.box_model.border = first_length(value, available, viewport),
            "border-color" => {
                if let Some(c) = parse_color(value) {
                    style.border_color = c;
                }
            }
            "font-size" => {
                if let Some(px) = parse_length(value, 16, viewport) {
                    style.text_scale = (px / 12).clamp(1, 8);
                }
            }
            "display" => style.hidden = value.eq_ignore_ascii_case("none"),
            "visibility" => style.hidden = value.eq_ignore_ascii_case("hidden"),
            _ => {}
        }
    }
}

fn first_length(value: &str, available: u32, viewport: Viewport) -> u32 {
    value
        .split_whitespace()
        .next()
        .and_then(|v| parse_length(v, available, viewport))
        .unwrap_or(0)
}

/// Parse a CSS length into whole pixels.
///
/// Supports `px`, unitless numbers, `%` (of `reference`), `em`/`rem`
/// (16px), `vw` and `vh`. Results are capped at `MAX_DIMENSION`.
pub fn parse_length(value: &str, reference: u32, viewport: Viewport) -> Option<u32> {
    let v = value.trim().to_ascii_lowercase();
    let (num, factor) = if let Some(n) = v.strip_suffix("px") {
        (n, 1.0)
    } else if let Some(n) = v.strip_suffix('%') {
        (n, reference as f32 / 100.0)
    } else if let Some(n) = v.strip_suffix("rem").or_else(|| v.strip_suffix("em")) {
        (n, 16.0)
    } else if let Some(n) = v.strip_suffix("vw") {
        (n, viewport.width as f32 / 100.0)
    } else if let Some(n) = v.strip_suffix("vh") {
        (n, viewport.height as f32 / 100.0)
    } else {
        (v.as_str(), 1.0)
    };
    let n: f32 = num.trim().parse().ok()?;
    if !n.is_finite() || n < 0.0 {
        return None;
    }
    Some((n * factor).round().min(MAX_DIMENSION as f32) as u32)
}

/// Parse a CSS colour (hex, functional and named forms) into RGBA8
pub fn parse_color(value: &str) -> Option<Rgba> {
    csscolorparser::parse(value.trim()).ok().map(|c| c.to_rgba8())
}

/// Display list built from a layout tree

use crate::rendering::layout::{LayoutNode, NodeKind, Rgba, CHAR_WIDTH, LINE_HEIGHT};

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    SolidRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgba: Rgba,
    },
    Text {
        x: i32,
        y: i32,
        text: String,
        scale: u32,
        rgba: Rgba,
    },
}

fn shift(base: i32, by: u32) -> i32 {
    base.saturating_add(by.min(i32::MAX as u32) as i32)
}

/// Flatten the tree into paint order: background, border, then content.
pub fn build_display_list(root: &LayoutNode) -> Vec<PaintCommand> {
    let mut list = Vec::new();
    paint_node(root, &mut list);
    list
}

fn paint_node(node: &LayoutNode, list: &mut Vec<PaintCommand>) {
    let r = node.rect;
    if let Some(bg) = node.style.background {
        if bg[3] > 0 {
            list.push(PaintCommand::SolidRect { x: r.x, y: r.y, width: r.width, height: r.height, rgba: bg });
        }
    }

    let b = node.style.box_model.border;
    if b > 0 && r.width > 0 && r.height > 0 {
        let c = node.style.border_color;
        let bw = b.min(r.width);
        let bh = b.min(r.height);
        list.push(PaintCommand::SolidRect { x: r.x, y: r.y, width: r.width, height: bh, rgba: c });
        list.push(PaintCommand::SolidRect {
            x: r.x,
            y: shift(r.y, r.height - bh),
            width: r.width,
            height: bh,
            rgba: c,
        });
        list.push(PaintCommand::SolidRect { x: r.x, y: r.y, width: bw, height: r.height, rgba: c });
        list.push(PaintCommand::SolidRect {
            x: shift(r.x, r.width - bw),
            y: r.y,
            width: bw,
            height: r.height,
            rgba: c,
        });
    }

    match &node.kind {
        NodeKind::Text { lines } => {
            let scale = node.style.text_scale.max(1);
            for (i, line) in lines.iter().enumerate() {
                list.push(PaintCommand::Text {
                    x: r.x,
                    y: shift(r.y, (i as u32).saturating_mul(LINE_HEIGHT * scale)),
                    text: line.clone(),
                    scale,
                    rgba: node.style.color,
                });
            }
        }
        NodeKind::Image { alt } if !alt.is_empty() && r.width >= CHAR_WIDTH && r.height >= LINE_HEIGHT => {
            let fit = (r.width / CHAR_WIDTH) as usize;
            list.push(PaintCommand::Text {
                x: r.x,
                y: r.y,
                text: alt.chars().take(fit).collect(),
                scale: 1,
                rgba: [96, 96, 96, 255],
            });
        }
        _ => {}
    }

    for child in &node.children {
        paint_node(child, list);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::layout::{BoxModel, BoxStyle, Rect};

    fn block(style: BoxStyle, children: Vec<LayoutNode>) -> LayoutNode {
        LayoutNode {
            rect: Rect { x: 0, y: 0, width: 10, height: 10 },
            style,
            kind: NodeKind::Block,
            children,
        }
    }

    #[test]
    fn background_comes_before_children() {
        let text = LayoutNode {
            rect: Rect { x: 0, y: 0, width: 10, height: 10 },
            style: BoxStyle::default(),
            kind: NodeKind::Text { lines: vec!["a".into(), "b".into()] },
            children: vec![],
        };
        let root = block(BoxStyle { background: Some([255, 0, 0, 255]), ..Default::default() }, vec![text]);
        let list = build_display_list(&root);
        assert_eq!(list.len(), 3);
        match &list[0] {
            PaintCommand::SolidRect { width, rgba, .. } => {
                assert_eq!(*width, 10);
                assert_eq!(*rgba, [255, 0, 0, 255]);
            }
            _ => panic!("unexpected"),
        }
        match &list[2] {
            PaintCommand::Text { y, text, .. } => {
                assert_eq!(*y, LINE_HEIGHT as i32);
                assert_eq!(text, "b");
            }
            _ => panic!("unexpected"),
        }
    }

    #[test]
    fn borders_emit_four_edges() {
        let style = BoxStyle {
            box_model: BoxModel { margin: 0, border: 2, padding: 0 },
            ..Default::default()
        };
        let list = build_display_list(&block(style, vec![]));
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn transparent_background_is_not_painted() {
        let root = block(BoxStyle { background: Some([0, 0, 0, 0]), ..Default::default() }, vec![]);
        assert!(build_display_list(&root).is_empty());
    }
}

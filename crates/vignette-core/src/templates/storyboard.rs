//! Storyboard shapes: scenes, flow control and embedded mockups.

use super::ShapeTable;
use super::base;
use super::compose::{FONT_BOLD, edge, shape_node};
use crate::model::{ConnectionAttributes, ShapeAttributes};
use crate::style::{self, Style};
use crate::visual::{VisualEdge, VisualNode};

const FRAME_HEADER: f64 = 24.0;

pub(super) const SHAPES: ShapeTable = &[
    ("Frame", frame),
    ("Scene", frame),
    ("Start", start),
    ("End", end),
    ("Condition", condition),
    ("Mockup", mockup),
    ("Note", note),
];

fn frame(attrs: &ShapeAttributes) -> VisualNode {
    shape_node(
        attrs,
        base::defaults().with(style::FILL_COLOR, "#f8f8f8"),
        Style::new()
            .with(style::SHAPE, "swimlane")
            .with("startSize", FRAME_HEADER)
            .with("horizontal", 1)
            .with(style::ROUNDED, 1)
            .with(style::FONT_STYLE, FONT_BOLD),
    )
}

fn start(attrs: &ShapeAttributes) -> VisualNode {
    shape_node(
        attrs,
        Style::new()
            .with(style::FILL_COLOR, "#000000")
            .with(style::STROKE_COLOR, "#000000"),
        Style::new()
            .with(style::SHAPE, "ellipse")
            .with(style::PERIMETER, "ellipsePerimeter")
            .with("verticalLabelPosition", "bottom")
            .with(style::VERTICAL_ALIGN, "top"),
    )
}

fn end(attrs: &ShapeAttributes) -> VisualNode {
    shape_node(
        attrs,
        base::defaults(),
        Style::new()
            .with(style::SHAPE, "ellipse")
            .with(style::PERIMETER, "ellipsePerimeter")
            .with("double", 1)
            .with("verticalLabelPosition", "bottom")
            .with(style::VERTICAL_ALIGN, "top"),
    )
}

fn condition(attrs: &ShapeAttributes) -> VisualNode {
    shape_node(
        attrs,
        base::defaults(),
        Style::new()
            .with(style::SHAPE, "rhombus")
            .with(style::PERIMETER, "rhombusPerimeter"),
    )
}

/// A screen thumbnail; falls back to a placeholder frame without an image.
fn mockup(attrs: &ShapeAttributes) -> VisualNode {
    let source = attrs.image.as_deref().or_else(|| attrs.prop_str("Image"));
    let overrides = match source {
        Some(source) => Style::new()
            .with(style::SHAPE, "image")
            .with(style::IMAGE, source)
            .with("imageAspect", 0)
            .with("verticalLabelPosition", "bottom")
            .with(style::VERTICAL_ALIGN, "top"),
        None => Style::new()
            .with(style::SHAPE, "rectangle")
            .with(style::DASHED, 1),
    };
    shape_node(attrs, base::defaults(), overrides)
}

fn note(attrs: &ShapeAttributes) -> VisualNode {
    shape_node(
        attrs,
        Style::new()
            .with(style::FILL_COLOR, "#fff2cc")
            .with(style::STROKE_COLOR, "#d6b656"),
        Style::new()
            .with(style::SHAPE, "note")
            .with(style::ALIGN, "left")
            .with("spacingLeft", 4),
    )
}

/// Transitions between scenes.
pub(super) fn connector(conn: &ConnectionAttributes) -> VisualEdge {
    edge(
        conn,
        Style::new()
            .with(style::END_ARROW, "classic")
            .with(style::END_FILL, 1)
            .with(style::ROUNDED, 1),
    )
}

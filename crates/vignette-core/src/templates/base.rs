//! Generic shapes shared by every diagram domain.

use super::compose::shape_node;
use super::ShapeTable;
use crate::model::ShapeAttributes;
use crate::style::{self, Style};
use crate::visual::VisualNode;

pub(super) const SHAPES: ShapeTable = &[
    ("Image", image),
    ("Callout", callout),
    ("Rectangle", rectangle),
    ("Ellipse", ellipse),
    ("TextArea", text_area),
    ("Group", group),
    ("Path", path),
];

fn image(attrs: &ShapeAttributes) -> VisualNode {
    let mut overrides = Style::new()
        .with(style::SHAPE, "image")
        .with("verticalLabelPosition", "bottom")
        .with(style::VERTICAL_ALIGN, "top");
    if let Some(source) = attrs.image.as_deref().or_else(|| attrs.prop_str("Image")) {
        overrides.set(style::IMAGE, source);
    }
    shape_node(attrs, Style::new(), overrides)
}

fn callout(attrs: &ShapeAttributes) -> VisualNode {
    let pointer = attrs.prop_f64("PointerPosition").unwrap_or(0.5).clamp(0.0, 1.0);
    shape_node(
        attrs,
        defaults(),
        Style::new()
            .with(style::SHAPE, "callout")
            .with("position", pointer)
            .with(style::PERIMETER, "calloutPerimeter"),
    )
}

pub(super) fn rectangle(attrs: &ShapeAttributes) -> VisualNode {
    let mut overrides = Style::new().with(style::SHAPE, "rectangle");
    if attrs.prop_bool("IsRounded").unwrap_or(false) || attrs.prop_f64("CornerRadius").is_some_and(|r| r > 0.0) {
        overrides.set(style::ROUNDED, "1");
    }
    shape_node(attrs, defaults(), overrides)
}

pub(super) fn ellipse(attrs: &ShapeAttributes) -> VisualNode {
    shape_node(
        attrs,
        defaults(),
        Style::new()
            .with(style::SHAPE, "ellipse")
            .with(style::PERIMETER, "ellipsePerimeter"),
    )
}

pub(super) fn text_area(attrs: &ShapeAttributes) -> VisualNode {
    shape_node(
        attrs,
        Style::new()
            .with(style::FILL_COLOR, "none")
            .with(style::STROKE_COLOR, "none"),
        Style::new()
            .with_token("text")
            .with(style::ALIGN, "left")
            .with(style::VERTICAL_ALIGN, "top"),
    )
}

/// Group container. Children are attached by the scene renderer.
pub(super) fn group(attrs: &ShapeAttributes) -> VisualNode {
    shape_node(
        attrs,
        Style::new()
            .with(style::FILL_COLOR, "none")
            .with(style::STROKE_COLOR, "none"),
        Style::new().with_token("group"),
    )
}

fn path(attrs: &ShapeAttributes) -> VisualNode {
    let mut overrides = Style::new().with(style::SHAPE, "path");
    if let Some(data) = attrs.prop_str("Path") {
        overrides.set("path", data);
    }
    shape_node(attrs, defaults(), overrides)
}

/// Default colors of an unstyled shape.
pub(super) fn defaults() -> Style {
    Style::new()
        .with(style::FILL_COLOR, "#ffffff")
        .with(style::STROKE_COLOR, "#000000")
}

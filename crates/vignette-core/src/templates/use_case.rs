//! Use-case diagram shapes.

use super::ShapeTable;
use super::base;
use super::compose::{FONT_BOLD, edge, shape_node};
use crate::model::{ConnectionAttributes, ShapeAttributes};
use crate::style::{self, Style};
use crate::visual::{VisualEdge, VisualNode};

pub(super) const SHAPES: ShapeTable = &[
    ("Actor", actor),
    ("UseCase", use_case),
    ("SystemBoundary", system_boundary),
    ("UseCaseNote", note),
];

fn actor(attrs: &ShapeAttributes) -> VisualNode {
    shape_node(
        attrs,
        base::defaults(),
        Style::new()
            .with(style::SHAPE, "umlActor")
            .with("verticalLabelPosition", "bottom")
            .with(style::VERTICAL_ALIGN, "top")
            .with("outlineConnect", 0),
    )
}

fn use_case(attrs: &ShapeAttributes) -> VisualNode {
    let mut overrides = Style::new()
        .with(style::SHAPE, "ellipse")
        .with(style::PERIMETER, "ellipsePerimeter");
    if attrs.prop_bool("IsAbstract").unwrap_or(false) {
        overrides.set(style::DASHED, "1");
    }
    shape_node(attrs, base::defaults(), overrides)
}

fn system_boundary(attrs: &ShapeAttributes) -> VisualNode {
    shape_node(
        attrs,
        base::defaults().with(style::FILL_COLOR, "none"),
        Style::new()
            .with(style::SHAPE, "rectangle")
            .with(style::VERTICAL_ALIGN, "top")
            .with(style::FONT_STYLE, FONT_BOLD),
    )
}

fn note(attrs: &ShapeAttributes) -> VisualNode {
    shape_node(
        attrs,
        Style::new()
            .with(style::FILL_COLOR, "#fff2cc")
            .with(style::STROKE_COLOR, "#d6b656"),
        Style::new().with(style::SHAPE, "note"),
    )
}

/// Associations and `include`/`extend`/generalization relations.
///
/// Stereotyped relations without an explicit label get the stereotype as
/// their label.
pub(super) fn connector(conn: &ConnectionAttributes) -> VisualEdge {
    let relation = conn.prop_str("RelationType").unwrap_or("Association").to_ascii_lowercase();
    let (overrides, stereotype) = match relation.as_str() {
        "include" | "extend" => (
            Style::new()
                .with(style::DASHED, 1)
                .with(style::END_ARROW, "open"),
            Some(format!("«{relation}»")),
        ),
        "generalization" => (
            Style::new()
                .with(style::END_ARROW, "block")
                .with(style::END_FILL, 0),
            None,
        ),
        _ => (Style::new().with(style::END_ARROW, "none"), None),
    };
    let mut visual = edge(conn, overrides);
    if visual.label.is_none() {
        visual.label = stereotype;
    }
    visual
}

//! Domain-model (class diagram) shapes.

use super::ShapeTable;
use super::base;
use super::compose::{FONT_BOLD, FONT_ITALIC, edge, shape_node, string_list, text_row};
use crate::model::{ConnectionAttributes, ShapeAttributes};
use crate::style::{self, Style};
use crate::visual::{VisualEdge, VisualNode};
use kurbo::{Point, Size};

/// Height of the name compartment.
pub const HEADER_HEIGHT: f64 = 26.0;
/// Height of one attribute or operation row.
pub const ROW_HEIGHT: f64 = 20.0;
const SEPARATOR_HEIGHT: f64 = 8.0;

pub(super) const SHAPES: ShapeTable = &[
    ("DomainClass", class),
    ("DomainEnum", enumeration),
    ("DomainPackage", package),
    ("DomainNote", note),
];

fn compartment_defaults() -> Style {
    base::defaults().with(style::FILL_COLOR, "#dae8fc").with(style::STROKE_COLOR, "#6c8ebf")
}

fn compartment(attrs: &ShapeAttributes, font_style: u8, sections: &[Vec<&str>]) -> VisualNode {
    let mut node = shape_node(
        attrs,
        compartment_defaults(),
        Style::new()
            .with(style::SHAPE, "swimlane")
            .with("startSize", HEADER_HEIGHT)
            .with(style::FONT_STYLE, font_style)
            .with(style::VERTICAL_ALIGN, "top"),
    );

    let width = attrs.width.max(0.0);
    let mut y = HEADER_HEIGHT;
    for (index, rows) in sections.iter().enumerate() {
        if index > 0 {
            node.push_child(VisualNode::decoration(
                Point::new(0.0, y),
                Size::new(width, SEPARATOR_HEIGHT),
                Style::new()
                    .with_token("line")
                    .with(style::STROKE_COLOR, "inherit")
                    .with(style::FILL_COLOR, "none"),
            ));
            y += SEPARATOR_HEIGHT;
        }
        for row in rows {
            node.push_child(text_row(row, Point::new(0.0, y), Size::new(width, ROW_HEIGHT)));
            y += ROW_HEIGHT;
        }
    }
    node
}

fn class(attrs: &ShapeAttributes) -> VisualNode {
    let mut font_style = FONT_BOLD;
    if attrs.prop_bool("IsAbstract").unwrap_or(false) {
        font_style |= FONT_ITALIC;
    }
    let mut node = compartment(
        attrs,
        font_style,
        &[string_list(attrs, "Attributes"), string_list(attrs, "Operations")],
    );
    if let Some(stereotype) = attrs.prop_str("Stereotype").filter(|s| !s.is_empty()) {
        let name = attrs.label_text().unwrap_or_default();
        node.label = Some(format!("«{stereotype}»\n{name}"));
    }
    node
}

fn enumeration(attrs: &ShapeAttributes) -> VisualNode {
    let mut node = compartment(attrs, FONT_BOLD, &[string_list(attrs, "Literals")]);
    let name = attrs.label_text().unwrap_or_default();
    node.label = Some(format!("«enumeration»\n{name}"));
    node
}

fn package(attrs: &ShapeAttributes) -> VisualNode {
    shape_node(
        attrs,
        base::defaults(),
        Style::new()
            .with(style::SHAPE, "folder")
            .with("tabWidth", 80)
            .with("tabHeight", 20)
            .with("tabPosition", "left")
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
        Style::new().with(style::SHAPE, "note").with("size", 14),
    )
}

/// Associations, with the relation kind read from `RelationType`.
pub(super) fn connector(conn: &ConnectionAttributes) -> VisualEdge {
    let relation = conn.prop_str("RelationType").unwrap_or("Association").to_ascii_lowercase();
    let overrides = match relation.as_str() {
        "inheritance" | "generalization" => Style::new()
            .with(style::END_ARROW, "block")
            .with(style::END_FILL, 0),
        "realization" => Style::new()
            .with(style::DASHED, 1)
            .with(style::END_ARROW, "block")
            .with(style::END_FILL, 0),
        "composition" => Style::new()
            .with(style::START_ARROW, "diamond")
            .with(style::START_FILL, 1)
            .with(style::END_ARROW, "none"),
        "aggregation" => Style::new()
            .with(style::START_ARROW, "diamond")
            .with(style::START_FILL, 0)
            .with(style::END_ARROW, "none"),
        "dependency" => Style::new()
            .with(style::DASHED, 1)
            .with(style::END_ARROW, "open"),
        _ => {
            let directed = conn.prop_bool("IsDirected").unwrap_or(false);
            Style::new().with(style::END_ARROW, if directed { "open" } else { "none" })
        }
    };
    edge(conn, overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;
    use serde_json::json;

    #[test]
    fn test_class_compartments() {
        let attrs = ShapeAttributes::new(1, "DomainClass", Rect::new(0.0, 0.0, 160.0, 120.0))
            .with_label("Order")
            .with_prop("Attributes", json!(["id: u64", "total: f64"]))
            .with_prop("Operations", json!(["submit()", 17]));
        let node = class(&attrs);
        // Two attributes, a separator and one operation (the number is skipped).
        assert_eq!(node.children.len(), 4);
        assert_eq!(node.children[0].label.as_deref(), Some("id: u64"));
        assert!((node.children[0].geometry.y0 - HEADER_HEIGHT).abs() < f64::EPSILON);
        assert!((node.children[3].geometry.y0 - (HEADER_HEIGHT + 2.0 * ROW_HEIGHT + 8.0)).abs() < f64::EPSILON);
        assert_eq!(node.label.as_deref(), Some("Order"));
    }

    #[test]
    fn test_abstract_class_is_italic() {
        let attrs = ShapeAttributes::new(1, "DomainClass", Rect::new(0.0, 0.0, 100.0, 60.0))
            .with_prop("IsAbstract", json!(true))
            .with_prop("Attributes", json!("not a list"));
        let node = class(&attrs);
        assert_eq!(node.style.get(style::FONT_STYLE), Some("3"));
        // One empty separator between two empty sections.
        assert_eq!(node.children.len(), 1);
    }

    #[test]
    fn test_enum_label() {
        let attrs = ShapeAttributes::new(1, "DomainEnum", Rect::new(0.0, 0.0, 100.0, 60.0))
            .with_label("Color")
            .with_prop("Literals", json!(["Red", "Green"]));
        let node = enumeration(&attrs);
        assert_eq!(node.label.as_deref(), Some("«enumeration»\nColor"));
        assert_eq!(node.children.len(), 2);
    }

    #[test]
    fn test_relation_styles() {
        let conn = ConnectionAttributes::new(1, Some(2), Some(3)).with_prop("RelationType", json!("Composition"));
        let edge = connector(&conn);
        assert_eq!(edge.style.get(style::START_ARROW), Some("diamond"));
        assert!(edge.style.is_enabled(style::START_FILL));

        let plain = connector(&ConnectionAttributes::new(1, Some(2), Some(3)));
        assert_eq!(plain.style.get(style::END_ARROW), Some("none"));
    }
}

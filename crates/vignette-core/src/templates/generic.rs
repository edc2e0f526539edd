//! Generic flowchart-style shapes.

use super::ShapeTable;
use super::base;
use super::compose::{edge, shape_node};
use crate::model::{ConnectionAttributes, ShapeAttributes};
use crate::style::{self, Style};
use crate::visual::{VisualEdge, VisualNode};

pub(super) const SHAPES: ShapeTable = &[
    ("Diamond", diamond),
    ("Triangle", triangle),
    ("Hexagon", hexagon),
    ("Cylinder", cylinder),
    ("Cloud", cloud),
    ("Document", document),
];

fn simple(attrs: &ShapeAttributes, shape: &str, perimeter: Option<&str>) -> VisualNode {
    let mut overrides = Style::new().with(style::SHAPE, shape);
    if let Some(perimeter) = perimeter {
        overrides.set(style::PERIMETER, perimeter);
    }
    shape_node(attrs, base::defaults(), overrides)
}

fn diamond(attrs: &ShapeAttributes) -> VisualNode {
    simple(attrs, "rhombus", Some("rhombusPerimeter"))
}

fn triangle(attrs: &ShapeAttributes) -> VisualNode {
    let mut node = simple(attrs, "triangle", Some("trianglePerimeter"));
    if let Some(direction) = attrs.prop_str("Direction") {
        node.style.set("direction", direction.to_ascii_lowercase());
    }
    node
}

fn hexagon(attrs: &ShapeAttributes) -> VisualNode {
    simple(attrs, "hexagon", Some("hexagonPerimeter2"))
}

fn cylinder(attrs: &ShapeAttributes) -> VisualNode {
    simple(attrs, "cylinder", None)
}

fn cloud(attrs: &ShapeAttributes) -> VisualNode {
    simple(attrs, "cloud", Some("ellipsePerimeter"))
}

fn document(attrs: &ShapeAttributes) -> VisualNode {
    let mut node = simple(attrs, "document", None);
    node.style.set("size", "0.3");
    node
}

pub(super) fn connector(conn: &ConnectionAttributes) -> VisualEdge {
    edge(conn, Style::new().with(style::END_ARROW, "classic"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;

    #[test]
    fn test_generic_shapes_keep_colors() {
        for (name, builder) in SHAPES {
            let attrs = ShapeAttributes::new(2, *name, Rect::new(0.0, 0.0, 40.0, 40.0))
                .with_colors("#abcdef", "#123456");
            let node = builder(&attrs);
            assert_eq!(node.style.get(style::FILL_COLOR), Some("#abcdef"), "{name}");
            assert!(node.style.contains(style::SHAPE));
        }
    }
}

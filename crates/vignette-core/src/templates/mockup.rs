//! UI mockup widgets.

use super::ShapeTable;
use super::base;
use super::compose::{FONT_BOLD, FONT_UNDERLINE, edge, shape_node};
use crate::model::{ConnectionAttributes, ShapeAttributes};
use crate::style::{self, Style};
use crate::visual::{VisualEdge, VisualNode};
use kurbo::{Point, Size};

const CONTROL_SIZE: f64 = 14.0;
const CONTROL_GAP: f64 = 6.0;
const DROPDOWN_WIDTH: f64 = 20.0;
const TITLE_BAR: f64 = 24.0;
const DISABLED_TEXT: &str = "#999999";

pub(super) const SHAPES: ShapeTable = &[
    ("Button", button),
    ("TextBox", text_box),
    ("CheckBox", check_box),
    ("RadioButton", radio_button),
    ("ComboBox", combo_box),
    ("Label", label),
    ("Window", window),
    ("Panel", panel),
    ("Hyperlink", hyperlink),
];

fn disabled(attrs: &ShapeAttributes, mut overrides: Style) -> Style {
    if attrs.prop_bool("IsDisabled").unwrap_or(false) {
        overrides.set(style::FONT_COLOR, DISABLED_TEXT);
    }
    overrides
}

fn widget_defaults() -> Style {
    Style::new()
        .with(style::FILL_COLOR, "#f5f5f5")
        .with(style::STROKE_COLOR, "#666666")
}

fn button(attrs: &ShapeAttributes) -> VisualNode {
    let overrides = Style::new()
        .with(style::SHAPE, "rectangle")
        .with(style::ROUNDED, 1)
        .with("arcSize", 20);
    shape_node(attrs, widget_defaults(), disabled(attrs, overrides))
}

fn text_box(attrs: &ShapeAttributes) -> VisualNode {
    let overrides = Style::new()
        .with(style::SHAPE, "rectangle")
        .with(style::ALIGN, "left")
        .with("spacingLeft", 4);
    let mut node = shape_node(attrs, base::defaults(), disabled(attrs, overrides));
    if node.label.is_none() {
        if let Some(placeholder) = attrs.prop_str("Placeholder") {
            node.label = Some(placeholder.to_string());
            node.style.set(style::FONT_COLOR, DISABLED_TEXT);
        }
    }
    node
}

/// Box or circle control left of the label, vertically centered.
fn control(attrs: &ShapeAttributes, shape: &str, checked_shape: Option<&str>) -> VisualNode {
    let overrides = Style::new()
        .with_token("text")
        .with(style::ALIGN, "left")
        .with("spacingLeft", CONTROL_SIZE + CONTROL_GAP);
    let mut node = shape_node(
        attrs,
        Style::new()
            .with(style::FILL_COLOR, "none")
            .with(style::STROKE_COLOR, "none"),
        disabled(attrs, overrides),
    );

    let origin = Point::new(0.0, (attrs.height - CONTROL_SIZE) / 2.0);
    let size = Size::new(CONTROL_SIZE, CONTROL_SIZE);
    let mut control = VisualNode::decoration(
        origin,
        size,
        Style::new()
            .with(style::SHAPE, shape)
            .with(style::FILL_COLOR, "#ffffff")
            .with(style::STROKE_COLOR, "#666666"),
    );
    if let Some(checked) = checked_shape {
        let inset = CONTROL_SIZE / 4.0;
        control.push_child(VisualNode::decoration(
            Point::new(inset, inset),
            Size::new(CONTROL_SIZE / 2.0, CONTROL_SIZE / 2.0),
            Style::new()
                .with(style::SHAPE, checked)
                .with(style::FILL_COLOR, "#333333")
                .with(style::STROKE_COLOR, "none"),
        ));
    }
    node.push_child(control);
    node
}

fn check_box(attrs: &ShapeAttributes) -> VisualNode {
    let checked = attrs.prop_bool("IsChecked").unwrap_or(false);
    control(attrs, "rectangle", checked.then_some("checkmark"))
}

fn radio_button(attrs: &ShapeAttributes) -> VisualNode {
    let selected = attrs.prop_bool("IsSelected").unwrap_or(false);
    control(attrs, "ellipse", selected.then_some("ellipse"))
}

fn combo_box(attrs: &ShapeAttributes) -> VisualNode {
    let overrides = Style::new()
        .with(style::SHAPE, "rectangle")
        .with(style::ALIGN, "left")
        .with("spacingLeft", 4)
        .with("spacingRight", DROPDOWN_WIDTH);
    let mut node = shape_node(attrs, base::defaults(), disabled(attrs, overrides));
    let width = DROPDOWN_WIDTH.min(attrs.width.max(0.0));
    node.push_child(VisualNode::decoration(
        Point::new(attrs.width - width, 0.0),
        Size::new(width, attrs.height.max(0.0)),
        Style::new()
            .with(style::SHAPE, "triangle")
            .with("direction", "south")
            .with(style::FILL_COLOR, "#666666")
            .with(style::STROKE_COLOR, "none"),
    ));
    node
}

fn label(attrs: &ShapeAttributes) -> VisualNode {
    shape_node(
        attrs,
        Style::new()
            .with(style::FILL_COLOR, "none")
            .with(style::STROKE_COLOR, "none"),
        disabled(attrs, Style::new().with_token("text")),
    )
}

fn window(attrs: &ShapeAttributes) -> VisualNode {
    shape_node(
        attrs,
        base::defaults(),
        Style::new()
            .with(style::SHAPE, "swimlane")
            .with("startSize", TITLE_BAR)
            .with("horizontal", 1)
            .with(style::FONT_STYLE, FONT_BOLD),
    )
}

fn panel(attrs: &ShapeAttributes) -> VisualNode {
    shape_node(
        attrs,
        widget_defaults().with(style::FILL_COLOR, "#ffffff"),
        Style::new()
            .with(style::SHAPE, "rectangle")
            .with(style::VERTICAL_ALIGN, "top"),
    )
}

fn hyperlink(attrs: &ShapeAttributes) -> VisualNode {
    shape_node(
        attrs,
        Style::new()
            .with(style::FILL_COLOR, "none")
            .with(style::STROKE_COLOR, "none")
            .with(style::FONT_COLOR, "#0000ee"),
        Style::new()
            .with_token("text")
            .with(style::FONT_STYLE, FONT_UNDERLINE),
    )
}

/// Navigation arrows between screens.
pub(super) fn connector(conn: &ConnectionAttributes) -> VisualEdge {
    edge(
        conn,
        Style::new()
            .with(style::END_ARROW, "classic")
            .with(style::END_FILL, 1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;
    use serde_json::json;

    fn attrs(shape_type: &str) -> ShapeAttributes {
        ShapeAttributes::new(4, shape_type, Rect::new(0.0, 0.0, 120.0, 30.0))
    }

    #[test]
    fn test_check_box_states() {
        let unchecked = check_box(&attrs("CheckBox"));
        assert_eq!(unchecked.children.len(), 1);
        assert!(unchecked.children[0].children.is_empty());
        assert!((unchecked.children[0].geometry.y0 - 8.0).abs() < f64::EPSILON);

        let checked = check_box(&attrs("CheckBox").with_prop("IsChecked", json!(true)));
        assert_eq!(checked.children[0].children.len(), 1);
    }

    #[test]
    fn test_disabled_button() {
        let node = button(&attrs("Button").with_prop("IsDisabled", json!(true)));
        assert_eq!(node.style.get(style::FONT_COLOR), Some(DISABLED_TEXT));
    }

    #[test]
    fn test_combo_box_dropdown() {
        let node = combo_box(&attrs("ComboBox"));
        let dropdown = node.children[0].geometry;
        assert!((dropdown.x0 - 100.0).abs() < f64::EPSILON);
        assert!((dropdown.width() - DROPDOWN_WIDTH).abs() < f64::EPSILON);
    }

    #[test]
    fn test_text_box_placeholder() {
        let node = text_box(&attrs("TextBox").with_prop("Placeholder", json!("Search")));
        assert_eq!(node.label.as_deref(), Some("Search"));
        let node = text_box(&attrs("TextBox").with_label("query").with_prop("Placeholder", json!("Search")));
        assert_eq!(node.label.as_deref(), Some("query"));
    }
}

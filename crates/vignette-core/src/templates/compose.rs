//! Style composition shared by every shape and connector builder.

use crate::color::style_color;
use crate::model::{ConnectionAttributes, ConnectorType, Label, LabelStyle, ShapeAttributes};
use crate::style::{self, Style};
use crate::visual::{VisualEdge, VisualNode};
use kurbo::{Point, Size};

/// `fontStyle` bit for bold text.
pub const FONT_BOLD: u8 = 1;
/// `fontStyle` bit for italic text.
pub const FONT_ITALIC: u8 = 2;
/// `fontStyle` bit for underlined text.
pub const FONT_UNDERLINE: u8 = 4;

/// Default style derived from a shape's own attributes.
///
/// Colors combined with an explicit opacity are re-expressed as opaque
/// blends, so no separate opacity key is emitted.
pub fn default_style(attrs: &ShapeAttributes) -> Style {
    let mut style = Style::new();
    let fill_opacity = attrs.fill_opacity.or(attrs.opacity);
    if let Some(fill) = style_color(attrs.fill.as_deref(), fill_opacity) {
        style.set(style::FILL_COLOR, fill);
    }
    if let Some(gradient) = style_color(attrs.gradient.as_deref(), fill_opacity) {
        style.set(style::GRADIENT_COLOR, gradient);
        style.set(style::GRADIENT_DIRECTION, "south");
    }
    let stroke_opacity = attrs.stroke_opacity.or(attrs.opacity);
    if let Some(stroke) = style_color(attrs.stroke.as_deref(), stroke_opacity) {
        style.set(style::STROKE_COLOR, stroke);
    }
    if let Some(width) = attrs.stroke_width.filter(|w| w.is_finite() && *w >= 0.0) {
        style.set(style::STROKE_WIDTH, width.to_string());
    }
    if attrs.angle.is_finite() && attrs.angle != 0.0 {
        style.set(style::ROTATION, attrs.angle.to_string());
    }
    style.set(style::WHITE_SPACE, "wrap");
    if attrs.label.as_ref().is_some_and(Label::is_rich) {
        style.set(style::HTML, "1");
    }
    if let Some(label_style) = &attrs.label_style {
        apply_label_style(&mut style, label_style);
    }
    style
}

fn apply_label_style(style: &mut Style, label_style: &LabelStyle) {
    if let Some(size) = label_style.font_size.filter(|s| s.is_finite() && *s > 0.0) {
        style.set(style::FONT_SIZE, size.to_string());
    }
    if let Some(color) = style_color(label_style.font_color.as_deref(), None) {
        style.set(style::FONT_COLOR, color);
    }
    let bits = font_style_bits(label_style);
    if bits != 0 {
        style.set(style::FONT_STYLE, bits.to_string());
    }
    if let Some(align) = &label_style.align {
        style.set(style::ALIGN, align.as_str());
    }
    if let Some(align) = &label_style.vertical_align {
        style.set(style::VERTICAL_ALIGN, align.as_str());
    }
}

pub fn font_style_bits(label_style: &LabelStyle) -> u8 {
    let mut bits = 0;
    if label_style.bold {
        bits |= FONT_BOLD;
    }
    if label_style.italic {
        bits |= FONT_ITALIC;
    }
    if label_style.underline {
        bits |= FONT_UNDERLINE;
    }
    bits
}

/// Build the primary node of a shape.
///
/// `defaults` sit underneath the attribute style (type-specific default
/// colors), `overrides` sit on top of it (the shape recipe).
pub(crate) fn shape_node(attrs: &ShapeAttributes, defaults: Style, overrides: Style) -> VisualNode {
    let style = defaults.merge(&default_style(attrs)).merge(&overrides);
    VisualNode::new(attrs.local_bounds(), style)
        .with_element(attrs.id)
        .with_label(attrs.label_text())
}

/// Top-left offset that centers `size` inside `parent`.
pub(crate) fn centered(parent: Size, size: Size) -> Point {
    Point::new((parent.width - size.width) / 2.0, (parent.height - size.height) / 2.0)
}

/// Size of a centered icon taking `ratio` of the smaller side.
pub(crate) fn icon_size(attrs: &ShapeAttributes, ratio: f64) -> Size {
    let side = attrs.width.min(attrs.height).max(0.0) * ratio;
    Size::new(side, side)
}

/// A non-selectable text row inside a compartment shape.
pub(crate) fn text_row(text: &str, origin: Point, size: Size) -> VisualNode {
    let style = Style::new()
        .with_token("text")
        .with(style::STROKE_COLOR, "none")
        .with(style::FILL_COLOR, "none")
        .with(style::ALIGN, "left")
        .with(style::VERTICAL_ALIGN, "middle")
        .with("spacingLeft", 4);
    VisualNode::decoration(origin, size, style).with_label(Some(text))
}

/// String entries of an array prop; other values are skipped.
pub(crate) fn string_list<'a>(attrs: &'a ShapeAttributes, key: &str) -> Vec<&'a str> {
    attrs
        .prop(key)
        .and_then(|value| value.as_array())
        .map(|items| items.iter().filter_map(|item| item.as_str()).collect())
        .unwrap_or_default()
}

/// Default style derived from a connection's own attributes.
pub fn default_edge_style(conn: &ConnectionAttributes) -> Style {
    let mut style = Style::new();
    if let Some(stroke) = style_color(conn.stroke.as_deref(), conn.opacity) {
        style.set(style::STROKE_COLOR, stroke);
    }
    if let Some(width) = conn.stroke_width.filter(|w| w.is_finite() && *w >= 0.0) {
        style.set(style::STROKE_WIDTH, width.to_string());
    }
    match conn.connector_type {
        ConnectorType::Straight => {}
        ConnectorType::Curved => style.set(style::CURVED, "1"),
        ConnectorType::RightAngled => style.set(style::EDGE_STYLE, "orthogonalEdgeStyle"),
    }
    if conn.label.as_ref().is_some_and(Label::is_rich) {
        style.set(style::HTML, "1");
    }
    style
}

/// Build an edge from the connection's own style layered with `overrides`.
pub(crate) fn edge(conn: &ConnectionAttributes, overrides: Style) -> VisualEdge {
    let mut edge = VisualEdge::new(default_edge_style(conn).merge(&overrides));
    edge.element = Some(conn.id);
    edge.label = conn.label_text().map(str::to_string);
    edge.source_label = conn.source_label.clone();
    edge.target_label = conn.target_label.clone();
    edge
}

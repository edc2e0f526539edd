//! Business-process (BPMN) shapes.

use super::ShapeTable;
use super::base;
use super::compose::{centered, edge, icon_size, shape_node};
use crate::model::{ConnectionAttributes, ShapeAttributes};
use crate::style::{self, Style};
use crate::visual::{VisualEdge, VisualNode};
use kurbo::{Point, Size};

/// Side length of a task marker.
pub const MARKER_SIZE: f64 = 14.0;
/// Gap added to half a marker when fanning out markers.
pub const MARKER_SPACING: f64 = 8.0;
/// Horizontal shift between two adjacent markers.
pub const MARKER_SHIFT: f64 = MARKER_SIZE / 2.0 + MARKER_SPACING;
const MARKER_MARGIN: f64 = 2.0;

const TASK_ICON_SIZE: f64 = 16.0;
const TASK_ICON_INSET: f64 = 4.0;
const LANE_HEADER: f64 = 30.0;

pub(super) const SHAPES: ShapeTable = &[
    ("Task", task),
    ("SubProcess", sub_process),
    ("Event", event),
    ("Gateway", gateway),
    ("DataObject", data_object),
    ("DataStore", data_store),
    ("Pool", pool),
    ("Lane", lane),
    ("TextAnnotation", text_annotation),
    ("Group", group),
];

/// Markers a task or sub-process can carry, in fan-out order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Loop,
    MultiInstance { sequential: bool },
    Compensation,
    AdHoc,
    Collapsed,
}

impl Marker {
    fn shape(self) -> &'static str {
        match self {
            Marker::Loop => "loopMarker",
            Marker::MultiInstance { sequential: false } => "parallelMarker",
            Marker::MultiInstance { sequential: true } => "sequentialMarker",
            Marker::Compensation => "compensationMarker",
            Marker::AdHoc => "adHocMarker",
            Marker::Collapsed => "plus",
        }
    }
}

/// Markers present on an activity, in fan-out order.
pub fn activity_markers(attrs: &ShapeAttributes) -> Vec<Marker> {
    let flag = |key: &str| attrs.prop_bool(key).unwrap_or(false);
    let loop_type = attrs.prop_str("LoopType").unwrap_or_default();

    let mut markers = Vec::new();
    if flag("IsLoop") || loop_type.eq_ignore_ascii_case("standard") {
        markers.push(Marker::Loop);
    }
    if loop_type.eq_ignore_ascii_case("sequential") {
        markers.push(Marker::MultiInstance { sequential: true });
    } else if flag("IsMultiInstance") || loop_type.eq_ignore_ascii_case("parallel") {
        markers.push(Marker::MultiInstance { sequential: false });
    }
    if flag("IsCompensation") {
        markers.push(Marker::Compensation);
    }
    if flag("IsAdHoc") {
        markers.push(Marker::AdHoc);
    }
    if flag("IsCollapsed") {
        markers.push(Marker::Collapsed);
    }
    markers
}

/// Offset of the `index`-th marker on a shape of the given size.
///
/// The first marker is centered on the bottom edge; each further marker is
/// shifted left by [`MARKER_SHIFT`].
pub fn marker_offset(size: Size, index: usize) -> Point {
    Point::new(
        (size.width - MARKER_SIZE) / 2.0 - index as f64 * MARKER_SHIFT,
        size.height - MARKER_SIZE - MARKER_MARGIN,
    )
}

fn add_markers(node: &mut VisualNode, markers: &[Marker]) {
    let size = node.geometry.size();
    for (index, marker) in markers.iter().enumerate() {
        node.push_child(VisualNode::decoration(
            marker_offset(size, index),
            Size::new(MARKER_SIZE, MARKER_SIZE),
            marker_style(marker.shape()),
        ));
    }
}

fn marker_style(shape: &str) -> Style {
    Style::new()
        .with(style::SHAPE, shape)
        .with(style::FILL_COLOR, "none")
        .with(style::STROKE_COLOR, "#000000")
}

fn activity_defaults() -> Style {
    Style::new()
        .with(style::FILL_COLOR, "#ffffff")
        .with(style::STROKE_COLOR, "#000000")
        .with(style::ROUNDED, 1)
}

fn task(attrs: &ShapeAttributes) -> VisualNode {
    let mut node = shape_node(
        attrs,
        activity_defaults(),
        Style::new().with(style::SHAPE, "rectangle").with("arcSize", 10),
    );
    if let Some(icon) = attrs.prop_str("TaskType").and_then(task_icon) {
        node.push_child(VisualNode::decoration(
            Point::new(TASK_ICON_INSET, TASK_ICON_INSET),
            Size::new(TASK_ICON_SIZE, TASK_ICON_SIZE),
            marker_style(icon),
        ));
    }
    add_markers(&mut node, &activity_markers(attrs));
    node
}

fn task_icon(task_type: &str) -> Option<&'static str> {
    let icon = match task_type.to_ascii_lowercase().as_str() {
        "user" => "userTask",
        "manual" => "manualTask",
        "service" => "serviceTask",
        "script" => "scriptTask",
        "send" => "sendTask",
        "receive" => "receiveTask",
        "businessrule" | "business-rule" => "businessRuleTask",
        _ => return None,
    };
    Some(icon)
}

fn sub_process(attrs: &ShapeAttributes) -> VisualNode {
    let mut overrides = Style::new()
        .with(style::SHAPE, "rectangle")
        .with(style::VERTICAL_ALIGN, "top");
    if attrs.prop_bool("IsTransaction").unwrap_or(false) {
        overrides.set("double", "1");
    }
    if attrs.prop_bool("IsEventSubProcess").unwrap_or(false) {
        overrides.set(style::DASHED, "1");
    }
    let mut node = shape_node(attrs, activity_defaults(), overrides);
    add_markers(&mut node, &activity_markers(attrs));
    node
}

fn event(attrs: &ShapeAttributes) -> VisualNode {
    let event_type = attrs.prop_str("EventType").unwrap_or("Start").to_ascii_lowercase();
    let mut overrides = Style::new()
        .with(style::SHAPE, "ellipse")
        .with(style::PERIMETER, "ellipsePerimeter")
        .with("verticalLabelPosition", "bottom")
        .with(style::VERTICAL_ALIGN, "top");
    match event_type.as_str() {
        "end" => overrides.set(style::STROKE_WIDTH, "3"),
        "intermediate" | "boundary" => overrides.set("double", "1"),
        _ => {}
    }
    if attrs.prop_bool("IsInterrupting") == Some(false) {
        overrides.set(style::DASHED, "1");
    }

    let mut node = shape_node(attrs, base::defaults(), overrides);
    if let Some(definition) = attrs.prop_str("EventDefinition").filter(|d| !d.is_empty()) {
        let size = icon_size(attrs, 0.5);
        node.push_child(VisualNode::decoration(
            centered(attrs.local_bounds().size(), size),
            size,
            marker_style(&format!("{}Event", definition.to_ascii_lowercase())),
        ));
    }
    node
}

fn gateway(attrs: &ShapeAttributes) -> VisualNode {
    let mut node = shape_node(
        attrs,
        base::defaults(),
        Style::new()
            .with(style::SHAPE, "rhombus")
            .with(style::PERIMETER, "rhombusPerimeter")
            .with("verticalLabelPosition", "bottom")
            .with(style::VERTICAL_ALIGN, "top"),
    );
    let symbol = match attrs.prop_str("GatewayType").map(str::to_ascii_lowercase).as_deref() {
        Some("parallel") => Some("parallelGateway"),
        Some("inclusive") => Some("inclusiveGateway"),
        Some("eventbased" | "event-based") => Some("eventGateway"),
        Some("complex") => Some("complexGateway"),
        Some("exclusive") if attrs.prop_bool("IsMarkerVisible").unwrap_or(true) => {
            Some("exclusiveGateway")
        }
        _ => None,
    };
    if let Some(symbol) = symbol {
        let size = icon_size(attrs, 0.5);
        node.push_child(VisualNode::decoration(
            centered(attrs.local_bounds().size(), size),
            size,
            marker_style(symbol),
        ));
    }
    node
}

fn data_object(attrs: &ShapeAttributes) -> VisualNode {
    let mut node = shape_node(
        attrs,
        base::defaults(),
        Style::new()
            .with(style::SHAPE, "note")
            .with("size", 14)
            .with("verticalLabelPosition", "bottom")
            .with(style::VERTICAL_ALIGN, "top"),
    );
    let size = attrs.local_bounds().size();
    if attrs.prop_bool("IsCollection").unwrap_or(false) {
        node.push_child(VisualNode::decoration(
            marker_offset(size, 0),
            Size::new(MARKER_SIZE, MARKER_SIZE),
            marker_style("parallelMarker"),
        ));
    }
    let arrow = match attrs.prop_str("DataType").map(str::to_ascii_lowercase).as_deref() {
        Some("input") => Some(("singleArrow", "none")),
        Some("output") => Some(("singleArrow", "#000000")),
        _ => None,
    };
    if let Some((shape, fill)) = arrow {
        node.push_child(VisualNode::decoration(
            Point::new(MARKER_MARGIN * 2.0, MARKER_MARGIN * 2.0),
            Size::new(MARKER_SIZE, MARKER_SIZE * 0.75),
            marker_style(shape).with(style::FILL_COLOR, fill),
        ));
    }
    node
}

fn data_store(attrs: &ShapeAttributes) -> VisualNode {
    shape_node(
        attrs,
        base::defaults(),
        Style::new()
            .with(style::SHAPE, "cylinder")
            .with("verticalLabelPosition", "bottom")
            .with(style::VERTICAL_ALIGN, "top"),
    )
}

fn swimlane(attrs: &ShapeAttributes, defaults: Style) -> VisualNode {
    let horizontal = attrs.prop_bool("IsHorizontal").unwrap_or(true);
    shape_node(
        attrs,
        defaults,
        Style::new()
            .with(style::SHAPE, "swimlane")
            .with("startSize", LANE_HEADER)
            .with("horizontal", if horizontal { 0 } else { 1 }),
    )
}

fn pool(attrs: &ShapeAttributes) -> VisualNode {
    swimlane(attrs, base::defaults())
}

fn lane(attrs: &ShapeAttributes) -> VisualNode {
    swimlane(attrs, base::defaults().with(style::FILL_COLOR, "none"))
}

fn text_annotation(attrs: &ShapeAttributes) -> VisualNode {
    shape_node(
        attrs,
        Style::new()
            .with(style::FILL_COLOR, "none")
            .with(style::STROKE_COLOR, "#000000"),
        Style::new()
            .with(style::SHAPE, "partialRectangle")
            .with("right", 0)
            .with("top", 0)
            .with("bottom", 0)
            .with(style::ALIGN, "left")
            .with("spacingLeft", 4),
    )
}

fn group(attrs: &ShapeAttributes) -> VisualNode {
    let mut node = base::group(attrs);
    node.style = node
        .style
        .with(style::DASHED, 1)
        .with("dashPattern", "8 3 1 3")
        .with(style::ROUNDED, 1)
        .with(style::STROKE_COLOR, "#000000")
        .with(style::VERTICAL_ALIGN, "top");
    node
}

/// Sequence, message and association flows.
pub(super) fn connector(conn: &ConnectionAttributes) -> VisualEdge {
    let flow = conn.prop_str("FlowType").unwrap_or("Sequence").to_ascii_lowercase();
    let overrides = match flow.as_str() {
        "message" => Style::new()
            .with(style::DASHED, 1)
            .with(style::START_ARROW, "oval")
            .with(style::START_FILL, 0)
            .with(style::END_ARROW, "block")
            .with(style::END_FILL, 0),
        "association" => Style::new()
            .with(style::DASHED, 1)
            .with("dashPattern", "1 4")
            .with(style::END_ARROW, "none"),
        _ => {
            let mut style = Style::new()
                .with(style::END_ARROW, "block")
                .with(style::END_FILL, 1);
            if conn.prop_bool("IsDefault").unwrap_or(false) {
                style.set(style::START_ARROW, "dash");
            } else if conn.prop_bool("IsConditional").unwrap_or(false) {
                style.set(style::START_ARROW, "diamondThin");
                style.set(style::START_FILL, "0");
            }
            style
        }
    };
    edge(conn, overrides)
}

//! Input diagram snapshot: flat, id-referencing shape and connection records.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Identifier of a diagram element, unique within one diagram.
pub type ElementId = u64;

/// Named extension properties (`IsCollection`, `EventType`, `TaskType`, ...).
pub type Props = HashMap<String, Value>;

/// Plain or rich (HTML) label text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Plain(String),
    Rich { html: String },
}

impl Label {
    /// Raw label text as carried by the model.
    pub fn text(&self) -> &str {
        match self {
            Label::Plain(text) => text,
            Label::Rich { html } => html,
        }
    }

    pub fn is_rich(&self) -> bool {
        matches!(self, Label::Rich { .. })
    }
}

/// Optional label styling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelStyle {
    pub font_size: Option<f64>,
    pub font_color: Option<String>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub align: Option<String>,
    pub vertical_align: Option<String>,
}

/// Attributes of a shape element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeAttributes {
    pub id: ElementId,
    #[serde(default)]
    pub parent_id: Option<ElementId>,
    /// Type tag selecting the shape template.
    #[serde(rename = "type")]
    pub shape_type: String,
    /// Local geometry, relative to the parent container.
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Rotation in degrees.
    #[serde(default)]
    pub angle: f64,
    #[serde(default)]
    pub fill: Option<String>,
    #[serde(default)]
    pub fill_opacity: Option<f64>,
    #[serde(default)]
    pub stroke: Option<String>,
    #[serde(default)]
    pub stroke_opacity: Option<f64>,
    #[serde(default)]
    pub stroke_width: Option<f64>,
    /// End color of a linear gradient starting at `fill`.
    #[serde(default)]
    pub gradient: Option<String>,
    #[serde(default)]
    pub opacity: Option<f64>,
    #[serde(default)]
    pub label: Option<Label>,
    #[serde(default)]
    pub label_style: Option<LabelStyle>,
    /// Image source for image-like shapes.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub props: Props,
}

impl ShapeAttributes {
    /// Create a shape with the given type and local geometry.
    pub fn new(id: ElementId, shape_type: impl Into<String>, bounds: Rect) -> Self {
        Self {
            id,
            parent_id: None,
            shape_type: shape_type.into(),
            x: bounds.x0,
            y: bounds.y0,
            width: bounds.width(),
            height: bounds.height(),
            angle: 0.0,
            fill: None,
            fill_opacity: None,
            stroke: None,
            stroke_opacity: None,
            stroke_width: None,
            gradient: None,
            opacity: None,
            label: None,
            label_style: None,
            image: None,
            props: Props::new(),
        }
    }

    /// Local bounds in the parent container's coordinate space.
    pub fn local_bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    /// Plain label text, if any.
    pub fn label_text(&self) -> Option<&str> {
        self.label.as_ref().map(Label::text)
    }

    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }

    /// Boolean prop. Accepts JSON booleans, `"true"`/`"false"` and `0`/`1`;
    /// anything else is treated as absent.
    pub fn prop_bool(&self, key: &str) -> Option<bool> {
        prop_bool(&self.props, key)
    }

    /// String prop; non-string values are treated as absent.
    pub fn prop_str(&self, key: &str) -> Option<&str> {
        prop_str(&self.props, key)
    }

    /// Numeric prop; accepts numbers and numeric strings.
    pub fn prop_f64(&self, key: &str) -> Option<f64> {
        prop_f64(&self.props, key)
    }

    pub fn with_parent(mut self, parent_id: ElementId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_colors(mut self, fill: &str, stroke: &str) -> Self {
        self.fill = Some(fill.to_string());
        self.stroke = Some(stroke.to_string());
        self
    }

    pub fn with_label(mut self, text: impl Into<String>) -> Self {
        self.label = Some(Label::Plain(text.into()));
        self
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: Value) -> Self {
        self.props.insert(key.into(), value);
        self
    }
}

/// Routing style of a connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectorType {
    #[default]
    Straight,
    Curved,
    RightAngled,
}

/// Attributes of a connection element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionAttributes {
    pub id: ElementId,
    #[serde(default)]
    pub parent_id: Option<ElementId>,
    #[serde(default)]
    pub source_id: Option<ElementId>,
    #[serde(default)]
    pub target_id: Option<ElementId>,
    /// Absolute routing points: first is the source anchor, last the target
    /// anchor, the rest are waypoints.
    #[serde(default)]
    pub points: Vec<Point>,
    #[serde(default, rename = "type")]
    pub connector_type: ConnectorType,
    #[serde(default)]
    pub label: Option<Label>,
    #[serde(default)]
    pub source_label: Option<String>,
    #[serde(default)]
    pub target_label: Option<String>,
    #[serde(default)]
    pub stroke: Option<String>,
    #[serde(default)]
    pub stroke_width: Option<f64>,
    #[serde(default)]
    pub opacity: Option<f64>,
    #[serde(default)]
    pub props: Props,
}

impl ConnectionAttributes {
    pub fn new(id: ElementId, source_id: Option<ElementId>, target_id: Option<ElementId>) -> Self {
        Self {
            id,
            parent_id: None,
            source_id,
            target_id,
            points: Vec::new(),
            connector_type: ConnectorType::Straight,
            label: None,
            source_label: None,
            target_label: None,
            stroke: None,
            stroke_width: None,
            opacity: None,
            props: Props::new(),
        }
    }

    pub fn with_points(mut self, points: Vec<Point>) -> Self {
        self.points = points;
        self
    }

    pub fn with_type(mut self, connector_type: ConnectorType) -> Self {
        self.connector_type = connector_type;
        self
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: Value) -> Self {
        self.props.insert(key.into(), value);
        self
    }

    pub fn label_text(&self) -> Option<&str> {
        self.label.as_ref().map(Label::text)
    }

    pub fn prop_bool(&self, key: &str) -> Option<bool> {
        prop_bool(&self.props, key)
    }

    pub fn prop_str(&self, key: &str) -> Option<&str> {
        prop_str(&self.props, key)
    }

    /// Explicit interior waypoints (all points except the first and last).
    pub fn interior_points(&self) -> &[Point] {
        if self.points.len() > 2 {
            &self.points[1..self.points.len() - 1]
        } else {
            &[]
        }
    }
}

/// One element of the flat diagram list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DiagramElement {
    Shape(ShapeAttributes),
    Connection(ConnectionAttributes),
}

impl DiagramElement {
    pub fn id(&self) -> ElementId {
        match self {
            DiagramElement::Shape(s) => s.id,
            DiagramElement::Connection(c) => c.id,
        }
    }

    pub fn parent_id(&self) -> Option<ElementId> {
        match self {
            DiagramElement::Shape(s) => s.parent_id,
            DiagramElement::Connection(c) => c.parent_id,
        }
    }

    pub fn is_shape(&self) -> bool {
        matches!(self, DiagramElement::Shape(_))
    }

    pub fn as_shape(&self) -> Option<&ShapeAttributes> {
        match self {
            DiagramElement::Shape(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_connection(&self) -> Option<&ConnectionAttributes> {
        match self {
            DiagramElement::Connection(c) => Some(c),
            _ => None,
        }
    }
}

impl From<ShapeAttributes> for DiagramElement {
    fn from(shape: ShapeAttributes) -> Self {
        DiagramElement::Shape(shape)
    }
}

impl From<ConnectionAttributes> for DiagramElement {
    fn from(connection: ConnectionAttributes) -> Self {
        DiagramElement::Connection(connection)
    }
}

/// An immutable diagram snapshot handed over for one render pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagram {
    /// Selects the shape template registry (`business-process`, `storyboard`, ...).
    #[serde(default)]
    pub diagram_type: String,
    /// Elements in draw order.
    #[serde(default)]
    pub elements: Vec<DiagramElement>,
}

impl Diagram {
    pub fn new(diagram_type: impl Into<String>) -> Self {
        Self {
            diagram_type: diagram_type.into(),
            elements: Vec::new(),
        }
    }

    pub fn push(&mut self, element: impl Into<DiagramElement>) {
        self.elements.push(element.into());
    }

    pub fn with(mut self, element: impl Into<DiagramElement>) -> Self {
        self.push(element);
        self
    }

    /// Find an element by id (first occurrence).
    pub fn element(&self, id: ElementId) -> Option<&DiagramElement> {
        self.elements.iter().find(|e| e.id() == id)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn prop_bool(props: &Props, key: &str) -> Option<bool> {
    match props.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        _ => None,
    }
}

fn prop_str<'a>(props: &'a Props, key: &str) -> Option<&'a str> {
    props.get(key)?.as_str()
}

fn prop_f64(props: &Props, key: &str) -> Option<f64> {
    match props.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

//! Realization descriptions produced by shape and connector templates.
//!
//! Templates are pure: they return these values and the scene renderer turns
//! them into cells on a rendering surface.

use crate::model::ElementId;
use crate::style::{self, Style};
use kurbo::{Point, Rect, Size, Vec2};

/// A vertex to be created on the rendering surface.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualNode {
    /// Model element this node realizes; `None` for decorations.
    pub element: Option<ElementId>,
    /// Geometry relative to the parent cell.
    pub geometry: Rect,
    pub style: Style,
    pub label: Option<String>,
    pub tooltip: Option<String>,
    /// Decorations (markers, overlays, compartments), positioned relative to
    /// this node's top-left corner.
    pub children: Vec<VisualNode>,
}

impl VisualNode {
    pub fn new(geometry: Rect, style: Style) -> Self {
        Self {
            element: None,
            geometry,
            style,
            label: None,
            tooltip: None,
            children: Vec::new(),
        }
    }

    /// A non-selectable decoration of the given size at `offset` from the
    /// parent's top-left corner.
    pub fn decoration(offset: Point, size: Size, style: Style) -> Self {
        Self::new(
            Rect::from_origin_size(offset, size),
            style.with(style::SELECTABLE, 0),
        )
    }

    pub fn with_element(mut self, element: ElementId) -> Self {
        self.element = Some(element);
        self
    }

    pub fn with_label(mut self, label: Option<&str>) -> Self {
        self.label = label.map(str::to_string);
        self
    }

    pub fn with_child(mut self, child: VisualNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn push_child(&mut self, child: VisualNode) {
        self.children.push(child);
    }

    /// Whether the user can select this node directly.
    pub fn is_selectable(&self) -> bool {
        self.style.get(style::SELECTABLE) != Some("0")
    }

    /// Move the node by `delta` in its parent's space.
    pub fn translate(&mut self, delta: Vec2) {
        self.geometry = self.geometry + delta;
    }
}

/// An edge to be created on the rendering surface.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualEdge {
    pub element: Option<ElementId>,
    pub style: Style,
    pub label: Option<String>,
    pub source_label: Option<String>,
    pub target_label: Option<String>,
}

impl VisualEdge {
    pub fn new(style: Style) -> Self {
        Self {
            element: None,
            style,
            label: None,
            source_label: None,
            target_label: None,
        }
    }
}

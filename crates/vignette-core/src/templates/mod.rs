//! Shape template registry.
//!
//! Each diagram domain is a table of `type tag -> builder` entries layered on
//! top of a shared base table. Resolution never fails: domain table, base
//! table, stencils, then an unstyled fallback rectangle.

mod base;
mod bpmn;
pub(crate) mod compose;
mod domain_model;
mod generic;
mod mockup;
mod storyboard;
mod use_case;

pub use bpmn::{MARKER_SHIFT, MARKER_SIZE, MARKER_SPACING, Marker, activity_markers, marker_offset};
pub use compose::{FONT_BOLD, FONT_ITALIC, FONT_UNDERLINE, default_edge_style, default_style, font_style_bits};

use crate::model::{ConnectionAttributes, ShapeAttributes};
use crate::stencil::{Stencil, StencilSet};
use crate::style::{self, Style};
use crate::visual::{VisualEdge, VisualNode};
use std::fmt;

/// Builds the visual of one shape. Must not depend on anything but its input.
pub type ShapeBuilder = fn(&ShapeAttributes) -> VisualNode;

/// Builds the visual of one connection.
pub type ConnectorBuilder = fn(&ConnectionAttributes) -> VisualEdge;

pub(crate) type ShapeTable = &'static [(&'static str, ShapeBuilder)];

/// Diagram domain selecting the active shape table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DiagramKind {
    BusinessProcess,
    DomainModel,
    UseCase,
    UiMockup,
    Storyboard,
    #[default]
    Generic,
}

impl DiagramKind {
    pub const ALL: [DiagramKind; 6] = [
        DiagramKind::BusinessProcess,
        DiagramKind::DomainModel,
        DiagramKind::UseCase,
        DiagramKind::UiMockup,
        DiagramKind::Storyboard,
        DiagramKind::Generic,
    ];

    /// Resolve a `diagramType` string. Case, `-`, `_` and spaces are ignored;
    /// unknown types map to [`DiagramKind::Generic`].
    pub fn from_diagram_type(diagram_type: &str) -> Self {
        let normalized: String = diagram_type
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "businessprocess" | "bpmn" => DiagramKind::BusinessProcess,
            "domainmodel" | "classdiagram" => DiagramKind::DomainModel,
            "usecase" => DiagramKind::UseCase,
            "uimockup" | "mockup" => DiagramKind::UiMockup,
            "storyboard" => DiagramKind::Storyboard,
            "generic" | "" => DiagramKind::Generic,
            _ => {
                log::debug!("Unknown diagram type '{}', using generic shapes", diagram_type);
                DiagramKind::Generic
            }
        }
    }

    /// Canonical `diagramType` string.
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagramKind::BusinessProcess => "business-process",
            DiagramKind::DomainModel => "domain-model",
            DiagramKind::UseCase => "use-case",
            DiagramKind::UiMockup => "ui-mockup",
            DiagramKind::Storyboard => "storyboard",
            DiagramKind::Generic => "generic",
        }
    }

    fn shapes(&self) -> ShapeTable {
        match self {
            DiagramKind::BusinessProcess => bpmn::SHAPES,
            DiagramKind::DomainModel => domain_model::SHAPES,
            DiagramKind::UseCase => use_case::SHAPES,
            DiagramKind::UiMockup => mockup::SHAPES,
            DiagramKind::Storyboard => storyboard::SHAPES,
            DiagramKind::Generic => generic::SHAPES,
        }
    }

    fn connector(&self) -> ConnectorBuilder {
        match self {
            DiagramKind::BusinessProcess => bpmn::connector,
            DiagramKind::DomainModel => domain_model::connector,
            DiagramKind::UseCase => use_case::connector,
            DiagramKind::UiMockup => mockup::connector,
            DiagramKind::Storyboard => storyboard::connector,
            DiagramKind::Generic => generic::connector,
        }
    }

    fn tooltips(&self) -> bool {
        matches!(
            self,
            DiagramKind::BusinessProcess | DiagramKind::DomainModel | DiagramKind::Storyboard
        )
    }
}

impl fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved shape template.
#[derive(Debug, Clone, Copy)]
pub enum ShapeTemplate<'a> {
    Builtin(ShapeBuilder),
    Stencil(&'a Stencil),
    Fallback,
}

impl ShapeTemplate<'_> {
    pub fn build(&self, attrs: &ShapeAttributes) -> VisualNode {
        match self {
            ShapeTemplate::Builtin(builder) => builder(attrs),
            ShapeTemplate::Stencil(stencil) => stencil.build(attrs),
            ShapeTemplate::Fallback => fallback_shape(attrs),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ShapeTemplate::Fallback)
    }
}

/// Unstyled rectangle with a black stroke and white fill.
pub fn fallback_shape(attrs: &ShapeAttributes) -> VisualNode {
    let style = Style::new()
        .with(style::STROKE_COLOR, "#000000")
        .with(style::FILL_COLOR, "#ffffff");
    VisualNode::new(attrs.local_bounds(), style)
        .with_element(attrs.id)
        .with_label(attrs.label_text())
}

fn lookup(table: ShapeTable, shape_type: &str) -> Option<ShapeBuilder> {
    table
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(shape_type))
        .map(|&(_, builder)| builder)
}

/// Shape and connector templates of one diagram domain.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    kind: DiagramKind,
    stencils: StencilSet,
    tooltips: Option<bool>,
}

impl TemplateRegistry {
    pub fn for_domain(kind: DiagramKind) -> Self {
        Self {
            kind,
            stencils: StencilSet::default(),
            tooltips: None,
        }
    }

    pub fn for_diagram_type(diagram_type: &str) -> Self {
        Self::for_domain(DiagramKind::from_diagram_type(diagram_type))
    }

    pub fn with_stencils(mut self, stencils: StencilSet) -> Self {
        self.stencils = stencils;
        self
    }

    /// Force tooltips on or off regardless of the domain default.
    pub fn with_tooltips(mut self, enabled: Option<bool>) -> Self {
        self.tooltips = enabled;
        self
    }

    pub fn kind(&self) -> DiagramKind {
        self.kind
    }

    pub fn stencils(&self) -> &StencilSet {
        &self.stencils
    }

    /// Resolve the template for a shape type.
    pub fn shape_template(&self, shape_type: &str) -> ShapeTemplate<'_> {
        if let Some(builder) = lookup(self.kind.shapes(), shape_type) {
            return ShapeTemplate::Builtin(builder);
        }
        if let Some(builder) = lookup(base::SHAPES, shape_type) {
            return ShapeTemplate::Builtin(builder);
        }
        if let Some(stencil) = self.stencils.get(shape_type) {
            return ShapeTemplate::Stencil(stencil);
        }
        ShapeTemplate::Fallback
    }

    pub fn connector_template(&self) -> ConnectorBuilder {
        self.kind.connector()
    }

    pub fn tooltips_enabled(&self) -> bool {
        self.tooltips.unwrap_or_else(|| self.kind.tooltips())
    }

    /// Type tags with a built-in builder (domain table first, then base).
    pub fn shape_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        let domain = self.kind.shapes();
        domain.iter().map(|&(name, _)| name).chain(
            base::SHAPES
                .iter()
                .map(|&(name, _)| name)
                .filter(move |name| lookup(domain, name).is_none()),
        )
    }

    /// Realize a shape, attaching its tooltip when tooltips are enabled.
    pub fn build_shape(&self, attrs: &ShapeAttributes) -> VisualNode {
        let template = self.shape_template(&attrs.shape_type);
        if template.is_fallback() {
            log::warn!(
                "No template for shape type '{}' (element {}), using fallback",
                attrs.shape_type,
                attrs.id
            );
        }
        let mut node = template.build(attrs);
        if self.tooltips_enabled() {
            node.tooltip = tooltip_text(attrs);
        }
        node
    }

    pub fn build_connector(&self, conn: &ConnectionAttributes) -> VisualEdge {
        (self.connector_template())(conn)
    }
}

/// Tooltip of a shape: `Tooltip` or `Documentation` prop, else the label.
pub fn tooltip_text(attrs: &ShapeAttributes) -> Option<String> {
    attrs
        .prop_str("Tooltip")
        .or_else(|| attrs.prop_str("Documentation"))
        .or_else(|| attrs.label_text())
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
}

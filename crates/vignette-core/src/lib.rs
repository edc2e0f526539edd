//! Vignette Core Library
//!
//! Rendering-surface independent parts of the diagram pipeline: the input
//! model, style descriptors, shape templates per diagram domain, hierarchy
//! reconstruction and connector routing.

pub mod camera;
pub mod color;
pub mod hierarchy;
pub mod model;
pub mod routing;
pub mod selection;
pub mod stencil;
pub mod style;
pub mod templates;
pub mod visual;

pub use camera::Camera;
pub use color::{SerializableColor, style_color};
pub use hierarchy::{Hierarchy, HierarchyNode, NodeIndex};
pub use model::{
    ConnectionAttributes, ConnectorType, Diagram, DiagramElement, ElementId, Label, LabelStyle,
    ShapeAttributes,
};
pub use routing::{AnchorPair, Endpoint, Route};
pub use selection::CellTree;
pub use stencil::{StencilError, StencilProvider, StencilResult, StencilSet};
pub use style::Style;
pub use templates::{DiagramKind, ShapeTemplate, TemplateRegistry};
pub use visual::{VisualEdge, VisualNode};

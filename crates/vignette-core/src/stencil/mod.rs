//! Custom shape stencils supplied per diagram type.
//!
//! Stencils are loaded before a render pass starts. A missing or unreadable
//! stencil document never aborts rendering: [`load_or_default`] logs the
//! failure and returns an empty set.

mod file;
mod memory;

pub use file::DirectoryStencils;
pub use memory::MemoryStencils;

use crate::model::ShapeAttributes;
use crate::style::{self, Style};
use crate::templates::compose::shape_node;
use crate::visual::VisualNode;
use kurbo::Rect;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stencil lookup errors.
#[derive(Debug, Error)]
pub enum StencilError {
    #[error("No stencils for diagram type: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result type for stencil operations.
pub type StencilResult<T> = Result<T, StencilError>;

/// A named custom shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stencil {
    /// Shape type tag this stencil serves.
    pub name: String,
    /// Renderer shape name; defaults to `stencil(<name>)`.
    #[serde(default)]
    pub shape: Option<String>,
    /// Default style, layered underneath the shape's own attributes.
    #[serde(default)]
    pub style: Style,
    /// Default size used when a shape declares no width or height.
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

impl Stencil {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shape: None,
            style: Style::new(),
            width: None,
            height: None,
        }
    }

    pub fn with_shape(mut self, shape: impl Into<String>) -> Self {
        self.shape = Some(shape.into());
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Renderer shape name.
    pub fn shape_name(&self) -> String {
        self.shape
            .clone()
            .unwrap_or_else(|| format!("stencil({})", self.name))
    }

    /// Realize a shape with this stencil.
    pub fn build(&self, attrs: &ShapeAttributes) -> VisualNode {
        let mut node = shape_node(
            attrs,
            self.style.clone(),
            Style::new().with(style::SHAPE, self.shape_name()),
        );
        let width = if attrs.width > 0.0 { attrs.width } else { self.width.unwrap_or(0.0) };
        let height = if attrs.height > 0.0 { attrs.height } else { self.height.unwrap_or(0.0) };
        node.geometry = Rect::new(attrs.x, attrs.y, attrs.x + width, attrs.y + height);
        node
    }
}

/// Stencils available for one diagram type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StencilSet {
    #[serde(default)]
    pub stencils: Vec<Stencil>,
}

impl StencilSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, stencil: Stencil) -> Self {
        self.stencils.push(stencil);
        self
    }

    /// Find a stencil by shape type (ASCII case-insensitive, first match).
    pub fn get(&self, name: &str) -> Option<&Stencil> {
        self.stencils.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn len(&self) -> usize {
        self.stencils.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stencils.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Source of stencil documents, keyed by diagram type.
pub trait StencilProvider: Send + Sync {
    /// Load the stencils for a diagram type.
    fn load(&self, diagram_type: &str) -> StencilResult<StencilSet>;

    /// List the diagram types that have stencils.
    fn list(&self) -> StencilResult<Vec<String>>;
}

/// Load stencils for a diagram type, falling back to an empty set.
pub fn load_or_default(provider: &dyn StencilProvider, diagram_type: &str) -> StencilSet {
    match provider.load(diagram_type) {
        Ok(set) => {
            log::debug!("Loaded {} stencils for '{}'", set.len(), diagram_type);
            set
        }
        Err(StencilError::NotFound(_)) => {
            log::debug!("No stencils for '{}'", diagram_type);
            StencilSet::default()
        }
        Err(e) => {
            log::warn!("Ignoring stencils for '{}': {}", diagram_type, e);
            StencilSet::default()
        }
    }
}

//! Vignette Render Library
//!
//! Scene renderer and rendering-surface abstraction for Vignette.
//! The bundled surface is an in-memory scene graph that can be exported to SVG.

mod config;
pub mod export;
pub mod scene;
mod surface;
mod view;

pub use config::ViewConfig;
pub use export::{to_svg, to_svg_string};
pub use scene::{Cell, CellKind, SceneGraph, SceneSnapshot};
pub use surface::{CellId, EdgeGeometry, Surface, SurfaceError, SurfaceResult};
pub use view::{DiagramView, RenderPhase, SelectionListener, ViewError, ViewResult};

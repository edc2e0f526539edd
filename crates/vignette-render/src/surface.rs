//! Rendering-surface abstraction.
//!
//! The scene renderer drives a retained-mode scene graph through this small
//! operation set and never reaches into its internals.

use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use vignette_core::Style;

/// Identifier of a cell (vertex or edge) on a surface.
pub type CellId = Uuid;

/// Surface errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("Unknown cell: {0}")]
    UnknownCell(CellId),
    #[error("Cell is not a vertex: {0}")]
    NotAVertex(CellId),
    #[error("Cell {0} cannot contain one of its ancestors")]
    Cycle(CellId),
    #[error("Surface is closed")]
    Closed,
}

/// Result type for surface operations.
pub type SurfaceResult<T> = Result<T, SurfaceError>;

/// Routing geometry of an edge, in its parent's coordinate space.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeGeometry {
    /// Free source end, used when the edge has no source cell.
    pub source_point: Option<Point>,
    /// Free target end, used when the edge has no target cell.
    pub target_point: Option<Point>,
    pub waypoints: Vec<Point>,
}

/// Operations a retained-mode scene graph exposes to the scene renderer.
pub trait Surface {
    /// The default parent of top-level cells.
    fn root(&self) -> CellId;

    /// Open an update transaction. Transactions nest.
    fn begin_update(&mut self);

    /// Close an update transaction; changes become visible when the
    /// outermost one closes.
    fn end_update(&mut self);

    /// Create a vertex with geometry relative to `parent`.
    fn insert_vertex(
        &mut self,
        parent: CellId,
        geometry: Rect,
        style: Style,
        label: Option<String>,
    ) -> SurfaceResult<CellId>;

    /// Create an edge. Either terminal may be absent for dangling edges.
    fn insert_edge(
        &mut self,
        parent: CellId,
        source: Option<CellId>,
        target: Option<CellId>,
        style: Style,
        label: Option<String>,
    ) -> SurfaceResult<CellId>;

    fn geometry(&self, cell: CellId) -> SurfaceResult<Rect>;

    fn set_geometry(&mut self, cell: CellId, geometry: Rect) -> SurfaceResult<()>;

    fn set_edge_geometry(&mut self, edge: CellId, geometry: EdgeGeometry) -> SurfaceResult<()>;

    fn style(&self, cell: CellId) -> SurfaceResult<&Style>;

    fn set_style(&mut self, cell: CellId, style: Style) -> SurfaceResult<()>;

    fn set_tooltip(&mut self, cell: CellId, tooltip: Option<String>) -> SurfaceResult<()>;

    /// Move `child` under `parent`, keeping its geometry values unchanged.
    fn insert_child(&mut self, parent: CellId, child: CellId) -> SurfaceResult<()>;

    /// Move `cells` under `group`, re-expressing their geometry relative to
    /// the group. A group without size first takes the union of the cells.
    fn group_cells(&mut self, group: CellId, cells: &[CellId]) -> SurfaceResult<()>;

    /// Parent of a cell; `None` for the root and unknown cells.
    fn parent(&self, cell: CellId) -> Option<CellId>;

    /// Whether the user may select the cell.
    fn is_selectable(&self, cell: CellId) -> bool;

    fn selection(&self) -> Vec<CellId>;

    fn set_selection(&mut self, cells: Vec<CellId>);

    /// Size a label needs when drawn with `style`.
    fn preferred_label_size(&self, text: &str, style: &Style) -> Size;

    /// Scale and center the view on a rectangle in diagram coordinates.
    fn zoom_to_rect(&mut self, rect: Rect, padding: f64);

    /// Enable or disable user interaction with the scene.
    fn set_interactive(&mut self, interactive: bool);

    /// Remove every cell except the root.
    fn clear(&mut self);

    /// Release the scene. Every later mutation fails with [`SurfaceError::Closed`].
    fn destroy(&mut self);

    /// Bounds of a cell in diagram coordinates.
    fn absolute_geometry(&self, cell: CellId) -> SurfaceResult<Rect> {
        let mut bounds = self.geometry(cell)?;
        let mut current = self.parent(cell);
        while let Some(parent) = current {
            if parent == self.root() {
                break;
            }
            let origin = self.geometry(parent)?.origin();
            bounds = bounds + origin.to_vec2();
            current = self.parent(parent);
        }
        Ok(bounds)
    }
}

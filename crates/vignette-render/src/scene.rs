//! In-memory retained scene graph.

use crate::surface::{CellId, EdgeGeometry, Surface, SurfaceError, SurfaceResult};
use kurbo::{Rect, Size};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;
use vignette_core::Camera;
use vignette_core::style::{self, Style};

/// Font size assumed by label measurement when the style has none.
pub const DEFAULT_FONT_SIZE: f64 = 12.0;
const CHAR_WIDTH_FACTOR: f64 = 0.6;
const LINE_HEIGHT_FACTOR: f64 = 1.4;

/// Kind of a scene cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CellKind {
    Root,
    Vertex,
    Edge {
        source: Option<CellId>,
        target: Option<CellId>,
        #[serde(flatten)]
        route: EdgeGeometry,
    },
}

/// A vertex or edge in the scene.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub id: CellId,
    #[serde(flatten)]
    pub kind: CellKind,
    pub parent: Option<CellId>,
    #[serde(skip)]
    pub children: Vec<CellId>,
    /// Geometry relative to the parent; empty for edges.
    pub geometry: Rect,
    pub style: Style,
    pub label: Option<String>,
    pub tooltip: Option<String>,
}

impl Cell {
    fn new(kind: CellKind, parent: Option<CellId>, geometry: Rect, style: Style, label: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            parent,
            children: Vec::new(),
            geometry,
            style,
            label,
            tooltip: None,
        }
    }

    pub fn is_vertex(&self) -> bool {
        matches!(self.kind, CellKind::Vertex)
    }

    pub fn is_edge(&self) -> bool {
        matches!(self.kind, CellKind::Edge { .. })
    }

    /// Source and target cells of an edge.
    pub fn terminals(&self) -> Option<(Option<CellId>, Option<CellId>)> {
        match self.kind {
            CellKind::Edge { source, target, .. } => Some((source, target)),
            _ => None,
        }
    }

    pub fn route(&self) -> Option<&EdgeGeometry> {
        match &self.kind {
            CellKind::Edge { route, .. } => Some(route),
            _ => None,
        }
    }
}

/// Retained scene graph implementing [`Surface`].
#[derive(Debug)]
pub struct SceneGraph {
    cells: HashMap<CellId, Cell>,
    root: CellId,
    update_depth: usize,
    dirty: bool,
    revision: u64,
    selection: Vec<CellId>,
    interactive: bool,
    camera: Camera,
    closed: bool,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        let root = Cell::new(CellKind::Root, None, Rect::ZERO, Style::new(), None);
        let root_id = root.id;
        Self {
            cells: HashMap::from([(root_id, root)]),
            root: root_id,
            update_depth: 0,
            dirty: false,
            revision: 0,
            selection: Vec::new(),
            interactive: true,
            camera: Camera::default(),
            closed: false,
        }
    }

    pub fn with_viewport(mut self, viewport: Size) -> Self {
        self.camera.viewport = viewport;
        self
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(&id)
    }

    /// Children of a cell in draw order.
    pub fn children(&self, id: CellId) -> &[CellId] {
        self.cells.get(&id).map(|c| c.children.as_slice()).unwrap_or_default()
    }

    /// All cells except the root, parents before children, siblings in draw order.
    pub fn cells_in_order(&self) -> Vec<&Cell> {
        let mut out = Vec::with_capacity(self.cells.len());
        let mut stack: Vec<CellId> = self.children(self.root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if let Some(cell) = self.cells.get(&id) {
                out.push(cell);
                stack.extend(cell.children.iter().rev().copied());
            }
        }
        out
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Cell> {
        self.cells_in_order().into_iter().filter(|c| c.is_vertex())
    }

    pub fn edges(&self) -> impl Iterator<Item = &Cell> {
        self.cells_in_order().into_iter().filter(|c| c.is_edge())
    }

    /// Number of cells, excluding the root.
    pub fn len(&self) -> usize {
        self.cells.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Advances once per closed outermost transaction that changed something.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn update_depth(&self) -> usize {
        self.update_depth
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Union of all top-level vertex bounds, in diagram coordinates.
    pub fn content_bounds(&self) -> Option<Rect> {
        self.children(self.root)
            .iter()
            .filter_map(|id| self.cells.get(id))
            .filter(|c| c.is_vertex())
            .map(|c| c.geometry)
            .reduce(|a, b| a.union(b))
    }

    fn touch(&mut self) {
        if self.update_depth > 0 {
            self.dirty = true;
        } else {
            self.revision += 1;
        }
    }

    fn check_open(&self) -> SurfaceResult<()> {
        if self.closed {
            Err(SurfaceError::Closed)
        } else {
            Ok(())
        }
    }

    fn get(&self, id: CellId) -> SurfaceResult<&Cell> {
        self.cells.get(&id).ok_or(SurfaceError::UnknownCell(id))
    }

    fn get_mut(&mut self, id: CellId) -> SurfaceResult<&mut Cell> {
        self.cells.get_mut(&id).ok_or(SurfaceError::UnknownCell(id))
    }

    /// Check that `parent` can hold children.
    fn container(&self, parent: CellId) -> SurfaceResult<()> {
        match self.get(parent)?.kind {
            CellKind::Edge { .. } => Err(SurfaceError::NotAVertex(parent)),
            _ => Ok(()),
        }
    }

    fn vertex_or_edge(&self, id: CellId) -> SurfaceResult<()> {
        self.get(id)?;
        Ok(())
    }

    fn attach(&mut self, parent: CellId, cell: Cell) -> CellId {
        let id = cell.id;
        self.cells.insert(id, cell);
        if let Some(parent) = self.cells.get_mut(&parent) {
            parent.children.push(id);
        }
        self.touch();
        id
    }

    fn is_ancestor_or_self(&self, ancestor: CellId, mut cell: CellId) -> bool {
        loop {
            if cell == ancestor {
                return true;
            }
            match self.cells.get(&cell).and_then(|c| c.parent) {
                Some(parent) => cell = parent,
                None => return false,
            }
        }
    }
}

impl Surface for SceneGraph {
    fn root(&self) -> CellId {
        self.root
    }

    fn begin_update(&mut self) {
        self.update_depth += 1;
    }

    fn end_update(&mut self) {
        if self.update_depth == 0 {
            log::warn!("end_update called without a matching begin_update");
            return;
        }
        self.update_depth -= 1;
        if self.update_depth == 0 && self.dirty {
            self.dirty = false;
            self.revision += 1;
        }
    }

    fn insert_vertex(
        &mut self,
        parent: CellId,
        geometry: Rect,
        style: Style,
        label: Option<String>,
    ) -> SurfaceResult<CellId> {
        self.check_open()?;
        self.container(parent)?;
        let cell = Cell::new(CellKind::Vertex, Some(parent), geometry, style, label);
        Ok(self.attach(parent, cell))
    }

    fn insert_edge(
        &mut self,
        parent: CellId,
        source: Option<CellId>,
        target: Option<CellId>,
        style: Style,
        label: Option<String>,
    ) -> SurfaceResult<CellId> {
        self.check_open()?;
        self.container(parent)?;
        for terminal in [source, target].into_iter().flatten() {
            if !self.get(terminal)?.is_vertex() {
                return Err(SurfaceError::NotAVertex(terminal));
            }
        }
        let kind = CellKind::Edge {
            source,
            target,
            route: EdgeGeometry::default(),
        };
        let cell = Cell::new(kind, Some(parent), Rect::ZERO, style, label);
        Ok(self.attach(parent, cell))
    }

    fn geometry(&self, cell: CellId) -> SurfaceResult<Rect> {
        let cell = self.get(cell)?;
        match cell.kind {
            CellKind::Edge { .. } => Err(SurfaceError::NotAVertex(cell.id)),
            _ => Ok(cell.geometry),
        }
    }

    fn set_geometry(&mut self, cell: CellId, geometry: Rect) -> SurfaceResult<()> {
        self.check_open()?;
        let target = self.get_mut(cell)?;
        if !target.is_vertex() {
            return Err(SurfaceError::NotAVertex(cell));
        }
        target.geometry = geometry;
        self.touch();
        Ok(())
    }

    fn set_edge_geometry(&mut self, edge: CellId, geometry: EdgeGeometry) -> SurfaceResult<()> {
        self.check_open()?;
        match &mut self.get_mut(edge)?.kind {
            CellKind::Edge { route, .. } => *route = geometry,
            _ => return Err(SurfaceError::UnknownCell(edge)),
        }
        self.touch();
        Ok(())
    }

    fn style(&self, cell: CellId) -> SurfaceResult<&Style> {
        Ok(&self.get(cell)?.style)
    }

    fn set_style(&mut self, cell: CellId, style: Style) -> SurfaceResult<()> {
        self.check_open()?;
        self.get_mut(cell)?.style = style;
        self.touch();
        Ok(())
    }

    fn set_tooltip(&mut self, cell: CellId, tooltip: Option<String>) -> SurfaceResult<()> {
        self.check_open()?;
        self.get_mut(cell)?.tooltip = tooltip;
        self.touch();
        Ok(())
    }

    fn insert_child(&mut self, parent: CellId, child: CellId) -> SurfaceResult<()> {
        self.check_open()?;
        self.container(parent)?;
        self.vertex_or_edge(child)?;
        if child == self.root || self.is_ancestor_or_self(child, parent) {
            return Err(SurfaceError::Cycle(parent));
        }

        let previous = self.get(child)?.parent;
        if let Some(previous) = previous.and_then(|p| self.cells.get_mut(&p)) {
            previous.children.retain(|&c| c != child);
        }
        self.get_mut(child)?.parent = Some(parent);
        self.get_mut(parent)?.children.push(child);
        self.touch();
        Ok(())
    }

    fn group_cells(&mut self, group: CellId, cells: &[CellId]) -> SurfaceResult<()> {
        self.check_open()?;
        let mut bounds = self.geometry(group)?;
        if bounds.width() <= 0.0 && bounds.height() <= 0.0 {
            let union = cells
                .iter()
                .filter_map(|&c| self.geometry(c).ok())
                .reduce(|a, b| a.union(b));
            if let Some(union) = union {
                bounds = union;
                self.set_geometry(group, bounds)?;
            }
        }

        let origin = bounds.origin().to_vec2();
        for &cell in cells {
            if let Ok(geometry) = self.geometry(cell) {
                self.set_geometry(cell, geometry - origin)?;
            }
            self.insert_child(group, cell)?;
        }
        Ok(())
    }

    fn parent(&self, cell: CellId) -> Option<CellId> {
        self.cells.get(&cell).and_then(|c| c.parent)
    }

    fn is_selectable(&self, cell: CellId) -> bool {
        match self.cells.get(&cell) {
            Some(cell) => cell.kind != CellKind::Root && cell.style.get(style::SELECTABLE) != Some("0"),
            None => false,
        }
    }

    fn selection(&self) -> Vec<CellId> {
        self.selection.clone()
    }

    fn set_selection(&mut self, cells: Vec<CellId>) {
        if self.closed {
            return;
        }
        self.selection = cells
            .into_iter()
            .filter(|id| self.cells.contains_key(id) && *id != self.root)
            .collect();
    }

    fn preferred_label_size(&self, text: &str, style: &Style) -> Size {
        let font_size = style
            .get_f64(style::FONT_SIZE)
            .filter(|s| *s > 0.0)
            .unwrap_or(DEFAULT_FONT_SIZE);
        let (lines, widest) = text
            .lines()
            .fold((0usize, 0usize), |(n, w), line| (n + 1, w.max(line.chars().count())));
        Size::new(
            widest as f64 * font_size * CHAR_WIDTH_FACTOR,
            lines.max(1) as f64 * font_size * LINE_HEIGHT_FACTOR,
        )
    }

    fn zoom_to_rect(&mut self, rect: Rect, padding: f64) {
        self.camera.zoom_to_rect(rect, padding);
    }

    fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    fn clear(&mut self) {
        let root = self.root;
        self.cells.retain(|&id, _| id == root);
        if let Some(root) = self.cells.get_mut(&root) {
            root.children.clear();
        }
        self.selection.clear();
        self.touch();
    }

    fn destroy(&mut self) {
        self.clear();
        self.closed = true;
    }
}

/// Point-in-time view of a scene, for serialization.
#[derive(Debug, Serialize)]
pub struct SceneSnapshot<'a> {
    pub revision: u64,
    pub cells: Vec<&'a Cell>,
}

impl SceneGraph {
    pub fn snapshot(&self) -> SceneSnapshot<'_> {
        SceneSnapshot {
            revision: self.revision,
            cells: self.cells_in_order(),
        }
    }
}

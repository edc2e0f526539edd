//! Scene renderer: realizes a diagram snapshot on a rendering surface.

use crate::config::ViewConfig;
use crate::surface::{CellId, EdgeGeometry, Surface, SurfaceError};
use kurbo::{Point, Rect, Vec2};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use thiserror::Error;
use vignette_core::hierarchy::{NodeIndex, ROOT};
use vignette_core::routing::{self, Endpoint};
use vignette_core::selection::{self, CellTree};
use vignette_core::stencil::{self, StencilProvider, StencilSet};
use vignette_core::style::{self, Style};
use vignette_core::{Diagram, DiagramElement, ElementId, Hierarchy, TemplateRegistry, VisualNode};

/// Scene renderer errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewError {
    #[error("View has been destroyed")]
    Destroyed,
    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),
    #[error("Unknown element: {0}")]
    UnknownElement(ElementId),
}

/// Result type for view operations.
pub type ViewResult<T> = Result<T, ViewError>;

/// Callback receiving the selected elements after a user selection.
pub type SelectionListener = Box<dyn FnMut(&[&DiagramElement])>;

/// Progress of the current render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPhase {
    Idle,
    HierarchyBuilt,
    ShapesRealized,
    ConnectionsRealized,
    /// Terminal: the view was destroyed.
    Destroyed,
}

/// Parent links of realized cells, for selection resolution.
struct Cells<'a, S>(&'a S);

impl<S: Surface> CellTree for Cells<'_, S> {
    type Cell = CellId;

    fn parent(&self, cell: CellId) -> Option<CellId> {
        self.0.parent(cell)
    }

    fn is_selectable(&self, cell: CellId) -> bool {
        self.0.is_selectable(cell)
    }
}

/// Renders diagrams onto a [`Surface`] and tracks selection.
pub struct DiagramView<S: Surface> {
    surface: S,
    config: ViewConfig,
    stencils: Option<Box<dyn StencilProvider>>,
    diagram: Option<Diagram>,
    /// First realized cell of each shape id.
    created_vertices: HashMap<ElementId, CellId>,
    created_edges: HashMap<ElementId, CellId>,
    cell_elements: HashMap<CellId, ElementId>,
    selection: Vec<CellId>,
    last_selected: Option<CellId>,
    selection_disabled: bool,
    listeners: Vec<SelectionListener>,
    phase: RenderPhase,
}

impl<S: Surface + fmt::Debug> fmt::Debug for DiagramView<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagramView")
            .field("surface", &self.surface)
            .field("config", &self.config)
            .field("phase", &self.phase)
            .field("vertices", &self.created_vertices.len())
            .field("edges", &self.created_edges.len())
            .field("selection", &self.selection)
            .finish_non_exhaustive()
    }
}

impl<S: Surface> DiagramView<S> {
    pub fn new(mut surface: S, config: ViewConfig) -> Self {
        let selection_disabled = config.disable_user_selection;
        surface.set_interactive(!selection_disabled);
        Self {
            surface,
            config,
            stencils: None,
            diagram: None,
            created_vertices: HashMap::new(),
            created_edges: HashMap::new(),
            cell_elements: HashMap::new(),
            selection: Vec::new(),
            last_selected: None,
            selection_disabled,
            listeners: Vec::new(),
            phase: RenderPhase::Idle,
        }
    }

    /// Use `provider` to look up custom stencils at the start of each pass.
    pub fn with_stencil_provider(mut self, provider: Box<dyn StencilProvider>) -> Self {
        self.stencils = Some(provider);
        self
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn phase(&self) -> RenderPhase {
        self.phase
    }

    /// The diagram of the last successful render.
    pub fn diagram(&self) -> Option<&Diagram> {
        self.diagram.as_ref()
    }

    /// Cell realizing a shape or connection.
    pub fn cell_for(&self, id: ElementId) -> Option<CellId> {
        self.created_vertices
            .get(&id)
            .or_else(|| self.created_edges.get(&id))
            .copied()
    }

    /// Element a cell realizes. Decorations have none.
    pub fn element_for(&self, cell: CellId) -> Option<ElementId> {
        self.cell_elements.get(&cell).copied()
    }

    fn ensure_alive(&self) -> ViewResult<()> {
        if self.phase == RenderPhase::Destroyed {
            Err(ViewError::Destroyed)
        } else {
            Ok(())
        }
    }

    fn enter(&mut self, phase: RenderPhase) {
        log::debug!("Render phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    fn reset_indices(&mut self) {
        self.created_vertices.clear();
        self.created_edges.clear();
        self.cell_elements.clear();
        self.selection.clear();
        self.last_selected = None;
    }

    /// Replace the scene with a rendering of `diagram`.
    ///
    /// The whole pass runs inside one surface transaction. On failure the
    /// partial scene is cleared before the transaction closes.
    pub fn render(&mut self, diagram: &Diagram) -> ViewResult<()> {
        self.ensure_alive()?;
        self.surface.begin_update();
        let result = self.render_pass(diagram);
        if let Err(e) = &result {
            log::warn!("Render pass failed: {}", e);
            self.surface.clear();
            self.reset_indices();
            self.diagram = None;
        } else {
            self.diagram = Some(diagram.clone());
        }
        self.surface.end_update();
        self.enter(RenderPhase::Idle);
        result
    }

    fn render_pass(&mut self, diagram: &Diagram) -> ViewResult<()> {
        self.surface.clear();
        self.reset_indices();

        let stencils = match &self.stencils {
            Some(provider) => stencil::load_or_default(&**provider, &diagram.diagram_type),
            None => StencilSet::default(),
        };
        let registry = TemplateRegistry::for_diagram_type(&diagram.diagram_type)
            .with_stencils(stencils)
            .with_tooltips(self.config.tooltips);
        log::debug!(
            "Rendering {} elements as {} diagram",
            diagram.elements.len(),
            registry.kind()
        );

        let hierarchy = Hierarchy::build(diagram, self.config.include_root);
        self.enter(RenderPhase::HierarchyBuilt);

        let top = if self.config.include_root {
            let layer = Style::new().with_token("layer").with(style::SELECTABLE, 0);
            self.surface
                .insert_vertex(self.surface.root(), Rect::ZERO, layer, None)?
        } else {
            self.surface.root()
        };

        self.realize_shapes(&hierarchy, &registry, top)?;
        self.enter(RenderPhase::ShapesRealized);

        // Connections go last: endpoints may be forward references.
        for node in hierarchy.connections() {
            self.realize_connection(&hierarchy, &registry, node, top)?;
        }
        self.enter(RenderPhase::ConnectionsRealized);
        Ok(())
    }

    /// Realize every shape at `top` in diagram coordinates, then move each
    /// shape into its container.
    ///
    /// Shapes are inserted in pre-order with their container's absolute
    /// origin carried down. Nesting runs in reverse pre-order so every
    /// container is final before its own container adopts it.
    fn realize_shapes(
        &mut self,
        hierarchy: &Hierarchy,
        registry: &TemplateRegistry,
        top: CellId,
    ) -> ViewResult<()> {
        let mut realized: Vec<(NodeIndex, CellId)> = Vec::new();
        let mut origins: HashMap<NodeIndex, Vec2> = HashMap::new();
        let mut members: HashMap<NodeIndex, Vec<CellId>> = HashMap::new();

        for (node, _) in hierarchy.walk() {
            let entry = hierarchy.node(node);
            let (Some(shape), Some(parent)) = (entry.shape(), entry.parent()) else {
                continue;
            };
            let offset = if parent == ROOT {
                Vec2::ZERO
            } else {
                match origins.get(&parent) {
                    Some(&origin) => origin,
                    None => continue,
                }
            };

            let mut visual = registry.build_shape(shape);
            visual.translate(offset);
            let cell = self.insert_visual(top, &visual)?;
            if let Entry::Vacant(slot) = self.created_vertices.entry(shape.id) {
                slot.insert(cell);
            }

            origins.insert(node, offset + Vec2::new(shape.x, shape.y));
            if parent != ROOT {
                members.entry(parent).or_default().push(cell);
            }
            realized.push((node, cell));
        }

        for &(node, cell) in realized.iter().rev() {
            let Some(children) = members.remove(&node) else {
                continue;
            };
            let is_group = hierarchy
                .node(node)
                .shape()
                .is_some_and(|shape| shape.shape_type.eq_ignore_ascii_case("group"));
            if is_group {
                self.surface.group_cells(cell, &children)?;
            } else {
                let origin = self.surface.geometry(cell)?.origin().to_vec2();
                for child in children {
                    let geometry = self.surface.geometry(child)?;
                    self.surface.set_geometry(child, geometry - origin)?;
                    self.surface.insert_child(cell, child)?;
                }
            }
        }
        Ok(())
    }

    /// Insert a visual and its decorations under `parent`.
    fn insert_visual(&mut self, parent: CellId, visual: &VisualNode) -> ViewResult<CellId> {
        let cell = self.surface.insert_vertex(
            parent,
            visual.geometry,
            visual.style.clone(),
            visual.label.clone(),
        )?;
        if visual.tooltip.is_some() {
            self.surface.set_tooltip(cell, visual.tooltip.clone())?;
        }
        if let Some(element) = visual.element {
            self.cell_elements.insert(cell, element);
        }
        for decoration in &visual.children {
            self.insert_visual(cell, decoration)?;
        }
        Ok(cell)
    }

    /// Absolute origin of the space `cell`'s children live in.
    fn content_offset(&self, cell: CellId) -> ViewResult<Vec2> {
        if cell == self.surface.root() {
            return Ok(Vec2::ZERO);
        }
        Ok(self.surface.absolute_geometry(cell)?.origin().to_vec2())
    }

    fn endpoint(&self, id: Option<ElementId>, connection: ElementId) -> ViewResult<Option<(CellId, Endpoint)>> {
        let Some(id) = id else {
            return Ok(None);
        };
        let Some(&cell) = self.created_vertices.get(&id) else {
            log::warn!("Connection {} references unknown shape {}", connection, id);
            return Ok(None);
        };
        let bounds = self.surface.absolute_geometry(cell)?;
        let offset = match self.surface.parent(cell) {
            Some(parent) => self.content_offset(parent)?,
            None => Vec2::ZERO,
        };
        Ok(Some((cell, Endpoint::new(bounds, offset))))
    }

    fn realize_connection(
        &mut self,
        hierarchy: &Hierarchy,
        registry: &TemplateRegistry,
        node: NodeIndex,
        top: CellId,
    ) -> ViewResult<()> {
        let Some(conn) = hierarchy.node(node).connection() else {
            return Ok(());
        };

        let parent = match hierarchy.container_of(node) {
            Some(container) => hierarchy
                .node(container)
                .id()
                .and_then(|id| self.created_vertices.get(&id).copied())
                .unwrap_or(top),
            None => top,
        };
        let offset = self.content_offset(parent)?;

        let source = self.endpoint(conn.source_id, conn.id)?;
        let target = self.endpoint(conn.target_id, conn.id)?;
        let source_endpoint = source.as_ref().map(|(_, e)| e);
        let target_endpoint = target.as_ref().map(|(_, e)| e);

        let anchors = routing::init_anchor_points(conn, source_endpoint, target_endpoint);
        let route = routing::draw_connection(conn, anchors, source_endpoint, target_endpoint, offset);

        let visual = registry.build_connector(conn);
        let mut edge_style = visual.style;
        if let Some(exit) = anchors.source {
            edge_style.set(style::EXIT_X, exit.x.to_string());
            edge_style.set(style::EXIT_Y, exit.y.to_string());
        }
        if let Some(entry) = anchors.target {
            edge_style.set(style::ENTRY_X, entry.x.to_string());
            edge_style.set(style::ENTRY_Y, entry.y.to_string());
        }

        let edge = self.surface.insert_edge(
            parent,
            source.map(|(cell, _)| cell),
            target.map(|(cell, _)| cell),
            edge_style,
            visual.label,
        )?;
        self.surface.set_edge_geometry(
            edge,
            EdgeGeometry {
                source_point: anchors.source_point.map(|p| p - offset),
                target_point: anchors.target_point.map(|p| p - offset),
                waypoints: route.waypoints.clone(),
            },
        )?;
        if let Entry::Vacant(slot) = self.created_edges.entry(conn.id) {
            slot.insert(edge);
        }
        self.cell_elements.insert(edge, conn.id);

        let ends = [
            (visual.source_label, route.source_end, route.after_source(offset)),
            (visual.target_label, route.target_end, route.before_target(offset)),
        ];
        for (text, end, toward) in ends {
            let (Some(text), Some(end)) = (text, end) else {
                continue;
            };
            self.insert_end_label(parent, offset, conn.id, text, end, toward.unwrap_or(end))?;
        }
        Ok(())
    }

    fn insert_end_label(
        &mut self,
        parent: CellId,
        offset: Vec2,
        element: ElementId,
        text: String,
        end: Point,
        toward: Point,
    ) -> ViewResult<()> {
        let label_style = Style::new()
            .with_token("text")
            .with(style::FILL_COLOR, "none")
            .with(style::STROKE_COLOR, "none")
            .with(style::FONT_SIZE, self.config.default_font_size);
        let size = self.surface.preferred_label_size(&text, &label_style);
        let bounds = routing::place_end_label(end, toward, size, self.config.label_padding) - offset;
        let cell = self.surface.insert_vertex(parent, bounds, label_style, Some(text))?;
        self.cell_elements.insert(cell, element);
        Ok(())
    }

    /// Register a callback for user selection changes.
    pub fn add_selection_listener(&mut self, listener: impl FnMut(&[&DiagramElement]) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Elements behind the current selection, in selection order.
    pub fn selected_elements(&self) -> Vec<&DiagramElement> {
        let Some(diagram) = &self.diagram else {
            return Vec::new();
        };
        self.selection
            .iter()
            .filter_map(|cell| self.cell_elements.get(cell))
            .filter_map(|&id| diagram.element(id))
            .collect()
    }

    pub fn selection(&self) -> &[CellId] {
        &self.selection
    }

    pub fn last_selected(&self) -> Option<CellId> {
        self.last_selected
    }

    /// Apply a user click on `cell`.
    ///
    /// The click selects the nearest selectable ancestor. With `extend`, the
    /// click adds to the selection and stops below the common ancestor with
    /// the last selected cell. Listeners are notified of the new selection.
    pub fn handle_click(&mut self, cell: CellId, extend: bool) -> ViewResult<Option<CellId>> {
        self.ensure_alive()?;
        if self.selection_disabled {
            return Ok(None);
        }

        let previous = if extend { self.last_selected } else { None };
        let resolved = selection::resolve_click(&Cells(&self.surface), cell, previous);
        let Some(selected) = resolved else {
            if !extend {
                self.clear_selection()?;
            }
            return Ok(None);
        };

        if !extend {
            self.selection.clear();
        }
        if !self.selection.contains(&selected) {
            self.selection.push(selected);
        }
        self.last_selected = Some(selected);
        self.surface.set_selection(self.selection.clone());
        self.notify();
        Ok(Some(selected))
    }

    fn notify(&mut self) {
        let Some(diagram) = &self.diagram else {
            return;
        };
        let elements: Vec<&DiagramElement> = self
            .selection
            .iter()
            .filter_map(|cell| self.cell_elements.get(cell))
            .filter_map(|&id| diagram.element(id))
            .collect();
        for listener in &mut self.listeners {
            listener(elements.as_slice());
        }
    }

    /// Select one element. Listeners are not notified.
    pub fn set_selected_item(&mut self, id: ElementId) -> ViewResult<()> {
        self.ensure_alive()?;
        let cell = self.cell_for(id).ok_or(ViewError::UnknownElement(id))?;
        self.selection = vec![cell];
        self.last_selected = Some(cell);
        self.surface.set_selection(self.selection.clone());
        Ok(())
    }

    /// Select several elements, skipping unknown ids. Listeners are not notified.
    pub fn set_selected_items(&mut self, ids: &[ElementId]) -> ViewResult<()> {
        self.ensure_alive()?;
        let mut cells = Vec::with_capacity(ids.len());
        for &id in ids {
            match self.cell_for(id) {
                Some(cell) if !cells.contains(&cell) => cells.push(cell),
                Some(_) => {}
                None => log::warn!("Cannot select unknown element {}", id),
            }
        }
        self.last_selected = cells.last().copied();
        self.selection = cells;
        self.surface.set_selection(self.selection.clone());
        Ok(())
    }

    pub fn clear_selection(&mut self) -> ViewResult<()> {
        self.ensure_alive()?;
        self.selection.clear();
        self.last_selected = None;
        self.surface.set_selection(Vec::new());
        Ok(())
    }

    /// Turn user selection off or back on.
    pub fn disable_user_selection(&mut self, disabled: bool) -> ViewResult<()> {
        self.ensure_alive()?;
        self.selection_disabled = disabled;
        self.surface.set_interactive(!disabled);
        Ok(())
    }

    pub fn is_user_selection_disabled(&self) -> bool {
        self.selection_disabled
    }

    /// Zoom to a rectangle in diagram coordinates.
    pub fn zoom_to_rect(&mut self, rect: Rect) -> ViewResult<()> {
        self.ensure_alive()?;
        self.surface.zoom_to_rect(rect, self.config.zoom_padding);
        Ok(())
    }

    /// Zoom to the absolute bounds of a realized element.
    pub fn zoom_to_element(&mut self, id: ElementId) -> ViewResult<()> {
        self.ensure_alive()?;
        let cell = self
            .created_vertices
            .get(&id)
            .copied()
            .ok_or(ViewError::UnknownElement(id))?;
        let bounds = self.surface.absolute_geometry(cell)?;
        self.zoom_to_rect(bounds)
    }

    /// Union of the absolute bounds of every realized shape.
    pub fn content_bounds(&self) -> ViewResult<Option<Rect>> {
        let mut bounds: Option<Rect> = None;
        for &cell in self.created_vertices.values() {
            let rect = self.surface.absolute_geometry(cell)?;
            bounds = Some(bounds.map_or(rect, |b| b.union(rect)));
        }
        Ok(bounds)
    }

    /// Zoom so that the whole diagram is visible. Does nothing for an empty scene.
    pub fn fit_to_content(&mut self) -> ViewResult<()> {
        self.ensure_alive()?;
        if let Some(bounds) = self.content_bounds()? {
            self.zoom_to_rect(bounds)?;
        }
        Ok(())
    }

    /// Release the scene, indices and listeners. Safe to call repeatedly.
    pub fn destroy(&mut self) {
        if self.phase == RenderPhase::Destroyed {
            return;
        }
        self.surface.destroy();
        self.reset_indices();
        self.listeners.clear();
        self.diagram = None;
        self.enter(RenderPhase::Destroyed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneGraph;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;
    use vignette_core::stencil::{MemoryStencils, Stencil};
    use vignette_core::{ConnectionAttributes, ConnectorType, ShapeAttributes};

    fn view() -> DiagramView<SceneGraph> {
        DiagramView::new(SceneGraph::new(), ViewConfig::default())
    }

    fn shape(id: ElementId, shape_type: &str, x: f64, y: f64, w: f64, h: f64) -> ShapeAttributes {
        ShapeAttributes::new(id, shape_type, Rect::from_origin_size((x, y), (w, h)))
    }

    fn geometry(view: &DiagramView<SceneGraph>, id: ElementId) -> Rect {
        view.surface().geometry(view.cell_for(id).unwrap()).unwrap()
    }

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn test_single_rectangle() {
        let diagram = Diagram::new("generic")
            .with(shape(1, "Rectangle", 100.0, 100.0, 100.0, 100.0).with_colors("#ff0000", "#0000ff"));
        let mut view = view();
        view.render(&diagram).unwrap();

        let scene = view.surface();
        assert_eq!(scene.vertices().count(), 1);
        let cell = scene.cell(view.cell_for(1).unwrap()).unwrap();
        assert_eq!(cell.geometry, Rect::new(100.0, 100.0, 200.0, 200.0));
        assert_eq!(cell.style.get(style::FILL_COLOR), Some("#ff0000"));
        assert_eq!(cell.style.get(style::STROKE_COLOR), Some("#0000ff"));
        assert_eq!(view.phase(), RenderPhase::Idle);
    }

    #[test]
    fn test_render_is_one_transaction() {
        let diagram = Diagram::new("generic")
            .with(shape(1, "Rectangle", 0.0, 0.0, 10.0, 10.0))
            .with(shape(2, "Ellipse", 50.0, 0.0, 10.0, 10.0))
            .with(ConnectionAttributes::new(3, Some(1), Some(2)));
        let mut view = view();
        view.render(&diagram).unwrap();
        assert_eq!(view.surface().revision(), 1);
        assert_eq!(view.surface().update_depth(), 0);
    }

    #[test]
    fn test_right_angled_keeps_interior_waypoint() {
        let diagram = Diagram::new("generic")
            .with(shape(1, "Rectangle", -10.0, -10.0, 10.0, 20.0))
            .with(shape(2, "Rectangle", 40.0, 50.0, 20.0, 20.0))
            .with(
                ConnectionAttributes::new(3, Some(1), Some(2))
                    .with_type(ConnectorType::RightAngled)
                    .with_points(vec![Point::new(0.0, 0.0), Point::new(50.0, 0.0), Point::new(50.0, 50.0)]),
            );
        let mut view = view();
        view.render(&diagram).unwrap();

        let edge = view.surface().cell(view.cell_for(3).unwrap()).unwrap();
        assert_eq!(edge.route().unwrap().waypoints, vec![Point::new(50.0, 0.0)]);
        assert_eq!(edge.style.get(style::EDGE_STYLE), Some("orthogonalEdgeStyle"));
        assert_eq!(edge.style.get(style::ENTRY_X), Some("0.5"));
        assert_eq!(edge.style.get(style::ENTRY_Y), Some("0"));
    }

    #[test]
    fn test_group_children_relative_to_group() {
        let diagram = Diagram::new("generic")
            .with(shape(1, "Group", 100.0, 100.0, 200.0, 200.0))
            .with(shape(2, "Rectangle", 10.0, 20.0, 30.0, 30.0).with_parent(1))
            .with(shape(3, "Ellipse", 60.0, 70.0, 30.0, 30.0).with_parent(1));
        let mut view = view();
        view.render(&diagram).unwrap();

        let scene = view.surface();
        let group = view.cell_for(1).unwrap();
        assert_eq!(scene.children(scene.root()), &[group]);
        assert_eq!(scene.children(group), &[view.cell_for(2).unwrap(), view.cell_for(3).unwrap()]);
        assert_eq!(geometry(&view, 2), Rect::new(10.0, 20.0, 40.0, 50.0));
        assert_eq!(geometry(&view, 3), Rect::new(60.0, 70.0, 90.0, 100.0));
    }

    #[test]
    fn test_task_markers_fan_out() {
        let task = shape(1, "Task", 0.0, 0.0, 120.0, 80.0)
            .with_prop("IsLoop", json!(true))
            .with_prop("IsCompensation", json!(true));
        let mut view = view();
        view.render(&Diagram::new("business-process").with(task)).unwrap();

        let scene = view.surface();
        let markers: Vec<Rect> = scene
            .children(view.cell_for(1).unwrap())
            .iter()
            .filter_map(|&c| scene.cell(c))
            .filter(|c| !scene.is_selectable(c.id))
            .filter(|c| (c.geometry.width() - 14.0).abs() < f64::EPSILON)
            .map(|c| c.geometry)
            .collect();
        assert_eq!(markers.len(), 2);
        assert!((markers[0].x0 - markers[1].x0 - 15.0).abs() < 1e-9);
        assert!(markers[1].x1 <= markers[0].x0);
    }

    #[test]
    fn test_nested_containers_offset() {
        let diagram = Diagram::new("generic")
            .with(shape(1, "Rectangle", 10.0, 10.0, 300.0, 300.0))
            .with(shape(2, "Rectangle", 5.0, 5.0, 200.0, 200.0).with_parent(1))
            .with(shape(3, "Rectangle", 20.0, 30.0, 40.0, 40.0).with_parent(2));
        let mut view = view();
        view.render(&diagram).unwrap();

        let cell = view.cell_for(3).unwrap();
        assert_eq!(view.surface().geometry(cell).unwrap(), Rect::new(20.0, 30.0, 60.0, 70.0));
        assert_eq!(view.surface().absolute_geometry(cell).unwrap(), Rect::new(35.0, 45.0, 75.0, 85.0));
        assert_eq!(view.surface().parent(cell), view.cell_for(2));
    }

    #[test]
    fn test_deeply_nested_containers() {
        const DEPTH: u64 = 3000;
        let mut diagram = Diagram::new("generic").with(shape(1, "Rectangle", 1.0, 1.0, 10.0, 10.0));
        for id in 2..=DEPTH {
            diagram = diagram.with(shape(id, "Rectangle", 1.0, 1.0, 10.0, 10.0).with_parent(id - 1));
        }
        let mut view = view();
        view.render(&diagram).unwrap();

        let deepest = view.cell_for(DEPTH).unwrap();
        let depth = DEPTH as f64;
        assert_eq!(view.surface().geometry(deepest).unwrap(), Rect::new(1.0, 1.0, 11.0, 11.0));
        assert_eq!(
            view.surface().absolute_geometry(deepest).unwrap(),
            Rect::new(depth, depth, depth + 10.0, depth + 10.0)
        );
        assert_eq!(view.surface().parent(deepest), view.cell_for(DEPTH - 1));
        assert_eq!(view.surface().children(view.surface().root()).len(), 1);
    }

    #[test]
    fn test_connection_forward_reference_and_nested_endpoint() {
        let diagram = Diagram::new("generic")
            .with(ConnectionAttributes::new(9, Some(3), Some(4)))
            .with(shape(1, "Rectangle", 10.0, 10.0, 300.0, 300.0))
            .with(shape(3, "Rectangle", 0.0, 0.0, 100.0, 100.0).with_parent(1))
            .with(shape(4, "Rectangle", 400.0, 10.0, 100.0, 100.0));
        let mut view = view();
        view.render(&diagram).unwrap();

        let edge = view.surface().cell(view.cell_for(9).unwrap()).unwrap();
        assert_eq!(edge.terminals(), Some((view.cell_for(3), view.cell_for(4))));
        assert_eq!(edge.style.get(style::EXIT_X), Some("1"));
        assert_eq!(edge.style.get(style::EXIT_Y), Some("0.5"));
    }

    #[test]
    fn test_dangling_connection_keeps_free_end() {
        let diagram = Diagram::new("generic")
            .with(shape(1, "Rectangle", 0.0, 0.0, 10.0, 10.0))
            .with(
                ConnectionAttributes::new(2, Some(1), Some(77))
                    .with_points(vec![Point::new(10.0, 5.0), Point::new(90.0, 5.0)]),
            );
        let mut view = view();
        view.render(&diagram).unwrap();

        let edge = view.surface().cell(view.cell_for(2).unwrap()).unwrap();
        assert_eq!(edge.terminals(), Some((view.cell_for(1), None)));
        assert_eq!(edge.route().unwrap().target_point, Some(Point::new(90.0, 5.0)));
    }

    #[test]
    fn test_self_loop_connection() {
        let diagram = Diagram::new("storyboard")
            .with(shape(1, "Scene", 0.0, 0.0, 100.0, 40.0))
            .with(ConnectionAttributes::new(2, Some(1), Some(1)));
        let mut view = view();
        view.render(&diagram).unwrap();

        let edge = view.surface().cell(view.cell_for(2).unwrap()).unwrap();
        let waypoints = &edge.route().unwrap().waypoints;
        assert_eq!(waypoints.len(), 2);
        assert!(close(waypoints[0], Point::new(120.0, 10.0)));
        assert_eq!(edge.style.get(style::EXIT_X), Some("1"));
        assert_eq!(edge.style.get(style::ENTRY_Y), Some("0.75"));
    }

    #[test]
    fn test_connection_inside_container_uses_local_waypoints() {
        let mut conn = ConnectionAttributes::new(9, Some(2), Some(3)).with_type(ConnectorType::Curved);
        conn.parent_id = Some(1);
        let diagram = Diagram::new("generic")
            .with(shape(1, "Rectangle", 100.0, 100.0, 400.0, 400.0))
            .with(shape(2, "Rectangle", 0.0, 0.0, 10.0, 10.0).with_parent(1))
            .with(shape(3, "Rectangle", 100.0, 40.0, 10.0, 10.0).with_parent(1))
            .with(conn);
        let mut view = view();
        view.render(&diagram).unwrap();

        let edge_cell = view.cell_for(9).unwrap();
        assert_eq!(view.surface().parent(edge_cell), view.cell_for(1));
        let edge = view.surface().cell(edge_cell).unwrap();
        let waypoints = &edge.route().unwrap().waypoints;
        assert!(close(waypoints[0], Point::new(55.0, 5.0)));
        assert!(close(waypoints[1], Point::new(55.0, 45.0)));
    }

    #[test]
    fn test_end_labels_become_text_cells() {
        let mut conn = ConnectionAttributes::new(3, Some(1), Some(2));
        conn.source_label = Some("1".into());
        conn.target_label = Some("0..*".into());
        let diagram = Diagram::new("domain-model")
            .with(shape(1, "DomainClass", 0.0, 0.0, 100.0, 60.0))
            .with(shape(2, "DomainClass", 300.0, 0.0, 100.0, 60.0))
            .with(conn);
        let mut view = view();
        view.render(&diagram).unwrap();

        let scene = view.surface();
        let labels: Vec<_> = scene
            .vertices()
            .filter(|c| c.style.contains("text") && view.element_for(c.id) == Some(3))
            .collect();
        assert_eq!(labels.len(), 2);
        let source_label = labels[0];
        assert_eq!(source_label.label.as_deref(), Some("1"));
        // Past the source anchor (100, 30) along the connector, above it.
        assert!(source_label.geometry.x0 > 100.0);
        assert!(source_label.geometry.y1 < 30.0);
        let expected_width = 12.0 * 0.6 + view.config().label_padding;
        assert!((source_label.geometry.width() - expected_width).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_type_uses_fallback() {
        let mut view = view();
        view.render(&Diagram::new("generic").with(shape(1, "NoSuchThing", 0.0, 0.0, 10.0, 10.0)))
            .unwrap();
        let cell = view.surface().cell(view.cell_for(1).unwrap()).unwrap();
        assert_eq!(cell.style.get(style::STROKE_COLOR), Some("#000000"));
        assert_eq!(cell.style.get(style::FILL_COLOR), Some("#ffffff"));
    }

    #[test]
    fn test_stencil_provider_supplies_shape() {
        let provider = MemoryStencils::new();
        provider
            .insert(
                "generic",
                StencilSet::new().with(Stencil::new("Router").with_shape("mxgraph.cisco.router")),
            )
            .unwrap();
        let mut view = view().with_stencil_provider(Box::new(provider));
        view.render(&Diagram::new("generic").with(shape(1, "Router", 0.0, 0.0, 40.0, 40.0)))
            .unwrap();
        let cell = view.surface().cell(view.cell_for(1).unwrap()).unwrap();
        assert_eq!(cell.style.get(style::SHAPE), Some("mxgraph.cisco.router"));
    }

    #[test]
    fn test_tooltips_follow_domain() {
        let task = shape(1, "Task", 0.0, 0.0, 100.0, 60.0)
            .with_label("Ship order")
            .with_prop("Documentation", json!("Ships the order"));
        let mut view = view();
        view.render(&Diagram::new("business-process").with(task.clone())).unwrap();
        let cell = view.surface().cell(view.cell_for(1).unwrap()).unwrap();
        assert_eq!(cell.tooltip.as_deref(), Some("Ships the order"));

        let config = ViewConfig {
            tooltips: Some(false),
            ..ViewConfig::default()
        };
        let mut quiet = DiagramView::new(SceneGraph::new(), config);
        quiet.render(&Diagram::new("business-process").with(task)).unwrap();
        let cell = quiet.surface().cell(quiet.cell_for(1).unwrap()).unwrap();
        assert_eq!(cell.tooltip, None);
    }

    #[test]
    fn test_include_root_adds_layer() {
        let config = ViewConfig {
            include_root: true,
            ..ViewConfig::default()
        };
        let mut view = DiagramView::new(SceneGraph::new(), config);
        view.render(&Diagram::new("generic").with(shape(1, "Rectangle", 5.0, 5.0, 10.0, 10.0)))
            .unwrap();
        let scene = view.surface();
        let layer = scene.children(scene.root())[0];
        assert!(!scene.is_selectable(layer));
        assert_eq!(scene.parent(view.cell_for(1).unwrap()), Some(layer));
        assert_eq!(geometry(&view, 1), Rect::new(5.0, 5.0, 15.0, 15.0));
    }

    #[test]
    fn test_rerender_replaces_scene() {
        let mut view = view();
        view.render(&Diagram::new("generic").with(shape(1, "Rectangle", 0.0, 0.0, 10.0, 10.0)))
            .unwrap();
        view.render(&Diagram::new("generic").with(shape(2, "Ellipse", 0.0, 0.0, 10.0, 10.0)))
            .unwrap();
        assert_eq!(view.surface().len(), 1);
        assert_eq!(view.cell_for(1), None);
        assert!(view.cell_for(2).is_some());
    }

    fn grouped_diagram() -> Diagram {
        Diagram::new("business-process")
            .with(shape(1, "Pool", 0.0, 0.0, 600.0, 400.0))
            .with(shape(2, "Group", 10.0, 10.0, 300.0, 200.0).with_parent(1))
            .with(
                shape(3, "Task", 10.0, 10.0, 120.0, 80.0)
                    .with_parent(2)
                    .with_prop("IsLoop", json!(true)),
            )
            .with(shape(4, "Task", 150.0, 10.0, 120.0, 80.0).with_parent(2))
            .with(shape(5, "Task", 400.0, 10.0, 120.0, 80.0).with_parent(1))
    }

    #[test]
    fn test_click_on_decoration_selects_shape() {
        let mut view = view();
        view.render(&grouped_diagram()).unwrap();
        let task = view.cell_for(3).unwrap();
        let marker = *view.surface().children(task).last().unwrap();
        assert!(!view.surface().is_selectable(marker));

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        view.add_selection_listener(move |elements| {
            sink.borrow_mut().push(elements.iter().map(|e| e.id()).collect::<Vec<_>>());
        });

        assert_eq!(view.handle_click(marker, false).unwrap(), Some(task));
        assert_eq!(*seen.borrow(), vec![vec![3]]);
        assert_eq!(view.surface().selection(), vec![task]);
    }

    #[test]
    fn test_extend_selection_stays_in_group() {
        let mut view = view();
        view.render(&grouped_diagram()).unwrap();
        let first = view.cell_for(3).unwrap();
        let second = view.cell_for(4).unwrap();
        let outside = view.cell_for(5).unwrap();

        view.handle_click(first, false).unwrap();
        assert_eq!(view.handle_click(second, true).unwrap(), Some(second));
        let ids: Vec<_> = view.selected_elements().iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec![3, 4]);

        // Across branches of the pool the walk stops at the pool's child.
        assert_eq!(view.handle_click(outside, true).unwrap(), Some(outside));
        view.handle_click(first, true).unwrap();
        assert_eq!(view.last_selected(), view.cell_for(2));
    }

    #[test]
    fn test_disabled_selection_ignores_clicks() {
        let mut view = view();
        view.render(&grouped_diagram()).unwrap();
        view.disable_user_selection(true).unwrap();
        assert!(!view.surface().is_interactive());
        assert_eq!(view.handle_click(view.cell_for(3).unwrap(), false).unwrap(), None);
        assert!(view.selection().is_empty());

        // Programmatic selection still works.
        view.set_selected_items(&[4, 99, 5]).unwrap();
        assert_eq!(view.selection(), &[view.cell_for(4).unwrap(), view.cell_for(5).unwrap()]);
        assert_eq!(view.set_selected_item(99), Err(ViewError::UnknownElement(99)));
        view.clear_selection().unwrap();
        assert!(view.surface().selection().is_empty());
    }

    #[test]
    fn test_zoom_operations() {
        let mut view = DiagramView::new(
            SceneGraph::new().with_viewport(kurbo::Size::new(400.0, 300.0)),
            ViewConfig {
                zoom_padding: 10.0,
                ..ViewConfig::default()
            },
        );
        view.render(&grouped_diagram()).unwrap();

        view.zoom_to_element(5).unwrap();
        let camera = view.surface().camera();
        let center = camera.world_to_screen(Point::new(460.0, 50.0));
        assert!((center.x - 200.0).abs() < 1e-9);
        assert!((center.y - 150.0).abs() < 1e-9);

        view.fit_to_content().unwrap();
        assert_eq!(view.content_bounds().unwrap(), Some(Rect::new(0.0, 0.0, 600.0, 400.0)));
        assert!((view.surface().camera().zoom - 380.0 / 600.0).abs() < 1e-9);
        assert_eq!(view.zoom_to_element(42), Err(ViewError::UnknownElement(42)));
    }

    #[test]
    fn test_failed_render_leaves_empty_scene() {
        let mut view = view();
        view.surface_mut().destroy();
        let result = view.render(&grouped_diagram());
        assert_eq!(result, Err(ViewError::Surface(SurfaceError::Closed)));
        assert!(view.surface().is_empty());
        assert_eq!(view.surface().update_depth(), 0);
        assert_eq!(view.cell_for(1), None);
        assert_eq!(view.phase(), RenderPhase::Idle);
    }

    #[test]
    fn test_destroy_is_terminal_and_idempotent() {
        let mut view = view();
        view.render(&grouped_diagram()).unwrap();
        view.destroy();
        view.destroy();
        assert_eq!(view.phase(), RenderPhase::Destroyed);
        assert!(view.surface().is_closed());
        assert_eq!(view.cell_for(1), None);
        assert_eq!(view.render(&grouped_diagram()), Err(ViewError::Destroyed));
        assert_eq!(view.clear_selection(), Err(ViewError::Destroyed));
    }
}

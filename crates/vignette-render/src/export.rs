//! SVG export of a realized scene.

use crate::scene::{Cell, SceneGraph};
use crate::surface::{CellId, Surface};
use kurbo::{Point, Rect};
use svg::Document;
use svg::node::element as svg_element;
use vignette_core::style::{self, Style};

/// Margin around the content in exported documents.
pub const EXPORT_MARGIN: f64 = 10.0;

fn paint(style: &Style, key: &str, default: &str) -> String {
    match style.get(key) {
        Some(color) if !color.is_empty() => color.to_string(),
        _ => default.to_string(),
    }
}

fn is_text(style: &Style) -> bool {
    style.contains("text") || style.get(style::SHAPE) == Some("text")
}

fn shape_kind(style: &Style) -> &str {
    match style.get(style::SHAPE) {
        Some(shape) => shape,
        None if style.contains("ellipse") => "ellipse",
        None if style.contains("rhombus") => "rhombus",
        None => "rectangle",
    }
}

fn path_data(points: &[Point]) -> String {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{} {} {}", if i == 0 { "M" } else { "L" }, p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}

fn vertex_node(bounds: Rect, style: &Style) -> Option<Box<dyn svg::Node>> {
    if is_text(style) {
        return None;
    }
    let fill = paint(style, style::FILL_COLOR, "none");
    let stroke = paint(style, style::STROKE_COLOR, "none");
    let stroke_width = style.get_f64(style::STROKE_WIDTH).unwrap_or(1.0);

    let node: Box<dyn svg::Node> = match shape_kind(style) {
        "ellipse" | "umlActor" => Box::new(
            svg_element::Ellipse::new()
                .set("cx", bounds.center().x)
                .set("cy", bounds.center().y)
                .set("rx", bounds.width() / 2.0)
                .set("ry", bounds.height() / 2.0)
                .set("fill", fill)
                .set("stroke", stroke)
                .set("stroke-width", stroke_width),
        ),
        "rhombus" => {
            let center = bounds.center();
            let points = [
                Point::new(center.x, bounds.y0),
                Point::new(bounds.x1, center.y),
                Point::new(center.x, bounds.y1),
                Point::new(bounds.x0, center.y),
            ];
            Box::new(
                svg_element::Path::new()
                    .set("d", format!("{} Z", path_data(&points)))
                    .set("fill", fill)
                    .set("stroke", stroke)
                    .set("stroke-width", stroke_width),
            )
        }
        _ => {
            let mut rect = svg_element::Rectangle::new()
                .set("x", bounds.x0)
                .set("y", bounds.y0)
                .set("width", bounds.width())
                .set("height", bounds.height())
                .set("fill", fill)
                .set("stroke", stroke)
                .set("stroke-width", stroke_width);
            if style.is_enabled(style::ROUNDED) {
                rect = rect.set("rx", 6);
            }
            if style.is_enabled(style::DASHED) {
                rect = rect.set("stroke-dasharray", "4 3");
            }
            Box::new(rect)
        }
    };
    Some(node)
}

fn label_node(bounds: Rect, text: &str, style: &Style) -> svg_element::Text {
    let center = bounds.center();
    let mut node = svg_element::Text::new(text)
        .set("x", center.x)
        .set("y", center.y)
        .set("text-anchor", "middle")
        .set("dominant-baseline", "middle")
        .set("font-size", style.get_f64(style::FONT_SIZE).unwrap_or(crate::scene::DEFAULT_FONT_SIZE))
        .set("fill", paint(style, style::FONT_COLOR, "#000000"));
    if let Some(bits) = style.get_f64(style::FONT_STYLE).map(|b| b as u8) {
        if bits & vignette_core::templates::FONT_BOLD != 0 {
            node = node.set("font-weight", "bold");
        }
        if bits & vignette_core::templates::FONT_ITALIC != 0 {
            node = node.set("font-style", "italic");
        }
    }
    node
}

/// Absolute end point of an edge at `terminal`, using the anchor stored in
/// the edge style under `keys`.
fn terminal_point(scene: &SceneGraph, terminal: Option<CellId>, style: &Style, keys: (&str, &str)) -> Option<Point> {
    let bounds = scene.absolute_geometry(terminal?).ok()?;
    match (style.get_f64(keys.0), style.get_f64(keys.1)) {
        (Some(fx), Some(fy)) => Some(Point::new(
            bounds.x0 + fx * bounds.width(),
            bounds.y0 + fy * bounds.height(),
        )),
        _ => Some(bounds.center()),
    }
}

/// Polyline of an edge in diagram coordinates.
pub fn edge_points(scene: &SceneGraph, edge: &Cell) -> Vec<Point> {
    let (Some((source, target)), Some(route)) = (edge.terminals(), edge.route()) else {
        return Vec::new();
    };
    let offset = edge
        .parent
        .filter(|&p| p != scene.root())
        .and_then(|p| scene.absolute_geometry(p).ok())
        .map(|bounds| bounds.origin().to_vec2())
        .unwrap_or_default();

    let start = terminal_point(scene, source, &edge.style, (style::EXIT_X, style::EXIT_Y))
        .or(route.source_point.map(|p| p + offset));
    let end = terminal_point(scene, target, &edge.style, (style::ENTRY_X, style::ENTRY_Y))
        .or(route.target_point.map(|p| p + offset));

    start
        .into_iter()
        .chain(route.waypoints.iter().map(|&p| p + offset))
        .chain(end)
        .collect()
}

/// Render the scene as an SVG document.
pub fn to_svg(scene: &SceneGraph) -> Document {
    let cells = scene.cells_in_order();
    let bounds = cells
        .iter()
        .filter(|c| c.is_vertex())
        .filter_map(|c| scene.absolute_geometry(c.id).ok())
        .reduce(|a, b| a.union(b))
        .unwrap_or(Rect::ZERO)
        .inflate(EXPORT_MARGIN, EXPORT_MARGIN);

    let mut doc = Document::new()
        .set(
            "viewBox",
            format!("{} {} {} {}", bounds.x0, bounds.y0, bounds.width(), bounds.height()),
        )
        .set("width", bounds.width())
        .set("height", bounds.height());

    for cell in cells {
        if cell.is_vertex() {
            let Ok(absolute) = scene.absolute_geometry(cell.id) else {
                continue;
            };
            if let Some(node) = vertex_node(absolute, &cell.style) {
                doc = doc.add(node);
            }
            if let Some(text) = cell.label.as_deref().filter(|t| !t.is_empty()) {
                doc = doc.add(label_node(absolute, text, &cell.style));
            }
        } else if cell.is_edge() {
            let points = edge_points(scene, cell);
            if points.len() < 2 {
                log::debug!("Skipping edge {} without drawable points", cell.id);
                continue;
            }
            let mut path = svg_element::Path::new()
                .set("d", path_data(&points))
                .set("fill", "none")
                .set("stroke", paint(&cell.style, style::STROKE_COLOR, "#000000"))
                .set("stroke-width", cell.style.get_f64(style::STROKE_WIDTH).unwrap_or(1.0));
            if cell.style.is_enabled(style::DASHED) {
                path = path.set("stroke-dasharray", "4 3");
            }
            doc = doc.add(path);
            if let Some(text) = cell.label.as_deref().filter(|t| !t.is_empty()) {
                let middle = points[points.len() / 2];
                let at = Rect::from_center_size(middle, (0.0, 0.0));
                doc = doc.add(label_node(at, text, &cell.style));
            }
        }
    }
    doc
}

/// Render the scene as SVG markup.
pub fn to_svg_string(scene: &SceneGraph) -> String {
    to_svg(scene).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewConfig;
    use crate::view::DiagramView;
    use vignette_core::{ConnectionAttributes, Diagram, ShapeAttributes};

    fn rendered() -> DiagramView<SceneGraph> {
        let diagram = Diagram::new("generic")
            .with(ShapeAttributes::new(1, "Rectangle", Rect::new(0.0, 0.0, 100.0, 50.0)).with_label("Start"))
            .with(ShapeAttributes::new(2, "Ellipse", Rect::new(200.0, 0.0, 300.0, 50.0)))
            .with(ShapeAttributes::new(3, "Diamond", Rect::new(0.0, 100.0, 60.0, 160.0)))
            .with(ConnectionAttributes::new(4, Some(1), Some(2)));
        let mut view = DiagramView::new(SceneGraph::new(), ViewConfig::default());
        view.render(&diagram).unwrap();
        view
    }

    #[test]
    fn test_edge_points_follow_anchors() {
        let view = rendered();
        let scene = view.surface();
        let edge = scene.cell(view.cell_for(4).unwrap()).unwrap();
        assert_eq!(edge_points(scene, edge), vec![Point::new(100.0, 25.0), Point::new(200.0, 25.0)]);
    }

    #[test]
    fn test_svg_contains_primitives() {
        let view = rendered();
        let svg = to_svg_string(view.surface());
        assert!(svg.contains("<rect"));
        assert!(svg.contains("<ellipse"));
        assert!(svg.contains("M 100 25 L 200 25"));
        assert!(svg.contains("Start"));
        assert!(svg.contains("viewBox=\"-10 -10 320 180\""));
    }

    #[test]
    fn test_empty_scene_exports() {
        let svg = to_svg_string(&SceneGraph::new());
        assert!(svg.starts_with("<svg"));
    }
}

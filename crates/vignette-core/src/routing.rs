//! Connector anchoring and routing.
//!
//! Anchors are expressed as fractions of an endpoint's bounding box so they
//! stay attached when the shape is resized. Waypoints are expressed in the
//! coordinate space of the container the edge is drawn in.

use crate::model::{ConnectionAttributes, ConnectorType};
use kurbo::{Point, Rect, Size, Vec2};

/// Nudge applied to a straight connector whose anchors coincide.
pub const STRAIGHT_NUDGE: f64 = 3.0;

/// Distance a self-loop travels outside its shape.
pub const SELF_LOOP_EXTENT: f64 = 20.0;

/// Default horizontal padding added to a measured end-label width.
pub const LABEL_PADDING: f64 = 6.0;

/// Distance of an end label from the connector, perpendicular to it.
pub const LABEL_OFFSET: f64 = 4.0;

/// Distance of an end label from the endpoint, along the connector.
pub const LABEL_ALONG: f64 = 6.0;

const COINCIDENT_EPSILON: f64 = 1e-6;

/// A side of a bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    /// Tie-break order for the closest-points search.
    pub const PREFERENCE: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

    /// Midpoint of this side of `bounds`.
    pub fn midpoint(self, bounds: Rect) -> Point {
        let center = bounds.center();
        match self {
            Side::Top => Point::new(center.x, bounds.y0),
            Side::Right => Point::new(bounds.x1, center.y),
            Side::Bottom => Point::new(center.x, bounds.y1),
            Side::Left => Point::new(bounds.x0, center.y),
        }
    }
}

/// Result of the closest-points search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorChoice {
    pub source_side: Side,
    pub target_side: Side,
    pub source: Point,
    pub target: Point,
}

/// Pick the pair of edge midpoints minimizing the distance between two boxes.
///
/// Ties keep the first pair in [`Side::PREFERENCE`] order (source side first).
pub fn closest_anchor_points(source: Rect, target: Rect) -> AnchorChoice {
    let mut best: Option<(f64, AnchorChoice)> = None;
    for source_side in Side::PREFERENCE {
        let from = source_side.midpoint(source);
        for target_side in Side::PREFERENCE {
            let to = target_side.midpoint(target);
            let distance = from.distance(to);
            if best.is_none_or(|(d, _)| distance < d) {
                best = Some((
                    distance,
                    AnchorChoice {
                        source_side,
                        target_side,
                        source: from,
                        target: to,
                    },
                ));
            }
        }
    }
    // PREFERENCE is non-empty, so a choice always exists.
    best.map(|(_, choice)| choice).unwrap_or(AnchorChoice {
        source_side: Side::Top,
        target_side: Side::Top,
        source: source.center(),
        target: target.center(),
    })
}

/// Express a point as a fraction of `bounds`.
///
/// Values outside `[0, 1]` place the anchor outside the shape, which is legal.
/// A degenerate axis maps to its center.
pub fn anchor_fraction(point: Point, bounds: Rect) -> Point {
    let fraction = |value: f64, start: f64, extent: f64| {
        if extent.abs() < f64::EPSILON {
            0.5
        } else {
            (value - start) / extent
        }
    };
    Point::new(
        fraction(point.x, bounds.x0, bounds.width()),
        fraction(point.y, bounds.y0, bounds.height()),
    )
}

/// Map a fraction of `bounds` back to a point.
pub fn fraction_to_point(fraction: Point, bounds: Rect) -> Point {
    Point::new(
        bounds.x0 + fraction.x * bounds.width(),
        bounds.y0 + fraction.y * bounds.height(),
    )
}

/// Geometry of a realized connection endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Endpoint {
    /// Bounds in diagram coordinates.
    pub bounds: Rect,
    /// Cumulative offset of the endpoint's ancestor containers.
    pub container_offset: Vec2,
}

impl Endpoint {
    pub fn new(bounds: Rect, container_offset: Vec2) -> Self {
        Self {
            bounds,
            container_offset,
        }
    }

    /// Bounds in the coordinate space of the endpoint's own container.
    pub fn local_bounds(&self) -> Rect {
        self.bounds - self.container_offset
    }
}

/// Anchors of a connection.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnchorPair {
    /// Source anchor as a fraction of the source bounds.
    pub source: Option<Point>,
    /// Target anchor as a fraction of the target bounds.
    pub target: Option<Point>,
    /// Free terminal point (diagram coordinates) for a dangling source.
    pub source_point: Option<Point>,
    /// Free terminal point (diagram coordinates) for a dangling target.
    pub target_point: Option<Point>,
    /// Source and target are the same shape.
    pub self_loop: bool,
}

fn is_self_loop(connection: &ConnectionAttributes) -> bool {
    connection.source_id.is_some() && connection.source_id == connection.target_id
}

/// Compute the anchor pair of a connection.
///
/// Explicit points (at least two) pin the anchors: the first and last point
/// are corrected by their endpoint's container offset and converted to a
/// fraction of that endpoint's bounds. Without explicit points the
/// closest-points search picks the anchors. A missing endpoint skips its side.
pub fn init_anchor_points(
    connection: &ConnectionAttributes,
    source: Option<&Endpoint>,
    target: Option<&Endpoint>,
) -> AnchorPair {
    let mut anchors = AnchorPair {
        self_loop: is_self_loop(connection) && source.is_some(),
        ..AnchorPair::default()
    };

    if let (Some(&first), Some(&last), true) = (
        connection.points.first(),
        connection.points.last(),
        connection.points.len() >= 2,
    ) {
        match source {
            Some(endpoint) => {
                let local = first - endpoint.container_offset;
                anchors.source = Some(anchor_fraction(local, endpoint.local_bounds()));
            }
            None => anchors.source_point = Some(first),
        }
        match target {
            Some(endpoint) => {
                let local = last - endpoint.container_offset;
                anchors.target = Some(anchor_fraction(local, endpoint.local_bounds()));
            }
            None => anchors.target_point = Some(last),
        }
        return anchors;
    }

    match (source, target) {
        (Some(_), Some(_)) if anchors.self_loop => {
            anchors.source = Some(Point::new(1.0, 0.25));
            anchors.target = Some(Point::new(1.0, 0.75));
        }
        (Some(s), Some(t)) => {
            let choice = closest_anchor_points(s.bounds, t.bounds);
            anchors.source = Some(anchor_fraction(choice.source, s.bounds));
            anchors.target = Some(anchor_fraction(choice.target, t.bounds));
        }
        (Some(_), None) => anchors.target_point = connection.points.first().copied(),
        (None, Some(_)) => anchors.source_point = connection.points.first().copied(),
        (None, None) => {
            log::warn!("Connection {} has no resolvable endpoint", connection.id);
        }
    }
    anchors
}

/// A routed connection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Route {
    pub anchors: AnchorPair,
    /// Interior waypoints in the edge container's coordinate space.
    pub waypoints: Vec<Point>,
    /// Source end in diagram coordinates, if known.
    pub source_end: Option<Point>,
    /// Target end in diagram coordinates, if known.
    pub target_end: Option<Point>,
}

impl Route {
    /// The point following the source end, in diagram coordinates.
    pub fn after_source(&self, container_offset: Vec2) -> Option<Point> {
        self.waypoints
            .first()
            .map(|&p| p + container_offset)
            .or(self.target_end)
    }

    /// The point preceding the target end, in diagram coordinates.
    pub fn before_target(&self, container_offset: Vec2) -> Option<Point> {
        self.waypoints
            .last()
            .map(|&p| p + container_offset)
            .or(self.source_end)
    }
}

/// Route a connection whose anchors have been initialized.
///
/// `container_offset` is the absolute offset of the container the edge is
/// drawn in; computed waypoints are shifted into that space. Explicit
/// interior points are kept as-is by right-angled connectors only.
pub fn draw_connection(
    connection: &ConnectionAttributes,
    anchors: AnchorPair,
    source: Option<&Endpoint>,
    target: Option<&Endpoint>,
    container_offset: Vec2,
) -> Route {
    let source_end = anchors
        .source
        .zip(source)
        .map(|(fraction, endpoint)| fraction_to_point(fraction, endpoint.bounds))
        .or(anchors.source_point);
    let target_end = anchors
        .target
        .zip(target)
        .map(|(fraction, endpoint)| fraction_to_point(fraction, endpoint.bounds))
        .or(anchors.target_point);

    let to_container = |p: Point| p - container_offset;
    let interior = connection.interior_points();

    let waypoints = if anchors.self_loop && connection.points.len() < 2 {
        source
            .map(|endpoint| self_loop_waypoints(endpoint.bounds).map(to_container).to_vec())
            .unwrap_or_default()
    } else {
        match connection.connector_type {
            ConnectorType::Straight => match (source_end, target_end) {
                (Some(s), Some(t)) if s.distance(t) < COINCIDENT_EPSILON => {
                    vec![to_container(Point::new(s.x + STRAIGHT_NUDGE, s.y))]
                }
                _ => Vec::new(),
            },
            ConnectorType::Curved => match (source_end, target_end) {
                (Some(s), Some(t)) => s_curve_waypoints(s, t).map(to_container).to_vec(),
                _ => Vec::new(),
            },
            ConnectorType::RightAngled if !interior.is_empty() => interior.to_vec(),
            ConnectorType::RightAngled => match (source_end, target_end) {
                (Some(s), Some(t)) => compute_elbow_path(s, t).into_iter().map(to_container).collect(),
                _ => Vec::new(),
            },
        }
    };

    Route {
        anchors,
        waypoints,
        source_end,
        target_end,
    }
}

/// Two waypoints at the midpoint of the dominant axis, one aligned with each end.
pub fn s_curve_waypoints(start: Point, end: Point) -> [Point; 2] {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    if dx.abs() >= dy.abs() {
        let mid_x = start.x + dx / 2.0;
        [Point::new(mid_x, start.y), Point::new(mid_x, end.y)]
    } else {
        let mid_y = start.y + dy / 2.0;
        [Point::new(start.x, mid_y), Point::new(end.x, mid_y)]
    }
}

/// Elbow waypoints for an orthogonal connector without explicit bends.
///
/// Aligned ends need no bend; otherwise the path turns twice at the midpoint
/// of the dominant axis.
pub fn compute_elbow_path(start: Point, end: Point) -> Vec<Point> {
    if (start.x - end.x).abs() < COINCIDENT_EPSILON || (start.y - end.y).abs() < COINCIDENT_EPSILON {
        return Vec::new();
    }
    s_curve_waypoints(start, end).to_vec()
}

/// Waypoints of a loop leaving the right side at 25% and re-entering at 75%.
pub fn self_loop_waypoints(bounds: Rect) -> [Point; 2] {
    let x = bounds.x1 + SELF_LOOP_EXTENT;
    [
        Point::new(x, bounds.y0 + bounds.height() * 0.25),
        Point::new(x, bounds.y0 + bounds.height() * 0.75),
    ]
}

/// Bounds of an end label.
///
/// The label sits just past `endpoint` in the direction of `toward`, pushed
/// off the connector along its left-hand normal. `text_size` is the measured
/// text size; `padding` is added to its width (see [`LABEL_PADDING`]).
pub fn place_end_label(endpoint: Point, toward: Point, text_size: Size, padding: f64) -> Rect {
    let delta = toward - endpoint;
    let length = delta.hypot();
    let direction = if length < f64::EPSILON {
        Vec2::new(1.0, 0.0)
    } else {
        delta / length
    };
    let normal = Vec2::new(direction.y, -direction.x);
    let size = Size::new(text_size.width + padding, text_size.height);

    // Project the half extents of the label box onto each axis.
    let half_along = (size.width * direction.x.abs() + size.height * direction.y.abs()) / 2.0;
    let half_across = (size.width * normal.x.abs() + size.height * normal.y.abs()) / 2.0;
    let center = endpoint + direction * (LABEL_ALONG + half_along) + normal * (LABEL_OFFSET + half_across);
    Rect::from_center_size(center, size)
}

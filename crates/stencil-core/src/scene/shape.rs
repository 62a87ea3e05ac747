//! Vector shape nodes.
//!
//! Point-based geometry (polygon, polyline, line, path) is stored
//! normalized to the unit square so that resizing the node only has to
//! change its width and height.

use crate::template::{NodeData, PointData};
use kurbo::{Affine, BezPath, Ellipse, Point, Rect, RoundedRect, Shape as KurboShape, Vec2};

/// Concrete shape kinds a template may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Rect,
    Circle,
    Ellipse,
    Triangle,
    Polygon,
    Path,
    Line,
    Polyline,
}

impl ShapeKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "rect" | "rectangle" => Some(ShapeKind::Rect),
            "circle" => Some(ShapeKind::Circle),
            "ellipse" => Some(ShapeKind::Ellipse),
            "triangle" => Some(ShapeKind::Triangle),
            "polygon" => Some(ShapeKind::Polygon),
            "path" => Some(ShapeKind::Path),
            "line" => Some(ShapeKind::Line),
            "polyline" => Some(ShapeKind::Polyline),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::Rect => "rect",
            ShapeKind::Circle => "circle",
            ShapeKind::Ellipse => "ellipse",
            ShapeKind::Triangle => "triangle",
            ShapeKind::Polygon => "polygon",
            ShapeKind::Path => "path",
            ShapeKind::Line => "line",
            ShapeKind::Polyline => "polyline",
        }
    }

    /// Open outlines are stroked only, never filled.
    pub fn is_open(&self) -> bool {
        matches!(self, ShapeKind::Line | ShapeKind::Polyline)
    }
}

/// Local outline description.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeGeometry {
    Rect { rx: f64, ry: f64 },
    Ellipse,
    Triangle,
    Polygon { points: Vec<Point> },
    Polyline { points: Vec<Point> },
    Line { from: Point, to: Point },
    Path { path: BezPath },
}

/// Vector shape content of a scene node.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeNode {
    pub kind: ShapeKind,
    pub geometry: ShapeGeometry,
}

/// Shape built from a payload: the node content, its intrinsic size, the
/// offset of its outline from `left/top`, and a warning if it degraded.
#[derive(Debug, Clone)]
pub struct ShapeBuild {
    pub shape: ShapeNode,
    pub width: f64,
    pub height: f64,
    pub offset: Vec2,
    pub warning: Option<String>,
}

impl ShapeNode {
    pub fn new(kind: ShapeKind, geometry: ShapeGeometry) -> Self {
        Self { kind, geometry }
    }

    /// Build a shape from a payload. Unknown kinds and unparsable paths
    /// degrade to a rectangle and report why.
    pub fn from_data(data: &NodeData) -> ShapeBuild {
        let width = data.width.unwrap_or(0.0);
        let height = data.height.unwrap_or(0.0);
        let name = data.shape_kind().unwrap_or("rect");
        let Some(kind) = ShapeKind::parse(name) else {
            return Self::degraded(data, format!("unknown shape kind '{name}', drawing a rectangle"));
        };

        let simple = |shape: ShapeNode, width: f64, height: f64| ShapeBuild {
            shape,
            width,
            height,
            offset: Vec2::ZERO,
            warning: None,
        };

        match kind {
            ShapeKind::Rect => simple(
                ShapeNode::new(
                    kind,
                    ShapeGeometry::Rect {
                        rx: data.rx.unwrap_or(0.0),
                        ry: data.ry.or(data.rx).unwrap_or(0.0),
                    },
                ),
                width,
                height,
            ),
            ShapeKind::Circle => {
                let (w, h) = match data.radius {
                    Some(r) => (r * 2.0, r * 2.0),
                    None => (width, height),
                };
                simple(ShapeNode::new(kind, ShapeGeometry::Ellipse), w, h)
            }
            ShapeKind::Ellipse => {
                let (w, h) = match (data.rx, data.ry) {
                    (Some(rx), Some(ry)) if data.width.is_none() => (rx * 2.0, ry * 2.0),
                    _ => (width, height),
                };
                simple(ShapeNode::new(kind, ShapeGeometry::Ellipse), w, h)
            }
            ShapeKind::Triangle => simple(ShapeNode::new(kind, ShapeGeometry::Triangle), width, height),
            ShapeKind::Polygon | ShapeKind::Polyline => {
                if data.points.len() < 2 {
                    return Self::degraded(data, format!("{} needs at least two points", kind.as_str()));
                }
                let (points, bbox) = normalize_points(&data.points);
                let geometry = if kind == ShapeKind::Polygon {
                    ShapeGeometry::Polygon { points }
                } else {
                    ShapeGeometry::Polyline { points }
                };
                ShapeBuild {
                    shape: ShapeNode::new(kind, geometry),
                    width: bbox.width(),
                    height: bbox.height(),
                    offset: bbox.origin().to_vec2(),
                    warning: None,
                }
            }
            ShapeKind::Line => {
                let p1 = PointData {
                    x: data.x1.unwrap_or(0.0),
                    y: data.y1.unwrap_or(0.0),
                };
                let p2 = PointData {
                    x: data.x2.unwrap_or(width),
                    y: data.y2.unwrap_or(height),
                };
                let (points, bbox) = normalize_points(&[p1, p2]);
                ShapeBuild {
                    shape: ShapeNode::new(
                        kind,
                        ShapeGeometry::Line {
                            from: points[0],
                            to: points[1],
                        },
                    ),
                    width: bbox.width(),
                    height: bbox.height(),
                    offset: bbox.origin().to_vec2(),
                    warning: None,
                }
            }
            ShapeKind::Path => {
                let Some(svg) = data.path.as_deref() else {
                    return Self::degraded(data, "path shape has no path data".to_string());
                };
                let mut path = match BezPath::from_svg(svg) {
                    Ok(path) => path,
                    Err(e) => return Self::degraded(data, format!("invalid path data: {e}")),
                };
                let bbox = path.bounding_box();
                let sx = if bbox.width() > 0.0 { 1.0 / bbox.width() } else { 1.0 };
                let sy = if bbox.height() > 0.0 { 1.0 / bbox.height() } else { 1.0 };
                path.apply_affine(
                    Affine::scale_non_uniform(sx, sy) * Affine::translate(-bbox.origin().to_vec2()),
                );
                ShapeBuild {
                    shape: ShapeNode::new(kind, ShapeGeometry::Path { path }),
                    width: bbox.width(),
                    height: bbox.height(),
                    offset: bbox.origin().to_vec2(),
                    warning: None,
                }
            }
        }
    }

    fn degraded(data: &NodeData, warning: String) -> ShapeBuild {
        ShapeBuild {
            shape: ShapeNode::new(ShapeKind::Rect, ShapeGeometry::Rect { rx: 0.0, ry: 0.0 }),
            width: data.width.unwrap_or(0.0),
            height: data.height.unwrap_or(0.0),
            offset: Vec2::ZERO,
            warning: Some(warning),
        }
    }

    pub fn is_open(&self) -> bool {
        self.kind.is_open()
    }

    /// Outline in node-local coordinates for a node of the given size.
    pub fn local_path(&self, width: f64, height: f64) -> BezPath {
        let scale = |p: &Point| Point::new(p.x * width, p.y * height);
        match &self.geometry {
            ShapeGeometry::Rect { rx, ry } => {
                let radius = rx.max(*ry).min(width / 2.0).min(height / 2.0).max(0.0);
                if radius > 0.0 {
                    RoundedRect::new(0.0, 0.0, width, height, radius).to_path(0.1)
                } else {
                    Rect::new(0.0, 0.0, width, height).to_path(0.1)
                }
            }
            ShapeGeometry::Ellipse => {
                Ellipse::new(Point::new(width / 2.0, height / 2.0), (width / 2.0, height / 2.0), 0.0)
                    .to_path(0.1)
            }
            ShapeGeometry::Triangle => {
                let mut path = BezPath::new();
                path.move_to(Point::new(width / 2.0, 0.0));
                path.line_to(Point::new(width, height));
                path.line_to(Point::new(0.0, height));
                path.close_path();
                path
            }
            ShapeGeometry::Polygon { points } | ShapeGeometry::Polyline { points } => {
                let mut path = BezPath::new();
                for (i, p) in points.iter().enumerate() {
                    if i == 0 {
                        path.move_to(scale(p));
                    } else {
                        path.line_to(scale(p));
                    }
                }
                if matches!(self.geometry, ShapeGeometry::Polygon { .. }) {
                    path.close_path();
                }
                path
            }
            ShapeGeometry::Line { from, to } => {
                let mut path = BezPath::new();
                path.move_to(scale(from));
                path.line_to(scale(to));
                path
            }
            ShapeGeometry::Path { path } => {
                let mut path = path.clone();
                path.apply_affine(Affine::scale_non_uniform(width, height));
                path
            }
        }
    }
}

/// Map points into the unit square of their bounding box.
fn normalize_points(points: &[PointData]) -> (Vec<Point>, Rect) {
    let bbox = points
        .iter()
        .map(|p| Point::new(p.x, p.y))
        .fold(None::<Rect>, |acc, p| {
            Some(match acc {
                Some(r) => r.union_pt(p),
                None => Rect::from_points(p, p),
            })
        })
        .unwrap_or(Rect::ZERO);
    let unit = |v: f64, min: f64, extent: f64| if extent > 0.0 { (v - min) / extent } else { 0.0 };
    let normalized = points
        .iter()
        .map(|p| {
            Point::new(
                unit(p.x, bbox.x0, bbox.width()),
                unit(p.y, bbox.y0, bbox.height()),
            )
        })
        .collect();
    (normalized, bbox)
}

//! Renderer payload carried by each template object.
//!
//! The payload is parsed leniently: known keys get typed fields, anything
//! else is preserved verbatim in `extra` so a round trip loses nothing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn one() -> f64 {
    1.0
}

fn is_one(v: &f64) -> bool {
    (*v - 1.0).abs() < f64::EPSILON
}

fn is_zero(v: &f64) -> bool {
    v.abs() < f64::EPSILON
}

/// A point in a polygon/polyline payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointData {
    pub x: f64,
    pub y: f64,
}

/// Opaque-ish node payload (geometry, paint, text, image, shape, group).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    /// Concrete kind (`textbox`, `image`, `rect`, `circle`, `group`, ...).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub top: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default = "one", skip_serializing_if = "is_one")]
    pub scale_x: f64,
    #[serde(default = "one", skip_serializing_if = "is_one")]
    pub scale_y: f64,
    /// Rotation in degrees.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub angle: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default = "one", skip_serializing_if = "is_one")]
    pub opacity: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    /// Numeric (`700`) or keyword (`"bold"`) weight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,

    /// Shape kind when `type` is the generic `shape`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rx: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ry: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<PointData>,
    /// SVG path data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y2: Option<f64>,

    /// Group children.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub objects: Vec<NodeData>,

    /// Filter configuration, passed through untouched.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<Value>,

    /// Explicit stacking attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i32>,

    /// Unrecognized keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for NodeData {
    fn default() -> Self {
        Self {
            kind: None,
            left: 0.0,
            top: 0.0,
            width: None,
            height: None,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
            fill: None,
            stroke: None,
            stroke_width: None,
            opacity: 1.0,
            text: None,
            font_size: None,
            font_family: None,
            font_weight: None,
            font_style: None,
            text_align: None,
            src: None,
            shape: None,
            rx: None,
            ry: None,
            radius: None,
            points: Vec::new(),
            path: None,
            x1: None,
            y1: None,
            x2: None,
            y2: None,
            objects: Vec::new(),
            filters: Vec::new(),
            shadow: None,
            z_index: None,
            extra: Map::new(),
        }
    }
}

impl NodeData {
    /// Payload of a text node.
    pub fn text(left: f64, top: f64, content: impl Into<String>) -> Self {
        Self {
            kind: Some("textbox".to_string()),
            left,
            top,
            text: Some(content.into()),
            ..Self::default()
        }
    }

    /// Payload of an image node.
    pub fn image(left: f64, top: f64, width: f64, height: f64, src: Option<String>) -> Self {
        Self {
            kind: Some("image".to_string()),
            left,
            top,
            width: Some(width),
            height: Some(height),
            src,
            ..Self::default()
        }
    }

    /// Payload of a shape node of the given kind (`rect`, `circle`, ...).
    pub fn shape(kind: &str, left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            kind: Some(kind.to_string()),
            left,
            top,
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    /// Payload of a group node.
    pub fn group(children: Vec<NodeData>) -> Self {
        Self {
            kind: Some("group".to_string()),
            objects: children,
            ..Self::default()
        }
    }

    pub fn with_fill(mut self, fill: impl Into<String>) -> Self {
        self.fill = Some(fill.into());
        self
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = Some(z_index);
        self
    }

    /// Shape kind name: the `shape` key when present, else `type`.
    pub fn shape_kind(&self) -> Option<&str> {
        self.shape.as_deref().or(self.kind.as_deref())
    }

    /// Whether the payload carries any filter configuration.
    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }

    /// Whether the payload carries a drop shadow.
    pub fn has_shadow(&self) -> bool {
        matches!(&self.shadow, Some(v) if !v.is_null())
    }

    /// Displayed extent (intrinsic size times scale), when the payload
    /// declares one.
    pub fn extent(&self) -> Option<(f64, f64)> {
        let (w, h) = match (self.width, self.height, self.radius) {
            (Some(w), Some(h), _) => (w, h),
            (_, _, Some(r)) => (r * 2.0, r * 2.0),
            _ => return None,
        };
        Some((w * self.scale_x.abs(), h * self.scale_y.abs()))
    }

    /// Whether the font weight is bold or heavier.
    pub fn is_bold(&self) -> bool {
        match &self.font_weight {
            Some(Value::Number(n)) => n.as_f64().is_some_and(|w| w >= 600.0),
            Some(Value::String(s)) => {
                matches!(s.to_ascii_lowercase().as_str(), "bold" | "bolder" | "heavy" | "black")
                    || s.parse::<f64>().is_ok_and(|w| w >= 600.0)
            }
            _ => false,
        }
    }
}

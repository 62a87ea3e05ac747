//! Live scene nodes.

use super::{GroupNode, ImageNode, ShapeNode, TextNode};
use crate::color::SerializableColor;
use crate::error::{LockedProperty, NodeError};
use crate::template::{Editable, ObjectType, Placeholder};
use kurbo::{Affine, BezPath, Point, Rect, Shape as KurboShape, Vec2};
use serde_json::Value;
use uuid::Uuid;

/// Unique identifier for scene nodes.
pub type NodeId = Uuid;

/// Position, scale and rotation of a node.
///
/// `left`/`top` place the node's unrotated top-left corner; rotation is
/// applied about the node centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub left: f64,
    pub top: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Rotation in degrees.
    pub angle: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
        }
    }
}

impl Transform {
    pub fn at(left: f64, top: f64) -> Self {
        Self {
            left,
            top,
            ..Self::default()
        }
    }
}

/// Identity attached to every node built from a template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeTags {
    /// Id of the template object the node was built from.
    pub template_object_id: Option<String>,
    pub template_type: Option<ObjectType>,
    pub editable: Editable,
    pub placeholder: Option<Placeholder>,
}

/// Locks derived from `editable`; `true` means the mutation is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LockFlags {
    pub content: bool,
    pub style: bool,
    pub movement: bool,
    pub scaling: bool,
    pub rotation: bool,
}

impl LockFlags {
    pub fn from_editable(editable: &Editable) -> Self {
        Self {
            content: !editable.content,
            style: !editable.style,
            movement: !editable.position,
            scaling: !editable.size,
            rotation: !editable.size,
        }
    }
}

/// Interaction affordances, derived strictly from `editable.position/size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Affordances {
    pub movable: bool,
    pub resizable: bool,
    pub rotatable: bool,
    pub selectable: bool,
}

impl Affordances {
    pub fn from_editable(editable: &Editable) -> Self {
        Self {
            movable: editable.position,
            resizable: editable.size,
            rotatable: editable.size,
            selectable: editable.position || editable.size,
        }
    }
}

impl Default for Affordances {
    fn default() -> Self {
        Self::from_editable(&Editable::all())
    }
}

/// Fill, stroke and opacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    pub fill: Option<SerializableColor>,
    pub stroke: Option<SerializableColor>,
    pub stroke_width: f64,
    pub opacity: f64,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            fill: Some(SerializableColor::black()),
            stroke: None,
            stroke_width: 1.0,
            opacity: 1.0,
        }
    }
}

/// Concrete content of a node.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Text(TextNode),
    Image(ImageNode),
    Shape(ShapeNode),
    Group(GroupNode),
}

impl NodeKind {
    pub fn object_type(&self) -> ObjectType {
        match self {
            NodeKind::Text(_) => ObjectType::Text,
            NodeKind::Image(_) => ObjectType::Image,
            NodeKind::Shape(_) => ObjectType::Shape,
            NodeKind::Group(_) => ObjectType::Group,
        }
    }
}

/// A live, mutable object in the scene.
#[derive(Debug, Clone)]
pub struct SceneNode {
    id: NodeId,
    kind: NodeKind,
    transform: Transform,
    width: f64,
    height: f64,
    paint: Paint,
    z_index: i32,
    tags: NodeTags,
    locks: LockFlags,
    affordances: Affordances,
    filters: Vec<Value>,
    shadow: Option<Value>,
}

impl SceneNode {
    /// Create a fully editable node with an intrinsic size.
    pub fn new(kind: NodeKind, transform: Transform, width: f64, height: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            transform,
            width,
            height,
            paint: Paint::default(),
            z_index: 0,
            tags: NodeTags::default(),
            locks: LockFlags::default(),
            affordances: Affordances::default(),
            filters: Vec::new(),
            shadow: None,
        }
    }

    /// Apply `editable` to the tags and derive locks and affordances.
    pub fn with_editable(mut self, editable: Editable) -> Self {
        self.apply_editable(editable);
        self
    }

    pub fn with_paint(mut self, paint: Paint) -> Self {
        self.paint = paint;
        self
    }

    pub(crate) fn apply_editable(&mut self, editable: Editable) {
        self.tags.editable = editable;
        self.locks = LockFlags::from_editable(&editable);
        self.affordances = Affordances::from_editable(&editable);
        if let NodeKind::Group(group) = &mut self.kind {
            for child in group.children_mut() {
                child.apply_editable(editable);
            }
        }
    }

    pub(crate) fn set_tags(&mut self, tags: NodeTags) {
        let editable = tags.editable;
        self.tags = tags;
        self.apply_editable(editable);
    }

    pub(crate) fn set_decorations(&mut self, filters: Vec<Value>, shadow: Option<Value>) {
        self.filters = filters;
        self.shadow = shadow.filter(|v| !v.is_null());
    }

    /// Copy position, scale and rotation from another node. Used when a
    /// replacement takes over a slot, so it bypasses the locks.
    pub(crate) fn adopt_transform(&mut self, other: &SceneNode) {
        self.transform = other.transform;
        self.width = other.width;
        self.height = other.height;
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Intrinsic (unscaled) width.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Intrinsic (unscaled) height.
    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn paint(&self) -> &Paint {
        &self.paint
    }

    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    /// Write the stacking attribute read by layer collaborators.
    pub fn set_z_index(&mut self, z_index: i32) {
        self.z_index = z_index;
    }

    pub fn tags(&self) -> &NodeTags {
        &self.tags
    }

    pub fn locks(&self) -> LockFlags {
        self.locks
    }

    pub fn affordances(&self) -> Affordances {
        self.affordances
    }

    pub fn filters(&self) -> &[Value] {
        &self.filters
    }

    pub fn shadow(&self) -> Option<&Value> {
        self.shadow.as_ref()
    }

    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }

    pub fn has_shadow(&self) -> bool {
        self.shadow.is_some()
    }

    pub fn object_type(&self) -> ObjectType {
        self.kind.object_type()
    }

    pub fn as_text(&self) -> Option<&TextNode> {
        match &self.kind {
            NodeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub(crate) fn as_text_mut(&mut self) -> Option<&mut TextNode> {
        match &mut self.kind {
            NodeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageNode> {
        match &self.kind {
            NodeKind::Image(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&GroupNode> {
        match &self.kind {
            NodeKind::Group(g) => Some(g),
            _ => None,
        }
    }

    fn check(&self, locked: bool, property: LockedProperty) -> Result<(), NodeError> {
        if locked {
            Err(NodeError::Locked {
                node: self.id,
                property,
            })
        } else {
            Ok(())
        }
    }

    fn reject_group(&self, operation: &'static str) -> Result<(), NodeError> {
        match self.kind {
            NodeKind::Group(_) => Err(NodeError::Unsupported {
                node: self.id,
                operation,
            }),
            _ => Ok(()),
        }
    }

    /// Move the node's top-left corner.
    pub fn set_position(&mut self, left: f64, top: f64) -> Result<(), NodeError> {
        self.check(self.locks.movement, LockedProperty::Position)?;
        self.translate(Vec2::new(left - self.transform.left, top - self.transform.top));
        Ok(())
    }

    /// Shift the node (and any group children) without consulting locks.
    pub(crate) fn translate(&mut self, delta: Vec2) {
        self.transform.left += delta.x;
        self.transform.top += delta.y;
        if let NodeKind::Group(group) = &mut self.kind {
            for child in group.children_mut() {
                child.translate(delta);
            }
        }
    }

    /// Change the intrinsic size.
    pub fn set_size(&mut self, width: f64, height: f64) -> Result<(), NodeError> {
        self.check(self.locks.scaling, LockedProperty::Size)?;
        self.reject_group("resizing a group")?;
        self.width = width.max(0.0);
        self.height = height.max(0.0);
        Ok(())
    }

    pub fn set_scale(&mut self, scale_x: f64, scale_y: f64) -> Result<(), NodeError> {
        self.check(self.locks.scaling, LockedProperty::Size)?;
        self.reject_group("scaling a group")?;
        self.transform.scale_x = scale_x;
        self.transform.scale_y = scale_y;
        Ok(())
    }

    /// Set the rotation in degrees.
    pub fn set_rotation(&mut self, angle: f64) -> Result<(), NodeError> {
        self.check(self.locks.rotation, LockedProperty::Size)?;
        self.reject_group("rotating a group")?;
        self.transform.angle = angle;
        Ok(())
    }

    pub fn set_fill(&mut self, fill: Option<SerializableColor>) -> Result<(), NodeError> {
        self.check(self.locks.style, LockedProperty::Style)?;
        self.paint.fill = fill;
        Ok(())
    }

    pub fn set_opacity(&mut self, opacity: f64) -> Result<(), NodeError> {
        self.check(self.locks.style, LockedProperty::Style)?;
        self.paint.opacity = opacity.clamp(0.0, 1.0);
        Ok(())
    }

    /// Replace the text of a text node.
    pub fn set_text(&mut self, content: impl Into<String>) -> Result<(), NodeError> {
        self.check(self.locks.content, LockedProperty::Content)?;
        let id = self.id;
        match &mut self.kind {
            NodeKind::Text(text) => {
                text.set_content(content.into());
                Ok(())
            }
            _ => Err(NodeError::Unsupported {
                node: id,
                operation: "setting text",
            }),
        }
    }

    /// Swap the bitmap of an image node.
    pub fn set_image(&mut self, image: ImageNode) -> Result<(), NodeError> {
        self.check(self.locks.content, LockedProperty::Content)?;
        let id = self.id;
        match &mut self.kind {
            NodeKind::Image(current) => {
                *current = image;
                Ok(())
            }
            _ => Err(NodeError::Unsupported {
                node: id,
                operation: "setting an image",
            }),
        }
    }

    /// Displayed size (intrinsic size times scale).
    pub fn scaled_size(&self) -> (f64, f64) {
        (
            self.width * self.transform.scale_x.abs(),
            self.height * self.transform.scale_y.abs(),
        )
    }

    /// Map node-local coordinates (`0..width`, `0..height`) into the scene.
    pub fn affine(&self) -> Affine {
        let t = &self.transform;
        let placed = Affine::translate((t.left, t.top)) * Affine::scale_non_uniform(t.scale_x, t.scale_y);
        if t.angle == 0.0 {
            return placed;
        }
        let (w, h) = self.scaled_size();
        let center = Point::new(t.left + w / 2.0, t.top + h / 2.0);
        Affine::rotate_about(t.angle.to_radians(), center) * placed
    }

    /// Outline in scene coordinates.
    pub fn to_path(&self) -> BezPath {
        match &self.kind {
            NodeKind::Group(group) => group.to_path(),
            NodeKind::Shape(shape) => {
                let mut path = shape.local_path(self.width, self.height);
                path.apply_affine(self.affine());
                path
            }
            NodeKind::Text(_) | NodeKind::Image(_) => {
                let mut path = Rect::new(0.0, 0.0, self.width, self.height).to_path(0.1);
                path.apply_affine(self.affine());
                path
            }
        }
    }

    /// Axis-aligned bounding box in scene coordinates.
    pub fn bounds(&self) -> Rect {
        match &self.kind {
            NodeKind::Group(group) => group.bounds(),
            _ => self.to_path().bounding_box(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ShapeGeometry, ShapeKind};

    fn rect_node(editable: Editable) -> SceneNode {
        SceneNode::new(
            NodeKind::Shape(ShapeNode::new(ShapeKind::Rect, ShapeGeometry::Rect { rx: 0.0, ry: 0.0 })),
            Transform::at(10.0, 20.0),
            100.0,
            50.0,
        )
        .with_editable(editable)
    }

    #[test]
    fn test_locks_follow_editable() {
        let mut node = rect_node(Editable {
            content: true,
            style: false,
            position: false,
            size: true,
        });
        assert!(matches!(
            node.set_position(0.0, 0.0),
            Err(NodeError::Locked {
                property: LockedProperty::Position,
                ..
            })
        ));
        assert!(node.set_fill(None).is_err());
        assert!(node.set_size(10.0, 10.0).is_ok());
        assert_eq!(node.transform().left, 10.0);

        let affordances = node.affordances();
        assert!(!affordances.movable);
        assert!(affordances.resizable);
        assert!(affordances.rotatable);
        assert!(affordances.selectable);
    }

    #[test]
    fn test_fully_locked_node_is_not_selectable() {
        let node = rect_node(Editable::locked());
        assert!(!node.affordances().selectable);
        assert!(node.locks().rotation);
    }

    #[test]
    fn test_bounds_with_scale() {
        let mut node = rect_node(Editable::all());
        node.set_scale(2.0, 1.0).unwrap();
        let bounds = node.bounds();
        assert!((bounds.x0 - 10.0).abs() < 1e-6);
        assert!((bounds.y0 - 20.0).abs() < 1e-6);
        assert!((bounds.width() - 200.0).abs() < 1e-6);
        assert!((bounds.height() - 50.0).abs() < 1e-6);
    }

    #[test]
    fn test_rotation_keeps_center() {
        let mut node = rect_node(Editable::all());
        let before = node.bounds().center();
        node.set_rotation(90.0).unwrap();
        let after = node.bounds();
        assert!((after.center().x - before.x).abs() < 1e-6);
        assert!((after.center().y - before.y).abs() < 1e-6);
        assert!((after.width() - 50.0).abs() < 1e-6);
    }

    #[test]
    fn test_set_text_on_shape_is_unsupported() {
        let mut node = rect_node(Editable::all());
        assert!(matches!(
            node.set_text("hi"),
            Err(NodeError::Unsupported { .. })
        ));
    }
}

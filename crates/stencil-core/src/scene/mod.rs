//! Live editable scene.

mod group;
mod image;
mod node;
mod shape;
mod text;

pub use group::GroupNode;
pub use image::{ImageFormat, ImageNode};
pub use node::{
    Affordances, LockFlags, NodeId, NodeKind, NodeTags, Paint, SceneNode, Transform,
};
pub use shape::{ShapeBuild, ShapeGeometry, ShapeKind, ShapeNode};
pub use text::{LINE_HEIGHT_FACTOR, TextAlign, TextNode};

use crate::color::SerializableColor;
use kurbo::Rect;
use std::collections::HashMap;

/// Saved scene state for rollback.
#[derive(Debug, Clone)]
pub struct SceneSnapshot {
    width: u32,
    height: u32,
    background: SerializableColor,
    background_image: Option<String>,
    nodes: HashMap<NodeId, SceneNode>,
    z_order: Vec<NodeId>,
}

impl SceneSnapshot {
    pub fn len(&self) -> usize {
        self.z_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.z_order.is_empty()
    }
}

/// The scene a template is applied to: canvas size, background and the
/// top-level nodes in stacking order.
#[derive(Debug, Clone)]
pub struct Scene {
    pub width: u32,
    pub height: u32,
    pub background: SerializableColor,
    pub background_image: Option<String>,
    nodes: HashMap<NodeId, SceneNode>,
    /// Z-order of nodes (back to front).
    z_order: Vec<NodeId>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

impl Scene {
    /// Create an empty white scene.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            background: SerializableColor::white(),
            background_image: None,
            nodes: HashMap::new(),
            z_order: Vec::new(),
        }
    }

    /// Add a node on top of the stack.
    pub fn add_node(&mut self, node: SceneNode) -> NodeId {
        let id = node.id();
        self.z_order.push(id);
        self.nodes.insert(id, node);
        id
    }

    /// Insert a node at a stacking index (clamped to the top).
    pub fn insert_node_at(&mut self, index: usize, node: SceneNode) -> NodeId {
        let id = node.id();
        let index = index.min(self.z_order.len());
        self.z_order.insert(index, id);
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node from the scene.
    pub fn remove_node(&mut self, id: NodeId) -> Option<SceneNode> {
        self.z_order.retain(|&node_id| node_id != id);
        self.nodes.remove(&id)
    }

    /// Swap `id` for `replacement`, keeping its stacking slot. Returns the
    /// removed node, or hands the replacement back if `id` is not present.
    pub fn replace_node(&mut self, id: NodeId, replacement: SceneNode) -> Result<SceneNode, SceneNode> {
        let Some(slot) = self.z_order.iter().position(|&node_id| node_id == id) else {
            return Err(replacement);
        };
        let Some(old) = self.nodes.remove(&id) else {
            return Err(replacement);
        };
        let new_id = replacement.id();
        self.z_order[slot] = new_id;
        self.nodes.insert(new_id, replacement);
        Ok(old)
    }

    /// Clear all nodes from the scene.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.z_order.clear();
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Get nodes in z-order (back to front).
    pub fn nodes_ordered(&self) -> impl Iterator<Item = &SceneNode> {
        self.z_order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn z_order(&self) -> &[NodeId] {
        &self.z_order
    }

    /// Find the top-level node built from a template object.
    pub fn find_by_template_id(&self, template_object_id: &str) -> Option<&SceneNode> {
        self.nodes_ordered()
            .find(|n| n.tags().template_object_id.as_deref() == Some(template_object_id))
    }

    pub fn len(&self) -> usize {
        self.z_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.z_order.is_empty()
    }

    /// Get the bounding box of all nodes.
    pub fn bounds(&self) -> Option<Rect> {
        self.nodes
            .values()
            .map(SceneNode::bounds)
            .reduce(|a, b| a.union(b))
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            width: self.width,
            height: self.height,
            background: self.background,
            background_image: self.background_image.clone(),
            nodes: self.nodes.clone(),
            z_order: self.z_order.clone(),
        }
    }

    /// Restore a snapshot verbatim, discarding everything since.
    pub fn restore(&mut self, snapshot: SceneSnapshot) {
        self.width = snapshot.width;
        self.height = snapshot.height;
        self.background = snapshot.background;
        self.background_image = snapshot.background_image;
        self.nodes = snapshot.nodes;
        self.z_order = snapshot.z_order;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_node(content: &str) -> SceneNode {
        SceneNode::new(
            NodeKind::Text(TextNode::new(content, 16.0)),
            Transform::default(),
            100.0,
            20.0,
        )
    }

    #[test]
    fn test_add_and_order() {
        let mut scene = Scene::new(400, 300);
        let a = scene.add_node(text_node("a"));
        let b = scene.add_node(text_node("b"));
        let c = scene.insert_node_at(0, text_node("c"));
        assert_eq!(scene.z_order(), &[c, a, b]);
        assert_eq!(scene.len(), 3);
        scene.remove_node(a);
        assert_eq!(scene.z_order(), &[c, b]);
    }

    #[test]
    fn test_replace_keeps_slot() {
        let mut scene = Scene::new(400, 300);
        let a = scene.add_node(text_node("a"));
        let b = scene.add_node(text_node("b"));
        let replacement = text_node("b2");
        let new_id = replacement.id();
        let old = scene.replace_node(a, replacement).unwrap();
        assert_eq!(old.id(), a);
        assert_eq!(scene.z_order(), &[new_id, b]);
        assert!(!scene.contains(a));

        let stray = text_node("x");
        assert!(scene.replace_node(a, stray).is_err());
    }

    #[test]
    fn test_snapshot_restore() {
        let mut scene = Scene::new(400, 300);
        scene.add_node(text_node("keep"));
        let snapshot = scene.snapshot();

        scene.clear();
        scene.resize(10, 10);
        scene.background = SerializableColor::black();
        scene.add_node(text_node("temp"));

        scene.restore(snapshot);
        assert_eq!((scene.width, scene.height), (400, 300));
        assert_eq!(scene.background, SerializableColor::white());
        assert_eq!(scene.len(), 1);
        let only = scene.nodes_ordered().next().unwrap();
        assert_eq!(only.as_text().unwrap().content(), "keep");
    }
}

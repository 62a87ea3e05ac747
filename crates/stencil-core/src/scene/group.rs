//! Group node combining child nodes.

use super::SceneNode;
use kurbo::{BezPath, Rect};

/// A group of nodes manipulated as a single unit. Children keep absolute
/// scene coordinates; moving the group moves every child.
#[derive(Debug, Clone, Default)]
pub struct GroupNode {
    children: Vec<SceneNode>,
}

impl GroupNode {
    pub fn new(children: Vec<SceneNode>) -> Self {
        Self { children }
    }

    /// Get the children of this group.
    pub fn children(&self) -> &[SceneNode] {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<SceneNode> {
        &mut self.children
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes in this group, nested groups included.
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|c| 1 + c.as_group().map_or(0, GroupNode::descendant_count))
            .sum()
    }

    /// Union of the children's bounds; zero-sized when empty.
    pub fn bounds(&self) -> Rect {
        self.children
            .iter()
            .map(SceneNode::bounds)
            .reduce(|a, b| a.union(b))
            .unwrap_or(Rect::ZERO)
    }

    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        for child in &self.children {
            path.extend(child.to_path());
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{NodeKind, ShapeGeometry, ShapeKind, ShapeNode, Transform};

    fn square(left: f64, top: f64) -> SceneNode {
        SceneNode::new(
            NodeKind::Shape(ShapeNode::new(ShapeKind::Rect, ShapeGeometry::Rect { rx: 0.0, ry: 0.0 })),
            Transform::at(left, top),
            10.0,
            10.0,
        )
    }

    #[test]
    fn test_bounds_union() {
        let group = GroupNode::new(vec![square(0.0, 0.0), square(30.0, 20.0)]);
        assert_eq!(group.bounds(), Rect::new(0.0, 0.0, 40.0, 30.0));
        assert_eq!(group.descendant_count(), 2);
    }

    #[test]
    fn test_moving_group_moves_children() {
        let group = GroupNode::new(vec![square(0.0, 0.0), square(30.0, 20.0)]);
        let bounds = group.bounds();
        let mut node = SceneNode::new(
            NodeKind::Group(group),
            Transform::at(bounds.x0, bounds.y0),
            bounds.width(),
            bounds.height(),
        );
        node.set_position(5.0, 5.0).unwrap();
        assert_eq!(node.bounds(), Rect::new(5.0, 5.0, 45.0, 35.0));
        let first = &node.as_group().unwrap().children()[0];
        assert_eq!(first.transform().left, 5.0);
    }

    #[test]
    fn test_empty_group() {
        let group = GroupNode::default();
        assert!(group.is_empty());
        assert_eq!(group.bounds(), Rect::ZERO);
    }
}

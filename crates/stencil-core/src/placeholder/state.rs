//! Placeholder lifecycle state.

use crate::scene::NodeId;
use crate::template::Placeholder;

/// Lifecycle phase of a registered placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaceholderPhase {
    /// Registered, never interacted with.
    #[default]
    Inactive,
    /// Selected or hovered.
    Activated,
    /// Text being edited in place.
    Editing,
    /// Interaction ended without user content.
    Deactivated,
    /// Holds user content and is not being interacted with.
    Replaced,
}

impl PlaceholderPhase {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Activated | Self::Editing)
    }

    /// Phase a slot settles in once interaction ends.
    pub(crate) fn at_rest(has_content: bool) -> Self {
        if has_content { Self::Replaced } else { Self::Deactivated }
    }
}

/// Per-node placeholder registration.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderState {
    pub(crate) node: NodeId,
    pub(crate) template_object_id: String,
    pub(crate) placeholder: Placeholder,
    pub(crate) phase: PlaceholderPhase,
    /// Set once the slot holds user content instead of its default.
    pub(crate) has_content: bool,
}

impl PlaceholderState {
    pub(crate) fn new(node: NodeId, template_object_id: String, placeholder: Placeholder) -> Self {
        Self {
            node,
            template_object_id,
            placeholder,
            phase: PlaceholderPhase::Inactive,
            has_content: false,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn template_object_id(&self) -> &str {
        &self.template_object_id
    }

    pub fn placeholder(&self) -> &Placeholder {
        &self.placeholder
    }

    pub fn phase(&self) -> PlaceholderPhase {
        self.phase
    }

    pub fn has_content(&self) -> bool {
        self.has_content
    }
}

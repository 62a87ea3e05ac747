//! Placeholder registration and lifecycle management.

use super::events::{EventBus, PlaceholderEvent};
use super::state::{PlaceholderPhase, PlaceholderState};
use super::suggestions::{StaticSuggestions, SuggestionProvider};
use crate::assets::{ImageLoader, SourceLoader, decode_image, is_media_source};
use crate::config::DEFAULT_IMAGE_TIMEOUT_MS;
use crate::error::{LockedProperty, NodeError, PlaceholderError};
use crate::scene::{ImageNode, NodeId, NodeKind, Paint, Scene, SceneNode};
use crate::template::{Placeholder, PlaceholderKind};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// Content replacement request.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaceRequest {
    /// New text, or a media URI / data URI for image slots.
    pub content: String,
    /// Keep the node's paint and typography.
    pub preserve_style: bool,
    /// Reject empty text and non-media sources before mutating.
    pub validate_content: bool,
}

impl ReplaceRequest {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            preserve_style: true,
            validate_content: true,
        }
    }

    pub fn with_preserve_style(mut self, preserve: bool) -> Self {
        self.preserve_style = preserve;
        self
    }

    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate_content = validate;
        self
    }
}

/// Registered placeholders for one scene.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderSnapshot {
    states: HashMap<NodeId, PlaceholderState>,
    by_template: HashMap<String, NodeId>,
}

/// Owns placeholder state, suggestion providers and the event channel.
pub struct PlaceholderManager {
    states: HashMap<NodeId, PlaceholderState>,
    by_template: HashMap<String, NodeId>,
    providers: HashMap<PlaceholderKind, Arc<dyn SuggestionProvider>>,
    events: EventBus,
    loader: Arc<dyn ImageLoader>,
    image_timeout: Duration,
}

impl Default for PlaceholderManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PlaceholderManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaceholderManager")
            .field("states", &self.states.len())
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .field("image_timeout", &self.image_timeout)
            .finish_non_exhaustive()
    }
}

/// Whether `node` holds something other than the slot's default.
fn node_has_content(node: &SceneNode, placeholder: &Placeholder) -> bool {
    match node.kind() {
        NodeKind::Text(text) => {
            let content = text.content().trim();
            !text.is_hint() && !content.is_empty() && content != placeholder.default_content.trim()
        }
        NodeKind::Image(image) => {
            !image.is_placeholder_art()
                && image
                    .source()
                    .is_some_and(|s| !s.is_empty() && s != placeholder.default_content)
        }
        NodeKind::Shape(_) | NodeKind::Group(_) => false,
    }
}

impl PlaceholderManager {
    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
            by_template: HashMap::new(),
            providers: HashMap::new(),
            events: EventBus::default(),
            loader: Arc::new(SourceLoader::new()),
            image_timeout: Duration::from_millis(DEFAULT_IMAGE_TIMEOUT_MS),
        }
    }

    /// Loader used for media replacements.
    pub fn with_loader(mut self, loader: Arc<dyn ImageLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_image_timeout(mut self, timeout: Duration) -> Self {
        self.image_timeout = timeout;
        self
    }

    /// Subscribe to lifecycle, tooltip and suggestion events.
    pub fn subscribe(&mut self) -> Receiver<PlaceholderEvent> {
        self.events.subscribe()
    }

    /// Register `node` as a fillable slot. Re-registering replaces the
    /// previous state.
    pub fn register(&mut self, node: &SceneNode, placeholder: Placeholder) {
        let id = node.id();
        let template_object_id = node
            .tags()
            .template_object_id
            .clone()
            .unwrap_or_else(|| id.to_string());
        let mut state = PlaceholderState::new(id, template_object_id.clone(), placeholder);
        state.has_content = node_has_content(node, &state.placeholder);

        if let Some(previous) = self.by_template.insert(template_object_id.clone(), id) {
            if previous != id {
                self.states.remove(&previous);
            }
        }
        self.states.insert(id, state);
        log::debug!("Registered placeholder {} for node {}", template_object_id, id);
        self.events.emit(PlaceholderEvent::Registered {
            node: id,
            template_object_id,
        });
    }

    pub fn unregister(&mut self, node: NodeId) -> Option<PlaceholderState> {
        let state = self.states.remove(&node)?;
        if self.by_template.get(&state.template_object_id) == Some(&node) {
            self.by_template.remove(&state.template_object_id);
        }
        self.events.emit(PlaceholderEvent::Unregistered { node });
        Some(state)
    }

    /// Drop registrations whose node is no longer in the scene.
    pub fn prune(&mut self, scene: &Scene) -> usize {
        let gone: Vec<NodeId> = self
            .states
            .keys()
            .copied()
            .filter(|id| !scene.contains(*id))
            .collect();
        for id in &gone {
            self.unregister(*id);
        }
        gone.len()
    }

    pub fn clear(&mut self) {
        let ids: Vec<NodeId> = self.states.keys().copied().collect();
        for id in ids {
            self.unregister(id);
        }
    }

    pub fn state(&self, node: NodeId) -> Option<&PlaceholderState> {
        self.states.get(&node)
    }

    pub fn states(&self) -> impl Iterator<Item = &PlaceholderState> {
        self.states.values()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Node currently holding the slot built from `template_object_id`.
    pub fn lookup_by_template_object(&self, template_object_id: &str) -> Option<NodeId> {
        self.by_template.get(template_object_id).copied()
    }

    fn state_mut(&mut self, node: NodeId) -> Result<&mut PlaceholderState, PlaceholderError> {
        self.states
            .get_mut(&node)
            .ok_or(PlaceholderError::NotRegistered(node))
    }

    /// Selection or hover reached the node.
    pub fn activate(&mut self, node: NodeId) -> Result<(), PlaceholderError> {
        let state = self.state_mut(node)?;
        if state.phase.is_active() {
            return Ok(());
        }
        state.phase = PlaceholderPhase::Activated;
        let message = if state.placeholder.kind.is_media() {
            format!("Double-click to replace {}", state.placeholder.kind.label().to_lowercase())
        } else {
            "Double-click to edit text".to_string()
        };
        self.events.emit(PlaceholderEvent::Activated { node });
        self.events.emit(PlaceholderEvent::TooltipShown { node, message });
        Ok(())
    }

    /// Selection or hover left the node. Ends any in-place edit.
    pub fn deactivate(&mut self, scene: &mut Scene, node: NodeId) -> Result<(), PlaceholderError> {
        let phase = self.state_mut(node)?.phase;
        if !phase.is_active() {
            return Ok(());
        }
        if phase == PlaceholderPhase::Editing {
            self.end_editing(scene, node)?;
        }
        let state = self.state_mut(node)?;
        state.phase = PlaceholderPhase::at_rest(state.has_content);
        self.events.emit(PlaceholderEvent::TooltipHidden { node });
        self.events.emit(PlaceholderEvent::Deactivated { node });
        Ok(())
    }

    /// Double interaction: text enters in-place editing, media slots ask
    /// the UI for suggestions.
    pub fn interact(&mut self, scene: &mut Scene, node: NodeId) -> Result<(), PlaceholderError> {
        self.activate(node)?;
        let state = self.state_mut(node)?;
        let kind = state.placeholder.kind;
        if kind.is_media() {
            let suggestions = state.placeholder.suggestions.clone();
            self.events.emit(PlaceholderEvent::SuggestionsRequested {
                node,
                kind,
                suggestions,
            });
            return Ok(());
        }

        let scene_node = scene
            .node_mut(node)
            .ok_or(PlaceholderError::MissingNode(node))?;
        let text = scene_node.as_text_mut().ok_or(NodeError::Unsupported {
            node,
            operation: "text editing",
        })?;
        if !text.enter_editing() {
            return Err(NodeError::Locked {
                node,
                property: LockedProperty::Content,
            }
            .into());
        }
        self.state_mut(node)?.phase = PlaceholderPhase::Editing;
        self.events.emit(PlaceholderEvent::TooltipHidden { node });
        self.events.emit(PlaceholderEvent::EditingStarted { node });
        Ok(())
    }

    /// Leave in-place text editing. Edited text moves the slot to
    /// `Replaced`; empty text reverts to the default hint.
    pub fn end_editing(&mut self, scene: &mut Scene, node: NodeId) -> Result<(), PlaceholderError> {
        if self.state_mut(node)?.phase != PlaceholderPhase::Editing {
            return Ok(());
        }
        let scene_node = scene
            .node_mut(node)
            .ok_or(PlaceholderError::MissingNode(node))?;
        if let Some(text) = scene_node.as_text_mut() {
            text.exit_editing();
        }
        self.state_mut(node)?.phase = PlaceholderPhase::Activated;
        self.events.emit(PlaceholderEvent::EditingEnded { node });
        self.notify_content_changed(scene, node)?;
        let state = self.state_mut(node)?;
        if state.has_content {
            state.phase = PlaceholderPhase::Replaced;
        }
        Ok(())
    }

    /// Recompute `has_content` after an external mutation of the node. A
    /// slot at rest moves to `Replaced` when it gains content and back to
    /// `Inactive` when it loses it.
    pub fn notify_content_changed(&mut self, scene: &Scene, node: NodeId) -> Result<(), PlaceholderError> {
        let scene_node = scene.node(node).ok_or(PlaceholderError::MissingNode(node))?;
        let state = self.state_mut(node)?;
        state.has_content = node_has_content(scene_node, &state.placeholder);
        let has_content = state.has_content;
        state.phase = match state.phase {
            PlaceholderPhase::Activated | PlaceholderPhase::Editing => state.phase,
            _ if has_content => PlaceholderPhase::Replaced,
            PlaceholderPhase::Replaced => PlaceholderPhase::Inactive,
            phase => phase,
        };
        self.events.emit(PlaceholderEvent::ContentChanged { node, has_content });
        Ok(())
    }

    /// Whether the slot holds content other than its default.
    pub fn has_valid_content(&self, scene: &Scene, node: NodeId) -> bool {
        match (self.states.get(&node), scene.node(node)) {
            (Some(state), Some(scene_node)) => node_has_content(scene_node, &state.placeholder),
            _ => false,
        }
    }

    pub fn register_provider(&mut self, kind: PlaceholderKind, provider: Arc<dyn SuggestionProvider>) {
        self.providers.insert(kind, provider);
    }

    /// Suggestions for the slot, from the provider registered for its kind
    /// or the static list.
    pub async fn suggestions(&self, node: NodeId) -> Result<Vec<String>, PlaceholderError> {
        let state = self
            .states
            .get(&node)
            .ok_or(PlaceholderError::NotRegistered(node))?;
        let list = match self.providers.get(&state.placeholder.kind) {
            Some(provider) => provider.suggestions(&state.placeholder).await,
            None => StaticSuggestions.suggestions(&state.placeholder).await,
        };
        Ok(list)
    }

    /// Replace the slot's content. Validation, locks and loading all happen
    /// before the scene is touched, so a failure leaves the node unchanged.
    /// Returns the id of the node now holding the slot.
    pub async fn replace_content(
        &mut self,
        scene: &mut Scene,
        node: NodeId,
        request: ReplaceRequest,
    ) -> Result<NodeId, PlaceholderError> {
        let kind = self
            .states
            .get(&node)
            .ok_or(PlaceholderError::NotRegistered(node))?
            .placeholder
            .kind;
        let current = scene.node(node).ok_or(PlaceholderError::MissingNode(node))?;

        if request.validate_content {
            if kind.is_media() {
                if !is_media_source(&request.content) {
                    return Err(PlaceholderError::InvalidContent(format!(
                        "'{}' is not an image URL or data URI",
                        request.content
                    )));
                }
            } else if request.content.trim().is_empty() {
                return Err(PlaceholderError::InvalidContent(
                    "text content must not be empty".to_string(),
                ));
            }
        }
        if current.locks().content {
            return Err(NodeError::Locked {
                node,
                property: LockedProperty::Content,
            }
            .into());
        }

        let new_id = if kind.is_media() {
            let replacement = self.build_media_replacement(current, &request).await?;
            let new_id = replacement.id();
            if scene.replace_node(node, replacement).is_err() {
                return Err(PlaceholderError::MissingNode(node));
            }
            self.move_registration(node, new_id);
            new_id
        } else {
            let scene_node = scene
                .node_mut(node)
                .ok_or(PlaceholderError::MissingNode(node))?;
            scene_node.set_text(request.content.clone())?;
            if !request.preserve_style && !scene_node.locks().style {
                if let Some(text) = scene_node.as_text_mut() {
                    text.bold = false;
                    text.italic = false;
                }
            }
            node
        };

        if let Some(state) = self.states.get_mut(&new_id) {
            state.phase = PlaceholderPhase::Replaced;
        }
        self.notify_content_changed(scene, new_id)?;
        log::debug!("Replaced placeholder content of {} (now {})", node, new_id);
        Ok(new_id)
    }

    async fn build_media_replacement(
        &self,
        current: &SceneNode,
        request: &ReplaceRequest,
    ) -> Result<SceneNode, PlaceholderError> {
        let uri = request.content.trim();
        let load = async {
            let bytes = self.loader.load(uri).await?;
            decode_image(&bytes)
        };
        let decoded = tokio::time::timeout(self.image_timeout, load)
            .await
            .map_err(|_| PlaceholderError::Timeout(self.image_timeout.as_millis() as u64))??;

        let image = ImageNode::loaded(uri, decoded.pixels, decoded.format);
        let mut replacement = SceneNode::new(
            NodeKind::Image(image),
            current.transform(),
            current.width(),
            current.height(),
        );
        replacement.adopt_transform(current);
        replacement.set_tags(current.tags().clone());
        replacement.set_z_index(current.z_index());
        if request.preserve_style {
            replacement = replacement.with_paint(*current.paint());
            replacement.set_decorations(current.filters().to_vec(), current.shadow().cloned());
        } else {
            replacement = replacement.with_paint(Paint {
                fill: None,
                ..Paint::default()
            });
        }
        Ok(replacement)
    }

    fn move_registration(&mut self, old: NodeId, new: NodeId) {
        let Some(mut state) = self.states.remove(&old) else {
            return;
        };
        state.node = new;
        self.by_template.insert(state.template_object_id.clone(), new);
        let template_object_id = state.template_object_id.clone();
        self.states.insert(new, state);
        self.events.emit(PlaceholderEvent::Replaced {
            old,
            new,
            template_object_id,
        });
    }

    pub fn snapshot(&self) -> PlaceholderSnapshot {
        PlaceholderSnapshot {
            states: self.states.clone(),
            by_template: self.by_template.clone(),
        }
    }

    /// Restore registrations verbatim. Providers and subscribers are kept.
    pub fn restore(&mut self, snapshot: PlaceholderSnapshot) {
        self.states = snapshot.states;
        self.by_template = snapshot.by_template;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::DataUriLoader;
    use crate::error::AssetError;
    use crate::scene::{TextNode, Transform};
    use crate::storage::BoxFuture;
    use crate::template::{Editable, ObjectType};
    use crate::scene::NodeTags;
    use base64::Engine;
    use std::io::Cursor;

    fn png_data_uri() -> String {
        let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(bytes)
        )
    }

    fn tagged(mut node: SceneNode, id: &str, object_type: ObjectType, placeholder: &Placeholder) -> SceneNode {
        node.set_tags(NodeTags {
            template_object_id: Some(id.to_string()),
            template_type: Some(object_type),
            editable: Editable::all(),
            placeholder: Some(placeholder.clone()),
        });
        node
    }

    fn text_slot(scene: &mut Scene, manager: &mut PlaceholderManager) -> NodeId {
        let placeholder = Placeholder::new(PlaceholderKind::Text, "Your headline");
        let text = TextNode::new("Your headline", 24.0)
            .with_interactive(true)
            .with_default_content(Some("Your headline".to_string()));
        let node = tagged(
            SceneNode::new(NodeKind::Text(text), Transform::at(10.0, 10.0), 200.0, 30.0),
            "headline",
            ObjectType::Text,
            &placeholder,
        );
        manager.register(&node, placeholder);
        scene.add_node(node)
    }

    fn image_slot(scene: &mut Scene, manager: &mut PlaceholderManager) -> NodeId {
        let placeholder = Placeholder::new(PlaceholderKind::Logo, "")
            .with_suggestions(vec!["https://cdn.example.com/logo.png".to_string()]);
        let art = ImageNode::placeholder_art(image::RgbaImage::new(10, 10));
        let mut node = tagged(
            SceneNode::new(NodeKind::Image(art), Transform::at(40.0, 60.0), 120.0, 80.0),
            "logo",
            ObjectType::Image,
            &placeholder,
        );
        node.set_scale(1.5, 0.5).unwrap();
        node.set_rotation(30.0).unwrap();
        manager.register(&node, placeholder);
        scene.add_node(node)
    }

    #[test]
    fn test_default_text_has_no_content() {
        let mut scene = Scene::default();
        let mut manager = PlaceholderManager::new();
        let id = text_slot(&mut scene, &mut manager);
        assert!(!manager.has_valid_content(&scene, id));
        assert_eq!(manager.lookup_by_template_object("headline"), Some(id));
        assert_eq!(manager.state(id).unwrap().phase(), PlaceholderPhase::Inactive);
    }

    #[test]
    fn test_lifecycle_events() {
        let mut scene = Scene::default();
        let mut manager = PlaceholderManager::new();
        let events = manager.subscribe();
        let id = text_slot(&mut scene, &mut manager);

        manager.activate(id).unwrap();
        manager.interact(&mut scene, id).unwrap();
        assert_eq!(manager.state(id).unwrap().phase(), PlaceholderPhase::Editing);
        assert_eq!(scene.node(id).unwrap().as_text().unwrap().content(), "");

        manager.deactivate(&mut scene, id).unwrap();
        assert_eq!(manager.state(id).unwrap().phase(), PlaceholderPhase::Deactivated);
        // Empty edit reverts to the hint.
        let text = scene.node(id).unwrap().as_text().unwrap();
        assert!(text.is_hint());

        let received: Vec<PlaceholderEvent> = events.try_iter().collect();
        assert!(received.contains(&PlaceholderEvent::EditingStarted { node: id }));
        assert!(received.contains(&PlaceholderEvent::EditingEnded { node: id }));
        assert!(received.contains(&PlaceholderEvent::Deactivated { node: id }));
        assert!(received.iter().any(|e| matches!(e, PlaceholderEvent::TooltipShown { .. })));
    }

    #[test]
    fn test_media_interaction_requests_suggestions() {
        let mut scene = Scene::default();
        let mut manager = PlaceholderManager::new();
        let events = manager.subscribe();
        let id = image_slot(&mut scene, &mut manager);
        manager.interact(&mut scene, id).unwrap();
        let requested = events
            .try_iter()
            .find(|e| matches!(e, PlaceholderEvent::SuggestionsRequested { .. }));
        assert!(matches!(
            requested,
            Some(PlaceholderEvent::SuggestionsRequested { kind: PlaceholderKind::Logo, .. })
        ));
    }

    #[tokio::test]
    async fn test_replace_text() {
        let mut scene = Scene::default();
        let mut manager = PlaceholderManager::new();
        let id = text_slot(&mut scene, &mut manager);

        let err = manager
            .replace_content(&mut scene, id, ReplaceRequest::new("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, PlaceholderError::InvalidContent(_)));
        assert_eq!(scene.node(id).unwrap().as_text().unwrap().content(), "Your headline");

        let new_id = manager
            .replace_content(&mut scene, id, ReplaceRequest::new("Summer Sale"))
            .await
            .unwrap();
        assert_eq!(new_id, id);
        assert!(manager.has_valid_content(&scene, id));
        assert!(manager.state(id).unwrap().has_content());
        assert_eq!(manager.state(id).unwrap().phase(), PlaceholderPhase::Replaced);
    }

    #[test]
    fn test_phase_follows_content() {
        let mut scene = Scene::default();
        let mut manager = PlaceholderManager::new();
        let id = text_slot(&mut scene, &mut manager);

        // Typing during an edit lands the slot in `Replaced`.
        manager.interact(&mut scene, id).unwrap();
        scene.node_mut(id).unwrap().set_text("Spring Sale".to_string()).unwrap();
        manager.end_editing(&mut scene, id).unwrap();
        assert_eq!(manager.state(id).unwrap().phase(), PlaceholderPhase::Replaced);

        // Reselecting and leaving keeps it there.
        manager.activate(id).unwrap();
        assert_eq!(manager.state(id).unwrap().phase(), PlaceholderPhase::Activated);
        manager.deactivate(&mut scene, id).unwrap();
        assert_eq!(manager.state(id).unwrap().phase(), PlaceholderPhase::Replaced);

        // Restoring the default text returns it to rest without content.
        scene.node_mut(id).unwrap().set_text("Your headline".to_string()).unwrap();
        manager.notify_content_changed(&scene, id).unwrap();
        let state = manager.state(id).unwrap();
        assert!(!state.has_content());
        assert_eq!(state.phase(), PlaceholderPhase::Inactive);
    }

    #[tokio::test]
    async fn test_replace_media_keeps_transform_and_identity() {
        let mut scene = Scene::default();
        let mut manager = PlaceholderManager::new().with_loader(Arc::new(DataUriLoader));
        let id = image_slot(&mut scene, &mut manager);
        let before = scene.node(id).unwrap().transform();
        let size_before = (scene.node(id).unwrap().width(), scene.node(id).unwrap().height());

        let new_id = manager
            .replace_content(&mut scene, id, ReplaceRequest::new(png_data_uri()))
            .await
            .unwrap();

        assert_ne!(new_id, id);
        assert!(!scene.contains(id));
        let node = scene.node(new_id).unwrap();
        assert_eq!(node.transform(), before);
        assert_eq!((node.width(), node.height()), size_before);
        assert_eq!(scene.z_order(), &[new_id]);
        assert_eq!(manager.lookup_by_template_object("logo"), Some(new_id));
        assert_eq!(node.tags().template_object_id.as_deref(), Some("logo"));
        assert!(manager.has_valid_content(&scene, new_id));
    }

    #[tokio::test]
    async fn test_failed_media_load_leaves_node() {
        let mut scene = Scene::default();
        let mut manager = PlaceholderManager::new();
        let id = image_slot(&mut scene, &mut manager);

        let invalid = manager
            .replace_content(&mut scene, id, ReplaceRequest::new("not media"))
            .await;
        assert!(matches!(invalid, Err(PlaceholderError::InvalidContent(_))));

        let missing = manager
            .replace_content(&mut scene, id, ReplaceRequest::new("/definitely/missing.png"))
            .await;
        assert!(matches!(missing, Err(PlaceholderError::Asset(AssetError::Io(_)))));
        assert!(scene.contains(id));
        assert_eq!(manager.lookup_by_template_object("logo"), Some(id));
    }

    #[tokio::test]
    async fn test_locked_content_rejected() {
        let mut scene = Scene::default();
        let mut manager = PlaceholderManager::new();
        let id = text_slot(&mut scene, &mut manager);
        let mut locked = Editable::all();
        locked.content = false;
        scene.node_mut(id).unwrap().apply_editable(locked);

        let err = manager
            .replace_content(&mut scene, id, ReplaceRequest::new("New"))
            .await
            .unwrap_err();
        assert!(matches!(err, PlaceholderError::Node(NodeError::Locked { .. })));
    }

    struct FixedProvider;

    impl SuggestionProvider for FixedProvider {
        fn suggestions(&self, _placeholder: &Placeholder) -> BoxFuture<'_, Vec<String>> {
            Box::pin(async { vec!["https://stock.example/1.jpg".to_string()] })
        }
    }

    #[test]
    fn test_suggestion_providers() {
        let mut scene = Scene::default();
        let mut manager = PlaceholderManager::new();
        let id = image_slot(&mut scene, &mut manager);

        let defaults = pollster::block_on(manager.suggestions(id)).unwrap();
        assert_eq!(defaults, vec!["https://cdn.example.com/logo.png".to_string()]);

        manager.register_provider(PlaceholderKind::Logo, Arc::new(FixedProvider));
        let custom = pollster::block_on(manager.suggestions(id)).unwrap();
        assert_eq!(custom, vec!["https://stock.example/1.jpg".to_string()]);
    }

    #[test]
    fn test_prune_and_snapshot() {
        let mut scene = Scene::default();
        let mut manager = PlaceholderManager::new();
        let text = text_slot(&mut scene, &mut manager);
        let image = image_slot(&mut scene, &mut manager);
        let snapshot = manager.snapshot();

        scene.remove_node(text);
        assert_eq!(manager.prune(&scene), 1);
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.lookup_by_template_object("headline"), None);

        manager.restore(snapshot);
        assert_eq!(manager.len(), 2);
        assert!(manager.state(image).is_some());
    }
}

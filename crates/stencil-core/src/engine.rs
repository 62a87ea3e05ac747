//! Template engine: applies a stored template to a live scene.
//!
//! One apply walks `Idle -> Loading -> Validating -> Preparing ->
//! Rendering -> Setup -> Complete`; any aborting failure moves to `Error`
//! after the scene and placeholder registry are restored to their
//! pre-apply state.

use crate::assets::ImageLoader;
use crate::color::parse_color;
use crate::config::EngineConfig;
use crate::error::{ApplyError, ValidationError};
use crate::factory::ObjectFactory;
use crate::placeholder::PlaceholderManager;
use crate::scene::{NodeId, Scene};
use crate::schema::validate_template;
use crate::storage::TemplateStore;
use crate::template::{Placeholder, Template};
use std::fmt;
use std::sync::Arc;

/// Engine lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    #[default]
    Idle,
    Loading,
    Validating,
    Preparing,
    Rendering,
    Setup,
    Complete,
    Error,
}

impl EngineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineState::Idle => "idle",
            EngineState::Loading => "loading",
            EngineState::Validating => "validating",
            EngineState::Preparing => "preparing",
            EngineState::Rendering => "rendering",
            EngineState::Setup => "setup",
            EngineState::Complete => "complete",
            EngineState::Error => "error",
        }
    }

    /// Whether an apply is running.
    pub fn is_busy(&self) -> bool {
        !matches!(self, EngineState::Idle | EngineState::Complete | EngineState::Error)
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One progress report. `progress` never decreases within an apply.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyProgress {
    pub step: EngineState,
    /// 0 to 100.
    pub progress: u8,
    pub message: String,
    pub is_complete: bool,
    pub error: Option<String>,
}

/// Per-call apply settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyOptions {
    /// Keep the scene's current size instead of adopting the canvas size.
    pub preserve_canvas_size: bool,
    /// Clear existing nodes and placeholder registrations first.
    pub replace_content: bool,
    /// Overrides `EngineConfig::enable_recovery` for this call.
    pub enable_recovery: Option<bool>,
    /// Adopt the template's background colour and image.
    pub apply_background: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            preserve_canvas_size: false,
            replace_content: true,
            enable_recovery: None,
            apply_background: true,
        }
    }
}

impl ApplyOptions {
    pub fn with_preserve_canvas_size(mut self, preserve: bool) -> Self {
        self.preserve_canvas_size = preserve;
        self
    }

    pub fn with_replace_content(mut self, replace: bool) -> Self {
        self.replace_content = replace;
        self
    }

    pub fn with_recovery(mut self, enabled: bool) -> Self {
        self.enable_recovery = Some(enabled);
        self
    }
}

/// Outcome of a successful apply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyReport {
    pub template_id: String,
    /// Nodes added to the scene.
    pub created: usize,
    /// Template object ids skipped under recovery.
    pub skipped: Vec<String>,
    pub warnings: Vec<String>,
    /// Placeholder registrations made.
    pub placeholders: usize,
}

/// Keeps reported progress monotonic.
struct ProgressTracker<'a> {
    last: u8,
    sink: &'a mut dyn FnMut(&ApplyProgress),
}

impl ProgressTracker<'_> {
    fn report(&mut self, step: EngineState, progress: u8, message: impl Into<String>) {
        self.last = self.last.max(progress.min(100));
        (self.sink)(&ApplyProgress {
            step,
            progress: self.last,
            message: message.into(),
            is_complete: step == EngineState::Complete,
            error: None,
        });
    }

    fn fail(&mut self, error: &ApplyError) {
        (self.sink)(&ApplyProgress {
            step: EngineState::Error,
            progress: self.last,
            message: "Template application failed".to_string(),
            is_complete: false,
            error: Some(error.to_string()),
        });
    }
}

/// Orchestrates template loading, validation and node creation.
pub struct TemplateEngine {
    config: EngineConfig,
    store: Arc<dyn TemplateStore>,
    factory: ObjectFactory,
    state: EngineState,
    last_report: Option<ApplyReport>,
    current_template: Option<Template>,
}

impl TemplateEngine {
    pub fn new(config: EngineConfig, store: Arc<dyn TemplateStore>) -> Self {
        let factory = ObjectFactory::new(config.factory.clone());
        Self {
            config,
            store,
            factory,
            state: EngineState::Idle,
            last_report: None,
            current_template: None,
        }
    }

    /// Use `loader` for image sources.
    pub fn with_loader(mut self, loader: Arc<dyn ImageLoader>) -> Self {
        self.factory = self.factory.with_loader(loader);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn TemplateStore> {
        &self.store
    }

    pub fn factory(&self) -> &ObjectFactory {
        &self.factory
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Report of the most recent successful apply.
    pub fn last_report(&self) -> Option<&ApplyReport> {
        self.last_report.as_ref()
    }

    /// Template of the most recent successful apply.
    pub fn current_template(&self) -> Option<&Template> {
        self.current_template.as_ref()
    }

    fn transition(&mut self, next: EngineState) {
        log::debug!("Template engine: {} -> {}", self.state, next);
        self.state = next;
    }

    /// Apply template `template_id` to `scene`.
    ///
    /// On failure the scene and `placeholders` are back in their pre-call
    /// state when this returns.
    pub async fn apply_template(
        &mut self,
        scene: &mut Scene,
        placeholders: &mut PlaceholderManager,
        template_id: &str,
        options: ApplyOptions,
        mut on_progress: impl FnMut(&ApplyProgress),
    ) -> Result<ApplyReport, ApplyError> {
        let scene_snapshot = scene.snapshot();
        let placeholder_snapshot = placeholders.snapshot();
        let mut tracker = ProgressTracker {
            last: 0,
            sink: &mut on_progress,
        };

        match self
            .run(scene, placeholders, template_id, &options, &mut tracker)
            .await
        {
            Ok((template, report)) => {
                self.transition(EngineState::Complete);
                tracker.report(EngineState::Complete, 100, "Template applied");
                log::info!(
                    "Applied template {}: {} created, {} skipped, {} placeholders",
                    report.template_id,
                    report.created,
                    report.skipped.len(),
                    report.placeholders
                );
                self.current_template = Some(template);
                self.last_report = Some(report.clone());
                Ok(report)
            }
            Err(e) => {
                log::error!("Failed to apply template {}: {}", template_id, e);
                scene.restore(scene_snapshot);
                placeholders.restore(placeholder_snapshot);
                self.transition(EngineState::Error);
                tracker.fail(&e);
                Err(e)
            }
        }
    }

    async fn run(
        &mut self,
        scene: &mut Scene,
        placeholders: &mut PlaceholderManager,
        template_id: &str,
        options: &ApplyOptions,
        tracker: &mut ProgressTracker<'_>,
    ) -> Result<(Template, ApplyReport), ApplyError> {
        self.transition(EngineState::Loading);
        tracker.report(EngineState::Loading, 5, format!("Loading template {template_id}"));
        let template = self.store.load(template_id).await?;

        let mut report = ApplyReport {
            template_id: template.id.clone(),
            ..ApplyReport::default()
        };

        self.transition(EngineState::Validating);
        tracker.report(EngineState::Validating, 15, "Validating template");
        if self.config.validate_before_apply {
            let validation = validate_template(&template);
            for warning in &validation.warnings {
                log::debug!("Template {}: {}", template.id, warning);
            }
            if !validation.is_valid() {
                return Err(ValidationError::new(validation.errors).into());
            }
        }

        self.transition(EngineState::Preparing);
        tracker.report(EngineState::Preparing, 25, "Preparing canvas");
        self.prepare_scene(scene, placeholders, &template, options, &mut report);

        self.transition(EngineState::Rendering);
        tracker.report(EngineState::Rendering, 30, "Creating objects");
        let recovery = options.enable_recovery.unwrap_or(self.config.enable_recovery);
        let total = template.objects.len();
        let mut pending: Vec<(NodeId, Placeholder)> = Vec::new();

        for (index, object) in template.objects.iter().enumerate() {
            match self.factory.create(&object.node_data, object).await {
                Ok(created) => {
                    report.warnings.extend(created.warnings);
                    let node_id = scene.add_node(created.node);
                    if let Some(placeholder) = &object.placeholder {
                        pending.push((node_id, placeholder.clone()));
                    }
                    report.created += 1;
                }
                Err(e) if recovery => {
                    log::warn!("Skipping object {}: {}", object.id, e);
                    report.warnings.push(e.to_string());
                    report.skipped.push(object.id.clone());
                }
                Err(e) => return Err(e.into()),
            }
            let progress = 30 + (60 * (index + 1) / total.max(1)) as u8;
            tracker.report(
                EngineState::Rendering,
                progress,
                format!("Created object {} of {}", index + 1, total),
            );
        }

        self.transition(EngineState::Setup);
        tracker.report(EngineState::Setup, 90, "Registering placeholders");
        if self.config.enable_placeholders {
            let total = pending.len();
            for (index, (node_id, placeholder)) in pending.into_iter().enumerate() {
                if let Some(node) = scene.node(node_id) {
                    placeholders.register(node, placeholder);
                    report.placeholders += 1;
                }
                let progress = 90 + (5 * (index + 1) / total.max(1)) as u8;
                tracker.report(EngineState::Setup, progress, "Registering placeholders");
            }
        }
        tracker.report(EngineState::Setup, 95, "Finishing");

        Ok((template, report))
    }

    fn prepare_scene(
        &self,
        scene: &mut Scene,
        placeholders: &mut PlaceholderManager,
        template: &Template,
        options: &ApplyOptions,
        report: &mut ApplyReport,
    ) {
        if options.replace_content {
            scene.clear();
            placeholders.clear();
        }
        if !options.preserve_canvas_size {
            scene.resize(template.canvas.width, template.canvas.height);
        }
        if options.apply_background {
            match parse_color(&template.canvas.background_color) {
                Some(color) => scene.background = color,
                None => {
                    let warning = format!(
                        "Invalid background colour '{}', keeping the current one",
                        template.canvas.background_color
                    );
                    log::warn!("{warning}");
                    report.warnings.push(warning);
                }
            }
            scene.background_image = template.canvas.background_image.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LoadError, ObjectCreationError};
    use crate::scene::{NodeKind, SceneNode, TextNode, Transform};
    use crate::storage::{FileTemplateStore, MemoryTemplateStore};
    use crate::template::{NodeData, ObjectType, PlaceholderKind, TemplateObject};

    fn text_template() -> Template {
        let mut template = Template::new("cards", "Cards", 640, 480);
        template.canvas.background_color = "#102030".to_string();
        for (i, label) in ["One", "Two", "Three"].iter().enumerate() {
            let mut object = TemplateObject::new(
                format!("text-{i}"),
                ObjectType::Text,
                NodeData::text(10.0, 40.0 * i as f64, *label),
            );
            if i == 0 {
                object = object.with_placeholder(Placeholder::new(PlaceholderKind::Text, *label));
            }
            template.objects.push(object);
        }
        template
    }

    fn image_template() -> Template {
        Template::new("photo", "Photo", 320, 240)
            .with_object(TemplateObject::new(
                "caption",
                ObjectType::Text,
                NodeData::text(0.0, 0.0, "Caption"),
            ))
            .with_object(TemplateObject::new(
                "hero",
                ObjectType::Image,
                NodeData::image(0.0, 20.0, 100.0, 80.0, Some("https://unreachable.invalid/hero.png".into())),
            ))
    }

    fn engine(config: EngineConfig, templates: Vec<Template>) -> TemplateEngine {
        TemplateEngine::new(config, Arc::new(MemoryTemplateStore::with_templates(templates)))
    }

    fn existing_scene() -> Scene {
        let mut scene = Scene::new(100, 100);
        scene.add_node(SceneNode::new(
            NodeKind::Text(TextNode::new("keep me", 12.0)),
            Transform::at(1.0, 1.0),
            50.0,
            14.0,
        ));
        scene
    }

    #[tokio::test]
    async fn test_apply_reports_monotonic_progress() {
        let mut engine = engine(EngineConfig::default(), vec![text_template()]);
        let mut scene = Scene::default();
        let mut placeholders = PlaceholderManager::new();
        let mut events = Vec::new();

        let report = engine
            .apply_template(&mut scene, &mut placeholders, "cards", ApplyOptions::default(), |p| {
                events.push(p.clone())
            })
            .await
            .unwrap();

        assert_eq!(report.created, 3);
        assert_eq!(report.placeholders, 1);
        assert_eq!(scene.len(), 3);
        assert_eq!((scene.width, scene.height), (640, 480));
        assert_eq!(scene.background.to_hex(), "#102030");
        assert_eq!(engine.state(), EngineState::Complete);
        assert!(placeholders.lookup_by_template_object("text-0").is_some());

        assert!(events.windows(2).all(|w| w[0].progress <= w[1].progress));
        let last = events.last().unwrap();
        assert_eq!(last.progress, 100);
        assert!(last.is_complete);
        assert_eq!(events.iter().filter(|p| p.is_complete).count(), 1);

        // Declaration order is stacking order.
        let ids: Vec<_> = scene
            .nodes_ordered()
            .map(|n| n.tags().template_object_id.clone().unwrap())
            .collect();
        assert_eq!(ids, vec!["text-0", "text-1", "text-2"]);
    }

    #[tokio::test]
    async fn test_failed_image_rolls_back() {
        let config = EngineConfig::default()
            .with_placeholders(false)
            .with_recovery(false);
        let mut engine = engine(config, vec![image_template()]);
        let mut scene = existing_scene();
        let before: Vec<_> = scene.z_order().to_vec();
        let mut placeholders = PlaceholderManager::new();
        let mut last = None;

        let err = engine
            .apply_template(&mut scene, &mut placeholders, "photo", ApplyOptions::default(), |p| {
                last = Some(p.clone())
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ApplyError::ObjectCreation(ObjectCreationError::ImageLoad { ref object_id, .. }) if object_id == "hero"
        ));
        assert_eq!(scene.z_order(), before.as_slice());
        assert_eq!((scene.width, scene.height), (100, 100));
        assert_eq!(engine.state(), EngineState::Error);
        assert!(engine.last_report().is_none());
        let last = last.unwrap();
        assert_eq!(last.step, EngineState::Error);
        assert!(last.error.is_some());
        assert!(!last.is_complete);
    }

    #[tokio::test]
    async fn test_recovery_skips_failed_object() {
        let config = EngineConfig::default().with_placeholders(false);
        let mut engine = engine(config, vec![image_template()]);
        let mut scene = existing_scene();
        let mut placeholders = PlaceholderManager::new();

        let report = engine
            .apply_template(&mut scene, &mut placeholders, "photo", ApplyOptions::default(), |_| {})
            .await
            .unwrap();

        assert_eq!(report.created, 1);
        assert_eq!(report.skipped, vec!["hero".to_string()]);
        assert_eq!(scene.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_template() {
        let mut engine = engine(EngineConfig::default(), vec![]);
        let mut scene = existing_scene();
        let mut placeholders = PlaceholderManager::new();
        let err = engine
            .apply_template(&mut scene, &mut placeholders, "nope", ApplyOptions::default(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, ApplyError::Load(LoadError::NotFound(_))));
        assert_eq!(scene.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_template_lists_every_issue() {
        let mut template = text_template();
        template.canvas.width = 0;
        template.canvas.background_color = "nope".to_string();
        let mut engine = engine(EngineConfig::default(), vec![template]);
        let mut scene = existing_scene();
        let mut placeholders = PlaceholderManager::new();

        let err = engine
            .apply_template(&mut scene, &mut placeholders, "cards", ApplyOptions::default(), |_| {})
            .await
            .unwrap_err();
        match err {
            ApplyError::Validation(e) => assert_eq!(e.issues.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(scene.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_stored_file_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("broken.json"),
            r##"{
                "id": "broken",
                "name": "Broken",
                "category": "unknown",
                "canvas": {"width": 400, "height": 12.5, "backgroundColor": "not-a-colour"},
                "objects": [],
                "metadata": {"version": "2.0.0"}
            }"##,
        )
        .unwrap();
        let store = FileTemplateStore::new(dir.path().to_path_buf()).unwrap();
        let mut engine = TemplateEngine::new(EngineConfig::default(), Arc::new(store));
        let mut scene = existing_scene();
        let mut placeholders = PlaceholderManager::new();

        let err = engine
            .apply_template(&mut scene, &mut placeholders, "broken", ApplyOptions::default(), |_| {})
            .await
            .unwrap_err();
        match err {
            ApplyError::Validation(e) => assert_eq!(e.issues.len(), 3),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(scene.len(), 1);
        assert_eq!(engine.state(), EngineState::Error);
    }

    #[tokio::test]
    async fn test_keep_content_and_canvas() {
        let mut engine = engine(EngineConfig::default(), vec![text_template()]);
        let mut scene = existing_scene();
        let mut placeholders = PlaceholderManager::new();
        let options = ApplyOptions::default()
            .with_replace_content(false)
            .with_preserve_canvas_size(true);

        engine
            .apply_template(&mut scene, &mut placeholders, "cards", options, |_| {})
            .await
            .unwrap();
        assert_eq!(scene.len(), 4);
        assert_eq!((scene.width, scene.height), (100, 100));
        assert_eq!(engine.current_template().map(|t| t.id.as_str()), Some("cards"));
    }
}

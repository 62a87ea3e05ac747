//! Editing session: one live scene with its engine, placeholders and
//! renderer.

use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::options::RenderMode;
use crate::renderer::TemplateRenderer;
use crate::result::RenderResult;
use std::sync::Arc;
use stencil_core::error::LoadResult;
use stencil_core::{
    ApplyError, ApplyOptions, ApplyProgress, ApplyReport, EngineConfig, ImageLoader, LoadError, NodeId,
    ObjectFactory, PlaceholderError, PlaceholderManager, ReplaceRequest, Scene, Template, TemplateEngine,
    TemplateHeader, TemplateStore, serialize_scene,
};

/// Owns everything one editing session mutates. Renders of the live scene
/// are cached under the applied template's id until the scene is edited.
pub struct Session {
    engine: TemplateEngine,
    scene: Scene,
    placeholders: PlaceholderManager,
    renderer: TemplateRenderer,
    store: Arc<dyn TemplateStore>,
    dirty: bool,
}

impl Session {
    pub fn new(engine_config: EngineConfig, render_config: RenderConfig, store: Arc<dyn TemplateStore>) -> Self {
        let factory = ObjectFactory::new(engine_config.factory.clone());
        let placeholders = PlaceholderManager::new().with_image_timeout(engine_config.factory.image_timeout());
        Self {
            engine: TemplateEngine::new(engine_config, Arc::clone(&store)),
            scene: Scene::default(),
            placeholders,
            renderer: TemplateRenderer::with_factory(render_config, factory),
            store,
            dirty: false,
        }
    }

    /// Load images for the engine, placeholder replacements and the
    /// renderer through `loader`.
    pub fn with_loader(mut self, loader: Arc<dyn ImageLoader>) -> Self {
        let factory = ObjectFactory::new(self.engine.config().factory.clone()).with_loader(Arc::clone(&loader));
        self.renderer = TemplateRenderer::with_factory(self.renderer.config().clone(), factory);
        self.placeholders = self.placeholders.with_loader(Arc::clone(&loader));
        self.engine = self.engine.with_loader(loader);
        self
    }

    pub fn engine(&self) -> &TemplateEngine {
        &self.engine
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Mutable scene access marks cached renders stale.
    pub fn scene_mut(&mut self) -> &mut Scene {
        self.dirty = true;
        &mut self.scene
    }

    pub fn placeholders(&self) -> &PlaceholderManager {
        &self.placeholders
    }

    pub fn placeholders_mut(&mut self) -> &mut PlaceholderManager {
        &mut self.placeholders
    }

    pub fn renderer(&self) -> &TemplateRenderer {
        &self.renderer
    }

    /// Apply a stored template to the session scene.
    pub async fn apply_template(
        &mut self,
        template_id: &str,
        options: ApplyOptions,
        on_progress: impl FnMut(&ApplyProgress),
    ) -> Result<ApplyReport, ApplyError> {
        let report = self
            .engine
            .apply_template(&mut self.scene, &mut self.placeholders, template_id, options, on_progress)
            .await?;
        self.renderer.invalidate_template(&report.template_id);
        self.dirty = false;
        Ok(report)
    }

    /// Fill a placeholder slot.
    pub async fn replace_placeholder(
        &mut self,
        node: NodeId,
        request: ReplaceRequest,
    ) -> Result<NodeId, PlaceholderError> {
        let replaced = self
            .placeholders
            .replace_content(&mut self.scene, node, request)
            .await?;
        self.dirty = true;
        Ok(replaced)
    }

    /// The live scene as a template, under the applied template's header.
    pub fn current_template_snapshot(&self) -> Option<Template> {
        let header = TemplateHeader::from_template(self.engine.current_template()?);
        Some(serialize_scene(&self.scene, &self.placeholders, &header))
    }

    /// Write the live scene back to the store.
    pub async fn save_current_template(&self) -> LoadResult<()> {
        let template = self
            .current_template_snapshot()
            .ok_or_else(|| LoadError::Other("no template has been applied".to_string()))?;
        self.store.save(&template).await?;
        log::info!("Saved template {}", template.id);
        Ok(())
    }

    /// Render the live scene with the configured defaults for `mode`.
    pub async fn render_current_template(&mut self, mode: RenderMode) -> Result<Arc<RenderResult>, RenderError> {
        let template = self
            .current_template_snapshot()
            .ok_or_else(|| RenderError::Scene("no template has been applied".to_string()))?;
        if self.dirty {
            self.renderer.invalidate_template(&template.id);
            self.dirty = false;
        }
        let options = self.renderer.options(mode);
        self.renderer.render_template(&template, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stencil_core::{
        MemoryTemplateStore, NodeData, ObjectType, Placeholder, PlaceholderKind, TemplateObject,
    };

    fn store() -> Arc<MemoryTemplateStore> {
        let template = Template::new("promo", "Promo", 300, 200)
            .with_object(TemplateObject::new(
                "band",
                ObjectType::Shape,
                NodeData::shape("rect", 0.0, 0.0, 300.0, 60.0),
            ))
            .with_object(
                TemplateObject::new("headline", ObjectType::Text, NodeData::text(20.0, 100.0, "Big sale"))
                    .with_placeholder(Placeholder::new(PlaceholderKind::Text, "Your headline")),
            );
        Arc::new(MemoryTemplateStore::with_templates([template]))
    }

    fn session(store: Arc<MemoryTemplateStore>) -> Session {
        Session::new(EngineConfig::default(), RenderConfig::default(), store)
    }

    #[tokio::test]
    async fn test_render_before_apply_fails() {
        let mut session = session(store());
        let err = session
            .render_current_template(RenderMode::FastPreview)
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::Scene(_)));
    }

    #[tokio::test]
    async fn test_apply_then_render() {
        let mut session = session(store());
        let mut steps = Vec::new();
        let report = session
            .apply_template("promo", ApplyOptions::default(), |p| steps.push(p.progress))
            .await
            .unwrap();
        assert_eq!(report.created, 2);
        assert_eq!(steps.last(), Some(&100));
        assert_eq!(session.placeholders().len(), 1);

        let first = session
            .render_current_template(RenderMode::HighQuality)
            .await
            .unwrap();
        assert_eq!(first.template_id, "promo");
        assert_eq!(first.object_count, 2);
        let second = session
            .render_current_template(RenderMode::HighQuality)
            .await
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_editing_invalidates_renders() {
        let mut session = session(store());
        session
            .apply_template("promo", ApplyOptions::default(), |_| {})
            .await
            .unwrap();
        let before = session
            .render_current_template(RenderMode::HighQuality)
            .await
            .unwrap();

        session.scene_mut().resize(150, 100);
        let after = session
            .render_current_template(RenderMode::HighQuality)
            .await
            .unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!((after.width, after.height), (150, 100));
    }

    #[tokio::test]
    async fn test_save_writes_live_scene() {
        let store = store();
        let mut session = session(Arc::clone(&store));
        session
            .apply_template("promo", ApplyOptions::default(), |_| {})
            .await
            .unwrap();
        session.scene_mut().resize(640, 480);
        session.save_current_template().await.unwrap();

        let saved = store.load("promo").await.unwrap();
        assert_eq!((saved.canvas.width, saved.canvas.height), (640, 480));
        assert_eq!(saved.objects.len(), 2);
        assert!(saved.objects[1].placeholder.is_some());
    }
}

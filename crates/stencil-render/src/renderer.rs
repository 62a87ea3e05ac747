//! Multi-mode template renderer with result caching and in-flight
//! deduplication.
//!
//! Rendering is cooperative and single-threaded: the renderer is `!Send`
//! and shares one cache between all clones of a [`TemplateRenderer`].
//! Cache and in-flight bookkeeping is never borrowed across an await.
//! Pending renders hold only a weak handle to the renderer, so an
//! abandoned render never keeps it alive.

use crate::cache::{RenderCache, RenderCacheStats, generate_render_key};
use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::options::{RenderMode, RenderOptions};
use crate::raster::{encode, rasterize};
use crate::result::RenderResult;
use crate::select::select_objects;
use futures_util::FutureExt;
use futures_util::future::{LocalBoxFuture, Shared};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::time::{Duration, Instant};
use stencil_core::{ObjectFactory, Scene, SerializableColor, Template, parse_color};

type RenderOutcome = Result<Arc<RenderResult>, RenderError>;
type InFlightRender = Shared<LocalBoxFuture<'static, RenderOutcome>>;

struct RendererInner {
    config: RenderConfig,
    factory: ObjectFactory,
    cache: RefCell<RenderCache>,
    in_flight: RefCell<HashMap<String, InFlightRender>>,
}

/// Renders templates to encoded images. Cheap to clone; clones share the
/// cache and the in-flight table.
#[derive(Clone)]
pub struct TemplateRenderer {
    inner: Rc<RendererInner>,
}

impl std::fmt::Debug for TemplateRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRenderer")
            .field("config", &self.inner.config)
            .field("in_flight", &self.in_flight_count())
            .finish_non_exhaustive()
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl TemplateRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self::with_factory(config, ObjectFactory::default())
    }

    /// Renderer building its offscreen scenes with `factory`.
    pub fn with_factory(config: RenderConfig, factory: ObjectFactory) -> Self {
        let cache = RenderCache::new(&config);
        Self {
            inner: Rc::new(RendererInner {
                config,
                factory,
                cache: RefCell::new(cache),
                in_flight: RefCell::new(HashMap::new()),
            }),
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.inner.config
    }

    /// Configured defaults for `mode`.
    pub fn options(&self, mode: RenderMode) -> RenderOptions {
        RenderOptions::from_config(mode, &self.inner.config)
    }

    /// Render `template` with `options`.
    ///
    /// A cached result is returned as is. While a render with the same key
    /// is running, callers share it and receive the same `Arc`. Only
    /// successful renders are cached.
    pub async fn render_template(&self, template: &Template, options: RenderOptions) -> RenderOutcome {
        let key = generate_render_key(&template.id, &options);

        if let Some(hit) = self.inner.cache.borrow_mut().results.get(&key) {
            log::debug!("Render cache hit: {key}");
            return Ok(hit);
        }

        let pending = self.inner.in_flight.borrow().get(&key).cloned();
        let render = match pending {
            Some(render) => {
                log::debug!("Joining in-flight render: {key}");
                render
            }
            None => {
                let inner = Rc::downgrade(&self.inner);
                let factory = self.inner.factory.clone();
                let template = template.clone();
                let render_key = key.clone();
                let render = async move {
                    let outcome = render_with_timeout(&factory, &template, &options).await;
                    if let Some(inner) = inner.upgrade() {
                        inner.finish(&render_key, &outcome);
                    }
                    outcome
                }
                .boxed_local()
                .shared();
                self.inner.in_flight.borrow_mut().insert(key, render.clone());
                render
            }
        };
        render.await
    }

    pub async fn render_fast_preview(&self, template: &Template) -> RenderOutcome {
        self.render_template(template, self.options(RenderMode::FastPreview))
            .await
    }

    pub async fn render_high_quality(&self, template: &Template) -> RenderOutcome {
        self.render_template(template, self.options(RenderMode::HighQuality))
            .await
    }

    /// Thumbnail fitted inside a `size` x `size` box.
    pub async fn render_thumbnail(&self, template: &Template, size: u32) -> RenderOutcome {
        let options = self.options(RenderMode::Thumbnail).with_size(size, size);
        self.render_template(template, options).await
    }

    /// Drop every cached artifact of `template_id`.
    pub fn invalidate_template(&self, template_id: &str) -> usize {
        self.inner.cache.borrow_mut().invalidate_template(template_id)
    }

    pub fn cache_stats(&self) -> RenderCacheStats {
        self.inner.cache.borrow().stats()
    }

    pub fn clear_cache(&self) {
        self.inner.cache.borrow_mut().clear();
    }

    /// Data URL of the latest fast preview of `template_id`.
    pub fn cached_preview(&self, template_id: &str) -> Option<String> {
        self.inner.cache.borrow_mut().previews.get(template_id)
    }

    /// Data URL of the latest thumbnail of `template_id`.
    pub fn cached_thumbnail(&self, template_id: &str) -> Option<String> {
        self.inner.cache.borrow_mut().thumbnails.get(template_id)
    }

    pub fn in_flight_count(&self) -> usize {
        self.inner.in_flight.borrow().len()
    }

    /// Expiry sweeps on the shortest cleanup interval of the caches, so
    /// idle caches release expired entries too. The future completes once
    /// every clone of the renderer has been dropped.
    pub fn sweeper(&self) -> impl Future<Output = ()> + 'static {
        let renderer: Weak<RendererInner> = Rc::downgrade(&self.inner);
        let period = self
            .inner
            .cache
            .borrow()
            .cleanup_interval()
            .max(Duration::from_millis(1));
        async move {
            let mut ticks = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                let Some(inner) = renderer.upgrade() else {
                    break;
                };
                inner.cache.borrow_mut().sweep_expired();
            }
            log::debug!("Render cache sweeper stopped");
        }
    }

    /// Run [`sweeper`](Self::sweeper) on the current `LocalSet`.
    pub fn spawn_sweeper(&self) -> tokio::task::JoinHandle<()> {
        tokio::task::spawn_local(self.sweeper())
    }
}

async fn render_with_timeout(factory: &ObjectFactory, template: &Template, options: &RenderOptions) -> RenderOutcome {
    match tokio::time::timeout(options.timeout, render_uncached(factory, template, options)).await {
        Ok(result) => result.map(Arc::new),
        Err(_) => Err(RenderError::Timeout {
            template_id: template.id.clone(),
            timeout_ms: options.timeout.as_millis() as u64,
        }),
    }
}

/// Build an offscreen scene from the selected objects, rasterize and
/// encode it. The scene is dropped on every exit path, timeouts included.
async fn render_uncached(
    factory: &ObjectFactory,
    template: &Template,
    options: &RenderOptions,
) -> Result<RenderResult, RenderError> {
    let started = Instant::now();
    let canvas = &template.canvas;
    let (width, height) = options.output_size(canvas.width, canvas.height);
    if width == 0 || height == 0 {
        return Err(RenderError::EmptyCanvas { width, height });
    }

    let mut scene = Scene::new(canvas.width, canvas.height);
    scene.background = parse_color(&canvas.background_color).unwrap_or(SerializableColor::white());
    scene.background_image = canvas.background_image.clone();

    for object in select_objects(template, options.mode, options.max_objects) {
        match factory.create(&object.node_data, object).await {
            Ok(created) => {
                scene.add_node(created.node);
            }
            Err(e) => log::warn!("Render of {}: skipping {}: {}", template.id, object.id, e),
        }
    }

    tokio::task::yield_now().await;
    let pixels = rasterize(&scene, width, height, options.mode.supersample())?;
    tokio::task::yield_now().await;
    let encoded_image = encode(&pixels, options.format, options.quality)?;

    let result = RenderResult {
        template_id: template.id.clone(),
        encoded_image,
        width,
        height,
        render_time_ms: started.elapsed().as_millis() as u64,
        object_count: scene.len(),
        mode: options.mode,
        quality: options.quality,
    };
    log::info!(
        "Rendered {} ({}) {}x{}: {} objects in {} ms",
        result.template_id,
        result.mode,
        width,
        height,
        result.object_count,
        result.render_time_ms
    );
    Ok(result)
}

impl RendererInner {
    fn finish(&self, key: &str, outcome: &RenderOutcome) {
        self.in_flight.borrow_mut().remove(key);
        match outcome {
            Ok(result) => {
                let mut cache = self.cache.borrow_mut();
                match result.mode {
                    RenderMode::FastPreview => {
                        cache.previews.set(result.template_id.clone(), result.to_data_url());
                    }
                    RenderMode::Thumbnail => {
                        cache.thumbnails.set(result.template_id.clone(), result.to_data_url());
                    }
                    RenderMode::HighQuality => {}
                }
                cache.results.set(key, Arc::clone(result));
            }
            Err(e) => log::error!("Render {key} failed: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OutputFormat;
    use futures_util::future::join;
    use crate::config::CacheConfig;
    use serde_json::json;
    use stencil_core::{AssetError, BoxFuture, FactoryConfig, ImageLoader, NodeData, ObjectType, TemplateObject};

    fn card(id: &str) -> Template {
        Template::new(id, "Card", 400, 200)
            .with_object(TemplateObject::new(
                "bg",
                ObjectType::Shape,
                NodeData::shape("rect", 0.0, 0.0, 400.0, 100.0),
            ))
            .with_object(TemplateObject::new(
                "title",
                ObjectType::Text,
                NodeData::text(20.0, 120.0, "Hello"),
            ))
    }

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    struct StalledLoader;

    impl ImageLoader for StalledLoader {
        fn load(&self, _uri: &str) -> BoxFuture<'_, Result<Vec<u8>, AssetError>> {
            Box::pin(std::future::pending::<Result<Vec<u8>, AssetError>>())
        }
    }

    #[tokio::test]
    async fn test_concurrent_identical_renders_share_one_result() {
        init_logging();
        let renderer = TemplateRenderer::default();
        let template = card("t1");
        let options = renderer.options(RenderMode::HighQuality);

        let (a, b) = join(
            renderer.render_template(&template, options.clone()),
            renderer.render_template(&template, options.clone()),
        )
        .await;
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(renderer.in_flight_count(), 0);
        assert_eq!(renderer.cache_stats().results.entries, 1);

        // A later call is a cache hit on the same result.
        let c = renderer.render_template(&template, options).await.unwrap();
        assert!(Arc::ptr_eq(&a, &c));
        assert_eq!(renderer.cache_stats().results.hits, 1);
    }

    #[tokio::test]
    async fn test_high_quality_result() {
        let renderer = TemplateRenderer::default();
        let result = renderer.render_high_quality(&card("t1")).await.unwrap();
        assert_eq!((result.width, result.height), (400, 200));
        assert_eq!(result.object_count, 2);
        assert_eq!(result.encoded_image.format, OutputFormat::Png);
        assert_eq!(result.quality, 1.0);
        assert!(result.to_data_url().starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn test_fast_preview_caps_and_filters() {
        let renderer = TemplateRenderer::default();
        let mut template = Template::new("busy", "Busy", 800, 800);
        for i in 0..80 {
            let mut data = NodeData::shape("rect", (i % 10) as f64 * 80.0, (i / 10) as f64 * 80.0, 60.0, 60.0);
            if i % 8 == 0 {
                data.filters.push(json!({"type": "blur", "blur": 0.4}));
            }
            template
                .objects
                .push(TemplateObject::new(format!("o{i}"), ObjectType::Shape, data));
        }

        let result = renderer.render_fast_preview(&template).await.unwrap();
        assert_eq!(result.object_count, 50);
        assert_eq!(result.encoded_image.format, OutputFormat::Jpeg);
        assert!(renderer.cached_preview("busy").is_some());
    }

    #[tokio::test]
    async fn test_thumbnail_fits_box() {
        let renderer = TemplateRenderer::default();
        let result = renderer.render_thumbnail(&card("t1"), 100).await.unwrap();
        assert_eq!((result.width, result.height), (100, 50));
        assert!(renderer.cached_thumbnail("t1").is_some());
    }

    fn stalled_renderer() -> TemplateRenderer {
        let factory = ObjectFactory::new(FactoryConfig::default()).with_loader(Arc::new(StalledLoader));
        TemplateRenderer::with_factory(RenderConfig::default(), factory)
    }

    fn slow_template() -> Template {
        Template::new("slow", "Slow", 100, 100).with_object(TemplateObject::new(
            "photo",
            ObjectType::Image,
            NodeData::image(0.0, 0.0, 50.0, 50.0, Some("https://example.com/a.png".to_string())),
        ))
    }

    #[tokio::test]
    async fn test_timeout_is_not_cached() {
        init_logging();
        let renderer = stalled_renderer();
        let template = slow_template();
        let options = renderer
            .options(RenderMode::HighQuality)
            .with_timeout(Duration::from_millis(20));

        let err = renderer.render_template(&template, options).await.unwrap_err();
        assert_eq!(
            err,
            RenderError::Timeout {
                template_id: "slow".to_string(),
                timeout_ms: 20
            }
        );
        assert_eq!(renderer.in_flight_count(), 0);
        assert_eq!(renderer.cache_stats().results.entries, 0);
    }

    #[tokio::test]
    async fn test_empty_canvas_is_an_error() {
        let renderer = TemplateRenderer::default();
        let template = Template::new("empty", "Empty", 0, 100);
        let err = renderer.render_high_quality(&template).await.unwrap_err();
        assert!(matches!(err, RenderError::EmptyCanvas { .. }));
        assert_eq!(renderer.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn test_invalidate_template_keeps_other_templates() {
        let renderer = TemplateRenderer::default();
        let (t1, t2) = (card("t1"), card("t2"));
        renderer.render_fast_preview(&t1).await.unwrap();
        renderer.render_thumbnail(&t1, 120).await.unwrap();
        renderer.render_high_quality(&t1).await.unwrap();
        renderer.render_high_quality(&t2).await.unwrap();

        // Preview, thumbnail and three results for t1.
        assert_eq!(renderer.invalidate_template("t1"), 5);
        assert!(renderer.cached_preview("t1").is_none());
        assert!(renderer.cached_thumbnail("t1").is_none());
        assert_eq!(renderer.cache_stats().results.entries, 1);

        let again = renderer.render_high_quality(&t2).await.unwrap();
        assert_eq!(again.template_id, "t2");
        assert_eq!(renderer.cache_stats().results.hits, 1);
    }

    #[tokio::test]
    async fn test_abandoned_render_does_not_pin_renderer() {
        let renderer = stalled_renderer();
        let template = slow_template();
        let options = renderer
            .options(RenderMode::HighQuality)
            .with_timeout(Duration::from_millis(100));

        let gave_up = tokio::time::timeout(
            Duration::from_millis(10),
            renderer.render_template(&template, options.clone()),
        )
        .await;
        assert!(gave_up.is_err());
        assert_eq!(renderer.in_flight_count(), 1);
        assert_eq!(Rc::strong_count(&renderer.inner), 1);

        // The next identical request picks the pending render back up.
        let err = renderer.render_template(&template, options.clone()).await.unwrap_err();
        assert!(matches!(err, RenderError::Timeout { .. }));
        assert_eq!(renderer.in_flight_count(), 0);

        let _ = tokio::time::timeout(Duration::from_millis(10), renderer.render_template(&template, options)).await;
        let handle = Rc::downgrade(&renderer.inner);
        drop(renderer);
        assert!(handle.upgrade().is_none());
    }

    #[tokio::test]
    async fn test_sweeper_expires_idle_entries() {
        init_logging();
        let short = CacheConfig::new(
            16 * 1024 * 1024,
            10,
            Duration::from_millis(20),
            Duration::from_millis(30),
        );
        let config = RenderConfig::default().with_render_results(short);
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async move {
                let renderer = TemplateRenderer::new(config);
                let sweeper = renderer.spawn_sweeper();
                renderer.render_high_quality(&card("t1")).await.unwrap();
                assert_eq!(renderer.cache_stats().results.entries, 1);

                // No cache access while the entry expires.
                tokio::time::sleep(Duration::from_millis(200)).await;
                let stats = renderer.cache_stats().results;
                assert_eq!((stats.entries, stats.size_bytes), (0, 0));

                drop(renderer);
                tokio::time::timeout(Duration::from_secs(1), sweeper)
                    .await
                    .unwrap()
                    .unwrap();
            })
            .await;
    }
}

//! Scene object factory: template objects in, live scene nodes out.
//!
//! Dispatch is by [`ObjectType`]. Group children are built recursively and
//! a failing child is skipped with a warning; the group itself still
//! succeeds with whatever subset was built.

use crate::assets::{ImageLoader, SourceLoader, decode_image, placeholder_art};
use crate::color::{SerializableColor, parse_color};
use crate::config::FactoryConfig;
use crate::error::ObjectCreationError;
use crate::scene::{
    GroupNode, ImageNode, NodeKind, NodeTags, Paint, SceneNode, ShapeNode, TextAlign, TextNode,
    Transform,
};
use crate::storage::BoxFuture;
use crate::template::{NodeData, ObjectType, PlaceholderKind, TemplateObject};
use kurbo::Vec2;
use std::sync::Arc;

const DEFAULT_FONT_SIZE: f64 = 16.0;

/// A built node plus the non-fatal problems met while building it.
#[derive(Debug, Clone)]
pub struct CreatedNode {
    pub node: SceneNode,
    pub warnings: Vec<String>,
}

impl CreatedNode {
    fn new(node: SceneNode) -> Self {
        Self {
            node,
            warnings: Vec::new(),
        }
    }
}

/// Builds scene nodes from template objects.
#[derive(Clone)]
pub struct ObjectFactory {
    config: FactoryConfig,
    loader: Arc<dyn ImageLoader>,
}

impl std::fmt::Debug for ObjectFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectFactory")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for ObjectFactory {
    fn default() -> Self {
        Self::new(FactoryConfig::default())
    }
}

impl ObjectFactory {
    /// Factory loading images through the default [`SourceLoader`].
    pub fn new(config: FactoryConfig) -> Self {
        Self {
            config,
            loader: Arc::new(SourceLoader::new()),
        }
    }

    pub fn with_loader(mut self, loader: Arc<dyn ImageLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    pub fn loader(&self) -> &Arc<dyn ImageLoader> {
        &self.loader
    }

    /// Build the node for `object` from `node_data`.
    pub async fn create(
        &self,
        node_data: &NodeData,
        object: &TemplateObject,
    ) -> Result<CreatedNode, ObjectCreationError> {
        let mut created = self
            .build(node_data, object.object_type, object, Vec2::ZERO)
            .await?;
        created.node.set_tags(NodeTags {
            template_object_id: Some(object.id.clone()),
            template_type: Some(object.object_type),
            editable: object.editable,
            placeholder: object.placeholder.clone(),
        });
        Ok(created)
    }

    fn build<'a>(
        &'a self,
        data: &'a NodeData,
        object_type: ObjectType,
        object: &'a TemplateObject,
        origin: Vec2,
    ) -> BoxFuture<'a, Result<CreatedNode, ObjectCreationError>> {
        Box::pin(async move {
            let mut created = match object_type {
                ObjectType::Text => self.create_text(data, object, origin),
                ObjectType::Image => self.create_image(data, object, origin).await?,
                ObjectType::Shape => self.create_shape(data, object, origin),
                ObjectType::Group => self.create_group(data, object, origin).await,
            };
            created.node.set_z_index(data.z_index.unwrap_or(0));
            created
                .node
                .set_decorations(data.filters.clone(), data.shadow.clone());
            Ok(created)
        })
    }

    fn transform(data: &NodeData, origin: Vec2) -> Transform {
        Transform {
            left: origin.x + data.left,
            top: origin.y + data.top,
            scale_x: data.scale_x,
            scale_y: data.scale_y,
            angle: data.angle,
        }
    }

    fn color(
        value: Option<&str>,
        fallback: Option<SerializableColor>,
        object: &TemplateObject,
        warnings: &mut Vec<String>,
    ) -> Option<SerializableColor> {
        match value.map(str::trim) {
            None | Some("") => fallback,
            Some(v) if v.eq_ignore_ascii_case("none") => None,
            Some(v) => parse_color(v).or_else(|| {
                warnings.push(format!("Object {}: invalid colour '{}'", object.id, v));
                fallback
            }),
        }
    }

    fn paint(
        data: &NodeData,
        object: &TemplateObject,
        default_fill: Option<SerializableColor>,
        warnings: &mut Vec<String>,
    ) -> Paint {
        Paint {
            fill: Self::color(data.fill.as_deref(), default_fill, object, warnings),
            stroke: Self::color(data.stroke.as_deref(), None, object, warnings),
            stroke_width: data.stroke_width.unwrap_or(1.0).max(0.0),
            opacity: data.opacity.clamp(0.0, 1.0),
        }
    }

    fn create_text(&self, data: &NodeData, object: &TemplateObject, origin: Vec2) -> CreatedNode {
        let text_default = object
            .placeholder
            .as_ref()
            .filter(|p| p.kind == PlaceholderKind::Text)
            .map(|p| p.default_content.clone());
        let content = data
            .text
            .clone()
            .or_else(|| text_default.clone())
            .unwrap_or_default();

        let mut text = TextNode::new(content, data.font_size.unwrap_or(DEFAULT_FONT_SIZE))
            .with_interactive(object.editable.content)
            .with_default_content(text_default)
            .with_hint_color(self.config.hint_color);
        text.bold = data.is_bold();
        text.italic = data
            .font_style
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("italic") || s.eq_ignore_ascii_case("oblique"));
        text.align = data.text_align.as_deref().map(TextAlign::parse).unwrap_or_default();
        if let Some(family) = &data.font_family {
            text.font_family = family.clone();
        }

        let width = data.width.unwrap_or_else(|| text.estimate_size().0);
        let height = data.height.unwrap_or_else(|| {
            text.wrap_lines(width).len().max(1) as f64 * text.line_height()
        });

        let mut warnings = Vec::new();
        let paint = Self::paint(data, object, Some(SerializableColor::black()), &mut warnings);
        let node = SceneNode::new(NodeKind::Text(text), Self::transform(data, origin), width, height)
            .with_paint(paint);
        CreatedNode { node, warnings }
    }

    async fn create_image(
        &self,
        data: &NodeData,
        object: &TemplateObject,
        origin: Vec2,
    ) -> Result<CreatedNode, ObjectCreationError> {
        let source = data.src.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let placeholder_kind = object.placeholder.as_ref().map(|p| p.kind);
        let mut warnings = Vec::new();

        let image = match source {
            None if self.config.enable_placeholders => {
                self.art(data, placeholder_kind.unwrap_or(PlaceholderKind::Image))
            }
            None => {
                return Err(ObjectCreationError::MissingSource {
                    object_id: object.id.clone(),
                });
            }
            Some(uri) => match self.load_image(uri, object).await {
                Ok(image) => image,
                // A placeholder slot can still show art when its media fails.
                Err(e) if self.config.enable_placeholders && placeholder_kind.is_some() => {
                    log::warn!("{e}; using placeholder art");
                    warnings.push(e.to_string());
                    self.art(data, placeholder_kind.unwrap_or(PlaceholderKind::Image))
                }
                Err(e) => return Err(e),
            },
        };

        let (natural_w, natural_h) = image.natural_size();
        let width = data.width.unwrap_or(natural_w as f64);
        let height = data.height.unwrap_or(natural_h as f64);
        let paint = Paint {
            fill: None,
            ..Self::paint(data, object, None, &mut warnings)
        };
        let node = SceneNode::new(NodeKind::Image(image), Self::transform(data, origin), width, height)
            .with_paint(paint);
        Ok(CreatedNode { node, warnings })
    }

    fn art(&self, data: &NodeData, kind: PlaceholderKind) -> ImageNode {
        let size = self.config.placeholder_art_size as f64;
        let width = data.width.unwrap_or(size).round().max(1.0) as u32;
        let height = data.height.unwrap_or(size).round().max(1.0) as u32;
        ImageNode::placeholder_art(placeholder_art(width, height, kind))
    }

    /// Load and decode `uri` within the configured timeout. Dropping the
    /// timed-out future abandons the load.
    pub async fn load_image(
        &self,
        uri: &str,
        object: &TemplateObject,
    ) -> Result<ImageNode, ObjectCreationError> {
        let load = async {
            let bytes = self.loader.load(uri).await?;
            decode_image(&bytes)
        };
        match tokio::time::timeout(self.config.image_timeout(), load).await {
            Ok(Ok(decoded)) => Ok(ImageNode::loaded(uri, decoded.pixels, decoded.format)),
            Ok(Err(e)) => Err(ObjectCreationError::ImageLoad {
                object_id: object.id.clone(),
                uri: uri.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(ObjectCreationError::Timeout {
                object_id: object.id.clone(),
                timeout_ms: self.config.image_timeout_ms,
            }),
        }
    }

    fn create_shape(&self, data: &NodeData, object: &TemplateObject, origin: Vec2) -> CreatedNode {
        let build = ShapeNode::from_data(data);
        let mut warnings = Vec::new();
        if let Some(warning) = build.warning {
            log::warn!("Object {}: {}", object.id, warning);
            warnings.push(format!("Object {}: {}", object.id, warning));
        }
        let default_fill = if build.shape.is_open() {
            None
        } else {
            Some(SerializableColor::black())
        };
        let mut paint = Self::paint(data, object, default_fill, &mut warnings);
        if build.shape.is_open() && paint.stroke.is_none() {
            paint.stroke = paint.fill.take().or(Some(SerializableColor::black()));
        }
        let transform = Self::transform(data, origin + build.offset);
        let node = SceneNode::new(NodeKind::Shape(build.shape), transform, build.width, build.height)
            .with_paint(paint);
        CreatedNode { node, warnings }
    }

    async fn create_group(&self, data: &NodeData, object: &TemplateObject, origin: Vec2) -> CreatedNode {
        let child_origin = origin + Vec2::new(data.left, data.top);
        let mut children = Vec::new();
        let mut warnings = Vec::new();

        for (index, child) in data.objects.iter().enumerate() {
            let child_type = ObjectType::infer(child);
            match self.build(child, child_type, object, child_origin).await {
                Ok(mut created) => {
                    created.node.set_tags(NodeTags {
                        template_object_id: Some(object.id.clone()),
                        template_type: Some(child_type),
                        editable: object.editable,
                        placeholder: None,
                    });
                    warnings.append(&mut created.warnings);
                    children.push(created.node);
                }
                Err(e) => {
                    log::warn!("Skipping child {} of group {}: {}", index, object.id, e);
                    warnings.push(format!("Skipped child {index} of group {}: {e}", object.id));
                }
            }
        }

        let group = GroupNode::new(children);
        let (transform, width, height) = if group.is_empty() {
            (Transform::at(child_origin.x, child_origin.y), 0.0, 0.0)
        } else {
            let bounds = group.bounds();
            (Transform::at(bounds.x0, bounds.y0), bounds.width(), bounds.height())
        };
        let mut paint_warnings = Vec::new();
        let paint = Paint {
            fill: None,
            ..Self::paint(data, object, None, &mut paint_warnings)
        };
        warnings.extend(paint_warnings);
        let node = SceneNode::new(NodeKind::Group(group), transform, width, height).with_paint(paint);
        let mut created = CreatedNode::new(node);
        created.warnings = warnings;
        created
    }
}

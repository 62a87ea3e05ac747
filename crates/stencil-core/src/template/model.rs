//! Template, canvas and object definitions.

use super::node_data::NodeData;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// A design template: canvas metadata plus the objects to materialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Unique template identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Catalog category (validated against the known set).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Canvas dimensions and background.
    pub canvas: CanvasSpec,
    /// Objects in declaration order.
    pub objects: Vec<TemplateObject>,
    /// Free-form metadata; `metadata.version` drives migration.
    #[serde(default)]
    pub metadata: TemplateMetadata,
    /// Preview image URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    /// Whether users may customize the template at all.
    #[serde(default = "default_true")]
    pub customizable: bool,
}

impl Template {
    /// Create an empty template with a white canvas.
    pub fn new(id: impl Into<String>, name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: None,
            canvas: CanvasSpec::new(width, height),
            objects: Vec::new(),
            metadata: TemplateMetadata::default(),
            preview: None,
            customizable: true,
        }
    }

    /// Append an object.
    pub fn with_object(mut self, object: TemplateObject) -> Self {
        self.objects.push(object);
        self
    }

    /// Find an object by id (top level only).
    pub fn object(&self, id: &str) -> Option<&TemplateObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Deserialize a template from JSON without validation or migration.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the template to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Canvas size and background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasSpec {
    pub width: u32,
    pub height: u32,
    pub background_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
}

impl CanvasSpec {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            background_color: "#ffffff".to_string(),
            background_image: None,
        }
    }
}

/// Kind of template object; selects the factory branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    Text,
    Image,
    Shape,
    Group,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Text => "text",
            ObjectType::Image => "image",
            ObjectType::Shape => "shape",
            ObjectType::Group => "group",
        }
    }

    /// Infer the object type of a nested payload from its `type` key.
    pub fn infer(data: &NodeData) -> Self {
        match data.kind.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("text" | "textbox" | "i-text") => ObjectType::Text,
            Some("image") => ObjectType::Image,
            Some("group") => ObjectType::Group,
            _ if data.text.is_some() => ObjectType::Text,
            _ if data.src.is_some() => ObjectType::Image,
            _ if !data.objects.is_empty() => ObjectType::Group,
            _ => ObjectType::Shape,
        }
    }
}

/// Which mutations a live node permits. Enforced, not advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Editable {
    pub content: bool,
    pub style: bool,
    pub position: bool,
    pub size: bool,
}

impl Editable {
    /// Everything editable.
    pub const fn all() -> Self {
        Self {
            content: true,
            style: true,
            position: true,
            size: true,
        }
    }

    /// Nothing editable.
    pub const fn locked() -> Self {
        Self {
            content: false,
            style: false,
            position: false,
            size: false,
        }
    }
}

impl Default for Editable {
    fn default() -> Self {
        Self::all()
    }
}

/// Kind of fillable slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderKind {
    Text,
    Image,
    Logo,
    Icon,
}

impl PlaceholderKind {
    /// Image, logo and icon slots hold media rather than text.
    pub fn is_media(&self) -> bool {
        !matches!(self, PlaceholderKind::Text)
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlaceholderKind::Text => "Text",
            PlaceholderKind::Image => "Image",
            PlaceholderKind::Logo => "Logo",
            PlaceholderKind::Icon => "Icon",
        }
    }
}

/// Marks a template object as a user-fillable slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placeholder {
    #[serde(rename = "type")]
    pub kind: PlaceholderKind,
    pub default_content: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl Placeholder {
    pub fn new(kind: PlaceholderKind, default_content: impl Into<String>) -> Self {
        Self {
            kind,
            default_content: default_content.into(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }
}

/// One object in a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateObject {
    /// Unique within the template.
    pub id: String,
    #[serde(rename = "type")]
    pub object_type: ObjectType,
    /// Renderer payload.
    pub node_data: NodeData,
    pub editable: Editable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<Placeholder>,
}

impl TemplateObject {
    pub fn new(id: impl Into<String>, object_type: ObjectType, node_data: NodeData) -> Self {
        Self {
            id: id.into(),
            object_type,
            node_data,
            editable: Editable::all(),
            placeholder: None,
        }
    }

    pub fn with_editable(mut self, editable: Editable) -> Self {
        self.editable = editable;
        self
    }

    pub fn with_placeholder(mut self, placeholder: Placeholder) -> Self {
        self.placeholder = Some(placeholder);
        self
    }
}

/// Free-form descriptive metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TemplateMetadata {
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    pub industry: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    pub colors: Vec<String>,
    pub fonts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Schema version of the template document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

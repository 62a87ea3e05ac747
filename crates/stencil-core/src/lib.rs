//! Stencil Core Library
//!
//! Turns declarative design templates into live, editable scenes:
//! the template model, the scene object factory, the placeholder
//! lifecycle, the apply engine and the schema validator/serializer.

pub mod assets;
pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod factory;
pub mod placeholder;
pub mod scene;
pub mod schema;
pub mod storage;
pub mod template;

pub use assets::{DataUriLoader, DecodedImage, FileImageLoader, ImageLoader, SourceLoader};
pub use color::{SerializableColor, is_valid_color, parse_color};
pub use config::{EngineConfig, FactoryConfig};
pub use engine::{ApplyOptions, ApplyProgress, ApplyReport, EngineState, TemplateEngine};
pub use error::{
    ApplyError, AssetError, LoadError, NodeError, ObjectCreationError, PlaceholderError,
    ValidationError,
};
pub use factory::{CreatedNode, ObjectFactory};
pub use placeholder::{
    PlaceholderEvent, PlaceholderManager, PlaceholderState, ReplaceRequest, SuggestionProvider,
};
pub use scene::{NodeId, NodeKind, Scene, SceneNode, ShapeKind};
pub use schema::{
    CURRENT_SCHEMA_VERSION, MigrationRegistry, TemplateHeader, ValidationIssue, ValidationReport,
    decode_template, parse_template, serialize_scene, validate_template, validate_value,
};
pub use storage::{BoxFuture, FileTemplateStore, MemoryTemplateStore, TemplateStore};
pub use template::{
    CanvasSpec, Editable, NodeData, ObjectType, Placeholder, PlaceholderKind, Template,
    TemplateMetadata, TemplateObject,
};

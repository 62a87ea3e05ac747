//! Template model: the declarative, versioned description of a design.

mod model;
mod node_data;

pub use model::{
    CanvasSpec, Editable, ObjectType, Placeholder, PlaceholderKind, Template, TemplateMetadata,
    TemplateObject,
};
pub use node_data::{NodeData, PointData};

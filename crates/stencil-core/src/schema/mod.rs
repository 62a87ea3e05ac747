//! Template documents on the wire: validation, version migration, and
//! conversion between documents and live scenes.

mod migrate;
mod serialize;
mod validate;

pub use migrate::{
    BASELINE_VERSION, CURRENT_SCHEMA_VERSION, Migration, MigrationRegistry, Version,
};
pub use serialize::{TemplateHeader, decode_template, parse_template, serialize_scene};
pub use validate::{
    CATEGORIES, DIFFICULTIES, STYLES, ValidationIssue, ValidationReport, is_iso8601,
    validate_template, validate_value,
};

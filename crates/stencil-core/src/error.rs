//! Error taxonomy shared by the factory, placeholders and the apply engine.

use crate::scene::NodeId;
use crate::schema::ValidationIssue;
use std::fmt;
use thiserror::Error;

/// Template could not be obtained from a store.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("Template not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("Store error: {0}")]
    Other(String),
}

/// Schema violations. Carries every violation found, not just the first.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Template failed validation with {} error(s)",
            self.issues.len()
        )?;
        for issue in &self.issues {
            write!(f, "; {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// A single template object could not be turned into a scene node.
#[derive(Debug, Clone, Error)]
pub enum ObjectCreationError {
    #[error("Object {object_id}: image has no source and placeholders are disabled")]
    MissingSource { object_id: String },
    #[error("Object {object_id}: failed to load image '{uri}': {reason}")]
    ImageLoad {
        object_id: String,
        uri: String,
        reason: String,
    },
    #[error("Object {object_id}: image load timed out after {timeout_ms} ms")]
    Timeout { object_id: String, timeout_ms: u64 },
    #[error("Object {object_id}: invalid node data: {reason}")]
    InvalidNodeData { object_id: String, reason: String },
}

impl ObjectCreationError {
    /// Id of the template object that failed.
    pub fn object_id(&self) -> &str {
        match self {
            ObjectCreationError::MissingSource { object_id }
            | ObjectCreationError::ImageLoad { object_id, .. }
            | ObjectCreationError::Timeout { object_id, .. }
            | ObjectCreationError::InvalidNodeData { object_id, .. } => object_id,
        }
    }
}

/// Property family guarded by an `editable` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockedProperty {
    Content,
    Style,
    Position,
    Size,
}

impl fmt::Display for LockedProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LockedProperty::Content => "content",
            LockedProperty::Style => "style",
            LockedProperty::Position => "position",
            LockedProperty::Size => "size",
        };
        f.write_str(name)
    }
}

/// Mutation rejected by a live node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    #[error("Node {node} is locked against {property} changes")]
    Locked {
        node: NodeId,
        property: LockedProperty,
    },
    #[error("Node {node} does not support {operation}")]
    Unsupported {
        node: NodeId,
        operation: &'static str,
    },
}

/// Image asset loading and decoding failures.
#[derive(Debug, Clone, Error)]
pub enum AssetError {
    #[error("Unsupported image source: {0}")]
    UnsupportedSource(String),
    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Decode error: {0}")]
    Decode(String),
}

/// Placeholder replacement or lifecycle failures. A failed replacement
/// leaves the node untouched.
#[derive(Debug, Clone, Error)]
pub enum PlaceholderError {
    #[error("Node {0} is not a registered placeholder")]
    NotRegistered(NodeId),
    #[error("Node {0} not found in scene")]
    MissingNode(NodeId),
    #[error("Invalid replacement content: {0}")]
    InvalidContent(String),
    #[error(transparent)]
    Node(#[from] NodeError),
    #[error("Failed to load replacement media: {0}")]
    Asset(#[from] AssetError),
    #[error("Replacement media load timed out after {0} ms")]
    Timeout(u64),
}

/// Schema version migration failures.
#[derive(Debug, Clone, Error)]
pub enum MigrationError {
    #[error("Invalid version string: {0}")]
    InvalidVersion(String),
    #[error("Migration {from} -> {to} failed: {reason}")]
    Failed {
        from: String,
        to: String,
        reason: String,
    },
}

/// Apply-level failure surfaced by the engine after rollback.
#[derive(Debug, Clone, Error)]
pub enum ApplyError {
    #[error(transparent)]
    Load(LoadError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    ObjectCreation(#[from] ObjectCreationError),
}

/// Schema violations found while loading surface as validation failures.
impl From<LoadError> for ApplyError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::Invalid(validation) => ApplyError::Validation(validation),
            other => ApplyError::Load(other),
        }
    }
}

/// Result type for asset operations.
pub type AssetResult<T> = Result<T, AssetError>;

/// Result type for store operations.
pub type LoadResult<T> = Result<T, LoadError>;

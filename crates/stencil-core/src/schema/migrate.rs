//! Versioned template migrations.
//!
//! A document's version lives at `metadata.version`; a missing version is
//! read as [`BASELINE_VERSION`]. Migrations chain strictly: a step runs
//! only when its `from` equals the document's current version, and the
//! document is re-stamped after each step.

use crate::error::MigrationError;
use serde_json::{Map, Value, json};
use std::fmt;
use std::str::FromStr;

/// Version written by the current release.
pub const CURRENT_SCHEMA_VERSION: &str = "2.0.0";

/// Version assumed for documents that carry none.
pub const BASELINE_VERSION: &str = "1.0.0";

/// `major.minor.patch`; a missing patch reads as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }
}

impl FromStr for Version {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MigrationError::InvalidVersion(s.to_string());
        let mut parts = s.trim().split('.');
        let mut next = |required: bool| -> Result<u32, MigrationError> {
            match parts.next() {
                Some(p) => p.parse().map_err(|_| invalid()),
                None if required => Err(invalid()),
                None => Ok(0),
            }
        };
        let version = Version::new(next(true)?, next(true)?, next(false)?);
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(version)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

type MigrateFn = Box<dyn Fn(&mut Value) -> Result<(), String> + Send + Sync>;

/// One step from `from` to `to`.
pub struct Migration {
    pub from: Version,
    pub to: Version,
    pub description: String,
    apply: MigrateFn,
}

impl Migration {
    pub fn new(
        from: Version,
        to: Version,
        description: impl Into<String>,
        apply: impl Fn(&mut Value) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            from,
            to,
            description: description.into(),
            apply: Box::new(apply),
        }
    }
}

impl fmt::Debug for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migration")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("description", &self.description)
            .finish()
    }
}

/// Ordered set of migrations.
#[derive(Debug)]
pub struct MigrationRegistry {
    migrations: Vec<Migration>,
}

impl Default for MigrationRegistry {
    /// Registry with the built-in migrations.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Migration::new(
            Version::new(1, 0, 0),
            Version::new(1, 1, 0),
            "default editable flags and customizable",
            add_editable_defaults,
        ));
        registry.register(Migration::new(
            Version::new(1, 1, 0),
            Version::new(2, 0, 0),
            "rename canvas.background and placeholder.default",
            rename_legacy_keys,
        ));
        registry
    }
}

impl MigrationRegistry {
    /// Registry without any migrations.
    pub fn empty() -> Self {
        Self {
            migrations: Vec::new(),
        }
    }

    /// Add a step, keeping the list sorted by source version.
    pub fn register(&mut self, migration: Migration) {
        let at = self
            .migrations
            .partition_point(|m| m.from <= migration.from);
        self.migrations.insert(at, migration);
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    /// Highest version reachable through registered steps.
    pub fn latest(&self) -> Option<Version> {
        self.migrations.iter().map(|m| m.to).max()
    }

    /// Migrate `document` in place and return its final version.
    pub fn migrate(&self, document: &mut Value) -> Result<Version, MigrationError> {
        let mut current: Version = document_version(document)
            .unwrap_or(BASELINE_VERSION)
            .parse()?;

        for migration in &self.migrations {
            if migration.from != current {
                continue;
            }
            log::debug!(
                "Migrating template {} -> {}: {}",
                migration.from,
                migration.to,
                migration.description
            );
            (migration.apply)(document).map_err(|reason| MigrationError::Failed {
                from: migration.from.to_string(),
                to: migration.to.to_string(),
                reason,
            })?;
            current = migration.to;
            stamp_version(document, current);
        }

        if document_version(document).is_none() {
            stamp_version(document, current);
        }
        Ok(current)
    }
}

fn document_version(document: &Value) -> Option<&str> {
    document.get("metadata")?.get("version")?.as_str()
}

fn stamp_version(document: &mut Value, version: Version) {
    let Some(root) = document.as_object_mut() else {
        return;
    };
    let metadata = root
        .entry("metadata")
        .or_insert_with(|| Value::Object(Map::new()));
    if !metadata.is_object() {
        *metadata = Value::Object(Map::new());
    }
    if let Some(metadata) = metadata.as_object_mut() {
        metadata.insert("version".to_string(), Value::String(version.to_string()));
    }
}

fn objects_mut(document: &mut Value) -> Result<Option<&mut Vec<Value>>, String> {
    match document.get_mut("objects") {
        Some(Value::Array(objects)) => Ok(Some(objects)),
        Some(_) => Err("objects is not an array".to_string()),
        None => Ok(None),
    }
}

fn add_editable_defaults(document: &mut Value) -> Result<(), String> {
    let root = document
        .as_object_mut()
        .ok_or_else(|| "document is not an object".to_string())?;
    root.entry("customizable").or_insert(Value::Bool(true));

    if let Some(objects) = objects_mut(document)? {
        for object in objects.iter_mut().filter_map(Value::as_object_mut) {
            let editable = object
                .entry("editable")
                .or_insert_with(|| json!({}));
            if let Some(editable) = editable.as_object_mut() {
                for flag in ["content", "style", "position", "size"] {
                    editable.entry(flag).or_insert(Value::Bool(true));
                }
            }
        }
    }
    Ok(())
}

fn rename_legacy_keys(document: &mut Value) -> Result<(), String> {
    if let Some(canvas) = document.get_mut("canvas").and_then(Value::as_object_mut) {
        if let Some(background) = canvas.remove("background") {
            canvas.entry("backgroundColor").or_insert(background);
        }
    }

    if let Some(objects) = objects_mut(document)? {
        for placeholder in objects
            .iter_mut()
            .filter_map(|o| o.get_mut("placeholder"))
            .filter_map(Value::as_object_mut)
        {
            if let Some(default) = placeholder.remove("default") {
                placeholder.entry("defaultContent").or_insert(default);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version() {
        assert_eq!("1.2.3".parse::<Version>().unwrap(), Version::new(1, 2, 3));
        assert_eq!("2.0".parse::<Version>().unwrap(), Version::new(2, 0, 0));
        assert!("2".parse::<Version>().is_err());
        assert!("1.x.0".parse::<Version>().is_err());
        assert!("1.0.0.0".parse::<Version>().is_err());
        assert!(Version::new(1, 10, 0) > Version::new(1, 9, 3));
    }

    #[test]
    fn test_chain_from_missing_version() {
        let mut doc = json!({
            "canvas": {"width": 10, "height": 10, "background": "#123456"},
            "objects": [{"id": "a", "placeholder": {"type": "text", "default": "Hi"}}]
        });
        let version = MigrationRegistry::default().migrate(&mut doc).unwrap();

        assert_eq!(version.to_string(), CURRENT_SCHEMA_VERSION);
        assert_eq!(doc["metadata"]["version"], CURRENT_SCHEMA_VERSION);
        assert_eq!(doc["canvas"]["backgroundColor"], "#123456");
        assert!(doc["canvas"].get("background").is_none());
        assert_eq!(doc["objects"][0]["placeholder"]["defaultContent"], "Hi");
        assert_eq!(doc["objects"][0]["editable"]["size"], true);
        assert_eq!(doc["customizable"], true);
    }

    #[test]
    fn test_partial_editable_is_completed() {
        let mut doc = json!({
            "objects": [{"editable": {"content": false}}],
            "metadata": {"version": "1.0.0"}
        });
        MigrationRegistry::default().migrate(&mut doc).unwrap();
        assert_eq!(doc["objects"][0]["editable"]["content"], false);
        assert_eq!(doc["objects"][0]["editable"]["position"], true);
    }

    #[test]
    fn test_current_document_untouched() {
        let mut doc = json!({
            "canvas": {"backgroundColor": "#fff", "background": "kept"},
            "objects": [],
            "metadata": {"version": "2.0.0"}
        });
        let before = doc.clone();
        let version = MigrationRegistry::default().migrate(&mut doc).unwrap();
        assert_eq!(version, Version::new(2, 0, 0));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_strict_chaining_skips_gaps() {
        let mut registry = MigrationRegistry::empty();
        registry.register(Migration::new(
            Version::new(1, 5, 0),
            Version::new(2, 0, 0),
            "unreachable from 1.0.0",
            |doc| {
                doc["touched"] = Value::Bool(true);
                Ok(())
            },
        ));
        let mut doc = json!({"metadata": {"version": "1.0.0"}});
        let version = registry.migrate(&mut doc).unwrap();
        assert_eq!(version, Version::new(1, 0, 0));
        assert!(doc.get("touched").is_none());
    }

    #[test]
    fn test_failed_step_reports_versions() {
        let mut registry = MigrationRegistry::empty();
        registry.register(Migration::new(
            Version::new(1, 0, 0),
            Version::new(1, 1, 0),
            "always fails",
            |_| Err("boom".to_string()),
        ));
        let err = registry.migrate(&mut json!({})).unwrap_err();
        assert!(matches!(
            err,
            MigrationError::Failed { ref from, ref to, .. } if from == "1.0.0" && to == "1.1.0"
        ));
    }

    #[test]
    fn test_invalid_version() {
        let mut doc = json!({"metadata": {"version": "latest"}});
        assert!(matches!(
            MigrationRegistry::default().migrate(&mut doc),
            Err(MigrationError::InvalidVersion(_))
        ));
    }
}

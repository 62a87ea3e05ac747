//! File-based template store.

use super::{BoxFuture, TemplateStore};
use crate::error::{LoadError, LoadResult};
use crate::schema::decode_template;
use crate::template::Template;
use std::fs;
use std::path::PathBuf;

/// Stores templates as JSON files in a directory.
///
/// Files are migrated to the current schema version on load, so templates
/// written by older releases keep working, then validated; a file with
/// schema violations fails with [`LoadError::Invalid`] listing all of them.
pub struct FileTemplateStore {
    /// Base directory for template files.
    base_path: PathBuf,
}

impl FileTemplateStore {
    /// Create a new file store with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> LoadResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                LoadError::Io(format!("Failed to create template directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create a file store in the default location.
    ///
    /// On Unix: `~/.local/share/stencil/templates/`
    /// On Windows: `%LOCALAPPDATA%\stencil\templates\`
    pub fn default_location() -> LoadResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| LoadError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join("stencil").join("templates"))
    }

    fn template_path(&self, id: &str) -> PathBuf {
        let safe_id: String = id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.json", safe_id))
    }

    /// Get the base path.
    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }
}

impl TemplateStore for FileTemplateStore {
    fn load(&self, id: &str) -> BoxFuture<'_, LoadResult<Template>> {
        let path = self.template_path(id);
        let id = id.to_string();
        Box::pin(async move {
            if !path.exists() {
                return Err(LoadError::NotFound(id));
            }
            let json = fs::read_to_string(&path)
                .map_err(|e| LoadError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
            decode_template(&json)
        })
    }

    fn save(&self, template: &Template) -> BoxFuture<'_, LoadResult<()>> {
        let path = self.template_path(&template.id);
        let json = template.to_json();
        Box::pin(async move {
            let json = json.map_err(|e| LoadError::Parse(e.to_string()))?;
            fs::write(&path, json)
                .map_err(|e| LoadError::Io(format!("Failed to write {}: {}", path.display(), e)))
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, LoadResult<()>> {
        let path = self.template_path(id);
        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    LoadError::Io(format!("Failed to delete {}: {}", path.display(), e))
                })?;
            }
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, LoadResult<Vec<String>>> {
        let base = self.base_path.clone();
        Box::pin(async move {
            if !base.exists() {
                return Ok(vec![]);
            }
            let entries = fs::read_dir(&base)
                .map_err(|e| LoadError::Io(format!("Failed to read directory: {}", e)))?;
            let ids = entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|e| e == "json"))
                .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
                .collect();
            Ok(ids)
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, LoadResult<bool>> {
        let path = self.template_path(id);
        Box::pin(async move { Ok(path.exists()) })
    }
}

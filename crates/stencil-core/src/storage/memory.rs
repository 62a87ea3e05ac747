//! In-memory template store.

use super::{BoxFuture, TemplateStore};
use crate::error::{LoadError, LoadResult};
use crate::template::Template;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory store for tests and bundled templates.
#[derive(Default)]
pub struct MemoryTemplateStore {
    templates: RwLock<HashMap<String, Template>>,
}

impl MemoryTemplateStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with `templates`.
    pub fn with_templates(templates: impl IntoIterator<Item = Template>) -> Self {
        let map = templates.into_iter().map(|t| (t.id.clone(), t)).collect();
        Self {
            templates: RwLock::new(map),
        }
    }

    /// Insert synchronously.
    pub fn insert(&self, template: Template) {
        let mut templates = self.templates.write().unwrap_or_else(|e| e.into_inner());
        templates.insert(template.id.clone(), template);
    }
}

impl TemplateStore for MemoryTemplateStore {
    fn load(&self, id: &str) -> BoxFuture<'_, LoadResult<Template>> {
        let id = id.to_string();
        Box::pin(async move {
            let templates = self
                .templates
                .read()
                .map_err(|e| LoadError::Other(format!("Lock error: {}", e)))?;
            templates.get(&id).cloned().ok_or(LoadError::NotFound(id))
        })
    }

    fn save(&self, template: &Template) -> BoxFuture<'_, LoadResult<()>> {
        let template = template.clone();
        Box::pin(async move {
            let mut templates = self
                .templates
                .write()
                .map_err(|e| LoadError::Other(format!("Lock error: {}", e)))?;
            templates.insert(template.id.clone(), template);
            Ok(())
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, LoadResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut templates = self
                .templates
                .write()
                .map_err(|e| LoadError::Other(format!("Lock error: {}", e)))?;
            templates.remove(&id);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, LoadResult<Vec<String>>> {
        Box::pin(async move {
            let templates = self
                .templates
                .read()
                .map_err(|e| LoadError::Other(format!("Lock error: {}", e)))?;
            Ok(templates.keys().cloned().collect())
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, LoadResult<bool>> {
        let id = id.to_string();
        Box::pin(async move {
            let templates = self
                .templates
                .read()
                .map_err(|e| LoadError::Other(format!("Lock error: {}", e)))?;
            Ok(templates.contains_key(&id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pollster::block_on;

    #[test]
    fn test_save_and_load() {
        let store = MemoryTemplateStore::new();
        let template = Template::new("card", "Card", 400, 300);

        block_on(store.save(&template)).unwrap();
        let loaded = block_on(store.load("card")).unwrap();
        assert_eq!(loaded, template);
    }

    #[test]
    fn test_not_found() {
        let store = MemoryTemplateStore::new();
        let result = block_on(store.load("nonexistent"));
        assert!(matches!(result, Err(LoadError::NotFound(_))));
    }

    #[test]
    fn test_exists_and_delete() {
        let store = MemoryTemplateStore::with_templates([Template::new("a", "A", 10, 10)]);
        assert!(block_on(store.exists("a")).unwrap());
        block_on(store.delete("a")).unwrap();
        assert!(!block_on(store.exists("a")).unwrap());
        assert!(block_on(store.list()).unwrap().is_empty());
    }
}

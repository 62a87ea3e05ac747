//! Template store abstraction.

mod file;
mod memory;

pub use file::FileTemplateStore;
pub use memory::MemoryTemplateStore;

use crate::error::LoadResult;
use crate::template::Template;
use std::future::Future;
use std::pin::Pin;

/// Boxed future for async operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Source of templates by id.
///
/// Implementations can keep templates in memory, on disk, or behind a
/// remote project store.
pub trait TemplateStore: Send + Sync {
    /// Load a template.
    fn load(&self, id: &str) -> BoxFuture<'_, LoadResult<Template>>;

    /// Save a template under its own id.
    fn save(&self, template: &Template) -> BoxFuture<'_, LoadResult<()>>;

    /// Delete a template.
    fn delete(&self, id: &str) -> BoxFuture<'_, LoadResult<()>>;

    /// List all template IDs.
    fn list(&self) -> BoxFuture<'_, LoadResult<Vec<String>>>;

    /// Check if a template exists.
    fn exists(&self, id: &str) -> BoxFuture<'_, LoadResult<bool>>;
}

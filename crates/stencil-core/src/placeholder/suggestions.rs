//! Pluggable suggestion providers.

use crate::storage::BoxFuture;
use crate::template::Placeholder;

/// Resolves replacement suggestions for a placeholder, e.g. from an asset
/// search service.
pub trait SuggestionProvider: Send + Sync {
    fn suggestions(&self, placeholder: &Placeholder) -> BoxFuture<'_, Vec<String>>;
}

/// Returns the placeholder's own static `suggestions` list.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticSuggestions;

impl SuggestionProvider for StaticSuggestions {
    fn suggestions(&self, placeholder: &Placeholder) -> BoxFuture<'_, Vec<String>> {
        let list = placeholder.suggestions.clone();
        Box::pin(async move { list })
    }
}

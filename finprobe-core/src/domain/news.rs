//! News documents as returned by a news search.

use serde::{Deserialize, Serialize};

/// A single article. Provider order is preserved; no uniqueness is implied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsDocument {
    pub title: String,
    /// Short description when the provider has one, otherwise the body.
    pub content: String,
    /// Publication timestamp as reported by the provider (ISO 8601).
    pub published: String,
    pub source: String,
}

impl NewsDocument {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        published: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            published: published.into(),
            source: source.into(),
        }
    }
}

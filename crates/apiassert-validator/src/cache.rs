//! Parsed-document cache keyed on file content
//!
//! The file is read on every lookup; only parsing is skipped while the
//! content is unchanged, so edits made between assertions are picked up.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::document::{SchemaDocument, read_document};
use crate::error::ValidatorError;

struct CachedDocument {
    path: PathBuf,
    content: String,
    document: Arc<SchemaDocument>,
}

/// Single-entry document cache for one façade.
#[derive(Default)]
pub struct SchemaCache {
    entry: RefCell<Option<CachedDocument>>,
}

impl SchemaCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current document at `path`, parsed again only if the file changed.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::SchemaNotFound`] if the file is gone, or a
    /// read/parse error.
    pub fn load(&self, path: &Path) -> Result<Arc<SchemaDocument>, ValidatorError> {
        let content = read_document(path)?;
        if let Some(cached) = self.entry.borrow().as_ref() {
            if cached.path == path && cached.content == content {
                tracing::debug!(path = %path.display(), "schema cache hit");
                return Ok(Arc::clone(&cached.document));
            }
        }

        tracing::debug!(path = %path.display(), bytes = content.len(), "parsing schema");
        let document = Arc::new(SchemaDocument::parse(path, &content)?);
        *self.entry.borrow_mut() = Some(CachedDocument {
            path: path.to_path_buf(),
            content,
            document: Arc::clone(&document),
        });
        Ok(document)
    }

    pub fn clear(&self) {
        self.entry.borrow_mut().take();
    }
}

impl std::fmt::Debug for SchemaCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cached = self.entry.borrow().as_ref().map(|c| c.path.clone());
        f.debug_struct("SchemaCache").field("cached", &cached).finish()
    }
}

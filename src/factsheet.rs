//! Product factsheet loaded once at startup
//!
//! The factsheet PDF is extracted to plain text before the server starts
//! and injected into request handlers read-only. A failed load yields an
//! empty factsheet rather than an error: the server still answers, and
//! retrieval degrades to "not found".

use std::path::Path;

/// Immutable factsheet text, the retrieval corpus
#[derive(Debug, Default)]
pub struct Factsheet {
    text: String,
}

impl Factsheet {
    /// Extract the factsheet text from a PDF at `path`.
    pub fn load(path: &Path) -> Self {
        match pdf_extract::extract_text(path) {
            Ok(text) => {
                tracing::info!(
                    path = %path.display(),
                    chars = text.len(),
                    "Factsheet loaded"
                );
                Self { text }
            }
            Err(e) => {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "Failed to load factsheet"
                );
                Self::default()
            }
        }
    }

    #[cfg(test)]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

//! Parallel processing of many documents.
//!
//! Uses the global rayon thread pool. Results are returned in input order and
//! a failing document never affects the others.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use shortcode_core::{Delimiters, Locations, ScanError, scan_with};

use crate::{Metadata, RenderError, Resolver};

/// A document to scan or resolve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Where the document was read from (if known).
    pub path: Option<PathBuf>,
    /// Raw document text.
    pub content: String,
    /// Metadata layered over the resolver's configured metadata.
    pub metadata: Metadata,
}

impl Document {
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            path: None,
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Read a document from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Ok(Self::new(content).with_path(path))
    }
}

/// Resolve every document in parallel.
#[must_use]
pub fn render_batch(resolver: &Resolver, documents: &[Document]) -> Vec<Result<String, RenderError>> {
    if documents.is_empty() {
        return Vec::new();
    }

    let results: Vec<_> = documents
        .par_iter()
        .map(|document| resolver.resolve_document(document))
        .collect();

    let failed = results.iter().filter(|r| r.is_err()).count();
    tracing::debug!(documents = documents.len(), failed, "Rendered batch");
    results
}

/// Scan every document in parallel without resolving anything.
#[must_use]
pub fn scan_batch(
    delimiters: &Delimiters,
    documents: &[Document],
) -> Vec<Result<Locations, ScanError>> {
    documents
        .par_iter()
        .map(|document| scan_with(&document.content, delimiters))
        .collect()
}

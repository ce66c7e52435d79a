//! Error types for the receiptgrid library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`MergeError`] — **Fatal**: the merge cannot produce any output at all
//!   (no sources, invalid configuration, the writer failed, every source was
//!   skipped). Returned as `Err(MergeError)` from the top-level `merge*`
//!   functions.
//!
//! * [`SourceError`] — **Non-fatal**: a single source document failed
//!   (unreadable PDF, empty rasterisation) but the remaining sources are
//!   fine. Collected into [`crate::output::MergeOutput::skipped`] so callers
//!   can inspect partial success rather than losing the whole batch to one
//!   bad receipt.
//!
//! Request-shape validation at the HTTP boundary has its own error type,
//! [`crate::request::RequestError`], which knows its status code and
//! structured JSON body.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All fatal errors returned by the receiptgrid library.
///
/// Per-source failures use [`SourceError`] and are reported in
/// [`crate::output::MergeOutput`] rather than propagated here.
#[derive(Debug, Error)]
pub enum MergeError {
    /// The caller supplied no source documents.
    #[error("No source documents to merge")]
    NoSources,

    /// Every one of the sources was skipped; there is nothing to output.
    #[error("All {total} source documents failed; no output produced")]
    EmptyOutput { total: usize },

    /// A local input file is not a PDF.
    #[error("File is not a valid PDF: '{filename}'")]
    NotAPdf { filename: String },

    /// The pdfium library could not be bound at runtime.
    ///
    /// Not surfaced by the top-level entry points: it triggers the
    /// page-concatenation fallback instead.
    #[error("PDF rasteriser unavailable: {0}")]
    PdfiumUnavailable(String),

    /// The page writer failed to embed an image or emit a page.
    #[error("Failed to write output page: {0}")]
    PageWrite(String),

    /// The merged document could not be assembled or serialised.
    #[error("Failed to assemble merged document: {0}")]
    Assemble(String),

    /// A decoded source could not be written to the temp staging area.
    #[error("Failed to stage source '{filename}': {source}")]
    Staging {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    /// A local input file could not be read.
    #[error("Failed to read '{filename}': {source}")]
    ReadInput {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single source document.
///
/// The merge continues with the remaining sources unless ALL of them fail.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum SourceError {
    /// The source could not be parsed as a PDF.
    #[error("'{filename}' (index {index}): parse failed: {detail}")]
    ParseFailed {
        index: usize,
        filename: String,
        detail: String,
    },

    /// pdfium returned an error while rasterising the first page.
    #[error("'{filename}' (index {index}): rasterisation failed: {detail}")]
    RenderFailed {
        index: usize,
        filename: String,
        detail: String,
    },

    /// Rasterisation produced no usable image.
    #[error("'{filename}' (index {index}): first page rendered empty")]
    EmptyRender { index: usize, filename: String },
}

impl SourceError {
    /// Index of the failed source in the submitted batch.
    pub fn index(&self) -> usize {
        match self {
            SourceError::ParseFailed { index, .. }
            | SourceError::RenderFailed { index, .. }
            | SourceError::EmptyRender { index, .. } => *index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_output_display() {
        let e = MergeError::EmptyOutput { total: 4 };
        assert!(e.to_string().contains("All 4 source documents failed"));
    }

    #[test]
    fn source_error_display_names_the_file() {
        let e = SourceError::RenderFailed {
            index: 2,
            filename: "receipt.pdf".into(),
            detail: "bad xref".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("receipt.pdf"));
        assert!(msg.contains("index 2"));
        assert!(msg.contains("bad xref"));
    }

    #[test]
    fn source_error_index() {
        let e = SourceError::EmptyRender {
            index: 7,
            filename: "x.pdf".into(),
        };
        assert_eq!(e.index(), 7);
    }
}

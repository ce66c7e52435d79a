//! Top-level merge entry points.
//!
//! The async functions move the pdfium/printpdf work onto a blocking thread
//! via `spawn_blocking`; the merge itself is sequential and request-scoped.
//! [`merge_sync`] runs the same pipeline directly for callers without a
//! runtime.

use crate::config::MergeConfig;
use crate::error::MergeError;
use crate::output::{MergeOutput, MergeStats};
use crate::pipeline::{compose, fallback, input};
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

pub use crate::pipeline::input::SourceFile;

/// Merge decoded source documents into one PDF.
///
/// This is the primary entry point for the library. The grid compositor is
/// used when the pdfium rasteriser can be bound; otherwise (or when
/// [`MergeConfig::force_fallback`] is set) all pages of all sources are
/// concatenated verbatim.
///
/// # Errors
/// Returns `Err(MergeError)` only for fatal failures: an empty input set, a
/// writer error, or every single source being skipped. One bad source among
/// good ones is reported through [`MergeOutput::skipped`] instead.
pub async fn merge(files: Vec<SourceFile>, config: &MergeConfig) -> Result<MergeOutput, MergeError> {
    let config = config.clone();
    tokio::task::spawn_blocking(move || merge_sync(&files, &config))
        .await
        .map_err(|e| MergeError::Internal(format!("merge task panicked: {e}")))?
}

/// Synchronous implementation of [`merge`].
pub fn merge_sync(files: &[SourceFile], config: &MergeConfig) -> Result<MergeOutput, MergeError> {
    if files.is_empty() {
        return Err(MergeError::NoSources);
    }

    let start = Instant::now();
    info!("Merging {} source documents", files.len());

    let staging = input::stage(files)?;
    let staged = staging.sources();

    if !config.force_fallback {
        match compose::compose_grid(staged, config) {
            Ok(outcome) => {
                return Ok(finish(
                    outcome.pdf,
                    files.len(),
                    outcome.placed,
                    outcome.pages,
                    outcome.skipped,
                    false,
                    start,
                ));
            }
            Err(MergeError::PdfiumUnavailable(detail)) => {
                warn!("pdfium unavailable ({detail}); falling back to page concatenation");
            }
            Err(e) => return Err(e),
        }
    }

    let outcome = fallback::concat_pages(staged)?;
    Ok(finish(
        outcome.pdf,
        files.len(),
        outcome.merged_sources,
        outcome.pages,
        outcome.skipped,
        true,
        start,
    ))
}

/// Merge local PDF files from disk.
///
/// Reads each path, validates the PDF signature up front and then runs the
/// same pipeline as [`merge`]. Unlike per-source skips during composition, a
/// non-PDF argument here is a caller mistake and fails the whole merge.
pub async fn merge_files(
    paths: &[impl AsRef<Path>],
    config: &MergeConfig,
) -> Result<MergeOutput, MergeError> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let bytes = std::fs::read(path).map_err(|source| MergeError::ReadInput {
            filename: filename.clone(),
            source,
        })?;
        if !input::has_pdf_magic(&bytes) {
            return Err(MergeError::NotAPdf { filename });
        }
        files.push(SourceFile { filename, bytes });
    }
    merge(files, config).await
}

fn finish(
    pdf: Vec<u8>,
    total_sources: usize,
    merged_sources: usize,
    pages: usize,
    skipped: Vec<crate::error::SourceError>,
    fallback_used: bool,
    start: Instant,
) -> MergeOutput {
    let stats = MergeStats {
        total_sources,
        merged_sources,
        skipped_sources: skipped.len(),
        pages,
        fallback_used,
        total_duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "Merge complete: {}/{} sources, {} pages, {}ms{}",
        stats.merged_sources,
        stats.total_sources,
        stats.pages,
        stats.total_duration_ms,
        if fallback_used { " (fallback)" } else { "" }
    );
    MergeOutput {
        pdf,
        stats,
        skipped,
    }
}

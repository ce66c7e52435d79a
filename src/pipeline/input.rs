//! Source staging: decoded payloads → files in a request-scoped temp dir.
//!
//! ## Why temp files?
//!
//! pdfium opens documents by file-system path — it cannot stream from a byte
//! buffer. Writing every source into one `TempDir` gives the rasteriser
//! paths to open while ensuring the whole staging area is removed when
//! [`Staging`] is dropped, even if the merge panics midway.

use crate::error::MergeError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// One decoded, validated source document.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Display name, already normalised to a `.pdf` suffix.
    pub filename: String,
    /// Raw PDF bytes.
    pub bytes: Vec<u8>,
}

/// A staged source on disk, ready for the rasteriser.
#[derive(Debug)]
pub struct StagedSource {
    /// Position in the submitted batch.
    pub index: usize,
    /// Display name of the source.
    pub filename: String,
    /// Path inside the staging directory.
    pub path: PathBuf,
}

/// The staging area for one merge.
///
/// The `TempDir` is kept alive for the lifetime of this value; dropping it
/// removes every staged file.
#[derive(Debug)]
pub struct Staging {
    sources: Vec<StagedSource>,
    _temp_dir: TempDir,
}

impl Staging {
    pub fn sources(&self) -> &[StagedSource] {
        &self.sources
    }
}

/// True when `bytes` starts with the PDF signature.
pub fn has_pdf_magic(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF")
}

/// Write every source into a fresh temp directory.
///
/// File names are prefixed with the batch index so two uploads with the same
/// name cannot collide.
pub fn stage(files: &[SourceFile]) -> Result<Staging, MergeError> {
    let temp_dir =
        TempDir::new().map_err(|e| MergeError::Internal(format!("temp dir: {e}")))?;

    let mut sources = Vec::with_capacity(files.len());
    for (index, file) in files.iter().enumerate() {
        let path = temp_dir
            .path()
            .join(format!("input_{index}_{}", sanitise(&file.filename)));
        std::fs::write(&path, &file.bytes).map_err(|source| MergeError::Staging {
            filename: file.filename.clone(),
            source,
        })?;
        debug!("Staged '{}' ({} bytes) at {}", file.filename, file.bytes.len(), path.display());
        sources.push(StagedSource {
            index,
            filename: file.filename.clone(),
            path,
        });
    }

    Ok(Staging {
        sources,
        _temp_dir: temp_dir,
    })
}

/// Reduce a user-supplied name to a safe file-name component.
fn sanitise(name: &str) -> String {
    let component = Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if component.is_empty() {
        "file.pdf".to_string()
    } else {
        component
    }
}

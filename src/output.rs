//! Result types returned by the merge entry points.

use crate::error::SourceError;
use serde::{Deserialize, Serialize};

/// The outcome of a merge: the finished PDF plus per-run accounting.
///
/// A merge succeeds as long as at least one source made it into the output;
/// check [`MergeOutput::skipped`] for the ones that did not.
#[derive(Debug, Clone)]
pub struct MergeOutput {
    /// The merged PDF document.
    pub pdf: Vec<u8>,
    /// Aggregate counters and timings.
    pub stats: MergeStats,
    /// Sources that were skipped, in submission order.
    pub skipped: Vec<SourceError>,
}

impl MergeOutput {
    /// Treat any skipped source as an error.
    pub fn into_strict(self) -> Result<Self, SourceError> {
        match self.skipped.first() {
            Some(first) => Err(first.clone()),
            None => Ok(self),
        }
    }
}

/// Counters and timings for one merge run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeStats {
    /// Sources submitted.
    pub total_sources: usize,
    /// Sources that contributed to the output.
    pub merged_sources: usize,
    /// Sources skipped after a non-fatal failure.
    pub skipped_sources: usize,
    /// Pages in the merged document.
    pub pages: usize,
    /// Whether the page-concatenation fallback produced the output.
    pub fallback_used: bool,
    /// Wall-clock time for the whole merge.
    pub total_duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_strict_surfaces_first_skip() {
        let out = MergeOutput {
            pdf: vec![b'%'],
            stats: MergeStats {
                total_sources: 2,
                merged_sources: 1,
                skipped_sources: 1,
                pages: 1,
                fallback_used: false,
                total_duration_ms: 0,
            },
            skipped: vec![SourceError::EmptyRender {
                index: 1,
                filename: "b.pdf".into(),
            }],
        };
        assert!(out.into_strict().is_err());
    }
}

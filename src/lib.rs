//! # receiptgrid
//!
//! Merge receipt PDFs into grid-composited A4 sheets.
//!
//! ## Why this crate?
//!
//! Expense reports come in as a pile of single-receipt PDFs, each one a
//! mostly-blank page. Printing them one per sheet wastes paper and review
//! time. This crate rasterises the first page of each source, crops it to
//! the receipt region, and tiles the results into a rows×cols grid on fresh
//! A4 pages — six receipts per sheet with the default 3×2 layout.
//!
//! ## Pipeline Overview
//!
//! ```text
//! base64 PDFs
//!  │
//!  ├─ 1. Request  validate JSON shape and %PDF signatures
//!  ├─ 2. Stage    decoded sources → request-scoped temp dir
//!  ├─ 3. Render   rasterise page 1 via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 4. Layout   crop → fit-scale → center → cell placement (pure math)
//!  ├─ 5. Compose  batch into rows×cols pages, emit via printpdf
//!  └─ 6. Respond  merged PDF → base64 + size + per-source diagnostics
//! ```
//!
//! When pdfium cannot be bound at runtime the compositor is replaced by a
//! verbatim page-concatenation merge (lopdf), so the function still returns
//! a usable document.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use receiptgrid::{merge_files, MergeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MergeConfig::default(); // 3×2 grid, A4, 150 DPI
//!     let output = merge_files(&["a.pdf", "b.pdf"], &config).await?;
//!     std::fs::write("merged_receipts.pdf", &output.pdf)?;
//!     eprintln!("{} pages, {} sources skipped",
//!         output.stats.pages,
//!         output.stats.skipped_sources);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | Enables the `receiptgrid` binary (axum + clap + tracing-subscriber) |
//!
//! Disable `server` when using only the library:
//! ```toml
//! receiptgrid = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod merge;
pub mod output;
pub mod pipeline;
pub mod request;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{MergeConfig, MergeConfigBuilder};
pub use error::{MergeError, SourceError};
pub use merge::{merge, merge_files, merge_sync, SourceFile};
pub use output::{MergeOutput, MergeStats};
pub use request::{
    parse_request, parse_request_value, success_response, MergeResponse, MergedFile, RequestError,
    OUTPUT_FILENAME,
};

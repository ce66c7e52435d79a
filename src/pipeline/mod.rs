//! Pipeline stages for the receipt merge.
//!
//! Each submodule implements exactly one transformation step. Keeping the
//! stages separate makes each independently testable and keeps the geometry
//! free of any I/O.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ layout ──▶ compose
//! (staging)  (pdfium)  (geometry)  (printpdf)
//!                │
//!                └─ bind failure ──▶ fallback (lopdf concatenation)
//! ```
//!
//! 1. [`input`]    — write decoded sources into a request-scoped temp dir
//! 2. [`render`]   — rasterise the first page of each source via pdfium
//! 3. [`layout`]   — pure crop/scale/center/place math on plain geometry
//! 4. [`compose`]  — batch receipts into pages and emit the grid document
//! 5. [`fallback`] — verbatim page concatenation when rasterisation is
//!    unavailable

pub mod compose;
pub mod fallback;
pub mod input;
pub mod layout;
pub mod render;

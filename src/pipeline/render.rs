//! First-page rasterisation via pdfium.
//!
//! ## Why bind per merge?
//!
//! The pdfium library is looked up at runtime, first next to the executable
//! and then on the system library path. A failed bind is a supported state,
//! not a setup defect: the caller switches to the page-concatenation
//! fallback, mirroring environments where the native rasteriser simply is
//! not installed.

use crate::error::{MergeError, SourceError};
use crate::pipeline::input::StagedSource;
use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::debug;

/// Bind to a pdfium library.
///
/// Tries the executable's directory first so a bundled `libpdfium` wins over
/// a stale system copy.
pub fn bind() -> Result<Pdfium, MergeError> {
    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map(Pdfium::new)
        .map_err(|e| MergeError::PdfiumUnavailable(format!("{e:?}")))
}

/// Rasterise page 1 of a staged source at the given DPI.
///
/// pdfium's base unit is 72 DPI, so the page is scaled by `dpi / 72`.
/// Returns a non-fatal [`SourceError`] so the caller can skip this source
/// and continue with the rest of the batch.
pub fn rasterise_first_page(
    pdfium: &Pdfium,
    source: &StagedSource,
    dpi: u32,
) -> Result<DynamicImage, SourceError> {
    let document = pdfium
        .load_pdf_from_file(&source.path, None)
        .map_err(|e| SourceError::ParseFailed {
            index: source.index,
            filename: source.filename.clone(),
            detail: format!("{e:?}"),
        })?;

    let pages = document.pages();
    if pages.len() == 0 {
        return Err(SourceError::EmptyRender {
            index: source.index,
            filename: source.filename.clone(),
        });
    }

    let page = pages.get(0).map_err(|e| SourceError::RenderFailed {
        index: source.index,
        filename: source.filename.clone(),
        detail: format!("{e:?}"),
    })?;

    let render_config = PdfRenderConfig::new().scale_page_by_factor(dpi as f32 / 72.0);

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| SourceError::RenderFailed {
            index: source.index,
            filename: source.filename.clone(),
            detail: format!("{e:?}"),
        })?;

    let image = bitmap.as_image();
    if image.width() == 0 || image.height() == 0 {
        return Err(SourceError::EmptyRender {
            index: source.index,
            filename: source.filename.clone(),
        });
    }

    debug!(
        "Rasterised '{}' page 1 → {}x{} px",
        source.filename,
        image.width(),
        image.height()
    );

    Ok(image)
}

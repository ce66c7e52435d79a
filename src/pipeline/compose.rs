//! Grid compositor: crop, scale and place receipts onto A4 pages.
//!
//! Receipts are collected first and then drawn in batches of
//! `rows × cols`; a partial final batch becomes a final page with its
//! occupied block centered. The page writer is printpdf's ops-based API:
//! each receipt is PNG-encoded, registered as an image XObject and placed
//! with a point translation plus a pixel→point scale.

use crate::config::MergeConfig;
use crate::error::{MergeError, SourceError};
use crate::pipeline::input::StagedSource;
use crate::pipeline::layout::{self, GridGeometry};
use crate::pipeline::render;
use image::{DynamicImage, RgbImage};
use printpdf::{Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, Pt, RawImage, XObjectTransform};
use std::io::Cursor;
use tracing::{debug, info, warn};

const PT_TO_MM: f32 = 0.352_778;

/// One cropped receipt image with its target size on the page, in points.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub image: RgbImage,
    pub scaled_w: f32,
    pub scaled_h: f32,
}

/// Result of a grid composition.
#[derive(Debug)]
pub struct ComposeOutcome {
    pub pdf: Vec<u8>,
    pub placed: usize,
    pub pages: usize,
    pub skipped: Vec<SourceError>,
}

/// Rasterise, crop and place every staged source into a grid document.
///
/// Returns [`MergeError::PdfiumUnavailable`] without touching any source
/// when the rasteriser cannot be bound; the caller falls back to plain
/// concatenation in that case. Individual source failures are skipped and
/// reported in the outcome.
pub fn compose_grid(
    staged: &[StagedSource],
    config: &MergeConfig,
) -> Result<ComposeOutcome, MergeError> {
    let pdfium = render::bind()?;
    let grid = GridGeometry::from_config(config);

    let mut receipts = Vec::with_capacity(staged.len());
    let mut skipped = Vec::new();

    for source in staged {
        let page = match render::rasterise_first_page(&pdfium, source, config.dpi) {
            Ok(img) => img,
            Err(e) => {
                warn!("Skipping source: {e}");
                skipped.push(e);
                continue;
            }
        };
        receipts.push(prepare_receipt(&page, &grid, config));
    }

    if receipts.is_empty() {
        return Err(MergeError::EmptyOutput {
            total: staged.len(),
        });
    }

    let placed = receipts.len();
    let (pdf, pages) = compose_receipts(&receipts, config)?;
    info!(
        "Composed {} receipts onto {} pages ({} skipped)",
        placed,
        pages,
        skipped.len()
    );

    Ok(ComposeOutcome {
        pdf,
        placed,
        pages,
        skipped,
    })
}

/// Crop a rasterised page to the receipt region and compute its placed size.
///
/// The crop is normalised to 3-channel RGB so every embedded image uses the
/// same colour model regardless of what pdfium produced.
pub fn prepare_receipt(page: &DynamicImage, grid: &GridGeometry, config: &MergeConfig) -> Receipt {
    let (crop_w, crop_h) = layout::crop_box(
        page.width(),
        page.height(),
        config.crop_width_ratio,
        config.crop_height_ratio,
    );
    let cropped = page.crop_imm(0, 0, crop_w, crop_h).to_rgb8();

    let scale = grid.fit_scale(cropped.width(), cropped.height()) * config.enlargement;
    Receipt {
        scaled_w: cropped.width() as f32 * scale,
        scaled_h: cropped.height() as f32 * scale,
        image: cropped,
    }
}

/// Draw prepared receipts onto as many pages as needed and serialise.
///
/// Pure with respect to pdfium: callers that already hold receipt images
/// (the unit tests in particular) can exercise pagination and placement
/// without a rasteriser.
pub fn compose_receipts(
    receipts: &[Receipt],
    config: &MergeConfig,
) -> Result<(Vec<u8>, usize), MergeError> {
    if receipts.is_empty() {
        return Err(MergeError::EmptyOutput { total: 0 });
    }

    let grid = GridGeometry::from_config(config);
    let mut doc = PdfDocument::new("Merged receipts");
    let mut pages = Vec::new();

    for batch in receipts.chunks(grid.capacity()) {
        pages.push(draw_batch(&mut doc, batch, &grid)?);
    }

    let page_count = pages.len();
    doc.with_pages(pages);
    let bytes = doc.save(&PdfSaveOptions::default(), &mut Vec::new());
    Ok((bytes, page_count))
}

/// Place one batch of receipts onto a single page.
fn draw_batch(
    doc: &mut PdfDocument,
    batch: &[Receipt],
    grid: &GridGeometry,
) -> Result<PdfPage, MergeError> {
    let offsets = grid.block_offsets(batch.len());
    let mut ops = Vec::with_capacity(batch.len());
    let mut warnings = Vec::new();

    for (i, receipt) in batch.iter().enumerate() {
        let png = encode_png(&receipt.image)?;
        let raw = RawImage::decode_from_bytes(&png, &mut warnings)
            .map_err(|e| MergeError::PageWrite(format!("image embed failed: {e}")))?;
        let xobj_id = doc.add_image(&raw);

        let (x, y) = grid.place(i, offsets, receipt.scaled_w, receipt.scaled_h);

        // At dpi=72 printpdf renders 1 px = 1 pt, so scale = target_pt / px.
        let scale_x = receipt.scaled_w / receipt.image.width() as f32;
        let scale_y = receipt.scaled_h / receipt.image.height() as f32;
        debug!(
            "Placing receipt {} at ({:.1}, {:.1}) pt, {:.1}x{:.1} pt",
            i, x, y, receipt.scaled_w, receipt.scaled_h
        );

        ops.push(Op::UseXobject {
            id: xobj_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(x)),
                translate_y: Some(Pt(y)),
                dpi: Some(72.0),
                scale_x: Some(scale_x),
                scale_y: Some(scale_y),
                rotate: None,
            },
        });
    }

    Ok(PdfPage::new(
        Mm(grid.page_width * PT_TO_MM),
        Mm(grid.page_height * PT_TO_MM),
        ops,
    ))
}

/// PNG-encode a cropped receipt for embedding.
///
/// PNG keeps the rendered text crisp; JPEG artefacts on 150 DPI receipt
/// print are clearly visible after the grid shrink.
fn encode_png(image: &RgbImage) -> Result<Vec<u8>, MergeError> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(image.clone())
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| MergeError::PageWrite(format!("PNG encode failed: {e}")))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn test_receipt(w: u32, h: u32) -> Receipt {
        let grid = GridGeometry::from_config(&MergeConfig::default());
        let scale = grid.fit_scale(w, h) * 1.08;
        Receipt {
            image: RgbImage::from_pixel(w, h, Rgb([200, 200, 200])),
            scaled_w: w as f32 * scale,
            scaled_h: h as f32 * scale,
        }
    }

    fn page_count(pdf: &[u8]) -> usize {
        lopdf::Document::load_mem(pdf).unwrap().get_pages().len()
    }

    #[test]
    fn seven_receipts_fill_two_pages() {
        let receipts: Vec<_> = (0..7).map(|_| test_receipt(40, 60)).collect();
        let (pdf, pages) = compose_receipts(&receipts, &MergeConfig::default()).unwrap();
        assert_eq!(pages, 2);
        assert!(pdf.starts_with(b"%PDF"));
        assert_eq!(page_count(&pdf), 2);
    }

    #[test]
    fn six_receipts_fit_one_page() {
        let receipts: Vec<_> = (0..6).map(|_| test_receipt(40, 60)).collect();
        let (_, pages) = compose_receipts(&receipts, &MergeConfig::default()).unwrap();
        assert_eq!(pages, 1);
    }

    #[test]
    fn single_receipt_makes_one_page() {
        let (pdf, pages) =
            compose_receipts(&[test_receipt(30, 80)], &MergeConfig::default()).unwrap();
        assert_eq!(pages, 1);
        assert_eq!(page_count(&pdf), 1);
    }

    #[test]
    fn custom_grid_changes_pagination() {
        let config = MergeConfig::builder().grid(2, 2).build().unwrap();
        let receipts: Vec<_> = (0..7).map(|_| test_receipt(40, 60)).collect();
        let (_, pages) = compose_receipts(&receipts, &config).unwrap();
        assert_eq!(pages, 2);
    }

    #[test]
    fn no_receipts_is_an_error() {
        let err = compose_receipts(&[], &MergeConfig::default()).unwrap_err();
        assert!(matches!(err, MergeError::EmptyOutput { .. }));
    }

    #[test]
    fn prepare_receipt_crops_and_scales() {
        let config = MergeConfig::default();
        let grid = GridGeometry::from_config(&config);
        // A 150 DPI A4 render is roughly 1240x1754 px.
        let page = DynamicImage::ImageRgb8(RgbImage::from_pixel(1240, 1754, Rgb([255, 255, 255])));
        let receipt = prepare_receipt(&page, &grid, &config);

        assert_eq!(receipt.image.width(), 620);
        assert_eq!(receipt.image.height(), 1276);

        let max_scale =
            f32::min(
                grid.cell.width / 620.0,
                grid.cell.height / 1276.0,
            ) * config.enlargement;
        assert!((receipt.scaled_w - 620.0 * max_scale).abs() < 1e-3);
        assert!((receipt.scaled_h - 1276.0 * max_scale).abs() < 1e-3);
    }
}

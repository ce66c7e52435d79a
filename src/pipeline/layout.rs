//! Grid geometry: the crop/scale/center/place math for receipt cells.
//!
//! Everything here operates on plain widths, heights and offsets so the
//! placement rules can be unit-tested without touching pdfium, printpdf or
//! the file system. The compositor feeds pixel dimensions in and gets point
//! coordinates back.
//!
//! ## Coordinate systems
//!
//! Rasterised images use a top-left origin; the page writer uses the PDF
//! convention of a bottom-left origin. [`GridGeometry::place`] measures the
//! vertical position from the page top downward and flips the axis at the
//! end, so a receipt in row 0 lands at the top of the sheet.

use crate::config::MergeConfig;

/// A4 portrait width in points.
pub const A4_WIDTH_PT: f32 = 595.27;
/// A4 portrait height in points.
pub const A4_HEIGHT_PT: f32 = 841.89;

/// Dimensions of one grid cell in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellSize {
    pub width: f32,
    pub height: f32,
}

/// The fixed page-and-grid frame every batch is drawn against.
///
/// Constructed once per merge from [`MergeConfig`]; the cell size already
/// reserves padding on both sides of every cell, outer margins included.
#[derive(Debug, Clone, Copy)]
pub struct GridGeometry {
    pub rows: usize,
    pub cols: usize,
    pub h_padding: f32,
    pub v_padding: f32,
    pub page_width: f32,
    pub page_height: f32,
    pub cell: CellSize,
}

impl GridGeometry {
    pub fn new(
        rows: usize,
        cols: usize,
        h_padding: f32,
        v_padding: f32,
        page_width: f32,
        page_height: f32,
    ) -> Self {
        let cell = CellSize {
            width: (page_width - (cols as f32 + 1.0) * h_padding) / cols as f32,
            height: (page_height - (rows as f32 + 1.0) * v_padding) / rows as f32,
        };
        Self {
            rows,
            cols,
            h_padding,
            v_padding,
            page_width,
            page_height,
            cell,
        }
    }

    pub fn from_config(config: &MergeConfig) -> Self {
        Self::new(
            config.rows,
            config.cols,
            config.h_padding,
            config.v_padding,
            config.page_width,
            config.page_height,
        )
    }

    /// Receipts per output page.
    pub fn capacity(&self) -> usize {
        self.rows * self.cols
    }

    /// Uniform scale that fits a cropped image inside one cell while
    /// preserving aspect ratio. The enlargement bias is applied by the
    /// caller on top of this.
    pub fn fit_scale(&self, cropped_w: u32, cropped_h: u32) -> f32 {
        f32::min(
            self.cell.width / cropped_w as f32,
            self.cell.height / cropped_h as f32,
        )
    }

    /// Rows and columns actually occupied by a batch of `count` receipts.
    ///
    /// A partial final page occupies fewer cells than the full grid, and the
    /// occupied block — not the full grid — is what gets centered.
    pub fn occupied(&self, count: usize) -> (usize, usize) {
        (count.div_ceil(self.cols), count.min(self.cols))
    }

    /// Centering offsets for the occupied block of a `count`-receipt batch.
    ///
    /// `count` must be ≥ 1; an empty batch is never drawn.
    pub fn block_offsets(&self, count: usize) -> (f32, f32) {
        let (rows, cols) = self.occupied(count);
        let block_w = cols as f32 * self.cell.width + (cols as f32 - 1.0) * self.h_padding;
        let block_h = rows as f32 * self.cell.height + (rows as f32 - 1.0) * self.v_padding;
        (
            (self.page_width - block_w) / 2.0,
            (self.page_height - block_h) / 2.0,
        )
    }

    /// Bottom-left corner, in page points, of the receipt at batch index
    /// `index` scaled to `scaled_w` × `scaled_h`.
    ///
    /// The receipt is centered within its cell. `offsets` comes from
    /// [`Self::block_offsets`] for the same batch.
    pub fn place(
        &self,
        index: usize,
        offsets: (f32, f32),
        scaled_w: f32,
        scaled_h: f32,
    ) -> (f32, f32) {
        let row = (index / self.cols) as f32;
        let col = (index % self.cols) as f32;

        let x = offsets.0
            + col * (self.cell.width + self.h_padding)
            + (self.cell.width - scaled_w) / 2.0;

        // Measured from the page top, then flipped to the bottom-left origin.
        let y = self.page_height
            - (offsets.1 + (row + 1.0) * (self.cell.height + self.v_padding))
            + self.v_padding
            + (self.cell.height - scaled_h) / 2.0;

        (x, y)
    }
}

/// Fixed top-left crop region of a rasterised page, clamped to the image.
///
/// Receipts are printed in the left half of the page and stop short of the
/// bottom edge; the ratios come from [`MergeConfig`].
pub fn crop_box(width: u32, height: u32, width_ratio: f32, height_ratio: f32) -> (u32, u32) {
    let crop_w = (width as f32 * width_ratio) as u32;
    let crop_h = (height as f32 * height_ratio) as u32;
    (crop_w.clamp(1, width.max(1)), crop_h.clamp(1, height.max(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_grid() -> GridGeometry {
        GridGeometry::new(3, 2, 20.0, 20.0, A4_WIDTH_PT, A4_HEIGHT_PT)
    }

    #[test]
    fn cell_size_reserves_padding_on_all_sides() {
        let g = default_grid();
        // (595.27 - 3*20) / 2 and (841.89 - 4*20) / 3
        assert!((g.cell.width - 267.635).abs() < 1e-3, "got {}", g.cell.width);
        assert!((g.cell.height - 253.963_33).abs() < 1e-3, "got {}", g.cell.height);
        // Two columns, three gutters; three rows, four gutters.
        assert!(
            (2.0 * g.cell.width + 3.0 * g.h_padding - A4_WIDTH_PT).abs() < 1e-3
        );
        assert!(
            (3.0 * g.cell.height + 4.0 * g.v_padding - A4_HEIGHT_PT).abs() < 1e-3
        );
    }

    #[test]
    fn fit_scale_never_exceeds_cell_ratio() {
        let g = default_grid();
        for (w, h) in [(100, 100), (620, 903), (1, 2000), (2000, 1)] {
            let s = g.fit_scale(w, h);
            assert!(s <= g.cell.width / w as f32 + 1e-6);
            assert!(s <= g.cell.height / h as f32 + 1e-6);
            // The tighter axis is met exactly.
            let fitted_w = s * w as f32;
            let fitted_h = s * h as f32;
            assert!(
                (fitted_w - g.cell.width).abs() < 1e-3 || (fitted_h - g.cell.height).abs() < 1e-3
            );
        }
    }

    #[test]
    fn occupied_cells_for_partial_batches() {
        let g = default_grid();
        assert_eq!(g.capacity(), 6);
        assert_eq!(g.occupied(6), (3, 2));
        assert_eq!(g.occupied(1), (1, 1));
        assert_eq!(g.occupied(3), (2, 2));
        assert_eq!(g.occupied(5), (3, 2));
    }

    #[test]
    fn full_batch_is_centered_on_page() {
        let g = default_grid();
        let (off_x, off_y) = g.block_offsets(6);
        // Full grid: the block excludes the two outer gutters, so exactly one
        // padding's worth of whitespace remains on each side.
        assert!((off_x - g.h_padding).abs() < 1e-3, "off_x {off_x}");
        assert!((off_y - g.v_padding).abs() < 1e-3, "off_y {off_y}");
    }

    #[test]
    fn single_receipt_is_centered_alone() {
        let g = default_grid();
        let (off_x, off_y) = g.block_offsets(1);
        assert!(((off_x * 2.0 + g.cell.width) - g.page_width).abs() < 1e-3);
        assert!(((off_y * 2.0 + g.cell.height) - g.page_height).abs() < 1e-3);

        // A receipt exactly cell-sized sits symmetrically on the page.
        let (x, y) = g.place(0, (off_x, off_y), g.cell.width, g.cell.height);
        assert!((x - off_x).abs() < 1e-3);
        let top_gap = g.page_height - (y + g.cell.height);
        let bottom_gap = y;
        assert!((top_gap - bottom_gap).abs() < 1e-3);
    }

    #[test]
    fn placement_stays_within_cell_plus_enlargement() {
        let g = default_grid();
        let enlargement = 1.08;
        let offsets = g.block_offsets(6);
        for (i, (w, h)) in [(500u32, 700u32); 6].iter().enumerate() {
            let scale = g.fit_scale(*w, *h) * enlargement;
            let (sw, sh) = (*w as f32 * scale, *h as f32 * scale);
            let (x, y) = g.place(i, offsets, sw, sh);

            let col = (i % g.cols) as f32;
            let cell_left = offsets.0 + col * (g.cell.width + g.h_padding);
            // Overhang on either side is at most half the enlargement
            // allowance per axis.
            let allowance = (enlargement - 1.0) * g.cell.width / 2.0 + 1e-3;
            assert!(x >= cell_left - allowance, "receipt {i} left overhang");
            assert!(
                x + sw <= cell_left + g.cell.width + allowance,
                "receipt {i} right overhang"
            );
            assert!(y > 0.0 && y + sh < g.page_height);
        }
    }

    #[test]
    fn rows_stack_top_down() {
        let g = default_grid();
        let offsets = g.block_offsets(6);
        let (_, y_row0) = g.place(0, offsets, 100.0, 100.0);
        let (_, y_row1) = g.place(2, offsets, 100.0, 100.0);
        let (_, y_row2) = g.place(4, offsets, 100.0, 100.0);
        assert!(y_row0 > y_row1 && y_row1 > y_row2);

        let (x_col0, _) = g.place(0, offsets, 100.0, 100.0);
        let (x_col1, _) = g.place(1, offsets, 100.0, 100.0);
        assert!(x_col1 > x_col0);
        assert!((x_col1 - x_col0 - (g.cell.width + g.h_padding)).abs() < 1e-3);
    }

    #[test]
    fn crop_box_takes_left_half_and_upper_region() {
        assert_eq!(crop_box(1240, 1754, 0.5, 0.7275), (620, 1276));
        // Odd width floors like integer division would.
        assert_eq!(crop_box(7, 100, 0.5, 0.7275), (3, 72));
        // Degenerate images clamp to at least one pixel.
        assert_eq!(crop_box(1, 1, 0.5, 0.7275), (1, 1));
    }
}

//! Configuration for a receipt merge.
//!
//! Every knob lives in [`MergeConfig`], built via its builder or taken as
//! [`MergeConfig::default()`]. The defaults reproduce the production layout:
//! a 3×2 grid on A4 with 20 pt gutters, sources rasterised at 150 DPI.

use crate::error::MergeError;
use crate::pipeline::layout::{A4_HEIGHT_PT, A4_WIDTH_PT};
use serde::{Deserialize, Serialize};

/// Configuration for merging receipt PDFs into a grid-composited document.
///
/// # Example
/// ```rust
/// use receiptgrid::MergeConfig;
///
/// let config = MergeConfig::builder()
///     .grid(3, 2)
///     .dpi(150)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Grid rows per output page. Default: 3.
    pub rows: usize,

    /// Grid columns per output page. Default: 2.
    pub cols: usize,

    /// Horizontal gutter between cells and at the page edges, in points. Default: 20.
    pub h_padding: f32,

    /// Vertical gutter between cells and at the page edges, in points. Default: 20.
    pub v_padding: f32,

    /// Output page width in points. Default: A4 portrait (595.27).
    pub page_width: f32,

    /// Output page height in points. Default: A4 portrait (841.89).
    pub page_height: f32,

    /// Rasterisation DPI for source pages. Range: 72–400. Default: 150.
    ///
    /// 150 DPI keeps receipt text legible after the crop-and-shrink while the
    /// intermediate bitmaps stay small enough for a serverless memory budget.
    pub dpi: u32,

    /// Enlargement bias applied on top of the aspect-preserving fit scale. Default: 1.08.
    ///
    /// Receipts carry generous white margins of their own; letting them
    /// overrun the cell by a few percent wastes less paper without clipping
    /// any printed content.
    pub enlargement: f32,

    /// Fraction of the rasterised page width kept by the crop. Default: 0.5.
    pub crop_width_ratio: f32,

    /// Fraction of the rasterised page height kept by the crop. Default: 0.7275.
    pub crop_height_ratio: f32,

    /// Skip rasterisation entirely and concatenate source pages verbatim. Default: false.
    ///
    /// The same path is taken automatically when the pdfium library cannot be
    /// bound at runtime; this flag forces it, which is also what the
    /// integration tests use on hosts without pdfium.
    pub force_fallback: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            rows: 3,
            cols: 2,
            h_padding: 20.0,
            v_padding: 20.0,
            page_width: A4_WIDTH_PT,
            page_height: A4_HEIGHT_PT,
            dpi: 150,
            enlargement: 1.08,
            crop_width_ratio: 0.5,
            crop_height_ratio: 0.7275,
            force_fallback: false,
        }
    }
}

impl MergeConfig {
    /// Create a new builder for `MergeConfig`.
    pub fn builder() -> MergeConfigBuilder {
        MergeConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`MergeConfig`].
#[derive(Debug)]
pub struct MergeConfigBuilder {
    config: MergeConfig,
}

impl MergeConfigBuilder {
    pub fn grid(mut self, rows: usize, cols: usize) -> Self {
        self.config.rows = rows;
        self.config.cols = cols;
        self
    }

    pub fn padding(mut self, h_padding: f32, v_padding: f32) -> Self {
        self.config.h_padding = h_padding;
        self.config.v_padding = v_padding;
        self
    }

    pub fn page_size(mut self, width_pt: f32, height_pt: f32) -> Self {
        self.config.page_width = width_pt;
        self.config.page_height = height_pt;
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn enlargement(mut self, factor: f32) -> Self {
        self.config.enlargement = factor;
        self
    }

    pub fn crop_ratios(mut self, width_ratio: f32, height_ratio: f32) -> Self {
        self.config.crop_width_ratio = width_ratio;
        self.config.crop_height_ratio = height_ratio;
        self
    }

    pub fn force_fallback(mut self, v: bool) -> Self {
        self.config.force_fallback = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<MergeConfig, MergeError> {
        let c = &self.config;
        if c.rows == 0 || c.cols == 0 {
            return Err(MergeError::InvalidConfig(format!(
                "Grid must have at least one cell, got {}×{}",
                c.rows, c.cols
            )));
        }
        if !(72..=400).contains(&c.dpi) {
            return Err(MergeError::InvalidConfig(format!(
                "DPI must be 72–400, got {}",
                c.dpi
            )));
        }
        if c.h_padding < 0.0 || c.v_padding < 0.0 {
            return Err(MergeError::InvalidConfig("Padding must be ≥ 0".into()));
        }
        if (c.cols as f32 + 1.0) * c.h_padding >= c.page_width
            || (c.rows as f32 + 1.0) * c.v_padding >= c.page_height
        {
            return Err(MergeError::InvalidConfig(
                "Padding leaves no room for cells on the page".into(),
            ));
        }
        if !(0.0..=1.0).contains(&c.crop_width_ratio)
            || !(0.0..=1.0).contains(&c.crop_height_ratio)
            || c.crop_width_ratio == 0.0
            || c.crop_height_ratio == 0.0
        {
            return Err(MergeError::InvalidConfig(
                "Crop ratios must be within (0, 1]".into(),
            ));
        }
        if c.enlargement <= 0.0 {
            return Err(MergeError::InvalidConfig(
                "Enlargement factor must be positive".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_layout() {
        let c = MergeConfig::default();
        assert_eq!((c.rows, c.cols), (3, 2));
        assert_eq!(c.dpi, 150);
        assert!((c.enlargement - 1.08).abs() < f32::EPSILON);
        assert!((c.crop_height_ratio - 0.7275).abs() < f32::EPSILON);
        assert!(!c.force_fallback);
    }

    #[test]
    fn builder_clamps_dpi() {
        let c = MergeConfig::builder().dpi(9000).build().unwrap();
        assert_eq!(c.dpi, 400);
        let c = MergeConfig::builder().dpi(10).build().unwrap();
        assert_eq!(c.dpi, 72);
    }

    #[test]
    fn zero_cell_grid_is_rejected() {
        assert!(MergeConfig::builder().grid(0, 2).build().is_err());
        assert!(MergeConfig::builder().grid(3, 0).build().is_err());
    }

    #[test]
    fn oversized_padding_is_rejected() {
        assert!(MergeConfig::builder().padding(300.0, 20.0).build().is_err());
    }

    #[test]
    fn degenerate_crop_is_rejected() {
        assert!(MergeConfig::builder().crop_ratios(0.0, 0.7).build().is_err());
        assert!(MergeConfig::builder().crop_ratios(0.5, 1.5).build().is_err());
    }
}

//! Grid calibration: rectify a photo of the printed 1 cm grid and derive the
//! pixel-to-centimetre scale along each axis.
//!
//! Pipeline (`GridCalibrator::calibrate_image`):
//! 1. Boundary: CLAHE → Canny → 3×3 close → largest contour → Douglas–Peucker.
//!    A quadrilateral is rectified with a four-point homography; anything
//!    else falls back to the source image (warning, not failure).
//! 2. Lines: union of nine Canny maps → Hough segment search over nine
//!    (min length, max gap) settings → vertical / horizontal classification.
//! 3. Scale: adaptive 1-D clustering of line coordinates, gaps above the
//!    noise floor, median gap per axis = px/cm.

pub mod boundary;
pub mod options;

pub use boundary::{find_grid_quad, rectify, Rectification};
pub use options::CalibrationOptions;

use crate::diagnostics::{StageTimer, TimingBreakdown, Warning, WarningLog};
use crate::edges::multi_canny;
use crate::error::{CalibrationError, MeasureResult};
use crate::grid::{cluster_coords, filtered_gaps, median};
use crate::image::io::load_color_image;
use crate::image::GrayImageU8;
use crate::segments::{classify_segments, find_segments_multi, Classified};
use image::RgbImage;
use nalgebra::Matrix3;
use serde::Serialize;
use std::path::Path;

const TARGET: &str = "GridCalibrator";

/// Calibrated, rectified view of one photo.
#[derive(Clone, Debug)]
pub struct CalibrationFrame {
    pub source: RgbImage,
    pub rectified: RgbImage,
    pub homography: Matrix3<f64>,
    pub px_per_cm_x: f64,
    pub px_per_cm_y: f64,
    /// Mean of the two axis estimates.
    pub px_per_cm: f64,
    /// Clustered vertical grid-line positions (rectified x).
    pub xs: Vec<i32>,
    /// Clustered horizontal grid-line positions (rectified y).
    pub ys: Vec<i32>,
    pub warnings: WarningLog,
    pub boundary: Option<[[f64; 2]; 4]>,
    pub timing: TimingBreakdown,
}

impl CalibrationFrame {
    pub fn grid_ratio(&self) -> f64 {
        self.px_per_cm_x / self.px_per_cm_y
    }

    pub fn summary(&self) -> CalibrationSummary {
        CalibrationSummary {
            source_size: [self.source.width(), self.source.height()],
            rectified_size: [self.rectified.width(), self.rectified.height()],
            homography: self.homography,
            boundary: self.boundary,
            px_per_cm_x: self.px_per_cm_x,
            px_per_cm_y: self.px_per_cm_y,
            px_per_cm: self.px_per_cm,
            xs: self.xs.clone(),
            ys: self.ys.clone(),
            warnings: self.warnings.clone(),
            timing: self.timing.clone(),
        }
    }
}

/// Serializable view of a [`CalibrationFrame`] without pixel data.
#[derive(Clone, Debug, Serialize)]
pub struct CalibrationSummary {
    pub source_size: [u32; 2],
    pub rectified_size: [u32; 2],
    pub homography: Matrix3<f64>,
    pub boundary: Option<[[f64; 2]; 4]>,
    pub px_per_cm_x: f64,
    pub px_per_cm_y: f64,
    pub px_per_cm: f64,
    pub xs: Vec<i32>,
    pub ys: Vec<i32>,
    pub warnings: WarningLog,
    pub timing: TimingBreakdown,
}

/// Clustered line positions and per-axis spacing.
#[derive(Clone, Debug, PartialEq)]
pub struct GridScale {
    pub xs: Vec<i32>,
    pub ys: Vec<i32>,
    pub px_per_cm_x: f64,
    pub px_per_cm_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct GridCalibrator {
    pub opts: CalibrationOptions,
}

impl GridCalibrator {
    pub fn new(opts: CalibrationOptions) -> Self {
        Self { opts }
    }

    /// Load `path` (rescaled by `scale_percent`) and calibrate it.
    pub fn calibrate_path(&self, path: &Path) -> MeasureResult<CalibrationFrame> {
        let source = load_color_image(path, self.opts.scale_percent)?;
        log::debug!(
            "{TARGET}::calibrate_path {} ({}x{})",
            path.display(),
            source.width(),
            source.height()
        );
        self.calibrate_image(source)
    }

    pub fn calibrate_image(&self, source: RgbImage) -> MeasureResult<CalibrationFrame> {
        if source.width() == 0 || source.height() == 0 {
            return Err(CalibrationError::EmptyImage.into());
        }
        let mut timer = StageTimer::start();
        let mut warnings = WarningLog::new();

        let rect = rectify(&source, &self.opts, &mut warnings);
        timer.lap("rectify");

        let lines = self.detect_grid_lines(&rect.image)?;
        timer.lap("grid_lines");

        let scale = self.grid_scale(&lines)?;
        let ratio = scale.px_per_cm_x / scale.px_per_cm_y;
        if !(self.opts.ratio_range[0]..=self.opts.ratio_range[1]).contains(&ratio) {
            warnings.raise(TARGET, Warning::GridDistorted { ratio });
        }
        let px_per_cm = 0.5 * (scale.px_per_cm_x + scale.px_per_cm_y);
        timer.lap("grid_scale");

        log::debug!(
            "{TARGET}::calibrate_image px/cm x={:.2} y={:.2} mean={:.2} ({} x-lines, {} y-lines)",
            scale.px_per_cm_x,
            scale.px_per_cm_y,
            px_per_cm,
            scale.xs.len(),
            scale.ys.len()
        );

        Ok(CalibrationFrame {
            source,
            rectified: rect.image,
            homography: rect.homography,
            px_per_cm_x: scale.px_per_cm_x,
            px_per_cm_y: scale.px_per_cm_y,
            px_per_cm,
            xs: scale.xs,
            ys: scale.ys,
            warnings,
            boundary: rect.corners,
            timing: timer.finish(),
        })
    }

    /// Vertical and horizontal segments in a rectified image.
    pub fn detect_grid_lines(&self, rectified: &RgbImage) -> Result<Classified, CalibrationError> {
        let gray = GrayImageU8::from_rgb(rectified);
        let edges = multi_canny(&gray.as_view(), &self.opts.line_canny_pairs());
        let segments = find_segments_multi(&edges, &self.opts.hough, &self.opts.segment_searches());
        if segments.is_empty() {
            return Err(CalibrationError::NoGridLines);
        }
        let classified = classify_segments(&segments, self.opts.axis_tolerance_px);
        log::debug!(
            "{TARGET}::detect_grid_lines {} segments: {} vertical, {} horizontal",
            segments.len(),
            classified.vertical.len(),
            classified.horizontal.len()
        );
        Ok(classified)
    }

    /// Cluster line coordinates and take the median filtered gap per axis.
    pub fn grid_scale(&self, lines: &Classified) -> Result<GridScale, CalibrationError> {
        let xs = cluster_coords(&lines.vertical_xs(), &self.opts.cluster);
        let ys = cluster_coords(&lines.horizontal_ys(), &self.opts.cluster);
        let x_gaps = filtered_gaps(&xs, self.opts.min_gap_px);
        let y_gaps = filtered_gaps(&ys, self.opts.min_gap_px);
        match (median(&x_gaps), median(&y_gaps)) {
            (Some(px_per_cm_x), Some(px_per_cm_y)) => Ok(GridScale {
                xs,
                ys,
                px_per_cm_x,
                px_per_cm_y,
            }),
            _ => Err(CalibrationError::InsufficientLineSpacing {
                x_gaps: x_gaps.len(),
                y_gaps: y_gaps.len(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segments::LineSegment;

    fn classified(xs: &[i32], ys: &[i32]) -> Classified {
        Classified {
            vertical: xs.iter().map(|&x| LineSegment::new([x, 0], [x + 1, 200])).collect(),
            horizontal: ys.iter().map(|&y| LineSegment::new([0, y], [200, y])).collect(),
        }
    }

    #[test]
    fn grid_scale_takes_median_gap() {
        let cal = GridCalibrator::default();
        let lines = classified(&[40, 80, 120, 160, 200], &[30, 72, 114, 156]);
        let scale = cal.grid_scale(&lines).unwrap();
        assert_eq!(scale.xs, vec![40, 80, 120, 160, 200]);
        assert_eq!(scale.px_per_cm_x, 40.0);
        assert_eq!(scale.px_per_cm_y, 42.0);
    }

    #[test]
    fn narrow_gaps_are_insufficient() {
        let cal = GridCalibrator::default();
        // Horizontal lines all closer than the noise floor collapse/filter out.
        let lines = classified(&[40, 80, 120], &[30, 45]);
        let err = cal.grid_scale(&lines).unwrap_err();
        assert!(matches!(
            err,
            CalibrationError::InsufficientLineSpacing { y_gaps: 0, .. }
        ));
    }

    #[test]
    fn empty_image_is_rejected() {
        let cal = GridCalibrator::default();
        let err = cal.calibrate_image(RgbImage::new(0, 0)).unwrap_err();
        assert!(matches!(
            err,
            crate::error::MeasureError::Calibration(CalibrationError::EmptyImage)
        ));
    }
}

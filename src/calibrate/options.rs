use crate::edges::CannyThresholds;
use crate::grid::ClusterOptions;
use crate::image::clahe::ClaheOptions;
use crate::segments::{HoughOptions, SegmentSearch};
use serde::Deserialize;

/// Parameters of the grid calibrator.
///
/// Defaults reproduce the reference setup: CLAHE (2.0, 8×8) and Canny
/// (30, 150) for the boundary, nine Canny pairs and nine Hough searches for
/// the grid lines, 15 px axis tolerance, 20 px noise floor on line gaps.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CalibrationOptions {
    /// Resize percentage applied on load (100 = unchanged).
    pub scale_percent: u32,
    pub boundary_clahe: ClaheOptions,
    pub boundary_canny: CannyThresholds,
    /// Square kernel for the dilate-then-erode gap closing.
    pub boundary_close_px: usize,
    /// Douglas–Peucker tolerance as a fraction of the contour perimeter.
    pub approx_epsilon_fraction: f64,
    /// Accepted rectified W/H range before a skew warning.
    pub aspect_range: [f64; 2],
    pub line_canny_lows: Vec<f32>,
    pub line_canny_highs: Vec<f32>,
    pub hough: HoughOptions,
    pub min_line_lengths: Vec<f32>,
    pub max_line_gaps: Vec<usize>,
    /// Max endpoint delta for a segment to count as vertical/horizontal.
    pub axis_tolerance_px: i32,
    pub cluster: ClusterOptions,
    /// Gaps at or below this are treated as noise.
    pub min_gap_px: i32,
    /// Accepted px/cm X/Y ratio before a distortion warning.
    pub ratio_range: [f64; 2],
}

impl Default for CalibrationOptions {
    fn default() -> Self {
        Self {
            scale_percent: 100,
            boundary_clahe: ClaheOptions::default(),
            boundary_canny: CannyThresholds::new(30.0, 150.0),
            boundary_close_px: 3,
            approx_epsilon_fraction: 0.02,
            aspect_range: [0.8, 1.2],
            line_canny_lows: vec![30.0, 50.0, 70.0],
            line_canny_highs: vec![100.0, 150.0, 200.0],
            hough: HoughOptions::default(),
            min_line_lengths: vec![80.0, 100.0, 120.0],
            max_line_gaps: vec![5, 10, 15],
            axis_tolerance_px: 15,
            cluster: ClusterOptions::default(),
            min_gap_px: 20,
            ratio_range: [0.9, 1.1],
        }
    }
}

impl CalibrationOptions {
    pub fn line_canny_pairs(&self) -> Vec<CannyThresholds> {
        CannyThresholds::grid(&self.line_canny_lows, &self.line_canny_highs)
    }

    pub fn segment_searches(&self) -> Vec<SegmentSearch> {
        SegmentSearch::grid(&self.min_line_lengths, &self.max_line_gaps)
    }
}

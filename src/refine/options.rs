use crate::edges::CannyThresholds;
use crate::image::bilateral::BilateralOptions;
use crate::image::clahe::ClaheOptions;
use crate::types::{MeasurementKind, RefineAxis};
use serde::{Deserialize, Serialize};

/// Parameters of the edge refiner for one procedure.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineOptions {
    pub clahe: ClaheOptions,
    pub bilateral: BilateralOptions,
    pub canny_lows: Vec<f32>,
    pub canny_highs: Vec<f32>,
    /// Length of the directional closing kernel (1×n for the bottom edge,
    /// n×1 for the vertical extent).
    pub close_len: usize,
    /// Contours at or below this area are ignored unless nothing else is left.
    pub min_contour_area: f64,
    /// Fraction of the box height searched for the bottom edge.
    pub roi_fraction: f64,
    /// Rows above a contour's lower half that still count as bottom edge, so
    /// the sides reach the corners that smoothing rounds off.
    pub corner_band_px: i32,
}

impl Default for RefineOptions {
    fn default() -> Self {
        Self::bottom_edge()
    }
}

impl RefineOptions {
    /// Bottom-edge width on a top view.
    pub fn bottom_edge() -> Self {
        Self {
            clahe: ClaheOptions::with_clip(3.0),
            bilateral: BilateralOptions::default(),
            canny_lows: vec![20.0, 40.0, 60.0],
            canny_highs: vec![80.0, 120.0, 160.0],
            close_len: 5,
            min_contour_area: 10.0,
            roi_fraction: 0.25,
            corner_band_px: 6,
        }
    }

    pub fn vertical_extent() -> Self {
        Self {
            min_contour_area: 20.0,
            ..Self::bottom_edge()
        }
    }

    /// Bottom edge on the reflective side view; lower Canny thresholds.
    pub fn side_view() -> Self {
        Self {
            canny_lows: vec![15.0, 30.0, 45.0],
            canny_highs: vec![60.0, 100.0, 140.0],
            ..Self::bottom_edge()
        }
    }

    pub fn for_axis(axis: RefineAxis) -> Self {
        match axis {
            RefineAxis::BottomEdge => Self::bottom_edge(),
            RefineAxis::VerticalExtent => Self::vertical_extent(),
        }
    }

    /// Preset for a measured dimension; depth uses the side-view thresholds.
    pub fn for_kind(kind: MeasurementKind) -> Self {
        match kind {
            MeasurementKind::Depth => Self::side_view(),
            _ => Self::for_axis(kind.refine_axis()),
        }
    }

    pub fn canny_pairs(&self) -> Vec<CannyThresholds> {
        CannyThresholds::grid(&self.canny_lows, &self.canny_highs)
    }
}

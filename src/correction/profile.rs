//! Per-procedure correction tables.
//!
//! The three procedures were tuned independently and their tables differ on
//! purpose; presets keep them separate.
use crate::types::MeasurementKind;
use serde::{Deserialize, Serialize};

/// Nominal piece size chosen when the estimate falls inside `[min, max]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferenceBand {
    pub nominal: f64,
    pub min: f64,
    pub max: f64,
}

impl ReferenceBand {
    pub const fn new(nominal: f64, min: f64, max: f64) -> Self {
        Self { nominal, min, max }
    }

    pub fn contains(&self, v: f64) -> bool {
        (self.min..=self.max).contains(&v)
    }
}

/// Piecewise-linear perspective compensation on the box aspect ratio.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AngleRule {
    pub center_low: f64,
    pub center_high: f64,
    pub below_pivot: f64,
    pub below_slope: f64,
    pub above_pivot: f64,
    pub above_slope: f64,
}

impl AngleRule {
    pub fn factor(&self, aspect: f64) -> f64 {
        if aspect < self.center_low {
            1.0 + (self.below_pivot - aspect) * self.below_slope
        } else if aspect > self.center_high {
            1.0 - (aspect - self.above_pivot) * self.above_slope
        } else {
            1.0
        }
    }
}

/// Empirical factor applied when the aspect ratio lies in `[min, max]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurfaceBucket {
    pub min: f64,
    pub max: f64,
    pub factor: f64,
}

impl SurfaceBucket {
    pub const fn new(min: f64, max: f64, factor: f64) -> Self {
        Self { min, max, factor }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionProfile {
    /// Checked in order; first match wins.
    pub bands: Vec<ReferenceBand>,
    /// Estimates outside every band but inside this range snap to `snap_step`.
    pub plausible_range: [f64; 2],
    pub snap_step: f64,
    /// Reference used for implausible estimates.
    pub fallback_cm: f64,
    pub angle: AngleRule,
    /// Weight of the axis crossed by more grid lines.
    pub major_weight: f64,
    /// Checked in order; first match wins, none means 1.0.
    pub buckets: Vec<SurfaceBucket>,
}

impl Default for CorrectionProfile {
    fn default() -> Self {
        Self::width()
    }
}

const TOP_VIEW_ANGLE: AngleRule = AngleRule {
    center_low: 0.8,
    center_high: 1.2,
    below_pivot: 1.0,
    below_slope: 0.2,
    above_pivot: 1.0,
    above_slope: 0.1,
};

impl CorrectionProfile {
    pub fn width() -> Self {
        Self {
            bands: vec![ReferenceBand::new(5.0, 4.8, 5.2)],
            plausible_range: [2.0, 10.0],
            snap_step: 0.5,
            fallback_cm: 5.0,
            angle: TOP_VIEW_ANGLE,
            major_weight: 0.7,
            buckets: vec![
                SurfaceBucket::new(0.85, 0.95, 1.04),
                SurfaceBucket::new(1.1, 1.2, 0.98),
            ],
        }
    }

    pub fn height() -> Self {
        Self {
            bands: vec![
                ReferenceBand::new(5.0, 4.8, 5.2),
                ReferenceBand::new(7.5, 7.2, 7.8),
            ],
            buckets: vec![
                SurfaceBucket::new(0.85, 0.95, 1.05),
                SurfaceBucket::new(1.1, 1.2, 1.02),
            ],
            ..Self::width()
        }
    }

    pub fn depth() -> Self {
        Self {
            bands: vec![
                ReferenceBand::new(3.0, 2.9, 3.2),
                ReferenceBand::new(5.0, 4.8, 5.2),
                ReferenceBand::new(5.8, 5.5, 6.0),
            ],
            angle: AngleRule {
                center_low: 0.85,
                center_high: 1.1,
                below_pivot: 0.85,
                below_slope: 0.25,
                above_pivot: 1.1,
                above_slope: 0.1,
            },
            major_weight: 0.65,
            buckets: vec![
                SurfaceBucket::new(0.85, 0.95, 1.05),
                SurfaceBucket::new(0.95, 1.05, 1.02),
                SurfaceBucket::new(1.05, 1.2, 0.98),
            ],
            ..Self::width()
        }
    }

    pub fn for_kind(kind: MeasurementKind) -> Self {
        match kind {
            MeasurementKind::Width => Self::width(),
            MeasurementKind::Height => Self::height(),
            MeasurementKind::Depth => Self::depth(),
        }
    }
}

//! Pixel → centimetre conversion with empirical corrections.
//!
//! For one detected object:
//! 1. snap the box extents (in cm) to nominal reference sizes;
//! 2. derive an angle factor from the box aspect ratio;
//! 3. rebuild px/cm from the box and the references on each axis and blend
//!    them, favouring the axis crossed by more grid lines;
//! 4. convert the refined pixel extent and apply the surface bucket factor;
//! 5. round to 0.1 cm.

pub mod profile;

pub use profile::{AngleRule, CorrectionProfile, ReferenceBand, SurfaceBucket};

use crate::calibrate::CalibrationFrame;
use crate::diagnostics::{Warning, WarningLog};
use crate::grid::lines_inside;
use crate::types::{cm_to_mm, round_tenth, AxisMeasurement, DetectedObject, MeasurementKind};

const TARGET: &str = "CorrectionEngine";

/// Grid scale and line positions of the calibrated frame.
#[derive(Clone, Copy, Debug)]
pub struct GridLines<'a> {
    pub px_per_cm: f64,
    pub xs: &'a [i32],
    pub ys: &'a [i32],
}

impl<'a> From<&'a CalibrationFrame> for GridLines<'a> {
    fn from(frame: &'a CalibrationFrame) -> Self {
        Self {
            px_per_cm: frame.px_per_cm,
            xs: &frame.xs,
            ys: &frame.ys,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct CorrectionEngine {
    pub profile: CorrectionProfile,
}

impl CorrectionEngine {
    pub fn new(profile: CorrectionProfile) -> Self {
        Self { profile }
    }

    /// Nominal reference size for an estimate in cm.
    pub fn snap_reference(&self, estimate_cm: f64, warnings: &mut WarningLog) -> f64 {
        let p = &self.profile;
        if let Some(band) = p.bands.iter().find(|b| b.contains(estimate_cm)) {
            return band.nominal;
        }
        if (p.plausible_range[0]..=p.plausible_range[1]).contains(&estimate_cm) {
            let step = p.snap_step.max(f64::EPSILON);
            return (estimate_cm / step).round_ties_even() * step;
        }
        warnings.raise(
            TARGET,
            Warning::ImplausibleObjectSize {
                estimated_cm: estimate_cm,
                fallback_cm: p.fallback_cm,
            },
        );
        p.fallback_cm
    }

    pub fn angle_factor(&self, aspect: f64) -> f64 {
        self.profile.angle.factor(aspect)
    }

    /// Blend of the per-axis scales rebuilt from the box and its references.
    pub fn recombine(
        &self,
        object: &DetectedObject,
        reference_cm: (f64, f64),
        angle: f64,
        grid: &GridLines<'_>,
    ) -> f64 {
        let cx = object.width_px as f64 / reference_cm.0 * angle;
        let cy = object.height_px as f64 / reference_cm.1 * angle;
        let b = &object.bbox;
        let gx = lines_inside(grid.xs, b.x1, b.x2);
        let gy = lines_inside(grid.ys, b.y1, b.y2);
        let major = self.profile.major_weight;
        let px_per_cm = if gx > gy {
            major * cx + (1.0 - major) * cy
        } else {
            major * cy + (1.0 - major) * cx
        };
        log::debug!(
            "{TARGET}::recombine cx={cx:.2} cy={cy:.2} lines x={gx} y={gy} -> {px_per_cm:.2} px/cm"
        );
        px_per_cm
    }

    pub fn surface_factor(&self, aspect: f64) -> f64 {
        match self
            .profile
            .buckets
            .iter()
            .find(|b| (b.min..=b.max).contains(&aspect))
        {
            Some(bucket) => bucket.factor,
            None => {
                log::debug!("{TARGET}::surface_factor no bucket for aspect {aspect:.2}, using 1.0");
                1.0
            }
        }
    }

    /// Full correction chain for one object.
    pub fn measure(
        &self,
        kind: MeasurementKind,
        object: &DetectedObject,
        raw_px: f64,
        box_fallback: bool,
        grid: &GridLines<'_>,
        warnings: &mut WarningLog,
    ) -> AxisMeasurement {
        let ppc = grid.px_per_cm;
        let reference_width_cm = self.snap_reference(object.width_px as f64 / ppc, warnings);
        let reference_height_cm = self.snap_reference(object.height_px as f64 / ppc, warnings);
        let aspect_ratio = object.aspect_ratio;
        let angle_factor = self.angle_factor(aspect_ratio);
        let px_per_cm = self.recombine(
            object,
            (reference_width_cm, reference_height_cm),
            angle_factor,
            grid,
        );
        let raw_cm = raw_px / px_per_cm;
        let surface_factor = self.surface_factor(aspect_ratio);
        let corrected_cm = raw_cm * surface_factor;
        let final_cm = round_tenth(corrected_cm);
        log::info!("{TARGET}::measure {kind}: {raw_px:.0} px -> {final_cm:.1} cm");
        AxisMeasurement {
            kind,
            raw_px,
            box_fallback,
            reference_width_cm,
            reference_height_cm,
            aspect_ratio,
            angle_factor,
            px_per_cm,
            raw_cm,
            surface_factor,
            corrected_cm,
            final_cm,
            final_mm: cm_to_mm(final_cm),
        }
    }
}

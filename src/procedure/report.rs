use crate::calibrate::CalibrationSummary;
use crate::contours::Point;
use crate::diagnostics::{TimingBreakdown, WarningLog};
use crate::types::{AxisMeasurement, DetectedObject, MeasurementKind};
use serde::Serialize;
use std::fmt::Write;
use std::path::PathBuf;

#[derive(Clone, Debug, Serialize)]
pub struct ObjectReport {
    pub object: DetectedObject,
    /// Refined boundary extremes in rectified-image coordinates.
    pub endpoints: Option<[Point; 2]>,
    pub measurement: AxisMeasurement,
}

/// Structured result of one in-process procedure run.
#[derive(Clone, Debug, Serialize)]
pub struct ProcedureReport {
    pub kind: MeasurementKind,
    pub image: PathBuf,
    pub calibration: CalibrationSummary,
    /// Largest object first.
    pub objects: Vec<ObjectReport>,
    pub warnings: WarningLog,
    pub timing: TimingBreakdown,
}

impl ProcedureReport {
    pub fn primary(&self) -> Option<&ObjectReport> {
        self.objects.first()
    }

    pub fn final_cm(&self) -> Option<f64> {
        self.primary().map(|o| o.measurement.final_cm)
    }

    /// Legacy line-oriented transcript: calibration diagnostics, then one
    /// block per object ending in `Finale <Label>: <v> cm`.
    pub fn transcript(&self) -> String {
        let c = &self.calibration;
        let mut out = String::new();
        let _ = writeln!(out, "Kalibrierung X-Richtung: {:.2} px/cm", c.px_per_cm_x);
        let _ = writeln!(out, "Kalibrierung Y-Richtung: {:.2} px/cm", c.px_per_cm_y);
        let _ = writeln!(out, "Durchschnittliche Kalibrierung: {:.2} px/cm", c.px_per_cm);
        for (i, o) in self.objects.iter().enumerate() {
            let m = &o.measurement;
            let _ = writeln!(out, "\n=== Objekt {} ===", i + 1);
            let _ = writeln!(out, "Initialer Kalibrierungsfaktor: {:.2} px/cm", c.px_per_cm);
            let _ = writeln!(
                out,
                "Aspektverhältnis: {:.2}, Winkelkorrektur: {:.2}",
                m.aspect_ratio, m.angle_factor
            );
            let _ = writeln!(out, "Korrigierter Kalibrierungsfaktor: {:.2} px/cm", m.px_per_cm);
            let _ = writeln!(out, "Finale {}: {:.1} cm", self.kind.label(), m.final_cm);
        }
        out
    }
}

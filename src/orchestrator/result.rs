use crate::error::FailureKind;
use crate::types::MeasurementKind;
use serde::Serialize;

/// Density used for the weight estimate (steel), g/cm³.
pub const STEEL_DENSITY_G_CM3: f64 = 7.85;

/// Lifecycle of one axis within a request.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum AxisState {
    NotStarted,
    Running,
    /// Final value in mm.
    Succeeded(f64),
    Failed(String),
}

impl AxisState {
    pub fn value_mm(&self) -> Option<f64> {
        match self {
            Self::Succeeded(v) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateStatus {
    Pending,
    Success,
    PartialSuccess,
    Failure,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AxisFailure {
    pub axis: MeasurementKind,
    pub kind: FailureKind,
}

/// Aggregated measurement for one piece.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MeasurementResult {
    pub width_mm: Option<f64>,
    pub height_mm: Option<f64>,
    pub depth_mm: Option<f64>,
    pub volume_mm3: Option<f64>,
    pub calculated_weight_kg: Option<f64>,
    pub errors: Vec<String>,
    pub processing_successful: bool,
    pub status: AggregateStatus,
    pub failures: Vec<AxisFailure>,
}

impl MeasurementResult {
    /// Assemble from the final axis states (width, height, depth order).
    pub fn from_states(
        width: &AxisState,
        height: &AxisState,
        depth: &AxisState,
        errors: Vec<String>,
        failures: Vec<AxisFailure>,
    ) -> Self {
        let (w, h, d) = (width.value_mm(), height.value_mm(), depth.value_mm());
        let (volume_mm3, calculated_weight_kg) = match (w, h, d) {
            (Some(w), Some(h), Some(d)) => {
                let volume = w * h * d;
                (Some(volume), Some(weight_kg(volume)))
            }
            _ => (None, None),
        };
        let succeeded = [w, h, d].iter().filter(|v| v.is_some()).count();
        let status = match succeeded {
            3 if errors.is_empty() => AggregateStatus::Success,
            0 => AggregateStatus::Failure,
            _ => AggregateStatus::PartialSuccess,
        };
        Self {
            width_mm: w,
            height_mm: h,
            depth_mm: d,
            volume_mm3,
            calculated_weight_kg,
            processing_successful: errors.is_empty(),
            errors,
            status,
            failures,
        }
    }

    pub fn value_mm(&self, kind: MeasurementKind) -> Option<f64> {
        match kind {
            MeasurementKind::Width => self.width_mm,
            MeasurementKind::Height => self.height_mm,
            MeasurementKind::Depth => self.depth_mm,
        }
    }
}

/// Steel weight of a volume in mm³.
pub fn weight_kg(volume_mm3: f64) -> f64 {
    volume_mm3 / 1000.0 * STEEL_DENSITY_G_CM3 / 1000.0
}

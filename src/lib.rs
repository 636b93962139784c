#![doc = include_str!("../README.md")]

// Measurement pipeline
pub mod calibrate;
pub mod capture;
pub mod correction;
pub mod detector;
pub mod orchestrator;
pub mod procedure;
pub mod refine;

// Shared types, errors and diagnostics
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod types;

// Imaging and geometry building blocks
pub mod contours;
pub mod edges;
pub mod grid;
pub mod homography;
pub mod image;
pub mod segments;

// --- High-level re-exports -------------------------------------------------

pub use crate::calibrate::{CalibrationFrame, CalibrationOptions, GridCalibrator};
pub use crate::correction::{CorrectionEngine, CorrectionProfile};
pub use crate::detector::{ObjectDetector, PrecomputedDetector, SilhouetteDetector};
pub use crate::error::{CalibrationError, ExecutionError, MeasureError, MeasureResult};
pub use crate::orchestrator::{MeasurementOrchestrator, MeasurementResult};
pub use crate::procedure::{MeasurementProcedure, Measurer, ProcedureSet, ScriptMeasurer};
pub use crate::refine::EdgeRefiner;
pub use crate::types::{AxisMeasurement, BoundingBox, DetectedObject, MeasurementKind};

/// Small prelude for quick experiments.
///
/// ```no_run
/// use grid_gauge::prelude::*;
/// use std::path::Path;
///
/// # fn main() -> Result<(), MeasureError> {
/// let frame = GridCalibrator::default().calibrate_path(Path::new("bottom.jpg"))?;
/// println!("{:.2} px/cm", frame.px_per_cm);
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::{
        GridCalibrator, MeasureError, MeasurementKind, MeasurementOrchestrator, ProcedureSet,
    };
}

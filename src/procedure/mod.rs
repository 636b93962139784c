//! Axis measurement procedures.
//!
//! A procedure turns one image into one dimension. [`MeasurementProcedure`]
//! runs the in-process pipeline (calibrate → detect → refine → correct) and
//! returns a structured [`ProcedureReport`]; [`ScriptMeasurer`] wraps an
//! external program that prints the legacy transcript. Both sit behind
//! [`Measurer`] so the orchestrator treats them alike.

pub mod config;
pub mod pipeline;
pub mod report;
pub mod script;

pub use config::{AxisMeasurers, DetectorConfig, ProcedureConfig, ProcedureSet};
pub use pipeline::MeasurementProcedure;
pub use report::{ObjectReport, ProcedureReport};
pub use script::ScriptMeasurer;

use crate::error::MeasureResult;
use crate::orchestrator::extract::extract_value;
use crate::types::MeasurementKind;
use std::path::Path;

/// What a procedure hands back.
#[derive(Clone, Debug)]
pub enum ProcedureOutput {
    Report(Box<ProcedureReport>),
    /// Raw stdout of a legacy external procedure.
    Transcript(String),
}

impl ProcedureOutput {
    /// Final value in cm for `kind`, if the output carries one.
    pub fn value_cm(&self, kind: MeasurementKind) -> Option<f64> {
        match self {
            Self::Report(report) => report.final_cm(),
            Self::Transcript(text) => extract_value(kind, text),
        }
    }

    pub fn transcript(&self) -> String {
        match self {
            Self::Report(report) => report.transcript(),
            Self::Transcript(text) => text.clone(),
        }
    }
}

/// One isolated axis measurement on one image.
pub trait Measurer: Send + Sync {
    /// Short name used in error messages.
    fn name(&self) -> &str;

    fn measure(&self, image: &Path) -> MeasureResult<ProcedureOutput>;
}

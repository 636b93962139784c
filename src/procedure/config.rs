//! Serde configuration for the three axis procedures.
//!
//! Kind-specific knobs (confidence, refine options, correction profile) are
//! optional and fall back to the preset for the axis they configure. The
//! `refine` and `correction` blocks are overrides merged key by key into that
//! preset, so a partial `height` block never inherits width defaults.
use super::{MeasurementProcedure, Measurer, ScriptMeasurer};
use crate::calibrate::{CalibrationOptions, GridCalibrator};
use crate::correction::{CorrectionEngine, CorrectionProfile};
use crate::detector::{ObjectDetector, PrecomputedDetector, SilhouetteDetector, SilhouetteOptions};
use crate::error::{MeasureError, MeasureResult};
use crate::refine::{EdgeRefiner, RefineOptions};
use crate::types::MeasurementKind;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DetectorConfig {
    Silhouette(SilhouetteOptions),
    /// Boxes exported by an external model run.
    Precomputed { path: PathBuf },
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::Silhouette(SilhouetteOptions::default())
    }
}

impl DetectorConfig {
    pub fn build(&self) -> Arc<dyn ObjectDetector> {
        match self {
            Self::Silhouette(opts) => Arc::new(SilhouetteDetector::new(opts.clone())),
            Self::Precomputed { path } => Arc::new(PrecomputedDetector::from_file(path.clone())),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProcedureConfig {
    pub calibration: CalibrationOptions,
    pub detector: DetectorConfig,
    pub confidence: Option<f32>,
    /// Partial `RefineOptions` applied over the kind's preset.
    pub refine: Option<Value>,
    /// Partial `CorrectionProfile` applied over the kind's preset.
    pub correction: Option<Value>,
    pub debug_dir: Option<PathBuf>,
    /// External program replacing the in-process pipeline; the image path is
    /// appended as the last argument.
    pub command: Option<Vec<String>>,
    pub working_dir: Option<PathBuf>,
}

impl ProcedureConfig {
    pub fn refine_options(&self, kind: MeasurementKind) -> MeasureResult<RefineOptions> {
        apply_overrides(RefineOptions::for_kind(kind), self.refine.as_ref(), "refine")
    }

    pub fn correction_profile(&self, kind: MeasurementKind) -> MeasureResult<CorrectionProfile> {
        apply_overrides(
            CorrectionProfile::for_kind(kind),
            self.correction.as_ref(),
            "correction",
        )
    }

    pub fn build_procedure(&self, kind: MeasurementKind) -> MeasureResult<MeasurementProcedure> {
        let mut p = MeasurementProcedure::new(
            kind,
            GridCalibrator::new(self.calibration.clone()),
            self.detector.build(),
            EdgeRefiner::new(self.refine_options(kind)?),
            CorrectionEngine::new(self.correction_profile(kind)?),
        )
        .with_confidence(self.confidence.unwrap_or_else(|| kind.default_confidence()));
        if let Some(dir) = &self.debug_dir {
            p = p.with_debug_dir(dir);
        }
        Ok(p)
    }

    /// Script runner when `command` is set, otherwise the in-process pipeline.
    pub fn build(&self, kind: MeasurementKind, timeout: Duration) -> MeasureResult<Arc<dyn Measurer>> {
        let script = self
            .command
            .as_deref()
            .and_then(ScriptMeasurer::from_command);
        Ok(match script {
            Some(s) => {
                let s = s.with_timeout(timeout);
                Arc::new(match &self.working_dir {
                    Some(dir) => s.with_working_dir(dir),
                    None => s,
                })
            }
            None => Arc::new(self.build_procedure(kind)?),
        })
    }
}

/// Merge `patch` into `base`: objects merge key by key, anything else replaces.
fn overlay(base: &mut Value, patch: &Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(key) {
                    Some(slot) => overlay(slot, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}

fn apply_overrides<T>(preset: T, patch: Option<&Value>, block: &str) -> MeasureResult<T>
where
    T: Serialize + DeserializeOwned,
{
    let Some(patch) = patch else {
        return Ok(preset);
    };
    let mut merged = serde_json::to_value(&preset)
        .map_err(|e| MeasureError::config(format!("{block} preset: {e}")))?;
    overlay(&mut merged, patch);
    serde_json::from_value(merged)
        .map_err(|e| MeasureError::config(format!("invalid {block} override: {e}")))
}

/// The three procedures, one per measured dimension.
#[derive(Clone)]
pub struct AxisMeasurers {
    pub width: Arc<dyn Measurer>,
    pub height: Arc<dyn Measurer>,
    pub depth: Arc<dyn Measurer>,
}

impl AxisMeasurers {
    pub fn get(&self, kind: MeasurementKind) -> &Arc<dyn Measurer> {
        match kind {
            MeasurementKind::Width => &self.width,
            MeasurementKind::Height => &self.height,
            MeasurementKind::Depth => &self.depth,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProcedureSet {
    pub width: ProcedureConfig,
    pub height: ProcedureConfig,
    pub depth: ProcedureConfig,
}

impl ProcedureSet {
    pub fn config(&self, kind: MeasurementKind) -> &ProcedureConfig {
        match kind {
            MeasurementKind::Width => &self.width,
            MeasurementKind::Height => &self.height,
            MeasurementKind::Depth => &self.depth,
        }
    }

    /// Set every procedure's debug directory to a per-axis subfolder of `dir`.
    pub fn with_debug_root(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.width.debug_dir.get_or_insert_with(|| dir.join("width"));
        self.height.debug_dir.get_or_insert_with(|| dir.join("height"));
        self.depth.debug_dir.get_or_insert_with(|| dir.join("depth"));
        self
    }

    pub fn into_measurers(self) -> MeasureResult<AxisMeasurers> {
        self.build_measurers(Duration::from_secs(120))
    }

    /// External programs get `script_timeout` to finish before being killed.
    pub fn build_measurers(&self, script_timeout: Duration) -> MeasureResult<AxisMeasurers> {
        Ok(AxisMeasurers {
            width: self.width.build(MeasurementKind::Width, script_timeout)?,
            height: self.height.build(MeasurementKind::Height, script_timeout)?,
            depth: self.depth.build(MeasurementKind::Depth, script_timeout)?,
        })
    }
}

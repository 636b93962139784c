use super::{read_json_config, OutputConfig};
use crate::error::MeasureResult;
use crate::orchestrator::MeasurementOrchestrator;
use crate::procedure::ProcedureSet;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn default_timeout_secs() -> u64 {
    120
}

#[derive(Clone, Debug, Deserialize)]
pub struct RuntimeConfig {
    /// Top-down photo (width and height).
    pub bottom_image: PathBuf,
    /// Side photo (depth).
    pub side_image: PathBuf,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub procedures: ProcedureSet,
}

impl RuntimeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Orchestrator with per-axis debug folders under `output.debug_dir`.
    pub fn orchestrator(&self) -> MeasureResult<MeasurementOrchestrator> {
        let mut procedures = self.procedures.clone();
        if let Some(dir) = &self.output.debug_dir {
            procedures = procedures.with_debug_root(dir);
        }
        Ok(MeasurementOrchestrator::new(procedures.build_measurers(self.timeout())?)
            .with_timeout(self.timeout()))
    }
}

pub fn load_config(path: &Path) -> MeasureResult<RuntimeConfig> {
    read_json_config(path)
}

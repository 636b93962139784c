use super::{read_json_config, OutputConfig};
use crate::calibrate::CalibrationOptions;
use crate::error::MeasureResult;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Deserialize)]
pub struct RuntimeConfig {
    pub input_path: PathBuf,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub calibration: CalibrationOptions,
}

pub fn load_config(path: &Path) -> MeasureResult<RuntimeConfig> {
    read_json_config(path)
}

//! JSON runtime configuration for the command-line tools.
pub mod grid_calibration;
pub mod measure_piece;

use crate::error::{MeasureError, MeasureResult};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub json_out: Option<PathBuf>,
    pub debug_dir: Option<PathBuf>,
}

/// Read and deserialize a JSON config file.
pub fn read_json_config<T: DeserializeOwned>(path: &Path) -> MeasureResult<T> {
    let contents = fs::read_to_string(path).map_err(|e| {
        MeasureError::config(format!("failed to read config {}: {e}", path.display()))
    })?;
    serde_json::from_str(&contents)
        .map_err(|e| MeasureError::config(format!("failed to parse config {}: {e}", path.display())))
}

//! Error taxonomy for the measurement pipeline.
//!
//! Only [`MeasureError::MissingInput`] aborts a whole measurement request.
//! Every other variant raised inside one axis procedure is caught by the
//! orchestrator and turned into that axis's null value plus an error string.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Result type alias for measurement operations.
pub type MeasureResult<T> = Result<T, MeasureError>;

/// Grid calibration failures. These are client-correctable: the photo has
/// to be recaptured.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibrationError {
    /// Image has no pixels to work on.
    #[error("image is empty")]
    EmptyImage,

    /// No horizontal or vertical segment survived the line search.
    #[error("no grid lines found")]
    NoGridLines,

    /// One axis has no grid gap above the noise floor.
    #[error("insufficient line spacing (x gaps: {x_gaps}, y gaps: {y_gaps})")]
    InsufficientLineSpacing { x_gaps: usize, y_gaps: usize },
}

/// Procedure execution failures. Surfaced as server-side errors.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Procedure did not report back before its deadline.
    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// External procedure could not be started.
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// External procedure exited with a failure status.
    #[error("exited with status {code:?}: {stderr}")]
    NonZeroExit { code: Option<i32>, stderr: String },

    /// Worker thread panicked or disconnected.
    #[error("procedure crashed: {0}")]
    Crashed(String),
}

/// Errors that can occur while measuring a piece.
#[derive(Debug, Error)]
pub enum MeasureError {
    /// Input image path does not exist or cannot be decoded.
    #[error("input image not found: {}", path.display())]
    MissingInput { path: PathBuf },

    /// Grid calibration failed.
    #[error("calibration failed: {0}")]
    Calibration(#[from] CalibrationError),

    /// Procedure crashed, failed or exceeded its timeout.
    #[error("execution failed: {0}")]
    Execution(#[from] ExecutionError),

    /// Expected result line absent from procedure output.
    #[error("{0}")]
    Parse(String),

    /// Image could not be encoded or written.
    #[error("image error for {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Filesystem error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be read or parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Which part of the taxonomy a failure belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    MissingInput,
    Calibration,
    Execution,
    Parse,
}

/// How a caller should react to a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Fixable by the user, e.g. by recapturing the image.
    ClientCorrectable,
    /// Internal failure.
    ServerSide,
}

impl MeasureError {
    /// Create a missing input error.
    #[must_use]
    pub fn missing_input(path: impl AsRef<Path>) -> Self {
        Self::MissingInput {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Create a parse error.
    #[must_use]
    pub fn parse(details: impl Into<String>) -> Self {
        Self::Parse(details.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(details: impl Into<String>) -> Self {
        Self::Config(details.into())
    }

    /// Taxonomy bucket of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::MissingInput { .. } => FailureKind::MissingInput,
            Self::Calibration(_) => FailureKind::Calibration,
            Self::Parse(_) => FailureKind::Parse,
            Self::Execution(_) | Self::Image { .. } | Self::Io(_) | Self::Config(_) => {
                FailureKind::Execution
            }
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self.kind() {
            FailureKind::MissingInput | FailureKind::Calibration => {
                ErrorClass::ClientCorrectable
            }
            FailureKind::Execution | FailureKind::Parse => ErrorClass::ServerSide,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MeasureError::missing_input("/tmp/nope.jpg");
        assert!(format!("{err}").contains("nope.jpg"));

        let err = MeasureError::from(CalibrationError::InsufficientLineSpacing {
            x_gaps: 0,
            y_gaps: 3,
        });
        assert!(format!("{err}").contains("insufficient line spacing"));

        let err = MeasureError::from(ExecutionError::Timeout(Duration::from_secs(120)));
        assert!(format!("{err}").contains("120s"));
    }

    #[test]
    fn calibration_errors_are_client_correctable() {
        let err = MeasureError::from(CalibrationError::NoGridLines);
        assert_eq!(err.kind(), FailureKind::Calibration);
        assert_eq!(err.class(), ErrorClass::ClientCorrectable);

        let err = MeasureError::from(ExecutionError::Crashed("boom".into()));
        assert_eq!(err.kind(), FailureKind::Execution);
        assert_eq!(err.class(), ErrorClass::ServerSide);
    }
}

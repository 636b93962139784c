use super::{Detection, ObjectDetector};
use crate::error::{MeasureError, MeasureResult};
use image::RgbImage;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
enum Source {
    Inline(Vec<Detection>),
    File(PathBuf),
}

/// Replays detections exported by an external model run.
///
/// File format: a JSON array of `{x1, y1, x2, y2, confidence}` in rectified
/// image pixels. File-backed detectors read the file on every call so a
/// fresh export is picked up without rebuilding the procedure.
#[derive(Clone, Debug)]
pub struct PrecomputedDetector {
    source: Source,
}

fn parse(text: &str) -> MeasureResult<Vec<Detection>> {
    serde_json::from_str(text).map_err(|e| MeasureError::config(format!("invalid detections: {e}")))
}

impl PrecomputedDetector {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self {
            source: Source::Inline(detections),
        }
    }

    pub fn from_json_str(text: &str) -> MeasureResult<Self> {
        parse(text).map(Self::new)
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::File(path.into()),
        }
    }

    fn load(path: &Path) -> MeasureResult<Vec<Detection>> {
        let text = fs::read_to_string(path)?;
        parse(&text)
    }
}

impl ObjectDetector for PrecomputedDetector {
    fn detect(&self, _image: &RgbImage, _confidence: f32) -> MeasureResult<Vec<Detection>> {
        match &self.source {
            Source::Inline(d) => Ok(d.clone()),
            Source::File(path) => Self::load(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_detection_array() {
        let d = PrecomputedDetector::from_json_str(
            r#"[{"x1": 1.5, "y1": 2, "x2": 40, "y2": 30.9, "confidence": 0.8}]"#,
        )
        .unwrap();
        let out = d.detect(&RgbImage::new(1, 1), 0.25).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].bbox(), crate::types::BoundingBox::new(1, 2, 40, 30));
    }

    #[test]
    fn malformed_file_is_config_error() {
        let err = PrecomputedDetector::from_json_str("{").unwrap_err();
        assert!(matches!(err, MeasureError::Config(_)));
    }

    #[test]
    fn reads_file_on_detect() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"x1": 0, "y1": 0, "x2": 5, "y2": 5, "confidence": 0.5}}]"#).unwrap();
        let d = PrecomputedDetector::from_file(file.path());
        assert_eq!(d.detect(&RgbImage::new(1, 1), 0.2).unwrap().len(), 1);
        let missing = PrecomputedDetector::from_file("/nonexistent/detections.json");
        assert!(matches!(
            missing.detect(&RgbImage::new(1, 1), 0.2),
            Err(MeasureError::Io(_))
        ));
    }
}

//! Object detection in rectified images.
//!
//! The model that locates the piece is an opaque capability behind
//! [`ObjectDetector`]. This crate ships two implementations:
//! - [`PrecomputedDetector`] replays boxes produced by an external model run.
//! - [`SilhouetteDetector`] is a classical dark-on-light fallback.
//!
//! [`detect_objects`] applies the shared post-policy: confidence gate, clamp
//! to the image, drop degenerate boxes, largest area first.

pub mod precomputed;
pub mod silhouette;

pub use precomputed::PrecomputedDetector;
pub use silhouette::{SilhouetteDetector, SilhouetteOptions};

use crate::error::MeasureResult;
use crate::types::{BoundingBox, DetectedObject};
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Raw detector output in image pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub confidence: f32,
}

impl Detection {
    /// Integer box, truncating like the model's own pixel conversion.
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(
            self.x1 as i32,
            self.y1 as i32,
            self.x2 as i32,
            self.y2 as i32,
        )
    }
}

/// Locates candidate pieces in a rectified colour image.
pub trait ObjectDetector: Send + Sync {
    /// Candidate boxes; may include entries below `confidence`.
    fn detect(&self, image: &RgbImage, confidence: f32) -> MeasureResult<Vec<Detection>>;
}

/// Run `detector` and apply the confidence / clamp / sort policy. An empty
/// list is a valid outcome.
pub fn detect_objects(
    detector: &dyn ObjectDetector,
    image: &RgbImage,
    confidence: f32,
) -> MeasureResult<Vec<DetectedObject>> {
    let raw = detector.detect(image, confidence)?;
    let (w, h) = (image.width() as usize, image.height() as usize);
    let mut objects: Vec<DetectedObject> = raw
        .iter()
        .filter(|d| d.confidence >= confidence)
        .filter_map(|d| DetectedObject::new(d.bbox().clamped(w, h), d.confidence))
        .collect();
    objects.sort_by(|a, b| b.bbox.area().cmp(&a.bbox.area()));
    log::debug!(
        "detect_objects: {} raw, {} kept at confidence {confidence:.2}",
        raw.len(),
        objects.len()
    );
    Ok(objects)
}

use serde::{Deserialize, Serialize};
use std::fmt;

pub use crate::image::{ImageF32, ImageU8};

/// Which physical dimension a procedure reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementKind {
    Width,
    Height,
    Depth,
}

impl MeasurementKind {
    pub const ALL: [MeasurementKind; 3] = [Self::Width, Self::Height, Self::Depth];

    /// Label used in the `Finale <Label>: <v> cm` result line.
    pub fn label(self) -> &'static str {
        match self {
            Self::Width => "Unterseiten-Breite",
            Self::Height => "Höhe",
            Self::Depth => "Tiefe",
        }
    }

    /// Boundary the edge refiner extracts for this kind. Depth is measured as
    /// the bottom-edge width of the side view.
    pub fn refine_axis(self) -> RefineAxis {
        match self {
            Self::Width | Self::Depth => RefineAxis::BottomEdge,
            Self::Height => RefineAxis::VerticalExtent,
        }
    }

    /// Confidence threshold the detector runs with by default.
    pub fn default_confidence(self) -> f32 {
        match self {
            Self::Width | Self::Height => 0.25,
            Self::Depth => 0.20,
        }
    }
}

impl fmt::Display for MeasurementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Width => "Width",
            Self::Height => "Height",
            Self::Depth => "Depth",
        })
    }
}

/// Boundary extracted by the edge refiner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefineAxis {
    /// Left/right extremes of the lower quarter of the box.
    BottomEdge,
    /// Top/bottom extremes of the whole box.
    VerticalExtent,
}

/// Integer pixel box, `x1 <= x2`, `y1 <= y2`, exclusive at the far corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    #[inline]
    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Clamp to an image of size `w × h`.
    pub fn clamped(&self, w: usize, h: usize) -> Self {
        let cx = |v: i32| v.clamp(0, w as i32);
        let cy = |v: i32| v.clamp(0, h as i32);
        Self::new(cx(self.x1), cy(self.y1), cx(self.x2), cy(self.y2))
    }
}

/// Piece located in a rectified image.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetectedObject {
    pub bbox: BoundingBox,
    pub confidence: f32,
    pub width_px: i32,
    pub height_px: i32,
    /// `width_px / height_px`
    pub aspect_ratio: f64,
}

impl DetectedObject {
    /// Returns `None` for boxes with non-positive extent.
    pub fn new(bbox: BoundingBox, confidence: f32) -> Option<Self> {
        if bbox.is_empty() {
            return None;
        }
        let width_px = bbox.width();
        let height_px = bbox.height();
        Some(Self {
            bbox,
            confidence,
            width_px,
            height_px,
            aspect_ratio: width_px as f64 / height_px as f64,
        })
    }
}

/// One corrected axis measurement for one detected object.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AxisMeasurement {
    pub kind: MeasurementKind,
    /// Refined pixel extent along the measured axis.
    pub raw_px: f64,
    /// True when the refiner fell back to the box extent.
    pub box_fallback: bool,
    pub reference_width_cm: f64,
    pub reference_height_cm: f64,
    pub aspect_ratio: f64,
    pub angle_factor: f64,
    /// Recombined px/cm used to convert `raw_px`.
    pub px_per_cm: f64,
    pub raw_cm: f64,
    pub surface_factor: f64,
    pub corrected_cm: f64,
    /// Corrected value rounded to 0.1 cm.
    pub final_cm: f64,
    pub final_mm: f64,
}

/// Round to one decimal place, halves to even.
#[inline]
pub fn round_tenth(v: f64) -> f64 {
    (v * 10.0).round_ties_even() / 10.0
}

#[inline]
pub fn cm_to_mm(cm: f64) -> f64 {
    cm * 10.0
}

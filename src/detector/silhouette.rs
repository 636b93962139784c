//! Classical dark-on-light piece detector.
//!
//! Threshold → opening (erases grid lines thinner than the kernel) →
//! external contours → padded bounding boxes. Confidence is the fraction of
//! the box covered by the contour.
use super::{Detection, ObjectDetector};
use crate::contours::{bounds, find_external_contours};
use crate::error::MeasureResult;
use crate::image::morph::{open, Kernel};
use crate::image::GrayImageU8;
use image::RgbImage;
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SilhouetteOptions {
    /// Pixels darker than this are foreground.
    pub dark_threshold: u8,
    /// Square opening kernel size in pixels.
    pub open_px: usize,
    /// Minimum contour area in pixels².
    pub min_area: f64,
    /// Pixels added around each box.
    pub padding_px: i32,
}

impl Default for SilhouetteOptions {
    fn default() -> Self {
        Self {
            dark_threshold: 100,
            open_px: 5,
            min_area: 400.0,
            padding_px: 3,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SilhouetteDetector {
    pub opts: SilhouetteOptions,
}

impl SilhouetteDetector {
    pub fn new(opts: SilhouetteOptions) -> Self {
        Self { opts }
    }

    fn foreground(&self, image: &RgbImage) -> GrayImageU8 {
        let gray = GrayImageU8::from_rgb(image);
        let mask: Vec<u8> = gray
            .data()
            .iter()
            .map(|&v| if v < self.opts.dark_threshold { 255 } else { 0 })
            .collect();
        let mask = GrayImageU8::new(gray.width(), gray.height(), mask);
        open(&mask, Kernel::square(self.opts.open_px.max(1)))
    }
}

impl ObjectDetector for SilhouetteDetector {
    fn detect(&self, image: &RgbImage, _confidence: f32) -> MeasureResult<Vec<Detection>> {
        let mask = self.foreground(image);
        let mut out = Vec::new();
        for contour in find_external_contours(&mask) {
            let area = contour.area();
            if area < self.opts.min_area {
                continue;
            }
            let Some((x0, y0, x1, y1)) = bounds(&contour.points) else {
                continue;
            };
            let pad = self.opts.padding_px as f32;
            // Contour points are inclusive pixel centres.
            let (bw, bh) = ((x1 - x0) as f64, (y1 - y0) as f64);
            let fill = if bw * bh > 0.0 { (area / (bw * bh)).min(1.0) } else { 0.0 };
            out.push(Detection {
                x1: x0 as f32 - pad,
                y1: y0 as f32 - pad,
                x2: (x1 + 1) as f32 + pad,
                y2: (y1 + 1) as f32 + pad,
                confidence: fill as f32,
            });
        }
        log::debug!("SilhouetteDetector::detect {} candidates", out.len());
        Ok(out)
    }
}

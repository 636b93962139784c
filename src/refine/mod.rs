//! Edge refinement inside a detected box.
//!
//! The detector box is only a coarse hint; the refiner locates the actual
//! boundary of the piece with a contrast-boosted, denoised multi-threshold
//! Canny map:
//! - bottom edge: the lower quarter of the box, closed horizontally, keeping
//!   the lower half of every contour (plus a short band above it, where the
//!   rounded corners run into the sides) and measuring leftmost → rightmost;
//! - vertical extent: the whole box, closed vertically, measuring
//!   topmost → bottommost.
//!
//! When the ROI is empty or no boundary point survives, the box extent is
//! returned and flagged as a fallback.

pub mod options;

pub use options::RefineOptions;

use crate::contours::{find_external_contours, Contour, Point};
use crate::diagnostics::{Warning, WarningLog};
use crate::edges::multi_canny;
use crate::image::bilateral::bilateral_filter;
use crate::image::clahe::clahe;
use crate::image::morph::{close, Kernel};
use crate::image::GrayImageU8;
use crate::types::{BoundingBox, RefineAxis};
use image::{imageops, Rgb, RgbImage};

const TARGET: &str = "EdgeRefiner";

/// Refined extent of one box along one axis.
#[derive(Clone, Debug)]
pub struct RefinedEdge {
    pub axis: RefineAxis,
    /// Pixel distance between the two extreme boundary points.
    pub raw_px: f64,
    /// Extreme points in full-image coordinates.
    pub endpoints: Option<[Point; 2]>,
    /// True when `raw_px` is the box extent.
    pub box_fallback: bool,
    pub warnings: WarningLog,
    /// ROI with boundary points (green) and endpoints (red).
    pub overlay: Option<RgbImage>,
}

#[derive(Clone, Debug, Default)]
pub struct EdgeRefiner {
    pub opts: RefineOptions,
}

struct Roi {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
}

impl EdgeRefiner {
    pub fn new(opts: RefineOptions) -> Self {
        Self { opts }
    }

    fn roi(&self, bbox: &BoundingBox, axis: RefineAxis) -> Option<Roi> {
        let rows = match axis {
            RefineAxis::BottomEdge => (bbox.height() as f64 * self.opts.roi_fraction) as i32,
            RefineAxis::VerticalExtent => bbox.height(),
        };
        if rows <= 0 || bbox.width() <= 0 {
            return None;
        }
        Some(Roi {
            x: bbox.x1 as u32,
            y: (bbox.y2 - rows) as u32,
            w: bbox.width() as u32,
            h: rows as u32,
        })
    }

    /// Binary boundary map of an ROI.
    pub fn edge_map(&self, roi: &RgbImage, axis: RefineAxis) -> GrayImageU8 {
        let gray = GrayImageU8::from_rgb(roi);
        let enhanced = clahe(&gray, &self.opts.clahe);
        let smooth = bilateral_filter(&enhanced, &self.opts.bilateral);
        let edges = multi_canny(&smooth.as_view(), &self.opts.canny_pairs());
        let kernel = match axis {
            RefineAxis::BottomEdge => Kernel::horizontal(self.opts.close_len),
            RefineAxis::VerticalExtent => Kernel::vertical(self.opts.close_len),
        };
        close(&edges, kernel)
    }

    /// Boundary points (ROI coordinates) that take part in the extremes.
    fn boundary_points(&self, contours: &[Contour], axis: RefineAxis) -> Vec<Point> {
        let large: Vec<&Contour> = contours
            .iter()
            .filter(|c| c.area() > self.opts.min_contour_area)
            .collect();
        let selected: Vec<&Contour> = if large.is_empty() {
            contours.iter().collect()
        } else {
            large
        };
        let mut points = Vec::new();
        for contour in selected {
            match axis {
                RefineAxis::BottomEdge => {
                    if contour.points.is_empty() {
                        continue;
                    }
                    let mut ys: Vec<i32> = contour.points.iter().map(|p| p.y).collect();
                    let mid = ys.len() / 2;
                    let (_, &mut median, _) = ys.select_nth_unstable(mid);
                    let band_top = median - self.opts.corner_band_px;
                    points.extend(contour.points.iter().filter(|p| p.y >= band_top));
                }
                RefineAxis::VerticalExtent => points.extend_from_slice(&contour.points),
            }
        }
        points
    }

    /// Refine `bbox` in `image` along `axis`. `px_per_cm` is only used for
    /// diagnostics.
    pub fn refine(
        &self,
        image: &RgbImage,
        bbox: &BoundingBox,
        axis: RefineAxis,
        px_per_cm: f64,
        debug: bool,
    ) -> RefinedEdge {
        let bbox = bbox.clamped(image.width() as usize, image.height() as usize);
        let box_extent = match axis {
            RefineAxis::BottomEdge => bbox.width(),
            RefineAxis::VerticalExtent => bbox.height(),
        }
        .max(0) as f64;
        let mut warnings = WarningLog::new();

        let Some(roi) = self.roi(&bbox, axis) else {
            warnings.raise(TARGET, Warning::EmptyRoi);
            return RefinedEdge {
                axis,
                raw_px: box_extent,
                endpoints: None,
                box_fallback: true,
                warnings,
                overlay: None,
            };
        };

        let crop = imageops::crop_imm(image, roi.x, roi.y, roi.w, roi.h).to_image();
        let edges = self.edge_map(&crop, axis);
        let contours = find_external_contours(&edges);
        let points = self.boundary_points(&contours, axis);

        let extremes = match axis {
            RefineAxis::BottomEdge => points
                .iter()
                .min_by_key(|p| p.x)
                .zip(points.iter().max_by_key(|p| p.x)),
            RefineAxis::VerticalExtent => points
                .iter()
                .min_by_key(|p| p.y)
                .zip(points.iter().max_by_key(|p| p.y)),
        };

        let overlay = debug.then(|| draw_overlay(&crop, &points, extremes));
        let to_image = |p: &Point| Point::new(p.x + roi.x as i32, p.y + roi.y as i32);

        let Some((a, b)) = extremes else {
            warnings.raise(TARGET, Warning::NoBoundaryPoints);
            return RefinedEdge {
                axis,
                raw_px: box_extent,
                endpoints: None,
                box_fallback: true,
                warnings,
                overlay,
            };
        };
        let raw_px = match axis {
            RefineAxis::BottomEdge => (b.x - a.x) as f64,
            RefineAxis::VerticalExtent => (b.y - a.y) as f64,
        };
        log::debug!(
            "{TARGET}::refine {axis:?} {} contours, {} points, {raw_px:.0} px (box {box_extent:.0} px, ~{:.2} cm)",
            contours.len(),
            points.len(),
            raw_px / px_per_cm.max(f64::EPSILON)
        );
        RefinedEdge {
            axis,
            raw_px,
            endpoints: Some([to_image(a), to_image(b)]),
            box_fallback: false,
            warnings,
            overlay,
        }
    }
}

fn draw_overlay(roi: &RgbImage, points: &[Point], extremes: Option<(&Point, &Point)>) -> RgbImage {
    let mut out = roi.clone();
    let (w, h) = (out.width() as i32, out.height() as i32);
    let mut paint = |x: i32, y: i32, c: Rgb<u8>| {
        if x >= 0 && y >= 0 && x < w && y < h {
            out.put_pixel(x as u32, y as u32, c);
        }
    };
    for p in points {
        paint(p.x, p.y, Rgb([0, 255, 0]));
    }
    if let Some((a, b)) = extremes {
        for p in [a, b] {
            for dy in -2..=2 {
                for dx in -2..=2 {
                    paint(p.x + dx, p.y + dy, Rgb([255, 0, 0]));
                }
            }
        }
    }
    out
}

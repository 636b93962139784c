//! Grid boundary search and perspective rectification.
use super::CalibrationOptions;
use crate::contours::{approx_polygon, arc_length, find_contours};
use crate::diagnostics::{Warning, WarningLog};
use crate::edges::canny;
use crate::homography::{order_corners, perspective_transform, rectified_size};
use crate::image::clahe::clahe;
use crate::image::morph::{dilate, erode, Kernel};
use crate::image::warp::warp_perspective;
use crate::image::GrayImageU8;
use image::RgbImage;
use nalgebra::Matrix3;

const TARGET: &str = "GridCalibrator::rectify";

/// Result of the rectification step.
#[derive(Clone, Debug)]
pub struct Rectification {
    pub image: RgbImage,
    /// Source → rectified mapping (identity on fallback).
    pub homography: Matrix3<f64>,
    /// Ordered boundary corners in the source image, when found.
    pub corners: Option<[[f64; 2]; 4]>,
}

impl Rectification {
    fn identity(source: &RgbImage) -> Self {
        Self {
            image: source.clone(),
            homography: Matrix3::identity(),
            corners: None,
        }
    }
}

/// Corners of the largest contour if it simplifies to a quadrilateral.
/// `Err` carries the vertex count that was found instead.
pub fn find_grid_quad(gray: &GrayImageU8, opts: &CalibrationOptions) -> Result<[[f64; 2]; 4], usize> {
    let enhanced = clahe(gray, &opts.boundary_clahe);
    let edges = canny(&enhanced.as_view(), opts.boundary_canny);
    let k = Kernel::square(opts.boundary_close_px.max(1));
    let edges = erode(&dilate(&edges, k), k);

    let contours = find_contours(&edges);
    let Some(largest) = contours
        .iter()
        .max_by(|a, b| a.area().total_cmp(&b.area()))
    else {
        return Err(0);
    };
    let eps = opts.approx_epsilon_fraction * arc_length(&largest.points);
    let approx = approx_polygon(&largest.points, eps);
    log::debug!(
        "{TARGET} largest contour: {} points, area {:.0}, {} vertices",
        largest.points.len(),
        largest.area(),
        approx.len()
    );
    if approx.len() != 4 {
        return Err(approx.len());
    }
    let mut quad = [[0.0; 2]; 4];
    for (q, p) in quad.iter_mut().zip(&approx) {
        *q = [p.x as f64, p.y as f64];
    }
    Ok(quad)
}

/// Warp `source` so the printed grid becomes fronto-parallel. Falls back to
/// the untouched source with an identity transform (plus a warning) when no
/// usable boundary exists.
pub fn rectify(source: &RgbImage, opts: &CalibrationOptions, warnings: &mut WarningLog) -> Rectification {
    let gray = GrayImageU8::from_rgb(source);
    let quad = match find_grid_quad(&gray, opts) {
        Ok(q) => q,
        Err(vertices) => {
            warnings.raise(TARGET, Warning::NoGridBoundary { vertices });
            return Rectification::identity(source);
        }
    };

    let ordered = order_corners(&quad);
    let (w, h) = rectified_size(&ordered);
    if w < 2 || h < 2 {
        warnings.raise(TARGET, Warning::DegenerateHomography);
        return Rectification::identity(source);
    }
    let aspect = w as f64 / h as f64;
    if !(opts.aspect_range[0]..=opts.aspect_range[1]).contains(&aspect) {
        warnings.raise(TARGET, Warning::SkewedGrid { aspect });
    }

    let (wf, hf) = (w as f64 - 1.0, h as f64 - 1.0);
    let dst = [[0.0, 0.0], [wf, 0.0], [wf, hf], [0.0, hf]];
    let Some((homography, inverse)) = perspective_transform(&ordered, &dst)
        .and_then(|m| m.try_inverse().map(|inv| (m, inv)))
    else {
        warnings.raise(TARGET, Warning::DegenerateHomography);
        return Rectification::identity(source);
    };

    log::debug!("{TARGET} boundary {ordered:?} -> {w}x{h}");
    Rectification {
        image: warp_perspective(source, &inverse, w, h),
        homography,
        corners: Some(ordered),
    }
}

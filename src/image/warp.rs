//! Perspective warping of colour frames.
use image::{Rgb, RgbImage};
use nalgebra::{Matrix3, Vector3};

/// Warp `src` into a `width × height` canvas. `dst_to_src` maps output pixel
/// centres back into the source; samples are bilinear and pixels falling
/// outside the source are black.
pub fn warp_perspective(
    src: &RgbImage,
    dst_to_src: &Matrix3<f64>,
    width: u32,
    height: u32,
) -> RgbImage {
    let mut out = RgbImage::new(width, height);
    let (sw, sh) = (src.width() as f64, src.height() as f64);
    if sw == 0.0 || sh == 0.0 {
        return out;
    }
    for y in 0..height {
        for x in 0..width {
            let v = dst_to_src * Vector3::new(x as f64, y as f64, 1.0);
            if v[2].abs() < 1e-12 {
                continue;
            }
            let sx = v[0] / v[2];
            let sy = v[1] / v[2];
            if sx < -0.5 || sy < -0.5 || sx > sw - 0.5 || sy > sh - 0.5 {
                continue;
            }
            out.put_pixel(x, y, sample_bilinear(src, sx, sy));
        }
    }
    out
}

fn sample_bilinear(src: &RgbImage, x: f64, y: f64) -> Rgb<u8> {
    let max_x = src.width() as i64 - 1;
    let max_y = src.height() as i64 - 1;
    let x0f = x.floor();
    let y0f = y.floor();
    let ax = x - x0f;
    let ay = y - y0f;
    let cx = |v: i64| v.clamp(0, max_x) as u32;
    let cy = |v: i64| v.clamp(0, max_y) as u32;
    let (x0, y0) = (x0f as i64, y0f as i64);

    let p00 = src.get_pixel(cx(x0), cy(y0));
    let p10 = src.get_pixel(cx(x0 + 1), cy(y0));
    let p01 = src.get_pixel(cx(x0), cy(y0 + 1));
    let p11 = src.get_pixel(cx(x0 + 1), cy(y0 + 1));

    let mut px = [0u8; 3];
    for (c, out) in px.iter_mut().enumerate() {
        let top = p00[c] as f64 * (1.0 - ax) + p10[c] as f64 * ax;
        let bottom = p01[c] as f64 * (1.0 - ax) + p11[c] as f64 * ax;
        *out = (top * (1.0 - ay) + bottom * ay).round().clamp(0.0, 255.0) as u8;
    }
    Rgb(px)
}

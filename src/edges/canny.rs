//! Canny edge masks built on Sobel gradients.
//!
//! Non-maximum suppression keeps a pixel when its magnitude is strictly
//! greater than the neighbour on one side of the quantized gradient direction
//! and not smaller than the other (so plateaus keep exactly one pixel).
//! Hysteresis then grows 8-connected chains from pixels above `high` through
//! pixels above `low`. Output masks are 0 / 255.
use super::grad::{sobel_gradients, Grad};
use crate::image::{GrayImageU8, ImageF32, ImageU8, ImageView};
use rayon::prelude::*;
use serde::Deserialize;

const TAN_22_5_DEG: f32 = 0.414_213_57;

/// One (low, high) hysteresis pair.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct CannyThresholds {
    pub low: f32,
    pub high: f32,
}

impl CannyThresholds {
    pub const fn new(low: f32, high: f32) -> Self {
        Self { low, high }
    }

    /// Cartesian product of low and high values, in low-major order.
    pub fn grid(lows: &[f32], highs: &[f32]) -> Vec<Self> {
        lows.iter()
            .flat_map(|&low| highs.iter().map(move |&high| Self::new(low, high)))
            .collect()
    }
}

/// Magnitude after suppression; zero where suppressed.
fn suppress(grad: &Grad) -> ImageF32 {
    let w = grad.mag.w;
    let h = grad.mag.h;
    let mut out = ImageF32::new(w, h);
    if w < 3 || h < 3 {
        return out;
    }
    for y in 1..h - 1 {
        let mag_prev = grad.mag.row(y - 1);
        let mag_row = grad.mag.row(y);
        let mag_next = grad.mag.row(y + 1);
        let gx_row = grad.gx.row(y);
        let gy_row = grad.gy.row(y);

        for x in 1..w - 1 {
            let mag = mag_row[x];
            if mag <= 0.0 {
                continue;
            }
            let gx = gx_row[x];
            let gy = gy_row[x];
            let abs_gx = gx.abs();
            let abs_gy = gy.abs();
            let same_sign = (gx >= 0.0) == (gy >= 0.0);

            // (before, after) along the gradient direction.
            let (n1, n2) = if abs_gy <= abs_gx * TAN_22_5_DEG {
                (mag_row[x - 1], mag_row[x + 1])
            } else if abs_gx <= abs_gy * TAN_22_5_DEG {
                (mag_prev[x], mag_next[x])
            } else if same_sign {
                (mag_prev[x - 1], mag_next[x + 1])
            } else {
                (mag_prev[x + 1], mag_next[x - 1])
            };

            if mag > n1 && mag >= n2 {
                out.set(x, y, mag);
            }
        }
    }
    out
}

fn hysteresis(nms: &ImageF32, t: CannyThresholds) -> GrayImageU8 {
    let (w, h) = (nms.w, nms.h);
    let mut out = GrayImageU8::filled(w, h, 0);
    let (low, high) = if t.low <= t.high {
        (t.low, t.high)
    } else {
        (t.high, t.low)
    };
    let mut stack: Vec<(usize, usize)> = Vec::new();
    for y in 0..h {
        for x in 0..w {
            if nms.get(x, y) > high && out.get(x, y) == 0 {
                out.set(x, y, 255);
                stack.push((x, y));
                while let Some((cx, cy)) = stack.pop() {
                    for ny in cy.saturating_sub(1)..=(cy + 1).min(h - 1) {
                        for nx in cx.saturating_sub(1)..=(cx + 1).min(w - 1) {
                            if out.get(nx, ny) == 0 && nms.get(nx, ny) > low {
                                out.set(nx, ny, 255);
                                stack.push((nx, ny));
                            }
                        }
                    }
                }
            }
        }
    }
    out
}

/// Single-pair Canny edge mask.
pub fn canny(img: &ImageU8<'_>, thresholds: CannyThresholds) -> GrayImageU8 {
    let nms = suppress(&sobel_gradients(img));
    hysteresis(&nms, thresholds)
}

/// Union of Canny masks over several threshold pairs. Gradients and
/// suppression are shared; hysteresis passes run in parallel.
pub fn multi_canny(img: &ImageU8<'_>, pairs: &[CannyThresholds]) -> GrayImageU8 {
    let nms = suppress(&sobel_gradients(img));
    pairs
        .par_iter()
        .map(|&t| hysteresis(&nms, t))
        .reduce(
            || GrayImageU8::filled(img.w, img.h, 0),
            |mut acc, m| {
                acc.union_with(&m);
                acc
            },
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_image(size: usize, lo: usize, hi: usize) -> Vec<u8> {
        let mut data = vec![220u8; size * size];
        for y in lo..hi {
            for x in lo..hi {
                data[y * size + x] = 30;
            }
        }
        data
    }

    #[test]
    fn square_outline_is_one_pixel_thin() {
        let size = 40;
        let data = square_image(size, 10, 30);
        let img = ImageU8 { w: size, h: size, stride: size, data: &data };
        let edges = canny(&img, CannyThresholds::new(50.0, 150.0));
        // Interior and far background are empty.
        assert_eq!(edges.get(20, 20), 0);
        assert_eq!(edges.get(2, 2), 0);
        // Exactly one edge pixel across the left side on a middle row.
        let row: Vec<_> = (5..15).filter(|&x| edges.get(x, 20) != 0).collect();
        assert_eq!(row.len(), 1, "row hits: {row:?}");
        assert!(row[0] == 9 || row[0] == 10);
    }

    #[test]
    fn weak_only_edges_are_dropped() {
        let size = 30;
        let data: Vec<u8> = (0..size * size)
            .map(|i| if i % size < 15 { 100 } else { 110 })
            .collect();
        let img = ImageU8 { w: size, h: size, stride: size, data: &data };
        // Step of 10 gives |gx| = 40: above low, below high.
        assert_eq!(canny(&img, CannyThresholds::new(20.0, 80.0)).count_nonzero(), 0);
        assert!(canny(&img, CannyThresholds::new(20.0, 30.0)).count_nonzero() > 0);
    }

    #[test]
    fn multi_canny_is_union_of_pairs() {
        let size = 40;
        let data = square_image(size, 10, 30);
        let img = ImageU8 { w: size, h: size, stride: size, data: &data };
        let pairs = CannyThresholds::grid(&[20.0, 40.0, 60.0], &[80.0, 120.0, 160.0]);
        assert_eq!(pairs.len(), 9);
        let union = multi_canny(&img, &pairs);
        for &p in &pairs {
            let single = canny(&img, p);
            for y in 0..size {
                for x in 0..size {
                    if single.get(x, y) != 0 {
                        assert_ne!(union.get(x, y), 0);
                    }
                }
            }
        }
    }
}

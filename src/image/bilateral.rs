//! Edge-preserving bilateral smoothing on 8-bit grayscale images.
use super::{GrayImageU8, ImageView};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BilateralOptions {
    /// Window diameter in pixels.
    pub diameter: usize,
    pub sigma_color: f32,
    pub sigma_space: f32,
}

impl Default for BilateralOptions {
    fn default() -> Self {
        Self {
            diameter: 9,
            sigma_color: 75.0,
            sigma_space: 75.0,
        }
    }
}

/// Bilateral filter over a circular window with replicated borders.
pub fn bilateral_filter(img: &GrayImageU8, opts: &BilateralOptions) -> GrayImageU8 {
    let (w, h) = (img.width(), img.height());
    if w == 0 || h == 0 {
        return img.clone();
    }
    let radius = (opts.diameter / 2).max(1) as isize;
    let color_coeff = -0.5 / (opts.sigma_color * opts.sigma_color).max(f32::EPSILON);
    let space_coeff = -0.5 / (opts.sigma_space * opts.sigma_space).max(f32::EPSILON);

    let mut offsets = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let r2 = (dx * dx + dy * dy) as f32;
            if r2 > (radius * radius) as f32 {
                continue;
            }
            offsets.push((dx, dy, (r2 * space_coeff).exp()));
        }
    }
    let color_weight: Vec<f32> = (0..256)
        .map(|d| ((d * d) as f32 * color_coeff).exp())
        .collect();

    let mut out = GrayImageU8::filled(w, h, 0);
    for y in 0..h as isize {
        for x in 0..w as isize {
            let center = img.get(x as usize, y as usize) as i32;
            let mut sum = 0.0f32;
            let mut norm = 0.0f32;
            for &(dx, dy, ws) in &offsets {
                let v = img.get_clamped(x + dx, y + dy) as i32;
                let wgt = ws * color_weight[(v - center).unsigned_abs() as usize];
                sum += wgt * v as f32;
                norm += wgt;
            }
            let v = if norm > 0.0 { sum / norm } else { center as f32 };
            out.set(x as usize, y as usize, v.round().clamp(0.0, 255.0) as u8);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_strong_step_sharp() {
        let (w, h) = (20, 10);
        let data: Vec<u8> = (0..w * h)
            .map(|i| if i % w < 10 { 30 } else { 220 })
            .collect();
        let img = GrayImageU8::new(w, h, data);
        let out = bilateral_filter(&img, &BilateralOptions::default());
        assert!(out.get(9, 5) < 60, "left side blurred to {}", out.get(9, 5));
        assert!(out.get(10, 5) > 190, "right side blurred to {}", out.get(10, 5));
    }

    #[test]
    fn smooths_small_noise() {
        let (w, h) = (15, 15);
        let data: Vec<u8> = (0..w * h).map(|i| if i % 2 == 0 { 120 } else { 130 }).collect();
        let img = GrayImageU8::new(w, h, data);
        let out = bilateral_filter(&img, &BilateralOptions::default());
        let v = out.get(7, 7) as i32;
        assert!((v - 125).abs() <= 2, "got {v}");
    }
}

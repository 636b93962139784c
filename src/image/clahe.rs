//! Contrast-limited adaptive histogram equalization (CLAHE).
//!
//! The image is split into a `tiles × tiles` grid. Each tile gets a clipped
//! histogram whose excess is redistributed uniformly before building the
//! equalization LUT; output pixels bilinearly blend the LUTs of the four
//! nearest tile centres.
use super::{GrayImageU8, ImageView};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaheOptions {
    /// Histogram clip limit relative to a flat histogram.
    pub clip_limit: f32,
    /// Tiles per axis.
    pub tiles: usize,
}

impl Default for ClaheOptions {
    fn default() -> Self {
        Self {
            clip_limit: 2.0,
            tiles: 8,
        }
    }
}

impl ClaheOptions {
    pub fn with_clip(clip_limit: f32) -> Self {
        Self {
            clip_limit,
            ..Self::default()
        }
    }
}

struct TileGrid {
    size: usize,
    count: usize,
}

impl TileGrid {
    fn new(extent: usize, tiles: usize) -> Self {
        let tiles = tiles.clamp(1, extent.max(1));
        let size = extent.div_ceil(tiles).max(1);
        let count = extent.div_ceil(size).max(1);
        Self { size, count }
    }

    fn bounds(&self, t: usize, extent: usize) -> (usize, usize) {
        let start = t * self.size;
        (start, (start + self.size).min(extent))
    }

    /// Left tile index and blend weight of the right one at `p`.
    fn locate(&self, p: usize) -> (usize, usize, f32) {
        let f = (p as f32 + 0.5) / self.size as f32 - 0.5;
        let t1 = f.floor();
        let a = f - t1;
        let last = self.count as isize - 1;
        let i1 = (t1 as isize).clamp(0, last) as usize;
        let i2 = (t1 as isize + 1).clamp(0, last) as usize;
        (i1, i2, a)
    }
}

fn tile_lut(img: &GrayImageU8, xr: (usize, usize), yr: (usize, usize), clip: f32) -> [u8; 256] {
    let mut hist = [0u32; 256];
    for y in yr.0..yr.1 {
        for &v in &img.row(y)[xr.0..xr.1] {
            hist[v as usize] += 1;
        }
    }
    let area = ((xr.1 - xr.0) * (yr.1 - yr.0)).max(1) as u32;

    let limit = ((clip * area as f32 / 256.0) as u32).max(1);
    let mut excess = 0u32;
    for h in hist.iter_mut() {
        if *h > limit {
            excess += *h - limit;
            *h = limit;
        }
    }
    let batch = excess / 256;
    let residual = (excess - batch * 256) as usize;
    for h in hist.iter_mut() {
        *h += batch;
    }
    if residual > 0 {
        let step = (256 / residual).max(1);
        for i in (0..256).step_by(step).take(residual) {
            hist[i] += 1;
        }
    }

    let scale = 255.0 / area as f32;
    let mut lut = [0u8; 256];
    let mut sum = 0u32;
    for (i, &h) in hist.iter().enumerate() {
        sum += h;
        lut[i] = (sum as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}

/// Apply CLAHE to an 8-bit grayscale image.
pub fn clahe(img: &GrayImageU8, opts: &ClaheOptions) -> GrayImageU8 {
    let (w, h) = (img.width(), img.height());
    if w == 0 || h == 0 {
        return img.clone();
    }
    let gx = TileGrid::new(w, opts.tiles);
    let gy = TileGrid::new(h, opts.tiles);

    let mut luts = Vec::with_capacity(gx.count * gy.count);
    for ty in 0..gy.count {
        for tx in 0..gx.count {
            luts.push(tile_lut(
                img,
                gx.bounds(tx, w),
                gy.bounds(ty, h),
                opts.clip_limit,
            ));
        }
    }
    let lut = |tx: usize, ty: usize, v: u8| luts[ty * gx.count + tx][v as usize] as f32;

    let cols: Vec<(usize, usize, f32)> = (0..w).map(|x| gx.locate(x)).collect();
    let mut out = GrayImageU8::filled(w, h, 0);
    for y in 0..h {
        let (ty1, ty2, ya) = gy.locate(y);
        for x in 0..w {
            let (tx1, tx2, xa) = cols[x];
            let v = img.get(x, y);
            let top = lut(tx1, ty1, v) * (1.0 - xa) + lut(tx2, ty1, v) * xa;
            let bottom = lut(tx1, ty2, v) * (1.0 - xa) + lut(tx2, ty2, v) * xa;
            let res = top * (1.0 - ya) + bottom * ya;
            out.set(x, y, res.round().clamp(0.0, 255.0) as u8);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stretches_low_contrast_ramp() {
        let (w, h) = (64, 64);
        let data: Vec<u8> = (0..w * h).map(|i| 100 + ((i % w + i / w) % 16) as u8).collect();
        let img = GrayImageU8::new(w, h, data);
        let out = clahe(&img, &ClaheOptions::with_clip(40.0));
        let span = |g: &GrayImageU8| {
            let r = g.row(h / 2);
            r.iter().max().copied().unwrap_or(0) as i32 - r.iter().min().copied().unwrap_or(0) as i32
        };
        assert!(span(&out) > span(&img), "{} vs {}", span(&out), span(&img));
    }

    #[test]
    fn preserves_ordering_of_step_edge() {
        let (w, h) = (32, 32);
        let data: Vec<u8> = (0..w * h)
            .map(|i| if i % w < w / 2 { 40 } else { 200 })
            .collect();
        let img = GrayImageU8::new(w, h, data);
        let out = clahe(&img, &ClaheOptions::default());
        assert!(out.get(2, 16) < out.get(w - 3, 16));
    }
}

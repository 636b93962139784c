//! Hough-based segment search on binary edge masks.
//!
//! Every edge pixel votes for all `(theta, rho)` lines through it. Local
//! maxima above the vote threshold are visited strongest first; along each
//! peak line the mask is walked in a ±1 px corridor and runs of edge pixels
//! separated by at most `max_line_gap` become segments when at least
//! `min_line_length` long. Pixels claimed by an accepted segment are not
//! reused by later peaks.
use super::types::LineSegment;
use crate::image::{GrayImageU8, ImageView};
use rayon::prelude::*;
use serde::Deserialize;

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct HoughOptions {
    /// Distance resolution in pixels.
    pub rho_step: f32,
    /// Angular resolution in degrees.
    pub theta_step_deg: f32,
    /// Minimum accumulator votes for a peak.
    pub threshold: u32,
}

impl Default for HoughOptions {
    fn default() -> Self {
        Self {
            rho_step: 1.0,
            theta_step_deg: 1.0,
            threshold: 100,
        }
    }
}

/// Segment acceptance parameters for one walk.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct SegmentSearch {
    pub min_line_length: f32,
    pub max_line_gap: usize,
}

impl SegmentSearch {
    pub const fn new(min_line_length: f32, max_line_gap: usize) -> Self {
        Self {
            min_line_length,
            max_line_gap,
        }
    }

    pub fn grid(lengths: &[f32], gaps: &[usize]) -> Vec<Self> {
        lengths
            .iter()
            .flat_map(|&l| gaps.iter().map(move |&g| Self::new(l, g)))
            .collect()
    }
}

struct Accumulator {
    n_theta: usize,
    n_rho: usize,
    rho_offset: f32,
    rho_step: f32,
    cos: Vec<f32>,
    sin: Vec<f32>,
    votes: Vec<u32>,
}

impl Accumulator {
    fn build(mask: &GrayImageU8, opts: &HoughOptions) -> Self {
        let (w, h) = (mask.width() as f32, mask.height() as f32);
        let rho_step = opts.rho_step.max(1e-3);
        let theta_step = opts.theta_step_deg.max(1e-3).to_radians();
        let n_theta = (std::f32::consts::PI / theta_step).round().max(1.0) as usize;
        let max_rho = (w * w + h * h).sqrt().ceil();
        let rho_offset = (max_rho / rho_step).ceil();
        let n_rho = (2.0 * rho_offset + 1.0) as usize;
        let cos: Vec<f32> = (0..n_theta).map(|t| (t as f32 * theta_step).cos()).collect();
        let sin: Vec<f32> = (0..n_theta).map(|t| (t as f32 * theta_step).sin()).collect();

        let mut votes = vec![0u32; n_theta * n_rho];
        for y in 0..mask.height() {
            for (x, &v) in mask.row(y).iter().enumerate() {
                if v == 0 {
                    continue;
                }
                for t in 0..n_theta {
                    let rho = x as f32 * cos[t] + y as f32 * sin[t];
                    let r = (rho / rho_step).round() + rho_offset;
                    votes[t * n_rho + r as usize] += 1;
                }
            }
        }
        Self {
            n_theta,
            n_rho,
            rho_offset,
            rho_step,
            cos,
            sin,
            votes,
        }
    }

    #[inline]
    fn at(&self, t: isize, r: isize) -> u32 {
        if t < 0 || r < 0 || t as usize >= self.n_theta || r as usize >= self.n_rho {
            return 0;
        }
        self.votes[t as usize * self.n_rho + r as usize]
    }

    /// Local maxima above `threshold`, strongest first.
    fn peaks(&self, threshold: u32) -> Vec<(usize, usize, u32)> {
        let mut peaks = Vec::new();
        for t in 0..self.n_theta as isize {
            for r in 0..self.n_rho as isize {
                let v = self.at(t, r);
                if v < threshold.max(1) {
                    continue;
                }
                let mut is_max = true;
                'nb: for dt in -1..=1isize {
                    for dr in -1..=1isize {
                        if dt == 0 && dr == 0 {
                            continue;
                        }
                        let n = self.at(t + dt, r + dr);
                        // Ties resolve to the first cell in scan order.
                        let before = dt < 0 || (dt == 0 && dr < 0);
                        if n > v || (before && n == v) {
                            is_max = false;
                            break 'nb;
                        }
                    }
                }
                if is_max {
                    peaks.push((t as usize, r as usize, v));
                }
            }
        }
        peaks.sort_by(|a, b| b.2.cmp(&a.2));
        peaks
    }

    fn rho(&self, r: usize) -> f32 {
        (r as f32 - self.rho_offset) * self.rho_step
    }
}

struct Run {
    start: [i32; 2],
    end: [i32; 2],
    last_step: usize,
    pixels: Vec<usize>,
}

fn walk_peak(
    mask: &GrayImageU8,
    acc: &Accumulator,
    t: usize,
    r: usize,
    search: SegmentSearch,
    used: &mut [bool],
    out: &mut Vec<LineSegment>,
) {
    let (w, h) = (mask.width() as i32, mask.height() as i32);
    let (c, s) = (acc.cos[t], acc.sin[t]);
    let rho = acc.rho(r);
    let steep = s.abs() < c.abs();
    let steps = if steep { h } else { w };

    let mut run: Option<Run> = None;
    let finish = |run: Run, used: &mut [bool], out: &mut Vec<LineSegment>| {
        let seg = LineSegment::new(run.start, run.end);
        if seg.length() >= search.min_line_length {
            for idx in run.pixels {
                used[idx] = true;
            }
            out.push(seg);
        }
    };

    for step in 0..steps {
        let (cx, cy) = if steep {
            (((rho - step as f32 * s) / c).round() as i32, step)
        } else {
            (step, ((rho - step as f32 * c) / s).round() as i32)
        };
        let mut hits: Vec<(i32, i32)> = Vec::with_capacity(3);
        for d in [0, -1, 1] {
            let (x, y) = if steep { (cx + d, cy) } else { (cx, cy + d) };
            if x < 0 || y < 0 || x >= w || y >= h {
                continue;
            }
            let idx = (y * w + x) as usize;
            if !used[idx] && mask.get(x as usize, y as usize) != 0 {
                hits.push((x, y));
            }
        }
        let Some(&(hx, hy)) = hits.first() else {
            continue;
        };
        let step = step as usize;
        let idxs = hits.iter().map(|&(x, y)| (y * w + x) as usize);

        let continues = matches!(&run, Some(cur) if step - cur.last_step <= search.max_line_gap + 1);
        if continues {
            if let Some(cur) = run.as_mut() {
                cur.end = [hx, hy];
                cur.last_step = step;
                cur.pixels.extend(idxs);
            }
        } else {
            if let Some(done) = run.take() {
                finish(done, used, out);
            }
            run = Some(Run {
                start: [hx, hy],
                end: [hx, hy],
                last_step: step,
                pixels: idxs.collect(),
            });
        }
    }
    if let Some(done) = run.take() {
        finish(done, used, out);
    }
}

fn search_segments(
    mask: &GrayImageU8,
    acc: &Accumulator,
    peaks: &[(usize, usize, u32)],
    search: SegmentSearch,
) -> Vec<LineSegment> {
    let mut used = vec![false; mask.width() * mask.height()];
    let mut out = Vec::new();
    for &(t, r, _) in peaks {
        walk_peak(mask, acc, t, r, search, &mut used, &mut out);
    }
    out
}

/// Segments found with a single (min length, max gap) setting.
pub fn find_segments(
    mask: &GrayImageU8,
    opts: &HoughOptions,
    search: SegmentSearch,
) -> Vec<LineSegment> {
    find_segments_multi(mask, opts, &[search])
}

/// Segments accumulated over several searches sharing one accumulator.
pub fn find_segments_multi(
    mask: &GrayImageU8,
    opts: &HoughOptions,
    searches: &[SegmentSearch],
) -> Vec<LineSegment> {
    if mask.width() == 0 || mask.height() == 0 {
        return Vec::new();
    }
    let acc = Accumulator::build(mask, opts);
    let peaks = acc.peaks(opts.threshold);
    log::debug!(
        "find_segments_multi: {} peaks over {} searches",
        peaks.len(),
        searches.len()
    );
    searches
        .par_iter()
        .map(|&s| search_segments(mask, &acc, &peaks, s))
        .collect::<Vec<_>>()
        .concat()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segments::types::{classify_segments, Orientation};

    fn mask_with_lines(w: usize, h: usize, xs: &[usize], ys: &[usize]) -> GrayImageU8 {
        let mut m = GrayImageU8::filled(w, h, 0);
        for &x in xs {
            for y in 10..h - 10 {
                m.set(x, y, 255);
            }
        }
        for &y in ys {
            for x in 10..w - 10 {
                m.set(x, y, 255);
            }
        }
        m
    }

    #[test]
    fn finds_axis_aligned_lines() {
        let m = mask_with_lines(200, 200, &[50, 120], &[80]);
        let segs = find_segments(&m, &HoughOptions::default(), SegmentSearch::new(80.0, 5));
        let c = classify_segments(&segs, 15);
        let mut xs: Vec<i32> = c.vertical.iter().map(|s| s.p0[0]).collect();
        xs.sort();
        xs.dedup();
        assert_eq!(xs, vec![50, 120]);
        assert_eq!(c.horizontal.len(), 1);
        assert_eq!(c.horizontal[0].p0[1], 80);
        assert!(c.horizontal[0].length() >= 170.0);
        assert!(segs.iter().all(|s| s.orientation(15).is_some()));
    }

    #[test]
    fn gap_tolerance_controls_splitting() {
        let mut m = mask_with_lines(200, 200, &[60], &[]);
        for y in 95..105 {
            m.set(60, y, 0);
        }
        let joined = find_segments(&m, &HoughOptions::default(), SegmentSearch::new(80.0, 15));
        let split = find_segments(&m, &HoughOptions::default(), SegmentSearch::new(80.0, 5));
        let longest = |v: &[LineSegment]| v.iter().map(|s| s.length()).fold(0.0, f32::max);
        assert!(longest(&joined) >= 170.0);
        assert!(longest(&split) < 100.0);
        assert!(split
            .iter()
            .all(|s| s.orientation(15) == Some(Orientation::Vertical)));
    }

    #[test]
    fn empty_mask_has_no_segments() {
        let m = GrayImageU8::filled(50, 50, 0);
        let searches = SegmentSearch::grid(&[80.0, 100.0, 120.0], &[5, 10, 15]);
        assert_eq!(searches.len(), 9);
        assert!(find_segments_multi(&m, &HoughOptions::default(), &searches).is_empty());
    }
}

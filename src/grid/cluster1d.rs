//! 1-D chain clustering of line coordinates.
//!
//! Coordinates are sorted; a new cluster starts whenever a value lies more
//! than `tol` beyond the previous value (chain merge, not distance to the
//! cluster centre). The tolerance adapts to the data: `0.4 × mean gap`,
//! bounded to `[min_tol, max_tol]`.
use serde::Deserialize;

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct ClusterOptions {
    pub min_tol: f32,
    pub max_tol: f32,
    pub gap_fraction: f32,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            min_tol: 10.0,
            max_tol: 20.0,
            gap_fraction: 0.4,
        }
    }
}

/// Tolerance for an already sorted coordinate list.
pub fn adaptive_tolerance(sorted: &[i32], opts: &ClusterOptions) -> f32 {
    if sorted.len() < 2 {
        return opts.min_tol;
    }
    let span = (sorted[sorted.len() - 1] - sorted[0]) as f32;
    let mean_gap = span / (sorted.len() - 1) as f32;
    (mean_gap * opts.gap_fraction)
        .max(opts.min_tol)
        .min(opts.max_tol)
}

/// Cluster coordinates; each cluster is represented by its truncated mean.
pub fn cluster_coords(coords: &[i32], opts: &ClusterOptions) -> Vec<i32> {
    if coords.is_empty() {
        return Vec::new();
    }
    let mut sorted = coords.to_vec();
    sorted.sort_unstable();
    let tol = adaptive_tolerance(&sorted, opts);

    let mut clusters: Vec<Vec<i32>> = Vec::new();
    for c in sorted {
        match clusters.last_mut() {
            Some(cur) if cur.last().is_some_and(|&last| (c - last) as f32 <= tol) => cur.push(c),
            _ => clusters.push(vec![c]),
        }
    }
    clusters
        .iter()
        .map(|cl| {
            let sum: i64 = cl.iter().map(|&v| v as i64).sum();
            (sum as f64 / cl.len() as f64) as i32
        })
        .collect()
}

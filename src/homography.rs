//! Planar homography helpers: corner ordering, the four-point solve and
//! point mapping.
use nalgebra::{Matrix3, SMatrix, SVector, Vector3};

const EPS: f64 = 1e-9;

/// Order four corners as `[top-left, top-right, bottom-right, bottom-left]`.
///
/// Top-left has the smallest `x + y`, bottom-right the largest; top-right has
/// the smallest `y - x`, bottom-left the largest.
pub fn order_corners(pts: &[[f64; 2]; 4]) -> [[f64; 2]; 4] {
    let pick = |key: &dyn Fn(&[f64; 2]) -> f64, largest: bool| {
        let mut best = pts[0];
        for p in &pts[1..] {
            let better = if largest {
                key(p) > key(&best)
            } else {
                key(p) < key(&best)
            };
            if better {
                best = *p;
            }
        }
        best
    };
    let sum = |p: &[f64; 2]| p[0] + p[1];
    let diff = |p: &[f64; 2]| p[1] - p[0];
    [
        pick(&sum, false),
        pick(&diff, false),
        pick(&sum, true),
        pick(&diff, true),
    ]
}

/// Homography mapping each `src[i]` onto `dst[i]`, or `None` when the
/// configuration is degenerate (e.g. three collinear points).
pub fn perspective_transform(src: &[[f64; 2]; 4], dst: &[[f64; 2]; 4]) -> Option<Matrix3<f64>> {
    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();
    for i in 0..4 {
        let [x, y] = src[i];
        let [u, v] = dst[i];
        let r = 2 * i;
        a[(r, 0)] = x;
        a[(r, 1)] = y;
        a[(r, 2)] = 1.0;
        a[(r, 6)] = -x * u;
        a[(r, 7)] = -y * u;
        b[r] = u;
        a[(r + 1, 3)] = x;
        a[(r + 1, 4)] = y;
        a[(r + 1, 5)] = 1.0;
        a[(r + 1, 6)] = -x * v;
        a[(r + 1, 7)] = -y * v;
        b[r + 1] = v;
    }
    let h = a.lu().solve(&b)?;
    if h.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let m = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0);
    if m.determinant().abs() <= EPS {
        return None;
    }
    Some(m)
}

/// Map points through `h`; `None` if any lands at infinity.
pub fn apply_homography_points(h: &Matrix3<f64>, pts: &[[f64; 2]]) -> Option<Vec<[f64; 2]>> {
    let mut out = Vec::with_capacity(pts.len());
    for &p in pts {
        let v = h * Vector3::new(p[0], p[1], 1.0);
        let w = v[2];
        if !w.is_finite() || w.abs() <= EPS || !v[0].is_finite() || !v[1].is_finite() {
            return None;
        }
        out.push([v[0] / w, v[1] / w]);
    }
    Some(out)
}

fn dist(a: [f64; 2], b: [f64; 2]) -> f64 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt()
}

/// Size of the fronto-parallel rectangle for ordered corners: the longer of
/// each pair of opposite sides, truncated to whole pixels.
pub fn rectified_size(ordered: &[[f64; 2]; 4]) -> (u32, u32) {
    let [tl, tr, br, bl] = *ordered;
    let w = dist(br, bl).max(dist(tr, tl));
    let h = dist(tr, br).max(dist(tl, bl));
    (w as u32, h as u32)
}

//! Grid spacing estimation from clustered line coordinates.

/// Median of a non-empty slice (mean of the two middle values for even
/// lengths). Returns `None` when empty.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.total_cmp(b));
    let m = v.len();
    Some(if m % 2 == 1 {
        v[m / 2]
    } else {
        0.5 * (v[m / 2 - 1] + v[m / 2])
    })
}

/// Consecutive differences strictly above `min_gap`.
pub fn filtered_gaps(lines: &[i32], min_gap: i32) -> Vec<f64> {
    lines
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|&d| d > min_gap)
        .map(f64::from)
        .collect()
}

/// Median grid spacing in pixels, `None` when no gap survives the filter.
pub fn median_spacing(lines: &[i32], min_gap: i32) -> Option<f64> {
    median(&filtered_gaps(lines, min_gap))
}

/// Number of lines strictly between `lo` and `hi`.
pub fn lines_inside(lines: &[i32], lo: i32, hi: i32) -> usize {
    lines.iter().filter(|&&c| lo < c && c < hi).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_gaps_are_ignored() {
        let lines = [60, 100, 110, 140, 180, 220];
        assert_eq!(filtered_gaps(&lines, 20), vec![40.0, 30.0, 40.0, 40.0]);
        assert_eq!(median_spacing(&lines, 20), Some(40.0));
    }

    #[test]
    fn even_count_median_averages_middle_pair() {
        assert_eq!(median(&[40.0, 30.0, 42.0, 38.0]), Some(39.0));
        assert_eq!(median(&[]), None);
        assert_eq!(median_spacing(&[10, 25], 20), None);
    }

    #[test]
    fn counts_lines_strictly_inside() {
        let lines = [60, 100, 140, 180];
        assert_eq!(lines_inside(&lines, 60, 180), 2);
        assert_eq!(lines_inside(&lines, 59, 181), 4);
    }
}

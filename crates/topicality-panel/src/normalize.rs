//! Per-company normalizations of weekly meme volume.

use ndarray::{s, Array1, ArrayView1};

/// Weeks in the trailing baseline for `num_memes_rel`.
pub const BASELINE_WEEKS: usize = 8;

/// Minimum observed weeks before a baseline is defined.
pub const BASELINE_MIN_WEEKS: usize = 3;

/// Z-scores against the series mean and sample standard deviation.
///
/// An undefined (fewer than two values) or zero deviation yields 0.0 for
/// every element.
pub fn zscores(values: ArrayView1<f64>) -> Array1<f64> {
    let n = values.len();
    if n < 2 {
        return Array1::zeros(n);
    }
    let mean = values.mean().unwrap_or(0.0);
    let sd = values.std(1.0);
    if !sd.is_finite() || sd == 0.0 {
        return Array1::zeros(n);
    }
    values.mapv(|v| (v - mean) / sd)
}

/// Each value divided by the mean of up to `window` preceding values.
///
/// Positions with fewer than `min_periods` preceding values, a zero
/// baseline, or a non-finite ratio yield 1.0.
pub fn relative_to_baseline(
    values: ArrayView1<f64>,
    window: usize,
    min_periods: usize,
) -> Array1<f64> {
    Array1::from_iter((0..values.len()).map(|i| {
        let start = i.saturating_sub(window);
        let prior = values.slice(s![start..i]);
        if prior.len() < min_periods.max(1) {
            return 1.0;
        }
        let baseline = prior.mean().unwrap_or(0.0);
        let ratio = values[i] / baseline;
        if baseline == 0.0 || !ratio.is_finite() {
            1.0
        } else {
            ratio
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_zscores() {
        let z = zscores(array![1.0, 2.0, 3.0].view());
        assert!((z[0] + 1.0).abs() < 1e-12);
        assert!(z[1].abs() < 1e-12);
        assert!((z[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zscores_degenerate() {
        assert_eq!(zscores(array![4.0, 4.0, 4.0].view()), array![0.0, 0.0, 0.0]);
        assert_eq!(zscores(array![4.0].view()), array![0.0]);
        assert_eq!(zscores(Array1::<f64>::zeros(0).view()).len(), 0);
    }

    #[test]
    fn test_relative_to_baseline() {
        let v = array![2.0, 4.0, 6.0, 8.0, 0.0, 5.0];
        let rel = relative_to_baseline(v.view(), BASELINE_WEEKS, BASELINE_MIN_WEEKS);
        // First three weeks have fewer than three prior weeks
        assert_eq!(rel.slice(s![..3]), array![1.0, 1.0, 1.0]);
        assert!((rel[3] - 2.0).abs() < 1e-12);
        assert_eq!(rel[4], 0.0);
        assert!((rel[5] - 1.25).abs() < 1e-12);
    }

    #[test]
    fn test_relative_window_and_zero_baseline() {
        let v = array![0.0, 0.0, 0.0, 3.0];
        let rel = relative_to_baseline(v.view(), BASELINE_WEEKS, BASELINE_MIN_WEEKS);
        assert_eq!(rel[3], 1.0);

        let v = array![100.0, 1.0, 1.0, 1.0, 2.0];
        let rel = relative_to_baseline(v.view(), 3, 3);
        assert!((rel[4] - 2.0).abs() < 1e-12);
    }
}

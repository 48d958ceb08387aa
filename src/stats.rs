//! Statistics kernel (C1).
//!
//! Free functions over `&[f64]` slices: sort, mean, median, interquartile
//! mean, population standard deviation, and excess kurtosis. Grounded on
//! `original_source/loco.c`'s `stat_array_*` family; the bodies weren't in
//! the retrieval pack, so these are reconstructed from spec.md's
//! definitions and the call-site usage in the session phases.

/// Sentinel returned by [`kurtosis`] when the input is too small or
/// degenerate (zero variance) to produce a meaningful value.
pub const KURTOSIS_SENTINEL: f64 = -99999.0;

/// Returns a sorted copy of `values`.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.partial_cmp(b).expect("NaN in sample array"));
    v
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median of an already-sorted slice.
pub fn median(sorted_values: &[f64]) -> f64 {
    let n = sorted_values.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        sorted_values[n / 2]
    } else {
        (sorted_values[n / 2 - 1] + sorted_values[n / 2]) / 2.0
    }
}

/// Mean of the values strictly between the 25th and 75th percentile of an
/// already-sorted slice. Falls back to the plain mean when the
/// interquartile window is empty (too few samples).
pub fn interquartile_mean(sorted_values: &[f64]) -> f64 {
    let n = sorted_values.len();
    if n == 0 {
        return 0.0;
    }
    let lo = n / 4;
    let hi = (3 * n) / 4;
    if lo >= hi {
        return mean(sorted_values);
    }
    mean(&sorted_values[lo..hi])
}

/// Population standard deviation (divides by `n`, not `n - 1`), matching
/// loco.c's `stat_array_std` usage across small calibration sample sets.
pub fn population_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n as f64;
    variance.sqrt()
}

/// Excess kurtosis (`m4 / m2^2 - 3`). Returns [`KURTOSIS_SENTINEL`] when
/// there are fewer than 4 samples or the variance is zero, matching
/// spec.md §4.9's "kurtosis sentinel of -99999 signals degeneracy".
pub fn kurtosis(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 4 {
        return KURTOSIS_SENTINEL;
    }
    let m = mean(values);
    let m2 = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n as f64;
    if m2 == 0.0 {
        return KURTOSIS_SENTINEL;
    }
    let m4 = values.iter().map(|v| (v - m).powi(4)).sum::<f64>() / n as f64;
    m4 / (m2 * m2) - 3.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median(&[1.0, 2.0, 3.0]), 2.0);
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
    }

    #[test]
    fn interquartile_mean_trims_tails() {
        let data: Vec<f64> = (1..=100).map(|v| v as f64).collect();
        let iqm = interquartile_mean(&data);
        // middle half is 26..=75, mean = 50.5
        assert!((iqm - 50.5).abs() < 1e-9);
    }

    #[test]
    fn interquartile_mean_falls_back_on_small_input() {
        assert_eq!(interquartile_mean(&[5.0, 6.0]), mean(&[5.0, 6.0]));
    }

    #[test]
    fn population_std_of_constant_is_zero() {
        assert_eq!(population_std(&[3.0, 3.0, 3.0]), 0.0);
    }

    #[test]
    fn kurtosis_sentinel_for_small_n() {
        assert_eq!(kurtosis(&[1.0, 2.0, 3.0]), KURTOSIS_SENTINEL);
    }

    #[test]
    fn kurtosis_sentinel_for_zero_variance() {
        assert_eq!(kurtosis(&[4.0, 4.0, 4.0, 4.0]), KURTOSIS_SENTINEL);
    }

    #[test]
    fn kurtosis_of_uniform_is_negative() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let k = kurtosis(&data);
        assert!(k < 0.0, "uniform distribution should be platykurtic: {k}");
    }

    #[test]
    fn sorted_does_not_mutate_input() {
        let data = [3.0, 1.0, 2.0];
        assert_eq!(sorted(&data), vec![1.0, 2.0, 3.0]);
        assert_eq!(data, [3.0, 1.0, 2.0]);
    }
}

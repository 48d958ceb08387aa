//! Modal analyzer (C9).
//!
//! Greedy extraction of statistical modes from a sorted sample array: a
//! central bin search, followed by independent left/right "bell" growth
//! with a decaying-tolerance absorption rule, mirroring
//! `original_source/loco.c`'s `calculate_mode`.

use crate::defaults::{BIN_COUNT_NOISE_THRESHOLD, BIN_COUNT_TOLERANCE};
use crate::stats;

#[derive(Debug, Clone, PartialEq)]
pub struct Mode {
    pub count: u32,
    pub lo: f64,
    pub hi: f64,
    pub bell_count: u32,
    pub bell_lo: f64,
    pub bell_hi: f64,
    pub bell_kurtosis: f64,
}

impl Mode {
    pub fn midpoint(&self) -> f64 {
        (self.lo + self.hi) / 2.0
    }

    /// `bell_kurtosis × (count / total)`, the merit heuristic used by the
    /// decision procedure (C10) to pick among several modes.
    pub fn merit(&self, total: u32) -> f64 {
        if total == 0 {
            return 0.0;
        }
        self.bell_kurtosis * (self.count as f64 / total as f64)
    }
}

#[derive(Debug)]
pub enum Extraction {
    /// No valid samples remain; the caller's loop is done.
    NoSamples,
    /// A candidate bin was found but rejected (too small, or degenerate
    /// kurtosis); its indices are already marked invalid.
    Rejected,
    Accepted(Mode),
}

fn count_valid_in_range(valid: &[bool], lo: usize, hi: usize) -> u32 {
    valid[lo..=hi].iter().filter(|&&v| v).count() as u32
}

/// Extract a single mode from `array`/`valid`, mutating `valid` to mark the
/// consumed bell range invalid regardless of accept/reject.
pub fn extract_once(array: &[f64], valid: &mut [bool], bin_width: f64) -> Extraction {
    if !valid.iter().any(|&v| v) {
        return Extraction::NoSamples;
    }

    // Central bin: widest window (by count) of *contiguous* raw indices
    // with array[hi]-array[lo] <= bin_width. An invalid index breaks
    // contiguity outright rather than being skipped over, so `l` resets
    // past it instead of sliding through the gap.
    let mut l = 0usize;
    let mut best_l = 0usize;
    let mut best_r = 0usize;
    let mut best_count = 0u32;
    for r in 0..array.len() {
        if !valid[r] {
            l = r + 1;
            continue;
        }
        while array[r] - array[l] > bin_width {
            l += 1;
        }
        let count = (r - l + 1) as u32;
        if count > best_count {
            best_count = count;
            best_l = l;
            best_r = r;
        }
    }
    let bin_lo = best_l;
    let bin_hi = best_r;
    let central_count = best_count;

    let mut bell_lo = bin_lo;
    let mut bell_hi = bin_hi;

    // Left-expand: repeatedly absorb the bin_width-wide window immediately
    // to the left of the current bell edge, as long as its count stays
    // within tolerance of the most recently absorbed window's count. The
    // first invalid slot adjacent to the edge stops expansion cold — it is
    // never jumped over.
    let mut prior_count = central_count;
    while bell_lo > 0 && valid[bell_lo - 1] {
        let r_candidate = bell_lo - 1;
        let mut l_candidate = r_candidate;
        while l_candidate > 0
            && valid[l_candidate - 1]
            && array[r_candidate] - array[l_candidate - 1] <= bin_width
        {
            l_candidate -= 1;
        }
        let count = count_valid_in_range(valid, l_candidate, r_candidate);
        let tolerance = BIN_COUNT_TOLERANCE * prior_count as f64;
        if (count as f64) < prior_count as f64 + tolerance {
            bell_lo = l_candidate;
            prior_count = count;
        } else {
            break;
        }
    }

    // Right-expand: symmetric, independent tolerance chain starting again
    // from the central bin's count.
    let mut prior_count = central_count;
    while bell_hi + 1 < valid.len() && valid[bell_hi + 1] {
        let l_candidate = bell_hi + 1;
        let mut r_candidate = l_candidate;
        while r_candidate + 1 < valid.len()
            && valid[r_candidate + 1]
            && array[r_candidate + 1] - array[l_candidate] <= bin_width
        {
            r_candidate += 1;
        }
        let count = count_valid_in_range(valid, l_candidate, r_candidate);
        let tolerance = BIN_COUNT_TOLERANCE * prior_count as f64;
        if (count as f64) < prior_count as f64 + tolerance {
            bell_hi = r_candidate;
            prior_count = count;
        } else {
            break;
        }
    }

    let bell_values: Vec<f64> = (bell_lo..=bell_hi)
        .filter(|&i| valid[i])
        .map(|i| array[i])
        .collect();
    let bell_count = bell_values.len() as u32;

    for v in valid.iter_mut().take(bell_hi + 1).skip(bell_lo) {
        *v = false;
    }

    if central_count <= BIN_COUNT_NOISE_THRESHOLD {
        return Extraction::Rejected;
    }

    let bell_kurtosis = stats::kurtosis(&bell_values);
    if bell_kurtosis == stats::KURTOSIS_SENTINEL {
        return Extraction::Rejected;
    }

    Extraction::Accepted(Mode {
        count: central_count,
        lo: array[bin_lo],
        hi: array[bin_hi],
        bell_count,
        bell_lo: array[bell_lo],
        bell_hi: array[bell_hi],
        bell_kurtosis,
    })
}

/// Drive [`extract_once`] to completion over a fresh validity bitmap,
/// collecting every accepted mode. Rejected bins are skipped but still
/// consume their indices, matching `calculate_mode`'s return-0-keep-going
/// behavior in `session_p1_calculate`/`session_p2_calculate`.
pub fn extract_all(array: &[f64], bin_width: f64) -> Vec<Mode> {
    let mut valid = vec![true; array.len()];
    let mut modes = Vec::new();
    loop {
        match extract_once(array, &mut valid, bin_width) {
            Extraction::NoSamples => break,
            Extraction::Rejected => continue,
            Extraction::Accepted(mode) => modes.push(mode),
        }
    }
    modes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_array_returns_no_samples() {
        let array: Vec<f64> = vec![];
        let mut valid: Vec<bool> = vec![];
        assert!(matches!(
            extract_once(&array, &mut valid, 1.0),
            Extraction::NoSamples
        ));
    }

    #[test]
    fn tight_cluster_yields_one_mode_then_stops() {
        let array: Vec<f64> = (0..20).map(|i| 50.0 + i as f64 * 0.01).collect();
        let modes = extract_all(&array, 6.0);
        assert_eq!(modes.len(), 1);
        assert_eq!(modes[0].count, 20);
        assert!(modes[0].bell_lo <= modes[0].lo);
        assert!(modes[0].hi <= modes[0].bell_hi);
        assert!(modes[0].bell_count >= modes[0].count);
    }

    #[test]
    fn two_well_separated_clusters_yield_two_modes() {
        let mut array: Vec<f64> = Vec::new();
        for i in 0..20 {
            array.push(10.0 + i as f64 * 0.01);
        }
        for i in 0..20 {
            array.push(50.0 + i as f64 * 0.01);
        }
        array.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let modes = extract_all(&array, 1.0);
        assert_eq!(modes.len(), 2);
    }

    #[test]
    fn idempotence_on_fresh_bitmap() {
        let array: Vec<f64> = (0..30).map(|i| i as f64 * 0.1).collect();
        let first = extract_all(&array, 1.0);
        let second = extract_all(&array, 1.0);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.lo, b.lo);
            assert_eq!(a.hi, b.hi);
        }
    }

    #[test]
    fn central_bin_does_not_span_an_invalidated_gap() {
        // Raw indices 4,5 already consumed by a prior extraction. The full
        // span 0..=6 fits bin_width (5.0-1.0=4.0 <= 4.0), but the gap must
        // stop the window at indices 0..=3 (count 4) rather than treating
        // 0,1,2,3,6 as one contiguous window of count 5.
        let array = vec![1.0, 2.0, 3.0, 4.0, 4.5, 4.6, 5.0];
        let mut valid = vec![true, true, true, true, false, false, true];
        match extract_once(&array, &mut valid, 4.0) {
            Extraction::Accepted(mode) => assert_eq!(mode.count, 4),
            other => panic!("expected an accepted 4-count bin, got {other:?}"),
        }
    }

    #[test]
    fn noise_threshold_rejects_tiny_bins() {
        // Two samples, far apart: each is its own "central bin" of count 1,
        // which is <= BIN_COUNT_NOISE_THRESHOLD (3), so both get rejected
        // and extraction terminates with no accepted modes.
        let array = vec![1.0, 100.0];
        let modes = extract_all(&array, 0.5);
        assert!(modes.is_empty());
    }
}

//! Decision procedure (C10).
//!
//! Combines Phase-1 and Phase-2 modes into a final bandwidth estimate.
//! Grounded on spec.md §4.10 and `original_source/loco.c`'s
//! `session_calculate`, with the two Open-Question corrections from
//! spec.md §9 applied rather than reproduced literally:
//!
//! - the unimodal Phase-2 branch uses `(lo + hi) / 2` of the single mode,
//!   never indexing a second, nonexistent mode;
//! - the Phase-1 search only reaches `Assessment::NoMode` when phase 1
//!   actually completed; `Assessment::LBound` is reachable when it did not.

use crate::defaults::{ADR_THRESHOLD, BW_COVAR_THRESHOLD};
use crate::modal::{self, Mode};
use crate::stats;
use crate::types::{Assessment, Estimate, Sample};

fn best_merit(modes: &[Mode], total: u32) -> Option<&Mode> {
    modes.iter().max_by(|a, b| {
        a.merit(total)
            .partial_cmp(&b.merit(total))
            .unwrap_or(std::cmp::Ordering::Equal)
    })
}

pub fn decide(
    p1_samples: &[Sample],
    p2_samples: &[Sample],
    prelim_bw_mean: f64,
    bin_width: f64,
    phase1_completed: bool,
) -> Estimate {
    let p2_bw: Vec<f64> = p2_samples.iter().map(|s| s.bandwidth).collect();
    let p2_sorted = stats::sorted(&p2_bw);
    let mut adr = stats::interquartile_mean(&p2_sorted);
    let adr_std = stats::population_std(&p2_bw);

    let p2_modes = modal::extract_all(&p2_sorted, bin_width);

    if p2_modes.len() == 1
        && adr != 0.0
        && (adr_std / adr) < BW_COVAR_THRESHOLD
        && prelim_bw_mean != 0.0
        && (adr / prelim_bw_mean) < ADR_THRESHOLD
    {
        adr = p2_modes[0].midpoint();
    } else if p2_modes.len() > 1 {
        if let Some(mode) = best_merit(&p2_modes, p2_samples.len() as u32) {
            adr = mode.midpoint();
        }
    }

    let p1_bw: Vec<f64> = p1_samples.iter().map(|s| s.bandwidth).collect();
    let p1_sorted = stats::sorted(&p1_bw);
    let p1_modes = modal::extract_all(&p1_sorted, bin_width);

    let candidates: Vec<&Mode> = p1_modes.iter().filter(|m| m.hi > adr).collect();
    let chosen = candidates.into_iter().max_by(|a, b| {
        let total = p1_samples.len() as u32;
        a.merit(total)
            .partial_cmp(&b.merit(total))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    match chosen {
        Some(mode) => Estimate {
            bandwidth: mode.midpoint(),
            lo: mode.lo,
            hi: mode.hi,
            assessment: Assessment::Mode,
        },
        None if phase1_completed => Estimate {
            bandwidth: adr,
            lo: adr - bin_width,
            hi: adr + bin_width,
            assessment: Assessment::NoMode,
        },
        None => Estimate {
            bandwidth: adr,
            lo: adr,
            hi: adr + bin_width,
            assessment: Assessment::LBound,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(values: &[f64]) -> Vec<Sample> {
        values
            .iter()
            .map(|&bandwidth| Sample {
                bandwidth,
                delta: 1000.0,
            })
            .collect()
    }

    #[test]
    fn unimodal_mode_selected_when_p1_mode_exceeds_adr() {
        let p2 = samples(&vec![50.0; 30]);
        let mut p1 = vec![10.0; 20];
        p1.extend(vec![48.0; 20]);
        let estimate = decide(&samples(&p1), &p2, 48.0, 1.0, true);
        assert_eq!(estimate.assessment, Assessment::Mode);
    }

    #[test]
    fn nomode_when_no_p1_mode_exceeds_adr_and_phase1_completed() {
        let p2 = samples(&vec![52.0; 30]);
        let p1 = samples(&vec![10.0; 30]);
        let estimate = decide(&p1, &p2, 10.0, 1.0, true);
        assert_eq!(estimate.assessment, Assessment::NoMode);
    }

    #[test]
    fn lbound_when_phase1_did_not_complete() {
        let p2 = samples(&vec![52.0; 30]);
        let estimate = decide(&[], &p2, 10.0, 1.0, false);
        assert_eq!(estimate.assessment, Assessment::LBound);
        assert!(estimate.lo <= estimate.hi);
    }
}

//! Shared domain types for the sample pipeline (C4-C10).
//!
//! Grounded on spec.md §3's data model; `SampleSet` replaces loco.c's fixed
//! `double p1_trains_bw[4096]`/`delta[4096]` arrays with a capped `Vec`
//! per spec.md §9's redesign note.

use crate::defaults::SAMPLE_SET_CAP;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub bandwidth: f64,
    pub delta: f64,
}

#[derive(Debug, Clone, Default)]
pub struct SampleSet {
    samples: Vec<Sample>,
    discarded: u32,
}

impl SampleSet {
    pub fn new() -> Self {
        Self {
            samples: Vec::new(),
            discarded: 0,
        }
    }

    /// Records a valid sample. Returns `Err(())` without truncating if the
    /// set is already at [`SAMPLE_SET_CAP`] — callers count this as a
    /// discard, matching spec.md §5's "refuse to overflow rather than
    /// silently truncate".
    pub fn push(&mut self, sample: Sample) -> Result<(), ()> {
        if self.samples.len() >= SAMPLE_SET_CAP {
            self.discarded += 1;
            return Err(());
        }
        self.samples.push(sample);
        Ok(())
    }

    pub fn discard(&mut self) {
        self.discarded += 1;
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn discarded(&self) -> u32 {
        self.discarded
    }

    pub fn bandwidths_sorted(&self) -> Vec<f64> {
        crate::stats::sorted(
            &self
                .samples
                .iter()
                .map(|s| s.bandwidth)
                .collect::<Vec<f64>>(),
        )
    }
}

/// The assessment class emitted alongside the final bandwidth estimate.
///
/// Discriminants mirror loco.c's `BW_ASSESS_*` declaration order
/// (`UNKNOWN, QUICK, MODE, NOMODE, LBOUND`, with `INDETERMINATE`/`GIGABIT`
/// appended for the discovery-phase outcomes the original folds into
/// `BW_ASSESS_UNKNOWN`) so `%am` reports the same numeric assessment code
/// `result_format_write` does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Assessment {
    /// Discovery produced zero valid samples.
    Indeterminate = 0,
    /// PRELIM's covariance (or the `--quick` flag) short-circuited the run.
    Quick = 1,
    /// A Phase-1 mode with `hi > adr` and maximum merit was found.
    Mode = 2,
    /// No qualifying Phase-1 mode; the ADR interval is reported directly.
    NoMode = 3,
    /// Phase 1 never completed; only a lower bound is available.
    LBound = 4,
    /// Discovery's valid-sample fraction implied a gigabit-class link.
    Gigabit = 5,
}

impl std::fmt::Display for Assessment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Assessment::Quick => "QUICK",
            Assessment::Mode => "MODE",
            Assessment::NoMode => "NOMODE",
            Assessment::LBound => "LBOUND",
            Assessment::Indeterminate => "INDETERMINATE",
            Assessment::Gigabit => "GIGABIT",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub bandwidth: f64,
    pub lo: f64,
    pub hi: f64,
    pub assessment: Assessment,
}

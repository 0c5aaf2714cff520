//! Per-replication performance metrics and their averages.
//!
//! Conventions (they shift the reported expectations, so they are fixed here):
//! - **power** = true rejections / true alternatives, and `0` when there are no alternatives;
//! - **fdp** = false rejections / rejections, and `0` when nothing is rejected. The empirical FDR
//!   is therefore `E[V/R; R > 0]`, the Benjamini-Hochberg definition.

use crate::{Result, SimError};

/// Normal quantile for the 95% FWER interval.
pub const FWER_Z: f64 = 1.96;

/// Metrics for one method on one replication.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricRecord {
    pub power: f64,
    /// False discovery proportion.
    pub fdp: f64,
    pub rejections: usize,
    pub false_rejections: usize,
}

/// Compare a rejection vector against the ground truth (`true` = alternative).
///
/// Fails with [`SimError::LabelLength`] when the two vectors differ in length.
pub fn aggregate(rejections: &[bool], alternative: &[bool]) -> Result<MetricRecord> {
    if rejections.len() != alternative.len() {
        return Err(SimError::LabelLength {
            decisions: rejections.len(),
            labels: alternative.len(),
        });
    }
    let mut n_alt = 0usize;
    let mut rejected = 0usize;
    let mut true_rejections = 0usize;
    for (&r, &alt) in rejections.iter().zip(alternative) {
        n_alt += usize::from(alt);
        if r {
            rejected += 1;
            true_rejections += usize::from(alt);
        }
    }
    let false_rejections = rejected - true_rejections;
    Ok(MetricRecord {
        power: ratio_or_zero(true_rejections, n_alt),
        fdp: ratio_or_zero(false_rejections, rejected),
        rejections: rejected,
        false_rejections,
    })
}

fn ratio_or_zero(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Averages of [`MetricRecord`]s over the replications of one configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricSummary {
    pub n_reps: usize,
    pub mean_power: f64,
    /// Empirical FDR.
    pub mean_fdp: f64,
    /// Fraction of replications with at least one false rejection.
    pub fwer: f64,
    /// Wilson score interval around `fwer` at [`FWER_Z`].
    pub fwer_lo: f64,
    pub fwer_hi: f64,
    pub mean_rejections: f64,
}

/// Streaming accumulator, so a configuration need not keep every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricAccumulator {
    n: usize,
    power_sum: f64,
    fdp_sum: f64,
    any_false: u64,
    rejections: u64,
}

impl MetricAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, r: MetricRecord) {
        self.n += 1;
        self.power_sum += r.power;
        self.fdp_sum += r.fdp;
        self.any_false += u64::from(r.false_rejections > 0);
        self.rejections += r.rejections as u64;
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn summary(&self) -> MetricSummary {
        if self.n == 0 {
            return MetricSummary::default();
        }
        let n = self.n as f64;
        let (fwer_lo, fwer_hi) = fwer_interval(self.any_false, self.n as u64);
        MetricSummary {
            n_reps: self.n,
            mean_power: self.power_sum / n,
            mean_fdp: self.fdp_sum / n,
            fwer: self.any_false as f64 / n,
            fwer_lo,
            fwer_hi,
            mean_rejections: self.rejections as f64 / n,
        }
    }
}

impl Extend<MetricRecord> for MetricAccumulator {
    fn extend<I: IntoIterator<Item = MetricRecord>>(&mut self, iter: I) {
        for r in iter {
            self.push(r);
        }
    }
}

/// Arithmetic mean of each metric over `records` (all zero when empty).
pub fn summarize(records: &[MetricRecord]) -> MetricSummary {
    let mut acc = MetricAccumulator::new();
    acc.extend(records.iter().copied());
    acc.summary()
}

/// Wilson score interval at [`FWER_Z`] for the FWER estimate `any_false / n_reps`.
///
/// `(0, 1)` when there are no replications.
pub fn fwer_interval(any_false: u64, n_reps: u64) -> (f64, f64) {
    if n_reps == 0 {
        return (0.0, 1.0);
    }
    let n = n_reps as f64;
    let rate = any_false.min(n_reps) as f64 / n;
    let z2 = FWER_Z * FWER_Z;
    let shrink = 1.0 / (1.0 + z2 / n);
    let mid = shrink * (rate + z2 / (2.0 * n));
    let spread = shrink * FWER_Z * (rate * (1.0 - rate) / n + z2 / (4.0 * n * n)).sqrt();
    ((mid - spread).max(0.0), (mid + spread).min(1.0))
}

//! Hypothesis means: zeros for the nulls, four signal levels for the alternatives.
//!
//! Rounding policy (fixed, so exact counts are reproducible):
//! - `m0 = round_half_even(m * null_proportion)`, clamped to `m`;
//! - level `j` gets `round_half_even(w_j * m1 / sum(w))`, computed in integers;
//! - any remainder goes to the highest level, or is taken from the highest non-empty levels
//!   when rounding overshot.
//!
//! The vector is ascending (zeros, then `L/4 .. L`), so the same noise row produces outcomes that
//! are monotonically related across shapes.

use crate::{config, Config, Result, Shape};

/// Number of true nulls for `m` hypotheses at `null_proportion`.
pub fn null_count(m: usize, null_proportion: f64) -> usize {
    let raw = (m as f64) * null_proportion;
    if !raw.is_finite() || raw <= 0.0 {
        return 0;
    }
    (raw.round_ties_even() as usize).min(m)
}

/// The four alternative means for signal strength `L`, lowest first.
pub fn signal_levels(signal: f64) -> [f64; 4] {
    [signal / 4.0, signal / 2.0, 3.0 * signal / 4.0, signal]
}

/// Split `m1` alternatives across the four signal levels according to `shape`.
pub fn level_counts(m1: usize, shape: Shape) -> [usize; 4] {
    let weights = shape.weights();
    let total: usize = weights.iter().sum();
    let mut counts = weights.map(|w| round_ratio_half_even(w * m1, total));

    let assigned: usize = counts.iter().sum();
    if assigned < m1 {
        counts[3] += m1 - assigned;
    } else {
        let mut excess = assigned - m1;
        for c in counts.iter_mut().rev() {
            let take = excess.min(*c);
            *c -= take;
            excess -= take;
            if excess == 0 {
                break;
            }
        }
    }
    counts
}

/// `num / den` rounded half-to-even, exactly.
fn round_ratio_half_even(num: usize, den: usize) -> usize {
    let q = num / den;
    let twice_rem = 2 * (num % den);
    match twice_rem.cmp(&den) {
        std::cmp::Ordering::Less => q,
        std::cmp::Ordering::Greater => q + 1,
        std::cmp::Ordering::Equal => q + (q % 2),
    }
}

/// Ascending vector of hypothesis means plus the ground-truth labels.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeanVector {
    values: Vec<f64>,
    alternative: Vec<bool>,
    m0: usize,
    level_counts: [usize; 4],
}

impl MeanVector {
    /// Build the means a configuration implies.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        build_means(cfg.m, cfg.null_proportion, cfg.shape, cfg.signal)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// `true` for hypotheses whose mean is nonzero (true alternatives).
    pub fn alternative(&self) -> &[bool] {
        &self.alternative
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.m0
    }

    pub fn alternative_count(&self) -> usize {
        self.values.len() - self.m0
    }

    /// Alternatives at each of the four signal levels.
    pub fn level_counts(&self) -> [usize; 4] {
        self.level_counts
    }
}

/// Build the ascending mean vector for one configuration.
pub fn build_means(
    m: usize,
    null_proportion: f64,
    shape: Shape,
    signal: f64,
) -> Result<MeanVector> {
    config::validate_m(m)?;
    config::validate_null_proportion(null_proportion)?;
    config::validate_signal(signal)?;

    let m0 = null_count(m, null_proportion);
    let counts = level_counts(m - m0, shape);
    let levels = signal_levels(signal);

    let mut values = Vec::with_capacity(m);
    values.resize(m0, 0.0);
    for (&level, &count) in levels.iter().zip(counts.iter()) {
        values.extend(std::iter::repeat(level).take(count));
    }
    debug_assert!(values.windows(2).all(|w| w[0] <= w[1]));

    let alternative = values.iter().map(|&v| v != 0.0).collect();
    Ok(MeanVector {
        values,
        alternative,
        m0,
        level_counts: counts,
    })
}

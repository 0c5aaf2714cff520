//! Two-sided z-test p-values against a null mean of zero with known variance.

use statrs::function::erf::erfc;
use std::f64::consts::SQRT_2;

/// Two-sided normal tail probability `P(|Z| >= |z|)`.
///
/// Computed as `erfc(|z| / sqrt(2))`, which equals `2 * (1 - Phi(|z|))` without the cancellation
/// in the far tail. `z = 0` gives exactly 1; `NaN` is treated as no evidence (p = 1).
#[must_use]
pub fn two_sided_p(z: f64) -> f64 {
    if z.is_nan() {
        return 1.0;
    }
    if z.is_infinite() {
        return 0.0;
    }
    erfc(z.abs() / SQRT_2).clamp(0.0, 1.0)
}

/// P-values for a row of single-draw observations (standard error 1).
pub fn pvalues(observations: &[f64]) -> Vec<f64> {
    pvalues_with_se(observations, 1.0)
}

/// P-values for observations with standard error `se` (`z = x / se`).
pub fn pvalues_with_se(observations: &[f64], se: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(observations.len());
    pvalues_into(observations, se, &mut out);
    out
}

/// Buffer-reusing form of [`pvalues_with_se`]; `out` is cleared first.
pub fn pvalues_into(observations: &[f64], se: f64, out: &mut Vec<f64>) {
    out.clear();
    out.extend(observations.iter().map(|&x| two_sided_p(x / se)));
}

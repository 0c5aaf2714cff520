//! Multiple-testing correction procedures.
//!
//! Three procedures share one contract: `(p-values, alpha) -> rejection vector`.
//!
//! - **Bonferroni**: reject `i` iff `p_i <= alpha / m`.
//! - **Hochberg**: with `p_(1) <= .. <= p_(m)`, find the largest `i` with
//!   `p_(i) <= alpha / (m + 1 - i)` and reject ranks `1..=i`.
//! - **Benjamini-Hochberg**: find the largest `k` with `p_(k) <= (k / m) * q` and reject
//!   ranks `1..=k`.
//!
//! Hochberg and BH scan from the least significant rank downward and stop at the first rank that
//! passes its own threshold; that is the *largest* passing rank, which is what both procedures
//! require. Stopping at the first ascending match would be wrong.
//!
//! Every threshold is `(num / den) * alpha`. Floating-point rounding is monotone, so the exact
//! ties between procedures (`i = 1` and `i = m`) produce bit-identical thresholds and
//! `Bonferroni ⊆ Hochberg ⊆ BH` holds without an epsilon.
//!
//! Ranks come from a stable sort on `f64::total_cmp` with the original index as tie-break.
//! `NaN` sorts last and is never rejected.

use std::cmp::Ordering;
use std::fmt;

/// The closed set of correction procedures in the study.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Method {
    Bonferroni,
    Hochberg,
    #[cfg_attr(feature = "serde", serde(rename = "BH", alias = "BenjaminiHochberg"))]
    BenjaminiHochberg,
}

impl Method {
    /// Every method, most conservative first.
    pub const ALL: [Method; 3] = [
        Method::Bonferroni,
        Method::Hochberg,
        Method::BenjaminiHochberg,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Method::Bonferroni => "Bonferroni",
            Method::Hochberg => "Hochberg",
            Method::BenjaminiHochberg => "BH",
        }
    }

    /// Position in [`Method::ALL`].
    pub fn index(self) -> usize {
        match self {
            Method::Bonferroni => 0,
            Method::Hochberg => 1,
            Method::BenjaminiHochberg => 2,
        }
    }

    /// Rejection decision for every hypothesis.
    pub fn decide(self, pvalues: &[f64], alpha: f64) -> Vec<bool> {
        let mut order = Vec::new();
        let mut out = Vec::new();
        self.decide_into(pvalues, alpha, &mut order, &mut out);
        out
    }

    /// Buffer-reusing form of [`Method::decide`].
    ///
    /// `order` is scratch space for the rank order; `out` receives the decisions. Both are
    /// cleared first.
    pub fn decide_into(
        self,
        pvalues: &[f64],
        alpha: f64,
        order: &mut Vec<usize>,
        out: &mut Vec<bool>,
    ) {
        out.clear();
        out.resize(pvalues.len(), false);
        let m = pvalues.len();
        if m == 0 {
            return;
        }
        match self {
            Method::Bonferroni => {
                let threshold = scaled(alpha, 1, m);
                for (r, &p) in out.iter_mut().zip(pvalues) {
                    *r = p <= threshold;
                }
            }
            Method::Hochberg => {
                ascending_order_into(pvalues, order);
                let k = largest_passing_rank(pvalues, order, |i| scaled(alpha, 1, m + 1 - i));
                reject_prefix(order, k, out);
            }
            Method::BenjaminiHochberg => {
                ascending_order_into(pvalues, order);
                let k = largest_passing_rank(pvalues, order, |i| scaled(alpha, i, m));
                reject_prefix(order, k, out);
            }
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Bonferroni: reject `i` iff `p_i <= alpha / m`.
pub fn bonferroni(pvalues: &[f64], alpha: f64) -> Vec<bool> {
    Method::Bonferroni.decide(pvalues, alpha)
}

/// Hochberg: reject the ranks up to the largest `i` with `p_(i) <= alpha / (m + 1 - i)`.
pub fn hochberg(pvalues: &[f64], alpha: f64) -> Vec<bool> {
    Method::Hochberg.decide(pvalues, alpha)
}

/// Benjamini-Hochberg at FDR level `q`: reject the ranks up to the largest `k` with
/// `p_(k) <= (k / m) * q`.
pub fn benjamini_hochberg(pvalues: &[f64], q: f64) -> Vec<bool> {
    Method::BenjaminiHochberg.decide(pvalues, q)
}

/// Indices of `pvalues` in ascending order (ties by original index).
pub fn ascending_order(pvalues: &[f64]) -> Vec<usize> {
    let mut order = Vec::new();
    ascending_order_into(pvalues, &mut order);
    order
}

fn ascending_order_into(pvalues: &[f64], order: &mut Vec<usize>) {
    order.clear();
    order.extend(0..pvalues.len());
    order.sort_by(|&a, &b| match pvalues[a].total_cmp(&pvalues[b]) {
        Ordering::Equal => a.cmp(&b),
        o => o,
    });
}

#[inline]
fn scaled(alpha: f64, num: usize, den: usize) -> f64 {
    (num as f64 / den as f64) * alpha
}

/// Largest 1-based rank `i` with `p_(i) <= threshold(i)`, scanning down from `m`; 0 if none.
fn largest_passing_rank<F>(pvalues: &[f64], order: &[usize], threshold: F) -> usize
where
    F: Fn(usize) -> f64,
{
    for i in (1..=order.len()).rev() {
        if pvalues[order[i - 1]] <= threshold(i) {
            return i;
        }
    }
    0
}

fn reject_prefix(order: &[usize], k: usize, out: &mut [bool]) {
    for &idx in &order[..k] {
        out[idx] = true;
    }
}

//! Post-hoc analysis of traced configuration runs.
//!
//! Summaries here go beyond the averaged [`SummaryRow`](crate::SummaryRow): distribution
//! statistics per method, power gains over Bonferroni, and a check of the BH FDR bound
//! `pi0 * alpha`.

use crate::{Config, ConfigurationRun, Method, MetricRecord};
use statrs::statistics::{Data, OrderStatistics, Statistics};

/// Relative slack allowed when checking the BH FDR bound (Monte Carlo error).
pub const FDR_BOUND_TOLERANCE: f64 = 1.10;

/// Location and spread of a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Distribution {
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation.
    pub sd: f64,
    pub min: f64,
    pub max: f64,
    pub q25: f64,
    pub q75: f64,
}

/// Describe a sample; `None` when it is empty or contains no finite values.
pub fn describe(values: &[f64]) -> Option<Distribution> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    let s = sorted.as_slice();
    Some(Distribution {
        mean: s.mean(),
        median: Data::new(sorted.clone()).median(),
        sd: s.population_std_dev(),
        min: Statistics::min(s),
        max: Statistics::max(s),
        q25: percentile_sorted(s, 25.0)?,
        q75: percentile_sorted(s, 75.0)?,
    })
}

/// Linear-interpolation percentile (`q` in `[0, 100]`) of an ascending slice.
///
/// Matches numpy's default; statrs' `quantile` uses a different estimator.
fn percentile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let pos = (q.clamp(0.0, 100.0) / 100.0) * last as f64;
    let lo = pos.floor() as usize;
    let hi = (pos.ceil() as usize).min(last);
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Distribution of each metric for one method.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MethodStats {
    pub method: Method,
    /// `None` when the configuration has no true alternatives.
    pub power: Option<Distribution>,
    pub fdp: Option<Distribution>,
}

/// Power of a method relative to Bonferroni.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PowerGain {
    pub method: Method,
    /// `power / bonferroni_power`; `None` when Bonferroni's power is 0.
    pub ratio: Option<f64>,
    pub difference: f64,
}

/// Full analysis of one traced configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfigurationAnalysis {
    pub config: Config,
    pub methods: Vec<MethodStats>,
    /// Gains of Hochberg and BH over Bonferroni.
    pub gains: Vec<PowerGain>,
    /// BH controls the FDR at `null_proportion * alpha`.
    pub fdr_bound: f64,
    /// BH mean FDP is within [`FDR_BOUND_TOLERANCE`] of the bound.
    pub fdr_controlled: bool,
}

impl ConfigurationAnalysis {
    pub fn method(&self, method: Method) -> Option<&MethodStats> {
        self.methods.iter().find(|s| s.method == method)
    }

    pub fn gain(&self, method: Method) -> Option<&PowerGain> {
        self.gains.iter().find(|g| g.method == method)
    }
}

/// Analyze a run produced with `keep_trace = true`; `None` without a trace.
pub fn analyze(run: &ConfigurationRun) -> Option<ConfigurationAnalysis> {
    let degenerate = run.config.is_degenerate();
    let mut methods = Vec::with_capacity(Method::ALL.len());
    for method in Method::ALL {
        let recs = run.trace_for(method)?;
        methods.push(MethodStats {
            method,
            power: if degenerate {
                None
            } else {
                describe(&column(recs, |r| r.power))
            },
            fdp: describe(&column(recs, |r| r.fdp)),
        });
    }

    let mean_power = |m: Method| run.row(m).map_or(0.0, |r| r.mean_power);
    let base = mean_power(Method::Bonferroni);
    let gains = [Method::Hochberg, Method::BenjaminiHochberg]
        .into_iter()
        .map(|method| {
            let p = mean_power(method);
            PowerGain {
                method,
                ratio: (base > 0.0).then(|| p / base),
                difference: p - base,
            }
        })
        .collect();

    let fdr_bound = run.config.null_proportion * run.config.alpha;
    let bh_fdr = run
        .row(Method::BenjaminiHochberg)
        .map_or(0.0, |r| r.mean_fdp);

    Some(ConfigurationAnalysis {
        config: run.config,
        methods,
        gains,
        fdr_bound,
        fdr_controlled: bh_fdr <= fdr_bound * FDR_BOUND_TOLERANCE,
    })
}

fn column(recs: &[MetricRecord], f: impl Fn(&MetricRecord) -> f64) -> Vec<f64> {
    recs.iter().map(f).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{run_configuration, BaseNoise, Shape};

    #[test]
    fn describe_matches_hand_computation() {
        let d = describe(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(d.mean, 2.5);
        assert_eq!(d.median, 2.5);
        assert_eq!(d.min, 1.0);
        assert_eq!(d.max, 4.0);
        assert!((d.q25 - 1.75).abs() < 1e-12);
        assert!((d.q75 - 3.25).abs() < 1e-12);
        assert!((d.sd - 1.25f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn describe_skips_non_finite_and_empty() {
        assert!(describe(&[]).is_none());
        assert!(describe(&[f64::NAN]).is_none());
        let d = describe(&[f64::NAN, 2.0]).unwrap();
        assert_eq!(d.median, 2.0);
        assert_eq!(d.sd, 0.0);
    }

    #[test]
    fn percentile_interpolates_and_rejects_empty() {
        assert_eq!(percentile_sorted(&[], 50.0), None);
        assert_eq!(percentile_sorted(&[3.0], 90.0), Some(3.0));
        assert_eq!(percentile_sorted(&[0.0, 10.0], 25.0), Some(2.5));
        assert_eq!(percentile_sorted(&[0.0, 10.0], 150.0), Some(10.0));
    }

    #[test]
    fn analyze_requires_a_trace() {
        let cfg = Config::new(4, 0.0, Shape::Equal, 5.0).with_reps(5);
        let run = run_configuration(&cfg, &BaseNoise::zeros(5, 4), false).unwrap();
        assert!(analyze(&run).is_none());
    }

    #[test]
    fn analyze_reports_gains_and_bound() {
        let cfg = Config::new(16, 0.5, Shape::Equal, 5.0).with_reps(300);
        let noise = BaseNoise::generate(16, 300, 11).unwrap();
        let run = run_configuration(&cfg, &noise, true).unwrap();
        let a = analyze(&run).unwrap();
        assert_eq!(a.methods.len(), 3);
        assert!((a.fdr_bound - 0.025).abs() < 1e-15);
        for g in &a.gains {
            assert!(g.difference >= 0.0, "{:?}", g);
            assert!(g.ratio.is_some_and(|r| r >= 1.0));
        }
        let bh = a.method(Method::BenjaminiHochberg).unwrap();
        assert!(bh.power.is_some());
        assert!(bh.fdp.unwrap().max <= 1.0);
    }

    #[test]
    fn degenerate_configuration_has_no_power_distribution() {
        let cfg = Config::new(8, 1.0, Shape::Equal, 5.0).with_reps(10);
        let run = run_configuration(&cfg, &BaseNoise::zeros(10, 8), true).unwrap();
        let a = analyze(&run).unwrap();
        assert!(a.methods.iter().all(|s| s.power.is_none()));
        assert!(a.gains.iter().all(|g| g.ratio.is_none()));
        // All p-values are 1 under zero noise: nothing rejected, FDP 0.
        assert!(a.fdr_controlled);
    }
}

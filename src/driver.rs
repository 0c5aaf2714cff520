//! Configuration driver: runs one configuration, or the whole factorial sweep.
//!
//! Per replication the p-values are computed once and every method decides on that same vector,
//! so method comparisons within a replication are paired. Across configurations with the same
//! `m` the base noise is shared through a [`NoiseCache`].

use crate::{
    aggregate, observe_into, pvalues_into, BaseNoise, Config, MeanVector, Method,
    MetricAccumulator, MetricRecord, NoiseCache, Result, SeedPolicy, Shape, SimError,
    StudyDesign,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Averaged result for one `(Configuration, Method)` pair.
///
/// This is the record handed to persistence and plotting. Serialized, the signal strength is
/// keyed `L` and the method appears as `method_name` (`"Bonferroni"`, `"Hochberg"`, `"BH"`).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SummaryRow {
    pub m: usize,
    /// True nulls under the rounding policy.
    pub m0: usize,
    pub null_proportion: f64,
    pub shape: Shape,
    /// Signal strength `L`.
    #[cfg_attr(feature = "serde", serde(rename = "L"))]
    pub signal: f64,
    pub alpha: f64,
    pub n_reps: usize,
    #[cfg_attr(feature = "serde", serde(rename = "method_name"))]
    pub method: Method,
    pub mean_power: f64,
    pub mean_fdp: f64,
    pub fwer: f64,
}

impl SummaryRow {
    pub fn method_name(&self) -> &'static str {
        self.method.name()
    }
}

/// Raw per-replication records for one method.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MethodTrace {
    pub method: Method,
    pub records: Vec<MetricRecord>,
}

/// Everything one configuration produced.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfigurationRun {
    pub config: Config,
    /// One row per method, in [`Method::ALL`] order.
    pub rows: Vec<SummaryRow>,
    /// Per-replication records (only when requested).
    pub trace: Option<Vec<MethodTrace>>,
}

impl ConfigurationRun {
    pub fn row(&self, method: Method) -> Option<&SummaryRow> {
        self.rows.iter().find(|r| r.method == method)
    }

    pub fn trace_for(&self, method: Method) -> Option<&[MetricRecord]> {
        self.trace
            .as_ref()?
            .iter()
            .find(|t| t.method == method)
            .map(|t| t.records.as_slice())
    }
}

/// Run every replication of one configuration against `noise`.
///
/// `noise` must be `config.n_reps × config.m`. With `keep_trace`, the per-replication
/// [`MetricRecord`]s are returned alongside the averages.
pub fn run_configuration(
    config: &Config,
    noise: &BaseNoise,
    keep_trace: bool,
) -> Result<ConfigurationRun> {
    config.validate()?;
    noise.check_shape(config.n_reps, config.m)?;

    let means = MeanVector::from_config(config)?;
    if means.alternative_count() == 0 {
        tracing::warn!(
            m = config.m,
            null_proportion = config.null_proportion,
            "no true alternatives; power is reported as 0"
        );
    }

    let se = config.observation.standard_error();
    let mut accumulators = [MetricAccumulator::new(); 3];
    let mut traces: Option<[Vec<MetricRecord>; 3]> = keep_trace
        .then(|| std::array::from_fn(|_| Vec::with_capacity(config.n_reps)));

    let mut observations = Vec::with_capacity(config.m);
    let mut pvals = Vec::with_capacity(config.m);
    let mut order = Vec::with_capacity(config.m);
    let mut rejections = Vec::with_capacity(config.m);

    for row in noise.rows() {
        observe_into(means.values(), row, se, &mut observations);
        pvalues_into(&observations, se, &mut pvals);
        for method in Method::ALL {
            method.decide_into(&pvals, config.alpha, &mut order, &mut rejections);
            let record = aggregate(&rejections, means.alternative())?;
            accumulators[method.index()].push(record);
            if let Some(t) = traces.as_mut() {
                t[method.index()].push(record);
            }
        }
    }

    let m0 = means.null_count();
    let rows = Method::ALL
        .iter()
        .map(|&method| {
            let s = accumulators[method.index()].summary();
            SummaryRow {
                m: config.m,
                m0,
                null_proportion: config.null_proportion,
                shape: config.shape,
                signal: config.signal,
                alpha: config.alpha,
                n_reps: config.n_reps,
                method,
                mean_power: s.mean_power,
                mean_fdp: s.mean_fdp,
                fwer: s.fwer,
            }
        })
        .collect();

    let trace = traces.map(|t| {
        Method::ALL
            .iter()
            .zip(t)
            .map(|(&method, records)| MethodTrace { method, records })
            .collect()
    });

    tracing::debug!(
        m = config.m,
        null_proportion = config.null_proportion,
        shape = %config.shape,
        signal = config.signal,
        "configuration finished"
    );

    Ok(ConfigurationRun {
        config: *config,
        rows,
        trace,
    })
}

/// A configuration the sweep could not run.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepFailure {
    pub config: Config,
    pub error: SimError,
}

/// Output of a factorial sweep: successful runs plus isolated failures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepReport {
    pub runs: Vec<ConfigurationRun>,
    pub failures: Vec<SweepFailure>,
}

impl SweepReport {
    /// Every summary row, in configuration then method order.
    pub fn rows(&self) -> impl Iterator<Item = &SummaryRow> + '_ {
        self.runs.iter().flat_map(|r| r.rows.iter())
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run every configuration of `design`, sharing base noise through `cache`.
///
/// Configurations are validated before any noise is generated. An invalid configuration is
/// recorded as a [`SweepFailure`] and the sweep continues with the rest.
///
/// `cache` must have been created with `design.n_reps` replications; otherwise every
/// configuration fails with a noise-shape error.
pub fn run_sweep(design: &StudyDesign, cache: &mut NoiseCache) -> SweepReport {
    let configs = design.configurations();
    tracing::info!(
        configurations = configs.len(),
        n_reps = design.n_reps,
        seed = cache.policy().base,
        "starting sweep"
    );

    let mut report = SweepReport::default();
    let mut valid = Vec::with_capacity(configs.len());
    for config in configs {
        match config.validate() {
            Ok(()) => valid.push(config),
            Err(error) => {
                tracing::warn!(%config, %error, "skipping invalid configuration");
                report.failures.push(SweepFailure { config, error });
            }
        }
    }

    // Publish every matrix before any configuration reads one.
    let mut published: BTreeMap<usize, Result<Arc<BaseNoise>>> = BTreeMap::new();
    let jobs: Vec<(Config, Result<Arc<BaseNoise>>)> = valid
        .into_iter()
        .map(|config| {
            let noise = published
                .entry(config.m)
                .or_insert_with(|| cache.get_or_generate(config.m))
                .clone();
            (config, noise)
        })
        .collect();

    for (config, noise) in jobs {
        let outcome =
            noise.and_then(|noise| run_configuration(&config, &noise, design.keep_trace));
        match outcome {
            Ok(run) => report.runs.push(run),
            Err(error) => {
                tracing::warn!(%config, %error, "configuration failed");
                report.failures.push(SweepFailure { config, error });
            }
        }
    }

    tracing::info!(
        runs = report.runs.len(),
        failures = report.failures.len(),
        "sweep finished"
    );
    report
}

/// Run `design` with a fresh cache seeded from `design.seed`.
pub fn run_study(design: &StudyDesign) -> SweepReport {
    let mut cache = NoiseCache::new(SeedPolicy::new(design.seed), design.n_reps);
    run_sweep(design, &mut cache)
}

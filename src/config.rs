//! Simulation configuration: one run (`Config`) and the factorial sweep (`StudyDesign`).
//!
//! Both are plain data. Validation happens up front (`Config::validate`) so a configuration is
//! either rejected before any work starts or runs to completion.

use crate::{Result, SimError};
use std::fmt;
use std::str::FromStr;

/// Null proportions in the factorial design.
pub const NULL_PROPORTIONS: [f64; 4] = [0.0, 0.25, 0.5, 0.75];

/// Hypothesis counts in the default design.
pub const DEFAULT_MS: [usize; 5] = [4, 8, 16, 32, 64];

/// Signal strengths (`L`) in the default design.
pub const DEFAULT_SIGNALS: [f64; 2] = [5.0, 10.0];

pub const DEFAULT_ALPHA: f64 = 0.05;
pub const DEFAULT_REPS: usize = 20_000;
pub const DEFAULT_SEED: u64 = 12_345;

/// Null proportion accepted outside the design grid: every hypothesis is null.
///
/// Runs, but power is reported as 0 by convention.
pub const DEGENERATE_NULL_PROPORTION: f64 = 1.0;

const PROPORTION_TOL: f64 = 1e-12;

/// How the alternative signal levels are distributed across the non-null hypotheses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Shape {
    /// Linearly decreasing: 40/30/20/10 percent from `L/4` up to `L`.
    #[cfg_attr(feature = "serde", serde(rename = "D", alias = "Decreasing"))]
    Decreasing,
    /// Equal: 25 percent at each level.
    #[cfg_attr(feature = "serde", serde(rename = "E", alias = "Equal"))]
    Equal,
    /// Linearly increasing: 10/20/30/40 percent.
    #[cfg_attr(feature = "serde", serde(rename = "I", alias = "Increasing"))]
    Increasing,
}

impl Shape {
    pub const ALL: [Shape; 3] = [Shape::Decreasing, Shape::Equal, Shape::Increasing];

    /// One-letter code used in reports (`D`, `E`, `I`).
    pub fn code(self) -> char {
        match self {
            Shape::Decreasing => 'D',
            Shape::Equal => 'E',
            Shape::Increasing => 'I',
        }
    }

    /// Relative weight of each signal level, lowest level first.
    pub fn weights(self) -> [usize; 4] {
        match self {
            Shape::Decreasing => [4, 3, 2, 1],
            Shape::Equal => [1, 1, 1, 1],
            Shape::Increasing => [1, 2, 3, 4],
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Shape {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "d" | "decreasing" => Ok(Shape::Decreasing),
            "e" | "equal" => Ok(Shape::Equal),
            "i" | "increasing" => Ok(Shape::Increasing),
            _ => Err(SimError::InvalidShape(s.to_string())),
        }
    }
}

/// What one "observation" of a hypothesis is.
///
/// The study is ambiguous about whether each hypothesis sees a single normal draw or the mean of
/// `n` draws. Both share the same base noise: a sample mean is `mean + noise / sqrt(n)` and is
/// tested with standard error `1 / sqrt(n)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ObservationModel {
    #[default]
    SingleDraw,
    SampleMean {
        n: u32,
    },
}

impl ObservationModel {
    /// Standard error of one observation (known unit variance per draw).
    pub fn standard_error(self) -> f64 {
        match self {
            ObservationModel::SingleDraw => 1.0,
            ObservationModel::SampleMean { n } => 1.0 / f64::from(n.max(1)).sqrt(),
        }
    }

    pub fn validate(self) -> Result<()> {
        match self {
            ObservationModel::SampleMean { n: 0 } => Err(SimError::InvalidSampleSize),
            _ => Ok(()),
        }
    }
}

/// One simulation run: fully determines the summary rows it produces (given the noise).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Total number of hypotheses.
    pub m: usize,
    /// Fraction of hypotheses that are truly null.
    pub null_proportion: f64,
    pub shape: Shape,
    /// Signal strength `L`; alternative means are `L/4, L/2, 3L/4, L`.
    pub signal: f64,
    pub alpha: f64,
    pub n_reps: usize,
    pub observation: ObservationModel,
}

impl Config {
    /// Create a configuration with the default alpha, replication count and observation model.
    pub fn new(m: usize, null_proportion: f64, shape: Shape, signal: f64) -> Self {
        Self {
            m,
            null_proportion,
            shape,
            signal,
            alpha: DEFAULT_ALPHA,
            n_reps: DEFAULT_REPS,
            observation: ObservationModel::SingleDraw,
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_reps(mut self, n_reps: usize) -> Self {
        self.n_reps = n_reps;
        self
    }

    pub fn with_observation(mut self, observation: ObservationModel) -> Self {
        self.observation = observation;
        self
    }

    /// Reject configurations outside the design space.
    pub fn validate(&self) -> Result<()> {
        validate_m(self.m)?;
        validate_null_proportion(self.null_proportion)?;
        validate_signal(self.signal)?;
        validate_alpha(self.alpha)?;
        if self.n_reps == 0 {
            return Err(SimError::NoReplications);
        }
        self.observation.validate()
    }

    /// Number of true nulls `m0` under the crate's rounding policy.
    pub fn null_count(&self) -> usize {
        crate::null_count(self.m, self.null_proportion)
    }

    /// Number of true alternatives `m1 = m - m0`.
    pub fn alternative_count(&self) -> usize {
        self.m - self.null_count()
    }

    /// True when there are no alternatives (power is reported as 0).
    pub fn is_degenerate(&self) -> bool {
        self.alternative_count() == 0
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "m={} null={:.0}% shape={} L={} alpha={} reps={}",
            self.m,
            self.null_proportion * 100.0,
            self.shape,
            self.signal,
            self.alpha,
            self.n_reps
        )
    }
}

pub(crate) fn validate_m(m: usize) -> Result<()> {
    if m == 0 {
        return Err(SimError::EmptyFamily);
    }
    Ok(())
}

pub(crate) fn validate_null_proportion(p: f64) -> Result<()> {
    let on_grid = NULL_PROPORTIONS
        .iter()
        .chain(std::iter::once(&DEGENERATE_NULL_PROPORTION))
        .any(|&g| (p - g).abs() <= PROPORTION_TOL);
    if on_grid {
        Ok(())
    } else {
        Err(SimError::InvalidNullProportion(p))
    }
}

pub(crate) fn validate_signal(signal: f64) -> Result<()> {
    if signal.is_finite() && signal > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidSignal(signal))
    }
}

pub(crate) fn validate_alpha(alpha: f64) -> Result<()> {
    if alpha > 0.0 && alpha <= 1.0 {
        Ok(())
    } else {
        Err(SimError::InvalidAlpha(alpha))
    }
}

/// The factorial sweep: `ms × null_proportions × shapes × signals`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StudyDesign {
    pub ms: Vec<usize>,
    pub null_proportions: Vec<f64>,
    pub shapes: Vec<Shape>,
    pub signals: Vec<f64>,
    pub alpha: f64,
    pub n_reps: usize,
    /// Base seed; per-m noise seeds are derived from it.
    pub seed: u64,
    pub observation: ObservationModel,
    /// Keep per-replication metric records (needed for `analysis::analyze`).
    pub keep_trace: bool,
}

impl Default for StudyDesign {
    fn default() -> Self {
        Self {
            ms: DEFAULT_MS.to_vec(),
            null_proportions: NULL_PROPORTIONS.to_vec(),
            shapes: Shape::ALL.to_vec(),
            signals: DEFAULT_SIGNALS.to_vec(),
            alpha: DEFAULT_ALPHA,
            n_reps: DEFAULT_REPS,
            seed: DEFAULT_SEED,
            observation: ObservationModel::SingleDraw,
            keep_trace: false,
        }
    }
}

impl StudyDesign {
    pub fn with_reps(mut self, n_reps: usize) -> Self {
        self.n_reps = n_reps;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_trace(mut self, keep_trace: bool) -> Self {
        self.keep_trace = keep_trace;
        self
    }

    /// Enumerate every configuration, ordered by `m`, then null proportion, shape, and signal.
    pub fn configurations(&self) -> Vec<Config> {
        let mut out = Vec::with_capacity(
            self.ms.len() * self.null_proportions.len() * self.shapes.len() * self.signals.len(),
        );
        for &m in &self.ms {
            for &null_proportion in &self.null_proportions {
                for &shape in &self.shapes {
                    for &signal in &self.signals {
                        out.push(Config {
                            m,
                            null_proportion,
                            shape,
                            signal,
                            alpha: self.alpha,
                            n_reps: self.n_reps,
                            observation: self.observation,
                        });
                    }
                }
            }
        }
        out
    }
}

//! `fdrsim`: a deterministic Monte Carlo study of multiple-testing procedures.
//!
//! Reproduces and extends the classic power comparison of Bonferroni, Hochberg (1988), and
//! Benjamini-Hochberg (1995): `m` independent z-tests, a fraction of them truly null, the rest
//! with means at four signal levels `L/4, L/2, 3L/4, L` spread according to a distribution shape
//! (decreasing, equal, increasing).
//!
//! **Pipeline** (one configuration):
//! - [`NoiseCache`] / [`get_base_noise`]: one `n_reps × m` standard-normal matrix per `m`,
//!   shared by every configuration with that `m` (common random numbers).
//! - [`build_means`]: ascending mean vector plus ground-truth labels.
//! - [`synthesize`]: `observation = mean + noise`, row by row.
//! - [`pvalues`]: two-sided z-test p-values.
//! - [`Method`]: Bonferroni / Hochberg / BH decisions on the *same* p-values.
//! - [`aggregate`] / [`summarize`]: power and false discovery proportion, averaged.
//! - [`run_configuration`] / [`run_sweep`]: the driver, yielding one [`SummaryRow`] per
//!   configuration and method.
//!
//! **Goals:**
//! - **Deterministic**: same design + seed → bit-identical rows.
//! - **Comparable**: methods share p-values per replication; configurations share noise per `m`,
//!   and means are sorted so a given noise row moves every shape in the same direction.
//! - **Isolated failures**: an invalid configuration is reported and skipped, never fatal to the
//!   sweep.
//!
//! **Non-goals:**
//! - Not a general statistics library: exactly three procedures, one distributional family.
//! - No file I/O, plotting, or CLI. Results are plain data (`serde` behind the `serde` feature).
//!
//! # Conventions
//!
//! - Power is 0 when a configuration has no true alternatives.
//! - FDP is 0 when nothing is rejected, so the empirical FDR is `E[V/R; R > 0]`.
//! - Counts are rounded half-to-even; see [`level_counts`] for the remainder rule.
//!
//! # Example
//!
//! ```rust
//! use fdrsim::{run_study, Shape, StudyDesign};
//!
//! let design = StudyDesign {
//!     ms: vec![8],
//!     null_proportions: vec![0.5],
//!     shapes: vec![Shape::Equal],
//!     signals: vec![5.0],
//!     ..StudyDesign::default()
//! }
//! .with_reps(200);
//!
//! let report = run_study(&design);
//! assert!(report.is_complete());
//! for row in report.rows() {
//!     assert!((0.0..=1.0).contains(&row.mean_power));
//! }
//! ```

#![forbid(unsafe_code)]

mod error;
pub use error::*;

mod config;
pub use config::*;

mod seed;
pub use seed::*;

mod noise;
pub use noise::*;

mod means;
pub use means::*;

mod synth;
pub use synth::*;

mod pvalue;
pub use pvalue::*;

mod procedure;
pub use procedure::*;

mod metrics;
pub use metrics::*;

mod driver;
pub use driver::*;

pub mod analysis;

//! Error taxonomy for configuration and input validation.

/// Errors raised while validating a configuration or pairing it with noise.
///
/// Everything except the noise-shape and label-length variants is an *invalid configuration*:
/// it is detected before any simulation work for that configuration starts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    #[error("hypothesis count m must be positive")]
    EmptyFamily,

    #[error("null proportion {0} is not one of 0, 0.25, 0.5, 0.75 (or the degenerate 1)")]
    InvalidNullProportion(f64),

    #[error("unknown distribution shape {0:?} (expected D, E, or I)")]
    InvalidShape(String),

    #[error("significance level {0} must lie in (0, 1]")]
    InvalidAlpha(f64),

    #[error("signal strength {0} must be finite and positive")]
    InvalidSignal(f64),

    #[error("replication count must be positive")]
    NoReplications,

    #[error("sample-mean observation model needs at least one draw per hypothesis")]
    InvalidSampleSize,

    #[error("noise matrix is {rows}x{cols}, expected {expected_rows}x{expected_cols}")]
    NoiseShape {
        rows: usize,
        cols: usize,
        expected_rows: usize,
        expected_cols: usize,
    },

    #[error("noise buffer holds {len} values, expected {expected}")]
    NoiseLength { len: usize, expected: usize },

    #[error("{decisions} decisions for {labels} ground-truth labels")]
    LabelLength { decisions: usize, labels: usize },
}

impl SimError {
    /// True for errors that reject a configuration outright.
    pub fn is_invalid_configuration(&self) -> bool {
        !matches!(
            self,
            Self::NoiseShape { .. } | Self::NoiseLength { .. } | Self::LabelLength { .. }
        )
    }
}

/// Crate result alias.
pub type Result<T, E = SimError> = std::result::Result<T, E>;

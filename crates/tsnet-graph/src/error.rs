use tsnet_metrics::MetricError;

/// Errors from network construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// Returned when a matrix has missing cells and no replacement policy was given.
    #[error("distance matrix has a missing value at ({row}, {col}); choose a replacement policy")]
    UnresolvedMissing {
        /// Row of the first missing cell.
        row: usize,
        /// Column of the first missing cell.
        col: usize,
    },

    /// Returned when `1 - D` weights are requested for distances outside `[0, 1]`.
    #[error("weight 1 - D needs distances in [0, 1], found {value} at ({row}, {col})")]
    WeightsOutOfRange {
        /// Row of the offending cell.
        row: usize,
        /// Column of the offending cell.
        col: usize,
        /// Offending distance.
        value: f64,
    },

    /// Returned when an option is outside its accepted range.
    #[error("invalid {name} = {value}: expected {expected}")]
    InvalidParameter {
        /// Option name.
        name: &'static str,
        /// Offending value.
        value: f64,
        /// Human-readable accepted range.
        expected: &'static str,
    },

    /// Returned when a series is too short for the requested embedding.
    #[error("series of length {len} is too short, need at least {min}")]
    TooShort {
        /// Actual length.
        len: usize,
        /// Minimum accepted length.
        min: usize,
    },

    /// Wraps a series validation error.
    #[error("invalid series: {0}")]
    Metric(#[from] MetricError),
}

impl GraphError {
    pub(crate) fn invalid(name: &'static str, value: f64, expected: &'static str) -> Self {
        Self::InvalidParameter { name, value, expected }
    }
}

/// Reject empty or non-finite input series.
pub(crate) fn validate_series(x: &[f64]) -> Result<(), GraphError> {
    if x.is_empty() {
        return Err(MetricError::EmptySeries.into());
    }
    if let Some(index) = x.iter().position(|v| !v.is_finite()) {
        return Err(MetricError::NonFiniteValue { index }.into());
    }
    Ok(())
}

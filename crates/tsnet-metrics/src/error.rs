//! Error types for distance computation and event extraction.

/// Errors from distance functions, series validation, and option validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetricError {
    /// Returned when an empty slice is provided as a time series.
    #[error("time series must be non-empty")]
    EmptySeries,

    /// Returned when a time series contains NaN, infinity, or negative infinity.
    #[error("time series contains non-finite value at index {index}")]
    NonFiniteValue {
        /// Position of the first non-finite value found.
        index: usize,
    },

    /// Returned when a metric needs equal-length inputs and gets two different lengths.
    #[error("series lengths differ: {left} vs {right}")]
    LengthMismatch {
        /// Length of the first series.
        left: usize,
        /// Length of the second series.
        right: usize,
    },

    /// Returned when a series is shorter than the metric requires.
    #[error("series of length {len} is too short, need at least {min}")]
    TooShort {
        /// Actual length.
        len: usize,
        /// Minimum accepted length.
        min: usize,
    },

    /// Returned when a correlation-type metric sees a series with zero variance.
    #[error("series has zero variance")]
    ConstantSeries,

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

    /// Returned when a highest-k / lowest-k event rule asks for more events than samples.
    #[error("cannot mark {k} events in a series of length {len}")]
    InvalidEventCount {
        /// Requested number of events.
        k: usize,
        /// Series length.
        len: usize,
    },

    /// Returned when the raw-count event synchronization method is requested without a test.
    #[error("the Boers event synchronization method is only valid with a significance test")]
    BoersWithoutTest,
}

impl MetricError {
    pub(crate) fn invalid(name: &'static str, value: f64, expected: &'static str) -> Self {
        Self::InvalidParameter { name, value, expected }
    }
}

//! Maximum cross-correlation distance over a lag window.

use serde::{Deserialize, Serialize};

use crate::correlation::CorrelationSign;
use crate::error::MetricError;
use crate::metric::{SeriesDistance, require_equal_len};
use crate::stats::mean;

/// Result of a cross-correlation comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossCorrelation {
    /// `1 - max` filtered cross-correlation over the lag window.
    pub distance: f64,
    /// Lag at which the maximum is attained. Positive lags pair `a[t + lag]` with `b[t]`.
    pub lag: isize,
}

/// Cross-correlation distance.
///
/// The cross-correlation at lag `k` is `sum (a[t+k] - mean a)(b[t] - mean b) / (n sd_a sd_b)`
/// with population standard deviations. Lags run over `[-max_lag, max_lag]`, or
/// `[-max_lag, 0]` when `directed`. `max_lag` is capped at `n - 1`.
///
/// # Defaults
///
/// | Parameter | Default |
/// |---|---|
/// | `sign` | [`CorrelationSign::Absolute`] |
/// | `directed` | `false` |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossCorrelationDistance {
    max_lag: usize,
    directed: bool,
    sign: CorrelationSign,
}

impl CrossCorrelationDistance {
    /// Create a cross-correlation distance over lags `[-max_lag, max_lag]`.
    #[must_use]
    pub fn new(max_lag: usize) -> Self {
        Self {
            max_lag,
            directed: false,
            sign: CorrelationSign::Absolute,
        }
    }

    /// Restrict the window to non-positive lags (`b` leading `a`).
    #[must_use]
    pub fn with_directed(mut self, directed: bool) -> Self {
        self.directed = directed;
        self
    }

    /// Set which sign of cross-correlation counts as similarity.
    #[must_use]
    pub fn with_sign(mut self, sign: CorrelationSign) -> Self {
        self.sign = sign;
        self
    }

    /// Return the maximum lag.
    #[must_use]
    pub fn max_lag(&self) -> usize {
        self.max_lag
    }

    /// Return whether only non-positive lags are considered.
    #[must_use]
    pub fn directed(&self) -> bool {
        self.directed
    }

    /// Compute the distance together with the lag of maximum cross-correlation.
    ///
    /// Ties keep the most negative lag.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`MetricError::LengthMismatch`] | inputs differ in length |
    /// | [`MetricError::TooShort`] | fewer than 2 observations |
    /// | [`MetricError::ConstantSeries`] | either input has zero variance |
    pub fn distance_with_lag(&self, a: &[f64], b: &[f64]) -> Result<CrossCorrelation, MetricError> {
        let n = require_equal_len(a, b)?;
        if n < 2 {
            return Err(MetricError::TooShort { len: n, min: 2 });
        }
        let (ma, mb) = (mean(a), mean(b));
        let ss_a: f64 = a.iter().map(|&v| (v - ma).powi(2)).sum();
        let ss_b: f64 = b.iter().map(|&v| (v - mb).powi(2)).sum();
        if ss_a == 0.0 || ss_b == 0.0 {
            return Err(MetricError::ConstantSeries);
        }
        // n * sd_a * sd_b with population sds
        let denom = (ss_a * ss_b).sqrt();

        let max_lag = self.max_lag.min(n - 1) as isize;
        let upper = if self.directed { 0 } else { max_lag };

        let mut best = CrossCorrelation { distance: f64::INFINITY, lag: 0 };
        let mut best_sim = f64::NEG_INFINITY;
        for lag in -max_lag..=upper {
            let r = lagged_covariance(a, b, ma, mb, lag) / denom;
            let sim = self.sign.similarity(r.clamp(-1.0, 1.0));
            if sim > best_sim {
                best_sim = sim;
                best = CrossCorrelation { distance: 1.0 - sim, lag };
            }
        }
        Ok(best)
    }
}

fn lagged_covariance(a: &[f64], b: &[f64], ma: f64, mb: f64, lag: isize) -> f64 {
    let n = a.len();
    let shift = lag.unsigned_abs();
    if lag >= 0 {
        (0..n - shift).map(|t| (a[t + shift] - ma) * (b[t] - mb)).sum()
    } else {
        (0..n - shift).map(|t| (a[t] - ma) * (b[t + shift] - mb)).sum()
    }
}

impl SeriesDistance for CrossCorrelationDistance {
    fn distance(&self, a: &[f64], b: &[f64]) -> Result<f64, MetricError> {
        Ok(self.distance_with_lag(a, b)?.distance)
    }
}

//! Van Rossum distance between event trains.
//!
//! Each train is convolved with a causal exponential kernel `exp(-t / tau)`.
//! The inner product of two filtered trains has the closed form
//! `tau / 2 * sum_ij exp(-|t_i - s_j| / tau)`, so no time grid is needed.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::MetricError;
use crate::events::EventSequence;
use crate::metric::SeriesDistance;
use crate::significance::SignificanceTest;

/// Cosine-normalized van Rossum distance in `[0, 1]`.
///
/// `1 - <f, g> / sqrt(<f, f> <g, g>)` over the filtered trains. A train
/// without events has no direction, giving distance 1. With a significance
/// test the distance is 0 when the observed value falls below the `alpha`
/// quantile of the surrogate null, 1 otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VanRossumDistance {
    tau: f64,
    significance: Option<SignificanceTest>,
}

impl VanRossumDistance {
    /// Create a van Rossum distance with kernel time constant `tau`.
    ///
    /// # Errors
    ///
    /// [`MetricError::InvalidParameter`] if `tau` is not positive and finite.
    pub fn new(tau: f64) -> Result<Self, MetricError> {
        if !(tau.is_finite() && tau > 0.0) {
            return Err(MetricError::invalid("tau", tau, "a positive finite value"));
        }
        Ok(Self {
            tau,
            significance: None,
        })
    }

    /// Switch to significance-test mode.
    #[must_use]
    pub fn with_significance(mut self, test: SignificanceTest) -> Self {
        self.significance = Some(test);
        self
    }

    /// Return the kernel time constant.
    #[must_use]
    pub fn tau(&self) -> f64 {
        self.tau
    }

    /// Return the significance test, if any.
    #[must_use]
    pub fn significance(&self) -> Option<SignificanceTest> {
        self.significance
    }

    /// Compute the distance between two event sequences.
    #[must_use]
    pub fn between(&self, x: &EventSequence, y: &EventSequence) -> f64 {
        let (ex, ey) = (x.indices(), y.indices());
        if ex.is_empty() || ey.is_empty() {
            return 1.0;
        }
        let observed = self.cosine_distance(ex, ey);
        let Some(test) = self.significance else {
            return observed;
        };
        let null = test.null_distribution((x.len(), ex.len()), (y.len(), ey.len()), |a, b| {
            self.cosine_distance(a, b)
        });
        trace!(observed, repetitions = null.len(), "van Rossum null built");
        if test.below_lower(observed, &null) { 0.0 } else { 1.0 }
    }

    fn cosine_distance(&self, x: &[usize], y: &[usize]) -> f64 {
        let fg = kernel_product(x, y, self.tau);
        let ff = kernel_product(x, x, self.tau);
        let gg = kernel_product(y, y, self.tau);
        let norm = (ff * gg).sqrt();
        if norm <= 0.0 {
            return 1.0;
        }
        (1.0 - fg / norm).clamp(0.0, 1.0)
    }
}

impl SeriesDistance for VanRossumDistance {
    fn distance(&self, a: &[f64], b: &[f64]) -> Result<f64, MetricError> {
        Ok(self.between(&EventSequence::from_binary(a), &EventSequence::from_binary(b)))
    }
}

/// Inner product of the filtered trains, up to the common factor `tau / 2`.
fn kernel_product(x: &[usize], y: &[usize], tau: f64) -> f64 {
    x.iter()
        .flat_map(|&t| y.iter().map(move |&s| (-(t.abs_diff(s) as f64) / tau).exp()))
        .sum()
}

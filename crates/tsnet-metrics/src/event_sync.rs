//! Event synchronization distance between binary event sequences.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::MetricError;
use crate::events::EventSequence;
use crate::metric::SeriesDistance;
use crate::significance::SignificanceTest;

/// How the synchronization statistic is reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncMethod {
    /// Synchronized pairs normalized by `sqrt(Nx Ny)`.
    #[default]
    Quiroga,
    /// Raw number of synchronized pairs. Only meaningful against a null model.
    Boers,
}

/// Event synchronization distance with an adaptive coincidence window.
///
/// For events `t_i` in `x` and `s_j` in `y`, the half-window is half the
/// smallest inter-event gap around either event, capped at `tau_max`. A pair
/// counts 1 when `0 < t_i - s_j <= tau` and 1/2 when simultaneous; summing in
/// both directions gives the raw statistic.
///
/// Without a test the distance is `1 - Q` (Quiroga only). With a test it is 0
/// when the statistic beats the `1 - alpha` quantile of the surrogate null,
/// 1 otherwise. Sequences without events never synchronize (distance 1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventSyncDistance {
    tau_max: f64,
    method: SyncMethod,
    significance: Option<SignificanceTest>,
}

impl EventSyncDistance {
    /// Create an event synchronization distance.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`MetricError::InvalidParameter`] | `tau_max` is not positive (infinity is allowed) |
    /// | [`MetricError::BoersWithoutTest`] | `method` is Boers and `significance` is `None` |
    pub fn new(
        tau_max: f64,
        method: SyncMethod,
        significance: Option<SignificanceTest>,
    ) -> Result<Self, MetricError> {
        if tau_max.is_nan() || tau_max <= 0.0 {
            return Err(MetricError::invalid("tau_max", tau_max, "a positive value"));
        }
        if method == SyncMethod::Boers && significance.is_none() {
            return Err(MetricError::BoersWithoutTest);
        }
        Ok(Self {
            tau_max,
            method,
            significance,
        })
    }

    /// Return the window cap.
    #[must_use]
    pub fn tau_max(&self) -> f64 {
        self.tau_max
    }

    /// Return the reporting method.
    #[must_use]
    pub fn method(&self) -> SyncMethod {
        self.method
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
        let observed = self.statistic(ex, ey);
        let Some(test) = self.significance else {
            return (1.0 - observed).clamp(0.0, 1.0);
        };
        let null = test.null_distribution((x.len(), ex.len()), (y.len(), ey.len()), |a, b| {
            self.statistic(a, b)
        });
        trace!(observed, repetitions = null.len(), "event synchronization null built");
        if test.exceeds_upper(observed, &null) { 0.0 } else { 1.0 }
    }

    fn statistic(&self, x: &[usize], y: &[usize]) -> f64 {
        let raw = synchronized_pairs(x, y, self.tau_max);
        match self.method {
            SyncMethod::Boers => raw,
            SyncMethod::Quiroga => {
                if x.is_empty() || y.is_empty() {
                    0.0
                } else {
                    raw / ((x.len() * y.len()) as f64).sqrt()
                }
            }
        }
    }
}

impl SeriesDistance for EventSyncDistance {
    fn distance(&self, a: &[f64], b: &[f64]) -> Result<f64, MetricError> {
        Ok(self.between(&EventSequence::from_binary(a), &EventSequence::from_binary(b)))
    }
}

/// `c(x|y) + c(y|x)`.
pub(crate) fn synchronized_pairs(x: &[usize], y: &[usize], tau_max: f64) -> f64 {
    let mut count = 0.0;
    for i in 0..x.len() {
        for j in 0..y.len() {
            let lag = x[i] as f64 - y[j] as f64;
            if lag == 0.0 {
                // half from each direction
                count += 1.0;
                continue;
            }
            let tau = half_window(x, i, y, j, tau_max);
            if lag.abs() <= tau {
                count += 1.0;
            }
        }
    }
    count
}

fn half_window(x: &[usize], i: usize, y: &[usize], j: usize, tau_max: f64) -> f64 {
    let gaps = neighbour_gaps(x, i).chain(neighbour_gaps(y, j));
    let smallest = gaps.fold(f64::INFINITY, f64::min);
    (smallest / 2.0).min(tau_max)
}

fn neighbour_gaps(events: &[usize], k: usize) -> impl Iterator<Item = f64> + '_ {
    let before = (k > 0).then(|| (events[k] - events[k - 1]) as f64);
    let after = (k + 1 < events.len()).then(|| (events[k + 1] - events[k]) as f64);
    before.into_iter().chain(after)
}

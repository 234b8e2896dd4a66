//! Event sequences and the rules that extract them from a time series.

use serde::{Deserialize, Serialize};

use crate::error::MetricError;
use crate::stats::quantile;

/// A binary event sequence, stored as sorted event positions plus its length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSequence {
    len: usize,
    indices: Vec<usize>,
}

impl EventSequence {
    /// Build from a binary sequence: every non-zero entry is an event.
    #[must_use]
    pub fn from_binary(values: &[f64]) -> Self {
        let indices = values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0.0)
            .map(|(i, _)| i)
            .collect();
        Self { len: values.len(), indices }
    }

    /// Build from event positions. Positions are sorted and deduplicated.
    ///
    /// # Errors
    ///
    /// [`MetricError::InvalidEventCount`] if a position falls outside `0..len`.
    pub fn from_indices(len: usize, mut indices: Vec<usize>) -> Result<Self, MetricError> {
        indices.sort_unstable();
        indices.dedup();
        if let Some(&last) = indices.last()
            && last >= len
        {
            return Err(MetricError::InvalidEventCount { k: last + 1, len });
        }
        Ok(Self { len, indices })
    }

    /// Length of the underlying series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Return true if the underlying series has length zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of events.
    #[must_use]
    pub fn count(&self) -> usize {
        self.indices.len()
    }

    /// Sorted event positions.
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Expand back to a 0/1 sequence.
    #[must_use]
    pub fn to_binary(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.len];
        for &i in &self.indices {
            out[i] = 1.0;
        }
        out
    }
}

/// How events are marked in a series. The modes are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EventRule {
    /// Values strictly above the threshold.
    GreaterThan(f64),
    /// Values strictly below the threshold.
    LowerThan(f64),
    /// Values strictly above the `1 - p` quantile, `p` in `[0, 1]`.
    TopPercentile(f64),
    /// Values strictly below the `p` quantile, `p` in `[0, 1]`.
    LowerPercentile(f64),
    /// The `k` largest values; ties go to the earlier index.
    Highest(usize),
    /// The `k` smallest values; ties go to the earlier index.
    Lowest(usize),
}

impl EventRule {
    /// Mark the events of `series` under this rule.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`MetricError::InvalidParameter`] | non-finite threshold, or percentile outside `[0, 1]` |
    /// | [`MetricError::InvalidEventCount`] | `k > series.len()` |
    pub fn apply(&self, series: &[f64]) -> Result<EventSequence, MetricError> {
        let len = series.len();
        let indices = match *self {
            Self::GreaterThan(th) => {
                check_threshold(th)?;
                positions(series, |v| v > th)
            }
            Self::LowerThan(th) => {
                check_threshold(th)?;
                positions(series, |v| v < th)
            }
            Self::TopPercentile(p) => {
                check_percentile(p)?;
                let th = quantile(series, 1.0 - p);
                positions(series, |v| v > th)
            }
            Self::LowerPercentile(p) => {
                check_percentile(p)?;
                let th = quantile(series, p);
                positions(series, |v| v < th)
            }
            Self::Highest(k) => extremes(series, k, true)?,
            Self::Lowest(k) => extremes(series, k, false)?,
        };
        Ok(EventSequence { len, indices })
    }
}

fn check_threshold(th: f64) -> Result<(), MetricError> {
    if th.is_finite() {
        Ok(())
    } else {
        Err(MetricError::invalid("threshold", th, "a finite value"))
    }
}

fn check_percentile(p: f64) -> Result<(), MetricError> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(MetricError::invalid("percentile", p, "a value in [0, 1]"))
    }
}

fn positions(series: &[f64], keep: impl Fn(f64) -> bool) -> Vec<usize> {
    series
        .iter()
        .enumerate()
        .filter(|(_, v)| keep(**v))
        .map(|(i, _)| i)
        .collect()
}

fn extremes(series: &[f64], k: usize, largest: bool) -> Result<Vec<usize>, MetricError> {
    if k > series.len() {
        return Err(MetricError::InvalidEventCount { k, len: series.len() });
    }
    let mut order: Vec<usize> = (0..series.len()).collect();
    // stable sort keeps the earlier index first among equal values
    if largest {
        order.sort_by(|&i, &j| series[j].total_cmp(&series[i]));
    } else {
        order.sort_by(|&i, &j| series[i].total_cmp(&series[j]));
    }
    order.truncate(k);
    order.sort_unstable();
    Ok(order)
}

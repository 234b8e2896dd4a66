//! The strategy interface every distance function implements.

use crate::error::MetricError;

/// A distance (or dissimilarity) between two sequences.
///
/// Implementations are immutable option structs, so a single value can be
/// shared across worker threads. A failure is reported as an `Err` and never
/// aborts a pairwise computation; the engine substitutes its sentinel.
///
/// Plain closures with the same signature implement the trait, which is how
/// ad-hoc distance functions are plugged in:
///
/// ```
/// use tsnet_metrics::{MetricError, SeriesDistance};
///
/// let l1 = |a: &[f64], b: &[f64]| -> Result<f64, MetricError> {
///     Ok(a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum())
/// };
/// assert_eq!(l1.distance(&[1.0, 2.0], &[2.0, 4.0]).unwrap(), 3.0);
/// ```
pub trait SeriesDistance: Send + Sync {
    /// Compute the distance between `a` and `b`.
    ///
    /// # Errors
    ///
    /// Any [`MetricError`] the metric raises for this particular pair.
    fn distance(&self, a: &[f64], b: &[f64]) -> Result<f64, MetricError>;
}

impl<F> SeriesDistance for F
where
    F: Fn(&[f64], &[f64]) -> Result<f64, MetricError> + Send + Sync,
{
    fn distance(&self, a: &[f64], b: &[f64]) -> Result<f64, MetricError> {
        self(a, b)
    }
}

pub(crate) fn require_equal_len(a: &[f64], b: &[f64]) -> Result<usize, MetricError> {
    if a.len() != b.len() {
        return Err(MetricError::LengthMismatch { left: a.len(), right: b.len() });
    }
    Ok(a.len())
}

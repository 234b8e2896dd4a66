//! Pearson correlation distance, optionally reduced to a significance decision.

use serde::{Deserialize, Serialize};

use crate::error::MetricError;
use crate::metric::SeriesDistance;
use crate::stats::{correlation_p_value, pearson};

/// Which sign of association counts as similarity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrelationSign {
    /// Both positive and negative correlation count (`|r|`).
    #[default]
    Absolute,
    /// Only positive correlation counts (`max(0, r)`).
    Positive,
    /// Only negative correlation counts (`max(0, -r)`).
    Negative,
}

impl CorrelationSign {
    /// Map a correlation to the similarity this mode keeps, in `[0, 1]`.
    #[must_use]
    pub fn similarity(self, r: f64) -> f64 {
        match self {
            Self::Absolute => r.abs(),
            Self::Positive => r.max(0.0),
            Self::Negative => (-r).max(0.0),
        }
    }

    /// Whether `r` has the sign this mode looks for.
    #[must_use]
    pub fn matches(self, r: f64) -> bool {
        match self {
            Self::Absolute => true,
            Self::Positive => r > 0.0,
            Self::Negative => r < 0.0,
        }
    }
}

/// Correlation distance `1 - similarity(r)`.
///
/// In test mode the distance is binary: 0 when a two-sided t-test rejects
/// zero correlation at level `alpha` and the sign matches, 1 otherwise.
/// Pairs need equal lengths, at least three observations and non-zero variance.
///
/// # Defaults
///
/// | Parameter | Default |
/// |---|---|
/// | `sign` | [`CorrelationSign::Absolute`] |
/// | `significance` | `None` (plain distance) |
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationDistance {
    sign: CorrelationSign,
    significance: Option<f64>,
}

impl CorrelationDistance {
    /// Plain correlation distance with the given sign mode.
    #[must_use]
    pub fn new(sign: CorrelationSign) -> Self {
        Self { sign, significance: None }
    }

    /// Binary significance-test distance at level `alpha`.
    ///
    /// # Errors
    ///
    /// [`MetricError::InvalidParameter`] if `alpha` is not in `(0, 1)`.
    pub fn significance_test(sign: CorrelationSign, alpha: f64) -> Result<Self, MetricError> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(MetricError::invalid("alpha", alpha, "a value in (0, 1)"));
        }
        Ok(Self { sign, significance: Some(alpha) })
    }

    /// Return the sign mode.
    #[must_use]
    pub fn sign(&self) -> CorrelationSign {
        self.sign
    }

    /// Return the significance level, if testing.
    #[must_use]
    pub fn significance(&self) -> Option<f64> {
        self.significance
    }
}

impl SeriesDistance for CorrelationDistance {
    fn distance(&self, a: &[f64], b: &[f64]) -> Result<f64, MetricError> {
        if a.len() == b.len() && a.len() < 3 {
            return Err(MetricError::TooShort { len: a.len(), min: 3 });
        }
        let r = pearson(a, b)?;
        let Some(alpha) = self.significance else {
            return Ok(1.0 - self.sign.similarity(r));
        };
        let p = correlation_p_value(r, a.len());
        Ok(if p < alpha && self.sign.matches(r) { 0.0 } else { 1.0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    #[test]
    fn identical_series_distance_zero() {
        let x = [0.3, 1.7, -2.0, 4.1, 0.0];
        let d = CorrelationDistance::default().distance(&x, &x).unwrap();
        assert!(d.abs() < 1e-12);
    }

    #[test]
    fn sign_modes_on_anticorrelated_pair() {
        let a = ramp(10);
        let b: Vec<f64> = a.iter().map(|v| -v).collect();
        let abs = CorrelationDistance::new(CorrelationSign::Absolute).distance(&a, &b).unwrap();
        let pos = CorrelationDistance::new(CorrelationSign::Positive).distance(&a, &b).unwrap();
        let neg = CorrelationDistance::new(CorrelationSign::Negative).distance(&a, &b).unwrap();
        assert!(abs.abs() < 1e-12);
        assert!((pos - 1.0).abs() < 1e-12);
        assert!(neg.abs() < 1e-12);
    }

    #[test]
    fn significance_test_rejects_only_matching_sign() {
        let a = ramp(30);
        let b: Vec<f64> = a.iter().map(|v| 2.0 * v + (v * 1.3).sin()).collect();
        let pos = CorrelationDistance::significance_test(CorrelationSign::Positive, 0.05).unwrap();
        let neg = CorrelationDistance::significance_test(CorrelationSign::Negative, 0.05).unwrap();
        assert_eq!(pos.distance(&a, &b).unwrap(), 0.0);
        assert_eq!(neg.distance(&a, &b).unwrap(), 1.0);
    }

    #[test]
    fn significance_test_keeps_weak_pairs_apart() {
        // Orthogonal patterns: r = 0 exactly.
        let a = [1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0];
        let b = [1.0, 1.0, -1.0, -1.0, 1.0, 1.0, -1.0, -1.0];
        let test = CorrelationDistance::significance_test(CorrelationSign::Absolute, 0.05).unwrap();
        assert_eq!(test.distance(&a, &b).unwrap(), 1.0);
    }

    #[test]
    fn invalid_alpha_rejected() {
        assert!(CorrelationDistance::significance_test(CorrelationSign::Absolute, 1.5).is_err());
        assert!(CorrelationDistance::significance_test(CorrelationSign::Absolute, 0.0).is_err());
    }

    #[test]
    fn fewer_than_three_observations_rejected() {
        let err = CorrelationDistance::default().distance(&[1.0, 2.0], &[2.0, 1.0]);
        assert_eq!(err, Err(MetricError::TooShort { len: 2, min: 3 }));
        assert!(CorrelationDistance::default().distance(&[1.0, 2.0, 4.0], &[2.0, 1.0, 0.0]).is_ok());
    }

    #[test]
    fn length_mismatch_is_an_error() {
        let err = CorrelationDistance::default().distance(&[1.0, 2.0, 3.0], &[1.0, 2.0]);
        assert!(matches!(err, Err(MetricError::LengthMismatch { .. })));
    }
}

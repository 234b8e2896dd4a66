//! Maximal information coefficient distance.
//!
//! MIC is estimated over equal-frequency grids: every `x` by `y` grid with
//! `x, y >= 2` and `x * y <= max(n^alpha, 4)` is scored by
//! `I(grid) / ln(min(x, y))` and the best score wins.

use serde::{Deserialize, Serialize};

use crate::error::MetricError;
use crate::metric::{SeriesDistance, require_equal_len};
use crate::stats::entropy_from_counts;

const MIN_LEN: usize = 4;

/// `1 - MIC(a, b)`.
///
/// # Defaults
///
/// | Parameter | Default |
/// |---|---|
/// | `alpha` | 0.6 |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MicDistance {
    alpha: f64,
}

impl Default for MicDistance {
    fn default() -> Self {
        Self { alpha: 0.6 }
    }
}

impl MicDistance {
    /// Create a MIC distance with grid budget `n^alpha`.
    ///
    /// # Errors
    ///
    /// [`MetricError::InvalidParameter`] if `alpha` is not in `(0, 1]`.
    pub fn new(alpha: f64) -> Result<Self, MetricError> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(MetricError::invalid("alpha", alpha, "a value in (0, 1]"));
        }
        Ok(Self { alpha })
    }

    /// Return the grid budget exponent.
    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Estimate the maximal information coefficient in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`MetricError::LengthMismatch`] | inputs differ in length |
    /// | [`MetricError::TooShort`] | fewer than 4 observations |
    pub fn mic(&self, a: &[f64], b: &[f64]) -> Result<f64, MetricError> {
        let n = require_equal_len(a, b)?;
        if n < MIN_LEN {
            return Err(MetricError::TooShort { len: n, min: MIN_LEN });
        }
        let budget = ((n as f64).powf(self.alpha).floor() as usize).max(4);
        let ranks_a = ranks(a);
        let ranks_b = ranks(b);

        let mut best = 0.0_f64;
        for x in 2..=budget / 2 {
            let bins_a = equipartition(&ranks_a, x);
            for y in 2..=budget / x {
                let bins_b = equipartition(&ranks_b, y);
                let score = grid_information(&bins_a, x, &bins_b, y) / (x.min(y) as f64).ln();
                best = best.max(score);
            }
        }
        Ok(best.clamp(0.0, 1.0))
    }
}

impl SeriesDistance for MicDistance {
    fn distance(&self, a: &[f64], b: &[f64]) -> Result<f64, MetricError> {
        Ok(1.0 - self.mic(a, b)?)
    }
}

/// Rank of every value (0-based, ties broken by position).
fn ranks(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&i, &j| values[i].total_cmp(&values[j]));
    let mut rank = vec![0; values.len()];
    for (r, &i) in order.iter().enumerate() {
        rank[i] = r;
    }
    rank
}

fn equipartition(ranks: &[usize], bins: usize) -> Vec<usize> {
    let n = ranks.len();
    ranks.iter().map(|&r| r * bins / n).collect()
}

fn grid_information(bins_a: &[usize], x: usize, bins_b: &[usize], y: usize) -> f64 {
    let n = bins_a.len();
    let mut ca = vec![0usize; x];
    let mut cb = vec![0usize; y];
    let mut joint = vec![0usize; x * y];
    for (&i, &j) in bins_a.iter().zip(bins_b) {
        ca[i] += 1;
        cb[j] += 1;
        joint[i * y + j] += 1;
    }
    entropy_from_counts(&ca, n) + entropy_from_counts(&cb, n) - entropy_from_counts(&joint, n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_series_mic_one() {
        let x: Vec<f64> = (0..100).map(|i| (i as f64 * 0.17).sin()).collect();
        let d = MicDistance::default().distance(&x, &x).unwrap();
        assert!(d.abs() < 1e-12, "distance {d}");
    }

    #[test]
    fn monotone_transform_is_perfectly_associated() {
        let x: Vec<f64> = (0..64).map(|i| i as f64 / 10.0).collect();
        let y: Vec<f64> = x.iter().map(|v| v.exp()).collect();
        let mic = MicDistance::default().mic(&x, &y).unwrap();
        assert!((mic - 1.0).abs() < 1e-12);
    }

    #[test]
    fn unrelated_series_have_low_mic() {
        let x: Vec<f64> = (0..200).map(f64::from).collect();
        let y: Vec<f64> = (0..200).map(|i| ((i * 37 + 11) % 97) as f64).collect();
        let mic = MicDistance::default().mic(&x, &y).unwrap();
        assert!(mic < 0.6, "mic {mic}");
    }

    #[test]
    fn rejects_short_input() {
        let err = MicDistance::default().mic(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        assert!(matches!(err, Err(MetricError::TooShort { .. })));
    }

    #[test]
    fn rejects_bad_alpha() {
        assert!(MicDistance::new(0.0).is_err());
        assert!(MicDistance::new(1.2).is_err());
    }
}

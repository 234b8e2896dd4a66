//! Dynamic time warping distance.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::MetricError;
use crate::metric::SeriesDistance;

/// Constraint on the DTW warping window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BandConstraint {
    /// No constraint: the full cost matrix is explored.
    #[default]
    Unconstrained,

    /// Sakoe-Chiba band: cell `(i, j)` is valid only if `|i - j| <= radius`.
    ///
    /// The radius is widened to `|n - m|` for unequal lengths so the end cell
    /// stays reachable.
    SakoeChibaRadius(usize),
}

impl BandConstraint {
    /// Inclusive 1-based column window `[lo, hi]` for 1-based row `row`.
    fn window(&self, row: usize, n: usize, m: usize) -> (usize, usize) {
        match *self {
            Self::Unconstrained => (1, m),
            Self::SakoeChibaRadius(r) => {
                let r = r.max(n.abs_diff(m));
                (row.saturating_sub(r).max(1), (row + r).min(m))
            }
        }
    }
}

/// DTW alignment cost between two series.
///
/// Local cost is the squared difference; the result is the square root of the
/// minimal accumulated cost. Not bounded to `[0, 1]`. Inputs may differ in length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DtwDistance {
    constraint: BandConstraint,
}

impl DtwDistance {
    /// Create an unconstrained DTW distance.
    #[must_use]
    pub fn unconstrained() -> Self {
        Self {
            constraint: BandConstraint::Unconstrained,
        }
    }

    /// Create a DTW distance with a Sakoe-Chiba band.
    #[must_use]
    pub fn with_sakoe_chiba(radius: usize) -> Self {
        Self {
            constraint: BandConstraint::SakoeChibaRadius(radius),
        }
    }

    /// Return the band constraint.
    #[must_use]
    pub fn constraint(&self) -> BandConstraint {
        self.constraint
    }

    /// Rolling two-row DP over the (banded) cost matrix.
    ///
    /// Row buffers have `m + 1` slots; slot 0 is the left boundary, which is
    /// zero only for the virtual row 0 so every path starts at `(1, 1)`.
    fn accumulated_cost(&self, a: &[f64], b: &[f64]) -> f64 {
        let (n, m) = (a.len(), b.len());
        let mut prev = vec![f64::INFINITY; m + 1];
        let mut curr = vec![f64::INFINITY; m + 1];
        prev[0] = 0.0;

        for i in 1..=n {
            curr.fill(f64::INFINITY);
            let (lo, hi) = self.constraint.window(i, n, m);
            for j in lo..=hi {
                let cost = (a[i - 1] - b[j - 1]).powi(2);
                let best = prev[j - 1].min(prev[j]).min(curr[j - 1]);
                curr[j] = cost + best;
            }
            std::mem::swap(&mut prev, &mut curr);
        }
        prev[m]
    }
}

impl SeriesDistance for DtwDistance {
    #[instrument(level = "trace", skip(a, b), fields(n = a.len(), m = b.len()))]
    fn distance(&self, a: &[f64], b: &[f64]) -> Result<f64, MetricError> {
        if a.is_empty() || b.is_empty() {
            return Err(MetricError::EmptySeries);
        }
        Ok(self.accumulated_cost(a, b).sqrt())
    }
}

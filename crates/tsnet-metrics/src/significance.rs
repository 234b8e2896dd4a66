//! Resampling significance test shared by the event-based distances.

use rand::SeedableRng;
use rand::seq::index::sample;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::MetricError;
use crate::stats::quantile_sorted;

/// Surrogate test that relocates events uniformly at random.
///
/// Each surrogate keeps the event count and length of both sequences. The
/// generator is seeded per evaluation, so a pair always gets the same null
/// distribution.
///
/// # Defaults
///
/// | Parameter | Default |
/// |---|---|
/// | `repetitions` | 100 |
/// | `seed` | 42 |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignificanceTest {
    alpha: f64,
    repetitions: usize,
    seed: u64,
}

impl SignificanceTest {
    /// Create a test at significance level `alpha`.
    ///
    /// # Errors
    ///
    /// [`MetricError::InvalidParameter`] if `alpha` is not in `(0, 1)`.
    pub fn new(alpha: f64) -> Result<Self, MetricError> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(MetricError::invalid("alpha", alpha, "a value in (0, 1)"));
        }
        Ok(Self {
            alpha,
            repetitions: 100,
            seed: 42,
        })
    }

    /// Set the number of surrogates. Zero is raised to one.
    #[must_use]
    pub fn with_repetitions(mut self, repetitions: usize) -> Self {
        self.repetitions = repetitions.max(1);
        self
    }

    /// Set the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the significance level.
    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Return the number of surrogates.
    #[must_use]
    pub fn repetitions(&self) -> usize {
        self.repetitions
    }

    /// Return the RNG seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Sorted statistic values over surrogate event placements.
    ///
    /// `shape_*` is `(length, event count)` of each sequence.
    pub(crate) fn null_distribution<F>(
        &self,
        shape_a: (usize, usize),
        shape_b: (usize, usize),
        statistic: F,
    ) -> Vec<f64>
    where
        F: Fn(&[usize], &[usize]) -> f64,
    {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut null: Vec<f64> = (0..self.repetitions)
            .map(|_| {
                let a = placement(&mut rng, shape_a);
                let b = placement(&mut rng, shape_b);
                statistic(&a, &b)
            })
            .collect();
        null.sort_by(f64::total_cmp);
        null
    }

    /// True when `observed` lies strictly above the `1 - alpha` quantile of the null.
    pub(crate) fn exceeds_upper(&self, observed: f64, sorted_null: &[f64]) -> bool {
        observed > quantile_sorted(sorted_null, 1.0 - self.alpha)
    }

    /// True when `observed` lies strictly below the `alpha` quantile of the null.
    pub(crate) fn below_lower(&self, observed: f64, sorted_null: &[f64]) -> bool {
        observed < quantile_sorted(sorted_null, self.alpha)
    }
}

fn placement(rng: &mut ChaCha8Rng, (len, count): (usize, usize)) -> Vec<usize> {
    let mut idx = sample(rng, len, count.min(len)).into_vec();
    idx.sort_unstable();
    idx
}

//! Parallel evaluation of a distance function over a pair set.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, info, instrument, warn};
use tsnet_metrics::SeriesDistance;

use crate::error::PairwiseError;
use crate::matrix::DistanceMatrix;
use crate::pairs::PairSet;
use crate::source::SeriesSource;

/// Settings shared by the full-matrix engine and partitions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Runner {
    pub(crate) concurrency: usize,
    pub(crate) error_value: f64,
    pub(crate) warn_on_error: bool,
}

impl Default for Runner {
    fn default() -> Self {
        Self {
            concurrency: 1,
            error_value: f64::NAN,
            warn_on_error: true,
        }
    }
}

impl Runner {
    /// Evaluate `metric` on every pair, returning one value per pair in pair order.
    ///
    /// A pair whose evaluation fails (error, panic, or a series that cannot be
    /// loaded) gets `error_value`.
    pub(crate) fn run<S, M>(
        &self,
        source: &S,
        pairs: &[(usize, usize)],
        metric: &M,
    ) -> Result<Vec<f64>, PairwiseError>
    where
        S: SeriesSource + ?Sized,
        M: SeriesDistance + ?Sized,
    {
        if self.concurrency == 0 {
            return Err(PairwiseError::InvalidConcurrency { concurrency: 0 });
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.concurrency)
            .build()
            .map_err(|e| PairwiseError::ThreadPool(e.to_string()))?;

        let outcomes: Vec<Result<f64, String>> = pool.install(|| {
            pairs
                .par_iter()
                .map(|&(i, j)| evaluate_pair(source, i, j, metric))
                .collect()
        });

        let mut failed = Vec::new();
        let values = outcomes
            .into_iter()
            .zip(pairs)
            .map(|(outcome, &(i, j))| match outcome {
                Ok(v) => v,
                Err(reason) => {
                    debug!(i, j, %reason, "pair failed");
                    failed.push((i, j));
                    self.error_value
                }
            })
            .collect();

        if self.warn_on_error && !failed.is_empty() {
            warn!(
                count = failed.len(),
                pairs = ?failed,
                error_value = self.error_value,
                "distance failed for some pairs; error value used"
            );
        }
        Ok(values)
    }
}

fn evaluate_pair<S, M>(source: &S, i: usize, j: usize, metric: &M) -> Result<f64, String>
where
    S: SeriesSource + ?Sized,
    M: SeriesDistance + ?Sized,
{
    let attempt = panic::catch_unwind(AssertUnwindSafe(|| -> Result<f64, String> {
        let a = source.fetch(i).map_err(|e| e.to_string())?;
        let b = source.fetch(j).map_err(|e| e.to_string())?;
        metric.distance(&a, &b).map_err(|e| e.to_string())
    }));
    match attempt {
        Ok(outcome) => outcome,
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

/// Configuration for computing a full distance matrix.
///
/// # Defaults
///
/// | Parameter       | Default |
/// |-----------------|---------|
/// | `symmetric`     | true    |
/// | `concurrency`   | 1       |
/// | `error_value`   | NaN     |
/// | `warn_on_error` | true    |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairwiseConfig {
    symmetric: bool,
    runner: Runner,
}

impl Default for PairwiseConfig {
    fn default() -> Self {
        Self {
            symmetric: true,
            runner: Runner::default(),
        }
    }
}

impl PairwiseConfig {
    /// Create a configuration with the defaults above.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute only `i < j` and mirror (true), or every ordered pair (false).
    #[must_use]
    pub fn with_symmetric(mut self, symmetric: bool) -> Self {
        self.symmetric = symmetric;
        self
    }

    /// Set the number of worker threads. Zero is rejected by [`compute`](Self::compute).
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.runner.concurrency = concurrency;
        self
    }

    /// Set the value stored for pairs whose distance fails.
    #[must_use]
    pub fn with_error_value(mut self, error_value: f64) -> Self {
        self.runner.error_value = error_value;
        self
    }

    /// Emit a warning listing failed pairs.
    #[must_use]
    pub fn with_warn_on_error(mut self, warn_on_error: bool) -> Self {
        self.runner.warn_on_error = warn_on_error;
        self
    }

    /// Return whether only `i < j` is computed.
    #[must_use]
    pub fn symmetric(&self) -> bool {
        self.symmetric
    }

    /// Return the number of worker threads.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.runner.concurrency
    }

    /// Return the value stored for failed pairs.
    #[must_use]
    pub fn error_value(&self) -> f64 {
        self.runner.error_value
    }

    /// Return whether failures are reported.
    #[must_use]
    pub fn warn_on_error(&self) -> bool {
        self.runner.warn_on_error
    }

    /// Compute the distance matrix of every series in `source`.
    ///
    /// In symmetric mode `D[i][j]` and `D[j][i]` both receive the value of
    /// pair `(i, j)` and the diagonal is 0. In asymmetric mode every cell is
    /// computed, the diagonal included.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`PairwiseError::InvalidConcurrency`] | `concurrency` is zero |
    /// | [`PairwiseError::ThreadPool`] | the worker pool cannot be started |
    #[instrument(skip(self, source, metric), fields(n = source.len(), symmetric = self.symmetric))]
    pub fn compute<S, M>(&self, source: &S, metric: &M) -> Result<DistanceMatrix, PairwiseError>
    where
        S: SeriesSource + ?Sized,
        M: SeriesDistance + ?Sized,
    {
        let n = source.len();
        let pairs = PairSet::new(n, self.symmetric).to_vec();
        let values = self.runner.run(source, &pairs, metric)?;

        let mut matrix = DistanceMatrix::unfilled(n);
        matrix.set_names(source.names());
        for (&(i, j), v) in pairs.iter().zip(values) {
            matrix.set(i, j, v)?;
            if self.symmetric {
                matrix.set(j, i, v)?;
            }
        }

        info!(
            pairs = pairs.len(),
            concurrency = self.runner.concurrency,
            "distance matrix complete"
        );
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use tsnet_metrics::{DtwDistance, MetricError};

    use super::*;
    use crate::collection::SeriesCollection;

    fn collection(values: Vec<Vec<f64>>) -> SeriesCollection {
        SeriesCollection::from_vecs(values).unwrap()
    }

    fn abs_diff_of_first(a: &[f64], b: &[f64]) -> Result<f64, MetricError> {
        Ok((a[0] - b[0]).abs())
    }

    #[test]
    fn matrix_matches_individual_distances() {
        let c = collection(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0], vec![1.0, 3.0, 2.0]]);
        let dtw = DtwDistance::unconstrained();
        let m = PairwiseConfig::new().compute(&c, &dtw).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j {
                    0.0
                } else {
                    dtw.distance(c.series()[i].as_slice(), c.series()[j].as_slice()).unwrap()
                };
                assert!((m.get(i, j) - expected).abs() < 1e-10);
            }
        }
        assert!(m.is_symmetric());
    }

    #[test]
    fn concurrency_does_not_change_result() {
        let values: Vec<Vec<f64>> = (0..12)
            .map(|k| (0..20).map(|t| (t as f64 * 0.3 + k as f64).sin()).collect())
            .collect();
        let c = collection(values);
        let dtw = DtwDistance::with_sakoe_chiba(3);
        let serial = PairwiseConfig::new().compute(&c, &dtw).unwrap();
        let parallel = PairwiseConfig::new().with_concurrency(4).compute(&c, &dtw).unwrap();
        assert_eq!(serial, parallel);
    }

    #[test]
    fn asymmetric_computes_every_cell() {
        let c = collection(vec![vec![1.0], vec![4.0]]);
        let shifted = |a: &[f64], b: &[f64]| -> Result<f64, MetricError> { Ok(a[0] - b[0] + 10.0) };
        let m = PairwiseConfig::new().with_symmetric(false).compute(&c, &shifted).unwrap();
        assert_eq!(m.row(0), &[10.0, 7.0]);
        assert_eq!(m.row(1), &[13.0, 10.0]);
    }

    #[test]
    fn failed_pairs_get_error_value() {
        let c = collection(vec![vec![1.0, 2.0], vec![1.0], vec![3.0, 4.0]]);
        let needs_equal = |a: &[f64], b: &[f64]| -> Result<f64, MetricError> {
            if a.len() != b.len() {
                return Err(MetricError::LengthMismatch { left: a.len(), right: b.len() });
            }
            abs_diff_of_first(a, b)
        };
        let m = PairwiseConfig::new()
            .with_error_value(-1.0)
            .with_warn_on_error(false)
            .compute(&c, &needs_equal)
            .unwrap();
        assert_eq!(m.get(0, 1), -1.0);
        assert_eq!(m.get(2, 1), -1.0);
        assert_eq!(m.get(0, 2), 2.0);
    }

    /// Log lines written while `f` runs on this thread.
    fn captured_logs(f: impl FnOnce()) -> String {
        use std::io;
        use std::sync::{Arc, Mutex};

        #[derive(Clone)]
        struct Capture(Arc<Mutex<Vec<u8>>>);

        impl io::Write for Capture {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let buffer = Capture(Arc::new(Mutex::new(Vec::new())));
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = buffer.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn failed_pairs_warning_follows_setting() {
        let c = collection(vec![vec![1.0], vec![f64::MAX], vec![3.0]]);
        let finite_only = |a: &[f64], b: &[f64]| -> Result<f64, MetricError> {
            if a[0] == f64::MAX || b[0] == f64::MAX {
                return Err(MetricError::ConstantSeries);
            }
            abs_diff_of_first(a, b)
        };

        let logs = captured_logs(|| {
            PairwiseConfig::new().with_concurrency(2).compute(&c, &finite_only).unwrap();
        });
        assert_eq!(logs.matches("distance failed for some pairs").count(), 1, "{logs}");
        assert!(logs.contains("count=2"), "{logs}");

        let logs = captured_logs(|| {
            PairwiseConfig::new()
                .with_warn_on_error(false)
                .compute(&c, &finite_only)
                .unwrap();
        });
        assert!(!logs.contains("distance failed"), "{logs}");

        let clean = collection(vec![vec![1.0], vec![3.0]]);
        let logs = captured_logs(|| {
            PairwiseConfig::new().compute(&clean, &finite_only).unwrap();
        });
        assert!(logs.is_empty(), "{logs}");
    }

    #[test]
    fn panics_are_isolated() {
        let c = collection(vec![vec![1.0], vec![2.0], vec![3.0]]);
        let fragile = |a: &[f64], b: &[f64]| -> Result<f64, MetricError> {
            if a[0] == 2.0 || b[0] == 2.0 {
                panic!("unexpected value");
            }
            abs_diff_of_first(a, b)
        };
        let m = PairwiseConfig::new().with_concurrency(2).compute(&c, &fragile).unwrap();
        assert!(m.get(0, 1).is_nan());
        assert!(m.get(1, 2).is_nan());
        assert_eq!(m.get(0, 2), 2.0);
        assert!(m.has_missing());
    }

    #[test]
    fn zero_concurrency_rejected() {
        let c = collection(vec![vec![1.0], vec![2.0]]);
        let err = PairwiseConfig::new()
            .with_concurrency(0)
            .compute(&c, &abs_diff_of_first)
            .unwrap_err();
        assert_eq!(err, PairwiseError::InvalidConcurrency { concurrency: 0 });
    }

    #[test]
    fn names_carry_over() {
        let c = collection(vec![vec![1.0], vec![2.0]])
            .with_names(vec!["x".into(), "y".into()])
            .unwrap();
        let m = PairwiseConfig::new().compute(&c, &abs_diff_of_first).unwrap();
        assert_eq!(m.names().unwrap(), &["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn panic_message_formats_payloads() {
        assert_eq!(panic_message(&"boom"), "panicked: boom");
        assert_eq!(panic_message(&String::from("bang")), "panicked: bang");
        assert_eq!(panic_message(&3_u8), "panicked");
    }
}

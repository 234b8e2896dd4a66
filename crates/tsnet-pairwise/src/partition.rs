//! Computing one slice of the pair set, for later merging.

use tracing::{info, instrument};
use tsnet_metrics::SeriesDistance;

use crate::engine::Runner;
use crate::error::PairwiseError;
use crate::pairs::PairSet;
use crate::record::DistanceRecord;
use crate::source::SeriesSource;

/// Configuration for computing partition `part` of `total_parts`.
///
/// Running every part (in any order, on any machine) and merging the records
/// gives the same matrix as [`PairwiseConfig::compute`](crate::PairwiseConfig::compute)
/// with the same settings.
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
pub struct PartitionConfig {
    part: usize,
    total_parts: usize,
    symmetric: bool,
    runner: Runner,
}

impl PartitionConfig {
    /// Create a configuration for 1-based `part` of `total_parts`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`PairwiseError::InvalidPartition`] | `total_parts == 0` or `part` outside `1..=total_parts` |
    pub fn new(part: usize, total_parts: usize) -> Result<Self, PairwiseError> {
        if total_parts == 0 || part == 0 || part > total_parts {
            return Err(PairwiseError::InvalidPartition { part, total_parts });
        }
        Ok(Self {
            part,
            total_parts,
            symmetric: true,
            runner: Runner::default(),
        })
    }

    /// Compute only `i < j` and emit both orientations (true), or every ordered pair (false).
    #[must_use]
    pub fn with_symmetric(mut self, symmetric: bool) -> Self {
        self.symmetric = symmetric;
        self
    }

    /// Set the number of worker threads.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.runner.concurrency = concurrency;
        self
    }

    /// Set the value recorded for pairs whose distance fails.
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

    /// Return the 1-based part index.
    #[must_use]
    pub fn part(&self) -> usize {
        self.part
    }

    /// Return the number of parts.
    #[must_use]
    pub fn total_parts(&self) -> usize {
        self.total_parts
    }

    /// Return whether only `i < j` is computed.
    #[must_use]
    pub fn symmetric(&self) -> bool {
        self.symmetric
    }

    /// Pairs this partition covers for `n` series.
    ///
    /// # Errors
    ///
    /// [`PairwiseError::InvalidPartition`] from [`PairSet::chunk`]. Bounds are
    /// checked by [`new`](Self::new), so a constructed config does not hit it.
    pub fn pairs(&self, n: usize) -> Result<Vec<(usize, usize)>, PairwiseError> {
        PairSet::new(n, self.symmetric).chunk(self.part, self.total_parts)
    }

    /// Compute this partition's share of the pair set.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`PairwiseError::InvalidConcurrency`] | `concurrency` is zero |
    /// | [`PairwiseError::ThreadPool`] | the worker pool cannot be started |
    #[instrument(skip(self, source, metric), fields(n = source.len(), part = self.part, total_parts = self.total_parts))]
    pub fn compute<S, M>(&self, source: &S, metric: &M) -> Result<Vec<DistanceRecord>, PairwiseError>
    where
        S: SeriesSource + ?Sized,
        M: SeriesDistance + ?Sized,
    {
        let pairs = self.pairs(source.len())?;
        self.evaluate(source, &pairs, metric)
    }

    /// Compute an explicit list of zero-based pairs instead of a slice of the pair set.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`PairwiseError::IndexOutOfRange`] | a pair refers to a series that does not exist |
    /// | [`PairwiseError::InvalidConcurrency`] | `concurrency` is zero |
    /// | [`PairwiseError::ThreadPool`] | the worker pool cannot be started |
    #[instrument(skip(self, source, pairs, metric), fields(n = source.len(), pairs = pairs.len()))]
    pub fn compute_pairs<S, M>(
        &self,
        source: &S,
        pairs: &[(usize, usize)],
        metric: &M,
    ) -> Result<Vec<DistanceRecord>, PairwiseError>
    where
        S: SeriesSource + ?Sized,
        M: SeriesDistance + ?Sized,
    {
        let n = source.len();
        if let Some(index) = pairs.iter().flat_map(|&(i, j)| [i, j]).find(|&k| k >= n) {
            return Err(PairwiseError::IndexOutOfRange { index, n });
        }
        self.evaluate(source, pairs, metric)
    }

    fn evaluate<S, M>(
        &self,
        source: &S,
        pairs: &[(usize, usize)],
        metric: &M,
    ) -> Result<Vec<DistanceRecord>, PairwiseError>
    where
        S: SeriesSource + ?Sized,
        M: SeriesDistance + ?Sized,
    {
        let values = self.runner.run(source, pairs, metric)?;
        let mut records = Vec::with_capacity(pairs.len() * if self.symmetric { 2 } else { 1 });
        for (&(i, j), dist) in pairs.iter().zip(values) {
            let record = DistanceRecord::new(i, j, dist);
            records.push(record);
            if self.symmetric && i != j {
                records.push(record.transposed());
            }
        }
        info!(pairs = pairs.len(), records = records.len(), "partition complete");
        Ok(records)
    }
}

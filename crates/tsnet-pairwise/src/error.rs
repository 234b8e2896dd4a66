use tsnet_metrics::MetricError;

/// Errors from pairwise computation, partitioning and merging.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PairwiseError {
    /// Returned when the worker count is zero.
    #[error("concurrency must be at least 1, got {concurrency}")]
    InvalidConcurrency {
        /// The invalid worker count.
        concurrency: usize,
    },

    /// Returned when a partition index is outside `1..=total_parts`.
    #[error("invalid partition {part} of {total_parts}")]
    InvalidPartition {
        /// Requested part, 1-based.
        part: usize,
        /// Number of parts.
        total_parts: usize,
    },

    /// Returned when the number of names differs from the number of series.
    #[error("got {names} names for {series} series")]
    NameCount {
        /// Number of names provided.
        names: usize,
        /// Number of series.
        series: usize,
    },

    /// Returned when a record or pair refers to a series that does not exist.
    #[error("index {index} out of range for {n} series")]
    IndexOutOfRange {
        /// Offending zero-based index.
        index: usize,
        /// Number of series.
        n: usize,
    },

    /// Returned when matrix rows do not form a square.
    #[error("matrix row {row} has {len} cells, expected {n}")]
    NotSquare {
        /// Row index.
        row: usize,
        /// Cells in that row.
        len: usize,
        /// Number of rows.
        n: usize,
    },

    /// Returned when a series cannot be fetched from its source.
    #[error("failed to load series {index}: {message}")]
    Source {
        /// Zero-based series index.
        index: usize,
        /// Cause reported by the source.
        message: String,
    },

    /// Returned when the worker pool cannot be started.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),

    /// Wraps a series validation error.
    #[error("invalid series: {0}")]
    Metric(#[from] MetricError),
}

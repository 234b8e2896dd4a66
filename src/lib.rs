//! # tsnet
//!
//! Time series to network transformations.
//!
//! A pipeline reads series ([`io`]), computes a distance matrix over every
//! pair with a chosen metric ([`metrics`], [`pairwise`]), optionally split
//! into partitions that run anywhere and merge later, then builds a network
//! from the matrix ([`graph`]). Visibility, recurrence and transition networks
//! are built from a single series.
//!
//! ```rust,ignore
//! use tsnet::prelude::*;
//!
//! let series = SeriesReader::new(path).read()?;
//! let matrix = PairwiseConfig::new()
//!     .with_concurrency(4)
//!     .compute(&series, &CorrelationDistance::new(CorrelationSign::Absolute))?;
//! let network = knn(&matrix, 5, MissingPolicy::max_of(&matrix))?;
//! ```
//!
//! | Crate | Contents |
//! |-------|----------|
//! | [`metrics`] | distance functions between two series |
//! | [`pairwise`] | matrices, the pairwise engine, partitions and merge |
//! | [`io`] | CSV and directory readers, record batches, artifacts |
//! | [`graph`] | network builders |

/// Distance functions.
pub use tsnet_metrics as metrics;

/// Pairwise engine, partitions and merge.
pub use tsnet_pairwise as pairwise;

/// Readers and writers.
pub use tsnet_io as io;

/// Network construction.
pub use tsnet_graph as graph;

/// Common imports for building networks from series.
pub mod prelude {
    pub use tsnet_graph::{
        EpsilonConfig, MissingPolicy, Network, RecurrenceConfig, TransitionConfig,
        VisibilityConfig, WeightMode, knn, significant_links, weighted,
    };
    pub use tsnet_io::{ResultWriter, RunName, SeriesDirectory, SeriesReader, merge_files};
    pub use tsnet_metrics::{
        CorrelationDistance, CorrelationSign, DtwDistance, SeriesDistance, TimeSeries,
    };
    pub use tsnet_pairwise::{
        DistanceMatrix, PairwiseConfig, PartitionConfig, SeriesCollection, SeriesSource,
        merge_records,
    };
}

//! Pairwise distance matrices over a series collection.
//!
//! The engine evaluates any [`SeriesDistance`](tsnet_metrics::SeriesDistance)
//! over the pair set on a dedicated rayon pool, isolating per-pair failures.
//! The same pair set can be split into partitions whose records are merged
//! back into a matrix later.

mod collection;
mod engine;
mod error;
mod matrix;
mod merge;
mod pairs;
mod partition;
mod record;
mod source;

pub use collection::SeriesCollection;
pub use engine::PairwiseConfig;
pub use error::PairwiseError;
pub use matrix::DistanceMatrix;
pub use merge::{merge_into, merge_records, write_cell};
pub use pairs::PairSet;
pub use partition::PartitionConfig;
pub use record::DistanceRecord;
pub use source::SeriesSource;

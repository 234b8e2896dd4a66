//! Network construction.
//!
//! Matrix-based builders ([`knn`], [`EpsilonConfig`], [`weighted`],
//! [`significant_links`]) turn a [`DistanceMatrix`](tsnet_pairwise::DistanceMatrix)
//! into a [`Network`]. Series-based builders ([`VisibilityConfig`],
//! [`RecurrenceConfig`], [`TransitionConfig`]) work on a single series.

mod epsilon;
mod error;
mod index;
mod knn;
mod missing;
mod network;
mod recurrence;
mod transition;
mod visibility;

pub use epsilon::{EpsilonConfig, WeightMode, significant_links, weighted};
pub use error::GraphError;
pub use index::NeighborIndex;
pub use knn::{knn, knn_approx};
pub use missing::MissingPolicy;
pub use network::{DirectedNetwork, Edge, Network};
pub use recurrence::{Embedding, RecurrenceConfig, RecurrenceNetwork};
pub use transition::{Binning, TransitionConfig, TransitionNetwork};
pub use visibility::{VisibilityConfig, VisibilityKind};

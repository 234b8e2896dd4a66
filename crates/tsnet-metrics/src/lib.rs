//! Distance functions between time series and event sequences.
//!
//! Pure math library, no I/O. Every distance implements [`SeriesDistance`]
//! and can be handed to the pairwise engine or called directly on two slices.

mod correlation;
mod cross_correlation;
mod dtw;
mod error;
mod event_sync;
mod events;
mod information;
mod metric;
mod mic;
mod series;
mod significance;
pub mod stats;
mod van_rossum;

pub use correlation::{CorrelationDistance, CorrelationSign};
pub use cross_correlation::{CrossCorrelation, CrossCorrelationDistance};
pub use dtw::{BandConstraint, DtwDistance};
pub use error::MetricError;
pub use event_sync::{EventSyncDistance, SyncMethod};
pub use events::{EventRule, EventSequence};
pub use information::{BinRule, InformationKind, InformationTerms, MutualInformationDistance, Normalizer};
pub use metric::SeriesDistance;
pub use mic::MicDistance;
pub use series::TimeSeries;
pub use significance::SignificanceTest;
pub use van_rossum::VanRossumDistance;

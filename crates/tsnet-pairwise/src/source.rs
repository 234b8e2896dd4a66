//! Where the engine gets its series from.

use std::borrow::Cow;

use crate::error::PairwiseError;

/// Indexed access to the series of a computation.
///
/// The engine calls [`fetch`](Self::fetch) inside the worker evaluating a
/// pair, so a source may load lazily and hand out owned data that is dropped
/// as soon as the pair is done.
pub trait SeriesSource: Sync {
    /// Number of series.
    fn len(&self) -> usize;

    /// Return true if the source holds no series.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Series identifiers, one per series, if the source has them.
    fn names(&self) -> Option<&[String]>;

    /// Values of series `index`.
    ///
    /// # Errors
    ///
    /// Any [`PairwiseError`] the source raises while loading. The engine
    /// treats it as a failure of the pair being evaluated.
    fn fetch(&self, index: usize) -> Result<Cow<'_, [f64]>, PairwiseError>;
}

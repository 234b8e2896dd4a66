//! In-memory ordered collection of series.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use tsnet_metrics::TimeSeries;

use crate::error::PairwiseError;
use crate::source::SeriesSource;

/// Ordered series with optional identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesCollection {
    series: Vec<TimeSeries>,
    names: Option<Vec<String>>,
}

impl SeriesCollection {
    /// Create an unnamed collection.
    #[must_use]
    pub fn new(series: Vec<TimeSeries>) -> Self {
        Self { series, names: None }
    }

    /// Validate raw vectors into a collection.
    ///
    /// # Errors
    ///
    /// [`PairwiseError::Metric`] if any vector is empty or holds a non-finite value.
    pub fn from_vecs(values: Vec<Vec<f64>>) -> Result<Self, PairwiseError> {
        let series = values
            .into_iter()
            .map(TimeSeries::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(series))
    }

    /// Attach one identifier per series.
    ///
    /// # Errors
    ///
    /// [`PairwiseError::NameCount`] if `names.len()` differs from the series count.
    pub fn with_names(mut self, names: Vec<String>) -> Result<Self, PairwiseError> {
        if names.len() != self.series.len() {
            return Err(PairwiseError::NameCount {
                names: names.len(),
                series: self.series.len(),
            });
        }
        self.names = Some(names);
        Ok(self)
    }

    /// Return the number of series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Return true if the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Return series `index`, if present.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TimeSeries> {
        self.series.get(index)
    }

    /// Return all series.
    #[must_use]
    pub fn series(&self) -> &[TimeSeries] {
        &self.series
    }

    /// Return the identifiers, if any.
    #[must_use]
    pub fn names(&self) -> Option<&[String]> {
        self.names.as_deref()
    }

    /// Iterate over the series in order.
    pub fn iter(&self) -> impl Iterator<Item = &TimeSeries> + '_ {
        self.series.iter()
    }
}

impl SeriesSource for SeriesCollection {
    fn len(&self) -> usize {
        self.series.len()
    }

    fn names(&self) -> Option<&[String]> {
        self.names.as_deref()
    }

    fn fetch(&self, index: usize) -> Result<Cow<'_, [f64]>, PairwiseError> {
        self.series
            .get(index)
            .map(|s| Cow::Borrowed(s.as_slice()))
            .ok_or(PairwiseError::IndexOutOfRange { index, n: self.series.len() })
    }
}

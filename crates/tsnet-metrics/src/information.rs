//! Mutual-information based distances: normalized mutual information and
//! variation of information.
//!
//! Both series are discretised into the same number of equal-width bins
//! (each over its own value range) and the empirical plug-in entropies are
//! computed in nats over the common prefix of the two series. The bin count
//! follows the longer series, or the larger of the two counts for equal
//! lengths, and never exceeds the number of observations.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::MetricError;
use crate::metric::SeriesDistance;
use crate::stats::{entropy_from_counts, quantile, sample_sd};

/// Rule for choosing the number of histogram bins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinRule {
    /// `ceil(log2(n) + 1)`.
    #[default]
    Sturges,
    /// Bin width `3.5 sd n^(-1/3)`.
    Scott,
    /// Bin width `2 IQR n^(-1/3)`.
    FreedmanDiaconis,
    /// Explicit bin count (at least 1, capped at the series length).
    Fixed(usize),
}

impl BinRule {
    /// Number of bins this rule picks for `values`, between 1 and
    /// `values.len()`.
    #[must_use]
    pub fn bin_count(self, values: &[f64]) -> usize {
        let n = values.len();
        if n == 0 {
            return 1;
        }
        let width_rule = |width: f64| {
            let (lo, hi) = min_max(values);
            if width > 0.0 && hi > lo {
                ((hi - lo) / width).ceil().clamp(1.0, n as f64) as usize
            } else {
                1
            }
        };
        let k = match self {
            Self::Sturges => ((n as f64).log2() + 1.0).ceil().max(1.0) as usize,
            Self::Scott => width_rule(3.5 * sample_sd(values) * (n as f64).powf(-1.0 / 3.0)),
            Self::FreedmanDiaconis => {
                let iqr = quantile(values, 0.75) - quantile(values, 0.25);
                width_rule(2.0 * iqr * (n as f64).powf(-1.0 / 3.0))
            }
            Self::Fixed(k) => k.max(1),
        };
        k.min(n)
    }
}

/// Normalization applied to mutual information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Normalizer {
    /// `(h1 + h2) / 2`.
    #[default]
    Mean,
    /// `min(h1, h2)`.
    Min,
    /// `max(h1, h2)`.
    Max,
    /// `sqrt(h1 h2)`.
    Sqrt,
}

impl Normalizer {
    fn apply(self, h1: f64, h2: f64) -> f64 {
        match self {
            Self::Mean => 0.5 * (h1 + h2),
            Self::Min => h1.min(h2),
            Self::Max => h1.max(h2),
            Self::Sqrt => (h1 * h2).sqrt(),
        }
    }
}

/// Which information quantity becomes the distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InformationKind {
    /// `1 - I / normalizer(h1, h2)`, in `[0, 1]`.
    NormalizedMutualInformation(Normalizer),
    /// `h1 + h2 - 2 I`, non-negative and unbounded.
    VariationOfInformation,
}

impl Default for InformationKind {
    fn default() -> Self {
        Self::NormalizedMutualInformation(Normalizer::Mean)
    }
}

/// Entropies of a discretised pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InformationTerms {
    /// Entropy of the first series.
    pub h1: f64,
    /// Entropy of the second series.
    pub h2: f64,
    /// Mutual information.
    pub mutual_information: f64,
}

/// Distance based on mutual information between discretised series.
///
/// # Defaults
///
/// | Parameter | Default |
/// |---|---|
/// | `bins` | [`BinRule::Sturges`] |
/// | `kind` | NMI with [`Normalizer::Mean`] |
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MutualInformationDistance {
    bins: BinRule,
    kind: InformationKind,
}

impl MutualInformationDistance {
    /// Normalized mutual information distance.
    #[must_use]
    pub fn nmi(normalizer: Normalizer) -> Self {
        Self {
            bins: BinRule::default(),
            kind: InformationKind::NormalizedMutualInformation(normalizer),
        }
    }

    /// Variation of information distance.
    #[must_use]
    pub fn variation_of_information() -> Self {
        Self {
            bins: BinRule::default(),
            kind: InformationKind::VariationOfInformation,
        }
    }

    /// Set the bin rule.
    ///
    /// # Errors
    ///
    /// [`MetricError::InvalidParameter`] for `BinRule::Fixed(0)`.
    pub fn with_bins(mut self, bins: BinRule) -> Result<Self, MetricError> {
        if bins == BinRule::Fixed(0) {
            return Err(MetricError::invalid("bins", 0.0, "at least 1 bin"));
        }
        self.bins = bins;
        Ok(self)
    }

    /// Return the bin rule.
    #[must_use]
    pub fn bins(&self) -> BinRule {
        self.bins
    }

    /// Return the information quantity used.
    #[must_use]
    pub fn kind(&self) -> InformationKind {
        self.kind
    }

    /// Discretise both series and compute their entropies and mutual information.
    ///
    /// # Errors
    ///
    /// [`MetricError::EmptySeries`] if either input is empty.
    pub fn terms(&self, a: &[f64], b: &[f64]) -> Result<InformationTerms, MetricError> {
        if a.is_empty() || b.is_empty() {
            return Err(MetricError::EmptySeries);
        }
        let m = a.len().min(b.len());
        let k = match a.len().cmp(&b.len()) {
            Ordering::Greater => self.bins.bin_count(a),
            Ordering::Less => self.bins.bin_count(b),
            Ordering::Equal => self.bins.bin_count(a).max(self.bins.bin_count(b)),
        }
        .min(m);
        let da = discretize(&a[..m], k);
        let db = discretize(&b[..m], k);

        let mut ca = vec![0usize; k];
        let mut cb = vec![0usize; k];
        // at most m occupied cells, whatever k is
        let mut joint: HashMap<(usize, usize), usize> = HashMap::with_capacity(m);
        for (&x, &y) in da.iter().zip(&db) {
            ca[x] += 1;
            cb[y] += 1;
            *joint.entry((x, y)).or_insert(0) += 1;
        }
        let joint: Vec<usize> = joint.into_values().collect();
        let h1 = entropy_from_counts(&ca, m);
        let h2 = entropy_from_counts(&cb, m);
        let h12 = entropy_from_counts(&joint, m);
        Ok(InformationTerms {
            h1,
            h2,
            mutual_information: (h1 + h2 - h12).max(0.0),
        })
    }
}

impl SeriesDistance for MutualInformationDistance {
    fn distance(&self, a: &[f64], b: &[f64]) -> Result<f64, MetricError> {
        let t = self.terms(a, b)?;
        match self.kind {
            InformationKind::VariationOfInformation => {
                Ok((t.h1 + t.h2 - 2.0 * t.mutual_information).max(0.0))
            }
            InformationKind::NormalizedMutualInformation(norm) => {
                let denom = norm.apply(t.h1, t.h2);
                if denom <= 0.0 {
                    // At least one side carries no information; only a pair of
                    // equally uninformative series counts as identical.
                    return Ok(if t.h1 == t.h2 { 0.0 } else { 1.0 });
                }
                Ok((1.0 - t.mutual_information / denom).clamp(0.0, 1.0))
            }
        }
    }
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

/// Equal-width discretisation into `k` bins over the data's own range.
pub(crate) fn discretize(values: &[f64], k: usize) -> Vec<usize> {
    let (lo, hi) = min_max(values);
    let span = hi - lo;
    if span <= 0.0 || k <= 1 {
        return vec![0; values.len()];
    }
    values
        .iter()
        .map(|&v| (((v - lo) / span * k as f64).floor() as usize).min(k - 1))
        .collect()
}

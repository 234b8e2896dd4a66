//! Recurrence networks over a delay-embedded trajectory.

use petgraph::Undirected;
use tracing::{debug, info, instrument};

use crate::error::{GraphError, validate_series};
use crate::network::Network;

/// Distance-ratio threshold of the false-nearest-neighbour test.
const FNN_RTOL: f64 = 10.0;

/// How the embedding dimension is chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Embedding {
    /// Use exactly this dimension.
    Fixed(usize),
    /// The smallest dimension in `1..=max_dim` whose false-nearest-neighbour
    /// fraction is at most `threshold`, or `max_dim` if none is.
    Estimate {
        /// Largest dimension tried.
        max_dim: usize,
        /// Accepted fraction of false nearest neighbours.
        threshold: f64,
    },
}

impl Default for Embedding {
    fn default() -> Self {
        Self::Estimate {
            max_dim: 10,
            threshold: 0.05,
        }
    }
}

/// A recurrence network with the embedding that produced it.
#[derive(Debug, Clone)]
pub struct RecurrenceNetwork {
    network: Network<Undirected>,
    embedding_dim: usize,
    lag: usize,
    radius: f64,
}

impl RecurrenceNetwork {
    /// The network over embedded points.
    #[must_use]
    pub fn network(&self) -> &Network<Undirected> {
        &self.network
    }

    /// Consume and return the network.
    #[must_use]
    pub fn into_network(self) -> Network<Undirected> {
        self.network
    }

    /// Embedding dimension used.
    #[must_use]
    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    /// Time lag between embedding coordinates.
    #[must_use]
    pub fn lag(&self) -> usize {
        self.lag
    }

    /// Recurrence radius.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }
}

/// Configuration for a recurrence network.
///
/// Point `t` of the embedding is `(x[t], x[t + lag], ..., x[t + (d-1) lag])`;
/// two points are linked when their Euclidean distance is at most `radius`.
///
/// # Defaults
///
/// | Parameter   | Default |
/// |-------------|---------|
/// | `lag`       | 1 |
/// | `embedding` | `Estimate { max_dim: 10, threshold: 0.05 }` |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecurrenceConfig {
    radius: f64,
    lag: usize,
    embedding: Embedding,
}

impl RecurrenceConfig {
    /// Create a configuration with recurrence radius `radius`.
    ///
    /// # Errors
    ///
    /// [`GraphError::InvalidParameter`] if `radius` is negative or not finite.
    pub fn new(radius: f64) -> Result<Self, GraphError> {
        if !(radius.is_finite() && radius >= 0.0) {
            return Err(GraphError::invalid("radius", radius, "a finite value >= 0"));
        }
        Ok(Self {
            radius,
            lag: 1,
            embedding: Embedding::default(),
        })
    }

    /// Set the time lag. Zero is rejected by [`build`](Self::build).
    #[must_use]
    pub fn with_lag(mut self, lag: usize) -> Self {
        self.lag = lag;
        self
    }

    /// Set how the embedding dimension is chosen.
    #[must_use]
    pub fn with_embedding(mut self, embedding: Embedding) -> Self {
        self.embedding = embedding;
        self
    }

    /// Return the recurrence radius.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Return the time lag.
    #[must_use]
    pub fn lag(&self) -> usize {
        self.lag
    }

    /// Return the embedding choice.
    #[must_use]
    pub fn embedding(&self) -> Embedding {
        self.embedding
    }

    /// Build the recurrence network of `x`. Nodes are labelled by the 1-based
    /// time index of each embedded point.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`GraphError::Metric`] | `x` is empty or holds a non-finite value |
    /// | [`GraphError::InvalidParameter`] | zero lag, zero dimension, or `threshold` outside `[0, 1]` |
    /// | [`GraphError::TooShort`] | `x` has fewer than `(d - 1) * lag + 1` points |
    #[instrument(skip(self, x), fields(n = x.len(), lag = self.lag, radius = self.radius))]
    pub fn build(&self, x: &[f64]) -> Result<RecurrenceNetwork, GraphError> {
        validate_series(x)?;
        if self.lag == 0 {
            return Err(GraphError::invalid("lag", 0.0, "at least 1"));
        }
        let dim = match self.embedding {
            Embedding::Fixed(d) => {
                if d == 0 {
                    return Err(GraphError::invalid("embedding_dim", 0.0, "at least 1"));
                }
                d
            }
            Embedding::Estimate { max_dim, threshold } => {
                if max_dim == 0 {
                    return Err(GraphError::invalid("max_dim", 0.0, "at least 1"));
                }
                if !(0.0..=1.0).contains(&threshold) {
                    return Err(GraphError::invalid("threshold", threshold, "a value in [0, 1]"));
                }
                estimate_dimension(x, self.lag, max_dim, threshold)
            }
        };

        let points = embed(x, dim, self.lag).ok_or(GraphError::TooShort {
            len: x.len(),
            min: (dim - 1) * self.lag + 1,
        })?;
        let labels = (1..=points.len()).map(|t| t.to_string()).collect();
        let mut network = Network::with_nodes(labels, false);
        for i in 0..points.len() {
            for j in i + 1..points.len() {
                if euclidean(&points[i], &points[j]) <= self.radius {
                    network.add_edge(i, j, 1.0);
                }
            }
        }
        info!(embedding_dim = dim, edges = network.edge_count(), "recurrence network built");
        Ok(RecurrenceNetwork {
            network,
            embedding_dim: dim,
            lag: self.lag,
            radius: self.radius,
        })
    }
}

/// Delay vectors, or `None` if the series is too short for one.
fn embed(x: &[f64], dim: usize, lag: usize) -> Option<Vec<Vec<f64>>> {
    let span = (dim - 1) * lag;
    if x.len() <= span {
        return None;
    }
    Some(
        (0..x.len() - span)
            .map(|t| (0..dim).map(|k| x[t + k * lag]).collect())
            .collect(),
    )
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(u, v)| (u - v).powi(2)).sum::<f64>().sqrt()
}

/// False-nearest-neighbour fraction at dimension `dim`, or `None` if the
/// series cannot be embedded in `dim + 1` dimensions.
fn false_neighbour_fraction(x: &[f64], dim: usize, lag: usize) -> Option<f64> {
    let extended = embed(x, dim + 1, lag)?;
    let m = extended.len();
    if m < 2 {
        return None;
    }
    let mut considered = 0usize;
    let mut false_count = 0usize;
    for t in 0..m {
        let mut best: Option<(f64, usize)> = None;
        for s in (0..m).filter(|&s| s != t) {
            let d = euclidean(&extended[t][..dim], &extended[s][..dim]);
            if best.is_none_or(|(bd, _)| d < bd) {
                best = Some((d, s));
            }
        }
        let Some((dist, nn)) = best else { continue };
        if dist == 0.0 {
            continue;
        }
        considered += 1;
        if (extended[t][dim] - extended[nn][dim]).abs() / dist > FNN_RTOL {
            false_count += 1;
        }
    }
    (considered > 0).then(|| false_count as f64 / considered as f64)
}

fn estimate_dimension(x: &[f64], lag: usize, max_dim: usize, threshold: f64) -> usize {
    for dim in 1..max_dim {
        match false_neighbour_fraction(x, dim, lag) {
            Some(fraction) => {
                debug!(dim, fraction, "false nearest neighbours");
                if fraction <= threshold {
                    return dim;
                }
            }
            // series too short to test higher dimensions
            None => return dim,
        }
    }
    max_dim
}

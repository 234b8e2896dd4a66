//! Transition networks: amplitude bins linked by observed successions.

use petgraph::Directed;
use tracing::{debug, instrument};
use tsnet_metrics::stats::quantile;

use crate::error::{GraphError, validate_series};
use crate::network::Network;

/// How values are assigned to bins.
#[derive(Debug, Clone, PartialEq)]
pub enum Binning {
    /// `k` bins holding roughly equal numbers of observations. Quantiles that
    /// coincide on tied values are merged, so fewer bins may result.
    Quantiles(usize),
    /// `k` bins of equal width between the minimum and maximum.
    EqualWidth(usize),
    /// Explicit breakpoints; `m` breaks give `m - 1` bins.
    Breaks(Vec<f64>),
}

impl Binning {
    fn validate(&self) -> Result<(), GraphError> {
        match self {
            Self::Quantiles(0) | Self::EqualWidth(0) => {
                Err(GraphError::invalid("bins", 0.0, "at least 1"))
            }
            Self::Quantiles(_) | Self::EqualWidth(_) => Ok(()),
            Self::Breaks(breaks) => {
                if breaks.len() < 2 {
                    return Err(GraphError::invalid("breaks", breaks.len() as f64, "at least 2 breakpoints"));
                }
                if let Some(&bad) = breaks.iter().find(|b| !b.is_finite()) {
                    return Err(GraphError::invalid("breaks", bad, "finite breakpoints"));
                }
                if let Some(w) = breaks.windows(2).find(|w| w[0] >= w[1]) {
                    return Err(GraphError::invalid("breaks", w[1], "strictly increasing breakpoints"));
                }
                Ok(())
            }
        }
    }

    /// Breakpoints for `x`, first and last included.
    fn breaks(&self, x: &[f64]) -> Vec<f64> {
        match self {
            Self::Quantiles(k) => {
                let mut breaks: Vec<f64> = (0..=*k).map(|b| quantile(x, b as f64 / *k as f64)).collect();
                breaks.dedup();
                if breaks.len() == 1 {
                    breaks.push(breaks[0]);
                }
                breaks
            }
            Self::EqualWidth(k) => {
                let lo = x.iter().copied().fold(f64::INFINITY, f64::min);
                let hi = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let width = (hi - lo) / *k as f64;
                (0..=*k).map(|b| if b == *k { hi } else { lo + width * b as f64 }).collect()
            }
            Self::Breaks(breaks) => breaks.clone(),
        }
    }
}

/// A transition network with the breakpoints that defined its bins.
#[derive(Debug, Clone)]
pub struct TransitionNetwork {
    network: Network<Directed>,
    breaks: Vec<f64>,
}

impl TransitionNetwork {
    /// The network over bins.
    #[must_use]
    pub fn network(&self) -> &Network<Directed> {
        &self.network
    }

    /// Consume and return the network.
    #[must_use]
    pub fn into_network(self) -> Network<Directed> {
        self.network
    }

    /// Breakpoints, first and last included.
    #[must_use]
    pub fn breaks(&self) -> &[f64] {
        &self.breaks
    }
}

/// Configuration for a transition network.
///
/// Bins are left-closed except the last, which is closed on both sides.
/// Values outside explicit breakpoints fall into the first or last bin.
///
/// # Defaults
///
/// | Parameter    | Default |
/// |--------------|---------|
/// | `normalize`  | true    |
/// | `self_loops` | true    |
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionConfig {
    binning: Binning,
    normalize: bool,
    self_loops: bool,
}

impl TransitionConfig {
    /// Create a configuration with the given binning.
    ///
    /// # Errors
    ///
    /// [`GraphError::InvalidParameter`] for zero bins, or breakpoints that are
    /// fewer than two, non-finite, or not strictly increasing.
    pub fn new(binning: Binning) -> Result<Self, GraphError> {
        binning.validate()?;
        Ok(Self {
            binning,
            normalize: true,
            self_loops: true,
        })
    }

    /// Divide each node's outgoing weights by their sum.
    #[must_use]
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// Keep transitions that stay in the same bin.
    #[must_use]
    pub fn with_self_loops(mut self, self_loops: bool) -> Self {
        self.self_loops = self_loops;
        self
    }

    /// Return the binning.
    #[must_use]
    pub fn binning(&self) -> &Binning {
        &self.binning
    }

    /// Return whether outgoing weights are normalised.
    #[must_use]
    pub fn normalize(&self) -> bool {
        self.normalize
    }

    /// Return whether self-loops are kept.
    #[must_use]
    pub fn self_loops(&self) -> bool {
        self.self_loops
    }

    /// Build the transition network of `x`. Nodes are labelled `bin_1..=bin_k`.
    ///
    /// # Errors
    ///
    /// [`GraphError::Metric`] if `x` is empty or holds a non-finite value.
    #[instrument(skip(self, x), fields(n = x.len()))]
    pub fn build(&self, x: &[f64]) -> Result<TransitionNetwork, GraphError> {
        validate_series(x)?;
        let breaks = self.binning.breaks(x);
        let k = breaks.len() - 1;
        let symbols: Vec<usize> = x.iter().map(|&v| bin_of(&breaks, v)).collect();

        let mut counts = vec![vec![0usize; k]; k];
        for pair in symbols.windows(2) {
            if self.self_loops || pair[0] != pair[1] {
                counts[pair[0]][pair[1]] += 1;
            }
        }

        let labels = (1..=k).map(|b| format!("bin_{b}")).collect();
        let mut network = Network::with_nodes(labels, true);
        for (from, row) in counts.iter().enumerate() {
            let total: usize = row.iter().sum();
            for (to, &count) in row.iter().enumerate().filter(|&(_, &c)| c > 0) {
                let weight = if self.normalize {
                    count as f64 / total as f64
                } else {
                    count as f64
                };
                network.add_edge(from, to, weight);
            }
        }
        debug!(bins = k, edges = network.edge_count(), "transition network built");
        Ok(TransitionNetwork { network, breaks })
    }
}

/// Zero-based bin of `v`: the number of interior breakpoints at or below it.
fn bin_of(breaks: &[f64], v: f64) -> usize {
    let interior = &breaks[1..breaks.len() - 1];
    interior.partition_point(|&b| b <= v)
}

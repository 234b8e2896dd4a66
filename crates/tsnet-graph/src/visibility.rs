//! Natural and horizontal visibility graphs.

use petgraph::Undirected;
use tracing::{debug, instrument};

use crate::error::{GraphError, validate_series};
use crate::network::Network;

/// Relative tolerance of the line-of-sight test, so points that are
/// collinear up to rounding do not block each other.
const COLLINEAR_TOL: f64 = 1e-12;

/// Which line-of-sight rule links two time indices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VisibilityKind {
    /// `p` sees `q` unless an intermediate value rises strictly above the
    /// straight line joining them.
    #[default]
    Natural,
    /// `p` sees `q` unless an intermediate value reaches `max(x[p], x[q])`.
    Horizontal,
}

/// Configuration for a visibility graph over time indices.
///
/// # Defaults
///
/// | Parameter | Default |
/// |-----------|---------|
/// | `kind`    | [`VisibilityKind::Natural`] |
/// | `limit`   | `None` (no temporal limit) |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisibilityConfig {
    kind: VisibilityKind,
    limit: Option<usize>,
}

impl VisibilityConfig {
    /// Create a configuration for `kind`.
    #[must_use]
    pub fn new(kind: VisibilityKind) -> Self {
        Self { kind, limit: None }
    }

    /// Exclude pairs more than `limit` steps apart.
    ///
    /// # Errors
    ///
    /// [`GraphError::InvalidParameter`] if `limit` is zero.
    pub fn with_limit(mut self, limit: usize) -> Result<Self, GraphError> {
        if limit == 0 {
            return Err(GraphError::invalid("limit", 0.0, "at least 1"));
        }
        self.limit = Some(limit);
        Ok(self)
    }

    /// Return the visibility rule.
    #[must_use]
    pub fn kind(&self) -> VisibilityKind {
        self.kind
    }

    /// Return the temporal limit, if any.
    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Build the visibility graph of `x`. Nodes are labelled `1..=n`.
    ///
    /// # Errors
    ///
    /// [`GraphError::Metric`] if `x` is empty or holds a non-finite value.
    #[instrument(skip(self, x), fields(n = x.len(), kind = ?self.kind))]
    pub fn build(&self, x: &[f64]) -> Result<Network<Undirected>, GraphError> {
        validate_series(x)?;
        let n = x.len();
        let labels = (1..=n).map(|t| t.to_string()).collect();
        let mut network = Network::with_nodes(labels, false);

        for p in 0..n {
            let last = self.limit.map_or(n - 1, |l| (p + l).min(n - 1));
            match self.kind {
                VisibilityKind::Natural => natural_from(x, p, last, &mut network),
                VisibilityKind::Horizontal => horizontal_from(x, p, last, &mut network),
            }
        }
        debug!(edges = network.edge_count(), "visibility graph built");
        Ok(network)
    }
}

/// Link `p` to every visible `q` in `p+1..=last`.
///
/// Walking `q` forward, the intermediate point with the steepest slope from
/// `p` is the only one that can block `q`.
fn natural_from(x: &[f64], p: usize, last: usize, network: &mut Network<Undirected>) {
    let mut steepest: Option<usize> = None;
    for q in p + 1..=last {
        let visible = match steepest {
            None => true,
            Some(i) => {
                let line = x[p] + (x[q] - x[p]) * (i - p) as f64 / (q - p) as f64;
                let scale = 1.0_f64.max(x[i].abs()).max(line.abs());
                x[i] - line <= COLLINEAR_TOL * scale
            }
        };
        if visible {
            network.add_edge(p, q, 1.0);
        }
        let slope = |k: usize| (x[k] - x[p]) / (k - p) as f64;
        if steepest.is_none_or(|i| slope(q) > slope(i)) {
            steepest = Some(q);
        }
    }
}

/// Link `p` to every `q` in `p+1..=last` not blocked by an intermediate value
/// at or above `max(x[p], x[q])`.
fn horizontal_from(x: &[f64], p: usize, last: usize, network: &mut Network<Undirected>) {
    let mut highest = f64::NEG_INFINITY;
    for q in p + 1..=last {
        if highest < x[p].max(x[q]) {
            network.add_edge(p, q, 1.0);
        }
        highest = highest.max(x[q]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge_list(net: &Network<Undirected>) -> Vec<(usize, usize)> {
        let mut edges: Vec<_> = net.edges().iter().map(|e| (e.source, e.target)).collect();
        edges.sort_unstable();
        edges
    }

    #[test]
    fn collinear_points_see_each_other() {
        let natural = VisibilityConfig::default();
        for x in [[1.0, 2.0, 3.0], [0.1, 0.2, 0.3], [5.0, 5.0, 5.0]] {
            let net = natural.build(&x).unwrap();
            assert_eq!(edge_list(&net), vec![(0, 1), (0, 2), (1, 2)], "{x:?}");
        }
    }

    #[test]
    fn spike_blocks_both_rules() {
        let x = [1.0, 5.0, 1.0];
        for kind in [VisibilityKind::Natural, VisibilityKind::Horizontal] {
            let net = VisibilityConfig::new(kind).build(&x).unwrap();
            assert_eq!(edge_list(&net), vec![(0, 1), (1, 2)], "{kind:?}");
        }
    }

    #[test]
    fn natural_visibility_reference_series() {
        // 3 sees 1 over the dip at index 2; the peak at 1 hides 0 from 2 and 3
        let x = [1.0, 4.0, 2.0, 3.0];
        let net = VisibilityConfig::default().build(&x).unwrap();
        assert_eq!(edge_list(&net), vec![(0, 1), (1, 2), (1, 3), (2, 3)]);
    }

    #[test]
    fn horizontal_visibility_uses_the_higher_endpoint() {
        // 0 -> 2: intermediate 2.0 is below max(3.0, 2.5), so linked
        let x = [3.0, 2.0, 2.5, 4.0];
        let net = VisibilityConfig::new(VisibilityKind::Horizontal).build(&x).unwrap();
        assert_eq!(edge_list(&net), vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
    }

    #[test]
    fn adjacent_indices_always_linked() {
        let x = [3.0, -1.0, 7.0, 2.0, 2.0, 9.0];
        for kind in [VisibilityKind::Natural, VisibilityKind::Horizontal] {
            let net = VisibilityConfig::new(kind).build(&x).unwrap();
            for t in 0..x.len() - 1 {
                assert!(net.has_edge(t, t + 1), "{kind:?} {t}");
            }
        }
    }

    #[test]
    fn limit_excludes_distant_pairs() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let net = VisibilityConfig::default().with_limit(2).unwrap().build(&x).unwrap();
        assert!(net.has_edge(0, 2));
        assert!(!net.has_edge(0, 3));
        assert_eq!(net.edge_count(), 7);
        assert!(VisibilityConfig::default().with_limit(0).is_err());
    }

    #[test]
    fn invalid_series_rejected() {
        assert!(VisibilityConfig::default().build(&[]).is_err());
        assert!(VisibilityConfig::default().build(&[1.0, f64::NAN]).is_err());
    }

    #[test]
    fn single_point_has_no_edges() {
        let net = VisibilityConfig::default().build(&[2.0]).unwrap();
        assert_eq!(net.node_count(), 1);
        assert_eq!(net.edge_count(), 0);
    }
}

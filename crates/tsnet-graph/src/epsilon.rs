//! Threshold (ε-NN) networks and the builders defined in terms of them.

use petgraph::{Directed, EdgeType, Undirected};
use tracing::{debug, instrument};
use tsnet_pairwise::DistanceMatrix;

use crate::error::GraphError;
use crate::index::NeighborIndex;
use crate::missing::MissingPolicy;
use crate::network::Network;

/// How an edge weight is derived from its distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightMode {
    /// `1 - D`; requires every distance in `[0, 1]`.
    OneMinus,
    /// `D` as is.
    Raw,
}

impl WeightMode {
    fn weight(self, d: f64) -> f64 {
        match self {
            Self::OneMinus => 1.0 - d,
            Self::Raw => d,
        }
    }
}

/// Configuration for an ε-NN network: an edge wherever `D[i][j] <= epsilon`.
///
/// # Defaults
///
/// | Parameter  | Default |
/// |------------|---------|
/// | `weighted` | `None` (unweighted) |
/// | `missing`  | [`MissingPolicy::Reject`] |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpsilonConfig {
    epsilon: f64,
    weighted: Option<WeightMode>,
    missing: MissingPolicy,
}

impl EpsilonConfig {
    /// Create a configuration with threshold `epsilon` (`+inf` allowed).
    ///
    /// # Errors
    ///
    /// [`GraphError::InvalidParameter`] if `epsilon` is NaN.
    pub fn new(epsilon: f64) -> Result<Self, GraphError> {
        if epsilon.is_nan() {
            return Err(GraphError::invalid("epsilon", epsilon, "a number"));
        }
        Ok(Self {
            epsilon,
            weighted: None,
            missing: MissingPolicy::Reject,
        })
    }

    /// Attach weights to edges.
    #[must_use]
    pub fn with_weights(mut self, mode: WeightMode) -> Self {
        self.weighted = Some(mode);
        self
    }

    /// Set how missing cells are treated.
    #[must_use]
    pub fn with_missing(mut self, missing: MissingPolicy) -> Self {
        self.missing = missing;
        self
    }

    /// Return the threshold.
    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Return the weight mode, if weighted.
    #[must_use]
    pub fn weighted(&self) -> Option<WeightMode> {
        self.weighted
    }

    /// Return the missing-cell policy.
    #[must_use]
    pub fn missing(&self) -> MissingPolicy {
        self.missing
    }

    /// Undirected network over pairs `i < j`. A pair is linked when either
    /// `D[i][j]` or `D[j][i]` is within the threshold; the smaller of the two
    /// sets the weight.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`GraphError::UnresolvedMissing`] | missing cells without a replacement policy |
    /// | [`GraphError::WeightsOutOfRange`] | `OneMinus` weights with a distance outside `[0, 1]` |
    #[instrument(skip(self, matrix), fields(n = matrix.len(), epsilon = self.epsilon))]
    pub fn build(&self, matrix: &DistanceMatrix) -> Result<Network<Undirected>, GraphError> {
        let d = self.prepare(matrix)?;
        let candidates = d.upper_triangle().map(|(i, j, _)| (i, j, undirected_distance(&d, i, j)));
        Ok(self.assemble(&d, candidates))
    }

    /// Directed network over every ordered pair `i != j`, for asymmetric matrices.
    ///
    /// # Errors
    ///
    /// Same as [`build`](Self::build).
    #[instrument(skip(self, matrix), fields(n = matrix.len(), epsilon = self.epsilon))]
    pub fn build_directed(&self, matrix: &DistanceMatrix) -> Result<Network<Directed>, GraphError> {
        let d = self.prepare(matrix)?;
        let candidates = d.iter().filter(|&(i, j, _)| i != j);
        Ok(self.assemble(&d, candidates))
    }

    /// [`build`](Self::build) with candidates from a fixed-radius [`NeighborIndex`] query.
    ///
    /// With `eps > 0` pairs near the threshold may be missed; no pair above it is linked.
    ///
    /// # Errors
    ///
    /// As [`build`](Self::build), plus [`GraphError::InvalidParameter`] for a
    /// negative or non-finite `eps`.
    #[instrument(skip(self, matrix), fields(n = matrix.len(), epsilon = self.epsilon))]
    pub fn build_approx(&self, matrix: &DistanceMatrix, eps: f64) -> Result<Network<Undirected>, GraphError> {
        if !(eps.is_finite() && eps >= 0.0) {
            return Err(GraphError::invalid("eps", eps, "a finite value >= 0"));
        }
        let d = self.prepare(matrix)?;
        let index = NeighborIndex::build(&d);
        let mut pairs: Vec<(usize, usize)> = (0..d.len())
            .flat_map(|i| index.radius(i, self.epsilon, eps).into_iter().map(move |j| (i.min(j), i.max(j))))
            .collect();
        pairs.sort_unstable();
        pairs.dedup();
        let candidates = pairs.into_iter().map(|(i, j)| (i, j, undirected_distance(&d, i, j)));
        Ok(self.assemble(&d, candidates))
    }

    fn prepare(&self, matrix: &DistanceMatrix) -> Result<DistanceMatrix, GraphError> {
        let d = self.missing.resolve(matrix)?.into_owned();
        if self.weighted == Some(WeightMode::OneMinus)
            && let Some((row, col, value)) = d
                .iter()
                .find(|&(i, j, v)| i != j && !(0.0..=1.0).contains(&v))
        {
            return Err(GraphError::WeightsOutOfRange { row, col, value });
        }
        Ok(d)
    }

    fn assemble<Ty: EdgeType>(
        &self,
        d: &DistanceMatrix,
        candidates: impl Iterator<Item = (usize, usize, f64)>,
    ) -> Network<Ty> {
        let mut network = Network::with_nodes(d.labels(), self.weighted.is_some());
        for (i, j, dist) in candidates {
            if dist <= self.epsilon {
                let weight = self.weighted.map_or(1.0, |mode| mode.weight(dist));
                network.add_edge(i, j, weight);
            }
        }
        debug!(edges = network.edge_count(), "epsilon network built");
        network
    }
}

fn undirected_distance(d: &DistanceMatrix, i: usize, j: usize) -> f64 {
    d.get(i, j).min(d.get(j, i))
}

/// Complete weighted network: ε-NN with `epsilon = +inf`.
///
/// # Errors
///
/// Same as [`EpsilonConfig::build`].
pub fn weighted(
    matrix: &DistanceMatrix,
    mode: WeightMode,
    missing: MissingPolicy,
) -> Result<Network<Undirected>, GraphError> {
    EpsilonConfig::new(f64::INFINITY)?
        .with_weights(mode)
        .with_missing(missing)
        .build(matrix)
}

/// Network of significant links from a binary matrix (0 = significant):
/// ε-NN with `epsilon = 0`.
///
/// # Errors
///
/// [`GraphError::UnresolvedMissing`] if missing cells have no replacement policy.
pub fn significant_links(
    matrix: &DistanceMatrix,
    missing: MissingPolicy,
) -> Result<Network<Undirected>, GraphError> {
    EpsilonConfig::new(0.0)?.with_missing(missing).build(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DistanceMatrix {
        DistanceMatrix::from_rows(vec![
            vec![0.0, 0.2, 0.9, 0.5],
            vec![0.2, 0.0, 0.4, 0.8],
            vec![0.9, 0.4, 0.0, 0.3],
            vec![0.5, 0.8, 0.3, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn threshold_selects_close_pairs() {
        let net = EpsilonConfig::new(0.35).unwrap().build(&sample()).unwrap();
        let edges: Vec<_> = net.edges().iter().map(|e| (e.source, e.target)).collect();
        assert_eq!(edges, vec![(0, 1), (2, 3)]);
        assert!(!net.is_weighted());
    }

    #[test]
    fn threshold_is_inclusive() {
        let net = EpsilonConfig::new(0.3).unwrap().build(&sample()).unwrap();
        assert!(net.has_edge(2, 3));
    }

    #[test]
    fn weighted_graph_is_complete() {
        let net = weighted(&sample(), WeightMode::OneMinus, MissingPolicy::Reject).unwrap();
        assert!((net.density() - 1.0).abs() < 1e-12);
        for e in net.edges() {
            let expected = 1.0 - sample().get(e.source, e.target);
            assert!((e.weight.unwrap() - expected).abs() < 1e-12);
        }
        let raw = weighted(&sample(), WeightMode::Raw, MissingPolicy::Reject).unwrap();
        assert_eq!(raw.edge_weight(0, 2), Some(0.9));
    }

    #[test]
    fn one_minus_requires_unit_range() {
        let mut m = sample();
        m.set(0, 3, 1.5).unwrap();
        let err = weighted(&m, WeightMode::OneMinus, MissingPolicy::Reject).unwrap_err();
        assert_eq!(err, GraphError::WeightsOutOfRange { row: 0, col: 3, value: 1.5 });
        assert!(weighted(&m, WeightMode::Raw, MissingPolicy::Reject).is_ok());
    }

    #[test]
    fn significant_links_follow_block_structure() {
        let m = DistanceMatrix::from_rows(vec![
            vec![0.0, 0.0, 1.0, 1.0, 1.0],
            vec![0.0, 0.0, 1.0, 1.0, 1.0],
            vec![1.0, 1.0, 0.0, 0.0, 1.0],
            vec![1.0, 1.0, 0.0, 0.0, 1.0],
            vec![1.0, 1.0, 1.0, 1.0, 0.0],
        ])
        .unwrap();
        let net = significant_links(&m, MissingPolicy::Reject).unwrap();
        assert_eq!(net.edge_count(), 2);
        assert_eq!(net.connected_components(), 3);
    }

    #[test]
    fn directed_uses_both_orientations() {
        let m = DistanceMatrix::from_rows(vec![vec![0.0, 0.1], vec![0.9, 0.0]]).unwrap();
        let net = EpsilonConfig::new(0.5).unwrap().build_directed(&m).unwrap();
        assert!(net.has_edge(0, 1));
        assert!(!net.has_edge(1, 0));
    }

    #[test]
    fn undirected_links_either_orientation() {
        let m = DistanceMatrix::from_rows(vec![
            vec![0.0, 0.9, 0.8],
            vec![0.1, 0.0, 0.9],
            vec![0.7, 0.95, 0.0],
        ])
        .unwrap();
        let net = EpsilonConfig::new(0.5)
            .unwrap()
            .with_weights(WeightMode::Raw)
            .build(&m)
            .unwrap();
        assert_eq!(net.edge_count(), 1);
        assert_eq!(net.edge_weight(0, 1), Some(0.1));

        let complete = weighted(&m, WeightMode::OneMinus, MissingPolicy::Reject).unwrap();
        assert_eq!(complete.edge_weight(0, 2), Some(1.0 - 0.7));
        assert_eq!(complete.edge_weight(1, 2), Some(1.0 - 0.9));
    }

    #[test]
    fn missing_policy_max_keeps_failed_pairs_out() {
        let mut m = sample();
        m.set(0, 1, f64::NAN).unwrap();
        m.set(1, 0, f64::NAN).unwrap();
        let config = EpsilonConfig::new(0.5).unwrap();
        assert!(config.build(&m).is_err());
        let net = config.with_missing(MissingPolicy::max_of(&m)).build(&m).unwrap();
        assert!(!net.has_edge(0, 1));
        assert!(net.has_edge(0, 3));
    }

    #[test]
    fn approximate_matches_exact_without_slack() {
        let points: [f64; 6] = [0.0, 0.7, 1.1, 2.5, 2.6, 4.0];
        let m = DistanceMatrix::from_rows(
            points.iter().map(|a| points.iter().map(|b| (a - b).abs()).collect()).collect(),
        )
        .unwrap();
        let config = EpsilonConfig::new(1.2).unwrap();
        assert_eq!(
            config.build(&m).unwrap().edges(),
            config.build_approx(&m, 0.0).unwrap().edges()
        );
    }
}

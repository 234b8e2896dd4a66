//! k-nearest-neighbour networks.

use std::collections::BTreeSet;

use petgraph::Undirected;
use tracing::{debug, instrument};
use tsnet_pairwise::DistanceMatrix;

use crate::error::GraphError;
use crate::index::NeighborIndex;
use crate::missing::MissingPolicy;
use crate::network::Network;

/// Connect every node to its `k` closest nodes.
///
/// Each row is ranked by distance with ties going to the lower index; self
/// is never selected. A pair becomes an undirected edge when either side
/// selects the other. With `k >= n - 1` every node links to every other.
///
/// # Errors
///
/// [`GraphError::UnresolvedMissing`] if the matrix has missing cells and
/// `missing` is [`MissingPolicy::Reject`].
#[instrument(skip(matrix), fields(n = matrix.len()))]
pub fn knn(
    matrix: &DistanceMatrix,
    k: usize,
    missing: MissingPolicy,
) -> Result<Network<Undirected>, GraphError> {
    let d = missing.resolve(matrix)?;
    let selections = (0..d.len()).map(|i| (i, nearest(d.row(i), i, k)));
    let network = undirected_from_selections(&d, selections);
    debug!(edges = network.edge_count(), "k-NN network built");
    Ok(network)
}

/// [`knn`] backed by a [`NeighborIndex`] with `(1 + eps)` pruning.
///
/// `eps = 0` gives the exact selection on metric distances; larger values
/// visit fewer candidates and may miss true neighbours.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`GraphError::UnresolvedMissing`] | missing cells without a replacement policy |
/// | [`GraphError::InvalidParameter`] | `eps` negative or not finite |
#[instrument(skip(matrix), fields(n = matrix.len()))]
pub fn knn_approx(
    matrix: &DistanceMatrix,
    k: usize,
    eps: f64,
    missing: MissingPolicy,
) -> Result<Network<Undirected>, GraphError> {
    if !(eps.is_finite() && eps >= 0.0) {
        return Err(GraphError::invalid("eps", eps, "a finite value >= 0"));
    }
    let d = missing.resolve(matrix)?;
    let index = NeighborIndex::build(&d);
    let selections = (0..d.len()).map(|i| (i, index.knn(i, k, eps)));
    let network = undirected_from_selections(&d, selections);
    debug!(edges = network.edge_count(), "approximate k-NN network built");
    Ok(network)
}

/// Indices of the `k` smallest entries of `row`, excluding `self_index`.
fn nearest(row: &[f64], self_index: usize, k: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..row.len()).filter(|&j| j != self_index).collect();
    // stable: equal distances keep index order
    order.sort_by(|&a, &b| row[a].total_cmp(&row[b]));
    order.truncate(k);
    order
}

fn undirected_from_selections(
    d: &DistanceMatrix,
    selections: impl Iterator<Item = (usize, Vec<usize>)>,
) -> Network<Undirected> {
    let pairs: BTreeSet<(usize, usize)> = selections
        .flat_map(|(i, picked)| picked.into_iter().map(move |j| (i.min(j), i.max(j))))
        .collect();
    let mut network = Network::with_nodes(d.labels(), false);
    for (i, j) in pairs {
        network.add_edge(i, j, 1.0);
    }
    network
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(points: &[f64]) -> DistanceMatrix {
        DistanceMatrix::from_rows(
            points
                .iter()
                .map(|a| points.iter().map(|b| (a - b).abs()).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn one_nearest_neighbour_on_a_line() {
        // 0 - 1 close, 5 - 6 close, 20 alone picks 6
        let m = line(&[0.0, 1.0, 5.0, 6.0, 20.0]);
        let net = knn(&m, 1, MissingPolicy::Reject).unwrap();
        let mut edges: Vec<_> = net.edges().iter().map(|e| (e.source, e.target)).collect();
        edges.sort_unstable();
        assert_eq!(edges, vec![(0, 1), (2, 3), (3, 4)]);
    }

    #[test]
    fn degree_is_at_least_k() {
        let m = line(&[0.0, 2.0, 3.0, 7.0, 11.0, 12.5, 30.0]);
        for k in 1..=3 {
            let net = knn(&m, k, MissingPolicy::Reject).unwrap();
            for node in 0..m.len() {
                assert!(net.degree(node) >= k, "k {k} node {node}");
            }
        }
    }

    #[test]
    fn large_k_gives_complete_graph() {
        let m = line(&[0.0, 1.0, 3.0, 4.0]);
        let net = knn(&m, 10, MissingPolicy::Reject).unwrap();
        assert_eq!(net.edge_count(), 6);
        assert!((net.density() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn ties_go_to_lower_index() {
        // node 1 is equidistant from 0 and 2
        let m = line(&[0.0, 1.0, 2.0]);
        assert_eq!(nearest(m.row(1), 1, 1), vec![0]);
    }

    #[test]
    fn missing_cells_need_a_policy() {
        let m = DistanceMatrix::from_rows(vec![
            vec![0.0, f64::NAN],
            vec![f64::NAN, 0.0],
        ])
        .unwrap();
        assert!(matches!(
            knn(&m, 1, MissingPolicy::Reject),
            Err(GraphError::UnresolvedMissing { .. })
        ));
        assert_eq!(knn(&m, 1, MissingPolicy::Replace(1.0)).unwrap().edge_count(), 1);
    }

    #[test]
    fn exact_index_matches_brute_force() {
        let m = line(&[0.0, 1.5, 4.0, 4.7, 9.0, 13.0, 13.2, 25.0]);
        for k in 1..=4 {
            let exact = knn(&m, k, MissingPolicy::Reject).unwrap();
            let indexed = knn_approx(&m, k, 0.0, MissingPolicy::Reject).unwrap();
            assert_eq!(exact.edges(), indexed.edges(), "k {k}");
        }
    }

    #[test]
    fn approximate_rejects_negative_eps() {
        let m = line(&[0.0, 1.0]);
        assert!(knn_approx(&m, 1, -0.5, MissingPolicy::Reject).is_err());
    }
}

//! Vantage-point tree over the rows of a distance matrix.
//!
//! Queries prune subtrees with the triangle inequality. With `eps > 0` the
//! search radius is shrunk to `tau / (1 + eps)`, trading recall for fewer
//! visited nodes: every reported neighbour is within `(1 + eps)` of the true
//! k-th distance when the matrix is a metric.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tsnet_pairwise::DistanceMatrix;

#[derive(Debug, Clone, Copy)]
struct VpNode {
    point: usize,
    threshold: f64,
    inside: Option<usize>,
    outside: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    dist: f64,
    index: usize,
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist
            .total_cmp(&other.dist)
            .then(self.index.cmp(&other.index))
    }
}

/// Nearest-neighbour index whose points are the rows of a distance matrix.
#[derive(Debug)]
pub struct NeighborIndex<'a> {
    matrix: &'a DistanceMatrix,
    nodes: Vec<VpNode>,
    root: Option<usize>,
}

impl<'a> NeighborIndex<'a> {
    /// Build the tree. The first point of every subset is its vantage point,
    /// so construction is deterministic.
    #[must_use]
    pub fn build(matrix: &'a DistanceMatrix) -> Self {
        let mut index = Self {
            matrix,
            nodes: Vec::with_capacity(matrix.len()),
            root: None,
        };
        let points: Vec<usize> = (0..matrix.len()).collect();
        index.root = index.build_subtree(points);
        index
    }

    fn dist(&self, a: usize, b: usize) -> f64 {
        self.matrix.get(a, b)
    }

    fn build_subtree(&mut self, mut points: Vec<usize>) -> Option<usize> {
        if points.is_empty() {
            return None;
        }
        let vantage = points.swap_remove(0);
        let mut by_dist: Vec<(f64, usize)> =
            points.into_iter().map(|p| (self.dist(vantage, p), p)).collect();
        by_dist.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let threshold = by_dist.get(by_dist.len() / 2).map_or(0.0, |&(d, _)| d);
        let (inside, outside): (Vec<_>, Vec<_>) = by_dist.into_iter().partition(|&(d, _)| d <= threshold);

        let id = self.nodes.len();
        self.nodes.push(VpNode {
            point: vantage,
            threshold,
            inside: None,
            outside: None,
        });
        let inside = self.build_subtree(inside.into_iter().map(|(_, p)| p).collect());
        let outside = self.build_subtree(outside.into_iter().map(|(_, p)| p).collect());
        self.nodes[id].inside = inside;
        self.nodes[id].outside = outside;
        Some(id)
    }

    /// Up to `k` neighbours of point `query` (itself excluded), closest first.
    #[must_use]
    pub fn knn(&self, query: usize, k: usize, eps: f64) -> Vec<usize> {
        if k == 0 {
            return Vec::new();
        }
        let mut heap = BinaryHeap::with_capacity(k + 1);
        self.search_knn(self.root, query, k, 1.0 + eps.max(0.0), &mut heap);
        let mut found = heap.into_sorted_vec();
        found.truncate(k);
        found.into_iter().map(|c| c.index).collect()
    }

    fn search_knn(
        &self,
        node: Option<usize>,
        query: usize,
        k: usize,
        shrink: f64,
        heap: &mut BinaryHeap<Candidate>,
    ) {
        let Some(id) = node else { return };
        let VpNode { point, threshold, inside, outside } = self.nodes[id];
        let dist = self.dist(query, point);
        if point != query {
            heap.push(Candidate { dist, index: point });
            if heap.len() > k {
                heap.pop();
            }
        }
        let tau = |heap: &BinaryHeap<Candidate>| {
            if heap.len() < k {
                f64::INFINITY
            } else {
                heap.peek().map_or(f64::INFINITY, |c| c.dist) / shrink
            }
        };
        let (near, far, near_is_inside) = if dist <= threshold {
            (inside, outside, true)
        } else {
            (outside, inside, false)
        };
        self.search_knn(near, query, k, shrink, heap);
        let t = tau(heap);
        let visit_far = if near_is_inside {
            dist + t >= threshold
        } else {
            dist - t <= threshold
        };
        if visit_far {
            self.search_knn(far, query, k, shrink, heap);
        }
    }

    /// Points within `radius` of `query` (itself excluded), in index order.
    ///
    /// Never reports a point farther than `radius`; with `eps > 0` some
    /// points near the boundary may be missed.
    #[must_use]
    pub fn radius(&self, query: usize, radius: f64, eps: f64) -> Vec<usize> {
        let mut found = Vec::new();
        let reach = radius / (1.0 + eps.max(0.0));
        self.search_radius(self.root, query, radius, reach, &mut found);
        found.sort_unstable();
        found
    }

    fn search_radius(
        &self,
        node: Option<usize>,
        query: usize,
        radius: f64,
        reach: f64,
        found: &mut Vec<usize>,
    ) {
        let Some(id) = node else { return };
        let VpNode { point, threshold, inside, outside } = self.nodes[id];
        let dist = self.dist(query, point);
        if point != query && dist <= radius {
            found.push(point);
        }
        if dist - reach <= threshold {
            self.search_radius(inside, query, radius, reach, found);
        }
        if dist + reach >= threshold {
            self.search_radius(outside, query, radius, reach, found);
        }
    }
}

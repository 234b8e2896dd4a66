//! Enumeration of the index pairs a computation visits.

use crate::error::PairwiseError;

/// The ordered pair set for `n` series.
///
/// Symmetric: every `(i, j)` with `i < j`, lexicographic.
/// Asymmetric: every `(i, j)` in `0..n x 0..n`, row-major, self-pairs included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairSet {
    n: usize,
    symmetric: bool,
}

impl PairSet {
    /// Create the pair set for `n` series.
    #[must_use]
    pub fn new(n: usize, symmetric: bool) -> Self {
        Self { n, symmetric }
    }

    /// Number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        if self.symmetric {
            self.n * self.n.saturating_sub(1) / 2
        } else {
            self.n * self.n
        }
    }

    /// Return true if there are no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over the pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let n = self.n;
        let symmetric = self.symmetric;
        (0..n).flat_map(move |i| {
            let start = if symmetric { i + 1 } else { 0 };
            (start..n).map(move |j| (i, j))
        })
    }

    /// Collect every pair.
    #[must_use]
    pub fn to_vec(&self) -> Vec<(usize, usize)> {
        self.iter().collect()
    }

    /// Contiguous slice of the pair order for partition `part` of `total_parts`.
    ///
    /// `part` is 1-based. Chunk sizes differ by at most one; the first
    /// `len % total_parts` chunks get the extra pair.
    ///
    /// # Errors
    ///
    /// [`PairwiseError::InvalidPartition`] if `total_parts == 0` or `part` is
    /// outside `1..=total_parts`.
    pub fn chunk(&self, part: usize, total_parts: usize) -> Result<Vec<(usize, usize)>, PairwiseError> {
        let (start, count) = chunk_bounds(self.len(), part, total_parts)?;
        Ok(self.iter().skip(start).take(count).collect())
    }
}

/// `(start, count)` of a balanced contiguous chunk.
pub(crate) fn chunk_bounds(
    len: usize,
    part: usize,
    total_parts: usize,
) -> Result<(usize, usize), PairwiseError> {
    if total_parts == 0 || part == 0 || part > total_parts {
        return Err(PairwiseError::InvalidPartition { part, total_parts });
    }
    let p = part - 1;
    let base = len / total_parts;
    let extra = len % total_parts;
    let start = p * base + p.min(extra);
    let count = base + usize::from(p < extra);
    Ok((start, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric_order_is_lexicographic() {
        let pairs = PairSet::new(4, true).to_vec();
        assert_eq!(pairs, vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
    }

    #[test]
    fn asymmetric_includes_self_pairs() {
        let set = PairSet::new(3, false);
        assert_eq!(set.len(), 9);
        assert_eq!(set.to_vec()[0], (0, 0));
        assert_eq!(set.to_vec()[5], (1, 2));
    }

    #[test]
    fn degenerate_sizes() {
        assert!(PairSet::new(0, true).is_empty());
        assert!(PairSet::new(1, true).is_empty());
        assert_eq!(PairSet::new(1, false).len(), 1);
    }

    #[test]
    fn chunks_cover_pairs_in_order() {
        let set = PairSet::new(7, true);
        for total in [1, 2, 3, 4, 10, 30] {
            let mut joined = Vec::new();
            let mut sizes = Vec::new();
            for part in 1..=total {
                let chunk = set.chunk(part, total).unwrap();
                sizes.push(chunk.len());
                joined.extend(chunk);
            }
            assert_eq!(joined, set.to_vec(), "total {total}");
            let (lo, hi) = (sizes.iter().min().unwrap(), sizes.iter().max().unwrap());
            assert!(hi - lo <= 1, "total {total}: {sizes:?}");
        }
    }

    #[test]
    fn invalid_partitions_rejected() {
        let set = PairSet::new(5, true);
        assert!(set.chunk(0, 3).is_err());
        assert!(set.chunk(4, 3).is_err());
        assert_eq!(
            set.chunk(1, 0),
            Err(PairwiseError::InvalidPartition { part: 1, total_parts: 0 })
        );
    }
}

//! Dense distance matrix with optional series identifiers.

use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::error::PairwiseError;

/// Square distance matrix stored row-major.
///
/// NaN marks a missing cell (a pair whose distance could not be computed).
/// The matrix is symmetric when it was produced in symmetric mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceMatrix {
    n: usize,
    data: Vec<f64>,
    names: Option<Vec<String>>,
}

impl DistanceMatrix {
    /// Create an `n x n` matrix with every cell 0.
    #[must_use]
    pub fn unfilled(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n],
            names: None,
        }
    }

    /// Build a matrix from its rows.
    ///
    /// # Errors
    ///
    /// [`PairwiseError::NotSquare`] if some row length differs from the row count.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, PairwiseError> {
        let n = rows.len();
        let mut data = Vec::with_capacity(n * n);
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != n {
                return Err(PairwiseError::NotSquare { row, len: values.len(), n });
            }
            data.extend(values);
        }
        Ok(Self { n, data, names: None })
    }

    /// Attach one identifier per row.
    ///
    /// # Errors
    ///
    /// [`PairwiseError::NameCount`] if `names.len()` differs from the matrix size.
    pub fn with_names(mut self, names: Vec<String>) -> Result<Self, PairwiseError> {
        if names.len() != self.n {
            return Err(PairwiseError::NameCount { names: names.len(), series: self.n });
        }
        self.names = Some(names);
        Ok(self)
    }

    pub(crate) fn set_names(&mut self, names: Option<&[String]>) {
        self.names = names.map(<[String]>::to_vec);
    }

    /// Return the number of rows (and columns).
    #[must_use]
    pub fn len(&self) -> usize {
        self.n
    }

    /// Return true if the matrix is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Return the identifiers, if any.
    #[must_use]
    pub fn names(&self) -> Option<&[String]> {
        self.names.as_deref()
    }

    /// Identifiers to use as node labels: the names, or `"1"..="n"` without names.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        match &self.names {
            Some(names) => names.clone(),
            None => (1..=self.n).map(|i| i.to_string()).collect(),
        }
    }

    /// Return cell `(i, j)`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= n` or `j >= n`.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.n, "row index {i} out of bounds for matrix of size {}", self.n);
        assert!(j < self.n, "column index {j} out of bounds for matrix of size {}", self.n);
        self.data[i * self.n + j]
    }

    /// Overwrite cell `(i, j)`.
    ///
    /// # Errors
    ///
    /// [`PairwiseError::IndexOutOfRange`] if either index is `>= n`.
    pub fn set(&mut self, i: usize, j: usize, value: f64) -> Result<(), PairwiseError> {
        for index in [i, j] {
            if index >= self.n {
                return Err(PairwiseError::IndexOutOfRange { index, n: self.n });
            }
        }
        self.data[i * self.n + j] = value;
        Ok(())
    }

    /// Return row `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= n`.
    #[must_use]
    pub fn row(&self, i: usize) -> &[f64] {
        assert!(i < self.n, "row index {i} out of bounds for matrix of size {}", self.n);
        &self.data[i * self.n..(i + 1) * self.n]
    }

    /// Iterate over every cell as `(i, j, value)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.data
            .iter()
            .enumerate()
            .map(move |(k, &v)| (k / self.n, k % self.n, v))
    }

    /// Iterate over the strict upper triangle as `(i, j, value)` with `i < j`.
    pub fn upper_triangle(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.n).flat_map(move |i| (i + 1..self.n).map(move |j| (i, j, self.get(i, j))))
    }

    /// Return true if `D[i][j] == D[j][i]` for every pair (NaN cells match NaN).
    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        self.upper_triangle().all(|(i, j, v)| {
            let w = self.get(j, i);
            v == w || (v.is_nan() && w.is_nan())
        })
    }

    /// Return true if any cell is NaN.
    #[must_use]
    pub fn has_missing(&self) -> bool {
        self.data.iter().any(|v| v.is_nan())
    }

    /// Largest non-missing value, if any.
    #[must_use]
    pub fn max_value(&self) -> Option<f64> {
        self.data
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .reduce(f64::max)
    }

    /// Return a copy with every NaN cell replaced by `value`.
    #[must_use]
    pub fn replace_missing(&self, value: f64) -> Self {
        let mut out = self.clone();
        for v in out.data.iter_mut().filter(|v| v.is_nan()) {
            *v = value;
        }
        out
    }
}

impl Index<(usize, usize)> for DistanceMatrix {
    type Output = f64;

    fn index(&self, (i, j): (usize, usize)) -> &Self::Output {
        assert!(i < self.n && j < self.n, "index ({i}, {j}) out of bounds for matrix of size {}", self.n);
        &self.data[i * self.n + j]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_matrix() -> DistanceMatrix {
        DistanceMatrix::from_rows(vec![
            vec![0.0, 1.0, 2.0],
            vec![1.0, 0.0, f64::NAN],
            vec![2.0, f64::NAN, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn unfilled_is_all_zero() {
        let m = DistanceMatrix::unfilled(3);
        assert!(m.iter().all(|(_, _, v)| v == 0.0));
        assert_eq!(m.iter().count(), 9);
    }

    #[test]
    fn from_rows_requires_square() {
        let err = DistanceMatrix::from_rows(vec![vec![0.0, 1.0], vec![1.0]]).unwrap_err();
        assert_eq!(err, PairwiseError::NotSquare { row: 1, len: 1, n: 2 });
    }

    #[test]
    fn access_and_rows() {
        let m = make_matrix();
        assert_eq!(m.get(0, 2), 2.0);
        assert_eq!(m[(2, 0)], 2.0);
        assert_eq!(m.row(0), &[0.0, 1.0, 2.0]);
    }

    #[test]
    fn set_checks_bounds() {
        let mut m = DistanceMatrix::unfilled(2);
        m.set(0, 1, 4.0).unwrap();
        assert_eq!(m.get(0, 1), 4.0);
        assert_eq!(m.set(2, 0, 1.0), Err(PairwiseError::IndexOutOfRange { index: 2, n: 2 }));
    }

    #[test]
    fn symmetry_treats_nan_as_equal() {
        let mut m = make_matrix();
        assert!(m.is_symmetric());
        m.set(0, 1, 5.0).unwrap();
        assert!(!m.is_symmetric());
    }

    #[test]
    fn missing_cells() {
        let m = make_matrix();
        assert!(m.has_missing());
        assert_eq!(m.max_value(), Some(2.0));
        let filled = m.replace_missing(9.0);
        assert!(!filled.has_missing());
        assert_eq!(filled.get(1, 2), 9.0);
    }

    #[test]
    fn labels_default_to_one_based_indices() {
        let m = make_matrix();
        assert_eq!(m.labels(), vec!["1", "2", "3"]);
        let named = m.with_names(vec!["a".into(), "b".into(), "c".into()]).unwrap();
        assert_eq!(named.labels(), vec!["a", "b", "c"]);
    }

    #[test]
    fn upper_triangle_order() {
        let pairs: Vec<_> = make_matrix().upper_triangle().map(|(i, j, _)| (i, j)).collect();
        assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 2)]);
    }
}

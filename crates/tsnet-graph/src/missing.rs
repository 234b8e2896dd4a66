//! Policies for cells that hold no distance.

use std::borrow::Cow;

use tsnet_pairwise::DistanceMatrix;

use crate::error::GraphError;

/// What to do with missing (NaN) cells before building a network.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum MissingPolicy {
    /// Refuse matrices with missing cells.
    #[default]
    Reject,
    /// Replace every missing cell with this value.
    Replace(f64),
}

impl MissingPolicy {
    /// Replace missing cells with the largest observed distance, which keeps
    /// failed pairs out of threshold graphs.
    #[must_use]
    pub fn max_of(matrix: &DistanceMatrix) -> Self {
        Self::Replace(matrix.max_value().unwrap_or(0.0))
    }

    /// The matrix with missing cells handled.
    pub(crate) fn resolve<'a>(
        &self,
        matrix: &'a DistanceMatrix,
    ) -> Result<Cow<'a, DistanceMatrix>, GraphError> {
        if !matrix.has_missing() {
            return Ok(Cow::Borrowed(matrix));
        }
        match *self {
            Self::Replace(value) => Ok(Cow::Owned(matrix.replace_missing(value))),
            Self::Reject => {
                let (row, col, _) = matrix
                    .iter()
                    .find(|(_, _, v)| v.is_nan())
                    .unwrap_or((0, 0, f64::NAN));
                Err(GraphError::UnresolvedMissing { row, col })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_gap() -> DistanceMatrix {
        DistanceMatrix::from_rows(vec![
            vec![0.0, 0.4, f64::NAN],
            vec![0.4, 0.0, 0.7],
            vec![f64::NAN, 0.7, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn reject_reports_first_missing_cell() {
        let err = MissingPolicy::Reject.resolve(&with_gap()).unwrap_err();
        assert_eq!(err, GraphError::UnresolvedMissing { row: 0, col: 2 });
    }

    #[test]
    fn max_of_uses_largest_distance() {
        let m = with_gap();
        let policy = MissingPolicy::max_of(&m);
        assert_eq!(policy, MissingPolicy::Replace(0.7));
        assert_eq!(policy.resolve(&m).unwrap().get(2, 0), 0.7);
    }

    #[test]
    fn complete_matrix_is_borrowed() {
        let m = DistanceMatrix::unfilled(2);
        assert!(matches!(MissingPolicy::Reject.resolve(&m).unwrap(), Cow::Borrowed(_)));
    }
}

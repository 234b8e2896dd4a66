//! Assembling partition output into a matrix.

use tracing::{debug, instrument};

use crate::error::PairwiseError;
use crate::matrix::DistanceMatrix;
use crate::record::DistanceRecord;

/// Write one record into `matrix`.
///
/// # Errors
///
/// [`PairwiseError::IndexOutOfRange`] if the record points outside the matrix.
pub fn write_cell(
    mut matrix: DistanceMatrix,
    record: DistanceRecord,
) -> Result<DistanceMatrix, PairwiseError> {
    matrix.set(record.i, record.j, record.dist)?;
    Ok(matrix)
}

/// Fold a batch of records into an existing matrix.
///
/// Later records overwrite earlier ones at the same cell.
///
/// # Errors
///
/// [`PairwiseError::IndexOutOfRange`] for the first out-of-range record.
pub fn merge_into<I>(matrix: DistanceMatrix, records: I) -> Result<DistanceMatrix, PairwiseError>
where
    I: IntoIterator<Item = DistanceRecord>,
{
    records.into_iter().try_fold(matrix, write_cell)
}

/// Assemble records from any number of partitions into an `n x n` matrix.
///
/// Cells no record writes stay 0.
///
/// # Errors
///
/// [`PairwiseError::IndexOutOfRange`] for the first out-of-range record.
#[instrument(skip(records))]
pub fn merge_records<I>(records: I, n: usize) -> Result<DistanceMatrix, PairwiseError>
where
    I: IntoIterator<Item = DistanceRecord>,
{
    let matrix = merge_into(DistanceMatrix::unfilled(n), records)?;
    debug!(n, "records merged");
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwritten_cells_are_zero() {
        let m = merge_records([DistanceRecord::new(0, 1, 0.5)], 3).unwrap();
        assert_eq!(m.get(0, 1), 0.5);
        assert_eq!(m.get(1, 0), 0.0);
        assert_eq!(m.get(2, 2), 0.0);
    }

    #[test]
    fn order_of_batches_does_not_matter() {
        let a = vec![DistanceRecord::new(0, 1, 1.0), DistanceRecord::new(1, 0, 1.0)];
        let b = vec![DistanceRecord::new(1, 2, 2.0), DistanceRecord::new(2, 1, 2.0)];
        let ab = merge_into(merge_records(a.clone(), 3).unwrap(), b.clone()).unwrap();
        let ba = merge_into(merge_records(b, 3).unwrap(), a).unwrap();
        assert_eq!(ab, ba);
    }

    #[test]
    fn out_of_range_record_is_fatal() {
        let err = merge_records([DistanceRecord::new(0, 3, 1.0)], 3).unwrap_err();
        assert_eq!(err, PairwiseError::IndexOutOfRange { index: 3, n: 3 });
    }

    #[test]
    fn nan_records_are_kept() {
        let m = merge_records([DistanceRecord::new(1, 0, f64::NAN)], 2).unwrap();
        assert!(m.get(1, 0).is_nan());
    }
}

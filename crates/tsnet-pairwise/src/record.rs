//! Distance records: the unit of partition output.

use serde::{Deserialize, Serialize};

/// One computed cell: `D[i][j] = dist`. Indices are zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceRecord {
    /// Row index.
    pub i: usize,
    /// Column index.
    pub j: usize,
    /// Distance value; NaN when the pair failed with the default error value.
    pub dist: f64,
}

impl DistanceRecord {
    /// Create a record.
    #[must_use]
    pub fn new(i: usize, j: usize, dist: f64) -> Self {
        Self { i, j, dist }
    }

    /// The same value at the mirrored cell.
    #[must_use]
    pub fn transposed(self) -> Self {
        Self {
            i: self.j,
            j: self.i,
            dist: self.dist,
        }
    }
}

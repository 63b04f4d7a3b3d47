//! The square, region-ordered mobility flow matrix.

use crate::error::MobilityError;

/// A square matrix of daily commuter counts over the ordered region set.
///
/// Entry `(i, j)` is the number of people whose home is region `i` and
/// who travel to region `j` each day. Entries are `Option<u64>`: a
/// missing entry (the NaN convention of upstream data files) means zero
/// flow. The diagonal is unused and always reads as zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MobilityMatrix {
    n: usize,
    flows: Vec<Option<u64>>,
}

impl MobilityMatrix {
    /// Build a matrix from rows. Every row must have length
    /// `rows.len()`.
    pub fn from_rows(rows: Vec<Vec<Option<u64>>>) -> Result<Self, MobilityError> {
        let n = rows.len();
        for (row, entries) in rows.iter().enumerate() {
            if entries.len() != n {
                return Err(MobilityError::NotSquare {
                    row,
                    row_len: entries.len(),
                    expected: n,
                });
            }
        }
        Ok(Self {
            n,
            flows: rows.into_iter().flatten().collect(),
        })
    }

    /// Number of regions covered by the matrix.
    pub fn n_regions(&self) -> usize {
        self.n
    }

    /// The raw entry at `(from, to)`, `None` for missing data.
    pub fn raw(&self, from: usize, to: usize) -> Option<u64> {
        self.flows[from * self.n + to]
    }

    /// Commuter count from `from` to `to`. Missing entries and the
    /// diagonal read as zero.
    pub fn flow(&self, from: usize, to: usize) -> u64 {
        if from == to {
            return 0;
        }
        self.raw(from, to).unwrap_or(0)
    }

    /// Sum of `flow(from, k)` for `k < upto`: the cumulative row sum
    /// that positions pair `(from, upto)` in the contiguous layout.
    pub fn row_prefix(&self, from: usize, upto: usize) -> u64 {
        (0..upto).map(|k| self.flow(from, k)).sum()
    }

    /// Sum of `flow(k, to)` for `k < upto`: the cumulative column sum
    /// that positions pair `(upto, to)` among region `to`'s inbound
    /// slots.
    pub fn col_prefix(&self, to: usize, upto: usize) -> u64 {
        (0..upto).map(|k| self.flow(k, to)).sum()
    }

    /// Total outbound commuters from region `from`.
    pub fn row_total(&self, from: usize) -> u64 {
        self.row_prefix(from, self.n)
    }

    /// Total inbound commuters to region `to`.
    pub fn col_total(&self, to: usize) -> u64 {
        self.col_prefix(to, self.n)
    }
}

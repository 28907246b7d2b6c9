//! Compressed-sparse-row storage.
//!
//! Every `CsrMatrix` carries two bookkeeping fields on top of the usual
//! row-pointer/column-index/value triplet: a per-allocation `id` and a
//! monotonic structural `version`. Multiplication plans record both at
//! analysis time, which turns "the caller must not mutate operands while a
//! plan is outstanding" into a checkable condition instead of a footnote.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::traits::MatShape;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn fresh_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

pub struct CsrMatrix<T> {
    nrows: usize,
    ncols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<T>,
    id: u64,
    version: u64,
}

impl<T: Copy> CsrMatrix<T> {
    /// An all-zero matrix with no stored entries.
    pub fn empty(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            row_ptr: vec![0; nrows + 1],
            col_idx: Vec::new(),
            values: Vec::new(),
            id: fresh_id(),
            version: 0,
        }
    }

    /// Build a CSR matrix from raw row-ptr, col-idx, and values.
    ///
    /// Column indices must be strictly increasing within each row.
    pub fn from_csr(
        nrows: usize,
        ncols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<T>,
    ) -> Self {
        assert_eq!(row_ptr.len(), nrows + 1, "row_ptr must have nrows + 1 entries");
        assert_eq!(row_ptr[nrows], col_idx.len(), "row_ptr must end at nnz");
        assert_eq!(col_idx.len(), values.len(), "one value per stored index");
        for w in row_ptr.windows(2) {
            assert!(w[0] <= w[1], "row_ptr must be non-decreasing");
        }
        for i in 0..nrows {
            let row = &col_idx[row_ptr[i]..row_ptr[i + 1]];
            for pair in row.windows(2) {
                assert!(pair[0] < pair[1], "columns must be strictly increasing in row {i}");
            }
            if let Some(&last) = row.last() {
                assert!(last < ncols, "column index out of bounds in row {i}");
            }
        }
        Self {
            nrows,
            ncols,
            row_ptr,
            col_idx,
            values,
            id: fresh_id(),
            version: 0,
        }
    }

    pub fn nnz(&self) -> usize {
        self.col_idx.len()
    }

    /// Column indices and values of row `i`.
    pub fn row(&self, i: usize) -> (&[usize], &[T]) {
        let span = self.row_ptr[i]..self.row_ptr[i + 1];
        (&self.col_idx[span.clone()], &self.values[span])
    }

    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    pub fn col_idx(&self) -> &[usize] {
        &self.col_idx
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Stored value at (i, j), or `None` when the cell is not in the pattern.
    pub fn get(&self, i: usize, j: usize) -> Option<T> {
        let (cols, vals) = self.row(i);
        cols.binary_search(&j).ok().map(|p| vals[p])
    }

    /// Iterate stored entries as (row, col, value) in row order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        (0..self.nrows).flat_map(move |i| {
            let (cols, vals) = self.row(i);
            cols.iter().zip(vals).map(move |(&j, &v)| (i, j, v))
        })
    }

    /// Replace pattern and values wholesale. Structural mutation: bumps the
    /// version, invalidating any plan analyzed against this matrix.
    pub fn set_structure(&mut self, row_ptr: Vec<usize>, col_idx: Vec<usize>, values: Vec<T>) {
        let rebuilt = Self::from_csr(self.nrows, self.ncols, row_ptr, col_idx, values);
        self.row_ptr = rebuilt.row_ptr;
        self.col_idx = rebuilt.col_idx;
        self.values = rebuilt.values;
        self.version += 1;
    }

    /// Drop every stored entry. Structural mutation.
    pub fn clear(&mut self) {
        self.row_ptr = vec![0; self.nrows + 1];
        self.col_idx.clear();
        self.values.clear();
        self.version += 1;
    }
}

impl<T> CsrMatrix<T> {
    /// Identity of this allocation; stable for its whole lifetime.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Structural version; bumped by every pattern mutation.
    pub fn version(&self) -> u64 {
        self.version
    }
}

impl<T> MatShape for CsrMatrix<T> {
    fn nrows(&self) -> usize {
        self.nrows
    }
    fn ncols(&self) -> usize {
        self.ncols
    }
}

/// A clone is a new matrix: it shares the pattern and values but carries a
/// fresh identity, so plans analyzed against the original do not transfer.
impl<T: Clone> Clone for CsrMatrix<T> {
    fn clone(&self) -> Self {
        Self {
            nrows: self.nrows,
            ncols: self.ncols,
            row_ptr: self.row_ptr.clone(),
            col_idx: self.col_idx.clone(),
            values: self.values.clone(),
            id: fresh_id(),
            version: 0,
        }
    }
}

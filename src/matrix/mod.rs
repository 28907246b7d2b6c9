//! Matrix module: the storage-tagged matrix handle plus its sparse and
//! dense backings.
//!
//! A [`Matrix`] owns exactly one backing representation at a time (or none,
//! before first use). The storage tag is derived from the active variant,
//! never stored beside it, so tag and representation cannot fall out of
//! agreement. Switching representations discards the previous content.

use std::fmt;

use crate::core::traits::MatShape;

pub mod dense;
pub use dense::{DenseMat, Layout};
pub mod sparse;
pub use sparse::CsrMatrix;

/// Classification of a matrix's current backing representation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Storage {
    Unknown,
    Sparse,
    Dense,
}

impl fmt::Display for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Storage::Unknown => "unknown",
            Storage::Sparse => "sparse",
            Storage::Dense => "dense",
        };
        f.write_str(name)
    }
}

/// The backing representation of a [`Matrix`].
#[derive(Clone)]
pub enum Repr<T> {
    Uninitialized,
    Sparse(CsrMatrix<T>),
    Dense(DenseMat<T>),
}

/// A handle over one concrete representation, with fixed dimensions.
/// Cloning a sparse matrix gives it a fresh identity; see [`CsrMatrix`].
#[derive(Clone)]
pub struct Matrix<T> {
    nrows: usize,
    ncols: usize,
    repr: Repr<T>,
}

impl<T: Copy> Matrix<T> {
    /// A matrix with no representation yet; its storage reads `Unknown`
    /// until fixed explicitly or by a multiply that owns the destination.
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            repr: Repr::Uninitialized,
        }
    }

    /// Wrap an existing CSR triple as a sparse matrix.
    pub fn from_csr(
        nrows: usize,
        ncols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<T>,
    ) -> Self {
        Self {
            nrows,
            ncols,
            repr: Repr::Sparse(CsrMatrix::from_csr(nrows, ncols, row_ptr, col_idx, values)),
        }
    }

    /// Wrap a raw buffer as a dense matrix.
    pub fn from_dense(nrows: usize, ncols: usize, layout: Layout, data: Vec<T>) -> Self {
        Self {
            nrows,
            ncols,
            repr: Repr::Dense(DenseMat::from_raw(nrows, ncols, layout, data)),
        }
    }

    /// The tag of the active representation.
    pub fn storage(&self) -> Storage {
        match self.repr {
            Repr::Uninitialized => Storage::Unknown,
            Repr::Sparse(_) => Storage::Sparse,
            Repr::Dense(_) => Storage::Dense,
        }
    }

    pub fn repr(&self) -> &Repr<T> {
        &self.repr
    }

    pub(crate) fn repr_mut(&mut self) -> &mut Repr<T> {
        &mut self.repr
    }

    pub fn sparse(&self) -> Option<&CsrMatrix<T>> {
        match &self.repr {
            Repr::Sparse(m) => Some(m),
            _ => None,
        }
    }

    pub fn sparse_mut(&mut self) -> Option<&mut CsrMatrix<T>> {
        match &mut self.repr {
            Repr::Sparse(m) => Some(m),
            _ => None,
        }
    }

    pub fn dense(&self) -> Option<&DenseMat<T>> {
        match &self.repr {
            Repr::Dense(m) => Some(m),
            _ => None,
        }
    }

    pub fn dense_mut(&mut self) -> Option<&mut DenseMat<T>> {
        match &mut self.repr {
            Repr::Dense(m) => Some(m),
            _ => None,
        }
    }
}

impl<T: Copy + Default> Matrix<T> {
    /// Fix the representation to `storage`, allocating an empty backing of
    /// that kind and discarding whatever was held before. `Unknown` returns
    /// the matrix to its uninitialized state.
    ///
    /// Dense backings are allocated row-major and filled with `T::default()`;
    /// multiply kernels overwrite every cell before it is read.
    pub fn set_storage(&mut self, storage: Storage) {
        self.repr = match storage {
            Storage::Unknown => Repr::Uninitialized,
            Storage::Sparse => Repr::Sparse(CsrMatrix::empty(self.nrows, self.ncols)),
            Storage::Dense => Repr::Dense(DenseMat::filled(
                self.nrows,
                self.ncols,
                Layout::RowMajor,
                T::default(),
            )),
        };
    }
}

impl<T> MatShape for Matrix<T> {
    fn nrows(&self) -> usize {
        self.nrows
    }
    fn ncols(&self) -> usize {
        self.ncols
    }
}

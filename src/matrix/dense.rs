//! Dense storage: one contiguous buffer with an explicit layout.

use crate::core::traits::MatShape;

/// Element order of the backing buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Layout {
    RowMajor,
    ColMajor,
}

pub struct DenseMat<T> {
    nrows: usize,
    ncols: usize,
    layout: Layout,
    data: Vec<T>,
}

impl<T: Copy> DenseMat<T> {
    /// Construct from a raw buffer in the given layout.
    pub fn from_raw(nrows: usize, ncols: usize, layout: Layout, data: Vec<T>) -> Self {
        assert_eq!(data.len(), nrows * ncols, "buffer must hold nrows * ncols elements");
        Self { nrows, ncols, layout, data }
    }

    /// A matrix with every cell set to `value`.
    pub fn filled(nrows: usize, ncols: usize, layout: Layout, value: T) -> Self {
        Self {
            nrows,
            ncols,
            layout,
            data: vec![value; nrows * ncols],
        }
    }

    #[inline]
    fn offset(&self, i: usize, j: usize) -> usize {
        match self.layout {
            Layout::RowMajor => i * self.ncols + j,
            Layout::ColMajor => j * self.nrows + i,
        }
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> T {
        self.data[self.offset(i, j)]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: T) {
        let at = self.offset(i, j);
        self.data[at] = value;
    }

    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl<T> MatShape for DenseMat<T> {
    fn nrows(&self) -> usize {
        self.nrows
    }
    fn ncols(&self) -> usize {
        self.ncols
    }
}

impl<T: Clone> Clone for DenseMat<T> {
    fn clone(&self) -> Self {
        Self {
            nrows: self.nrows,
            ncols: self.ncols,
            layout: self.layout,
            data: self.data.clone(),
        }
    }
}

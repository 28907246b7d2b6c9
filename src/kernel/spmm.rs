//! Sparse-by-dense multiply (SpMM).
//!
//! Two variants share the same contract and differ only in how they are
//! tuned. [`auto`] picks its own parallel grain (thread count from the
//! machine via `num_cpus` when the `rayon` feature is on) and is what the
//! dispatcher runs when every kernel hint is unset. [`tiled`] is the
//! generic fallback: it honors the caller's tile extents, spins a scoped
//! thread pool of the requested size, and walks tiles in the hinted loop
//! order. Without the `rayon` feature both variants run serially and the
//! thread hint is inert.
//!
//! Every destination cell is first set to the semiring's additive identity
//! and then accumulated over the sparse row entries, so rows of `A` with an
//! empty pattern leave identity in their output cells.

use crate::config::KernelHints;
use crate::core::traits::{MatShape, Semiring};
use crate::error::GmError;
use crate::matrix::{CsrMatrix, DenseMat, Layout};

/// Auto-tuned variant, run for default hints.
pub fn auto<T, S>(
    c: &mut DenseMat<T>,
    op: &S,
    a: &CsrMatrix<T>,
    b: &DenseMat<T>,
) -> Result<(), GmError>
where
    T: Copy + Send + Sync,
    S: Semiring<T>,
{
    check_shapes(c, a, b);
    if a.nrows() == 0 || b.ncols() == 0 {
        return Ok(());
    }
    #[cfg(feature = "rayon")]
    if num_cpus::get() > 1 {
        // one row (or column) per task, matching the destination layout
        let (tile_rows, tile_cols) = match c.layout() {
            Layout::RowMajor => (1, b.ncols()),
            Layout::ColMajor => (1, 1),
        };
        return parallel(c, op, a, b, tile_rows, tile_cols);
    }
    serial(c, op, a, b, a.nrows(), b.ncols(), true);
    Ok(())
}

/// Generic fallback, parameterized by the caller's hints.
pub fn tiled<T, S>(
    c: &mut DenseMat<T>,
    op: &S,
    a: &CsrMatrix<T>,
    b: &DenseMat<T>,
    hints: &KernelHints,
) -> Result<(), GmError>
where
    T: Copy + Send + Sync,
    S: Semiring<T>,
{
    check_shapes(c, a, b);
    if a.nrows() == 0 || b.ncols() == 0 {
        return Ok(());
    }
    let tile_rows = if hints.tile_rows == 0 { a.nrows() } else { hints.tile_rows };
    let tile_cols = if hints.tile_cols == 0 { b.ncols() } else { hints.tile_cols };
    #[cfg(feature = "rayon")]
    if hints.threads > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(hints.threads)
            .build()
            .map_err(|e| GmError::Kernel(e.to_string()))?;
        return pool.install(|| parallel(c, op, a, b, tile_rows, tile_cols));
    }
    serial(c, op, a, b, tile_rows, tile_cols, hints.row_major);
    Ok(())
}

fn check_shapes<T: Copy>(c: &DenseMat<T>, a: &CsrMatrix<T>, b: &DenseMat<T>) {
    assert_eq!(a.ncols(), b.nrows(), "inner dimensions must agree");
    assert_eq!(c.nrows(), a.nrows(), "destination row count");
    assert_eq!(c.ncols(), b.ncols(), "destination column count");
}

fn serial<T, S>(
    c: &mut DenseMat<T>,
    op: &S,
    a: &CsrMatrix<T>,
    b: &DenseMat<T>,
    tile_rows: usize,
    tile_cols: usize,
    row_major: bool,
) where
    T: Copy,
    S: Semiring<T>,
{
    let m = a.nrows();
    let n = b.ncols();
    c.fill(op.identity());
    if row_major {
        for i0 in (0..m).step_by(tile_rows) {
            for j0 in (0..n).step_by(tile_cols) {
                tile_into(c, op, a, b, i0, (i0 + tile_rows).min(m), j0, (j0 + tile_cols).min(n));
            }
        }
    } else {
        for j0 in (0..n).step_by(tile_cols) {
            for i0 in (0..m).step_by(tile_rows) {
                tile_into(c, op, a, b, i0, (i0 + tile_rows).min(m), j0, (j0 + tile_cols).min(n));
            }
        }
    }
}

fn tile_into<T, S>(
    c: &mut DenseMat<T>,
    op: &S,
    a: &CsrMatrix<T>,
    b: &DenseMat<T>,
    i0: usize,
    i1: usize,
    j0: usize,
    j1: usize,
) where
    T: Copy,
    S: Semiring<T>,
{
    for i in i0..i1 {
        let (cols, vals) = a.row(i);
        for (&k, &a_ik) in cols.iter().zip(vals) {
            for j in j0..j1 {
                let prior = c.get(i, j);
                c.set(i, j, op.add(prior, op.mul(a_ik, b.get(k, j))));
            }
        }
    }
}

/// Parallel path: splits the destination buffer into tile-aligned chunks,
/// one task per chunk. Chunks follow the destination's own layout so each
/// task owns a contiguous slice.
#[cfg(feature = "rayon")]
fn parallel<T, S>(
    c: &mut DenseMat<T>,
    op: &S,
    a: &CsrMatrix<T>,
    b: &DenseMat<T>,
    tile_rows: usize,
    tile_cols: usize,
) -> Result<(), GmError>
where
    T: Copy + Send + Sync,
    S: Semiring<T>,
{
    use rayon::prelude::*;

    let m = a.nrows();
    let n = b.ncols();
    match c.layout() {
        Layout::RowMajor => {
            c.as_mut_slice()
                .par_chunks_mut(tile_rows * n)
                .enumerate()
                .for_each(|(t, block)| {
                    let i0 = t * tile_rows;
                    for (r, out) in block.chunks_mut(n).enumerate() {
                        row_into(out, op, a, b, i0 + r, tile_cols);
                    }
                });
        }
        Layout::ColMajor => {
            c.as_mut_slice()
                .par_chunks_mut(tile_cols * m)
                .enumerate()
                .for_each(|(t, block)| {
                    let j0 = t * tile_cols;
                    for (s, out) in block.chunks_mut(m).enumerate() {
                        col_into(out, op, a, b, j0 + s);
                    }
                });
        }
    }
    Ok(())
}

/// One output row into a contiguous slice, columns walked tile by tile.
#[cfg(feature = "rayon")]
fn row_into<T, S>(out: &mut [T], op: &S, a: &CsrMatrix<T>, b: &DenseMat<T>, i: usize, tile_cols: usize)
where
    T: Copy,
    S: Semiring<T>,
{
    out.fill(op.identity());
    let (cols, vals) = a.row(i);
    let n = out.len();
    let mut j0 = 0;
    while j0 < n {
        let j1 = (j0 + tile_cols).min(n);
        for (&k, &a_ik) in cols.iter().zip(vals) {
            for j in j0..j1 {
                out[j] = op.add(out[j], op.mul(a_ik, b.get(k, j)));
            }
        }
        j0 = j1;
    }
}

/// One output column into a contiguous slice.
#[cfg(feature = "rayon")]
fn col_into<T, S>(out: &mut [T], op: &S, a: &CsrMatrix<T>, b: &DenseMat<T>, j: usize)
where
    T: Copy,
    S: Semiring<T>,
{
    for (i, slot) in out.iter_mut().enumerate() {
        let (cols, vals) = a.row(i);
        let mut acc = op.identity();
        for (&k, &a_ik) in cols.iter().zip(vals) {
            acc = op.add(acc, op.mul(a_ik, b.get(k, j)));
        }
        *slot = acc;
    }
}

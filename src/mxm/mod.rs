//! Generalized matrix multiply (mxm): storage-driven kernel selection.
//!
//! This module is the routing layer every multiplication funnels through.
//! [`mxm`] inspects the storage of both operands, fixes the destination's
//! storage when it is still unset, and invokes the matching kernel:
//!
//! - sparse x sparse: SpGEMM, destination becomes sparse;
//! - sparse x dense: SpMM, destination becomes dense; default hints select
//!   the auto-tuned kernel, anything else the generic tiled kernel;
//! - dense x sparse and dense x dense have no kernel yet and are reported
//!   as unsupported rather than silently skipped.
//!
//! A destination that already carries a storage tag keeps it; the
//! dispatcher refuses a destination whose representation cannot hold the
//! combination's result instead of rewriting it.
//!
//! [`mxm_analyze`] / [`mxm_compute`] expose the sparse x sparse kernel's
//! two phases separately so repeated products over one sparsity structure
//! can amortize the symbolic cost. [`mxm_masked`] is the full contract with
//! an optional mask and accumulation operator layered over the same
//! decision tree as a post-processing stage.
//!
//! There is no policy for materializing a dense destination from a
//! sparse x sparse product, even a dense one; callers wanting that must
//! convert afterwards.

use crate::config::{Descriptor, KernelHints};
use crate::core::traits::{BinaryOp, MatShape, Semiring};
use crate::error::GmError;
use crate::kernel::spgemm::{self, Plan};
use crate::kernel::spmm;
use crate::matrix::{CsrMatrix, DenseMat, Matrix, Repr, Storage};

/// Multiply `A * B` under `op` into `C`.
///
/// Operands must have resolved storage; the destination's storage is fixed
/// here on first use. Dimensions are checked before any kernel runs: on any
/// error the destination is left untouched.
pub fn mxm<T, S>(
    c: &mut Matrix<T>,
    op: &S,
    a: &Matrix<T>,
    b: &Matrix<T>,
    hints: &KernelHints,
) -> Result<(), GmError>
where
    T: Copy + Default + Send + Sync,
    S: Semiring<T>,
{
    check_dims(c, a, b)?;
    match (a.repr(), b.repr()) {
        (Repr::Sparse(al), Repr::Sparse(bl)) => {
            let dst = sparse_dest(c)?;
            spgemm::multiply(dst, op, al, bl)
        }
        (Repr::Sparse(al), Repr::Dense(bl)) => {
            let dst = dense_dest(c)?;
            if hints.is_auto() {
                spmm::auto(dst, op, al, bl)
            } else {
                spmm::tiled(dst, op, al, bl, hints)
            }
        }
        (Repr::Uninitialized, _) | (_, Repr::Uninitialized) => Err(GmError::UnresolvedStorage),
        (Repr::Dense(_), _) => Err(GmError::UnsupportedCombination {
            a: a.storage(),
            b: b.storage(),
        }),
    }
}

/// Symbolic phase of a phased sparse x sparse multiply.
///
/// Fixes `C`'s storage to sparse when unset but does not populate values.
/// Only the sparse x sparse combination supports phased execution; any
/// other resolved pair fails instead of falling back to the single-phase
/// kernel.
pub fn mxm_analyze<T, S>(
    c: &mut Matrix<T>,
    op: &S,
    a: &Matrix<T>,
    b: &Matrix<T>,
) -> Result<Plan, GmError>
where
    T: Copy + Default + Send + Sync,
    S: Semiring<T>,
{
    let _ = op; // the symbolic phase never evaluates operator values
    check_dims(c, a, b)?;
    match (a.repr(), b.repr()) {
        (Repr::Sparse(al), Repr::Sparse(bl)) => {
            sparse_dest(c)?;
            spgemm::analyze(al, bl)
        }
        (Repr::Uninitialized, _) | (_, Repr::Uninitialized) => Err(GmError::UnresolvedStorage),
        _ => Err(GmError::PhasedUnsupported {
            a: a.storage(),
            b: b.storage(),
        }),
    }
}

/// Numeric phase of a phased sparse x sparse multiply.
///
/// The plan must come from [`mxm_analyze`] over these exact operands, with
/// no structural mutation since; a foreign or stale plan is rejected with
/// [`GmError::StalePlan`] and never reaches the kernel.
pub fn mxm_compute<T, S>(
    c: &mut Matrix<T>,
    plan: &Plan,
    op: &S,
    a: &Matrix<T>,
    b: &Matrix<T>,
) -> Result<(), GmError>
where
    T: Copy + Default + Send + Sync,
    S: Semiring<T>,
{
    check_dims(c, a, b)?;
    match (a.repr(), b.repr()) {
        (Repr::Sparse(al), Repr::Sparse(bl)) => {
            let dst = sparse_dest(c)?;
            spgemm::compute(dst, plan, op, al, bl)
        }
        (Repr::Uninitialized, _) | (_, Repr::Uninitialized) => Err(GmError::UnresolvedStorage),
        _ => Err(GmError::PhasedUnsupported {
            a: a.storage(),
            b: b.storage(),
        }),
    }
}

/// Full multiply contract: `C<mask> accum= A * B` with execution options.
///
/// With no mask and no accumulator this reduces exactly to [`mxm`].
/// Otherwise the raw product is computed through the same decision tree
/// into a scratch destination and merged into `C` cell-wise:
///
/// - inside the mask's pattern, the accumulator combines prior content
///   with the raw product (plain replacement when there is none);
/// - outside it, prior content is kept, or discarded when the descriptor
///   sets [`Descriptor::REPLACE`].
///
/// A mask entry gates a write when it differs from `op`'s additive
/// identity; [`Descriptor::STRUCTURE_ONLY`] downgrades this to pattern
/// membership. Transposed evaluation is part of the declared surface but
/// not served by any kernel yet, so requesting it fails.
pub fn mxm_masked<T, S>(
    c: &mut Matrix<T>,
    mask: Option<&Matrix<T>>,
    accum: Option<&dyn BinaryOp<T>>,
    op: &S,
    a: &Matrix<T>,
    b: &Matrix<T>,
    desc: &Descriptor,
    hints: &KernelHints,
) -> Result<(), GmError>
where
    T: Copy + Default + Send + Sync + PartialEq,
    S: Semiring<T>,
{
    if desc.intersects(Descriptor::TRANSPOSE_A | Descriptor::TRANSPOSE_B) {
        return Err(GmError::Unsupported("transposed operand evaluation"));
    }
    if mask.is_none() && accum.is_none() {
        return mxm(c, op, a, b, hints);
    }
    check_dims(c, a, b)?;
    if let Some(m) = mask {
        if m.nrows() != c.nrows() || m.ncols() != c.ncols() {
            return Err(GmError::DimensionMismatch(format!(
                "mask is {}x{} but the destination is {}x{}",
                m.nrows(),
                m.ncols(),
                c.nrows(),
                c.ncols()
            )));
        }
        if m.storage() == Storage::Unknown {
            return Err(GmError::UnresolvedStorage);
        }
    }
    // refuse a mismatched destination before any kernel work happens
    let natural = match (a.storage(), b.storage()) {
        (Storage::Sparse, Storage::Sparse) => Some(Storage::Sparse),
        (Storage::Sparse, Storage::Dense) => Some(Storage::Dense),
        _ => None, // the raw multiply below reports the right error
    };
    if let Some(expected) = natural {
        if c.storage() != Storage::Unknown && c.storage() != expected {
            return Err(GmError::DestinationStorage {
                expected,
                found: c.storage(),
            });
        }
    }

    let mut raw = Matrix::new(a.nrows(), b.ncols());
    mxm(&mut raw, op, a, b, hints)?;

    let structural = desc.contains(Descriptor::STRUCTURE_ONLY);
    let replace = desc.contains(Descriptor::REPLACE);
    let zero = op.identity();

    match raw.repr() {
        Repr::Sparse(raw_s) => {
            let (row_ptr, col_idx, values) =
                merge_sparse(c.sparse(), raw_s, mask, accum, structural, replace, zero);
            let dst = sparse_dest(c)?;
            dst.set_structure(row_ptr, col_idx, values);
            Ok(())
        }
        Repr::Dense(raw_d) => {
            let had_content = c.storage() == Storage::Dense;
            let dst = dense_dest(c)?;
            for i in 0..raw_d.nrows() {
                for j in 0..raw_d.ncols() {
                    let new_v = if mask_allows(mask, i, j, structural, zero) {
                        match accum {
                            Some(acc) if had_content => acc.apply(dst.get(i, j), raw_d.get(i, j)),
                            _ => raw_d.get(i, j),
                        }
                    } else if had_content && !replace {
                        dst.get(i, j)
                    } else {
                        zero
                    };
                    dst.set(i, j, new_v);
                }
            }
            Ok(())
        }
        // mxm only succeeds with a resolved destination
        Repr::Uninitialized => Err(GmError::Kernel(
            "raw product left the scratch destination unresolved".into(),
        )),
    }
}

fn check_dims<T: Copy>(c: &Matrix<T>, a: &Matrix<T>, b: &Matrix<T>) -> Result<(), GmError> {
    if a.ncols() != b.nrows() {
        return Err(GmError::DimensionMismatch(format!(
            "cannot multiply {}x{} by {}x{}",
            a.nrows(),
            a.ncols(),
            b.nrows(),
            b.ncols()
        )));
    }
    if c.nrows() != a.nrows() || c.ncols() != b.ncols() {
        return Err(GmError::DimensionMismatch(format!(
            "destination is {}x{} but the product is {}x{}",
            c.nrows(),
            c.ncols(),
            a.nrows(),
            b.ncols()
        )));
    }
    Ok(())
}

/// Resolve the destination as sparse, fixing an unset tag. A destination
/// already resolved to another representation is refused, never rewritten.
fn sparse_dest<T: Copy + Default>(c: &mut Matrix<T>) -> Result<&mut CsrMatrix<T>, GmError> {
    if c.storage() == Storage::Unknown {
        c.set_storage(Storage::Sparse);
    }
    let found = c.storage();
    match c.repr_mut() {
        Repr::Sparse(m) => Ok(m),
        _ => Err(GmError::DestinationStorage {
            expected: Storage::Sparse,
            found,
        }),
    }
}

/// Dense counterpart of [`sparse_dest`].
fn dense_dest<T: Copy + Default>(c: &mut Matrix<T>) -> Result<&mut DenseMat<T>, GmError> {
    if c.storage() == Storage::Unknown {
        c.set_storage(Storage::Dense);
    }
    let found = c.storage();
    match c.repr_mut() {
        Repr::Dense(m) => Ok(m),
        _ => Err(GmError::DestinationStorage {
            expected: Storage::Dense,
            found,
        }),
    }
}

/// Whether the mask admits a write at (i, j). `None` admits everything; an
/// unresolved mask (rejected up front) admits nothing.
fn mask_allows<T>(mask: Option<&Matrix<T>>, i: usize, j: usize, structural: bool, zero: T) -> bool
where
    T: Copy + PartialEq,
{
    let Some(m) = mask else {
        return true;
    };
    match m.repr() {
        Repr::Sparse(s) => match s.get(i, j) {
            Some(v) => structural || v != zero,
            None => false,
        },
        Repr::Dense(d) => structural || d.get(i, j) != zero,
        Repr::Uninitialized => false,
    }
}

/// Merge a sparse raw product into the destination's prior sparse content
/// under the mask, producing the new CSR triple. Row-by-row two-pointer
/// walk over the union of both patterns.
fn merge_sparse<T>(
    old: Option<&CsrMatrix<T>>,
    raw: &CsrMatrix<T>,
    mask: Option<&Matrix<T>>,
    accum: Option<&dyn BinaryOp<T>>,
    structural: bool,
    replace: bool,
    zero: T,
) -> (Vec<usize>, Vec<usize>, Vec<T>)
where
    T: Copy + PartialEq,
{
    let nrows = raw.nrows();
    let mut row_ptr = Vec::with_capacity(nrows + 1);
    row_ptr.push(0);
    let mut col_idx = Vec::new();
    let mut values = Vec::new();

    let empty: (&[usize], &[T]) = (&[], &[]);
    for i in 0..nrows {
        let (old_cols, old_vals) = old.map_or(empty, |m| m.row(i));
        let (raw_cols, raw_vals) = raw.row(i);
        let (mut p, mut q) = (0, 0);
        while p < old_cols.len() || q < raw_cols.len() {
            let oj = old_cols.get(p).copied();
            let rj = raw_cols.get(q).copied();
            let (j, old_v, raw_v) = match (oj, rj) {
                (Some(o), Some(r)) if o == r => {
                    let e = (o, Some(old_vals[p]), Some(raw_vals[q]));
                    p += 1;
                    q += 1;
                    e
                }
                (Some(o), Some(r)) if o < r => {
                    let e = (o, Some(old_vals[p]), None);
                    p += 1;
                    e
                }
                (Some(_), Some(r)) => {
                    let e = (r, None, Some(raw_vals[q]));
                    q += 1;
                    e
                }
                (Some(o), None) => {
                    let e = (o, Some(old_vals[p]), None);
                    p += 1;
                    e
                }
                (None, Some(r)) => {
                    let e = (r, None, Some(raw_vals[q]));
                    q += 1;
                    e
                }
                (None, None) => break,
            };
            let keep = if mask_allows(mask, i, j, structural, zero) {
                match (raw_v, old_v, accum) {
                    (Some(rv), Some(ov), Some(acc)) => Some(acc.apply(ov, rv)),
                    (Some(rv), _, _) => Some(rv),
                    // in-mask cell with no product entry: an accumulator
                    // keeps prior content, plain assignment drops it
                    (None, Some(ov), Some(_)) => Some(ov),
                    (None, _, None) => None,
                    (None, None, Some(_)) => None,
                }
            } else if replace {
                None
            } else {
                old_v
            };
            if let Some(v) = keep {
                col_idx.push(j);
                values.push(v);
            }
        }
        row_ptr.push(col_idx.len());
    }
    (row_ptr, col_idx, values)
}

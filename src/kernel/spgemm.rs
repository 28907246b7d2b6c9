//! Sparse-by-sparse multiply (SpGEMM), split into a symbolic phase that
//! derives the output pattern and a numeric phase that fills in values.
//!
//! The split exists so that repeated products over a fixed sparsity
//! structure pay for pattern discovery once. `analyze` produces a [`Plan`];
//! `compute` replays it. `multiply` runs both back to back for callers that
//! do not reuse structure.
//!
//! Both phases use Gustavson's row-at-a-time formulation with a dense
//! scatter workspace over the output columns.

use crate::core::traits::{MatShape, Semiring};
use crate::error::GmError;
use crate::matrix::CsrMatrix;

/// Reusable output of the symbolic phase: the product's nonzero pattern
/// plus the bookkeeping the numeric phase needs.
///
/// A plan is valid only against the operands it was analyzed from, and only
/// while their structure is unchanged. Both conditions are checked at
/// compute time; a failed check surfaces as [`GmError::StalePlan`].
#[derive(Debug)]
pub struct Plan {
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    row_flops: Vec<usize>,
    flops_total: usize,
    a_id: u64,
    a_version: u64,
    b_id: u64,
    b_version: u64,
}

impl Plan {
    /// Exact nonzero count of the product.
    pub fn nnz(&self) -> usize {
        self.col_idx.len()
    }

    /// Upper bound on the nonzero count before duplicate-column merging;
    /// equal to the total multiply work.
    pub fn nnz_upper(&self) -> usize {
        self.flops_total
    }

    /// Per-output-row multiply work estimate.
    pub fn row_work(&self) -> &[usize] {
        &self.row_flops
    }

    fn check<T>(&self, a: &CsrMatrix<T>, b: &CsrMatrix<T>) -> Result<(), GmError> {
        if self.a_id != a.id() || self.b_id != b.id() {
            return Err(GmError::StalePlan("plan was analyzed against different operands"));
        }
        if self.a_version != a.version() || self.b_version != b.version() {
            return Err(GmError::StalePlan("operand structure changed since analysis"));
        }
        Ok(())
    }
}

/// Symbolic phase: derive the pattern of `A * B` and record the work
/// estimates the numeric phase uses. Values are not touched.
pub fn analyze<T: Copy>(a: &CsrMatrix<T>, b: &CsrMatrix<T>) -> Result<Plan, GmError> {
    assert_eq!(a.ncols(), b.nrows(), "inner dimensions must agree");
    let nrows = a.nrows();
    let ncols = b.ncols();

    let mut row_ptr = Vec::with_capacity(nrows + 1);
    row_ptr.push(0);
    let mut col_idx = Vec::new();
    let mut row_flops = Vec::with_capacity(nrows);
    let mut flops_total = 0usize;

    // generation-marked scatter workspace; row index doubles as the mark
    let mut mark = vec![usize::MAX; ncols];
    let mut touched: Vec<usize> = Vec::new();

    for i in 0..nrows {
        touched.clear();
        let mut flops = 0usize;
        let (a_cols, _) = a.row(i);
        for &k in a_cols {
            let (b_cols, _) = b.row(k);
            flops += b_cols.len();
            for &j in b_cols {
                if mark[j] != i {
                    mark[j] = i;
                    touched.push(j);
                }
            }
        }
        touched.sort_unstable();
        col_idx.extend_from_slice(&touched);
        row_ptr.push(col_idx.len());
        row_flops.push(flops);
        flops_total += flops;
    }

    Ok(Plan {
        row_ptr,
        col_idx,
        row_flops,
        flops_total,
        a_id: a.id(),
        a_version: a.version(),
        b_id: b.id(),
        b_version: b.version(),
    })
}

/// Numeric phase: fill `C`'s values along the plan's pattern.
///
/// The plan must have been produced by [`analyze`] against these exact
/// operands (by identity, not merely by equal pattern), with no structural
/// mutation in between.
pub fn compute<T, S>(
    c: &mut CsrMatrix<T>,
    plan: &Plan,
    op: &S,
    a: &CsrMatrix<T>,
    b: &CsrMatrix<T>,
) -> Result<(), GmError>
where
    T: Copy,
    S: Semiring<T>,
{
    plan.check(a, b)?;
    assert_eq!(a.ncols(), b.nrows(), "inner dimensions must agree");
    assert_eq!(c.nrows(), a.nrows(), "destination row count");
    assert_eq!(c.ncols(), b.ncols(), "destination column count");

    let nrows = a.nrows();
    let mut values = vec![op.identity(); plan.col_idx.len()];
    let mut acc = vec![op.identity(); b.ncols()];

    for i in 0..nrows {
        let span = plan.row_ptr[i]..plan.row_ptr[i + 1];
        let cols = &plan.col_idx[span.clone()];
        if cols.is_empty() {
            continue;
        }
        for &j in cols {
            acc[j] = op.identity();
        }
        let (a_cols, a_vals) = a.row(i);
        for (&k, &a_ik) in a_cols.iter().zip(a_vals) {
            let (b_cols, b_vals) = b.row(k);
            for (&j, &b_kj) in b_cols.iter().zip(b_vals) {
                acc[j] = op.add(acc[j], op.mul(a_ik, b_kj));
            }
        }
        for (slot, &j) in values[span].iter_mut().zip(cols) {
            *slot = acc[j];
        }
    }

    c.set_structure(plan.row_ptr.clone(), plan.col_idx.clone(), values);
    Ok(())
}

/// Full multiply: symbolic analysis and numeric compute in one call.
pub fn multiply<T, S>(
    c: &mut CsrMatrix<T>,
    op: &S,
    a: &CsrMatrix<T>,
    b: &CsrMatrix<T>,
) -> Result<(), GmError>
where
    T: Copy,
    S: Semiring<T>,
{
    let plan = analyze(a, b)?;
    compute(c, &plan, op, a, b)
}

//! Tests for the full multiply contract: mask restriction, accumulation
//! into prior content, and the REPLACE / STRUCTURE_ONLY descriptor options.

use approx::assert_abs_diff_eq;
use graphmul::core::ops::{Plus, PlusTimes};
use graphmul::{
    mxm, mxm_masked, Descriptor, GmError, KernelHints, Layout, Matrix, Storage,
};

fn sparse_identity(n: usize) -> Matrix<f64> {
    let row_ptr = (0..=n).collect();
    let col_idx = (0..n).collect();
    Matrix::from_csr(n, n, row_ptr, col_idx, vec![1.0; n])
}

fn dense2x2() -> Matrix<f64> {
    Matrix::from_dense(2, 2, Layout::RowMajor, vec![1.0, 2.0, 3.0, 4.0])
}

/// Without a mask or accumulator the full contract is the plain multiply.
#[test]
fn reduces_to_plain_mxm() {
    let a = sparse_identity(2);
    let b = dense2x2();
    let op = PlusTimes::new();

    let mut plain = Matrix::new(2, 2);
    mxm(&mut plain, &op, &a, &b, &KernelHints::new()).unwrap();

    let mut full = Matrix::new(2, 2);
    mxm_masked(
        &mut full,
        None,
        None,
        &op,
        &a,
        &b,
        &Descriptor::default(),
        &KernelHints::new(),
    )
    .unwrap();

    let (p, f) = (plain.dense().unwrap(), full.dense().unwrap());
    for i in 0..2 {
        for j in 0..2 {
            assert_abs_diff_eq!(p.get(i, j), f.get(i, j), epsilon = 1e-12);
        }
    }
}

/// A mask restricts which destination cells the product reaches; cells
/// outside it keep their prior content.
#[test]
fn mask_restricts_dense_writes() {
    let a = sparse_identity(2);
    let b = dense2x2();
    let op = PlusTimes::new();
    // mask admits only the first row
    let mask = Matrix::from_dense(2, 2, Layout::RowMajor, vec![1.0, 1.0, 0.0, 0.0]);

    let mut c = Matrix::from_dense(2, 2, Layout::RowMajor, vec![9.0; 4]);
    mxm_masked(
        &mut c,
        Some(&mask),
        None,
        &op,
        &a,
        &b,
        &Descriptor::default(),
        &KernelHints::new(),
    )
    .unwrap();
    let d = c.dense().unwrap();
    assert_abs_diff_eq!(d.get(0, 0), 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(d.get(0, 1), 2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(d.get(1, 0), 9.0, epsilon = 1e-12);
    assert_abs_diff_eq!(d.get(1, 1), 9.0, epsilon = 1e-12);
}

/// REPLACE discards prior content outside the mask instead of keeping it.
#[test]
fn replace_clears_outside_mask() {
    let a = sparse_identity(2);
    let b = dense2x2();
    let op = PlusTimes::new();
    let mask = Matrix::from_dense(2, 2, Layout::RowMajor, vec![1.0, 1.0, 0.0, 0.0]);

    let mut c = Matrix::from_dense(2, 2, Layout::RowMajor, vec![9.0; 4]);
    mxm_masked(
        &mut c,
        Some(&mask),
        None,
        &op,
        &a,
        &b,
        &Descriptor::REPLACE,
        &KernelHints::new(),
    )
    .unwrap();
    let d = c.dense().unwrap();
    assert_abs_diff_eq!(d.get(0, 0), 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(d.get(1, 0), 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(d.get(1, 1), 0.0, epsilon = 1e-12);
}

/// The accumulator combines the raw product with prior destination content
/// cell-wise.
#[test]
fn accumulator_combines_with_prior() {
    let a = sparse_identity(2);
    let b = dense2x2();
    let op = PlusTimes::new();
    let acc = Plus::new();

    let mut c = Matrix::from_dense(2, 2, Layout::RowMajor, vec![10.0; 4]);
    mxm_masked(
        &mut c,
        None,
        Some(&acc),
        &op,
        &a,
        &b,
        &Descriptor::default(),
        &KernelHints::new(),
    )
    .unwrap();
    let d = c.dense().unwrap();
    assert_abs_diff_eq!(d.get(0, 0), 11.0, epsilon = 1e-12);
    assert_abs_diff_eq!(d.get(0, 1), 12.0, epsilon = 1e-12);
    assert_abs_diff_eq!(d.get(1, 0), 13.0, epsilon = 1e-12);
    assert_abs_diff_eq!(d.get(1, 1), 14.0, epsilon = 1e-12);
}

/// Masked, accumulated sparse x sparse: the merge keeps prior entries
/// outside the mask and accumulates inside it.
#[test]
fn sparse_masked_accumulation() {
    // A = B = 2x2 identity; product = identity
    let a = sparse_identity(2);
    let b = sparse_identity(2);
    let op = PlusTimes::new();
    let acc = Plus::new();
    // prior C has entries at (0,0) and (1,1)
    let mut c = Matrix::from_csr(2, 2, vec![0, 1, 2], vec![0, 1], vec![5.0, 7.0]);
    // mask admits only (0,0)
    let mask = Matrix::from_csr(2, 2, vec![0, 1, 1], vec![0], vec![1.0]);

    mxm_masked(
        &mut c,
        Some(&mask),
        Some(&acc),
        &op,
        &a,
        &b,
        &Descriptor::default(),
        &KernelHints::new(),
    )
    .unwrap();
    let s = c.sparse().unwrap();
    assert_eq!(s.nnz(), 2);
    assert_eq!(s.get(0, 0), Some(6.0)); // 5 + 1
    assert_eq!(s.get(1, 1), Some(7.0)); // outside mask, kept

    // with REPLACE the out-of-mask entry is dropped
    let mut c = Matrix::from_csr(2, 2, vec![0, 1, 2], vec![0, 1], vec![5.0, 7.0]);
    mxm_masked(
        &mut c,
        Some(&mask),
        Some(&acc),
        &op,
        &a,
        &b,
        &Descriptor::REPLACE,
        &KernelHints::new(),
    )
    .unwrap();
    let s = c.sparse().unwrap();
    assert_eq!(s.nnz(), 1);
    assert_eq!(s.get(0, 0), Some(6.0));
    assert_eq!(s.get(1, 1), None);
}

/// A stored zero in the mask admits nothing by default but everything it
/// covers under STRUCTURE_ONLY.
#[test]
fn structural_mask_counts_stored_zeros() {
    let a = sparse_identity(2);
    let b = sparse_identity(2);
    let op = PlusTimes::new();
    // mask stores an explicit 0.0 at (0,0)
    let mask = Matrix::from_csr(2, 2, vec![0, 1, 1], vec![0], vec![0.0]);

    let mut c = Matrix::new(2, 2);
    mxm_masked(
        &mut c,
        Some(&mask),
        None,
        &op,
        &a,
        &b,
        &Descriptor::default(),
        &KernelHints::new(),
    )
    .unwrap();
    assert_eq!(c.sparse().unwrap().nnz(), 0);

    let mut c = Matrix::new(2, 2);
    mxm_masked(
        &mut c,
        Some(&mask),
        None,
        &op,
        &a,
        &b,
        &Descriptor::STRUCTURE_ONLY,
        &KernelHints::new(),
    )
    .unwrap();
    let s = c.sparse().unwrap();
    assert_eq!(s.nnz(), 1);
    assert_eq!(s.get(0, 0), Some(1.0));
}

/// Transposed evaluation is declared but unserved; it must fail loudly.
#[test]
fn transpose_options_are_rejected() {
    let a = sparse_identity(2);
    let b = sparse_identity(2);
    let mut c = Matrix::new(2, 2);
    let err = mxm_masked(
        &mut c,
        None,
        None,
        &PlusTimes::new(),
        &a,
        &b,
        &Descriptor::TRANSPOSE_A,
        &KernelHints::new(),
    )
    .unwrap_err();
    assert!(matches!(err, GmError::Unsupported(_)));
    assert_eq!(c.storage(), Storage::Unknown);
}

/// The unsupported combinations fail identically through the full
/// contract.
#[test]
fn masked_dense_lhs_is_unsupported() {
    let d = dense2x2();
    let s = sparse_identity(2);
    let mask = Matrix::from_dense(2, 2, Layout::RowMajor, vec![1.0; 4]);
    let mut c = Matrix::new(2, 2);
    let err = mxm_masked(
        &mut c,
        Some(&mask),
        None,
        &PlusTimes::new(),
        &d,
        &s,
        &Descriptor::default(),
        &KernelHints::new(),
    )
    .unwrap_err();
    assert!(matches!(err, GmError::UnsupportedCombination { .. }));
    assert_eq!(c.storage(), Storage::Unknown);
}

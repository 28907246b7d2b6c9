use criterion::{black_box, criterion_group, criterion_main, Criterion};
use graphmul::core::ops::PlusTimes;
use graphmul::{mxm, mxm_analyze, mxm_compute, KernelHints, Layout, Matrix};

fn banded_sparse(n: usize, band: usize) -> Matrix<f64> {
    let mut row_ptr = vec![0usize];
    let mut col_idx = Vec::new();
    let mut values = Vec::new();
    for i in 0..n {
        for j in i.saturating_sub(band)..(i + band + 1).min(n) {
            col_idx.push(j);
            values.push(((i + j) as f64).sin());
        }
        row_ptr.push(col_idx.len());
    }
    Matrix::from_csr(n, n, row_ptr, col_idx, values)
}

fn bench_spmm_vs_faer(c: &mut Criterion) {
    let n = 200;
    let a = banded_sparse(n, 4);
    let b_data: Vec<f64> = (0..n * n).map(|i| (i as f64).cos()).collect();
    let b = Matrix::from_dense(n, n, Layout::ColMajor, b_data.clone());
    let op = PlusTimes::new();

    c.bench_function("graphmul spmm auto", |ben| {
        ben.iter(|| {
            let mut out = Matrix::new(n, n);
            mxm(black_box(&mut out), &op, black_box(&a), black_box(&b), &KernelHints::new())
                .unwrap();
        })
    });

    c.bench_function("faer dense matmul", |ben| {
        let a_dense =
            faer::Mat::from_fn(n, n, |i, j| a.sparse().unwrap().get(i, j).unwrap_or(0.0));
        let b_dense = faer::Mat::from_fn(n, n, |i, j| b_data[j * n + i]);
        ben.iter(|| {
            let _c = black_box(&a_dense) * black_box(&b_dense);
        })
    });
}

fn bench_phased_amortization(c: &mut Criterion) {
    let n = 300;
    let a = banded_sparse(n, 3);
    let b = banded_sparse(n, 3);
    let op = PlusTimes::new();

    c.bench_function("spgemm single-phase", |ben| {
        ben.iter(|| {
            let mut out = Matrix::new(n, n);
            mxm(black_box(&mut out), &op, black_box(&a), black_box(&b), &KernelHints::new())
                .unwrap();
        })
    });

    c.bench_function("spgemm compute over reused plan", |ben| {
        let mut out = Matrix::new(n, n);
        let plan = mxm_analyze(&mut out, &op, &a, &b).unwrap();
        ben.iter(|| {
            mxm_compute(black_box(&mut out), &plan, &op, black_box(&a), black_box(&b)).unwrap();
        })
    });
}

criterion_group!(benches, bench_spmm_vs_faer, bench_phased_amortization);
criterion_main!(benches);

//! Benchmarks for the Conjugate Gradient (CG) solver.
//!
//! Measures scaling with problem size on sparse SPD systems, the cost of
//! dense versus CSR storage for the same matrix, and the provider's random
//! masked matrices.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use cg_solver::cg::ConjugateGradientSolver;
use cg_solver::provider::{MaskPattern, MatrixProvider};
use cg_solver::types::CsrMatrix;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Sparse SPD CSR matrix: symmetric off-diagonals in `[-0.3, 0.3)` kept with
/// probability `density`, diagonal set to the row's absolute sum plus one.
fn spd_csr_matrix(n: usize, density: f64, seed: u64) -> CsrMatrix<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut diagonal = vec![1.0f64; n];
    let mut entries = Vec::new();

    for i in 0..n {
        for j in (i + 1)..n {
            if rng.gen_bool(density) {
                let v: f64 = rng.gen_range(-0.3..0.3);
                entries.extend([(i, j, v), (j, i, v)]);
                diagonal[i] += v.abs();
                diagonal[j] += v.abs();
            }
        }
    }
    entries.extend(diagonal.into_iter().enumerate().map(|(i, d)| (i, i, d)));

    CsrMatrix::<f64>::from_coo(n, n, entries)
}

/// Random vector with deterministic seed.
fn random_vector(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

// ---------------------------------------------------------------------------
// Benchmark: CG scaling with problem size
// ---------------------------------------------------------------------------

fn cg_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("cg_scaling");
    group.warm_up_time(Duration::from_secs(3));
    let solver = ConjugateGradientSolver::new(1e-8, 5000);

    for &n in &[100, 1000, 10_000] {
        let density = if n <= 1000 { 0.02 } else { 0.005 };
        let matrix = spd_csr_matrix(n, density, 42);
        let rhs = random_vector(n, 43);
        let x0 = vec![0.0; n];

        let sample_count = if n >= 10_000 { 20 } else { 100 };
        group.sample_size(sample_count);
        group.throughput(Throughput::Elements(matrix.nnz() as u64));

        group.bench_with_input(BenchmarkId::new("n", n), &n, |b, _| {
            b.iter(|| solver.solve(black_box(&matrix), black_box(&rhs), &x0));
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: dense vs CSR storage of the same system
// ---------------------------------------------------------------------------

fn cg_dense_vs_csr(c: &mut Criterion) {
    let mut group = c.benchmark_group("cg_dense_vs_csr");
    group.warm_up_time(Duration::from_secs(3));
    group.sample_size(50);
    let solver = ConjugateGradientSolver::new(1e-8, 5000);

    for &n in &[100, 400] {
        let csr = MatrixProvider::tridiagonal_csr(n);
        let dense = MatrixProvider::tridiagonal(n);
        let rhs = random_vector(n, 7);
        let x0 = vec![0.0; n];

        group.bench_with_input(BenchmarkId::new("csr", n), &n, |b, _| {
            b.iter(|| solver.solve(black_box(&csr), black_box(&rhs), &x0));
        });
        group.bench_with_input(BenchmarkId::new("dense", n), &n, |b, _| {
            b.iter(|| solver.solve(black_box(&dense), black_box(&rhs), &x0));
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: provider random SPD matrices per mask
// ---------------------------------------------------------------------------

fn cg_masked_random(c: &mut Criterion) {
    let mut group = c.benchmark_group("cg_masked_random");
    group.sample_size(30);
    let solver = ConjugateGradientSolver::new(1e-8, 5000);
    let n = 300;

    for pattern in [MaskPattern::Quadratic, MaskPattern::arrow()] {
        let mut provider = MatrixProvider::new(42);
        let Ok(matrix) = provider.random_spd_csr(n, pattern) else {
            continue;
        };
        let rhs = vec![1.0; n];
        let x0 = vec![0.0; n];

        group.throughput(Throughput::Elements(matrix.nnz() as u64));
        group.bench_with_input(BenchmarkId::new(pattern.to_string(), n), &n, |b, _| {
            b.iter(|| solver.solve(black_box(&matrix), black_box(&rhs), &x0));
        });
    }
    group.finish();
}

criterion_group!(cg, cg_scaling, cg_dense_vs_csr, cg_masked_random);
criterion_main!(cg);

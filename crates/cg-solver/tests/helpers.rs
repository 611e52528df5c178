//! Shared test helpers for the cg-solver integration test suite.
//!
//! Provides deterministic random matrix generators, a dense reference solver,
//! and floating-point comparison utilities used across all test modules.

#![allow(dead_code)]

use cg_solver::types::CsrMatrix;

// ---------------------------------------------------------------------------
// Random number generator (simple LCG for deterministic reproducibility)
// ---------------------------------------------------------------------------

/// A minimal linear congruential generator for deterministic test data.
///
/// Independent of `rand`, so expected values in these tests do not move when
/// the provider's generator changes.
pub struct Lcg {
    state: u64,
}

impl Lcg {
    /// Create a new LCG with the given seed.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generate the next u64 value.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.state
    }

    /// Generate a uniform f64 in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Generate a uniform f64 in [lo, hi).
    pub fn next_f64_range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

// ---------------------------------------------------------------------------
// Matrix generators
// ---------------------------------------------------------------------------

/// Random SPD matrix `A = MᵀM + I`.
///
/// `M` is symmetric with a full diagonal and each upper entry kept with
/// probability `density`; the identity shift keeps the smallest eigenvalue
/// at least 1.
pub fn random_spd_csr(n: usize, density: f64, seed: u64) -> CsrMatrix<f64> {
    let mut rng = Lcg::new(seed);
    let mut m = vec![vec![0.0f64; n]; n];

    for i in 0..n {
        m[i][i] = rng.next_f64_range(-1.0, 1.0);
        for j in (i + 1)..n {
            if rng.next_f64() < density {
                let val = rng.next_f64_range(-1.0, 1.0);
                m[i][j] = val;
                m[j][i] = val;
            }
        }
    }

    let mut entries: Vec<(usize, usize, f64)> = Vec::new();
    for i in 0..n {
        for j in 0..n {
            let mut sum = if i == j { 1.0 } else { 0.0 };
            for k in 0..n {
                sum += m[k][i] * m[k][j];
            }
            if sum.abs() > 1e-15 {
                entries.push((i, j, sum));
            }
        }
    }

    CsrMatrix::<f64>::from_coo(n, n, entries)
}

/// 1-D Poisson matrix: `2` on the diagonal, `-1` beside it.
///
/// Condition number grows like `n²`, which makes it a useful slow case.
pub fn poisson_1d_csr(n: usize) -> CsrMatrix<f64> {
    let mut entries = Vec::with_capacity(3 * n);
    for i in 0..n {
        if i > 0 {
            entries.push((i, i - 1, -1.0));
        }
        entries.push((i, i, 2.0));
        if i + 1 < n {
            entries.push((i, i + 1, -1.0));
        }
    }
    CsrMatrix::<f64>::from_coo(n, n, entries)
}

/// Generate a deterministic random vector of length `n`.
pub fn random_vector(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = Lcg::new(seed);
    (0..n).map(|_| rng.next_f64_range(-1.0, 1.0)).collect()
}

// ---------------------------------------------------------------------------
// Dense reference solver
// ---------------------------------------------------------------------------

/// Solve `Ax = b` for SPD `A` with a dense Cholesky factorisation `A = LLᵀ`.
///
/// O(n^3); only meant for the small systems used to check the iterative
/// solver.
///
/// # Panics
///
/// Panics if a pivot is not positive (i.e. `A` is not SPD) or dimensions are
/// inconsistent.
pub fn cholesky_solve(matrix: &CsrMatrix<f64>, rhs: &[f64]) -> Vec<f64> {
    let n = matrix.rows;
    assert_eq!(n, matrix.cols, "cholesky_solve requires a square matrix");
    assert_eq!(rhs.len(), n, "rhs length must match matrix dimension");

    let a = matrix.to_dense();
    let mut l = vec![0.0f64; n * n];

    for j in 0..n {
        let mut pivot = a.get(j, j);
        for k in 0..j {
            pivot -= l[j * n + k] * l[j * n + k];
        }
        assert!(pivot > 0.0, "non-positive pivot {pivot} at column {j}: matrix is not SPD");
        let d = pivot.sqrt();
        l[j * n + j] = d;

        for i in (j + 1)..n {
            let mut v = a.get(i, j);
            for k in 0..j {
                v -= l[i * n + k] * l[j * n + k];
            }
            l[i * n + j] = v / d;
        }
    }

    // L y = b
    let mut y = rhs.to_vec();
    for i in 0..n {
        for k in 0..i {
            y[i] -= l[i * n + k] * y[k];
        }
        y[i] /= l[i * n + i];
    }

    // Lᵀ x = y
    let mut x = y;
    for i in (0..n).rev() {
        for k in (i + 1)..n {
            x[i] -= l[k * n + i] * x[k];
        }
        x[i] /= l[i * n + i];
    }

    x
}

// ---------------------------------------------------------------------------
// Floating-point comparison utilities
// ---------------------------------------------------------------------------

/// Compute the L2 norm of a vector.
pub fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|&x| x * x).sum::<f64>().sqrt()
}

/// Compute the relative error ||approx - exact|| / ||exact||.
///
/// Returns absolute error if the exact solution has zero norm.
pub fn relative_error(approx: &[f64], exact: &[f64]) -> f64 {
    assert_eq!(approx.len(), exact.len(), "vectors must have same length");
    let error = approx
        .iter()
        .zip(exact)
        .map(|(&a, &e)| (a - e) * (a - e))
        .sum::<f64>()
        .sqrt();
    let exact_norm = l2_norm(exact);
    if exact_norm > 1e-15 {
        error / exact_norm
    } else {
        error
    }
}

/// Residual `b - A*x`.
pub fn compute_residual(matrix: &CsrMatrix<f64>, x: &[f64], rhs: &[f64]) -> Vec<f64> {
    let mut r = vec![0.0f64; matrix.rows];
    matrix.spmv(x, &mut r);
    for (ri, bi) in r.iter_mut().zip(rhs) {
        *ri = bi - *ri;
    }
    r
}

//! Test matrix presets.
//!
//! [`MatrixProvider`] produces the symmetric positive-definite systems used by
//! the CLI, the benchmarks and the integration tests:
//!
//! - the identity,
//! - a tridiagonal matrix with `10` on the diagonal and `1` beside it,
//! - a random SPD matrix with a structured sparsity mask.
//!
//! Every preset comes in a dense ([`DenseMatrix`]) and a CSR
//! ([`CsrMatrix`]) flavour. Random matrices are drawn from a seeded
//! [`StdRng`], so the same seed always yields the same matrix.

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::ValidationError;
use crate::types::{CsrMatrix, DenseMatrix};

/// Default density of the arrow mask.
pub const DEFAULT_ARROW_DENSITY: f64 = 0.2;

// ---------------------------------------------------------------------------
// MaskPattern
// ---------------------------------------------------------------------------

/// Sparsity pattern applied to random SPD matrices.
///
/// Both patterns are symmetric and always keep the main diagonal.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MaskPattern {
    /// Half-index couplings, a second block diagonal, extra bands every 100
    /// rows and nested split blocks in the lower-right corner.
    #[default]
    Quadratic,
    /// Random "arrow" columns: bands leading into the diagonal plus a few
    /// scattered short bands per anchor.
    Arrow {
        /// Fraction of rows used as anchors, in `(0, 1]`.
        density: f64,
    },
}

impl MaskPattern {
    /// Arrow pattern with the default density.
    pub fn arrow() -> Self {
        Self::Arrow {
            density: DEFAULT_ARROW_DENSITY,
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        match *self {
            Self::Quadratic => Ok(()),
            Self::Arrow { density } if density > 0.0 && density <= 1.0 => Ok(()),
            Self::Arrow { density } => Err(ValidationError::ParameterOutOfRange {
                name: "density".into(),
                value: density.to_string(),
                expected: "(0, 1]".into(),
            }),
        }
    }
}

impl fmt::Display for MaskPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quadratic => f.write_str("quadratic"),
            Self::Arrow { .. } => f.write_str("arrow"),
        }
    }
}

impl FromStr for MaskPattern {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quadratic" => Ok(Self::Quadratic),
            "arrow" => Ok(Self::arrow()),
            other => Err(ValidationError::ParameterOutOfRange {
                name: "mask".into(),
                value: other.to_string(),
                expected: "one of: quadratic, arrow".into(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// MatrixProvider
// ---------------------------------------------------------------------------

/// Source of test systems.
///
/// ```
/// use cg_solver::provider::{MaskPattern, MatrixProvider};
///
/// let mut provider = MatrixProvider::new(7);
/// let a = provider.random_spd(16, MaskPattern::Quadratic).unwrap();
/// assert!(a.is_symmetric(0.0));
/// assert_eq!(MatrixProvider::tridiagonal(4).get(1, 2), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct MatrixProvider {
    rng: StdRng,
}

impl MatrixProvider {
    /// Provider whose random matrices are determined by `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// `size x size` identity.
    pub fn diagonal(size: usize) -> DenseMatrix {
        DenseMatrix::identity(size)
    }

    /// [`diagonal`](Self::diagonal) in CSR form.
    pub fn diagonal_csr(size: usize) -> CsrMatrix<f64> {
        CsrMatrix::<f64>::identity(size)
    }

    /// Tridiagonal matrix: `10` on the diagonal, `1` on both neighbours.
    pub fn tridiagonal(size: usize) -> DenseMatrix {
        let mut m = DenseMatrix::from_diagonal(&vec![10.0; size]);
        for i in 1..size {
            m[(i, i - 1)] = 1.0;
            m[(i - 1, i)] = 1.0;
        }
        m
    }

    /// [`tridiagonal`](Self::tridiagonal) in CSR form.
    pub fn tridiagonal_csr(size: usize) -> CsrMatrix<f64> {
        let mut entries = Vec::with_capacity(3 * size);
        for i in 0..size {
            if i > 0 {
                entries.push((i, i - 1, 1.0));
            }
            entries.push((i, i, 10.0));
            if i + 1 < size {
                entries.push((i, i + 1, 1.0));
            }
        }
        CsrMatrix::<f64>::from_coo(size, size, entries)
    }

    /// Random SPD matrix restricted to `pattern`.
    ///
    /// Draws `Q` with entries uniform in `[0, 1)`, forms the Gram matrix
    /// `QᵀQ`, divides by `ln(size²)` to keep entries from growing with the
    /// dimension, and zeroes everything outside the mask. Masking can destroy
    /// definiteness, so each diagonal entry is then raised by the absolute
    /// sum of its row's off-diagonal entries. The result is symmetric and
    /// strictly diagonally dominant with a positive diagonal, hence SPD.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ParameterOutOfRange`] for an arrow density
    /// outside `(0, 1]`.
    pub fn random_spd(&mut self, size: usize, pattern: MaskPattern) -> Result<DenseMatrix, ValidationError> {
        pattern.validate()?;

        let data: Vec<f64> = (0..size * size).map(|_| self.rng.gen::<f64>()).collect();
        let q = DenseMatrix::from_row_major(size, size, data)?;
        let mut gram = q.transpose().matmul(&q)?;

        let scale = if size < 2 {
            1.0
        } else {
            ((size * size) as f64).ln()
        };
        gram.scale(1.0 / scale);

        let mask = match pattern {
            MaskPattern::Quadratic => quadratic_mask(size),
            MaskPattern::Arrow { density } => arrow_mask(&mut self.rng, size, density),
        };
        let mut a = gram.hadamard(&mask)?;
        make_diagonally_dominant(&mut a);

        debug!(size, %pattern, nnz = a.nnz(), "generated random SPD matrix");
        Ok(a)
    }

    /// [`random_spd`](Self::random_spd) in CSR form.
    ///
    /// # Errors
    ///
    /// Same as [`random_spd`](Self::random_spd).
    pub fn random_spd_csr(
        &mut self,
        size: usize,
        pattern: MaskPattern,
    ) -> Result<CsrMatrix<f64>, ValidationError> {
        self.random_spd(size, pattern).map(|m| CsrMatrix::from_dense(&m))
    }

    /// Vector of `size` entries uniform in `[-1, 1)`, drawn from this
    /// provider's generator.
    pub fn random_vector(&mut self, size: usize) -> Vec<f64> {
        (0..size).map(|_| self.rng.gen_range(-1.0..1.0)).collect()
    }
}

/// Raise every diagonal entry by the absolute sum of the row's off-diagonal
/// entries. Keeps symmetry since only the diagonal changes.
fn make_diagonally_dominant(a: &mut DenseMatrix) {
    let n = a.rows();
    for i in 0..n {
        let off: f64 = a
            .row(i)
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .map(|(_, v)| v.abs())
            .sum();
        let d = a[(i, i)] + off;
        // A zero column of Q leaves a zero diagonal; keep the row invertible.
        a[(i, i)] = if d > 0.0 { d } else { 1.0 };
    }
}

/// Mark `(i, j)` and `(j, i)`.
#[inline]
fn mark(mask: &mut DenseMatrix, i: usize, j: usize) {
    mask[(i, j)] = 1.0;
    mask[(j, i)] = 1.0;
}

/// `size >> shift`, zero once the shift reaches the word width.
#[inline]
fn shr_or_zero(size: usize, shift: usize) -> usize {
    u32::try_from(shift)
        .ok()
        .and_then(|s| size.checked_shr(s))
        .unwrap_or(0)
}

/// Quadratic sparsity mask.
///
/// - the diagonal,
/// - `(i, ceil(i/2))` for every `i`,
/// - `(size/2 + i, i)` for `i < size/2`,
/// - `size/100` extra bands on each side of the diagonal,
/// - for `k < sqrt(size)`, row and column `s = size - size/2^(k+1)` filled
///   from `s` to the end.
///
/// Every entry is mirrored, so the mask is symmetric.
pub fn quadratic_mask(size: usize) -> DenseMatrix {
    let mut mask = DenseMatrix::zeros(size, size);
    let half = size / 2;
    let extra_bands = size / 100;

    for i in 0..size {
        mask[(i, i)] = 1.0;
        mark(&mut mask, i, i.div_ceil(2));
        if i < half {
            mark(&mut mask, half + i, i);
        }
        for add in 1..=extra_bands {
            if i + add < size {
                mark(&mut mask, i, i + add);
            }
        }
    }

    let splitters = (size as f64).sqrt() as usize;
    for k in 0..splitters {
        let split = size - shr_or_zero(size, k + 1);
        for i in split..size {
            mark(&mut mask, i, split);
        }
    }

    mask
}

/// Arrow sparsity mask drawn from `rng`.
///
/// Picks `floor(size * density)` anchor indices in `[0, size - 1)` (with
/// replacement). Each anchor `a` gets a band of random length in
/// `[1, sqrt(a) + 1]` directly above and left of `(a, a)`, plus up to
/// `sqrt(a)` scattered bands of length in `[1, sqrt(size * density)]` that
/// end at a random row in `[1, a]`. A band that would start above row 0 is
/// dropped rather than clipped.
pub fn arrow_mask<R: Rng>(rng: &mut R, size: usize, density: f64) -> DenseMatrix {
    let mut mask = DenseMatrix::zeros(size, size);
    for i in 0..size {
        mask[(i, i)] = 1.0;
    }
    if size < 2 {
        return mask;
    }

    let anchors = (size as f64 * density).floor() as usize;
    let scatter_max = ((size as f64 * density).sqrt() as usize).max(1);

    for _ in 0..anchors {
        let anchor = rng.gen_range(0..size - 1);
        let root = (anchor as f64).sqrt() as usize;

        let length = rng.gen_range(1..=root + 1);
        mark_band(&mut mask, anchor, anchor, length);

        let how_many = rng.gen_range(1..=root + 1);
        if anchor == 0 {
            continue;
        }
        for _ in 1..how_many {
            let length = rng.gen_range(1..=scatter_max);
            let end = rng.gen_range(1..=anchor);
            mark_band(&mut mask, anchor, end, length);
        }
    }

    mask
}

/// Mark rows `end - length..end` of column `anchor` (and the mirrored row).
/// Does nothing when `length > end`.
fn mark_band(mask: &mut DenseMatrix, anchor: usize, end: usize, length: usize) {
    let Some(start) = end.checked_sub(length) else {
        return;
    };
    for j in start..end {
        mark(mask, j, anchor);
    }
}

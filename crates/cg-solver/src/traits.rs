//! Operator abstraction consumed by the solver.
//!
//! The CG recurrence touches `A` only through matrix-vector products, so the
//! solver is generic over [`LinearOperator`] and never sees the storage
//! format. SPD matrices are self-adjoint, so no transpose product is needed.

use crate::error::ValidationError;
use crate::types::{CsrMatrix, DenseMatrix};
use crate::validation;

/// A linear map `y = A x` on `f64` vectors.
///
/// Implementations must be pure: `apply` may not mutate the operator and must
/// fully overwrite `y`. Internal data parallelism is allowed; the solver's
/// control flow stays sequential.
pub trait LinearOperator {
    /// Number of rows of `A` (length of `y`).
    fn nrows(&self) -> usize;

    /// Number of columns of `A` (length of `x`).
    fn ncols(&self) -> usize;

    /// Compute `y = A * x`.
    ///
    /// Callers guarantee `x.len() == ncols()` and `y.len() == nrows()`.
    fn apply(&self, x: &[f64], y: &mut [f64]);

    /// Allocating variant of [`apply`](Self::apply).
    fn multiply(&self, x: &[f64]) -> Vec<f64> {
        let mut y = vec![0.0; self.nrows()];
        self.apply(x, &mut y);
        y
    }

    /// `true` if `nrows() == ncols()`.
    fn is_square(&self) -> bool {
        self.nrows() == self.ncols()
    }

    /// Check that the operator's storage is well formed, so that
    /// [`apply`](Self::apply) cannot index out of bounds.
    ///
    /// Operators whose invariants are enforced at construction keep the
    /// default. Types with public storage override it.
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

impl<A: LinearOperator + ?Sized> LinearOperator for &A {
    #[inline]
    fn nrows(&self) -> usize {
        (**self).nrows()
    }

    #[inline]
    fn ncols(&self) -> usize {
        (**self).ncols()
    }

    #[inline]
    fn apply(&self, x: &[f64], y: &mut [f64]) {
        (**self).apply(x, y)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        (**self).validate()
    }
}

impl LinearOperator for CsrMatrix<f64> {
    #[inline]
    fn nrows(&self) -> usize {
        self.rows
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.cols
    }

    fn apply(&self, x: &[f64], y: &mut [f64]) {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            y[..self.rows]
                .par_iter_mut()
                .enumerate()
                .for_each(|(i, yi)| *yi = self.row_dot(i, x));
        }

        #[cfg(not(feature = "parallel"))]
        {
            self.spmv(x, y);
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_csr_matrix(self)
    }
}

impl LinearOperator for DenseMatrix {
    #[inline]
    fn nrows(&self) -> usize {
        self.rows()
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.cols()
    }

    fn apply(&self, x: &[f64], y: &mut [f64]) {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            y.par_iter_mut()
                .enumerate()
                .for_each(|(i, yi)| *yi = crate::vector::dot(self.row(i), x));
        }

        #[cfg(not(feature = "parallel"))]
        {
            self.matvec(x, y);
        }
    }
}

/// Matrix-free operator backed by a closure `f(x, y)` writing `y = A x`.
///
/// Useful when `A` is never materialised, e.g. a Laplacian stencil or a
/// product of factors applied on the fly.
///
/// ```
/// use cg_solver::traits::{FnOperator, LinearOperator};
///
/// // 2 * I on R^3
/// let op = FnOperator::new(3, |x: &[f64], y: &mut [f64]| {
///     for (yi, xi) in y.iter_mut().zip(x) {
///         *yi = 2.0 * xi;
///     }
/// });
/// assert_eq!(op.multiply(&[1.0, 2.0, 3.0]), vec![2.0, 4.0, 6.0]);
/// ```
pub struct FnOperator<F> {
    dim: usize,
    f: F,
}

impl<F: Fn(&[f64], &mut [f64])> FnOperator<F> {
    /// Square operator of dimension `dim`.
    pub fn new(dim: usize, f: F) -> Self {
        Self { dim, f }
    }
}

impl<F> std::fmt::Debug for FnOperator<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnOperator").field("dim", &self.dim).finish()
    }
}

impl<F: Fn(&[f64], &mut [f64])> LinearOperator for FnOperator<F> {
    #[inline]
    fn nrows(&self) -> usize {
        self.dim
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.dim
    }

    #[inline]
    fn apply(&self, x: &[f64], y: &mut [f64]) {
        (self.f)(x, y)
    }
}

#[cfg(feature = "nalgebra")]
impl LinearOperator for nalgebra::DMatrix<f64> {
    #[inline]
    fn nrows(&self) -> usize {
        self.nrows()
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.ncols()
    }

    fn apply(&self, x: &[f64], y: &mut [f64]) {
        let xv = nalgebra::DVectorView::from_slice(x, x.len());
        let mut yv = nalgebra::DVectorViewMut::from_slice(y, y.len());
        yv.gemv(1.0, self, &xv, 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csr_and_dense_agree() {
        let dense = DenseMatrix::from_rows(vec![
            vec![10.0, 1.0, 0.0],
            vec![1.0, 10.0, 1.0],
            vec![0.0, 1.0, 10.0],
        ])
        .unwrap();
        let csr = CsrMatrix::from_dense(&dense);
        let x = [1.0, -2.0, 3.0];

        assert_eq!(dense.multiply(&x), csr.multiply(&x));
        assert_eq!(dense.multiply(&x), vec![8.0, -16.0, 28.0]);
    }

    #[test]
    fn reference_forwards() {
        let m = CsrMatrix::<f64>::identity(4);
        let r: &dyn LinearOperator = &m;
        assert_eq!((&r).nrows(), 4);
        assert!(r.is_square());
        assert_eq!(r.multiply(&[1.0, 2.0, 3.0, 4.0]), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn fn_operator_dimensions() {
        let op = FnOperator::new(2, |x: &[f64], y: &mut [f64]| y.copy_from_slice(x));
        assert_eq!(op.nrows(), 2);
        assert_eq!(op.ncols(), 2);
        assert_eq!(op.multiply(&[5.0, 6.0]), vec![5.0, 6.0]);
    }

    #[test]
    fn csr_validate_rejects_short_row_ptr() {
        let m = CsrMatrix {
            row_ptr: vec![0, 1],
            col_indices: vec![0],
            values: vec![1.0],
            rows: 3,
            cols: 3,
        };
        assert!(matches!(m.validate(), Err(ValidationError::DimensionMismatch(_))));
        // Forwarded through references.
        assert!((&m).validate().is_err());
        assert!(CsrMatrix::<f64>::identity(3).validate().is_ok());
    }

    #[cfg(feature = "nalgebra")]
    #[test]
    fn nalgebra_dmatrix_operator() {
        let m = nalgebra::DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 3.0]);
        assert_eq!(LinearOperator::multiply(&m, &[1.0, 1.0]), vec![3.0, 4.0]);
    }
}

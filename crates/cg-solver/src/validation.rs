//! Input validation for solver operations.
//!
//! All validation functions run eagerly before any computation begins, so
//! callers receive clear diagnostics instead of NaN-poisoned iterates. Every
//! public function returns [`ValidationError`] on failure, which converts
//! into [`SolverError::InvalidArgument`](crate::error::SolverError::InvalidArgument)
//! via `From`.
//!
//! The symmetry checks at the bottom are opt-in. The solver itself never
//! verifies that `A` is SPD; positive definiteness cannot be confirmed without
//! a factorization.

use crate::error::ValidationError;
use crate::traits::LinearOperator;
use crate::types::{CsrMatrix, DenseMatrix};

/// Maximum solver iterations to prevent runaway computation.
pub const MAX_ITERATIONS: usize = 10_000_000;

// ---------------------------------------------------------------------------
// CSR matrix validation
// ---------------------------------------------------------------------------

/// Validate the structural integrity of a CSR matrix.
///
/// Performs the following checks in order:
///
/// 1. `row_ptr` length equals `rows + 1`.
/// 2. `row_ptr` is monotonically non-decreasing.
/// 3. `row_ptr[0] == 0` and `row_ptr[rows] == nnz`.
/// 4. `col_indices` length equals `values` length.
/// 5. All column indices are less than `cols`.
/// 6. No `NaN` or `Inf` values in `values`.
/// 7. Column indices are sorted within each row (emits a [`tracing::warn`] if
///    not, but does not error).
///
/// # Errors
///
/// Returns [`ValidationError`] describing the first violation found.
///
/// # Examples
///
/// ```
/// use cg_solver::types::CsrMatrix;
/// use cg_solver::validation::validate_csr_matrix;
///
/// let m = CsrMatrix::<f64>::from_coo(2, 2, vec![(0, 0, 1.0), (1, 1, 2.0)]);
/// assert!(validate_csr_matrix(&m).is_ok());
/// ```
pub fn validate_csr_matrix(matrix: &CsrMatrix<f64>) -> Result<(), ValidationError> {
    let nnz = matrix.values.len();

    // 1. row_ptr length
    let expected_row_ptr_len = matrix.rows + 1;
    if matrix.row_ptr.len() != expected_row_ptr_len {
        return Err(ValidationError::DimensionMismatch(format!(
            "row_ptr length {} does not equal rows + 1 = {}",
            matrix.row_ptr.len(),
            expected_row_ptr_len,
        )));
    }

    // 2. row_ptr monotonicity
    for i in 1..matrix.row_ptr.len() {
        if matrix.row_ptr[i] < matrix.row_ptr[i - 1] {
            return Err(ValidationError::NonMonotonicRowPtrs { position: i });
        }
    }

    // 3. row_ptr boundary values
    if matrix.row_ptr[0] != 0 {
        return Err(ValidationError::DimensionMismatch(format!(
            "row_ptr[0] = {} (expected 0)",
            matrix.row_ptr[0],
        )));
    }
    let expected_nnz = matrix.row_ptr[matrix.rows];
    if expected_nnz != nnz {
        return Err(ValidationError::DimensionMismatch(format!(
            "values length {} does not match row_ptr[rows] = {}",
            nnz, expected_nnz,
        )));
    }

    // 4. col_indices length must match values length
    if matrix.col_indices.len() != nnz {
        return Err(ValidationError::DimensionMismatch(format!(
            "col_indices length {} does not match values length {}",
            matrix.col_indices.len(),
            nnz,
        )));
    }

    // 5. Column bounds + 6. finiteness + 7. sorted check (warn only)
    for row in 0..matrix.rows {
        let mut prev_col: Option<usize> = None;
        for (col, &val) in matrix.row_entries(row) {
            if col >= matrix.cols {
                return Err(ValidationError::IndexOutOfBounds {
                    index: col,
                    row,
                    cols: matrix.cols,
                });
            }

            if !val.is_finite() {
                return Err(ValidationError::NonFiniteValue(format!(
                    "matrix[{}, {}] = {}",
                    row, col, val,
                )));
            }

            if let Some(pc) = prev_col {
                if col < pc {
                    tracing::warn!(
                        row = row,
                        "column indices not sorted within row (col {} follows {})",
                        col,
                        pc,
                    );
                }
            }
            prev_col = Some(col);
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Vector validation
// ---------------------------------------------------------------------------

/// Validate a solver vector (`b` or `x0`).
///
/// Checks:
///
/// 1. `v.len() == expected_len` (dimension must match the matrix).
/// 2. No `NaN` or `Inf` entries.
///
/// # Errors
///
/// Returns [`ValidationError`] on dimension mismatch or non-finite values.
pub fn validate_vector(name: &str, v: &[f64], expected_len: usize) -> Result<(), ValidationError> {
    if v.len() != expected_len {
        return Err(ValidationError::DimensionMismatch(format!(
            "{} length {} does not match matrix dimension {}",
            name,
            v.len(),
            expected_len,
        )));
    }

    for (i, &value) in v.iter().enumerate() {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteValue(format!(
                "{}[{}] = {}",
                name, i, value,
            )));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Solver parameter validation
// ---------------------------------------------------------------------------

/// Validate solver convergence parameters.
///
/// # Rules
///
/// - `tolerance` must be finite and `>= 0`. Zero asks for an exact residual
///   and is only satisfied when the residual underflows to zero.
/// - `max_iterations` must be in `[1, MAX_ITERATIONS]`.
///
/// # Errors
///
/// Returns [`ValidationError::ParameterOutOfRange`] if either parameter is
/// outside its valid range.
pub fn validate_params(tolerance: f64, max_iterations: usize) -> Result<(), ValidationError> {
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(ValidationError::ParameterOutOfRange {
            name: "tolerance".into(),
            value: format!("{tolerance:.2e}"),
            expected: "finite value >= 0".into(),
        });
    }

    if max_iterations == 0 || max_iterations > MAX_ITERATIONS {
        return Err(ValidationError::ParameterOutOfRange {
            name: "max_iterations".into(),
            value: max_iterations.to_string(),
            expected: format!("[1, {}]", MAX_ITERATIONS),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Combined solver input validation
// ---------------------------------------------------------------------------

/// Validate the operator and vectors of a solve.
///
/// The operator must be square and structurally valid (see
/// [`LinearOperator::validate`]), and both `rhs` and `x0` must have its
/// dimension and be finite. An all-zero `rhs` is accepted with a
/// [`tracing::warn`]; the exact solution is then `x = 0`.
///
/// # Errors
///
/// Returns [`ValidationError`] on the first failing check.
pub fn validate_solver_input<A: LinearOperator + ?Sized>(
    matrix: &A,
    rhs: &[f64],
    x0: &[f64],
) -> Result<(), ValidationError> {
    if !matrix.is_square() {
        return Err(ValidationError::DimensionMismatch(format!(
            "CG requires a square matrix but got {}x{}",
            matrix.nrows(),
            matrix.ncols(),
        )));
    }

    matrix.validate()?;

    let n = matrix.nrows();
    validate_vector("rhs", rhs, n)?;
    validate_vector("x0", x0, n)?;

    if !rhs.is_empty() && rhs.iter().all(|&v| v == 0.0) {
        tracing::warn!("rhs vector is all zeros; solution is trivially zero");
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Opt-in symmetry verification
// ---------------------------------------------------------------------------

/// Verify that a CSR matrix is square and numerically symmetric.
///
/// Runs in O(nnz * max_row_degree). Use it once per matrix, not per solve.
///
/// # Errors
///
/// Returns [`ValidationError::DimensionMismatch`] for a non-square matrix or
/// [`ValidationError::NotSymmetric`] for the first `(i, j)` with
/// `|a_ij - a_ji| > tol`.
pub fn validate_symmetric_csr(matrix: &CsrMatrix<f64>, tol: f64) -> Result<(), ValidationError> {
    if matrix.rows != matrix.cols {
        return Err(ValidationError::DimensionMismatch(format!(
            "symmetry requires a square matrix but got {}x{}",
            matrix.rows, matrix.cols,
        )));
    }

    for row in 0..matrix.rows {
        for (col, _) in matrix.row_entries(row) {
            if col == row {
                continue;
            }
            let value = matrix.get(row, col);
            let mirror = matrix.get(col, row);
            if (value - mirror).abs() > tol {
                return Err(ValidationError::NotSymmetric {
                    row,
                    col,
                    value,
                    mirror,
                });
            }
        }
    }

    Ok(())
}

/// Verify that a dense matrix is square and numerically symmetric.
///
/// # Errors
///
/// Same as [`validate_symmetric_csr`].
pub fn validate_symmetric_dense(matrix: &DenseMatrix, tol: f64) -> Result<(), ValidationError> {
    if matrix.rows() != matrix.cols() {
        return Err(ValidationError::DimensionMismatch(format!(
            "symmetry requires a square matrix but got {}x{}",
            matrix.rows(),
            matrix.cols(),
        )));
    }

    for i in 0..matrix.rows() {
        for j in (i + 1)..matrix.cols() {
            let value = matrix.get(i, j);
            let mirror = matrix.get(j, i);
            if (value - mirror).abs() > tol {
                return Err(ValidationError::NotSymmetric {
                    row: i,
                    col: j,
                    value,
                    mirror,
                });
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

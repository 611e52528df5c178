//! Error types for the solver crate.
//!
//! Provides structured error variants for invalid arguments, numerical
//! breakdown, budget overruns, and (opt-in) non-convergence. All errors
//! implement `std::error::Error` via `thiserror`.

use std::time::Duration;

use crate::events::BudgetLimit;

/// Primary error type for solver operations.
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    /// The caller supplied invalid input (dimensions, parameters, etc.).
    ///
    /// Raised before any iteration work is done.
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] ValidationError),

    /// A denominator in the `alpha` or `beta` update was zero or non-finite
    /// before the residual-norm check could end the loop.
    ///
    /// The last valid iterate is attached for diagnostics; it is not a
    /// usable solution.
    #[error("numerical breakdown at iteration {iteration}: {detail}")]
    Breakdown {
        /// Iteration at which the breakdown was detected.
        iteration: usize,
        /// Human-readable explanation.
        detail: String,
        /// Solution estimate at the start of the failing iteration.
        last_iterate: Vec<f64>,
        /// Residual norm at the start of the failing iteration.
        residual_norm: f64,
    },

    /// The wall-clock budget ran out or the solve was cancelled.
    #[error("compute budget exhausted after {iterations} iterations: {reason}")]
    BudgetExhausted {
        /// Human-readable description of the limit.
        reason: String,
        /// Which limit was hit.
        limit: BudgetLimit,
        /// Iterations completed before the check fired.
        iterations: usize,
        /// Wall-clock time elapsed before the budget was hit.
        elapsed: Duration,
    },

    /// The iteration cap was reached without meeting the tolerance.
    ///
    /// Only produced by [`SolverResult::into_converged`]; the solver itself
    /// reports an exhausted iteration cap as a normal result.
    ///
    /// [`SolverResult::into_converged`]: crate::types::SolverResult::into_converged
    #[error(
        "solver did not converge after {iterations} iterations (residual={residual:.2e}, tol={tolerance:.2e})"
    )]
    NonConvergence {
        /// Number of iterations completed.
        iterations: usize,
        /// Final residual norm.
        residual: f64,
        /// Target tolerance that was not reached.
        tolerance: f64,
    },
}

/// Validation errors for solver inputs.
///
/// These are raised eagerly before any computation begins so that callers get
/// clear diagnostics rather than mysterious numerical failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Dimensions are inconsistent (non-square matrix, vector length, etc.).
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A value is NaN or infinite where a finite number is required.
    #[error("non-finite value detected: {0}")]
    NonFiniteValue(String),

    /// A column index is out of bounds for the declared number of columns.
    #[error("column index {index} out of bounds for {cols} columns (row {row})")]
    IndexOutOfBounds {
        /// Offending column index.
        index: usize,
        /// Row containing the offending entry.
        row: usize,
        /// Declared column count.
        cols: usize,
    },

    /// The `row_ptr` array is not monotonically non-decreasing.
    #[error("row_ptr is not monotonically non-decreasing at position {position}")]
    NonMonotonicRowPtrs {
        /// Position in `row_ptr` where the violation was detected.
        position: usize,
    },

    /// A parameter is outside its valid range.
    #[error("parameter out of range: {name} = {value} (expected {expected})")]
    ParameterOutOfRange {
        /// Name of the parameter.
        name: String,
        /// The invalid value (as a string for flexibility).
        value: String,
        /// Human-readable description of the valid range.
        expected: String,
    },

    /// The opt-in symmetry check found `|a_ij - a_ji| > tol`.
    #[error("matrix is not symmetric: a[{row},{col}] = {value:.6e} but a[{col},{row}] = {mirror:.6e}")]
    NotSymmetric {
        /// Row of the first offending entry.
        row: usize,
        /// Column of the first offending entry.
        col: usize,
        /// Value at `(row, col)`.
        value: f64,
        /// Value at `(col, row)`.
        mirror: f64,
    },
}

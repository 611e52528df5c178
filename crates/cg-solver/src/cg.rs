//! Conjugate Gradient solver for symmetric positive-definite systems.
//!
//! Solves `Ax = b` where `A` is a symmetric positive-definite (SPD) matrix
//! exposed through [`LinearOperator`]. In exact arithmetic the iteration
//! reaches the solution in at most `n` steps for an `n x n` system; in
//! floating point it stops once `||r||_2 <= tolerance` or after
//! `max_iterations` steps, whichever comes first.
//!
//! # Algorithm
//!
//! Hestenes-Stiefel Conjugate Gradient without preconditioning:
//!
//! ```text
//! x = copy(x0)
//! r = b - A*x
//! p = r
//! delta_new = r . r
//!
//! while k < max_iterations and ||r||_2 > tolerance:
//!     q = A * p
//!     alpha = delta_new / (p . q)
//!     x = x + alpha * p
//!     r = r - alpha * q
//!     delta_old = delta_new
//!     delta_new = r . r
//!     beta = delta_new / delta_old
//!     p = r + beta * p
//!     k = k + 1
//! ```
//!
//! The termination test runs before any iteration work, so an `x0` that
//! already meets the tolerance is returned unchanged with zero iterations.
//!
//! # Breakdown
//!
//! A zero or non-finite `p . q` (or `delta_old`) aborts the solve with
//! [`SolverError::Breakdown`] instead of letting NaN/Inf flow into the
//! iterate. This happens for singular or indefinite `A`; SPD input reaches
//! the tolerance check first.
//!
//! # Convergence
//!
//! Theoretical bound:
//! `||x_k - x*||_A <= 2 * ((sqrt(kappa) - 1)/(sqrt(kappa) + 1))^k * ||x_0 - x*||_A`
//! where `kappa` is the 2-condition number of `A`.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::budget::BudgetEnforcer;
use crate::error::SolverError;
use crate::events::{EventSink, NoopSink, SolverEvent};
use crate::traits::LinearOperator;
use crate::types::{ComputeBudget, ConvergenceInfo, SolverResult};
use crate::validation;
use crate::vector::{axpy, dot, sub_into, xpby};

/// Default residual-norm tolerance.
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

/// Default iteration cap.
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Solve `Ax = b` from the initial guess `x0`.
///
/// Returns the approximate solution and the number of iterations performed.
/// Hitting `max_iter` is not an error; use
/// [`ConjugateGradientSolver::solve`] when the residual norm or convergence
/// flag is needed.
///
/// # Errors
///
/// * [`SolverError::InvalidArgument`] -- dimension mismatch, non-finite
///   input, `max_iter == 0`, or negative tolerance.
/// * [`SolverError::Breakdown`] -- zero or non-finite denominator.
///
/// # Example
///
/// ```
/// use cg_solver::types::DenseMatrix;
///
/// let a = DenseMatrix::identity(3);
/// let (x, iterations) = cg_solver::solve(&a, &[3.0, 3.0, 3.0], &[0.0; 3], 10, 1e-10).unwrap();
/// assert_eq!(iterations, 1);
/// assert_eq!(x, vec![3.0, 3.0, 3.0]);
/// ```
pub fn solve<A: LinearOperator + ?Sized>(
    matrix: &A,
    rhs: &[f64],
    x0: &[f64],
    max_iter: usize,
    tolerance: f64,
) -> Result<(Vec<f64>, usize), SolverError> {
    let result = ConjugateGradientSolver::new(tolerance, max_iter).solve(matrix, rhs, x0)?;
    Ok((result.solution, result.iterations))
}

// ═══════════════════════════════════════════════════════════════════════════
// ConjugateGradientSolver
// ═══════════════════════════════════════════════════════════════════════════

/// Conjugate Gradient solver configuration.
///
/// Stores the tolerance and iteration cap. The solve itself is stateless and
/// may be invoked concurrently on different inputs from multiple threads.
///
/// Serializes as `{ "tolerance": ..., "max_iterations": ... }`; missing fields
/// fall back to [`DEFAULT_TOLERANCE`] and [`DEFAULT_MAX_ITERATIONS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConjugateGradientSolver {
    /// Absolute residual-norm tolerance.
    ///
    /// The loop continues while `||r||_2 > tolerance`.
    tolerance: f64,

    /// Maximum number of CG iterations.
    max_iterations: usize,
}

impl Default for ConjugateGradientSolver {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE, DEFAULT_MAX_ITERATIONS)
    }
}

impl ConjugateGradientSolver {
    /// Create a new CG solver.
    ///
    /// # Arguments
    ///
    /// * `tolerance` -- Residual-norm threshold. Must be finite and `>= 0`.
    /// * `max_iterations` -- Upper bound on CG iterations. Must be `>= 1`.
    ///
    /// Both are checked when a solve starts, not here.
    pub fn new(tolerance: f64, max_iterations: usize) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }

    /// Return the configured tolerance.
    #[inline]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Return the configured maximum iterations.
    #[inline]
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Replace the tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Replace the iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Solve `Ax = b` starting from `x0`.
    ///
    /// `matrix`, `rhs` and `x0` are only borrowed; `x0` is copied into the
    /// working iterate.
    ///
    /// # Errors
    ///
    /// * [`SolverError::InvalidArgument`] -- dimension mismatch or invalid params.
    /// * [`SolverError::Breakdown`] -- zero or non-finite denominator.
    pub fn solve<A: LinearOperator + ?Sized>(
        &self,
        matrix: &A,
        rhs: &[f64],
        x0: &[f64],
    ) -> Result<SolverResult, SolverError> {
        self.solve_with(matrix, rhs, x0, &ComputeBudget::unbounded(), &mut NoopSink)
    }

    /// Solve with a wall-clock / cancellation budget, reporting progress to
    /// `sink`.
    ///
    /// The budget is checked at the top of each iteration, before any
    /// iteration work.
    ///
    /// # Errors
    ///
    /// Everything [`solve`](Self::solve) returns, plus
    /// [`SolverError::BudgetExhausted`] when the budget stops the loop.
    pub fn solve_with<A, S>(
        &self,
        matrix: &A,
        rhs: &[f64],
        x0: &[f64],
        budget: &ComputeBudget,
        sink: &mut S,
    ) -> Result<SolverResult, SolverError>
    where
        A: LinearOperator + ?Sized,
        S: EventSink + ?Sized,
    {
        self.validate(matrix, rhs, x0)?;
        self.solve_inner(matrix, rhs, x0, budget, sink)
    }

    // -------------------------------------------------------------------
    // Input validation
    // -------------------------------------------------------------------

    fn validate<A: LinearOperator + ?Sized>(
        &self,
        matrix: &A,
        rhs: &[f64],
        x0: &[f64],
    ) -> Result<(), SolverError> {
        validation::validate_params(self.tolerance, self.max_iterations)?;
        validation::validate_solver_input(matrix, rhs, x0)?;
        Ok(())
    }

    // -------------------------------------------------------------------
    // Core CG algorithm
    // -------------------------------------------------------------------

    fn solve_inner<A, S>(
        &self,
        matrix: &A,
        rhs: &[f64],
        x0: &[f64],
        budget: &ComputeBudget,
        sink: &mut S,
    ) -> Result<SolverResult, SolverError>
    where
        A: LinearOperator + ?Sized,
        S: EventSink + ?Sized,
    {
        let mut enforcer = BudgetEnforcer::new(budget);
        let n = matrix.nrows();
        let tolerance = self.tolerance;

        // --- x = copy(x0); the caller's vector is never touched ---
        let mut x = x0.to_vec();

        // --- r = b - A*x ---
        let mut q = matrix.multiply(&x);
        let mut r = vec![0.0f64; n];
        sub_into(rhs, &q, &mut r);

        // --- p = r ---
        let mut p = r.clone();

        // --- delta_new = r . r ---
        let mut delta_new = dot(&r, &r);
        let mut residual_norm = delta_new.sqrt();

        // b and x0 are finite, so this only fires when A x0 overflowed.
        if !residual_norm.is_finite() {
            return Err(breakdown(
                sink,
                0,
                format!("initial residual ||b - A x0|| = {residual_norm:.6e} is not finite"),
                x,
                residual_norm,
            ));
        }

        let mut convergence_history =
            Vec::with_capacity(self.max_iterations.min(256) + 1);
        convergence_history.push(ConvergenceInfo {
            iteration: 0,
            residual_norm,
        });

        debug!(
            "CG: n={}, tol={:.2e}, max_iter={}, ||r0||={:.6e}",
            n, tolerance, self.max_iterations, residual_norm,
        );
        sink.emit(SolverEvent::SolveRequested {
            dimension: n,
            max_iterations: self.max_iterations,
            tolerance,
            initial_residual: residual_norm,
        });

        let mut iteration = 0usize;

        // ===============================================================
        // Main CG loop (Hestenes-Stiefel)
        // ===============================================================
        while iteration < self.max_iterations && residual_norm > tolerance {
            if let Err(err) = enforcer.check_iteration() {
                if let SolverError::BudgetExhausted { limit, elapsed, .. } = &err {
                    warn!("CG: budget exhausted at iteration {iteration}: {err}");
                    sink.emit(SolverEvent::BudgetExhausted {
                        iterations: iteration,
                        limit: *limit,
                        elapsed: *elapsed,
                    });
                }
                return Err(err);
            }

            // --- q = A * p ---
            matrix.apply(&p, &mut q);

            // --- alpha = delta_new / (p . q) ---
            let p_dot_q = dot(&p, &q);
            if p_dot_q == 0.0 || !p_dot_q.is_finite() {
                return Err(breakdown(
                    sink,
                    iteration,
                    format!("p.q = {p_dot_q:.6e}; search direction is in the null space of A or overflowed"),
                    x,
                    residual_norm,
                ));
            }
            let alpha = delta_new / p_dot_q;
            if !alpha.is_finite() {
                return Err(breakdown(
                    sink,
                    iteration,
                    format!("alpha = {alpha:.6e} is not finite (delta = {delta_new:.6e}, p.q = {p_dot_q:.6e})"),
                    x,
                    residual_norm,
                ));
            }

            // --- r = r - alpha * q ---
            axpy(-alpha, &q, &mut r);

            // --- delta_old = delta_new; delta_new = r . r ---
            let delta_old = delta_new;
            delta_new = dot(&r, &r);

            // x is still the last valid iterate here.
            if delta_old == 0.0 || !delta_new.is_finite() {
                return Err(breakdown(
                    sink,
                    iteration,
                    format!("beta undefined: delta_old = {delta_old:.6e}, delta_new = {delta_new:.6e}"),
                    x,
                    residual_norm,
                ));
            }

            // --- x = x + alpha * p ---
            axpy(alpha, &p, &mut x);

            // --- beta = delta_new / delta_old ---
            let beta = delta_new / delta_old;

            // --- p = r + beta * p ---
            xpby(&r, beta, &mut p);

            iteration += 1;
            residual_norm = delta_new.sqrt();

            convergence_history.push(ConvergenceInfo {
                iteration,
                residual_norm,
            });
            trace!("CG iter {iteration}: ||r|| = {residual_norm:.6e}, alpha = {alpha:.6e}, beta = {beta:.6e}");
            sink.emit(SolverEvent::IterationCompleted {
                iteration,
                residual: residual_norm,
                alpha,
                beta,
                elapsed: enforcer.elapsed(),
            });
        }

        let wall_time = enforcer.elapsed();
        let converged = residual_norm <= tolerance;

        if converged {
            debug!("CG converged after {iteration} iterations: ||r|| = {residual_norm:.6e}");
            sink.emit(SolverEvent::SolveConverged {
                iterations: iteration,
                residual: residual_norm,
                wall_time,
            });
        } else {
            debug!(
                "CG: iteration cap {} reached, ||r|| = {residual_norm:.6e} > tol {tolerance:.2e}",
                self.max_iterations,
            );
            sink.emit(SolverEvent::IterationLimitReached {
                iterations: iteration,
                residual: residual_norm,
                wall_time,
            });
        }

        Ok(SolverResult {
            solution: x,
            iterations: iteration,
            residual_norm,
            tolerance,
            converged,
            wall_time,
            convergence_history,
        })
    }
}

/// Log, emit, and build a [`SolverError::Breakdown`].
fn breakdown<S: EventSink + ?Sized>(
    sink: &mut S,
    iteration: usize,
    detail: String,
    last_iterate: Vec<f64>,
    residual_norm: f64,
) -> SolverError {
    warn!("CG: breakdown at iteration {iteration}: {detail}");
    sink.emit(SolverEvent::Breakdown {
        iteration,
        detail: detail.clone(),
    });
    SolverError::Breakdown {
        iteration,
        detail,
        last_iterate,
        residual_norm,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════

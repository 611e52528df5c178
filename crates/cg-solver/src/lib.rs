//! Conjugate Gradient solver for symmetric positive-definite linear systems.
//!
//! This crate solves `Ax = b` where `A` is symmetric positive-definite (SPD)
//! using the classical Hestenes-Stiefel Conjugate Gradient iteration. The
//! solver only needs a matrix-vector product, so it runs unchanged over dense
//! matrices, compressed sparse row (CSR) matrices, closures, or any other type
//! implementing [`LinearOperator`](traits::LinearOperator).
//!
//! # Modules
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`cg`] | The solver loop and the `solve(A, b, x0, max_iter, tol)` entry point |
//! | [`types`] | [`CsrMatrix`](types::CsrMatrix), [`DenseMatrix`](types::DenseMatrix), result types |
//! | [`traits`] | The [`LinearOperator`](traits::LinearOperator) capability |
//! | [`vector`] | `dot`, `axpy`, `norm2` kernels on `f64` slices |
//! | [`validation`] | Eager input checks and the opt-in symmetry verification |
//! | [`budget`] | Wall-clock limits and cooperative cancellation |
//! | [`events`] | Serializable solver events and sinks |
//! | [`provider`] | Test matrix presets (diagonal, tridiagonal, random SPD) |
//!
//! # Example
//!
//! ```rust
//! use cg_solver::cg::ConjugateGradientSolver;
//! use cg_solver::types::CsrMatrix;
//!
//! let matrix = CsrMatrix::<f64>::from_coo(3, 3, vec![
//!     (0, 0, 4.0), (0, 1, -1.0),
//!     (1, 0, -1.0), (1, 1, 4.0), (1, 2, -1.0),
//!     (2, 1, -1.0), (2, 2, 4.0),
//! ]);
//! let rhs = vec![3.0, 2.0, 3.0];
//! let x0 = vec![0.0; 3];
//!
//! let solver = ConjugateGradientSolver::new(1e-10, 100);
//! let result = solver.solve(&matrix, &rhs, &x0).unwrap();
//! assert!(result.converged);
//! assert!((result.solution[1] - 1.0).abs() < 1e-8);
//! ```

pub mod budget;
pub mod cg;
pub mod error;
pub mod events;
pub mod provider;
pub mod traits;
pub mod types;
pub mod validation;
pub mod vector;

pub use cg::{solve, ConjugateGradientSolver};
pub use error::{SolverError, ValidationError};
pub use traits::LinearOperator;
pub use types::{CsrMatrix, DenseMatrix, SolverResult};

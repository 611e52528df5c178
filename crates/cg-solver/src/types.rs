//! Core types for the CG solver.
//!
//! Provides [`CsrMatrix`] for compressed sparse row storage, [`DenseMatrix`]
//! for row-major dense storage, and the result types for convergence
//! tracking.

use std::ops::{Index, IndexMut};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::budget::CancellationToken;
use crate::error::{SolverError, ValidationError};
use crate::validation;

// ---------------------------------------------------------------------------
// CsrMatrix<T>
// ---------------------------------------------------------------------------

/// Compressed Sparse Row (CSR) matrix.
///
/// Stores only non-zero entries for efficient sparse matrix-vector
/// multiplication in O(nnz) time with excellent cache locality.
///
/// # Layout
///
/// For a matrix with `m` rows and `nnz` non-zeros:
/// - `row_ptr` has length `m + 1`
/// - `col_indices` and `values` each have length `nnz`
/// - Row `i` spans indices `row_ptr[i]..row_ptr[i+1]`
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix<T> {
    /// Row pointers: `row_ptr[i]` is the start index in `col_indices`/`values`
    /// for row `i`.
    pub row_ptr: Vec<usize>,
    /// Column indices for each non-zero entry.
    pub col_indices: Vec<usize>,
    /// Values for each non-zero entry.
    pub values: Vec<T>,
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
}

impl<T: Copy + Default + std::ops::Mul<Output = T> + std::ops::AddAssign> CsrMatrix<T> {
    /// Sparse matrix-vector multiply: `y = A * x`.
    ///
    /// # Panics
    ///
    /// Debug-asserts that `x.len() >= self.cols` and `y.len() >= self.rows`.
    #[inline]
    pub fn spmv(&self, x: &[T], y: &mut [T]) {
        debug_assert!(
            x.len() >= self.cols,
            "spmv: x.len()={} < cols={}",
            x.len(),
            self.cols,
        );
        debug_assert!(
            y.len() >= self.rows,
            "spmv: y.len()={} < rows={}",
            y.len(),
            self.rows,
        );

        for i in 0..self.rows {
            y[i] = self.row_dot(i, x);
        }
    }

    /// Dot product of row `row` with `x`.
    #[inline]
    pub(crate) fn row_dot(&self, row: usize, x: &[T]) -> T {
        let mut sum = T::default();
        for idx in self.row_ptr[row]..self.row_ptr[row + 1] {
            sum += self.values[idx] * x[self.col_indices[idx]];
        }
        sum
    }
}

impl<T> CsrMatrix<T> {
    /// Number of non-zero entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Number of stored entries in a specific row.
    #[inline]
    pub fn row_degree(&self, row: usize) -> usize {
        self.row_ptr[row + 1] - self.row_ptr[row]
    }

    /// Iterate over `(col_index, &value)` pairs for the given row.
    #[inline]
    pub fn row_entries(&self, row: usize) -> impl Iterator<Item = (usize, &T)> {
        let start = self.row_ptr[row];
        let end = self.row_ptr[row + 1];
        self.col_indices[start..end]
            .iter()
            .copied()
            .zip(self.values[start..end].iter())
    }
}

impl<T: Copy + Default + std::ops::AddAssign> CsrMatrix<T> {
    /// Transpose: produces `A^T` in CSR form.
    ///
    /// Uses a two-pass counting sort in O(nnz + rows + cols) time and
    /// O(nnz) extra memory.
    pub fn transpose(&self) -> CsrMatrix<T> {
        let nnz = self.nnz();
        let t_rows = self.cols;
        let t_cols = self.rows;

        // Pass 1: count entries per new row (= old column).
        let mut row_ptr = vec![0usize; t_rows + 1];
        for &c in &self.col_indices {
            row_ptr[c + 1] += 1;
        }
        for i in 1..=t_rows {
            row_ptr[i] += row_ptr[i - 1];
        }

        // Pass 2: scatter entries into the transposed arrays.
        let mut col_indices = vec![0usize; nnz];
        let mut values = vec![T::default(); nnz];
        let mut cursor = row_ptr.clone();

        for row in 0..self.rows {
            for (c, &v) in self.row_entries(row) {
                let dest = cursor[c];
                col_indices[dest] = row;
                values[dest] = v;
                cursor[c] += 1;
            }
        }

        CsrMatrix {
            row_ptr,
            col_indices,
            values,
            rows: t_rows,
            cols: t_cols,
        }
    }

    /// Value stored at `(row, col)`, or `T::default()` if the position is
    /// structurally zero. Duplicate entries are summed.
    pub fn get(&self, row: usize, col: usize) -> T {
        let mut acc = T::default();
        for (c, &v) in self.row_entries(row) {
            if c == col {
                acc += v;
            }
        }
        acc
    }

    /// Build a CSR matrix from COO (coordinate) triplets.
    ///
    /// Entries are sorted by (row, col) internally. Duplicate positions are
    /// summed into a single stored entry.
    ///
    /// # Panics
    ///
    /// Panics if any row or column index is out of bounds.
    pub fn from_coo_generic(
        rows: usize,
        cols: usize,
        entries: impl IntoIterator<Item = (usize, usize, T)>,
    ) -> Self {
        let mut sorted: Vec<_> = entries.into_iter().collect();
        sorted.sort_by_key(|(r, c, _)| (*r, *c));

        let mut row_ptr = vec![0usize; rows + 1];
        let mut col_indices: Vec<usize> = Vec::with_capacity(sorted.len());
        let mut values: Vec<T> = Vec::with_capacity(sorted.len());
        let mut last: Option<(usize, usize)> = None;

        for (r, c, v) in sorted {
            assert!(r < rows, "row index {} out of bounds (rows={})", r, rows);
            assert!(c < cols, "col index {} out of bounds (cols={})", c, cols);

            if last == Some((r, c)) {
                if let Some(prev) = values.last_mut() {
                    *prev += v;
                }
                continue;
            }
            row_ptr[r + 1] += 1;
            col_indices.push(c);
            values.push(v);
            last = Some((r, c));
        }
        for i in 1..=rows {
            row_ptr[i] += row_ptr[i - 1];
        }

        Self {
            row_ptr,
            col_indices,
            values,
            rows,
            cols,
        }
    }
}

impl CsrMatrix<f64> {
    /// Build a CSR matrix from COO (coordinate) triplets.
    ///
    /// Entries are sorted by (row, col) internally. Duplicate positions are
    /// summed.
    pub fn from_coo(
        rows: usize,
        cols: usize,
        entries: impl IntoIterator<Item = (usize, usize, f64)>,
    ) -> Self {
        Self::from_coo_generic(rows, cols, entries)
    }

    /// Build a CSR matrix from raw arrays, validating the structure.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the arrays do not describe a valid CSR
    /// matrix (see [`validate_csr_matrix`](crate::validation::validate_csr_matrix)).
    pub fn try_from_parts(
        rows: usize,
        cols: usize,
        row_ptr: Vec<usize>,
        col_indices: Vec<usize>,
        values: Vec<f64>,
    ) -> Result<Self, ValidationError> {
        let matrix = Self {
            row_ptr,
            col_indices,
            values,
            rows,
            cols,
        };
        validation::validate_csr_matrix(&matrix)?;
        Ok(matrix)
    }

    /// Build a square identity matrix of dimension `n` in CSR format.
    pub fn identity(n: usize) -> Self {
        let row_ptr: Vec<usize> = (0..=n).collect();
        let col_indices: Vec<usize> = (0..n).collect();
        let values = vec![1.0f64; n];

        Self {
            row_ptr,
            col_indices,
            values,
            rows: n,
            cols: n,
        }
    }

    /// Convert a dense matrix to CSR, dropping exact zeros.
    pub fn from_dense(dense: &DenseMatrix) -> Self {
        let mut row_ptr = Vec::with_capacity(dense.rows() + 1);
        let mut col_indices = Vec::new();
        let mut values = Vec::new();
        row_ptr.push(0);

        for i in 0..dense.rows() {
            for (j, &v) in dense.row(i).iter().enumerate() {
                if v != 0.0 {
                    col_indices.push(j);
                    values.push(v);
                }
            }
            row_ptr.push(values.len());
        }

        Self {
            row_ptr,
            col_indices,
            values,
            rows: dense.rows(),
            cols: dense.cols(),
        }
    }

    /// Expand into a row-major dense matrix.
    pub fn to_dense(&self) -> DenseMatrix {
        let mut dense = DenseMatrix::zeros(self.rows, self.cols);
        for i in 0..self.rows {
            for (j, &v) in self.row_entries(i) {
                dense[(i, j)] += v;
            }
        }
        dense
    }

    /// Main diagonal `a_ii` for `i < min(rows, cols)`.
    pub fn diagonal(&self) -> Vec<f64> {
        (0..self.rows.min(self.cols)).map(|i| self.get(i, i)).collect()
    }

    /// `true` if `|a_ij - a_ji| <= tol` for every stored entry.
    pub fn is_symmetric(&self, tol: f64) -> bool {
        validation::validate_symmetric_csr(self, tol).is_ok()
    }
}

// ---------------------------------------------------------------------------
// DenseMatrix
// ---------------------------------------------------------------------------

/// Row-major dense `f64` matrix.
///
/// Entry `(i, j)` lives at `data[i * cols + j]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl DenseMatrix {
    /// All-zero `rows x cols` matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// `n x n` identity.
    pub fn identity(n: usize) -> Self {
        Self::from_diagonal(&vec![1.0; n])
    }

    /// Square matrix with `diag` on the main diagonal.
    pub fn from_diagonal(diag: &[f64]) -> Self {
        let n = diag.len();
        let mut m = Self::zeros(n, n);
        for (i, &d) in diag.iter().enumerate() {
            m[(i, i)] = d;
        }
        m
    }

    /// Wrap a row-major buffer.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DimensionMismatch`] if
    /// `data.len() != rows * cols`.
    pub fn from_row_major(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, ValidationError> {
        if data.len() != rows * cols {
            return Err(ValidationError::DimensionMismatch(format!(
                "buffer length {} does not match {}x{}",
                data.len(),
                rows,
                cols,
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Build from a list of rows.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DimensionMismatch`] if the rows are ragged.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, ValidationError> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(n_rows * n_cols);

        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(ValidationError::DimensionMismatch(format!(
                    "row {} has length {} but row 0 has length {}",
                    i,
                    row.len(),
                    n_cols,
                )));
            }
            data.extend(row);
        }

        Ok(Self {
            rows: n_rows,
            cols: n_cols,
            data,
        })
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row-major backing buffer.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Row `i` as a slice.
    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Entry `(i, j)`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self[(i, j)]
    }

    /// Overwrite entry `(i, j)`.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self[(i, j)] = value;
    }

    /// Number of entries that are not exactly zero.
    pub fn nnz(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0.0).count()
    }

    /// Dense matrix-vector multiply: `y = A * x`.
    ///
    /// # Panics
    ///
    /// Panics if `x.len() != cols` or `y.len() != rows`.
    pub fn matvec(&self, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.cols, "matvec: x length must equal cols");
        assert_eq!(y.len(), self.rows, "matvec: y length must equal rows");

        for (i, yi) in y.iter_mut().enumerate() {
            *yi = crate::vector::dot(self.row(i), x);
        }
    }

    /// Transposed copy.
    pub fn transpose(&self) -> Self {
        let mut t = Self::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                t[(j, i)] = self[(i, j)];
            }
        }
        t
    }

    /// Matrix product `self * other`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DimensionMismatch`] if the inner dimensions
    /// disagree.
    pub fn matmul(&self, other: &DenseMatrix) -> Result<Self, ValidationError> {
        if self.cols != other.rows {
            return Err(ValidationError::DimensionMismatch(format!(
                "cannot multiply {}x{} by {}x{}",
                self.rows, self.cols, other.rows, other.cols,
            )));
        }

        let mut out = Self::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a_ik = self[(i, k)];
                if a_ik == 0.0 {
                    continue;
                }
                let out_row = &mut out.data[i * other.cols..(i + 1) * other.cols];
                crate::vector::axpy(a_ik, other.row(k), out_row);
            }
        }
        Ok(out)
    }

    /// Elementwise (Hadamard) product.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DimensionMismatch`] if the shapes differ.
    pub fn hadamard(&self, other: &DenseMatrix) -> Result<Self, ValidationError> {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(ValidationError::DimensionMismatch(format!(
                "hadamard product of {}x{} and {}x{}",
                self.rows, self.cols, other.rows, other.cols,
            )));
        }
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| a * b)
            .collect();
        Ok(Self {
            rows: self.rows,
            cols: self.cols,
            data,
        })
    }

    /// Multiply every entry by `factor` in place.
    pub fn scale(&mut self, factor: f64) {
        for v in &mut self.data {
            *v *= factor;
        }
    }

    /// `true` if square and `|a_ij - a_ji| <= tol` everywhere.
    pub fn is_symmetric(&self, tol: f64) -> bool {
        validation::validate_symmetric_dense(self, tol).is_ok()
    }
}

impl Index<(usize, usize)> for DenseMatrix {
    type Output = f64;

    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        assert!(i < self.rows && j < self.cols, "index ({i}, {j}) out of bounds");
        &self.data[i * self.cols + j]
    }
}

impl IndexMut<(usize, usize)> for DenseMatrix {
    #[inline]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        assert!(i < self.rows && j < self.cols, "index ({i}, {j}) out of bounds");
        &mut self.data[i * self.cols + j]
    }
}

// ---------------------------------------------------------------------------
// Budget & result types
// ---------------------------------------------------------------------------

/// Optional limits checked between CG iterations.
///
/// The default budget is unbounded: the solve runs until the tolerance or
/// the iteration cap is reached.
#[derive(Debug, Clone, Default)]
pub struct ComputeBudget {
    /// Maximum wall-clock time allowed.
    pub max_time: Option<std::time::Duration>,
    /// Cooperative cancellation flag, polled once per iteration.
    pub cancel: Option<CancellationToken>,
}

impl ComputeBudget {
    /// Budget with no limits.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Budget limited to `max_time` of wall-clock time.
    pub fn with_max_time(max_time: Duration) -> Self {
        Self {
            max_time: Some(max_time),
            cancel: None,
        }
    }

    /// Attach a cancellation token.
    pub fn cancellable(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Per-iteration convergence snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceInfo {
    /// Iteration index; `0` is the initial residual.
    pub iteration: usize,
    /// Residual L2 norm after this iteration.
    pub residual_norm: f64,
}

/// Result returned by a solver invocation that did not fail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverResult {
    /// Approximate solution vector `x`.
    pub solution: Vec<f64>,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Final residual L2 norm `||b - A x||` as tracked by the recurrence.
    pub residual_norm: f64,
    /// Tolerance the solve was run with.
    pub tolerance: f64,
    /// Whether `residual_norm <= tolerance`.
    ///
    /// `false` means the iteration cap ended the loop.
    pub converged: bool,
    /// Wall-clock time taken.
    pub wall_time: Duration,
    /// Residual norm per iteration, starting with the initial residual.
    pub convergence_history: Vec<ConvergenceInfo>,
}

impl SolverResult {
    /// Return `self` if the tolerance was met, otherwise
    /// [`SolverError::NonConvergence`].
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::NonConvergence`] when `converged` is `false`.
    pub fn into_converged(self) -> Result<Self, SolverError> {
        if self.converged {
            Ok(self)
        } else {
            Err(SolverError::NonConvergence {
                iterations: self.iterations,
                residual: self.residual_norm,
                tolerance: self.tolerance,
            })
        }
    }
}

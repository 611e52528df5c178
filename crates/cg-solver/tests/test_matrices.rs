//! Integration tests for the matrix types: CSR construction, products,
//! conversions to and from dense storage, validation and symmetry checks.

mod helpers;

use approx::assert_relative_eq;
use cg_solver::error::ValidationError;
use cg_solver::provider::{MaskPattern, MatrixProvider};
use cg_solver::traits::LinearOperator;
use cg_solver::types::{CsrMatrix, DenseMatrix};
use cg_solver::validation::{validate_csr_matrix, validate_symmetric_csr};

use helpers::random_spd_csr;

/// `[ 2 -1 0; -1 3 -1; 0 -1 2 ]`
fn small_symmetric() -> CsrMatrix<f64> {
    CsrMatrix::<f64>::from_coo(
        3,
        3,
        vec![
            (0, 0, 2.0),
            (0, 1, -1.0),
            (1, 0, -1.0),
            (1, 1, 3.0),
            (1, 2, -1.0),
            (2, 1, -1.0),
            (2, 2, 2.0),
        ],
    )
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

#[test]
fn test_csr_from_coo_layout() {
    let mat = small_symmetric();

    assert_eq!(mat.nnz(), 7);
    assert_eq!(mat.row_ptr, vec![0, 2, 5, 7]);
    assert_eq!(mat.col_indices, vec![0, 1, 0, 1, 2, 1, 2]);
    assert_eq!(mat.row_degree(1), 3);
    validate_csr_matrix(&mat).unwrap();
}

#[test]
fn test_csr_from_coo_unsorted_and_duplicates() {
    // Entries out of order, (1, 1) given twice.
    let mat = CsrMatrix::<f64>::from_coo(
        2,
        2,
        vec![(1, 1, 1.5), (0, 1, 4.0), (1, 1, 0.5), (0, 0, 1.0)],
    );

    assert_eq!(mat.nnz(), 3);
    assert_eq!(mat.get(1, 1), 2.0);
    assert_eq!(mat.get(0, 1), 4.0);
    assert_eq!(mat.get(1, 0), 0.0);
    validate_csr_matrix(&mat).unwrap();
}

#[test]
fn test_csr_try_from_parts_rejects_bad_structure() {
    let err = CsrMatrix::try_from_parts(2, 2, vec![0, 2, 1], vec![0, 1], vec![1.0, 1.0]).unwrap_err();
    assert!(matches!(err, ValidationError::NonMonotonicRowPtrs { .. }));

    let err = CsrMatrix::try_from_parts(2, 2, vec![0, 1, 2], vec![0, 5], vec![1.0, 1.0]).unwrap_err();
    assert!(matches!(err, ValidationError::IndexOutOfBounds { index: 5, .. }));

    let err = CsrMatrix::try_from_parts(2, 2, vec![0, 1, 2], vec![0, 1], vec![1.0, f64::NAN]).unwrap_err();
    assert!(matches!(err, ValidationError::NonFiniteValue(_)));

    let ok = CsrMatrix::try_from_parts(2, 2, vec![0, 1, 2], vec![0, 1], vec![1.0, 2.0]).unwrap();
    assert_eq!(ok.diagonal(), vec![1.0, 2.0]);
}

#[test]
fn test_dense_from_rows_ragged() {
    let err = DenseMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
    assert!(matches!(err, ValidationError::DimensionMismatch(_)));
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[test]
fn test_csr_spmv() {
    let mat = small_symmetric();

    // A * [1, 2, 3] = [0, 2, 4]
    let y = mat.multiply(&[1.0, 2.0, 3.0]);
    assert_relative_eq!(y[0], 0.0, epsilon = 1e-12);
    assert_relative_eq!(y[1], 2.0, epsilon = 1e-12);
    assert_relative_eq!(y[2], 4.0, epsilon = 1e-12);
}

#[test]
fn test_csr_empty_rows() {
    let mat = CsrMatrix::<f64>::from_coo(3, 3, Vec::<(usize, usize, f64)>::new());
    assert_eq!(mat.row_ptr, vec![0, 0, 0, 0]);
    assert_eq!(mat.multiply(&[1.0, 2.0, 3.0]), vec![0.0; 3]);
}

#[test]
fn test_dense_matmul_and_hadamard() {
    let a = DenseMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
    let b = DenseMatrix::from_rows(vec![vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap();

    let ab = a.matmul(&b).unwrap();
    assert_eq!(ab, DenseMatrix::from_rows(vec![vec![2.0, 1.0], vec![4.0, 3.0]]).unwrap());

    let h = a.hadamard(&b).unwrap();
    assert_eq!(h, DenseMatrix::from_rows(vec![vec![0.0, 2.0], vec![3.0, 0.0]]).unwrap());

    let wide = DenseMatrix::zeros(2, 3);
    assert!(wide.matmul(&a).is_err());
    assert!(a.hadamard(&wide).is_err());
}

#[test]
fn test_gram_matrix_is_symmetric() {
    let q = DenseMatrix::from_rows(vec![
        vec![0.3, 0.9, 0.1],
        vec![0.7, 0.2, 0.5],
        vec![0.4, 0.8, 0.6],
    ])
    .unwrap();
    let gram = q.transpose().matmul(&q).unwrap();
    assert!(gram.is_symmetric(0.0));
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

#[test]
fn test_dense_csr_conversion() {
    let dense = MatrixProvider::tridiagonal(6);
    let csr = CsrMatrix::from_dense(&dense);

    assert_eq!(csr.nnz(), dense.nnz());
    assert_eq!(csr, MatrixProvider::tridiagonal_csr(6));
    assert_eq!(csr.to_dense(), dense);
}

#[test]
fn test_transpose_of_symmetric_is_identity_op() {
    let mat = random_spd_csr(12, 0.3, 21);
    assert_eq!(mat.transpose().to_dense(), mat.to_dense());
}

// ---------------------------------------------------------------------------
// Symmetry checks
// ---------------------------------------------------------------------------

#[test]
fn test_symmetry_detection() {
    assert!(small_symmetric().is_symmetric(0.0));

    let asym = CsrMatrix::<f64>::from_coo(
        3,
        3,
        vec![(0, 0, 1.0), (0, 1, 2.0), (1, 1, 3.0), (2, 2, 4.0)],
    );
    assert!(!asym.is_symmetric(1e-12));

    match validate_symmetric_csr(&asym, 1e-12) {
        Err(ValidationError::NotSymmetric { row, col, value, mirror }) => {
            assert_eq!((row, col), (0, 1));
            assert_eq!(value, 2.0);
            assert_eq!(mirror, 0.0);
        }
        other => panic!("expected NotSymmetric, got {other:?}"),
    }
}

#[test]
fn test_symmetry_tolerance() {
    let nearly = CsrMatrix::<f64>::from_coo(2, 2, vec![(0, 0, 1.0), (0, 1, 0.5), (1, 0, 0.5 + 1e-10), (1, 1, 1.0)]);
    assert!(nearly.is_symmetric(1e-8));
    assert!(!nearly.is_symmetric(1e-12));
}

#[test]
fn test_provider_presets_are_symmetric() {
    let mut provider = MatrixProvider::new(5);
    assert!(MatrixProvider::diagonal_csr(10).is_symmetric(0.0));
    assert!(MatrixProvider::tridiagonal_csr(10).is_symmetric(0.0));
    assert!(provider.random_spd_csr(40, MaskPattern::Quadratic).unwrap().is_symmetric(0.0));
    assert!(provider.random_spd_csr(40, MaskPattern::arrow()).unwrap().is_symmetric(0.0));
}

//! Test system construction shared by the `solve` and `inspect` commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde::Deserialize;

use cg_solver::provider::{MaskPattern, MatrixProvider};
use cg_solver::traits::LinearOperator;
use cg_solver::types::{CsrMatrix, DenseMatrix};
use cg_solver::validation::{validate_symmetric_csr, validate_symmetric_dense};
use cg_solver::ValidationError;

/// Matrix preset
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Preset {
    /// Identity matrix
    Diagonal,
    /// 10 on the diagonal, 1 on both neighbours
    Tridiagonal,
    /// Random SPD matrix restricted to a sparsity mask
    Random,
}

/// Storage format
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Dense,
    Csr,
}

/// Arguments selecting a test matrix.
#[derive(Args, Debug, Clone)]
pub struct SystemArgs {
    /// Matrix preset
    #[arg(short, long, value_enum, default_value = "tridiagonal")]
    pub preset: Preset,

    /// Matrix dimension
    #[arg(short = 'n', long, default_value_t = 50)]
    pub size: usize,

    /// Sparsity mask for the random preset (quadratic, arrow)
    #[arg(short, long, default_value = "quadratic", value_parser = parse_mask)]
    pub mask: MaskPattern,

    /// Anchor density for the arrow mask
    #[arg(long)]
    pub density: Option<f64>,

    /// Storage format
    #[arg(short, long, value_enum, default_value = "csr")]
    pub format: Format,

    /// Seed for the random preset and random right-hand sides
    #[arg(short, long, default_value_t = 42)]
    pub seed: u64,

    /// Read the matrix from a JSON CSR file instead of building a preset
    #[arg(long, value_name = "FILE")]
    pub matrix: Option<PathBuf>,
}

fn parse_mask(s: &str) -> Result<MaskPattern, String> {
    s.parse::<MaskPattern>().map_err(|e| e.to_string())
}

impl SystemArgs {
    /// Mask with the `--density` override applied.
    fn mask(&self) -> MaskPattern {
        match (self.mask, self.density) {
            (MaskPattern::Arrow { .. }, Some(density)) => MaskPattern::Arrow { density },
            (mask, _) => mask,
        }
    }

    /// Where the matrix comes from, for status output.
    pub fn source(&self) -> String {
        match &self.matrix {
            Some(path) => path.display().to_string(),
            None => format!("{:?} preset", self.preset),
        }
    }
}

/// CSR matrix as stored in a `--matrix` file.
///
/// ```json
/// {"rows": 2, "cols": 2, "row_ptr": [0, 1, 2], "col_indices": [0, 1], "values": [4.0, 9.0]}
/// ```
#[derive(Debug, Deserialize)]
struct CsrFile {
    rows: usize,
    cols: usize,
    row_ptr: Vec<usize>,
    col_indices: Vec<usize>,
    values: Vec<f64>,
}

/// Read and validate a CSR matrix from a JSON file.
pub fn load_csr(path: &Path) -> Result<CsrMatrix<f64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read matrix {}", path.display()))?;
    let file: CsrFile = serde_json::from_str(&text)
        .with_context(|| format!("invalid matrix file {}", path.display()))?;
    CsrMatrix::try_from_parts(file.rows, file.cols, file.row_ptr, file.col_indices, file.values)
        .with_context(|| format!("malformed CSR matrix in {}", path.display()))
}

/// A test matrix in either storage format.
#[derive(Debug, Clone)]
pub enum Operator {
    Dense(DenseMatrix),
    Csr(CsrMatrix<f64>),
}

impl Operator {
    pub fn nnz(&self) -> usize {
        match self {
            Self::Dense(m) => m.nnz(),
            Self::Csr(m) => m.nnz(),
        }
    }

    /// Fraction of stored non-zeros, `nnz / n²`.
    pub fn density(&self) -> f64 {
        let n = self.nrows();
        if n == 0 {
            return 0.0;
        }
        self.nnz() as f64 / (n as f64 * n as f64)
    }

    pub fn format(&self) -> Format {
        match self {
            Self::Dense(_) => Format::Dense,
            Self::Csr(_) => Format::Csr,
        }
    }

    pub fn check_symmetric(&self, tol: f64) -> Result<(), ValidationError> {
        match self {
            Self::Dense(m) => validate_symmetric_dense(m, tol),
            Self::Csr(m) => validate_symmetric_csr(m, tol),
        }
    }
}

impl LinearOperator for Operator {
    fn nrows(&self) -> usize {
        match self {
            Self::Dense(m) => m.nrows(),
            Self::Csr(m) => m.nrows(),
        }
    }

    fn ncols(&self) -> usize {
        match self {
            Self::Dense(m) => m.ncols(),
            Self::Csr(m) => m.ncols(),
        }
    }

    fn apply(&self, x: &[f64], y: &mut [f64]) {
        match self {
            Self::Dense(m) => m.apply(x, y),
            Self::Csr(m) => m.apply(x, y),
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Dense(m) => m.validate(),
            Self::Csr(m) => m.validate(),
        }
    }
}

/// Build the matrix selected by `args`.
///
/// `--matrix` takes precedence over the preset. Returns the provider as well
/// so callers can keep drawing from the same seeded stream (e.g. for a random
/// right-hand side).
pub fn build(args: &SystemArgs) -> Result<(Operator, MatrixProvider)> {
    let mut provider = MatrixProvider::new(args.seed);

    if let Some(path) = &args.matrix {
        let csr = load_csr(path)?;
        let operator = match args.format {
            Format::Dense => Operator::Dense(csr.to_dense()),
            Format::Csr => Operator::Csr(csr),
        };
        tracing::debug!(
            path = %path.display(),
            rows = operator.nrows(),
            nnz = operator.nnz(),
            "loaded matrix file"
        );
        return Ok((operator, provider));
    }

    let n = args.size;
    let operator = match (args.preset, args.format) {
        (Preset::Diagonal, Format::Dense) => Operator::Dense(MatrixProvider::diagonal(n)),
        (Preset::Diagonal, Format::Csr) => Operator::Csr(MatrixProvider::diagonal_csr(n)),
        (Preset::Tridiagonal, Format::Dense) => Operator::Dense(MatrixProvider::tridiagonal(n)),
        (Preset::Tridiagonal, Format::Csr) => Operator::Csr(MatrixProvider::tridiagonal_csr(n)),
        (Preset::Random, Format::Dense) => Operator::Dense(
            provider
                .random_spd(n, args.mask())
                .context("failed to generate random SPD matrix")?,
        ),
        (Preset::Random, Format::Csr) => Operator::Csr(
            provider
                .random_spd_csr(n, args.mask())
                .context("failed to generate random SPD matrix")?,
        ),
    };

    tracing::debug!(
        preset = ?args.preset,
        format = ?args.format,
        size = n,
        nnz = operator.nnz(),
        "built test system"
    );
    Ok((operator, provider))
}

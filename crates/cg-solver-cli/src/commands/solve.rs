//! Solve command implementation
//!
//! Builds the selected preset, assembles the solver configuration from an
//! optional JSON file plus command-line overrides, and solves from `x0 = 0`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;

use cg_solver::cg::ConjugateGradientSolver;
use cg_solver::events::{EventSink, SolverEvent, TracingSink};
use cg_solver::traits::LinearOperator;
use cg_solver::types::{ComputeBudget, SolverResult};
use cg_solver::vector::norm2;

use crate::system::{self, SystemArgs};

/// Right-hand side
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rhs {
    /// All ones
    Ones,
    /// Uniform in [-1, 1), drawn after the matrix from the same seed
    Random,
}

#[derive(Args, Debug, Clone)]
pub struct SolveArgs {
    #[command(flatten)]
    pub system: SystemArgs,

    /// Residual-norm tolerance (overrides --config)
    #[arg(short, long)]
    pub tolerance: Option<f64>,

    /// Iteration cap (overrides --config)
    #[arg(long)]
    pub max_iter: Option<usize>,

    /// Right-hand side
    #[arg(short, long, value_enum, default_value = "ones")]
    pub rhs: Rhs,

    /// Abort the solve after this many milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// JSON solver configuration, e.g. {"tolerance": 1e-8, "max_iterations": 500}
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print solver events to stdout as JSON lines
    #[arg(long)]
    pub events: bool,

    /// Worker threads for matrix-vector products (requires the `parallel` feature)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Check that the matrix is symmetric before solving
    #[arg(long)]
    pub verify_symmetry: bool,
}

/// Writes each event as one JSON object per line.
struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> EventSink for JsonLinesSink<W> {
    fn emit(&mut self, event: SolverEvent) {
        let written = serde_json::to_writer(&mut self.out, &event)
            .map_err(std::io::Error::from)
            .and_then(|()| self.out.write_all(b"\n"));
        if let Err(e) = written {
            tracing::warn!("failed to write solver event: {e}");
        }
    }
}

/// Load a solver configuration and apply command-line overrides.
pub fn load_config(
    path: Option<&Path>,
    tolerance: Option<f64>,
    max_iter: Option<usize>,
) -> Result<ConjugateGradientSolver> {
    let mut solver = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str::<ConjugateGradientSolver>(&text)
                .with_context(|| format!("invalid solver config {}", path.display()))?
        }
        None => ConjugateGradientSolver::default(),
    };

    if let Some(tolerance) = tolerance {
        solver = solver.with_tolerance(tolerance);
    }
    if let Some(max_iter) = max_iter {
        solver = solver.with_max_iterations(max_iter);
    }
    Ok(solver)
}

fn configure_threads(threads: Option<usize>) -> Result<()> {
    let Some(threads) = threads else {
        return Ok(());
    };

    #[cfg(feature = "parallel")]
    {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure the rayon thread pool")?;
        tracing::debug!(threads, "configured rayon thread pool");
    }

    #[cfg(not(feature = "parallel"))]
    tracing::warn!(threads, "--threads ignored: built without the `parallel` feature");

    Ok(())
}

/// Run the solve command
///
/// With `--events`, stdout carries only the JSON-lines event stream and the
/// status lines move to stderr.
pub fn run(args: &SolveArgs) -> Result<()> {
    if args.events {
        let stdout = std::io::stdout();
        let mut sink = JsonLinesSink { out: stdout.lock() };
        execute(args, &mut std::io::stderr(), &mut sink)
    } else {
        execute(args, &mut std::io::stdout(), &mut TracingSink)
    }
}

fn execute<W, S>(args: &SolveArgs, out: &mut W, sink: &mut S) -> Result<()>
where
    W: Write,
    S: EventSink,
{
    configure_threads(args.threads)?;

    let solver = load_config(args.config.as_deref(), args.tolerance, args.max_iter)?;
    let (operator, mut provider) = system::build(&args.system)?;
    let n = operator.nrows();

    if args.verify_symmetry {
        operator
            .check_symmetric(1e-12)
            .context("symmetry check failed")?;
        writeln!(out, "{} Matrix is symmetric", "✓".green().bold())?;
    }

    let rhs = match args.rhs {
        Rhs::Ones => vec![1.0; n],
        Rhs::Random => provider.random_vector(n),
    };
    let x0 = vec![0.0; n];

    let budget = match args.timeout_ms {
        Some(ms) => ComputeBudget::with_max_time(Duration::from_millis(ms)),
        None => ComputeBudget::unbounded(),
    };

    writeln!(
        out,
        "{} Solving {}: n = {}, nnz = {}, format = {:?}",
        "→".green().bold(),
        args.system.source(),
        n,
        operator.nnz(),
        operator.format(),
    )?;
    writeln!(
        out,
        "  tolerance = {:.2e}, max_iterations = {}",
        solver.tolerance(),
        solver.max_iterations()
    )?;

    let result = solver.solve_with(&operator, &rhs, &x0, &budget, sink)?;

    report(out, &result)?;
    Ok(())
}

fn report<W: Write>(out: &mut W, result: &SolverResult) -> std::io::Result<()> {
    if result.converged {
        writeln!(
            out,
            "{} Converged in {} iterations",
            "✓".green().bold(),
            result.iterations.to_string().cyan()
        )?;
    } else {
        writeln!(
            out,
            "{} Stopped after {} iterations without reaching the tolerance",
            "!".yellow().bold(),
            result.iterations.to_string().cyan()
        )?;
    }
    writeln!(out, "  Residual norm: {:.6e}", result.residual_norm)?;
    writeln!(out, "  Solution norm: {:.6e}", norm2(&result.solution))?;
    writeln!(out, "  Wall time:     {:.2?}", result.wall_time)
}

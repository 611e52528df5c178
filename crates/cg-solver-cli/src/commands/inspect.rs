//! Inspect command implementation

use anyhow::Result;
use colored::Colorize;

use cg_solver::traits::LinearOperator;

use crate::system::{self, SystemArgs};

/// Symmetry tolerance used for reporting.
const SYMMETRY_TOL: f64 = 1e-12;

/// Run the inspect command
pub fn run(args: &SystemArgs) -> Result<()> {
    let (operator, _) = system::build(args)?;

    println!("{} {} ({:?})", "→".green().bold(), args.source(), operator.format());
    println!("  Dimension: {}", operator.nrows());
    println!("  Non-zeros: {}", operator.nnz());
    println!("  Density:   {:.4}", operator.density());
    match operator.check_symmetric(SYMMETRY_TOL) {
        Ok(()) => println!("  Symmetric: {}", "yes".green()),
        Err(e) => println!("  Symmetric: {} ({})", "no".red(), e),
    }

    Ok(())
}

//! `cg-solve`: build a test system and solve it with Conjugate Gradient.

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;
mod system;

use commands::solve::SolveArgs;
use system::SystemArgs;

#[derive(Parser)]
#[command(name = "cg-solve")]
#[command(about = "Conjugate Gradient solver for SPD test systems", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a system from a preset and solve it from x0 = 0
    Solve(SolveArgs),

    /// Print dimension, non-zeros, density and symmetry of a preset
    Inspect(SystemArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    if cli.no_color {
        colored::control::set_override(false);
    }

    match cli.command {
        Commands::Solve(args) => commands::solve::run(&args),
        Commands::Inspect(args) => commands::inspect::run(&args),
    }
}

mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::scenarios::{ScenarioArgs, TornadoArgs};
use commands::simulation::SimulateArgs;
use commands::validation::{ConfidenceArgs, StressTestArgs};

/// Monte Carlo uncertainty analysis
#[derive(Parser)]
#[command(
    name = "mcsim",
    version,
    about = "Monte Carlo uncertainty analysis",
    long_about = "Propagate uncertainty through models by Monte Carlo simulation. \
                  Supports correlated sampling, rank-based sensitivity, multi-period \
                  business scenarios, tornado reports, confidence validation and \
                  assumption stress tests. Inputs are JSON or YAML documents read \
                  from --input or stdin."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Emit debug logs to stderr (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a sum of variables, optionally correlated
    Simulate(SimulateArgs),
    /// Run a multi-period business profit scenario
    Scenario(ScenarioArgs),
    /// Rank variables by the swing of their low/high outcomes
    Tornado(TornadoArgs),
    /// Estimate how often a recommendation's success criterion holds
    ValidateConfidence(ConfidenceArgs),
    /// Stress-test an answer against its critical assumptions
    StressTest(StressTestArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Simulate(args) => commands::simulation::run_simulate(args),
        Commands::Scenario(args) => commands::scenarios::run_scenario(args),
        Commands::Tornado(args) => commands::scenarios::run_tornado(args),
        Commands::ValidateConfidence(args) => commands::validation::run_confidence(args),
        Commands::StressTest(args) => commands::validation::run_stress_test(args),
        Commands::Version => {
            println!("mcsim {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            if let Err(e) = output::format_output(&cli.output, &value) {
                tracing::debug!(error = %e, "failed to write output");
                eprintln!("{}: {}", "error".red().bold(), e);
                process::exit(1);
            }
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

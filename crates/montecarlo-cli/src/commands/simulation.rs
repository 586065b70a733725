use clap::Args;
use serde_json::Value;

use montecarlo_core::monte_carlo::simulation::{self, SimulationInput};

use crate::input;

/// Arguments for a generic Monte Carlo simulation
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Override the input's seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the input's number of simulations
    #[arg(long)]
    pub simulations: Option<usize>,
}

pub fn run_simulate(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut sim_input: SimulationInput = input::load(args.input.as_deref(), "simulate")?;
    if let Some(seed) = args.seed {
        sim_input.seed = Some(seed);
    }
    if let Some(n) = args.simulations {
        sim_input.num_simulations = n;
    }
    let result = simulation::run_monte_carlo_simulation(&sim_input)?;
    Ok(serde_json::to_value(result)?)
}

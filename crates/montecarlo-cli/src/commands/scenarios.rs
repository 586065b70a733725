use clap::Args;
use serde_json::Value;

use montecarlo_core::scenarios::business::{self, BusinessScenarioInput};
use montecarlo_core::scenarios::tornado::{self, TornadoInput};

use crate::input;

/// Arguments for a business scenario simulation
#[derive(Args)]
pub struct ScenarioArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Override the input's seed
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for a tornado report
#[derive(Args)]
pub struct TornadoArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_scenario(args: ScenarioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut scenario: BusinessScenarioInput = input::load(args.input.as_deref(), "scenario")?;
    if let Some(seed) = args.seed {
        scenario.seed = Some(seed);
    }
    let result = business::run_business_scenario(&scenario)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_tornado(args: TornadoArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let tornado_input: TornadoInput = input::load(args.input.as_deref(), "tornado")?;
    let result = tornado::run_tornado_analysis(&tornado_input)?;
    Ok(serde_json::to_value(result)?)
}

use clap::Args;
use serde_json::Value;

use montecarlo_core::validation::confidence::{self, ConfidenceInput};
use montecarlo_core::validation::robustness::{self, RobustnessInput};

use crate::input;

/// Arguments for confidence validation
#[derive(Args)]
pub struct ConfidenceArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Override the input's seed
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for an assumption stress test
#[derive(Args)]
pub struct StressTestArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Override the input's seed
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn run_confidence(args: ConfidenceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut conf_input: ConfidenceInput =
        input::load(args.input.as_deref(), "validate-confidence")?;
    if let Some(seed) = args.seed {
        conf_input.seed = Some(seed);
    }
    let result = confidence::validate_reasoning_confidence(&conf_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_stress_test(args: StressTestArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut stress_input: RobustnessInput = input::load(args.input.as_deref(), "stress-test")?;
    if let Some(seed) = args.seed {
        stress_input.seed = Some(seed);
    }
    let result = robustness::test_assumption_robustness(&stress_input)?;
    Ok(serde_json::to_value(result)?)
}

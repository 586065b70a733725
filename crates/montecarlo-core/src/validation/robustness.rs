use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

use crate::config::{check_simulation_count, check_text_length, default_num_scenarios};
use crate::monte_carlo::engine::{MonteCarloEngine, TrialValues};
use crate::monte_carlo::statistics::{percentile_sorted, sorted_copy, std_dev};
use crate::monte_carlo::Variable;
use crate::types::{with_metadata, ComputationOutput};
use crate::McResult;

/// A trial "breaks" the answer when it lands this many standard deviations
/// from the median outcome.
const BREAKING_DEVIATION: f64 = 1.5;

/// Breaking trials reported back, in trial order.
const MAX_BREAKING_POINTS: usize = 5;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobustnessInput {
    pub base_answer: String,
    pub critical_assumptions: Vec<Variable>,
    /// Echoed back; the sampled distributions already carry the ranges.
    #[serde(default)]
    pub stress_test_ranges: serde_json::Value,
    #[serde(default = "default_outcome_description")]
    pub outcome_function_str: String,
    #[serde(default = "default_num_scenarios")]
    pub num_scenarios: usize,
    pub seed: Option<u64>,
}

fn default_outcome_description() -> String {
    "sum of assumption values".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RobustnessQualifier {
    #[serde(rename = "ROBUST")]
    Robust,
    #[serde(rename = "MODERATELY ROBUST")]
    ModeratelyRobust,
    #[serde(rename = "SOMEWHAT FRAGILE")]
    SomewhatFragile,
    #[serde(rename = "FRAGILE")]
    Fragile,
}

impl RobustnessQualifier {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            RobustnessQualifier::Robust
        } else if score >= 0.75 {
            RobustnessQualifier::ModeratelyRobust
        } else if score >= 0.5 {
            RobustnessQualifier::SomewhatFragile
        } else {
            RobustnessQualifier::Fragile
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RobustnessQualifier::Robust => "answer stable across scenarios",
            RobustnessQualifier::ModeratelyRobust => "answer mostly stable",
            RobustnessQualifier::SomewhatFragile => "answer changes in many scenarios",
            RobustnessQualifier::Fragile => "answer highly sensitive to assumptions",
        }
    }
}

impl fmt::Display for RobustnessQualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RobustnessQualifier::Robust => "ROBUST",
            RobustnessQualifier::ModeratelyRobust => "MODERATELY ROBUST",
            RobustnessQualifier::SomewhatFragile => "SOMEWHAT FRAGILE",
            RobustnessQualifier::Fragile => "FRAGILE",
        };
        write!(f, "{label} ({})", self.description())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakingPoint {
    pub scenario: TrialValues,
    pub outcome: f64,
    pub deviation_from_base: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressTestSummary {
    pub stable_scenarios: usize,
    pub unstable_scenarios: usize,
    pub outcome_range: (f64, f64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobustnessOutput {
    pub base_answer: String,
    pub robustness_score: f64,
    pub breaking_points: Vec<BreakingPoint>,
    pub confidence_qualifier: RobustnessQualifier,
    pub interpretation: String,
    pub num_scenarios_tested: usize,
    pub stress_test_summary: StressTestSummary,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Stress-test an answer by sampling its critical assumptions and counting
/// trials whose outcome strays far from the median.
pub fn test_assumption_robustness(
    input: &RobustnessInput,
) -> McResult<ComputationOutput<RobustnessOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    check_text_length("base_answer", &input.base_answer)?;
    check_simulation_count("num_scenarios", input.num_scenarios, None)?;
    if input.critical_assumptions.is_empty() {
        warnings.push("No critical assumptions supplied; every scenario is identical".into());
    }

    let sum_of_values = |values: &TrialValues| -> McResult<f64> { Ok(values.values().sum()) };
    let mut engine = MonteCarloEngine::new(input.seed);
    let results = engine.run_simulation(
        &input.critical_assumptions,
        &sum_of_values,
        input.num_scenarios,
        None,
    )?;

    let outcomes = &results.outcomes;
    let sorted = sorted_copy(outcomes);
    let base = percentile_sorted(&sorted, 50.0);
    let cutoff = std_dev(outcomes) * BREAKING_DEVIATION;

    let mut unstable = 0usize;
    let mut breaking_points = Vec::new();
    for (i, &outcome) in outcomes.iter().enumerate() {
        if (outcome - base).abs() <= cutoff {
            continue;
        }
        unstable += 1;
        if breaking_points.len() < MAX_BREAKING_POINTS {
            let scenario: TrialValues = results
                .samples
                .iter()
                .map(|(name, column)| (name.clone(), column[i]))
                .collect();
            breaking_points.push(BreakingPoint {
                scenario,
                outcome,
                deviation_from_base: outcome - base,
            });
        }
    }

    let total = results.num_simulations;
    let robustness_score = 1.0 - unstable as f64 / total as f64;
    let qualifier = RobustnessQualifier::from_score(robustness_score);

    let output = RobustnessOutput {
        base_answer: input.base_answer.clone(),
        robustness_score,
        breaking_points,
        confidence_qualifier: qualifier,
        interpretation: qualifier.to_string(),
        num_scenarios_tested: total,
        stress_test_summary: StressTestSummary {
            stable_scenarios: total - unstable,
            unstable_scenarios: unstable,
            outcome_range: (results.statistics.min, results.statistics.max),
        },
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions: IndexMap<&str, serde_json::Value> = [
        ("outcome_function", serde_json::json!(input.outcome_function_str)),
        ("stress_test_ranges", input.stress_test_ranges.clone()),
        ("num_scenarios", serde_json::json!(input.num_scenarios)),
        ("seed", serde_json::json!(input.seed)),
    ]
    .into_iter()
    .collect();
    Ok(with_metadata(
        "Monte Carlo Assumption Stress Test (median ± 1.5σ)",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::correlation::CorrelationMatrix;
use super::distribution::Variable;
use super::engine::{MonteCarloEngine, TrialValues};
use super::statistics::{describe, sorted_copy, Percentiles, SummaryStatistics};
use crate::config::{check_simulation_count, default_num_simulations};
use crate::error::McError;
use crate::types::{with_metadata, ComputationOutput};
use crate::McResult;

const HISTOGRAM_BINS: usize = 20;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input for a generic simulation whose outcome is the sum of its variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationInput {
    #[serde(default = "default_num_simulations")]
    pub num_simulations: usize,
    pub seed: Option<u64>,
    pub variables: Vec<Variable>,
    /// Rows follow the order of `variables`.
    pub correlation_matrix: Option<CorrelationMatrix>,
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
}

fn default_confidence_level() -> f64 {
    0.95
}

/// A single histogram bin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
    pub frequency: f64,
}

/// Sample summary for one simulated variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableSummary {
    pub name: String,
    pub distribution: String,
    pub statistics: SummaryStatistics,
    pub percentiles: Percentiles,
    pub histogram: Vec<HistogramBin>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationOutput {
    pub num_simulations: usize,
    pub statistics: SummaryStatistics,
    pub percentiles: Percentiles,
    pub confidence_level: f64,
    pub confidence_interval: (f64, f64),
    pub sensitivity_analysis: IndexMap<String, f64>,
    pub outcome_histogram: Vec<HistogramBin>,
    pub variables: Vec<VariableSummary>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a histogram with `num_bins` equal-width bins over a sorted,
/// non-empty slice.
pub fn build_histogram(sorted: &[f64], num_bins: usize) -> Vec<HistogramBin> {
    let (Some(&min_val), Some(&max_val)) = (sorted.first(), sorted.last()) else {
        return Vec::new();
    };

    if num_bins == 0 || (max_val - min_val).abs() < f64::EPSILON {
        return vec![HistogramBin {
            lower: min_val,
            upper: max_val,
            count: sorted.len(),
            frequency: 1.0,
        }];
    }

    let bin_width = (max_val - min_val) / num_bins as f64;
    let n = sorted.len() as f64;

    let mut bins: Vec<HistogramBin> = (0..num_bins)
        .map(|i| HistogramBin {
            lower: min_val + i as f64 * bin_width,
            upper: if i == num_bins - 1 {
                max_val
            } else {
                min_val + (i + 1) as f64 * bin_width
            },
            count: 0,
            frequency: 0.0,
        })
        .collect();

    for &val in sorted {
        let idx = (((val - min_val) / bin_width).floor() as usize).min(num_bins - 1);
        bins[idx].count += 1;
    }
    for bin in &mut bins {
        bin.frequency = bin.count as f64 / n;
    }
    bins
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run a simulation over `input.variables`, optionally correlated, with the
/// per-trial outcome defined as the sum of the sampled values.
///
/// Reports outcome statistics, the requested confidence interval, rank
/// sensitivity and a 20-bin histogram for the outcome and each variable.
pub fn run_monte_carlo_simulation(
    input: &SimulationInput,
) -> McResult<ComputationOutput<SimulationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    check_simulation_count("num_simulations", input.num_simulations, None)?;
    if input.variables.is_empty() {
        return Err(McError::invalid("variables", "at least one variable is required"));
    }
    if input.num_simulations < 100 {
        warnings.push(format!(
            "Only {} simulations; percentiles will be noisy",
            input.num_simulations
        ));
    }

    let sum_of_values = |values: &TrialValues| -> McResult<f64> { Ok(values.values().sum()) };
    let mut engine = MonteCarloEngine::new(input.seed);
    let results = engine.run_simulation(
        &input.variables,
        &sum_of_values,
        input.num_simulations,
        input.correlation_matrix.as_ref(),
    )?;

    let confidence_interval = results.confidence_interval(input.confidence_level)?;
    let sensitivity = engine.sensitivity_analysis(
        &input.variables,
        &sum_of_values,
        &results.outcomes,
        &results.samples,
    )?;

    let mut variables = Vec::with_capacity(input.variables.len());
    for var in &input.variables {
        let Some(column) = results.samples.get(var.name()) else {
            continue;
        };
        let (statistics, percentiles) = describe(column)?;
        variables.push(VariableSummary {
            name: var.name().to_string(),
            distribution: var.kind().to_string(),
            statistics,
            percentiles,
            histogram: build_histogram(&sorted_copy(column), HISTOGRAM_BINS),
        });
    }

    let output = SimulationOutput {
        num_simulations: results.num_simulations,
        statistics: results.statistics,
        percentiles: results.percentiles,
        confidence_level: input.confidence_level,
        confidence_interval,
        sensitivity_analysis: sensitivity,
        outcome_histogram: build_histogram(&sorted_copy(&results.outcomes), HISTOGRAM_BINS),
        variables,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monte Carlo Simulation (sum of variables)",
        &serde_json::json!({
            "num_simulations": input.num_simulations,
            "seed": input.seed,
            "correlated": input.correlation_matrix.is_some(),
            "confidence_level": input.confidence_level,
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn base_input() -> SimulationInput {
        SimulationInput {
            num_simulations: 10_000,
            seed: Some(42),
            variables: vec![
                Variable::normal("revenue", 100.0, 10.0).unwrap(),
                Variable::uniform("cost", -60.0, -40.0).unwrap(),
            ],
            correlation_matrix: None,
            confidence_level: 0.95,
        }
    }

    #[test]
    fn test_sum_mean() {
        let out = run_monte_carlo_simulation(&base_input()).unwrap().result;
        assert!((out.statistics.mean - 50.0).abs() < 0.5);
        assert_eq!(out.variables.len(), 2);
        assert_eq!(out.variables[0].distribution, "normal");
        assert!((out.variables[1].statistics.mean + 50.0).abs() < 0.2);
    }

    #[test]
    fn test_interval_brackets_median() {
        let out = run_monte_carlo_simulation(&base_input()).unwrap().result;
        let (lo, hi) = out.confidence_interval;
        assert!(lo < out.percentiles.p50 && out.percentiles.p50 < hi);
        assert_eq!(out.sensitivity_analysis.keys().next().unwrap(), "revenue");
    }

    #[test]
    fn test_histograms_cover_all_trials() {
        let out = run_monte_carlo_simulation(&base_input()).unwrap().result;
        assert_eq!(out.outcome_histogram.len(), HISTOGRAM_BINS);
        let total: usize = out.outcome_histogram.iter().map(|b| b.count).sum();
        assert_eq!(total, 10_000);
        for v in &out.variables {
            let freq: f64 = v.histogram.iter().map(|b| b.frequency).sum();
            assert!((freq - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_correlated_input() {
        let mut input = base_input();
        input.correlation_matrix =
            Some(CorrelationMatrix::from_rows(&[vec![1.0, 0.8], vec![0.8, 1.0]]).unwrap());
        let correlated = run_monte_carlo_simulation(&input).unwrap().result;
        let independent = run_monte_carlo_simulation(&base_input()).unwrap().result;
        // Positive dependence widens the spread of the sum
        assert!(correlated.statistics.std > independent.statistics.std);
    }

    #[test]
    fn test_empty_variables_rejected() {
        let mut input = base_input();
        input.variables.clear();
        assert!(run_monte_carlo_simulation(&input).is_err());
    }

    #[test]
    fn test_bad_confidence_level_rejected() {
        let mut input = base_input();
        input.confidence_level = 1.0;
        assert!(run_monte_carlo_simulation(&input).is_err());
    }

    #[test]
    fn test_small_run_warns() {
        let mut input = base_input();
        input.num_simulations = 50;
        let out = run_monte_carlo_simulation(&input).unwrap();
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_histogram_constant() {
        let bins = build_histogram(&[2.0, 2.0, 2.0], 20);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].count, 3);
        assert!(build_histogram(&[], 20).is_empty());
    }

    #[test]
    fn test_input_from_json() {
        let input: SimulationInput = serde_json::from_str(
            r#"{
                "seed": 7,
                "variables": [
                    {"name": "a", "distribution": "normal", "params": {"mean": 0, "std": 1}},
                    {"name": "b", "distribution": "gamma", "params": {"shape": 2, "scale": 1}}
                ],
                "correlation_matrix": [[1.0, 0.3], [0.3, 1.0]]
            }"#,
        )
        .unwrap();
        assert_eq!(input.num_simulations, 10_000);
        assert_eq!(input.confidence_level, 0.95);
        assert_eq!(input.correlation_matrix.unwrap().dim(), 2);
    }
}

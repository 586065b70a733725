use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::{check_simulation_count, check_text_length, default_num_simulations};
use crate::error::McError;
use crate::monte_carlo::engine::{MonteCarloEngine, OutcomeModel, TrialValues};
use crate::monte_carlo::statistics::{percentile_sorted, sorted_copy, SummaryStatistics};
use crate::monte_carlo::Variable;
use crate::types::{with_metadata, ComputationOutput};
use crate::McResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Mean and standard deviation of a normally distributed rate. Missing
/// fields fall back to the defaults of the rate they describe.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RateAssumption {
    pub mean: Option<f64>,
    pub std: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueAssumptions {
    #[serde(default = "default_base_revenue")]
    pub base_revenue: f64,
    /// Per-period revenue growth rate.
    pub growth_rate: Option<RateAssumption>,
    /// Per-period share of revenue lost.
    pub churn_rate: Option<RateAssumption>,
    /// Enables ROI analysis when present.
    pub initial_investment: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostStructure {
    #[serde(default = "default_fixed_costs")]
    pub fixed_costs: f64,
    /// Variable costs as a fraction of revenue.
    pub variable_costs: Option<RateAssumption>,
}

/// Input for a multi-period business scenario simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessScenarioInput {
    pub scenario_name: String,
    pub revenue_assumptions: RevenueAssumptions,
    pub cost_structure: CostStructure,
    /// Number of periods (months, quarters or years).
    pub time_horizon: i64,
    #[serde(default = "default_num_simulations")]
    pub num_simulations: usize,
    pub seed: Option<u64>,
}

fn default_base_revenue() -> f64 {
    100_000.0
}

fn default_fixed_costs() -> f64 {
    50_000.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PercentileOutcomes {
    #[serde(rename = "pessimistic_P10")]
    pub pessimistic_p10: f64,
    #[serde(rename = "most_likely_P50")]
    pub most_likely_p50: f64,
    #[serde(rename = "optimistic_P90")]
    pub optimistic_p90: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub downside_risk: f64,
    pub upside_potential: f64,
    pub outcome_range: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoiAnalysis {
    pub mean_roi: f64,
    pub median_roi: f64,
    pub prob_positive_roi: f64,
}

/// Output of a business scenario simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessScenarioOutput {
    pub scenario_name: String,
    pub time_horizon: u32,
    pub expected_total_profit: f64,
    /// Share of trials with a strictly positive total profit.
    pub probability_of_profitability: f64,
    pub percentile_outcomes: PercentileOutcomes,
    pub risk_metrics: RiskMetrics,
    pub roi_analysis: Option<RoiAnalysis>,
    pub statistics: SummaryStatistics,
    pub num_simulations: usize,
    pub sensitivity: IndexMap<String, f64>,
    pub interpretation: String,
}

// ---------------------------------------------------------------------------
// Profit model
// ---------------------------------------------------------------------------

/// Compounded multi-period profit.
///
/// Each period revenue becomes `revenue * (1 + growth) * (1 - churn)` and
/// contributes `revenue - (fixed_costs + revenue * variable_cost_pct)`.
#[derive(Debug, Clone, Copy)]
pub struct ProfitModel {
    pub base_revenue: f64,
    pub fixed_costs: f64,
    pub time_horizon: u32,
}

impl ProfitModel {
    pub fn total_profit(&self, growth_rate: f64, variable_cost_pct: f64, churn_rate: f64) -> f64 {
        let mut total_profit = 0.0;
        let mut revenue = self.base_revenue;
        for _ in 0..self.time_horizon {
            revenue = revenue * (1.0 + growth_rate) * (1.0 - churn_rate);
            let total_costs = self.fixed_costs + revenue * variable_cost_pct;
            total_profit += revenue - total_costs;
        }
        total_profit
    }

    /// Profit for one trial's sampled rates; absent rates use their defaults.
    pub fn trial_profit(&self, values: &TrialValues) -> f64 {
        let get = |name: &str, default: f64| values.get(name).copied().unwrap_or(default);
        self.total_profit(
            get("growth_rate", 0.05),
            get("variable_cost_pct", 0.5),
            get("churn_rate", 0.0),
        )
    }
}

impl OutcomeModel for ProfitModel {
    fn evaluate(&self, values: &TrialValues) -> McResult<f64> {
        Ok(self.trial_profit(values))
    }
}

/// Total profit of a single trial outside of a full scenario run.
pub fn scenario_outcome(
    base_revenue: f64,
    fixed_costs: f64,
    time_horizon: u32,
    values: &TrialValues,
) -> f64 {
    ProfitModel {
        base_revenue,
        fixed_costs,
        time_horizon,
    }
    .trial_profit(values)
}

fn rate_variable(
    name: &str,
    rate: &RateAssumption,
    default_mean: f64,
    default_std: f64,
) -> McResult<Variable> {
    Variable::normal(
        name,
        rate.mean.unwrap_or(default_mean),
        rate.std.unwrap_or(default_std),
    )
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Simulate total profit over `time_horizon` periods with uncertain growth,
/// variable costs and churn.
pub fn run_business_scenario(
    input: &BusinessScenarioInput,
) -> McResult<ComputationOutput<BusinessScenarioOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    // Validation
    if input.time_horizon <= 0 {
        return Err(McError::invalid(
            "time_horizon",
            format!("must be positive, got {}", input.time_horizon),
        ));
    }
    let time_horizon = u32::try_from(input.time_horizon)
        .map_err(|_| McError::invalid("time_horizon", "too large"))?;
    check_simulation_count("num_simulations", input.num_simulations, None)?;
    check_text_length("scenario_name", &input.scenario_name)?;

    let revenue = &input.revenue_assumptions;
    let costs = &input.cost_structure;
    if let Some(inv) = revenue.initial_investment {
        if inv <= 0.0 {
            return Err(McError::invalid(
                "initial_investment",
                format!("must be positive, got {inv}"),
            ));
        }
    }

    let mut variables = Vec::new();
    if let Some(gr) = &revenue.growth_rate {
        variables.push(rate_variable("growth_rate", gr, 0.05, 0.02)?);
    }
    if let Some(vc) = &costs.variable_costs {
        variables.push(rate_variable("variable_cost_pct", vc, 0.5, 0.1)?);
    }
    if let Some(cr) = &revenue.churn_rate {
        variables.push(rate_variable("churn_rate", cr, 0.1, 0.03)?);
    }
    if variables.is_empty() {
        warnings.push("No uncertain assumptions supplied; every trial is identical".into());
    }

    let model = ProfitModel {
        base_revenue: revenue.base_revenue,
        fixed_costs: costs.fixed_costs,
        time_horizon,
    };

    let mut engine = MonteCarloEngine::new(input.seed);
    let results = engine.run_simulation(&variables, &model, input.num_simulations, None)?;
    let outcomes = &results.outcomes;
    let n = outcomes.len() as f64;

    let profit_probability = outcomes.iter().filter(|&&o| o > 0.0).count() as f64 / n;

    let roi_analysis = revenue.initial_investment.map(|inv| {
        let roi: Vec<f64> = outcomes.iter().map(|o| (o - inv) / inv).collect();
        let sorted = sorted_copy(&roi);
        RoiAnalysis {
            mean_roi: roi.iter().sum::<f64>() / n,
            median_roi: percentile_sorted(&sorted, 50.0),
            prob_positive_roi: roi.iter().filter(|&&r| r > 0.0).count() as f64 / n,
        }
    });

    let p = results.percentiles;
    let sensitivity =
        engine.sensitivity_analysis(&variables, &model, outcomes, &results.samples)?;

    let interpretation = interpret_scenario_results(
        profit_probability,
        results.statistics.mean,
        roi_analysis.as_ref(),
    );

    let output = BusinessScenarioOutput {
        scenario_name: input.scenario_name.clone(),
        time_horizon,
        expected_total_profit: results.statistics.mean,
        probability_of_profitability: profit_probability,
        percentile_outcomes: PercentileOutcomes {
            pessimistic_p10: p.p10,
            most_likely_p50: p.p50,
            optimistic_p90: p.p90,
        },
        risk_metrics: RiskMetrics {
            downside_risk: p.p10,
            upside_potential: p.p90,
            outcome_range: p.p90 - p.p10,
        },
        roi_analysis,
        statistics: results.statistics,
        num_simulations: results.num_simulations,
        sensitivity,
        interpretation,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monte Carlo Business Scenario",
        &serde_json::json!({
            "base_revenue": revenue.base_revenue,
            "fixed_costs": costs.fixed_costs,
            "time_horizon": time_horizon,
            "num_simulations": input.num_simulations,
            "seed": input.seed,
            "variables": variables.iter().map(|v| v.name()).collect::<Vec<_>>(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// One-sentence reading of a scenario's profitability and ROI.
pub fn interpret_scenario_results(
    profit_prob: f64,
    expected_profit: f64,
    roi: Option<&RoiAnalysis>,
) -> String {
    let mut parts = Vec::new();

    let pct = profit_prob * 100.0;
    if profit_prob >= 0.8 {
        parts.push(format!("HIGH probability ({pct:.0}%) of profitability"));
    } else if profit_prob >= 0.6 {
        parts.push(format!("MODERATE probability ({pct:.0}%) of profitability"));
    } else {
        parts.push(format!("LOW probability ({pct:.0}%) of profitability"));
    }

    if expected_profit > 0.0 {
        parts.push(format!(
            "with expected profit of ${}",
            format_thousands(expected_profit)
        ));
    } else {
        parts.push(format!(
            "with expected LOSS of ${}",
            format_thousands(expected_profit.abs())
        ));
    }

    if let Some(roi) = roi {
        let roi_pct = roi.prob_positive_roi * 100.0;
        if roi.prob_positive_roi >= 0.7 {
            parts.push(format!("Strong ROI potential ({roi_pct:.0}% prob)"));
        } else {
            parts.push(format!("Limited ROI potential ({roi_pct:.0}% prob)"));
        }
    }

    parts.join(". ")
}

/// Round to a whole number and group digits with commas: `1234567.8` → `1,234,568`.
fn format_thousands(value: f64) -> String {
    if !value.is_finite() {
        return format!("{value}");
    }
    let rounded = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (i, ch) in rounded.chars().enumerate() {
        if i > 0 && (rounded.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0.0 && rounded != "0" {
        format!("-{grouped}")
    } else {
        grouped
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

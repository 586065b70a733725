use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

use crate::config::{
    check_simulation_count, check_text_length, default_num_simulations, MAX_ASSUMPTIONS,
    MAX_SIMULATIONS,
};
use crate::error::McError;
use crate::monte_carlo::engine::{MonteCarloEngine, OutcomeModel, TrialValues};
use crate::monte_carlo::statistics::{Percentiles, SummaryStatistics};
use crate::monte_carlo::Variable;
use crate::types::{with_metadata, ComputationOutput};
use crate::McResult;

/// Variables whose squared rank correlation with the outcome exceeds this
/// are reported as key risks.
const KEY_RISK_THRESHOLD: f64 = 0.15;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One uncertain assumption. Entries missing either `distribution` or
/// `params` are treated as fixed context and not simulated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assumption {
    pub distribution: Option<String>,
    pub params: Option<BTreeMap<String, f64>>,
    /// Point estimate the caller started from; informational.
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    #[default]
    #[serde(rename = ">=")]
    AtLeast,
    #[serde(rename = ">")]
    Above,
    #[serde(rename = "<=")]
    AtMost,
    #[serde(rename = "<")]
    Below,
}

impl Comparison {
    pub fn holds(&self, outcome: f64, threshold: f64) -> bool {
        match self {
            Comparison::AtLeast => outcome >= threshold,
            Comparison::Above => outcome > threshold,
            Comparison::AtMost => outcome <= threshold,
            Comparison::Below => outcome < threshold,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessCriteria {
    pub threshold: f64,
    #[serde(default)]
    pub comparison: Comparison,
    /// Label of the measured quantity (revenue, profit, ...).
    pub metric: Option<String>,
}

/// Input for confidence validation of a recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceInput {
    pub decision_context: String,
    pub assumptions: IndexMap<String, Assumption>,
    pub success_criteria: SuccessCriteria,
    #[serde(default = "default_num_simulations")]
    pub num_simulations: usize,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceQualifier {
    #[serde(rename = "VERY HIGH")]
    VeryHigh,
    #[serde(rename = "HIGH")]
    High,
    #[serde(rename = "MODERATE")]
    Moderate,
    #[serde(rename = "LOW")]
    Low,
    #[serde(rename = "VERY LOW")]
    VeryLow,
}

impl ConfidenceQualifier {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.9 {
            ConfidenceQualifier::VeryHigh
        } else if confidence >= 0.75 {
            ConfidenceQualifier::High
        } else if confidence >= 0.6 {
            ConfidenceQualifier::Moderate
        } else if confidence >= 0.4 {
            ConfidenceQualifier::Low
        } else {
            ConfidenceQualifier::VeryLow
        }
    }
}

impl fmt::Display for ConfidenceQualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConfidenceQualifier::VeryHigh => "VERY HIGH",
            ConfidenceQualifier::High => "HIGH",
            ConfidenceQualifier::Moderate => "MODERATE",
            ConfidenceQualifier::Low => "LOW",
            ConfidenceQualifier::VeryLow => "VERY LOW",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskFactor {
    pub variable: String,
    pub influence: f64,
    pub description: String,
    pub distribution: Option<String>,
}

/// Output of confidence validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceOutput {
    pub decision_context: String,
    /// Share of trials meeting the success criterion.
    pub confidence_level: f64,
    pub confidence_qualifier: ConfidenceQualifier,
    pub expected_outcome: f64,
    pub percentiles: Percentiles,
    /// Central 90% band, `[P5, P95]`.
    pub central_90_interval: (f64, f64),
    /// Two-sided 95% percentile interval.
    pub confidence_interval_95: (f64, f64),
    pub sensitivity_analysis: IndexMap<String, f64>,
    pub key_risk_factors: Vec<RiskFactor>,
    pub num_simulations: usize,
    pub success_threshold: f64,
    pub statistics: SummaryStatistics,
}

// ---------------------------------------------------------------------------
// Outcome model
// ---------------------------------------------------------------------------

/// `market_size * conversion_rate * price` (or `* revenue_per_customer`)
/// when those assumptions exist, otherwise the sum of all values.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionModel;

impl OutcomeModel for DecisionModel {
    fn evaluate(&self, values: &TrialValues) -> McResult<f64> {
        if let (Some(market), Some(conversion)) =
            (values.get("market_size"), values.get("conversion_rate"))
        {
            if let Some(price) = values.get("price") {
                return Ok(market * conversion * price);
            }
            if let Some(rpc) = values.get("revenue_per_customer") {
                return Ok(market * conversion * rpc);
            }
        }
        Ok(values.values().sum())
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Estimate how often a recommendation's success criterion holds under the
/// stated assumptions.
pub fn validate_reasoning_confidence(
    input: &ConfidenceInput,
) -> McResult<ComputationOutput<ConfidenceOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    // Validation
    check_text_length("decision_context", &input.decision_context)?;
    if input.assumptions.len() > MAX_ASSUMPTIONS {
        return Err(McError::invalid(
            "assumptions",
            format!("too many assumptions (max {MAX_ASSUMPTIONS})"),
        ));
    }
    check_simulation_count("num_simulations", input.num_simulations, Some(MAX_SIMULATIONS))?;

    let mut variables = Vec::with_capacity(input.assumptions.len());
    for (name, assumption) in &input.assumptions {
        match (&assumption.distribution, &assumption.params) {
            (Some(kind), Some(params)) => {
                variables.push(Variable::from_params(name.as_str(), kind, params)?)
            }
            _ => warnings.push(format!(
                "Assumption '{name}' has no distribution/params and was not simulated"
            )),
        }
    }

    let model = DecisionModel;
    let mut engine = MonteCarloEngine::new(input.seed);
    let results = engine.run_simulation(&variables, &model, input.num_simulations, None)?;

    let criteria = &input.success_criteria;
    let successes = results
        .outcomes
        .iter()
        .filter(|&&o| criteria.comparison.holds(o, criteria.threshold))
        .count();
    let confidence_level = successes as f64 / results.num_simulations as f64;

    let sensitivity =
        engine.sensitivity_analysis(&variables, &model, &results.outcomes, &results.samples)?;
    let key_risk_factors = identify_key_risks(&sensitivity, &input.assumptions, KEY_RISK_THRESHOLD);
    let confidence_interval_95 = results.confidence_interval(0.95)?;

    let output = ConfidenceOutput {
        decision_context: input.decision_context.clone(),
        confidence_level,
        confidence_qualifier: ConfidenceQualifier::from_confidence(confidence_level),
        expected_outcome: results.statistics.mean,
        percentiles: results.percentiles,
        central_90_interval: (results.percentiles.p5, results.percentiles.p95),
        confidence_interval_95,
        sensitivity_analysis: sensitivity,
        key_risk_factors,
        num_simulations: results.num_simulations,
        success_threshold: criteria.threshold,
        statistics: results.statistics,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monte Carlo Confidence Validation",
        &serde_json::json!({
            "num_simulations": input.num_simulations,
            "seed": input.seed,
            "success_criteria": criteria,
            "variables": variables.iter().map(|v| v.name()).collect::<Vec<_>>(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Variables whose influence exceeds `threshold`, in sensitivity order.
pub fn identify_key_risks(
    sensitivity: &IndexMap<String, f64>,
    assumptions: &IndexMap<String, Assumption>,
    threshold: f64,
) -> Vec<RiskFactor> {
    sensitivity
        .iter()
        .filter(|(_, &influence)| influence > threshold)
        .map(|(name, &influence)| RiskFactor {
            variable: name.clone(),
            influence,
            description: format!("{name} has {:.1}% influence on outcome", influence * 100.0),
            distribution: assumptions.get(name).and_then(|a| a.distribution.clone()),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: u64 = 42;

    fn assumption(kind: &str, params: &[(&str, f64)]) -> Assumption {
        Assumption {
            distribution: Some(kind.into()),
            params: Some(params.iter().map(|(k, v)| (k.to_string(), *v)).collect()),
            value: None,
        }
    }

    fn market_input(threshold: f64, comparison: Comparison) -> ConfidenceInput {
        let mut assumptions = IndexMap::new();
        assumptions.insert(
            "market_size".to_string(),
            assumption("normal", &[("mean", 500_000.0), ("std", 100_000.0)]),
        );
        assumptions.insert(
            "conversion_rate".to_string(),
            assumption("uniform", &[("min", 0.01), ("max", 0.03)]),
        );
        assumptions.insert(
            "price".to_string(),
            assumption("triangular", &[("left", 40.0), ("mode", 50.0), ("right", 60.0)]),
        );
        ConfidenceInput {
            decision_context: "Launch product".into(),
            assumptions,
            success_criteria: SuccessCriteria {
                threshold,
                comparison,
                metric: Some("revenue".into()),
            },
            num_simulations: 5_000,
            seed: Some(SEED),
        }
    }

    #[test]
    fn test_qualifier_buckets() {
        assert_eq!(ConfidenceQualifier::from_confidence(0.95), ConfidenceQualifier::VeryHigh);
        assert_eq!(ConfidenceQualifier::from_confidence(0.9), ConfidenceQualifier::VeryHigh);
        assert_eq!(ConfidenceQualifier::from_confidence(0.8), ConfidenceQualifier::High);
        assert_eq!(ConfidenceQualifier::from_confidence(0.6), ConfidenceQualifier::Moderate);
        assert_eq!(ConfidenceQualifier::from_confidence(0.5), ConfidenceQualifier::Low);
        assert_eq!(ConfidenceQualifier::from_confidence(0.1), ConfidenceQualifier::VeryLow);
        assert_eq!(ConfidenceQualifier::VeryHigh.to_string(), "VERY HIGH");
    }

    #[test]
    fn test_decision_model_product() {
        let values: TrialValues = [
            ("market_size".to_string(), 1000.0),
            ("conversion_rate".to_string(), 0.1),
            ("revenue_per_customer".to_string(), 20.0),
        ]
        .into_iter()
        .collect();
        assert!((DecisionModel.evaluate(&values).unwrap() - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn test_decision_model_falls_back_to_sum() {
        let values: TrialValues = [("a".to_string(), 1.5), ("b".to_string(), 2.5)]
            .into_iter()
            .collect();
        assert_eq!(DecisionModel.evaluate(&values).unwrap(), 4.0);
    }

    #[test]
    fn test_easy_threshold_very_high_confidence() {
        let out = validate_reasoning_confidence(&market_input(1.0, Comparison::AtLeast))
            .unwrap()
            .result;
        assert_eq!(out.confidence_level, 1.0);
        assert_eq!(out.confidence_qualifier, ConfidenceQualifier::VeryHigh);
    }

    #[test]
    fn test_comparisons_are_complementary() {
        // Expected revenue ≈ 500k * 0.02 * 50 = 500k
        let above = validate_reasoning_confidence(&market_input(500_000.0, Comparison::Above))
            .unwrap()
            .result;
        let at_most = validate_reasoning_confidence(&market_input(500_000.0, Comparison::AtMost))
            .unwrap()
            .result;
        assert!((above.confidence_level + at_most.confidence_level - 1.0).abs() < 1e-12);
        assert!(above.confidence_level > 0.2 && above.confidence_level < 0.8);
    }

    #[test]
    fn test_intervals_and_sensitivity() {
        let out = validate_reasoning_confidence(&market_input(400_000.0, Comparison::AtLeast))
            .unwrap()
            .result;
        let (lo90, hi90) = out.central_90_interval;
        let (lo95, hi95) = out.confidence_interval_95;
        assert!(lo95 <= lo90 && hi90 <= hi95);
        assert_eq!(out.sensitivity_analysis.len(), 3);
        // conversion rate has the widest relative spread
        assert_eq!(out.sensitivity_analysis.keys().next().unwrap(), "conversion_rate");
        assert!(out
            .key_risk_factors
            .iter()
            .any(|r| r.variable == "conversion_rate" && r.distribution.as_deref() == Some("uniform")));
    }

    #[test]
    fn test_reproducible_with_seed() {
        let a = validate_reasoning_confidence(&market_input(450_000.0, Comparison::AtLeast)).unwrap();
        let b = validate_reasoning_confidence(&market_input(450_000.0, Comparison::AtLeast)).unwrap();
        assert_eq!(a.result.confidence_level, b.result.confidence_level);
        assert_eq!(a.result.expected_outcome, b.result.expected_outcome);
    }

    #[test]
    fn test_assumption_without_distribution_skipped() {
        let mut input = market_input(0.0, Comparison::AtLeast);
        input.assumptions.insert(
            "note".to_string(),
            Assumption {
                distribution: None,
                params: None,
                value: Some(3.0),
            },
        );
        let out = validate_reasoning_confidence(&input).unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert!(!out.result.sensitivity_analysis.contains_key("note"));
    }

    #[test]
    fn test_limits() {
        let mut input = market_input(0.0, Comparison::AtLeast);
        input.num_simulations = MAX_SIMULATIONS + 1;
        assert!(validate_reasoning_confidence(&input).is_err());

        let mut input = market_input(0.0, Comparison::AtLeast);
        input.decision_context = "d".repeat(501);
        assert!(validate_reasoning_confidence(&input).is_err());

        let mut input = market_input(0.0, Comparison::AtLeast);
        for i in 0..MAX_ASSUMPTIONS {
            input
                .assumptions
                .insert(format!("extra_{i}"), assumption("normal", &[("mean", 0.0), ("std", 1.0)]));
        }
        assert!(validate_reasoning_confidence(&input).is_err());
    }

    #[test]
    fn test_bad_distribution_surfaces() {
        let mut input = market_input(0.0, Comparison::AtLeast);
        input
            .assumptions
            .insert("x".to_string(), assumption("poisson", &[("lambda", 1.0)]));
        assert!(matches!(
            validate_reasoning_confidence(&input),
            Err(McError::UnsupportedDistributionKind(_))
        ));

        let mut input = market_input(0.0, Comparison::AtLeast);
        input
            .assumptions
            .insert("y".to_string(), assumption("normal", &[("mean", 1.0)]));
        assert!(matches!(
            validate_reasoning_confidence(&input),
            Err(McError::MissingParameter { .. })
        ));
    }

    #[test]
    fn test_comparison_from_json() {
        let c: SuccessCriteria = serde_json::from_str(r#"{"threshold": 5, "comparison": "<"}"#).unwrap();
        assert_eq!(c.comparison, Comparison::Below);
        let d: SuccessCriteria = serde_json::from_str(r#"{"threshold": 5}"#).unwrap();
        assert_eq!(d.comparison, Comparison::AtLeast);
        assert!(serde_json::from_str::<SuccessCriteria>(r#"{"threshold": 5, "comparison": "=="}"#).is_err());
    }
}

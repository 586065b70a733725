use montecarlo_core::scenarios::business::{
    run_business_scenario, BusinessScenarioInput, CostStructure, RateAssumption,
    RevenueAssumptions,
};
use montecarlo_core::scenarios::tornado::{run_tornado_analysis, TornadoInput};
use montecarlo_core::validation::confidence::{validate_reasoning_confidence, ConfidenceInput};
use montecarlo_core::validation::robustness::{test_assumption_robustness, RobustnessInput};

// ===========================================================================
// Business scenario
// ===========================================================================

fn saas_launch(churn_mean: f64) -> BusinessScenarioInput {
    BusinessScenarioInput {
        scenario_name: "SaaS launch".into(),
        revenue_assumptions: RevenueAssumptions {
            base_revenue: 100_000.0,
            growth_rate: Some(RateAssumption {
                mean: Some(0.05),
                std: Some(0.02),
            }),
            churn_rate: Some(RateAssumption {
                mean: Some(churn_mean),
                std: Some(0.0),
            }),
            initial_investment: Some(200_000.0),
        },
        cost_structure: CostStructure {
            fixed_costs: 30_000.0,
            variable_costs: Some(RateAssumption {
                mean: Some(0.4),
                std: Some(0.05),
            }),
        },
        time_horizon: 12,
        num_simulations: 5_000,
        seed: Some(42),
    }
}

#[test]
fn test_business_scenario_reproducible() {
    let a = run_business_scenario(&saas_launch(0.05)).unwrap().result;
    let b = run_business_scenario(&saas_launch(0.05)).unwrap().result;
    assert_eq!(a.expected_total_profit, b.expected_total_profit);
    assert_eq!(a.probability_of_profitability, b.probability_of_profitability);
}

#[test]
fn test_full_churn_worse_than_none() {
    let none = run_business_scenario(&saas_launch(0.0)).unwrap().result;
    let full = run_business_scenario(&saas_launch(1.0)).unwrap().result;
    assert!(full.expected_total_profit < none.expected_total_profit);
    assert!(full.probability_of_profitability <= none.probability_of_profitability);
}

#[test]
fn test_business_scenario_from_json_defaults() {
    let input: BusinessScenarioInput = serde_json::from_str(
        r#"{
            "scenario_name": "Defaults",
            "revenue_assumptions": {},
            "cost_structure": {},
            "time_horizon": 6,
            "num_simulations": 500,
            "seed": 1
        }"#,
    )
    .unwrap();
    let out = run_business_scenario(&input).unwrap().result;
    assert_eq!(out.time_horizon, 6);
    assert_eq!(out.num_simulations, 500);
    assert!(out.roi_analysis.is_none());
}

// ===========================================================================
// Tornado
// ===========================================================================

#[test]
fn test_tornado_from_json() {
    let input: TornadoInput = serde_json::from_str(
        r#"{
            "base_simulation_id": "sim-1",
            "variables_to_test": ["price", "volume", "cost"],
            "variation_range": {
                "price": {"low": 80, "high": 120},
                "volume": {"low": 50, "high": 200},
                "cost": {"low": 90}
            }
        }"#,
    )
    .unwrap();
    let out = run_tornado_analysis(&input).unwrap();
    assert_eq!(out.result.key_drivers, vec!["volume", "price"]);
    assert_eq!(out.result.num_variables_tested, 3);
    assert!(!out.warnings.is_empty());
}

// ===========================================================================
// Validation
// ===========================================================================

#[test]
fn test_confidence_from_json() {
    let input: ConfidenceInput = serde_json::from_str(
        r#"{
            "decision_context": "Enter the mid-market segment",
            "assumptions": {
                "market_size": {"distribution": "normal", "params": {"mean": 10000, "std": 1000}},
                "conversion_rate": {"distribution": "beta", "params": {"a": 2, "b": 38}},
                "price": {"distribution": "lognormal", "params": {"mean": 4.6, "sigma": 0.1}}
            },
            "success_criteria": {"threshold": 1, "comparison": ">"},
            "num_simulations": 2000,
            "seed": 5
        }"#,
    )
    .unwrap();
    let out = validate_reasoning_confidence(&input).unwrap().result;
    assert!(out.confidence_level > 0.9);
    assert_eq!(out.num_simulations, 2_000);
    assert_eq!(out.sensitivity_analysis.len(), 3);
}

#[test]
fn test_robustness_from_json() {
    let input: RobustnessInput = serde_json::from_str(
        r#"{
            "base_answer": "Keep current pricing",
            "critical_assumptions": [
                {"name": "demand", "distribution": "normal", "params": {"mean": 100, "std": 15}},
                {"name": "elasticity", "distribution": "uniform", "params": {"min": -2, "max": -1}}
            ],
            "num_scenarios": 2000,
            "seed": 11
        }"#,
    )
    .unwrap();
    let out = test_assumption_robustness(&input).unwrap().result;
    assert!(out.robustness_score > 0.75 && out.robustness_score < 0.95);
    assert!(out.breaking_points.len() <= 5);
    assert_eq!(out.num_scenarios_tested, 2_000);
}

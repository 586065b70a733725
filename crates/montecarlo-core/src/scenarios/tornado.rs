use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::{with_metadata, ComputationOutput};
use crate::McResult;

/// Number of variables reported as key drivers.
const KEY_DRIVER_COUNT: usize = 3;

/// Externally supplied outcome at the low and high end of a variable's range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VariationRange {
    pub low: Option<f64>,
    pub high: Option<f64>,
}

/// Input for a tornado (one-at-a-time swing) report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TornadoInput {
    pub base_simulation_id: String,
    pub variables_to_test: Vec<String>,
    pub variation_range: IndexMap<String, VariationRange>,
    /// Carried for reference only; nothing is resampled.
    #[serde(default)]
    pub outcome_data: serde_json::Value,
}

/// One bar of the tornado diagram.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TornadoBar {
    pub low_value: f64,
    pub high_value: f64,
    /// Signed swing, `high - low`.
    pub variance: f64,
    /// Bar width, `|high - low|`.
    pub impact: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TornadoOutput {
    pub base_simulation_id: String,
    /// Bars ordered widest first.
    pub tornado_diagram_data: IndexMap<String, TornadoBar>,
    pub key_drivers: Vec<String>,
    pub num_variables_tested: usize,
    pub interpretation: String,
}

/// Rank tested variables by the width of their low/high swing.
///
/// Variables without a range, or whose range lacks either bound, are left
/// out of the diagram but still count as tested.
pub fn run_tornado_analysis(input: &TornadoInput) -> McResult<ComputationOutput<TornadoOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let mut bars: Vec<(String, TornadoBar)> = Vec::new();
    for name in &input.variables_to_test {
        let range = match input.variation_range.get(name) {
            Some(r) => r,
            None => {
                warnings.push(format!("No variation range supplied for '{name}'"));
                continue;
            }
        };
        if let (Some(low), Some(high)) = (range.low, range.high) {
            let variance = high - low;
            bars.push((
                name.clone(),
                TornadoBar {
                    low_value: low,
                    high_value: high,
                    variance,
                    impact: variance.abs(),
                },
            ));
        } else {
            warnings.push(format!("Variation range for '{name}' needs both low and high"));
        }
    }

    bars.sort_by(|a, b| b.1.impact.total_cmp(&a.1.impact));
    let key_drivers: Vec<String> = bars
        .iter()
        .take(KEY_DRIVER_COUNT)
        .map(|(name, _)| name.clone())
        .collect();

    let output = TornadoOutput {
        base_simulation_id: input.base_simulation_id.clone(),
        interpretation: format!("Top drivers: {}", key_drivers.join(", ")),
        tornado_diagram_data: bars.into_iter().collect(),
        key_drivers,
        num_variables_tested: input.variables_to_test.len(),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Tornado Sensitivity Analysis",
        &serde_json::json!({
            "base_simulation_id": input.base_simulation_id,
            "variables_to_test": input.variables_to_test,
        }),
        warnings,
        elapsed,
        output,
    ))
}

use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::{cell, flatten, histogram_total, result_of};

/// Widest histogram bar, in characters.
const BAR_WIDTH: usize = 40;

/// Print the envelope as a field/value table, then the outcome histogram (if
/// the result carries one), warnings and a methodology footer.
pub fn print_table(value: &Value) {
    println!("{}", render_table(value));
}

fn render_table(value: &Value) -> String {
    let mut sections = Vec::new();
    let result = result_of(value);

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    match result {
        Value::Object(map) => {
            for (key, val) in flatten(map) {
                builder.push_record([key, cell(val)]);
            }
        }
        other => builder.push_record(["result".to_string(), cell(other)]),
    }
    sections.push(Table::from(builder).to_string());

    if let Some(Value::Array(bins)) = result.get("outcome_histogram") {
        if let Some(hist) = histogram_table(bins) {
            sections.push(format!("Outcome distribution:\n{hist}"));
        }
    }

    if let Some(Value::Array(warnings)) = value.get("warnings") {
        if !warnings.is_empty() {
            let lines: Vec<String> = warnings.iter().map(|w| format!("  - {}", cell(w))).collect();
            sections.push(format!("Warnings:\n{}", lines.join("\n")));
        }
    }

    let methodology = value.get("methodology").and_then(Value::as_str);
    let elapsed = value
        .get("metadata")
        .and_then(|m| m.get("computation_time_us"))
        .and_then(Value::as_u64);
    match (methodology, elapsed) {
        (Some(m), Some(us)) => sections.push(format!("Methodology: {m} ({us} µs)")),
        (Some(m), None) => sections.push(format!("Methodology: {m}")),
        _ => {}
    }

    sections.join("\n\n")
}

/// Bin range, count and a proportional bar per histogram bin.
fn histogram_table(bins: &[Value]) -> Option<String> {
    histogram_total(bins)?;
    let peak = bins
        .iter()
        .filter_map(|b| b.get("count").and_then(Value::as_u64))
        .max()
        .unwrap_or(0)
        .max(1);

    let mut builder = Builder::default();
    builder.push_record(["Range", "Count", ""]);
    for bin in bins {
        let lower = bin.get("lower").and_then(Value::as_f64).unwrap_or(f64::NAN);
        let upper = bin.get("upper").and_then(Value::as_f64).unwrap_or(f64::NAN);
        let count = bin.get("count").and_then(Value::as_u64).unwrap_or(0);
        let width = (count as usize * BAR_WIDTH).div_ceil(peak as usize);
        builder.push_record([
            format!("{lower:.2} .. {upper:.2}"),
            count.to_string(),
            "#".repeat(width),
        ]);
    }
    Some(Table::from(builder).to_string())
}

pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Write a command's `ComputationOutput` envelope to stdout in `format`.
pub fn format_output(format: &OutputFormat, value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => json::print_json(value)?,
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value)?,
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
    Ok(())
}

/// The `result` object of an envelope, or the value itself when it is not
/// wrapped.
pub(crate) fn result_of(value: &Value) -> &Value {
    value.get("result").unwrap_or(value)
}

/// Flatten nested objects into dotted keys (`statistics.mean`,
/// `percentiles.P95`). Arrays are left as leaves.
pub(crate) fn flatten(map: &Map<String, Value>) -> Vec<(String, &Value)> {
    let mut rows = Vec::new();
    flatten_into(&mut rows, "", map);
    rows
}

fn flatten_into<'a>(rows: &mut Vec<(String, &'a Value)>, prefix: &str, map: &'a Map<String, Value>) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) if !inner.is_empty() => flatten_into(rows, &name, inner),
            _ => rows.push((name, val)),
        }
    }
}

/// Render one flattened leaf as a single cell.
///
/// Intervals print as `[lower, upper]`, histograms as their bin count and
/// total trials, and other object lists (breaking points, risk factors,
/// per-variable summaries) as an entry count.
pub(crate) fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(items) => match histogram_total(items) {
            Some(total) => format!("{} bins, {} trials", items.len(), total),
            None if items.iter().any(Value::is_object) => format!("[{} entries]", items.len()),
            None => format!(
                "[{}]",
                items.iter().map(cell).collect::<Vec<_>>().join(", ")
            ),
        },
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// Sum of `count` over a list of histogram bins, `None` if `items` is not a
/// non-empty histogram.
pub(crate) fn histogram_total(items: &[Value]) -> Option<u64> {
    if items.is_empty() {
        return None;
    }
    items
        .iter()
        .map(|bin| {
            bin.get("lower")?;
            bin.get("upper")?;
            bin.get("count")?.as_u64()
        })
        .sum()
}

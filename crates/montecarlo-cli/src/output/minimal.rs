use serde_json::Value;

use super::{cell, result_of};

/// Result fields that answer a command on their own, most specific first.
/// `statistics` stands in for the generic simulation via its mean.
const HEADLINE: [&str; 5] = [
    "expected_total_profit",
    "confidence_level",
    "robustness_score",
    "key_drivers",
    "statistics",
];

/// Print just the headline value of the envelope.
pub fn print_minimal(value: &Value) {
    println!("{}", headline(value));
}

fn headline(value: &Value) -> String {
    let result = result_of(value);
    let Value::Object(map) = result else {
        return cell(result);
    };

    for key in HEADLINE {
        match map.get(key) {
            Some(Value::Object(stats)) => {
                if let Some(mean) = stats.get("mean") {
                    return cell(mean);
                }
            }
            Some(Value::Array(items)) if items.iter().all(Value::is_string) => {
                return items.iter().map(cell).collect::<Vec<_>>().join(", ");
            }
            Some(val) if !val.is_null() => return cell(val),
            _ => {}
        }
    }

    match map.iter().next() {
        Some((key, val)) => format!("{key}: {}", cell(val)),
        None => String::new(),
    }
}

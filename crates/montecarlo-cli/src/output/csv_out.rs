use serde_json::Value;
use std::io;

use super::{cell, flatten, result_of};

/// Write the envelope's result as `field,value` rows, nested fields in dotted
/// form, followed by one `warning` row per warning.
pub fn print_csv(value: &Value) -> csv::Result<()> {
    let stdout = io::stdout();
    write_csv(stdout.lock(), value)
}

fn write_csv<W: io::Write>(writer: W, value: &Value) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["field", "value"])?;

    match result_of(value) {
        Value::Object(result) => {
            for (key, val) in flatten(result) {
                wtr.write_record([key, cell(val)])?;
            }
        }
        other => wtr.write_record(["result".to_string(), cell(other)])?,
    }

    if let Some(Value::Array(warnings)) = value.get("warnings") {
        for w in warnings {
            wtr.write_record(["warning".to_string(), cell(w)])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

use serde_json::Value;
use std::io::{self, Write};

/// Write the envelope as pretty JSON to stdout.
pub fn print_json(value: &Value) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    out.flush()
}

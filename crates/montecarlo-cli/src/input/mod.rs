pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Load a command's input document from `--input <file>` or piped stdin.
pub fn load<T: DeserializeOwned>(
    path: Option<&str>,
    command: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        file::read_document(path)
    } else if let Some(data) = stdin::read_stdin()? {
        Ok(serde_json::from_value(data)?)
    } else {
        Err(format!("--input <file.json|file.yaml> or stdin required for {command}").into())
    }
}

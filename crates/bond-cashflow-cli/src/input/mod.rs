pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Resolve command input from `--input <file>` or piped stdin, in that order.
pub fn from_file_or_stdin<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return Ok(Some(file::read_json(path)?));
    }
    stdin::read_stdin()
}

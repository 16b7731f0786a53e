pub mod cash_flow;
pub mod portfolio;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Parse an enum flag through its serde tag, so the CLI accepts exactly
/// the spellings a JSON record accepts (`quarterly`, `trimestral`, ...).
pub fn parse_tag<T: DeserializeOwned>(flag: &str, raw: &str) -> Result<T, Box<dyn std::error::Error>> {
    serde_json::from_value(Value::String(raw.to_string()))
        .map_err(|_| format!("invalid value '{}' for --{}", raw, flag).into())
}

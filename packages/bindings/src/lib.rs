use napi::Result as NapiResult;
use napi_derive::napi;

use bond_cashflow_core::cash_flow::{self, BondTerms};
use bond_cashflow_core::portfolio::summary;
use bond_cashflow_core::EngineConfig;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parse an optional JSON engine configuration; absent means defaults.
fn parse_config(config_json: Option<String>) -> NapiResult<EngineConfig> {
    match config_json {
        Some(json) => EngineConfig::from_json(&json).map_err(to_napi_error),
        None => Ok(EngineConfig::default()),
    }
}

// ---------------------------------------------------------------------------
// Cash flow
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_cash_flow(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let input: BondTerms = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = parse_config(config_json)?;
    let output = cash_flow::analyze_bond(&input, &config).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn bond_schedule(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let input: BondTerms = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = parse_config(config_json)?;
    let result = cash_flow::compute_cash_flow_with(&input, &config).map_err(to_napi_error)?;
    serde_json::to_string(&result.schedule).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Portfolio
// ---------------------------------------------------------------------------

#[napi]
pub fn summarize_portfolio(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let input: Vec<BondTerms> = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = parse_config(config_json)?;
    let output = summary::summarize_portfolio(&input, &config).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

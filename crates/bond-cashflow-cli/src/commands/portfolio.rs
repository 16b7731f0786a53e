use clap::Args;
use serde_json::Value;

use bond_cashflow_core::cash_flow::BondTerms;
use bond_cashflow_core::portfolio::summary;

use crate::input;

/// Arguments for the portfolio summary
#[derive(Args)]
pub struct PortfolioArgs {
    /// Path to a JSON array of bond records
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_portfolio(
    args: PortfolioArgs,
    config_path: Option<&str>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let config = input::file::read_config(config_path)?;
    let Some(bonds) = input::from_file_or_stdin::<Vec<BondTerms>>(args.input.as_deref())? else {
        return Err("--input <file.json> or stdin required for portfolio".into());
    };
    let result = summary::summarize_portfolio(&bonds, &config)?;
    Ok(serde_json::to_value(result)?)
}

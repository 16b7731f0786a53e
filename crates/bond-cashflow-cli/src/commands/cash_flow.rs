use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use bond_cashflow_core::cash_flow::{self, BondTerms, GraceKind, PaymentFrequency, RateType};

use super::parse_tag;
use crate::input;

/// Bond terms, from `--input`, stdin, or individual flags.
#[derive(Args)]
pub struct TermsArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,

    /// Optional bond identifier
    #[arg(long)]
    pub id: Option<String>,
    /// Face value
    #[arg(long)]
    pub nominal_value: Option<Decimal>,
    /// Issue date (YYYY-MM-DD)
    #[arg(long)]
    pub issue_date: Option<NaiveDate>,
    /// Maturity date (YYYY-MM-DD)
    #[arg(long)]
    pub maturity_date: Option<NaiveDate>,
    /// Annual rate in percent (12 means 12%)
    #[arg(long)]
    pub annual_rate: Option<Decimal>,
    /// nominal | effective
    #[arg(long, default_value = "effective")]
    pub rate_type: String,
    /// monthly | bimonthly | quarterly | semiannual | annual
    #[arg(long, default_value = "quarterly")]
    pub frequency: String,
    /// Issuer fee deducted from proceeds
    #[arg(long, default_value = "0")]
    pub fee: Decimal,
    /// Issuance expense deducted from proceeds
    #[arg(long, default_value = "0")]
    pub expense: Decimal,
    /// none | full | partial
    #[arg(long, default_value = "none")]
    pub grace_kind: String,
    /// Number of grace periods
    #[arg(long, default_value_t = 0)]
    pub grace_periods: u32,
}

/// Arguments for the full cash-flow analysis
#[derive(Args)]
pub struct CashFlowArgs {
    #[command(flatten)]
    pub terms: TermsArgs,
}

/// Arguments for the payment schedule only
#[derive(Args)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub terms: TermsArgs,
}

pub fn run_cash_flow(
    args: CashFlowArgs,
    config_path: Option<&str>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let config = input::file::read_config(config_path)?;
    let terms = resolve_terms(args.terms)?;
    let result = cash_flow::analyze_bond(&terms, &config)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_schedule(
    args: ScheduleArgs,
    config_path: Option<&str>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let config = input::file::read_config(config_path)?;
    let terms = resolve_terms(args.terms)?;
    let result = cash_flow::compute_cash_flow_with(&terms, &config)?;
    Ok(serde_json::to_value(result.schedule)?)
}

fn resolve_terms(args: TermsArgs) -> Result<BondTerms, Box<dyn std::error::Error>> {
    if let Some(terms) = input::from_file_or_stdin::<BondTerms>(args.input.as_deref())? {
        return Ok(terms);
    }

    let (Some(nominal_value), Some(issue_date), Some(maturity_date), Some(annual_rate)) = (
        args.nominal_value,
        args.issue_date,
        args.maturity_date,
        args.annual_rate,
    ) else {
        return Err("--input <file.json>, stdin, or --nominal-value, --issue-date, \
                    --maturity-date and --annual-rate required"
            .into());
    };

    Ok(BondTerms {
        id: args.id,
        nominal_value,
        issue_date,
        maturity_date,
        annual_rate,
        rate_type: parse_tag::<RateType>("rate-type", &args.rate_type)?,
        frequency: parse_tag::<PaymentFrequency>("frequency", &args.frequency)?,
        fee: args.fee,
        expense: args.expense,
        grace_kind: parse_tag::<GraceKind>("grace-kind", &args.grace_kind)?,
        grace_periods: args.grace_periods,
    })
}

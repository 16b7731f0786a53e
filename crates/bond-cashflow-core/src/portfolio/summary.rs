use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::cash_flow::{compute_cash_flow_with, BondTerms};
use crate::config::EngineConfig;
use crate::error::BondCashFlowError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::BondCashFlowResult;

/// Headline figures for one bond in a portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub nominal_value: Money,
    pub installment: Money,
    pub tcea: Rate,
    pub trea: Rate,
    pub converged: bool,
}

/// Dashboard-level aggregate over a set of bonds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub bond_count: usize,
    pub total_nominal_value: Money,
    /// Simple mean of the stated annual rates, in percentage units
    pub average_annual_rate: Decimal,
    pub bonds: Vec<BondLine>,
}

/// Compute every bond and aggregate. Fails as a whole if any bond is
/// invalid; the error names the offending bond.
pub fn summarize_portfolio(
    bonds: &[BondTerms],
    config: &EngineConfig,
) -> BondCashFlowResult<ComputationOutput<PortfolioSummary>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let mut lines = Vec::with_capacity(bonds.len());
    for (idx, bond) in bonds.iter().enumerate() {
        let result = compute_cash_flow_with(bond, config).map_err(|e| match e {
            BondCashFlowError::InvalidTerms { field, reason } => BondCashFlowError::InvalidTerms {
                field: format!("bonds[{idx}].{field}"),
                reason,
            },
            other => other,
        })?;

        let converged = result.tcea_estimate.converged && result.trea_estimate.converged;
        if !converged {
            warnings.push(format!(
                "bond {} ({}): yield estimate did not converge",
                idx,
                bond.id.as_deref().unwrap_or("unnamed")
            ));
        }

        lines.push(BondLine {
            id: bond.id.clone(),
            nominal_value: bond.nominal_value,
            installment: result.installment,
            tcea: result.tcea,
            trea: result.trea,
            converged,
        });
    }

    let total_nominal_value = bonds
        .iter()
        .try_fold(Decimal::ZERO, |acc, b| acc.checked_add(b.nominal_value))
        .ok_or_else(|| BondCashFlowError::overflow("portfolio total"))?;
    let average_annual_rate = if bonds.is_empty() {
        warnings.push("Empty portfolio".into());
        Decimal::ZERO
    } else {
        let rate_sum = bonds
            .iter()
            .try_fold(Decimal::ZERO, |acc, b| acc.checked_add(b.annual_rate))
            .ok_or_else(|| BondCashFlowError::invalid("annual_rate", "Sum of annual rates overflows"))?;
        rate_sum / Decimal::from(bonds.len() as u64)
    };

    tracing::debug!(
        bonds = bonds.len(),
        total = %total_nominal_value,
        "portfolio summarized"
    );

    let output = PortfolioSummary {
        bond_count: bonds.len(),
        total_nominal_value,
        average_annual_rate,
        bonds: lines,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Bond Portfolio Summary",
        &serde_json::json!({
            "average_rate": "simple mean of stated annual rates",
            "yield_method": config.yield_method,
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cash_flow::{GraceKind, PaymentFrequency, RateType};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn bond(id: &str, nominal: Decimal, rate: Decimal) -> BondTerms {
        BondTerms {
            id: Some(id.into()),
            nominal_value: nominal,
            issue_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            maturity_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            annual_rate: rate,
            rate_type: RateType::Nominal,
            frequency: PaymentFrequency::Semiannual,
            fee: Decimal::ZERO,
            expense: Decimal::ZERO,
            grace_kind: GraceKind::None,
            grace_periods: 0,
        }
    }

    #[test]
    fn test_totals_and_average() {
        let bonds = vec![bond("a", dec!(1000), dec!(6)), bond("b", dec!(3000), dec!(9))];
        let out = summarize_portfolio(&bonds, &EngineConfig::default()).unwrap();
        let s = &out.result;
        assert_eq!(s.bond_count, 2);
        assert_eq!(s.total_nominal_value, dec!(4000));
        assert_eq!(s.average_annual_rate, dec!(7.5));
        assert_eq!(s.bonds[1].id.as_deref(), Some("b"));
        assert!(s.bonds.iter().all(|b| b.converged));
    }

    #[test]
    fn test_empty_portfolio() {
        let out = summarize_portfolio(&[], &EngineConfig::default()).unwrap();
        assert_eq!(out.result.bond_count, 0);
        assert_eq!(out.result.average_annual_rate, Decimal::ZERO);
        assert_eq!(out.warnings, vec!["Empty portfolio".to_string()]);
    }

    #[test]
    fn test_invalid_bond_names_index() {
        let bonds = vec![bond("a", dec!(1000), dec!(6)), bond("b", dec!(-5), dec!(9))];
        match summarize_portfolio(&bonds, &EngineConfig::default()) {
            Err(BondCashFlowError::InvalidTerms { field, .. }) => {
                assert_eq!(field, "bonds[1].nominal_value")
            }
            other => panic!("Expected InvalidTerms, got {other:?}"),
        }
    }
}

//! French-method cash-flow engine: rate normalization, installment,
//! schedule, TCEA/TREA and duration metrics for a single bond.

pub mod installment;
pub mod rates;
pub mod risk;
pub mod schedule;
pub mod terms;
pub mod yields;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::EngineConfig;
use crate::error::BondCashFlowError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::BondCashFlowResult;

pub use schedule::{PeriodPhase, ScheduleRow, ScheduleSummary};
pub use terms::{BondTerms, GraceKind, PaymentFrequency, RateType};
pub use yields::YieldEstimate;

/// Everything derived from one set of bond terms. Built in one pass and
/// replaced as a whole when the terms change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowResult {
    pub bond: BondTerms,
    pub periods_per_year: u32,
    pub number_of_installments: u32,
    /// Effective rate per payment period
    pub periodic_rate: Rate,
    /// Constant installment of the amortizing periods
    pub installment: Money,
    pub schedule: Vec<ScheduleRow>,
    pub summary: ScheduleSummary,
    /// Annualized cost rate against the nominal value
    pub tcea: Rate,
    /// Annualized return rate against the net proceeds
    pub trea: Rate,
    pub tcea_estimate: YieldEstimate,
    pub trea_estimate: YieldEstimate,
    pub duration: Decimal,
    pub modified_duration: Decimal,
    pub convexity: Decimal,
    pub max_price: Money,
}

/// Compute the cash-flow result with the default engine configuration.
pub fn compute_cash_flow(bond: &BondTerms) -> BondCashFlowResult<CashFlowResult> {
    compute_cash_flow_with(bond, &EngineConfig::default())
}

/// Compute the cash-flow result. Pure: identical inputs give identical
/// results.
pub fn compute_cash_flow_with(
    bond: &BondTerms,
    config: &EngineConfig,
) -> BondCashFlowResult<CashFlowResult> {
    config.validate()?;
    let periods = bond.validate()?;
    let periods_per_year = bond.frequency.periods_per_year();

    let periodic_rate = rates::normalize_rate(bond.annual_rate, bond.rate_type, periods_per_year)?;
    if periodic_rate < config.min_periodic_rate {
        return Err(BondCashFlowError::invalid(
            "annual_rate",
            format!("Periodic rate {periodic_rate} is too close to zero for the French method"),
        ));
    }

    let grace = bond.effective_grace_periods();
    let installment = installment::solve_installment(
        bond.nominal_value,
        periodic_rate,
        periods,
        bond.grace_kind,
        grace,
        config.partial_grace_basis,
    )?;

    let params = schedule::ScheduleParams {
        rate: periodic_rate,
        installment,
        periods,
        balance_floor: config.balance_floor,
    };
    let rows = schedule::generate_schedule(bond, &params)?;
    let summary = schedule::summarize_schedule(&rows)?;

    tracing::debug!(
        bond_id = bond.id.as_deref().unwrap_or("-"),
        periods,
        %periodic_rate,
        %installment,
        "schedule generated"
    );

    let flows = yields::payment_flows(&rows);
    let tcea_estimate = yields::solve_yield(bond.nominal_value, &flows, periods_per_year, config)?;
    let trea_estimate = yields::solve_yield(bond.net_proceeds(), &flows, periods_per_year, config)?;

    let metrics = risk::compute_risk_metrics(&flows, periodic_rate, config.stress_factor)?;

    Ok(CashFlowResult {
        bond: bond.clone(),
        periods_per_year,
        number_of_installments: periods,
        periodic_rate,
        installment,
        schedule: rows,
        summary,
        tcea: tcea_estimate.annual_rate,
        trea: trea_estimate.annual_rate,
        tcea_estimate,
        trea_estimate,
        duration: metrics.duration,
        modified_duration: metrics.modified_duration,
        convexity: metrics.convexity,
        max_price: metrics.max_price,
    })
}

/// Compute the cash-flow result wrapped in the standard output envelope.
pub fn analyze_bond(
    bond: &BondTerms,
    config: &EngineConfig,
) -> BondCashFlowResult<ComputationOutput<CashFlowResult>> {
    let start = Instant::now();
    let result = compute_cash_flow_with(bond, config)?;

    let mut warnings: Vec<String> = Vec::new();
    for (label, est) in [("TCEA", &result.tcea_estimate), ("TREA", &result.trea_estimate)] {
        if !est.converged {
            warnings.push(format!(
                "{label} did not converge after {} iterations (NPV residual {}); value is a best-effort estimate",
                est.iterations, est.npv_residual
            ));
        }
    }
    if let Some(last) = result.schedule.last().filter(|r| r.balance > Decimal::ZERO) {
        warnings.push(format!(
            "Principal of {} remains outstanding after the last installment",
            last.balance
        ));
    }
    if bond.grace_kind == GraceKind::None && bond.grace_periods > 0 {
        warnings.push(format!(
            "grace_periods = {} ignored because no grace period applies",
            bond.grace_periods
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "amortization": "French (constant installment)",
        "rate_type": bond.rate_type,
        "frequency": bond.frequency,
        "grace": bond.grace_kind,
        "partial_grace_basis": config.partial_grace_basis,
        "yield_method": config.yield_method,
        "max_iterations": config.max_iterations,
        "npv_tolerance": config.npv_tolerance.to_string(),
        "balance_floor": config.balance_floor.to_string(),
        "max_price_discount": format!("{} x periodic rate", config.stress_factor),
        "period_dates": "issue date + k calendar months, clamped to month end"
    });

    Ok(with_metadata(
        "Bond Cash Flow (French amortization, TCEA/TREA, duration & convexity)",
        &assumptions,
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn example_bond() -> BondTerms {
        BondTerms {
            id: Some("example".into()),
            nominal_value: dec!(1000),
            issue_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            maturity_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            annual_rate: dec!(12),
            rate_type: RateType::Effective,
            frequency: PaymentFrequency::Quarterly,
            fee: Decimal::ZERO,
            expense: Decimal::ZERO,
            grace_kind: GraceKind::None,
            grace_periods: 0,
        }
    }

    #[test]
    fn test_example_scenario() {
        let result = compute_cash_flow(&example_bond()).unwrap();
        assert_eq!(result.periods_per_year, 4);
        assert_eq!(result.number_of_installments, 4);
        assert_eq!(result.schedule.len(), 5);
        assert!((result.periodic_rate - dec!(0.02874)).abs() < dec!(0.00001));
        assert!((result.installment - dec!(268.215)).abs() < dec!(0.001));
        assert_eq!(result.schedule[4].balance, Decimal::ZERO);
        assert_eq!(result.bond.id.as_deref(), Some("example"));
    }

    #[test]
    fn test_no_fees_tcea_equals_trea() {
        let result = compute_cash_flow(&example_bond()).unwrap();
        assert_eq!(result.tcea, result.trea);
    }

    #[test]
    fn test_analyze_bond_envelope() {
        let out = analyze_bond(&example_bond(), &EngineConfig::default()).unwrap();
        assert!(out.warnings.is_empty());
        assert!(out.methodology.contains("French"));
        assert_eq!(out.assumptions["yield_method"], "bisection");
    }

    #[test]
    fn test_analyze_bond_warns_on_non_convergence() {
        let config = EngineConfig {
            yield_method: crate::config::YieldMethod::FixedStep,
            ..EngineConfig::default()
        };
        let out = analyze_bond(&example_bond(), &config).unwrap();
        assert_eq!(out.warnings.len(), 2);
        assert!(out.warnings[0].starts_with("TCEA"));
    }

    #[test]
    fn test_partial_grace_installment_matches_no_grace() {
        let no_grace = compute_cash_flow(&example_bond()).unwrap();
        let bond = BondTerms {
            grace_kind: GraceKind::Partial,
            grace_periods: 2,
            ..example_bond()
        };
        let result = compute_cash_flow(&bond).unwrap();
        assert_eq!(result.installment, no_grace.installment);
        assert!((result.installment - dec!(268.2152)).abs() < dec!(0.0001));

        let out = analyze_bond(&bond, &EngineConfig::default()).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("remains outstanding")));
    }

    #[test]
    fn test_partial_grace_amortizing_basis_closes() {
        let bond = BondTerms {
            grace_kind: GraceKind::Partial,
            grace_periods: 2,
            ..example_bond()
        };
        let config = EngineConfig {
            partial_grace_basis: crate::config::PartialGraceBasis::AmortizingPeriods,
            ..EngineConfig::default()
        };
        let result = compute_cash_flow_with(&bond, &config).unwrap();
        assert!((result.installment - dec!(521.6547)).abs() < dec!(0.001));
        assert_eq!(result.schedule[4].balance, Decimal::ZERO);
    }

    #[test]
    fn test_huge_nominal_overflow_is_an_error() {
        let bond = BondTerms {
            // 5e28, close to Decimal::MAX; installments fit but their total does not
            nominal_value: Decimal::from_i128_with_scale(5 * 10_i128.pow(28), 0),
            issue_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            maturity_date: NaiveDate::from_ymd_opt(2064, 1, 1).unwrap(),
            rate_type: RateType::Nominal,
            frequency: PaymentFrequency::Monthly,
            ..example_bond()
        };
        match compute_cash_flow(&bond) {
            Err(BondCashFlowError::InvalidTerms { field, .. }) => assert_eq!(field, "nominal_value"),
            other => panic!("Expected InvalidTerms on nominal_value, got {other:?}"),
        }
    }

    #[test]
    fn test_near_zero_rate_rejected() {
        let bond = BondTerms {
            annual_rate: dec!(0.00000001),
            rate_type: RateType::Nominal,
            ..example_bond()
        };
        let err = compute_cash_flow(&bond);
        assert!(matches!(err, Err(BondCashFlowError::InvalidTerms { .. })));
    }
}

use rust_decimal::Decimal;

use super::terms::GraceKind;
use crate::config::PartialGraceBasis;
use crate::error::BondCashFlowError;
use crate::time_value::{annuity_installment, growth_factor};
use crate::types::{Money, Rate};
use crate::BondCashFlowResult;

/// Constant French-method installment paid in every amortizing period.
///
/// Full grace capitalizes the principal for `grace_periods` and runs the
/// annuity over the remaining `periods - grace_periods`. Partial grace
/// leaves the principal untouched; `partial_basis` picks whether its
/// annuity spans all `periods` or only the amortizing ones.
pub fn solve_installment(
    nominal_value: Money,
    rate: Rate,
    periods: u32,
    grace_kind: GraceKind,
    grace_periods: u32,
    partial_basis: PartialGraceBasis,
) -> BondCashFlowResult<Money> {
    if rate <= Decimal::ZERO {
        return Err(BondCashFlowError::invalid(
            "annual_rate",
            "Periodic rate must be positive for the French method",
        ));
    }
    if grace_kind != GraceKind::None && periods <= grace_periods {
        return Err(BondCashFlowError::invalid(
            "grace_periods",
            format!("Grace duration ({grace_periods}) leaves no amortizing periods out of {periods}"),
        ));
    }

    match (grace_kind, partial_basis) {
        (GraceKind::None, _) | (GraceKind::Partial, PartialGraceBasis::AllInstallments) => {
            annuity_installment(nominal_value, rate, periods)
        }
        (GraceKind::Partial, PartialGraceBasis::AmortizingPeriods) => {
            annuity_installment(nominal_value, rate, periods - grace_periods)
        }
        (GraceKind::Full, _) => {
            let principal = nominal_value
                .checked_mul(growth_factor(rate, grace_periods)?)
                .ok_or_else(|| BondCashFlowError::overflow("capitalized principal"))?;
            annuity_installment(principal, rate, periods - grace_periods)
        }
    }
}

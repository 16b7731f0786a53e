use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::terms::RateType;
use crate::error::BondCashFlowError;
use crate::time_value::periodic_root;
use crate::types::Rate;
use crate::BondCashFlowResult;

/// Convert an annual rate in percentage units into the effective rate per
/// payment period.
///
/// - Nominal: the annual rate is split evenly, `(rate / m) / 100`.
/// - Effective: the annual rate is de-compounded, `(1 + rate/100)^(1/m) - 1`.
pub fn normalize_rate(
    annual_rate_pct: Decimal,
    rate_type: RateType,
    periods_per_year: u32,
) -> BondCashFlowResult<Rate> {
    if annual_rate_pct <= Decimal::ZERO {
        return Err(BondCashFlowError::invalid(
            "annual_rate",
            "Interest rate must be positive",
        ));
    }
    if periods_per_year == 0 {
        return Err(BondCashFlowError::invalid(
            "frequency",
            "Periods per year must be positive",
        ));
    }

    let m = Decimal::from(periods_per_year);
    let annual = annual_rate_pct / dec!(100);

    match rate_type {
        RateType::Nominal => Ok(annual / m),
        RateType::Effective => Ok(periodic_root(Decimal::ONE + annual, periods_per_year)? - Decimal::ONE),
    }
}

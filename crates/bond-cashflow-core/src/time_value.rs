use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::BondCashFlowError;
use crate::types::{Money, Rate};
use crate::BondCashFlowResult;

/// (1 + rate)^periods by iterative multiplication (no `powd` drift).
pub fn growth_factor(rate: Rate, periods: u32) -> BondCashFlowResult<Decimal> {
    if rate <= dec!(-1) {
        return Err(BondCashFlowError::invalid(
            "rate",
            "Rate must be greater than -100%",
        ));
    }

    let one_plus_r = Decimal::ONE + rate;
    let mut factor = Decimal::ONE;
    for t in 0..periods {
        factor = factor.checked_mul(one_plus_r).ok_or_else(|| {
            BondCashFlowError::invalid(
                "rate",
                format!("Compounding overflows after {t} of {periods} periods"),
            )
        })?;
    }
    Ok(factor)
}

/// Discount factors (1 + rate)^-t for t = 1..=periods.
pub fn discount_factors(rate: Rate, periods: u32) -> BondCashFlowResult<Vec<Decimal>> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return Err(BondCashFlowError::DivisionByZero {
            context: "discount factors: (1 + rate) is not positive".into(),
        });
    }

    let step = Decimal::ONE / one_plus_r;
    let mut df = Decimal::ONE;
    Ok((0..periods)
        .map(|_| {
            df *= step;
            df
        })
        .collect())
}

/// Constant installment that repays `principal` over `periods` at `rate`
/// per period: P * r / (1 - (1+r)^-n), evaluated as P * r * f / (f - 1).
pub fn annuity_installment(principal: Money, rate: Rate, periods: u32) -> BondCashFlowResult<Money> {
    if periods == 0 {
        return Err(BondCashFlowError::invalid(
            "periods",
            "Number of periods must be > 0",
        ));
    }
    if rate <= Decimal::ZERO {
        return Err(BondCashFlowError::invalid(
            "rate",
            "Annuity formula is undefined for a non-positive periodic rate",
        ));
    }

    let factor = growth_factor(rate, periods)?;
    let denominator = factor - Decimal::ONE;
    if denominator.is_zero() {
        return Err(BondCashFlowError::DivisionByZero {
            context: "annuity installment: (1 + r)^n - 1".into(),
        });
    }

    principal
        .checked_mul(rate)
        .and_then(|v| v.checked_mul(factor))
        .map(|v| v / denominator)
        .ok_or_else(|| BondCashFlowError::invalid("principal", "Installment overflows"))
}

/// base^(1/n): the per-period factor equivalent to an annual `base`.
pub fn periodic_root(base: Decimal, n: u32) -> BondCashFlowResult<Decimal> {
    if base <= Decimal::ZERO {
        return Err(BondCashFlowError::invalid(
            "rate",
            "Cannot take a fractional power of a non-positive base",
        ));
    }
    if n == 0 {
        return Err(BondCashFlowError::DivisionByZero {
            context: "periodic root with zero periods".into(),
        });
    }
    if n == 1 || base == Decimal::ONE {
        return Ok(base);
    }

    let exponent = Decimal::ONE / Decimal::from(n);
    base.checked_powd(exponent).ok_or_else(|| {
        BondCashFlowError::invalid("rate", format!("Cannot compute {base}^(1/{n})"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_factor_basic() {
        let f = growth_factor(dec!(0.10), 3).unwrap();
        assert_eq!(f, dec!(1.331));
    }

    #[test]
    fn test_growth_factor_zero_periods() {
        assert_eq!(growth_factor(dec!(0.05), 0).unwrap(), Decimal::ONE);
    }

    #[test]
    fn test_growth_factor_overflow_is_error() {
        assert!(growth_factor(dec!(100), 40).is_err());
    }

    #[test]
    fn test_discount_factors_decrease() {
        let dfs = discount_factors(dec!(0.10), 3).unwrap();
        assert_eq!(dfs.len(), 3);
        assert!((dfs[0] - dec!(0.9090909)).abs() < dec!(0.000001));
        assert!((dfs[2] - Decimal::ONE / dec!(1.331)).abs() < dec!(0.000000001));
        assert!(dfs[0] > dfs[1] && dfs[1] > dfs[2]);
    }

    #[test]
    fn test_annuity_installment_basic() {
        // 1000 over 3 periods at 10%: 1000 * 0.1 * 1.331 / 0.331 = 402.11
        let pmt = annuity_installment(dec!(1000), dec!(0.10), 3).unwrap();
        assert!((pmt - dec!(402.1148)).abs() < dec!(0.001));
    }

    #[test]
    fn test_annuity_installment_zero_rate_rejected() {
        assert!(annuity_installment(dec!(1000), Decimal::ZERO, 12).is_err());
    }

    #[test]
    fn test_annuity_installment_zero_periods_rejected() {
        assert!(annuity_installment(dec!(1000), dec!(0.01), 0).is_err());
    }

    #[test]
    fn test_periodic_root_quarterly() {
        // 1.12^(1/4) ~ 1.0287373
        let root = periodic_root(dec!(1.12), 4).unwrap();
        assert!((root - dec!(1.0287373)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_periodic_root_annual_is_identity() {
        assert_eq!(periodic_root(dec!(1.07), 1).unwrap(), dec!(1.07));
    }
}

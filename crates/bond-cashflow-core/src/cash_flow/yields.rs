use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::schedule::ScheduleRow;
use crate::config::{EngineConfig, YieldMethod};
use crate::error::BondCashFlowError;
use crate::time_value::{growth_factor, periodic_root};
use crate::types::{FlowDirection, Money, Rate};
use crate::BondCashFlowResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Best-effort internal rate of return of a payment stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldEstimate {
    pub method: YieldMethod,
    /// Solved rate in the discounting equation
    pub periodic_rate: Rate,
    /// (1 + periodic_rate)^periods_per_year - 1
    pub annual_rate: Rate,
    pub iterations: u32,
    /// False when the iteration cap was hit before |NPV| < tolerance
    pub converged: bool,
    /// NPV at `periodic_rate`
    pub npv_residual: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Payment magnitudes of periods 1..n, in period order.
pub fn payment_flows(rows: &[ScheduleRow]) -> Vec<Money> {
    rows.iter()
        .filter(|r| r.direction == FlowDirection::Outflow)
        .map(|r| r.installment.abs())
        .collect()
}

/// Solve NPV(t) = -base + sum_i flow_i / (1+t)^(i/m) = 0 for t, where i is
/// the 1-based payment index and m the periods per year.
///
/// Never fails for lack of convergence: the last estimate is returned with
/// `converged = false`.
pub fn solve_yield(
    base: Money,
    flows: &[Money],
    periods_per_year: u32,
    config: &EngineConfig,
) -> BondCashFlowResult<YieldEstimate> {
    if flows.is_empty() {
        return Err(BondCashFlowError::invalid(
            "schedule",
            "Yield requires at least one payment",
        ));
    }
    if periods_per_year == 0 {
        return Err(BondCashFlowError::DivisionByZero {
            context: "yield annualization with zero periods per year".into(),
        });
    }

    let npv = |rate: Rate| npv_at(base, flows, rate, periods_per_year);
    let (periodic_rate, iterations, converged, npv_residual) = match config.yield_method {
        YieldMethod::Bisection => bisection(npv, config),
        YieldMethod::FixedStep => fixed_step(npv, config),
    };

    let annual_rate = growth_factor(periodic_rate, periods_per_year)? - Decimal::ONE;

    if converged {
        tracing::debug!(
            method = ?config.yield_method,
            %base,
            %periodic_rate,
            %annual_rate,
            iterations,
            "yield solved"
        );
    } else {
        tracing::warn!(
            method = ?config.yield_method,
            %base,
            %periodic_rate,
            %npv_residual,
            iterations,
            "yield did not converge; returning last estimate"
        );
    }

    Ok(YieldEstimate {
        method: config.yield_method,
        periodic_rate,
        annual_rate,
        iterations,
        converged,
        npv_residual,
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// NPV at `rate`. Saturates to `Decimal::MAX` when the present value is too
/// large to represent, which only happens for rates near -100%.
fn npv_at(base: Money, flows: &[Money], rate: Rate, periods_per_year: u32) -> Money {
    try_npv(base, flows, rate, periods_per_year).unwrap_or(Decimal::MAX)
}

fn try_npv(base: Money, flows: &[Money], rate: Rate, periods_per_year: u32) -> Option<Money> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }
    // (1+t)^(i/m) = ((1+t)^(1/m))^i, so one root and n multiplications
    let root = periodic_root(one_plus_r, periods_per_year).ok()?;
    let step = Decimal::ONE.checked_div(root)?;

    let mut df = Decimal::ONE;
    let mut pv = Decimal::ZERO;
    for cf in flows {
        df = df.checked_mul(step)?;
        pv = pv.checked_add(cf.checked_mul(df)?)?;
    }
    pv.checked_sub(base)
}

/// Returns (rate, iterations, converged, residual).
fn bisection(npv: impl Fn(Rate) -> Money, config: &EngineConfig) -> (Rate, u32, bool, Money) {
    let tol = config.npv_tolerance;
    let mut lo = config.bracket_low;
    let mut hi = config.bracket_high;

    let f_lo = npv(lo);
    if f_lo.abs() < tol {
        return (lo, 0, true, f_lo);
    }
    // NPV falls as the rate rises, so the root lies outside the bracket
    if f_lo < Decimal::ZERO {
        return (lo, 0, false, f_lo);
    }
    let f_hi = npv(hi);
    if f_hi.abs() < tol {
        return (hi, 0, true, f_hi);
    }
    if f_hi > Decimal::ZERO {
        return (hi, 0, false, f_hi);
    }

    let mut mid = lo;
    let mut f_mid = f_lo;
    for i in 1..=config.max_iterations {
        mid = (lo + hi) / dec!(2);
        f_mid = npv(mid);
        if f_mid.abs() < tol {
            return (mid, i, true, f_mid);
        }
        if f_mid > Decimal::ZERO {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    (mid, config.max_iterations, false, f_mid)
}

/// Hill-climb with a constant step: up if NPV > 0, down if NPV < 0.
fn fixed_step(npv: impl Fn(Rate) -> Money, config: &EngineConfig) -> (Rate, u32, bool, Money) {
    let tol = config.npv_tolerance;
    let mut rate = config.initial_guess;
    let mut residual = Decimal::ZERO;

    for i in 1..=config.max_iterations {
        residual = npv(rate);
        if residual.abs() < tol {
            return (rate, i, true, residual);
        }
        if residual > Decimal::ZERO {
            rate += config.step;
        } else {
            rate = (rate - config.step).max(config.bracket_low);
        }
    }
    (rate, config.max_iterations, false, residual)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: Decimal, expected: Decimal, tolerance: Decimal, label: &str) {
        let diff = (actual - expected).abs();
        assert!(
            diff <= tolerance,
            "{label}: expected ~{expected}, got {actual} (diff {diff} > tolerance {tolerance})"
        );
    }

    /// Four quarterly payments that repay 1000 at 12% effective annual.
    fn quarterly_flows() -> Vec<Money> {
        vec![dec!(268.2152174060825); 4]
    }

    #[test]
    fn test_bisection_recovers_annual_rate() {
        let est = solve_yield(dec!(1000), &quarterly_flows(), 4, &EngineConfig::default()).unwrap();
        assert!(est.converged);
        assert!(est.npv_residual.abs() < dec!(0.0001));
        // Exponent i/m makes the solved rate the annual effective 12%
        assert_close(est.periodic_rate, dec!(0.12), dec!(0.000001), "periodic rate");
        // (1.12)^4 - 1
        assert_close(est.annual_rate, dec!(0.57351936), dec!(0.00001), "annual rate");
    }

    #[test]
    fn test_fixed_step_stops_at_iteration_cap() {
        let config = EngineConfig {
            yield_method: YieldMethod::FixedStep,
            ..EngineConfig::default()
        };
        let est = solve_yield(dec!(1000), &quarterly_flows(), 4, &config).unwrap();
        // 100 steps of 1e-4 from 0.10 cannot reach 0.12
        assert!(!est.converged);
        assert_eq!(est.iterations, 100);
        assert_close(est.periodic_rate, dec!(0.11), dec!(0.0000001), "terminal estimate");
    }

    #[test]
    fn test_fixed_step_converges_near_guess() {
        // Root exactly at the initial guess: single payment of 1.1 one year out
        let config = EngineConfig {
            yield_method: YieldMethod::FixedStep,
            ..EngineConfig::default()
        };
        let est = solve_yield(dec!(1), &[dec!(1.1)], 1, &config).unwrap();
        assert!(est.converged);
        assert_eq!(est.iterations, 1);
        assert_eq!(est.periodic_rate, dec!(0.10));
    }

    #[test]
    fn test_lower_base_gives_higher_yield() {
        let flows = quarterly_flows();
        let config = EngineConfig::default();
        let gross = solve_yield(dec!(1000), &flows, 4, &config).unwrap();
        let net = solve_yield(dec!(970), &flows, 4, &config).unwrap();
        assert!(net.annual_rate > gross.annual_rate);
    }

    #[test]
    fn test_root_outside_bracket_is_flagged() {
        let config = EngineConfig {
            bracket_high: dec!(0.05),
            ..EngineConfig::default()
        };
        let est = solve_yield(dec!(1000), &quarterly_flows(), 4, &config).unwrap();
        assert!(!est.converged);
        assert_eq!(est.periodic_rate, dec!(0.05));
    }

    #[test]
    fn test_empty_flows_rejected() {
        assert!(solve_yield(dec!(1000), &[], 4, &EngineConfig::default()).is_err());
    }

    #[test]
    fn test_npv_saturates_near_minus_one() {
        let npv = npv_at(dec!(1), &[dec!(1_000_000); 40], dec!(-0.999999), 1);
        assert_eq!(npv, Decimal::MAX);
    }
}

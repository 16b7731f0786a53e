use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::BondCashFlowError;
use crate::time_value::discount_factors;
use crate::types::{Money, Rate};
use crate::BondCashFlowResult;

/// Duration family and theoretical maximum price of a payment stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Flow-weighted, discounted average payment time (in periods)
    pub duration: Decimal,
    /// duration / (1 + r)
    pub modified_duration: Decimal,
    pub convexity: Decimal,
    /// Present value discounted at the stressed rate `stress_factor * r`
    pub max_price: Money,
}

/// Compute the risk metrics over payment magnitudes for periods 1..n.
///
/// Weights are each payment's share of the undiscounted total, so the
/// duration here is measured in periods and is not normalized by price.
pub fn compute_risk_metrics(
    flows: &[Money],
    rate: Rate,
    stress_factor: Decimal,
) -> BondCashFlowResult<RiskMetrics> {
    let total_flow = flows
        .iter()
        .try_fold(Decimal::ZERO, |acc, cf| acc.checked_add(*cf))
        .ok_or_else(|| BondCashFlowError::overflow("total payment flow"))?;
    if total_flow.is_zero() {
        return Err(BondCashFlowError::DivisionByZero {
            context: "risk metrics: total payment flow is zero".into(),
        });
    }

    let n = flows.len() as u32;
    let dfs = discount_factors(rate, n)?;
    let stressed_dfs = discount_factors(rate * stress_factor, n)?;

    let mut duration_sum = Decimal::ZERO;
    let mut convexity_sum = Decimal::ZERO;
    let mut max_price = Decimal::ZERO;

    for (idx, ((cf, df), sdf)) in flows.iter().zip(&dfs).zip(&stressed_dfs).enumerate() {
        let t = Decimal::from(idx as u64 + 1);
        let weighted = cf / total_flow * df;
        duration_sum += t * weighted;
        convexity_sum += t * (t + Decimal::ONE) * weighted;
        max_price = cf
            .checked_mul(*sdf)
            .and_then(|pv| max_price.checked_add(pv))
            .ok_or_else(|| BondCashFlowError::overflow("max price"))?;
    }

    let one_plus_r = Decimal::ONE + rate;
    let modified_duration = duration_sum / one_plus_r;
    let convexity = convexity_sum / (one_plus_r * one_plus_r);

    tracing::debug!(
        duration = %duration_sum,
        %modified_duration,
        %convexity,
        %max_price,
        "risk metrics computed"
    );

    Ok(RiskMetrics {
        duration: duration_sum,
        modified_duration,
        convexity,
        max_price,
    })
}

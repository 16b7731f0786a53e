use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::BondCashFlowError;
use crate::types::{Money, Rate};
use crate::BondCashFlowResult;

/// Root-finding strategy used for TCEA / TREA.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YieldMethod {
    /// Halve a bracketing interval until the NPV tolerance is met.
    #[default]
    Bisection,
    /// Move the guess by a constant step towards the root (hill-climb).
    FixedStep,
}

/// Number of periods the partial-grace annuity is spread over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialGraceBasis {
    /// Annuity over all n installments; interest-only periods do not shorten
    /// the term, so principal remains outstanding at maturity.
    #[default]
    AllInstallments,
    /// Annuity over the n - g amortizing periods; the balance closes at zero.
    AmortizingPeriods,
}

/// Tunables for the cash-flow engine. Every field has a default, so a
/// partial JSON document (or `{}`) is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub yield_method: YieldMethod,
    pub partial_grace_basis: PartialGraceBasis,
    /// Iteration cap shared by both yield methods
    pub max_iterations: u32,
    /// |NPV| below this value counts as converged
    pub npv_tolerance: Money,
    /// Starting guess for the fixed-step method
    pub initial_guess: Rate,
    /// Increment for the fixed-step method
    pub step: Rate,
    /// Lower bound of the bisection bracket (must be > -1)
    pub bracket_low: Rate,
    /// Upper bound of the bisection bracket
    pub bracket_high: Rate,
    /// Balances below this amount are clamped to zero
    pub balance_floor: Money,
    /// Fraction of the periodic rate used to discount the theoretical max price
    pub stress_factor: Decimal,
    /// Periodic rates below this are rejected as degenerate
    pub min_periodic_rate: Rate,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            yield_method: YieldMethod::Bisection,
            partial_grace_basis: PartialGraceBasis::AllInstallments,
            max_iterations: 100,
            npv_tolerance: dec!(0.0001),
            initial_guess: dec!(0.10),
            step: dec!(0.0001),
            bracket_low: dec!(-0.9),
            bracket_high: dec!(10),
            balance_floor: dec!(0.01),
            stress_factor: dec!(0.5),
            min_periodic_rate: dec!(0.000000001),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from a JSON document.
    pub fn from_json(json: &str) -> BondCashFlowResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> BondCashFlowResult<()> {
        if self.max_iterations == 0 {
            return Err(BondCashFlowError::ConfigError(
                "max_iterations must be at least 1".into(),
            ));
        }
        if self.npv_tolerance <= Decimal::ZERO {
            return Err(BondCashFlowError::ConfigError(
                "npv_tolerance must be positive".into(),
            ));
        }
        if self.step <= Decimal::ZERO {
            return Err(BondCashFlowError::ConfigError("step must be positive".into()));
        }
        if self.initial_guess <= dec!(-1) {
            return Err(BondCashFlowError::ConfigError(
                "initial_guess must be greater than -1".into(),
            ));
        }
        if self.bracket_low <= dec!(-1) || self.bracket_low >= self.bracket_high {
            return Err(BondCashFlowError::ConfigError(
                "bisection bracket must satisfy -1 < bracket_low < bracket_high".into(),
            ));
        }
        if self.balance_floor < Decimal::ZERO {
            return Err(BondCashFlowError::ConfigError(
                "balance_floor must be non-negative".into(),
            ));
        }
        if self.stress_factor <= Decimal::ZERO {
            return Err(BondCashFlowError::ConfigError(
                "stress_factor must be positive".into(),
            ));
        }
        if self.min_periodic_rate <= Decimal::ZERO {
            return Err(BondCashFlowError::ConfigError(
                "min_periodic_rate must be positive".into(),
            ));
        }
        Ok(())
    }
}

pub mod config;
pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "cash_flow")]
pub mod cash_flow;

#[cfg(feature = "portfolio")]
pub mod portfolio;

pub use config::{EngineConfig, PartialGraceBasis, YieldMethod};
pub use error::BondCashFlowError;
pub use types::*;

#[cfg(feature = "cash_flow")]
pub use cash_flow::{analyze_bond, compute_cash_flow, compute_cash_flow_with, BondTerms, CashFlowResult};

/// Standard result type for all bond cash-flow operations
pub type BondCashFlowResult<T> = Result<T, BondCashFlowError>;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BondCashFlowError {
    #[error("Invalid bond terms: {field}: {reason}")]
    InvalidTerms { field: String, reason: String },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Invalid engine configuration: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl BondCashFlowError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        BondCashFlowError::InvalidTerms {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Decimal overflow while deriving amounts from the nominal value.
    pub(crate) fn overflow(context: &str) -> Self {
        Self::invalid(
            "nominal_value",
            format!("Arithmetic overflow in {context}; nominal value is too large"),
        )
    }
}

impl From<serde_json::Error> for BondCashFlowError {
    fn from(e: serde_json::Error) -> Self {
        BondCashFlowError::SerializationError(e.to_string())
    }
}

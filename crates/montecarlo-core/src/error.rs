use thiserror::Error;

#[derive(Debug, Error)]
pub enum McError {
    #[error("Unsupported distribution kind: {0}")]
    UnsupportedDistributionKind(String),

    #[error("Missing parameter: variable '{variable}' requires '{parameter}'")]
    MissingParameter { variable: String, parameter: String },

    #[error("Invalid correlation matrix: {0}")]
    InvalidCorrelationMatrix(String),

    #[error("Correlation matrix Cholesky decomposition failed: {0}")]
    CorrelationFactorizationFailed(String),

    #[error("Invalid trial count: {0} (must be positive)")]
    InvalidTrialCount(usize),

    #[error("Invalid configuration value: {field} — {reason}")]
    InvalidConfigurationValue { field: String, reason: String },

    #[error("Outcome evaluation failed: {0}")]
    OutcomeEvaluation(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl McError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        McError::InvalidConfigurationValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for McError {
    fn from(e: serde_json::Error) -> Self {
        McError::SerializationError(e.to_string())
    }
}

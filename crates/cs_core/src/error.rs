use thiserror::Error;

use crate::gateway::GatewayError;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("payment gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("unrecognized plan token: {token}")]
    UnrecognizedPlan { token: String },
}

impl CoreError {
    /// Gateway failures may be retried by the user; the rest need a
    /// corrected input or a fixed product catalog.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Gateway(_))
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

//! Payment gateway boundary.
//!
//! Checkout creation and transaction verification are external round
//! trips. Both can fail without mutating any ledger; verification is
//! retryable by re-entering the resumption point.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("checkout session could not be created: {0}")]
    Checkout(String),

    #[error("transaction verification failed: {0}")]
    Verification(String),
}

/// What the gateway reports about a completed checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPurchase {
    pub paid: bool,
    /// Product token as the gateway names it; matched against the plan
    /// catalog during redemption.
    pub plan_token: String,
}

pub trait PaymentGateway {
    /// Create a checkout session and return the redirect URL.
    fn create_checkout(&self, plan_token: &str) -> Result<String, GatewayError>;

    /// Verify a transaction after returning from checkout.
    fn verify_transaction(&self, transaction_id: &str)
        -> Result<VerifiedPurchase, GatewayError>;
}

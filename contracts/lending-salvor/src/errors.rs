//! Typed errors for the lending contract; returned through `#[handle_result]`.
//! Expiry is distinct from insufficient balance so callers know whether to
//! re-sign an offer or top up.

use near_sdk_macros::NearSchema;

#[derive(NearSchema, near_sdk::FunctionError)]
#[abi(borsh, json)]
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum LendingError {
    Unauthorized(String),
    InvalidInput(String),
    NotFound(String),
    InvalidState(String),
    InsufficientBalance(String),
    Expired(String),
    SignatureInvalid(String),
}

impl std::fmt::Display for LendingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Self::NotFound(msg) => write!(f, "Not found: {}", msg),
            Self::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Self::InsufficientBalance(msg) => write!(f, "Insufficient balance: {}", msg),
            Self::Expired(msg) => write!(f, "Expired: {}", msg),
            Self::SignatureInvalid(msg) => write!(f, "Signature invalid: {}", msg),
        }
    }
}

impl LendingError {
    pub fn no_active_loan() -> Self {
        Self::NotFound("No active loan for this token".into())
    }
    pub fn only_borrower() -> Self {
        Self::Unauthorized("Only the borrower can perform this action".into())
    }
    pub fn only_lender() -> Self {
        Self::Unauthorized("Only the current lender can perform this action".into())
    }
}

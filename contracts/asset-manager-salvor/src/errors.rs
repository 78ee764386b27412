//! Typed error handling for the asset manager.
//!
//! Uses `#[derive(near_sdk::FunctionError)]` from the NEAR SDK to enable
//! `#[handle_result]` on public methods. When a method returns
//! `Err(AssetManagerError::Xxx)`, the SDK calls `env::panic_str()`
//! with the Display message — same on-wire behaviour as raw panics,
//! but with structured, testable code.

use near_sdk_macros::NearSchema;

use salvor_pool::PoolError;

#[derive(NearSchema, near_sdk::FunctionError)]
#[abi(borsh, json)]
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum AssetManagerError {
    /// Caller lacks permission (wrong owner, not whitelisted, etc.)
    Unauthorized(String),
    /// Invalid parameters, IDs, or data from the caller.
    InvalidInput(String),
    /// Requested entity does not exist.
    NotFound(String),
    /// Operation not allowed given current contract state.
    InvalidState(String),
    /// Bidding wallet cannot cover the requested amount.
    InsufficientBalance(String),
    /// A deadline has passed; callers re-sign or re-list rather than top up.
    Expired(String),
    /// Internal invariant violation (should never happen).
    InternalError(String),
}

impl std::fmt::Display for AssetManagerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Self::NotFound(msg) => write!(f, "Not found: {}", msg),
            Self::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Self::InsufficientBalance(msg) => write!(f, "Insufficient balance: {}", msg),
            Self::Expired(msg) => write!(f, "Expired: {}", msg),
            Self::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

// ── Factory helpers for common errors ────────────────────────────────────────

impl AssetManagerError {
    pub fn pool_not_found(id: &near_sdk::AccountId) -> Self {
        Self::NotFound(format!("No pool for collection {}", id))
    }
    pub fn listing_not_found() -> Self {
        Self::NotFound("Listing not found".into())
    }
    pub fn offer_not_found() -> Self {
        Self::NotFound("Offer not found".into())
    }
    pub fn insufficient_wallet(needed: u128, spendable: u128) -> Self {
        Self::InsufficientBalance(format!(
            "Bidding wallet holds {} spendable, {} required",
            spendable, needed
        ))
    }
    pub fn payout_exceeds_price(fee: u128, royalty: u128, price: u128) -> Self {
        Self::InvalidState(format!(
            "Fee {} + royalty {} exceeds price {}; misconfiguration, refusing to clamp",
            fee, royalty, price
        ))
    }
    pub fn only_owner() -> Self {
        Self::Unauthorized("Only the owner can perform this action".into())
    }
}

impl From<PoolError> for AssetManagerError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::InvalidFreeIndex | PoolError::InvalidNeighbor => {
                Self::InvalidInput(err.to_string())
            }
            PoolError::OutOfOrderInsert | PoolError::NodeNotActive => {
                Self::InvalidState(err.to_string())
            }
        }
    }
}

use near_sdk::json_types::{Base64VecU8, U128};
use near_sdk::{near, AccountId, BorshStorageKey};

#[derive(BorshStorageKey)]
#[near]
pub enum StorageKey {
    Balances,
    Loans,
    LenderKeys,
    UsedNonces,
    CollateralReturns,
}

/// Descending-price liquidation auction, armed the moment its loan opens.
/// Price is a piecewise-linear step function of elapsed time.
#[near(serializers = [borsh, json])]
#[derive(Clone)]
pub struct DutchAuction {
    /// Seconds. Equals the loan's repayment deadline.
    pub start_time: u64,
    pub duration_seconds: u64,
    pub drop_interval_seconds: u64,
    /// yoctoNEAR; 3x the full repayment.
    pub start_price: u128,
    /// yoctoNEAR; the full repayment (principal + full-duration interest).
    pub end_price: u128,
}

/// A receivable slice reassigned by the head lender at face value.
#[near(serializers = [borsh, json])]
#[derive(Clone)]
pub struct Delegation {
    pub lender_id: AccountId,
    /// Portion of the principal whose future proceeds belong to this lender.
    pub amount: u128,
}

/// An active loan. Absence of a record means "no loan".
#[near(serializers = [borsh, json])]
#[derive(Clone)]
pub struct Loan {
    pub borrower_id: AccountId,
    /// Head lender; receives proceeds net of delegations.
    pub lender_id: AccountId,
    /// yoctoNEAR.
    pub principal: u128,
    pub duration_seconds: u64,
    /// Full-duration interest rate scaled by 1e18 (1e17 = 10%).
    pub rate_per_ether: u128,
    /// Seconds.
    pub started_at: u64,
    pub auction: DutchAuction,
    pub delegations: Vec<Delegation>,
}

/// Terms a lender signs off-chain. Redeemed by the borrower inside the
/// collateral transfer.
#[near(serializers = [json])]
#[derive(Clone)]
pub struct LoanOffer {
    pub lender_id: AccountId,
    pub nft_contract_id: AccountId,
    pub token_id: String,
    pub principal: U128,
    pub duration_seconds: u64,
    /// Full-duration rate scaled by 1e18.
    pub rate_per_ether: U128,
    /// Single-use per lender.
    pub nonce: u64,
    /// Seconds. 0 = no expiry.
    pub expires_at: u64,
}

#[near(serializers = [json])]
#[derive(Clone)]
pub struct SignedLoanOffer {
    pub offer: LoanOffer,
    /// ed25519 signature over the canonical offer payload.
    pub signature: Base64VecU8,
}

#[near(serializers = [json])]
pub struct LoanView {
    pub nft_contract_id: AccountId,
    pub token_id: String,
    pub borrower_id: AccountId,
    pub lender_id: AccountId,
    pub principal: U128,
    pub duration_seconds: u64,
    pub rate_per_ether: U128,
    pub started_at: u64,
    pub auction_start_time: u64,
    pub auction_start_price: U128,
    pub auction_end_price: U128,
    pub delegations: Vec<Delegation>,
}

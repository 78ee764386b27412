//! Salvor Lending — NFT-collateralized loans funded by escrowed lender
//! balances, redeemed from ed25519-signed lender offers, with a Dutch
//! liquidation auction pre-armed at the repayment deadline.
//!
//! Collateral arrives through `nft_transfer_call`: the loan opens inside the
//! token receiver, so a rejected loan rolls the transfer back and the NFT
//! never leaves the borrower.

use near_sdk::json_types::U128;
use near_sdk::store::{IterableMap, LookupMap};
use near_sdk::{
    env, near, require, AccountId, Gas, NearToken, PanicOnDefault, Promise, PromiseOrValue,
    PublicKey, serde_json,
};

mod auction;
mod errors;
mod events;
mod offer_sig;
mod types;

pub use errors::LendingError;
pub use types::*;

use events::*;


const NS_PER_SEC: u64 = 1_000_000_000;
const SECONDS_PER_DAY: u64 = 86_400;
/// Rate scale: 1e18 = 100% over the full loan duration.
const RATE_PRECISION: u128 = 1_000_000_000_000_000_000;
/// Liquidation auctions open at a 3x multiple of the full repayment.
const AUCTION_START_PRICE_MULTIPLIER: u128 = 3;

const GAS_FOR_NFT_TRANSFER: Gas = Gas::from_tgas(20);
const GAS_FOR_CALLBACK: Gas = Gas::from_tgas(10);

fn now_seconds() -> u64 {
    env::block_timestamp() / NS_PER_SEC
}

/// Loan key: `"{nft_contract}:{token_id}"`.
/// ":" is not a valid character in NEAR account IDs, preventing collisions.
fn loan_key(nft_contract_id: &AccountId, token_id: &str) -> String {
    format!("{}:{}", nft_contract_id, token_id)
}

fn nonce_key(lender_id: &AccountId, nonce: u64) -> String {
    format!("{}:{}", lender_id, nonce)
}

#[near(contract_state)]
#[derive(PanicOnDefault)]
pub struct Lending {
    pub owner_id: AccountId,
    /// Receives the liquidation fee.
    pub treasury_id: AccountId,

    /// Escrowed native balances; lenders fund offers from here, borrowers
    /// receive principal here.
    pub balances: LookupMap<AccountId, u128>,
    /// Active loans keyed `"{nft_contract}:{token_id}"`. A deleted record is
    /// the terminal state.
    pub loans: IterableMap<String, Loan>,
    /// Offer-signing keys, registered by each lender.
    pub lender_keys: LookupMap<AccountId, PublicKey>,
    /// Consumed offer nonces, keyed `"{lender}:{nonce}"`.
    pub used_nonces: LookupMap<String, bool>,
    /// Collateral whose outbound transfer failed, keyed
    /// `"{nft_contract}:{token_id}"` → rightful receiver. Claimable anytime.
    pub collateral_returns: LookupMap<String, AccountId>,

    pub auction_duration_seconds: u64,
    pub drop_interval_seconds: u64,
}

#[near]
impl Lending {
    #[init]
    pub fn new(
        owner_id: AccountId,
        treasury_id: AccountId,
        auction_duration_seconds: u64,
        drop_interval_seconds: u64,
    ) -> Self {
        require!(
            drop_interval_seconds > 0 && auction_duration_seconds >= drop_interval_seconds,
            "Auction duration must cover at least one drop interval"
        );
        Self {
            owner_id,
            treasury_id,
            balances: LookupMap::new(StorageKey::Balances),
            loans: IterableMap::new(StorageKey::Loans),
            lender_keys: LookupMap::new(StorageKey::LenderKeys),
            used_nonces: LookupMap::new(StorageKey::UsedNonces),
            collateral_returns: LookupMap::new(StorageKey::CollateralReturns),
            auction_duration_seconds,
            drop_interval_seconds,
        }
    }

    // --- Balances ---

    #[payable]
    #[handle_result]
    pub fn deposit(&mut self) -> Result<(), LendingError> {
        let account_id = env::predecessor_account_id();
        let amount = env::attached_deposit().as_yoctonear();
        if amount == 0 {
            return Err(LendingError::InvalidInput("Deposit must be positive".into()));
        }
        self.internal_credit(&account_id, amount);
        emit_event(
            EVENT_BALANCE_DEPOSIT,
            &account_id,
            serde_json::json!({ "amount": amount.to_string() }),
        );
        Ok(())
    }

    #[handle_result]
    pub fn withdraw(&mut self, amount: U128) -> Result<Promise, LendingError> {
        let account_id = env::predecessor_account_id();
        self.internal_debit(&account_id, amount.0)?;
        emit_event(
            EVENT_BALANCE_WITHDRAW,
            &account_id,
            serde_json::json!({ "amount": amount.0.to_string() }),
        );
        Ok(Promise::new(account_id.clone())
            .transfer(NearToken::from_yoctonear(amount.0))
            .then(
                Self::ext(env::current_account_id())
                    .with_static_gas(GAS_FOR_CALLBACK)
                    .on_withdraw_resolved(account_id, amount),
            ))
    }

    #[private]
    pub fn on_withdraw_resolved(&mut self, account_id: AccountId, amount: U128) {
        if env::promise_result_checked(0, 0).is_err() {
            self.internal_credit(&account_id, amount.0);
        }
    }

    /// Register the key future offers from this lender will be verified
    /// against. Replacing the key invalidates unredeemed offers.
    #[handle_result]
    pub fn register_signing_key(&mut self, public_key: PublicKey) -> Result<(), LendingError> {
        let account_id = env::predecessor_account_id();
        self.lender_keys.insert(account_id.clone(), public_key);
        emit_event(
            EVENT_SIGNING_KEY_REGISTERED,
            &account_id,
            serde_json::json!({}),
        );
        Ok(())
    }

    // --- Borrow (NFT receiver) ---

    /// NEP-171 receiver: opens a loan against the transferred collateral.
    /// `msg` carries the lender's [`SignedLoanOffer`]. Any rejection panics,
    /// which makes the NFT contract roll the collateral transfer back.
    pub fn nft_on_transfer(
        &mut self,
        sender_id: AccountId,
        previous_owner_id: AccountId,
        token_id: String,
        msg: String,
    ) -> PromiseOrValue<bool> {
        let nft_contract_id = env::predecessor_account_id();
        let _ = sender_id;

        let signed: SignedLoanOffer = serde_json::from_str(&msg)
            .unwrap_or_else(|_| env::panic_str("Invalid loan offer message"));

        match self.internal_borrow(&previous_owner_id, &nft_contract_id, &token_id, signed) {
            Ok(()) => PromiseOrValue::Value(false),
            Err(err) => env::panic_str(&err.to_string()),
        }
    }

    // --- Repay / Extend / Delegate ---

    /// Repay principal plus day-prorated interest. Borrower only, only
    /// before the liquidation auction opens. Attached deposit (if any) is
    /// credited to the borrower's balance first.
    #[payable]
    #[handle_result]
    pub fn repay(
        &mut self,
        nft_contract_id: AccountId,
        token_id: String,
    ) -> Result<U128, LendingError> {
        let caller = env::predecessor_account_id();
        self.internal_credit(&caller, env::attached_deposit().as_yoctonear());

        let key = loan_key(&nft_contract_id, &token_id);
        let loan = self
            .loans
            .get(&key)
            .cloned()
            .ok_or_else(LendingError::no_active_loan)?;
        if loan.borrower_id != caller {
            return Err(LendingError::only_borrower());
        }
        let now = now_seconds();
        if now >= loan.auction.start_time {
            return Err(LendingError::Expired(
                "Repayment deadline passed; the liquidation auction is open".into(),
            ));
        }

        let repayment = Self::repayment_amount(&loan, now);
        self.internal_debit(&caller, repayment)?;
        self.internal_distribute_proceeds(&loan, repayment);

        self.loans.remove(&key);
        self.internal_return_collateral(&nft_contract_id, &token_id, &loan.borrower_id);

        emit_event(
            EVENT_LOAN_REPAID,
            &caller,
            serde_json::json!({
                "nft_contract_id": nft_contract_id.to_string(),
                "token_id": token_id,
                "repayment": repayment.to_string()
            }),
        );
        Ok(U128(repayment))
    }

    /// Settle the running interest to the current lender and roll the loan
    /// into a fresh one under a new signed offer (possibly a new lender).
    /// The collateral never leaves escrow.
    #[payable]
    #[handle_result]
    pub fn extend(
        &mut self,
        nft_contract_id: AccountId,
        token_id: String,
        signed_offer: SignedLoanOffer,
    ) -> Result<(), LendingError> {
        let caller = env::predecessor_account_id();
        self.internal_credit(&caller, env::attached_deposit().as_yoctonear());

        let key = loan_key(&nft_contract_id, &token_id);
        let loan = self
            .loans
            .get(&key)
            .cloned()
            .ok_or_else(LendingError::no_active_loan)?;
        if loan.borrower_id != caller {
            return Err(LendingError::only_borrower());
        }
        let now = now_seconds();
        if now >= loan.auction.start_time {
            return Err(LendingError::Expired(
                "Repayment deadline passed; the liquidation auction is open".into(),
            ));
        }

        let offer = signed_offer.offer.clone();
        self.validate_offer(&offer, &nft_contract_id, &token_id, &caller, &signed_offer)?;

        // New principal lands with the borrower, then the old loan is paid
        // off in full from the borrower's balance.
        let repayment = Self::repayment_amount(&loan, now);
        self.internal_debit(&offer.lender_id, offer.principal.0)?;
        self.internal_credit(&caller, offer.principal.0);
        self.internal_debit(&caller, repayment)?;
        self.internal_distribute_proceeds(&loan, repayment);

        self.used_nonces
            .insert(nonce_key(&offer.lender_id, offer.nonce), true);
        let new_loan = self.build_loan(&caller, &offer, now);
        self.loans.insert(key, new_loan);

        emit_event(
            EVENT_LOAN_EXTENDED,
            &caller,
            serde_json::json!({
                "nft_contract_id": nft_contract_id.to_string(),
                "token_id": token_id,
                "old_lender": loan.lender_id.to_string(),
                "new_lender": offer.lender_id.to_string(),
                "repayment": repayment.to_string(),
                "new_principal": offer.principal.0.to_string()
            }),
        );
        Ok(())
    }

    /// Reassign part of the receivable to a new lender at face value, paid
    /// now from the new lender's balance. The delegated portion's future
    /// proceeds flow to the new lender at settlement.
    #[handle_result]
    pub fn delegate(
        &mut self,
        nft_contract_id: AccountId,
        token_id: String,
        new_lender_id: AccountId,
        amount: U128,
    ) -> Result<(), LendingError> {
        let caller = env::predecessor_account_id();
        let key = loan_key(&nft_contract_id, &token_id);
        let mut loan = self
            .loans
            .get(&key)
            .cloned()
            .ok_or_else(LendingError::no_active_loan)?;
        if loan.lender_id != caller {
            return Err(LendingError::only_lender());
        }
        if new_lender_id == caller {
            return Err(LendingError::InvalidInput(
                "Cannot delegate to yourself".into(),
            ));
        }

        let already_delegated: u128 = loan.delegations.iter().map(|d| d.amount).sum();
        let amount = amount.0;
        if amount == 0 || amount > loan.principal - already_delegated {
            return Err(LendingError::InvalidInput(format!(
                "Delegated amount must be 1..={}",
                loan.principal - already_delegated
            )));
        }

        self.internal_debit(&new_lender_id, amount)?;
        self.internal_credit(&caller, amount);

        if let Some(existing) = loan
            .delegations
            .iter_mut()
            .find(|d| d.lender_id == new_lender_id)
        {
            existing.amount += amount;
        } else {
            loan.delegations.push(Delegation {
                lender_id: new_lender_id.clone(),
                amount,
            });
        }
        self.loans.insert(key, loan);

        emit_event(
            EVENT_LOAN_DELEGATED,
            &caller,
            serde_json::json!({
                "nft_contract_id": nft_contract_id.to_string(),
                "token_id": token_id,
                "new_lender": new_lender_id.to_string(),
                "amount": amount.to_string()
            }),
        );
        Ok(())
    }

    // --- Collateral recovery ---

    /// Re-fire a collateral transfer that previously failed to deliver.
    #[handle_result]
    pub fn reclaim_collateral(
        &mut self,
        nft_contract_id: AccountId,
        token_id: String,
    ) -> Result<(), LendingError> {
        let key = loan_key(&nft_contract_id, &token_id);
        let receiver = self
            .collateral_returns
            .get(&key)
            .cloned()
            .ok_or_else(|| LendingError::NotFound("No pending collateral return".into()))?;
        self.internal_return_collateral(&nft_contract_id, &token_id, &receiver);
        Ok(())
    }

    #[private]
    pub fn on_collateral_returned(
        &mut self,
        nft_contract_id: AccountId,
        token_id: String,
        receiver_id: AccountId,
    ) {
        let key = loan_key(&nft_contract_id, &token_id);
        if env::promise_result_checked(0, 0).is_ok() {
            self.collateral_returns.remove(&key);
        } else {
            // Keep the claim so the receiver can retry.
            self.collateral_returns.insert(key, receiver_id.clone());
            emit_event(
                EVENT_COLLATERAL_RETURN_PENDING,
                &receiver_id,
                serde_json::json!({
                    "nft_contract_id": nft_contract_id.to_string(),
                    "token_id": token_id
                }),
            );
        }
    }

    // --- Owner ---

    #[handle_result]
    pub fn set_auction_params(
        &mut self,
        auction_duration_seconds: u64,
        drop_interval_seconds: u64,
    ) -> Result<(), LendingError> {
        if env::predecessor_account_id() != self.owner_id {
            return Err(LendingError::Unauthorized("Only owner".into()));
        }
        if drop_interval_seconds == 0 || auction_duration_seconds < drop_interval_seconds {
            return Err(LendingError::InvalidInput(
                "Auction duration must cover at least one drop interval".into(),
            ));
        }
        self.auction_duration_seconds = auction_duration_seconds;
        self.drop_interval_seconds = drop_interval_seconds;
        emit_event(
            EVENT_PARAMS_UPDATED,
            &self.owner_id.clone(),
            serde_json::json!({
                "auction_duration_seconds": auction_duration_seconds,
                "drop_interval_seconds": drop_interval_seconds
            }),
        );
        Ok(())
    }

    // --- View ---

    pub fn get_balance(&self, account_id: AccountId) -> U128 {
        U128(self.balances.get(&account_id).copied().unwrap_or(0))
    }

    pub fn get_loan(&self, nft_contract_id: AccountId, token_id: String) -> Option<LoanView> {
        let loan = self.loans.get(&loan_key(&nft_contract_id, &token_id))?;
        Some(LoanView {
            nft_contract_id,
            token_id,
            borrower_id: loan.borrower_id.clone(),
            lender_id: loan.lender_id.clone(),
            principal: U128(loan.principal),
            duration_seconds: loan.duration_seconds,
            rate_per_ether: U128(loan.rate_per_ether),
            started_at: loan.started_at,
            auction_start_time: loan.auction.start_time,
            auction_start_price: U128(loan.auction.start_price),
            auction_end_price: U128(loan.auction.end_price),
            delegations: loan.delegations.clone(),
        })
    }

    /// What a repay right now would cost, or None once the auction is open.
    pub fn get_repayment_amount(
        &self,
        nft_contract_id: AccountId,
        token_id: String,
    ) -> Option<U128> {
        let loan = self.loans.get(&loan_key(&nft_contract_id, &token_id))?;
        let now = now_seconds();
        (now < loan.auction.start_time).then(|| U128(Self::repayment_amount(loan, now)))
    }

    pub fn get_signing_key(&self, account_id: AccountId) -> Option<PublicKey> {
        self.lender_keys.get(&account_id).cloned()
    }

    pub fn is_nonce_used(&self, lender_id: AccountId, nonce: u64) -> bool {
        self.used_nonces
            .get(&nonce_key(&lender_id, nonce))
            .copied()
            .unwrap_or(false)
    }

    pub fn pending_collateral_return(
        &self,
        nft_contract_id: AccountId,
        token_id: String,
    ) -> Option<AccountId> {
        self.collateral_returns
            .get(&loan_key(&nft_contract_id, &token_id))
            .cloned()
    }
}

impl Lending {
    pub(crate) fn internal_credit(&mut self, account_id: &AccountId, amount: u128) {
        if amount == 0 {
            return;
        }
        let balance = self.balances.get(account_id).copied().unwrap_or(0);
        self.balances.insert(account_id.clone(), balance + amount);
    }

    pub(crate) fn internal_debit(
        &mut self,
        account_id: &AccountId,
        amount: u128,
    ) -> Result<(), LendingError> {
        if amount == 0 {
            return Err(LendingError::InvalidInput("Amount must be positive".into()));
        }
        let balance = self.balances.get(account_id).copied().unwrap_or(0);
        if balance < amount {
            return Err(LendingError::InsufficientBalance(format!(
                "Balance {} < required {}",
                balance, amount
            )));
        }
        self.balances.insert(account_id.clone(), balance - amount);
        Ok(())
    }

    /// Interest prorated per started day, capped at the full-duration rate:
    /// `elapsed_days = elapsed/86400 + 1`; at or past `total_days` the full
    /// rate applies.
    pub(crate) fn repayment_amount(loan: &Loan, now: u64) -> u128 {
        let full_interest = loan.principal * loan.rate_per_ether / RATE_PRECISION;
        let total_days = loan.duration_seconds / SECONDS_PER_DAY;
        let elapsed_days = ((now.saturating_sub(loan.started_at)) / SECONDS_PER_DAY + 1) as u128;
        let interest = if total_days == 0 || elapsed_days >= total_days as u128 {
            full_interest
        } else {
            full_interest * elapsed_days / total_days as u128
        };
        loan.principal + interest
    }

    /// Split proceeds between the head lender and delegates, pro-rata by
    /// delegated principal.
    pub(crate) fn internal_distribute_proceeds(&mut self, loan: &Loan, amount: u128) {
        let mut remaining = amount;
        for delegation in &loan.delegations {
            let share = amount * delegation.amount / loan.principal;
            self.internal_credit(&delegation.lender_id, share);
            remaining -= share;
        }
        self.internal_credit(&loan.lender_id, remaining);
    }

    pub(crate) fn validate_offer(
        &self,
        offer: &LoanOffer,
        nft_contract_id: &AccountId,
        token_id: &str,
        borrower_id: &AccountId,
        signed: &SignedLoanOffer,
    ) -> Result<(), LendingError> {
        if &offer.nft_contract_id != nft_contract_id || offer.token_id != token_id {
            return Err(LendingError::InvalidInput(
                "Offer is for a different token".into(),
            ));
        }
        if &offer.lender_id == borrower_id {
            return Err(LendingError::InvalidInput(
                "Lender and borrower must differ".into(),
            ));
        }
        if offer.principal.0 == 0 {
            return Err(LendingError::InvalidInput(
                "Principal must be positive".into(),
            ));
        }
        if offer.expires_at != 0 && now_seconds() > offer.expires_at {
            return Err(LendingError::Expired("Loan offer has expired".into()));
        }
        if self
            .used_nonces
            .get(&nonce_key(&offer.lender_id, offer.nonce))
            .copied()
            .unwrap_or(false)
        {
            return Err(LendingError::InvalidState(
                "Offer nonce already redeemed".into(),
            ));
        }
        let public_key = self
            .lender_keys
            .get(&offer.lender_id)
            .ok_or_else(|| LendingError::NotFound("Lender has no registered signing key".into()))?;
        offer_sig::verify_loan_offer(offer, &signed.signature.0, public_key)
    }

    pub(crate) fn internal_borrow(
        &mut self,
        borrower_id: &AccountId,
        nft_contract_id: &AccountId,
        token_id: &str,
        signed: SignedLoanOffer,
    ) -> Result<(), LendingError> {
        let key = loan_key(nft_contract_id, token_id);
        if self.loans.contains_key(&key) {
            return Err(LendingError::InvalidState(
                "Token already collateralizes a loan".into(),
            ));
        }
        let offer = signed.offer.clone();
        self.validate_offer(&offer, nft_contract_id, token_id, borrower_id, &signed)?;

        self.internal_debit(&offer.lender_id, offer.principal.0)?;
        self.internal_credit(borrower_id, offer.principal.0);
        self.used_nonces
            .insert(nonce_key(&offer.lender_id, offer.nonce), true);

        let loan = self.build_loan(borrower_id, &offer, now_seconds());
        self.loans.insert(key, loan);

        emit_event(
            EVENT_LOAN_OPENED,
            borrower_id,
            serde_json::json!({
                "nft_contract_id": nft_contract_id.to_string(),
                "token_id": token_id,
                "lender_id": offer.lender_id.to_string(),
                "principal": offer.principal.0.to_string(),
                "duration_seconds": offer.duration_seconds,
                "rate_per_ether": offer.rate_per_ether.0.to_string()
            }),
        );
        Ok(())
    }

    /// Open a loan and pre-arm its liquidation auction: the auction starts
    /// the instant the repayment deadline passes, asking 3x the full
    /// repayment and stepping down to exactly the full repayment.
    pub(crate) fn build_loan(
        &self,
        borrower_id: &AccountId,
        offer: &LoanOffer,
        now: u64,
    ) -> Loan {
        let end_price =
            offer.principal.0 * (RATE_PRECISION + offer.rate_per_ether.0) / RATE_PRECISION;
        Loan {
            borrower_id: borrower_id.clone(),
            lender_id: offer.lender_id.clone(),
            principal: offer.principal.0,
            duration_seconds: offer.duration_seconds,
            rate_per_ether: offer.rate_per_ether.0,
            started_at: now,
            auction: DutchAuction {
                start_time: now + offer.duration_seconds,
                duration_seconds: self.auction_duration_seconds,
                drop_interval_seconds: self.drop_interval_seconds,
                start_price: AUCTION_START_PRICE_MULTIPLIER * end_price,
                end_price,
            },
            delegations: Vec::new(),
        }
    }

    /// Send collateral out, tracking the claim until delivery confirms.
    pub(crate) fn internal_return_collateral(
        &mut self,
        nft_contract_id: &AccountId,
        token_id: &str,
        receiver_id: &AccountId,
    ) {
        let key = loan_key(nft_contract_id, token_id);
        self.collateral_returns
            .insert(key, receiver_id.clone());
        ext_nft::ext(nft_contract_id.clone())
            .with_attached_deposit(NearToken::from_yoctonear(1))
            .with_static_gas(GAS_FOR_NFT_TRANSFER)
            .nft_transfer(receiver_id.clone(), token_id.to_string(), None, None)
            .then(
                Self::ext(env::current_account_id())
                    .with_static_gas(GAS_FOR_CALLBACK)
                    .on_collateral_returned(
                        nft_contract_id.clone(),
                        token_id.to_string(),
                        receiver_id.clone(),
                    ),
            );
    }
}

// External interfaces

#[near_sdk::ext_contract(ext_nft)]
pub trait Nft {
    fn nft_transfer(
        &mut self,
        receiver_id: AccountId,
        token_id: String,
        approval_id: Option<u64>,
        memo: Option<String>,
    );
}

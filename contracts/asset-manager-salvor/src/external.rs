// External contract interfaces for cross-contract calls
//
// `#[ext_contract]` generates helper structs that the compiler flags as dead_code
// even though they are used at runtime for cross-contract calls.
#![allow(dead_code)]

use near_sdk::json_types::U128;
use near_sdk::{AccountId, ext_contract};

use crate::types::{FundsSource, ListingRestore};

/// External NFT contract interface (NEP-171 / NEP-178).
#[ext_contract(ext_nft)]
pub trait ExtNftContract {
    fn nft_transfer(
        &mut self,
        receiver_id: AccountId,
        token_id: String,
        approval_id: Option<u64>,
        memo: Option<String>,
    );
}

/// The veART staking contract: receives the reward share of every commission.
#[ext_contract(ext_veart)]
pub trait ExtVeArt {
    fn deposit_rewards(&mut self);
}

/// Self-callbacks resolving the promise legs of settlement and payouts.
#[ext_contract(ext_self)]
pub trait ExtSelf {
    fn resolve_sale(
        &mut self,
        buyer_id: AccountId,
        seller_id: AccountId,
        nft_contract_id: AccountId,
        token_id: String,
        price: U128,
        fee: U128,
        royalty: U128,
        royalty_receiver: Option<AccountId>,
        funds_source: FundsSource,
        restore: Option<ListingRestore>,
    ) -> U128;

    fn on_withdraw_resolved(&mut self, account_id: AccountId, amount: U128);

    fn on_failed_claim_resolved(&mut self, account_id: AccountId, amount: U128);

    fn on_external_payout_resolved(&mut self, receiver_id: AccountId, amount: U128, context: String);
}

//! veART staking — ART and Salvor-NFT staking with multi-stream
//! MasterChef-style reward distribution, plus stake-share pushes that drive
//! the asset manager's commission discount curve.
//!
//! Streams:
//! - ART emission over staked ART (time-based rate, paid from a funded
//!   ART treasury);
//! - native rewards over staked ART (fed by marketplace commissions);
//! - native rewards over staked NFTs (the secondary pool).
//!
//! An incoming native reward deposit is split 80/20 between the ART-stake
//! and NFT-stake streams while the NFT pool has shares, else 100% primary.

use near_sdk::json_types::U128;
use near_sdk::store::LookupMap;
use near_sdk::{
    env, near, require, AccountId, Gas, NearToken, PanicOnDefault, Promise, PromiseOrValue,
    serde_json,
};

use salvor_pool::RewardAccumulator;

mod errors;
mod events;
mod state;

pub use errors::VeArtError;
pub use state::*;

use events::*;


const NS_PER_SEC: u64 = 1_000_000_000;
const BASIS_POINTS: u128 = 10_000;
/// Share of a native reward deposit routed to the NFT-stake stream when it
/// has shares. The 80/20 ratio and its empty-pool fallback are economic
/// constants; preserve exactly.
const SECONDARY_SPLIT_PERCENT: u128 = 20;

const GAS_FOR_FT_TRANSFER: Gas = Gas::from_tgas(15);
const GAS_FOR_NFT_TRANSFER: Gas = Gas::from_tgas(20);
const GAS_FOR_CALLBACK: Gas = Gas::from_tgas(10);
const GAS_FOR_SHARE_PUSH: Gas = Gas::from_tgas(10);

fn now_seconds() -> u64 {
    env::block_timestamp() / NS_PER_SEC
}

#[near(contract_state)]
#[derive(PanicOnDefault)]
pub struct VeArt {
    pub art_token_id: AccountId,
    pub nft_contract_id: AccountId,
    pub asset_manager_id: AccountId,
    pub owner_id: AccountId,

    pub accounts: LookupMap<AccountId, Account>,
    /// token_id → staker; tokens are held by this contract while staked.
    pub staked_nfts: LookupMap<String, AccountId>,
    /// Platforms allowed to deposit native rewards (the asset manager).
    pub platforms: LookupMap<AccountId, bool>,

    /// ART emission over staked ART.
    pub art_emission: RewardAccumulator,
    /// Native rewards over staked ART (deposit-fed).
    pub native_primary: RewardAccumulator,
    /// Native rewards over staked NFTs (deposit-fed).
    pub native_secondary: RewardAccumulator,

    pub total_art_staked: u128,
    pub total_nfts_staked: u128,
    /// ART backing emission payouts; funded by the owner via ft_on_transfer.
    pub art_reward_treasury: u128,
    /// Native reward that arrived while both pools were empty; flushed into
    /// the primary stream on the next deposit that finds shares.
    pub undistributed_native: u128,
}

#[near]
impl VeArt {
    #[init]
    pub fn new(
        art_token_id: AccountId,
        nft_contract_id: AccountId,
        asset_manager_id: AccountId,
        owner_id: AccountId,
        art_emission_rate_per_second: U128,
    ) -> Self {
        Self {
            art_token_id,
            nft_contract_id,
            asset_manager_id,
            owner_id,
            accounts: LookupMap::new(StorageKey::Accounts),
            staked_nfts: LookupMap::new(StorageKey::StakedNfts),
            platforms: LookupMap::new(StorageKey::Platforms),
            art_emission: RewardAccumulator::new(art_emission_rate_per_second.0, now_seconds()),
            native_primary: RewardAccumulator::new(0, now_seconds()),
            native_secondary: RewardAccumulator::new(0, now_seconds()),
            total_art_staked: 0,
            total_nfts_staked: 0,
            art_reward_treasury: 0,
            undistributed_native: 0,
        }
    }

    // --- FT Receiver ---

    /// Handles: `{"action":"stake"}`, `{"action":"emission"}` (owner only).
    pub fn ft_on_transfer(&mut self, sender_id: AccountId, amount: U128, msg: String) -> U128 {
        require!(
            env::predecessor_account_id() == self.art_token_id,
            "Only accepts the ART token"
        );
        let amount = amount.0;
        require!(amount > 0, "Amount must be positive");

        let parsed: serde_json::Value =
            serde_json::from_str(&msg).unwrap_or_else(|_| env::panic_str("Invalid JSON message"));
        let action = parsed["action"]
            .as_str()
            .unwrap_or_else(|| env::panic_str("Missing action field"));

        match action {
            "stake" => self.internal_stake(sender_id, amount),
            "emission" => {
                require!(sender_id == self.owner_id, "Only owner can fund emission");
                self.art_reward_treasury += amount;
                emit_event(
                    EVENT_EMISSION_FUNDED,
                    &self.owner_id.clone(),
                    serde_json::json!({ "amount": amount.to_string() }),
                );
            }
            _ => env::panic_str("Unknown action"),
        }

        U128(0)
    }

    // --- NFT Receiver ---

    /// Stakes a Salvor NFT: one share of the secondary native stream.
    /// Returning false keeps the token in this contract's custody.
    pub fn nft_on_transfer(
        &mut self,
        sender_id: AccountId,
        previous_owner_id: AccountId,
        token_id: String,
        msg: String,
    ) -> PromiseOrValue<bool> {
        require!(
            env::predecessor_account_id() == self.nft_contract_id,
            "Only accepts the Salvor NFT collection"
        );
        let _ = (sender_id, msg);

        let mut account = self
            .accounts
            .get(&previous_owner_id)
            .cloned()
            .unwrap_or_default();
        let pending = self
            .native_secondary
            .deposit_shares(&mut account.nft_position, 1, now_seconds());
        account.pending_native = U128(account.pending_native.0 + pending);
        account.nft_count += 1;
        self.accounts.insert(previous_owner_id.clone(), account);
        self.staked_nfts
            .insert(token_id.clone(), previous_owner_id.clone());
        self.total_nfts_staked += 1;

        emit_event(
            EVENT_NFT_STAKE,
            &previous_owner_id,
            serde_json::json!({ "token_id": token_id }),
        );
        PromiseOrValue::Value(false)
    }

    // --- User ---

    /// Unstake ART. State is finalized in the callback once the token
    /// transfer succeeded.
    #[handle_result]
    pub fn withdraw_stake(&mut self, amount: U128) -> Result<Promise, VeArtError> {
        let account_id = env::predecessor_account_id();
        let account = self
            .accounts
            .get(&account_id)
            .ok_or_else(|| VeArtError::NotFound("No account found".into()))?;
        if amount.0 == 0 {
            return Err(VeArtError::InvalidInput("Amount must be positive".into()));
        }
        if account.staked_amount.0 < amount.0 {
            return Err(VeArtError::InsufficientBalance(format!(
                "Staked {} < requested {}",
                account.staked_amount.0, amount.0
            )));
        }

        Ok(self
            .ft_transfer(account_id.clone(), amount.0)
            .then(
                Self::ext(env::current_account_id())
                    .with_static_gas(GAS_FOR_CALLBACK)
                    .on_withdraw_stake(account_id, amount),
            ))
    }

    #[private]
    pub fn on_withdraw_stake(&mut self, account_id: AccountId, amount: U128) {
        if env::promise_result_checked(0, 0).is_err() {
            return;
        }
        self.internal_finalize_unstake(&account_id, amount.0);
    }

    /// Return a staked NFT to its staker.
    #[handle_result]
    pub fn withdraw_nft(&mut self, token_id: String) -> Result<Promise, VeArtError> {
        let account_id = env::predecessor_account_id();
        let staker = self
            .staked_nfts
            .get(&token_id)
            .ok_or_else(|| VeArtError::NotFound("Token is not staked".into()))?;
        if staker != &account_id {
            return Err(VeArtError::Unauthorized(
                "Only the staker can withdraw this token".into(),
            ));
        }

        Ok(self
            .nft_transfer(account_id.clone(), token_id.clone())
            .then(
                Self::ext(env::current_account_id())
                    .with_static_gas(GAS_FOR_CALLBACK)
                    .on_withdraw_nft(account_id, token_id),
            ))
    }

    #[private]
    pub fn on_withdraw_nft(&mut self, account_id: AccountId, token_id: String) {
        if env::promise_result_checked(0, 0).is_err() {
            return;
        }
        self.internal_finalize_nft_unstake(&account_id, &token_id);
    }

    /// Claim every stream. Native pays out directly; ART pays from the
    /// emission treasury and is held back (not lost) while it cannot cover
    /// the claim.
    #[handle_result]
    pub fn harvest(&mut self) -> Result<(), VeArtError> {
        let account_id = env::predecessor_account_id();
        let mut account = self
            .accounts
            .get(&account_id)
            .cloned()
            .ok_or_else(|| VeArtError::NotFound("No account found".into()))?;

        self.internal_checkpoint_art_streams(&mut account);
        let nft_pending = self
            .native_secondary
            .harvest(&mut account.nft_position, now_seconds());
        account.pending_native = U128(account.pending_native.0 + nft_pending);

        let native = account.pending_native.0;
        let art = account.pending_art.0;
        if native == 0 && art == 0 {
            self.accounts.insert(account_id, account);
            return Err(VeArtError::NotFound("No rewards to claim".into()));
        }
        self.accounts.insert(account_id.clone(), account);

        if native > 0 {
            Promise::new(account_id.clone())
                .transfer(NearToken::from_yoctonear(native))
                .then(
                    Self::ext(env::current_account_id())
                        .with_static_gas(GAS_FOR_CALLBACK)
                        .on_native_reward_paid(account_id.clone(), U128(native)),
                );
        }
        if art > 0 && self.art_reward_treasury >= art {
            self.ft_transfer(account_id.clone(), art).then(
                Self::ext(env::current_account_id())
                    .with_static_gas(GAS_FOR_CALLBACK)
                    .on_art_reward_paid(account_id, U128(art)),
            );
        }
        Ok(())
    }

    #[private]
    pub fn on_native_reward_paid(&mut self, account_id: AccountId, amount: U128) {
        if env::promise_result_checked(0, 0).is_err() {
            // Undelivered reward stays pending and rides into the next claim.
            return;
        }
        self.internal_finalize_native_claim(&account_id, amount.0);
    }

    #[private]
    pub fn on_art_reward_paid(&mut self, account_id: AccountId, amount: U128) {
        if env::promise_result_checked(0, 0).is_err() {
            return;
        }
        self.internal_finalize_art_claim(&account_id, amount.0);
    }

    // --- Reward intake ---

    /// Accept a native reward deposit from a whitelisted platform and split
    /// it across the two native streams: 80/20 while the NFT pool has
    /// shares, otherwise everything to the ART-stake stream.
    #[payable]
    #[handle_result]
    pub fn deposit_rewards(&mut self) -> Result<(), VeArtError> {
        let caller = env::predecessor_account_id();
        if self.platforms.get(&caller).copied() != Some(true) {
            return Err(VeArtError::Unauthorized(
                "Only whitelisted platforms can deposit rewards".into(),
            ));
        }
        let amount = env::attached_deposit().as_yoctonear();
        if amount == 0 {
            return Err(VeArtError::InvalidInput("Deposit must be positive".into()));
        }

        let total = amount + self.undistributed_native;
        self.undistributed_native = 0;

        let secondary_amount = if self.native_secondary.has_shares() {
            total * SECONDARY_SPLIT_PERCENT / 100
        } else {
            0
        };
        let primary_amount = total - secondary_amount;

        let distributed_secondary = self.native_secondary.inject(secondary_amount);
        let distributed_primary = self.native_primary.inject(primary_amount);
        // Whatever found no shares waits for the next deposit.
        self.undistributed_native =
            total - distributed_secondary - distributed_primary;

        emit_event(
            EVENT_REWARDS_DEPOSIT,
            &caller,
            serde_json::json!({
                "amount": amount.to_string(),
                "primary": distributed_primary.to_string(),
                "secondary": distributed_secondary.to_string()
            }),
        );
        Ok(())
    }

    // --- Owner ---

    #[handle_result]
    pub fn add_platform(&mut self, platform_id: AccountId) -> Result<(), VeArtError> {
        self.assert_owner()?;
        self.platforms.insert(platform_id.clone(), true);
        emit_event(
            EVENT_PLATFORM_ADDED,
            &self.owner_id.clone(),
            serde_json::json!({ "platform_id": platform_id.to_string() }),
        );
        Ok(())
    }

    #[handle_result]
    pub fn remove_platform(&mut self, platform_id: AccountId) -> Result<(), VeArtError> {
        self.assert_owner()?;
        self.platforms.remove(&platform_id);
        emit_event(
            EVENT_PLATFORM_REMOVED,
            &self.owner_id.clone(),
            serde_json::json!({ "platform_id": platform_id.to_string() }),
        );
        Ok(())
    }

    /// Change the ART emission rate; accrual up to now keeps the old rate.
    #[handle_result]
    pub fn set_art_emission_rate(&mut self, rate_per_second: U128) -> Result<(), VeArtError> {
        self.assert_owner()?;
        self.art_emission.set_rate(rate_per_second.0, now_seconds());
        emit_event(
            EVENT_PARAMS_UPDATED,
            &self.owner_id.clone(),
            serde_json::json!({
                "param": "art_emission_rate_per_second",
                "new_value": rate_per_second.0.to_string()
            }),
        );
        Ok(())
    }

    #[handle_result]
    pub fn set_owner(&mut self, new_owner: AccountId) -> Result<(), VeArtError> {
        self.assert_owner()?;
        let old_owner = self.owner_id.clone();
        self.owner_id = new_owner.clone();
        emit_event(
            EVENT_PARAMS_UPDATED,
            &old_owner,
            serde_json::json!({
                "param": "owner",
                "new_value": new_owner.to_string()
            }),
        );
        Ok(())
    }

    // --- View ---

    pub fn get_account(&self, account_id: AccountId) -> Account {
        self.accounts.get(&account_id).cloned().unwrap_or_default()
    }

    pub fn get_staker_of(&self, token_id: String) -> Option<AccountId> {
        self.staked_nfts.get(&token_id).cloned()
    }

    pub fn is_platform(&self, account_id: AccountId) -> bool {
        self.platforms.get(&account_id).copied() == Some(true)
    }

    /// Projected claimable amounts per stream, including held-back credits.
    pub fn pending_rewards(&self, account_id: AccountId) -> PendingRewards {
        let account = self.accounts.get(&account_id).cloned().unwrap_or_default();
        let now = now_seconds();

        let mut art_emission = self.art_emission.clone();
        art_emission.update(now);
        let art = account.pending_art.0 + art_emission.pending(&account.art_position);

        let native = account.pending_native.0
            + self.native_primary.pending(&account.native_position)
            + self.native_secondary.pending(&account.nft_position);

        PendingRewards {
            native: U128(native),
            art: U128(art),
        }
    }

    pub fn get_stats(&self) -> ContractStats {
        ContractStats {
            art_token_id: self.art_token_id.clone(),
            nft_contract_id: self.nft_contract_id.clone(),
            asset_manager_id: self.asset_manager_id.clone(),
            owner_id: self.owner_id.clone(),
            total_art_staked: U128(self.total_art_staked),
            total_nfts_staked: U128(self.total_nfts_staked),
            art_emission_rate_per_second: U128(self.art_emission.reward_rate_per_second),
            art_reward_treasury: U128(self.art_reward_treasury),
            undistributed_native: U128(self.undistributed_native),
        }
    }

    // --- Internal ---

    fn assert_owner(&self) -> Result<(), VeArtError> {
        if env::predecessor_account_id() != self.owner_id {
            return Err(VeArtError::Unauthorized("Only owner".into()));
        }
        Ok(())
    }

    fn internal_stake(&mut self, account_id: AccountId, amount: u128) {
        let mut account = self.accounts.get(&account_id).cloned().unwrap_or_default();

        self.internal_checkpoint_art_streams(&mut account);
        self.art_emission
            .deposit_shares(&mut account.art_position, amount, now_seconds());
        self.native_primary
            .deposit_shares(&mut account.native_position, amount, now_seconds());
        account.staked_amount = U128(account.staked_amount.0 + amount);
        self.total_art_staked += amount;
        self.accounts.insert(account_id.clone(), account);

        self.push_stake_share(&account_id);
        emit_event(
            EVENT_ART_STAKE,
            &account_id,
            serde_json::json!({ "amount": amount.to_string() }),
        );
    }

    /// Apply a confirmed unstake: checkpoint, drop shares on both ART
    /// streams, and push the new share to the asset manager.
    pub(crate) fn internal_finalize_unstake(&mut self, account_id: &AccountId, amount: u128) {
        let mut account = self.accounts.get(account_id).cloned().unwrap_or_default();
        let amount = amount.min(account.staked_amount.0);

        self.internal_checkpoint_art_streams(&mut account);
        self.art_emission
            .withdraw_shares(&mut account.art_position, amount, now_seconds());
        self.native_primary
            .withdraw_shares(&mut account.native_position, amount, now_seconds());
        account.staked_amount = U128(account.staked_amount.0 - amount);
        self.total_art_staked -= amount;
        self.accounts.insert(account_id.clone(), account);

        self.push_stake_share(account_id);
        emit_event(
            EVENT_ART_UNSTAKE,
            account_id,
            serde_json::json!({ "amount": amount.to_string() }),
        );
    }

    /// Apply a confirmed NFT unstake.
    pub(crate) fn internal_finalize_nft_unstake(&mut self, account_id: &AccountId, token_id: &str) {
        if self.staked_nfts.remove(token_id).is_none() {
            return;
        }
        let mut account = self.accounts.get(account_id).cloned().unwrap_or_default();
        let pending = self
            .native_secondary
            .withdraw_shares(&mut account.nft_position, 1, now_seconds());
        account.pending_native = U128(account.pending_native.0 + pending);
        account.nft_count = account.nft_count.saturating_sub(1);
        self.accounts.insert(account_id.clone(), account);
        self.total_nfts_staked -= 1;

        emit_event(
            EVENT_NFT_UNSTAKE,
            account_id,
            serde_json::json!({ "token_id": token_id }),
        );
    }

    /// Apply a confirmed native reward delivery.
    pub(crate) fn internal_finalize_native_claim(&mut self, account_id: &AccountId, amount: u128) {
        let mut account = self.accounts.get(account_id).cloned().unwrap_or_default();
        account.pending_native = U128(account.pending_native.0.saturating_sub(amount));
        self.accounts.insert(account_id.clone(), account);
        emit_event(
            EVENT_REWARDS_CLAIM,
            account_id,
            serde_json::json!({ "stream": "native", "amount": amount.to_string() }),
        );
    }

    /// Apply a confirmed ART reward delivery.
    pub(crate) fn internal_finalize_art_claim(&mut self, account_id: &AccountId, amount: u128) {
        let mut account = self.accounts.get(account_id).cloned().unwrap_or_default();
        account.pending_art = U128(account.pending_art.0.saturating_sub(amount));
        self.accounts.insert(account_id.clone(), account);
        self.art_reward_treasury = self.art_reward_treasury.saturating_sub(amount);
        emit_event(
            EVENT_REWARDS_CLAIM,
            account_id,
            serde_json::json!({ "stream": "art", "amount": amount.to_string() }),
        );
    }

    /// Checkpoint the two ART-share streams into the account's pending
    /// buckets, so a following share change starts from zero pending.
    fn internal_checkpoint_art_streams(&mut self, account: &mut Account) {
        let now = now_seconds();
        let art = self.art_emission.harvest(&mut account.art_position, now);
        account.pending_art = U128(account.pending_art.0 + art);
        let native = self
            .native_primary
            .harvest(&mut account.native_position, now);
        account.pending_native = U128(account.pending_native.0 + native);
    }

    /// Push the account's share of total staked ART (in 1/10,000 units) to
    /// the asset manager, which feeds its commission discount curve.
    fn push_stake_share(&self, account_id: &AccountId) {
        let account = self.accounts.get(account_id).cloned().unwrap_or_default();
        let share_bps = if self.total_art_staked == 0 {
            0
        } else {
            (account.staked_amount.0 * BASIS_POINTS / self.total_art_staked) as u16
        };
        ext_asset_manager::ext(self.asset_manager_id.clone())
            .with_static_gas(GAS_FOR_SHARE_PUSH)
            .set_stake_share_bps(account_id.clone(), share_bps);
    }

    fn ft_transfer(&self, receiver_id: AccountId, amount: u128) -> Promise {
        ext_ft::ext(self.art_token_id.clone())
            .with_attached_deposit(NearToken::from_yoctonear(1))
            .with_static_gas(GAS_FOR_FT_TRANSFER)
            .ft_transfer(receiver_id, U128(amount), None)
    }

    fn nft_transfer(&self, receiver_id: AccountId, token_id: String) -> Promise {
        ext_nft::ext(self.nft_contract_id.clone())
            .with_attached_deposit(NearToken::from_yoctonear(1))
            .with_static_gas(GAS_FOR_NFT_TRANSFER)
            .nft_transfer(receiver_id, token_id, None, None)
    }
}

// External interfaces

#[near_sdk::ext_contract(ext_ft)]
pub trait Ft {
    fn ft_transfer(&mut self, receiver_id: AccountId, amount: U128, memo: Option<String>);
}

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

#[near_sdk::ext_contract(ext_asset_manager)]
pub trait AssetManager {
    fn set_stake_share_bps(&mut self, account_id: AccountId, share_bps: u16);
}

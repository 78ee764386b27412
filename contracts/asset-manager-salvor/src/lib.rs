//! Salvor Asset Manager — escrowed bidding wallets, sale settlement with
//! fee/royalty routing, and reward-bearing listing pools anchored to a
//! floor-price ordered list.

use near_sdk::store::{IterableMap, IterableSet, LookupMap};
use near_sdk::{AccountId, BorshStorageKey, PanicOnDefault, env, near};

use salvor_pool::Position;

// --- Modules ---

mod admin;
pub mod constants;
mod errors;
mod events;
mod external;
mod fees;
mod ledger;
mod offers;
mod payout;
mod pool;
mod royalties;
pub mod types;

pub use constants::*;
pub use errors::AssetManagerError;
pub use types::*;

#[cfg(test)]
mod tests;

// --- Helpers ---

/// Seconds since the epoch; reward accrual and deadlines run on seconds.
pub(crate) fn now_seconds() -> u64 {
    env::block_timestamp() / NS_PER_SEC
}

/// Key for a listing: `"{nft_contract}:{token_id}"`.
/// ":" is not a valid character in NEAR account IDs, preventing collisions.
pub(crate) fn listing_key(nft_contract_id: &AccountId, token_id: &str) -> String {
    format!("{}{}{}", nft_contract_id, DELIMETER, token_id)
}

/// Key for a (pool, account) reward position.
pub(crate) fn position_key(nft_contract_id: &AccountId, account_id: &AccountId) -> String {
    format!("{}{}{}", nft_contract_id, DELIMETER, account_id)
}

/// Key for an offer: `"{nft_contract}:{token_id}\0{buyer_id}"`.
pub(crate) fn offer_key(
    nft_contract_id: &AccountId,
    token_id: &str,
    buyer_id: &AccountId,
) -> String {
    format!("{}{}{}\0{}", nft_contract_id, DELIMETER, token_id, buyer_id)
}

// --- Storage Keys ---

#[near]
#[derive(BorshStorageKey)]
pub enum StorageKey {
    Wallets,
    Pools,
    Positions,
    Listings,
    ListingTokens,
    Offers,
    RoyaltyConfigs,
    StakeShares,
    Platforms,
}

// --- Contract State ---

#[near(contract_state)]
#[derive(PanicOnDefault)]
pub struct AssetManager {
    pub owner_id: AccountId,
    /// Receives the protocol's share of sale commissions.
    pub treasury_id: AccountId,
    /// The veART staking contract; sole caller allowed to push stake shares,
    /// and the sink for the reward share of every commission.
    pub veart_id: AccountId,

    /// Bidding wallets. Never deleted; balances may fall to zero.
    pub wallets: LookupMap<AccountId, Wallet>,

    /// Listing pools, keyed by NFT contract.
    pub pools: IterableMap<AccountId, ListingPool>,
    /// Reward positions, keyed `"{nft_contract}:{account}"`.
    pub positions: LookupMap<String, Position>,
    /// Active listings, keyed `"{nft_contract}:{token_id}"`.
    pub listings: LookupMap<String, ListingRecord>,
    /// listing_id → token_id reverse index, keyed `"{nft_contract}:{listing_id}"`.
    pub listing_tokens: LookupMap<String, String>,

    /// Escrow-funded offers on listed or unlisted tokens.
    pub offers: IterableMap<String, Offer>,

    /// Per-collection royalty configuration.
    pub royalty_configs: LookupMap<AccountId, RoyaltyConfig>,

    /// Staked-share of each account in 1/10,000 units, pushed by veART.
    pub stake_share_bps: LookupMap<AccountId, u16>,

    /// Platforms allowed to drive settlement on behalf of their users.
    pub whitelisted_platforms: IterableSet<AccountId>,

    /// Base commission applied when a sale has no pool context.
    pub commission_bps: u16,
    /// Fallback royalty rate for collections without an explicit config.
    pub default_royalty_bps: u16,
    /// Whether the staked-share fee discount curve is applied.
    pub fee_discount_enabled: bool,
    /// Portion of every commission forwarded to veART as staking rewards.
    pub reward_share_bps: u16,

    /// Native balance backing listing-reward harvests.
    pub listing_reward_fund: u128,
}

#[near]
impl AssetManager {
    #[init]
    pub fn new(owner_id: AccountId, treasury_id: AccountId, veart_id: AccountId) -> Self {
        Self {
            owner_id,
            treasury_id,
            veart_id,
            wallets: LookupMap::new(StorageKey::Wallets),
            pools: IterableMap::new(StorageKey::Pools),
            positions: LookupMap::new(StorageKey::Positions),
            listings: LookupMap::new(StorageKey::Listings),
            listing_tokens: LookupMap::new(StorageKey::ListingTokens),
            offers: IterableMap::new(StorageKey::Offers),
            royalty_configs: LookupMap::new(StorageKey::RoyaltyConfigs),
            stake_share_bps: LookupMap::new(StorageKey::StakeShares),
            whitelisted_platforms: IterableSet::new(StorageKey::Platforms),
            commission_bps: DEFAULT_COMMISSION_BPS,
            default_royalty_bps: 0,
            fee_discount_enabled: true,
            reward_share_bps: DEFAULT_REWARD_SHARE_BPS,
            listing_reward_fund: 0,
        }
    }

    pub fn get_stats(&self) -> ContractStats {
        ContractStats {
            owner_id: self.owner_id.clone(),
            treasury_id: self.treasury_id.clone(),
            veart_id: self.veart_id.clone(),
            pool_count: self.pools.len() as u64,
            commission_bps: self.commission_bps,
            default_royalty_bps: self.default_royalty_bps,
            fee_discount_enabled: self.fee_discount_enabled,
            reward_share_bps: self.reward_share_bps,
            listing_reward_fund: near_sdk::json_types::U128(self.listing_reward_fund),
        }
    }
}

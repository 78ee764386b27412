use near_sdk::json_types::U128;
use near_sdk::{near, AccountId, BorshStorageKey};

use salvor_pool::Position;

#[derive(BorshStorageKey)]
#[near]
pub enum StorageKey {
    Accounts,
    StakedNfts,
    Platforms,
}

/// Per-staker state. One entry covers all three reward streams; each stream
/// keeps its own debt snapshot inside its [`Position`].
#[derive(Clone, Default)]
#[near(serializers = [json, borsh])]
pub struct Account {
    /// ART tokens staked.
    pub staked_amount: U128,
    /// Salvor NFTs staked (one secondary share each).
    pub nft_count: u64,
    /// ART emission stream (shares = staked ART).
    pub art_position: Position,
    /// Native reward stream over ART stake (shares = staked ART).
    pub native_position: Position,
    /// Native reward stream over staked NFTs (shares = nft_count).
    pub nft_position: Position,
    /// Checkpointed-but-unclaimed native reward; paid out by `harvest`.
    /// An undeliverable payout stays here and rides into the next harvest.
    pub pending_native: U128,
    /// Checkpointed-but-unclaimed ART emission; held back while the ART
    /// reward treasury cannot cover it.
    pub pending_art: U128,
}

#[near(serializers = [json])]
pub struct PendingRewards {
    pub native: U128,
    pub art: U128,
}

#[near(serializers = [json])]
pub struct ContractStats {
    pub art_token_id: AccountId,
    pub nft_contract_id: AccountId,
    pub asset_manager_id: AccountId,
    pub owner_id: AccountId,
    pub total_art_staked: U128,
    pub total_nfts_staked: U128,
    pub art_emission_rate_per_second: U128,
    pub art_reward_treasury: U128,
    pub undistributed_native: U128,
}

use near_sdk::json_types::U128;
use near_sdk::{AccountId, near};

use salvor_pool::{FloorList, RewardAccumulator};

// --- Ledger ---

/// A bidding wallet: escrowed native balance usable to fund purchases and
/// offers without a fresh external transfer per action.
#[near(serializers = [borsh, json])]
#[derive(Clone, Default)]
pub struct Wallet {
    /// yoctoNEAR available for spending or withdrawal.
    pub available: u128,
    /// Portion of `available` committed to outstanding offers; withdrawals
    /// may not dip into it.
    pub locked_in_offers: u128,
    /// Payments that could not be delivered; claimable at any time.
    pub failed_transfer_balance: u128,
}

impl Wallet {
    /// Headroom not committed to offers.
    pub fn spendable(&self) -> u128 {
        self.available.saturating_sub(self.locked_in_offers)
    }
}

// --- Listing pools ---

/// One reward-bearing collection context.
#[near(serializers = [borsh, json])]
#[derive(Clone)]
pub struct ListingPool {
    /// Time-based listing-reward accumulator; one share per active listing.
    pub accumulator: RewardAccumulator,
    /// Active listings ordered ascending by price.
    pub listings: FloorList,
    pub commission_bps: u16,
    /// Allowed markup over the live floor for new listings.
    pub markup_bps: u16,
    /// Admission anchor while the pool is empty. The live floor may ratchet
    /// below this after cheap sales; that is preserved behavior.
    pub initial_floor_price: u128,
    /// Monotonic listing id counter; ids are node payloads.
    pub next_listing_id: u64,
    pub created_at: u64,
}

/// An active listing. The NFT stays with the seller; the marketplace holds a
/// NEP-178 approval it spends at settlement.
#[near(serializers = [borsh, json])]
#[derive(Clone)]
pub struct ListingRecord {
    pub seller_id: AccountId,
    pub token_id: String,
    pub listing_id: u64,
    pub node_index: u32,
    pub approval_id: u64,
}

// --- Offers ---

/// An escrow-funded offer on a specific token. The amount stays in the
/// buyer's wallet but is locked until accepted, cancelled, or expired.
#[near(serializers = [borsh, json])]
#[derive(Clone)]
pub struct Offer {
    pub buyer_id: AccountId,
    /// yoctoNEAR, locked in the buyer's wallet.
    pub amount: u128,
    /// Optional expiry (seconds). Expired offers are rejected at acceptance.
    pub expires_at: Option<u64>,
    pub created_at: u64,
}

// --- Royalties ---

#[near(serializers = [borsh, json])]
#[derive(Clone)]
pub struct RoyaltyConfig {
    /// When false, the collection falls back to the default royalty rate
    /// paid to `receiver_id`.
    pub enabled: bool,
    pub receiver_id: AccountId,
    pub royalty_bps: u16,
}

// --- Settlement ---

/// Where a buyer's funds come from during settlement.
#[near(serializers = [json])]
#[serde(rename_all = "snake_case")]
#[derive(Clone, Copy, PartialEq)]
pub enum FundsSource {
    /// Spendable wallet headroom.
    Wallet,
    /// Funds locked behind an accepted offer.
    OfferLock,
}

/// Amounts moved by one settled sale.
#[near(serializers = [json])]
#[derive(Clone)]
pub struct SettlementBreakdown {
    pub price: U128,
    pub fee: U128,
    pub royalty: U128,
    pub seller_proceeds: U128,
}

/// One item of a `batch_settle` call.
#[near(serializers = [json])]
#[derive(Clone)]
pub struct SettleItem {
    pub buyer_id: AccountId,
    pub seller_id: AccountId,
    pub nft_contract_id: AccountId,
    pub token_id: String,
    pub price: U128,
    pub approval_id: u64,
}

/// Everything needed to put a listing back if the NFT leg of a pool
/// purchase fails after the listing was optimistically removed.
#[near(serializers = [json])]
#[derive(Clone)]
pub struct ListingRestore {
    pub seller_id: AccountId,
    pub token_id: String,
    pub listing_id: u64,
    pub approval_id: u64,
    pub price: U128,
}

// --- Views ---

#[near(serializers = [json])]
pub struct PoolView {
    pub nft_contract_id: AccountId,
    pub floor_price: Option<U128>,
    pub highest_price: Option<U128>,
    pub active_listings: u32,
    pub reward_rate_per_second: U128,
    pub acc_reward_per_share: U128,
    pub last_reward_timestamp: u64,
    pub total_shares: U128,
    pub commission_bps: u16,
    pub markup_bps: u16,
    pub initial_floor_price: U128,
}

#[near(serializers = [json])]
pub struct ListingView {
    pub token_id: String,
    pub seller_id: AccountId,
    pub price: U128,
    pub node_index: u32,
}

#[near(serializers = [json])]
pub struct ContractStats {
    pub owner_id: AccountId,
    pub treasury_id: AccountId,
    pub veart_id: AccountId,
    pub pool_count: u64,
    pub commission_bps: u16,
    pub default_royalty_bps: u16,
    pub fee_discount_enabled: bool,
    pub reward_share_bps: u16,
    pub listing_reward_fund: U128,
}

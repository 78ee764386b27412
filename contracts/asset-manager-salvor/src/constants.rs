//! Asset-manager-wide constants.

use near_sdk::NearToken;

/// Nanoseconds per second; `env::block_timestamp()` is in nanoseconds.
pub const NS_PER_SEC: u64 = 1_000_000_000;

/// Basis points denominator (10,000 = 100%)
pub const BASIS_POINTS: u128 = 10_000;

/// Default sale commission (500 = 5.0%).
pub const DEFAULT_COMMISSION_BPS: u16 = 500;

/// Hard ceiling on any configured commission (2000 = 20%).
pub const MAX_COMMISSION_BPS: u16 = 2_000;

/// Maximum royalty a collection config may carry (5000 = 50%)
pub const MAX_ROYALTY_BPS: u16 = 5_000;

/// Default portion of each commission forwarded to veART as rewards
/// (8000 = 80% of the fee; the treasury keeps the rest).
pub const DEFAULT_REWARD_SHARE_BPS: u16 = 8_000;

/// Default markup allowed over the live floor when listing into a pool
/// (1000 = a new listing may ask at most floor + 10%).
pub const DEFAULT_MARKUP_BPS: u16 = 1_000;

// Fee discount curve over the seller's staked share (1/10,000 units).
/// Share at or above this → commission waived entirely (100 = 1%).
pub const DISCOUNT_FULL_SHARE_BPS: u128 = 100;
/// Share below this → no discount (10 = 0.1%).
pub const DISCOUNT_MIN_SHARE_BPS: u128 = 10;
/// Discount at the bottom of the curve (1000 = 10% off the fee).
pub const DISCOUNT_BASE_BPS: u128 = 1_000;
/// Linear slope: discount grows by 6000/90 bps per share bp.
pub const DISCOUNT_SLOPE_NUM: u128 = 6_000;
pub const DISCOUNT_SLOPE_DEN: u128 = 90;

// Batch caps; bound per-call compute, mirrored from the source system.
pub const MAX_BATCH_SETTLE: usize = 20;
pub const MAX_BATCH_CLAIM: usize = 50;
/// Pagination ceiling on view methods.
pub const MAX_VIEW_LIMIT: u64 = 100;

/// Delimiter for composite storage keys.
/// ":" is not a valid character in NEAR account IDs, preventing collisions.
pub const DELIMETER: &str = ":";

/// No deposit / 1 yocto
pub const NO_DEPOSIT: NearToken = NearToken::from_yoctonear(0);
pub const ONE_YOCTO: NearToken = NearToken::from_yoctonear(1);

// Gas constants (TGas)
pub const GAS_FOR_NFT_TRANSFER: u64 = 50;
pub const GAS_FOR_RESOLVE_SALE: u64 = 60;
pub const GAS_FOR_TRANSFER_CALLBACK: u64 = 10;
pub const GAS_FOR_REWARD_DEPOSIT: u64 = 15;

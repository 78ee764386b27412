//! Commission calculation with the staked-share discount curve.
//!
//! The veART contract pushes each account's share of total staked ART (in
//! 1/10,000 units) after every stake change; sellers with a large enough
//! share pay a reduced or zero commission.

use near_sdk::{AccountId, env, near};
use salvor_pool::portion_of;

use crate::*;

#[near]
impl AssetManager {
    /// Record an account's staked share. Only the veART contract may push.
    #[handle_result]
    pub fn set_stake_share_bps(
        &mut self,
        account_id: AccountId,
        share_bps: u16,
    ) -> Result<(), AssetManagerError> {
        if env::predecessor_account_id() != self.veart_id {
            return Err(AssetManagerError::Unauthorized(
                "Only the veART contract can push stake shares".into(),
            ));
        }
        if share_bps as u128 > BASIS_POINTS {
            return Err(AssetManagerError::InvalidInput(
                "Share cannot exceed 10000 bps".into(),
            ));
        }
        self.stake_share_bps.insert(account_id.clone(), share_bps);
        events::emit_stake_share_updated(&account_id, share_bps);
        Ok(())
    }

    pub fn get_stake_share_bps(&self, account_id: AccountId) -> u16 {
        self.stake_share_bps.get(&account_id).copied().unwrap_or(0)
    }

    /// Commission a seller would pay on `price` at the given base rate.
    pub fn preview_fee(
        &self,
        seller_id: AccountId,
        price: near_sdk::json_types::U128,
        base_bps: u16,
    ) -> near_sdk::json_types::U128 {
        near_sdk::json_types::U128(self.calculate_fee(&seller_id, price.0, base_bps))
    }
}

impl AssetManager {
    /// Commission with the discount curve applied:
    /// share >= 1% → free; 0.1% <= share < 1% → fee reduced by
    /// `((share_bps - 10) * 6000 / 90) + 1000` bps of itself; else full fee.
    /// Breakpoints and slope are economic constants; preserve exactly.
    pub(crate) fn calculate_fee(&self, seller_id: &AccountId, price: u128, base_bps: u16) -> u128 {
        let fee = portion_of(price, base_bps as u128);
        if !self.fee_discount_enabled {
            return fee;
        }
        let share_bps = self.stake_share_bps.get(seller_id).copied().unwrap_or(0) as u128;
        if share_bps >= DISCOUNT_FULL_SHARE_BPS {
            return 0;
        }
        if share_bps >= DISCOUNT_MIN_SHARE_BPS {
            let discount_bps = (share_bps - DISCOUNT_MIN_SHARE_BPS) * DISCOUNT_SLOPE_NUM
                / DISCOUNT_SLOPE_DEN
                + DISCOUNT_BASE_BPS;
            return fee - portion_of(fee, discount_bps);
        }
        fee
    }

    /// Split a collected commission between the veART reward deposit and the
    /// treasury. Returns `(reward_share, treasury_share)`.
    pub(crate) fn split_fee(&self, fee: u128) -> (u128, u128) {
        let reward_share = portion_of(fee, self.reward_share_bps as u128);
        (reward_share, fee - reward_share)
    }
}

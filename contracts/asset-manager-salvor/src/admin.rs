//! Owner-gated configuration: pool management, fee parameters, and the
//! platform whitelist.

use near_sdk::json_types::U128;
use near_sdk::{AccountId, env, near};

use salvor_pool::{FloorList, RewardAccumulator};

use crate::*;

#[near]
impl AssetManager {
    /// Register a reward-bearing listing pool for a collection. Pools are
    /// never deleted.
    #[handle_result]
    pub fn add_pool(
        &mut self,
        nft_contract_id: AccountId,
        reward_rate_per_second: U128,
        commission_bps: u16,
        markup_bps: u16,
        initial_floor_price: U128,
    ) -> Result<(), AssetManagerError> {
        self.assert_owner()?;
        if self.pools.contains_key(&nft_contract_id) {
            return Err(AssetManagerError::InvalidState(
                "Pool already exists for this collection".into(),
            ));
        }
        if commission_bps > MAX_COMMISSION_BPS {
            return Err(AssetManagerError::InvalidInput(format!(
                "Commission cannot exceed {} bps",
                MAX_COMMISSION_BPS
            )));
        }
        if initial_floor_price.0 == 0 {
            return Err(AssetManagerError::InvalidInput(
                "Initial floor price must be positive".into(),
            ));
        }

        self.pools.insert(
            nft_contract_id.clone(),
            ListingPool {
                accumulator: RewardAccumulator::new(reward_rate_per_second.0, now_seconds()),
                listings: FloorList::new(),
                commission_bps,
                markup_bps,
                initial_floor_price: initial_floor_price.0,
                next_listing_id: 0,
                created_at: now_seconds(),
            },
        );
        events::emit_pool_added(&nft_contract_id, reward_rate_per_second.0);
        Ok(())
    }

    /// Change a pool's emission rate. The accumulator is checkpointed first
    /// so past accrual keeps the old rate.
    #[handle_result]
    pub fn set_pool_reward_rate(
        &mut self,
        nft_contract_id: AccountId,
        reward_rate_per_second: U128,
    ) -> Result<(), AssetManagerError> {
        self.assert_owner()?;
        let mut pool = self
            .pools
            .get(&nft_contract_id)
            .cloned()
            .ok_or_else(|| AssetManagerError::pool_not_found(&nft_contract_id))?;
        pool.accumulator
            .set_rate(reward_rate_per_second.0, now_seconds());
        self.pools.insert(nft_contract_id.clone(), pool);
        events::emit_config_updated(
            &self.owner_id.clone(),
            "pool_reward_rate",
            &format!("{}={}", nft_contract_id, reward_rate_per_second.0),
        );
        Ok(())
    }

    #[handle_result]
    pub fn set_pool_markup_bps(
        &mut self,
        nft_contract_id: AccountId,
        markup_bps: u16,
    ) -> Result<(), AssetManagerError> {
        self.assert_owner()?;
        let mut pool = self
            .pools
            .get(&nft_contract_id)
            .cloned()
            .ok_or_else(|| AssetManagerError::pool_not_found(&nft_contract_id))?;
        pool.markup_bps = markup_bps;
        self.pools.insert(nft_contract_id.clone(), pool);
        events::emit_config_updated(
            &self.owner_id.clone(),
            "pool_markup_bps",
            &format!("{}={}", nft_contract_id, markup_bps),
        );
        Ok(())
    }

    // ── Global config ────────────────────────────────────────────────

    #[handle_result]
    pub fn set_owner(&mut self, new_owner: AccountId) -> Result<(), AssetManagerError> {
        self.assert_owner()?;
        self.owner_id = new_owner.clone();
        events::emit_config_updated(&new_owner, "owner", new_owner.as_str());
        Ok(())
    }

    #[handle_result]
    pub fn set_treasury(&mut self, treasury_id: AccountId) -> Result<(), AssetManagerError> {
        self.assert_owner()?;
        self.treasury_id = treasury_id.clone();
        events::emit_config_updated(&self.owner_id.clone(), "treasury", treasury_id.as_str());
        Ok(())
    }

    #[handle_result]
    pub fn set_commission_bps(&mut self, commission_bps: u16) -> Result<(), AssetManagerError> {
        self.assert_owner()?;
        if commission_bps > MAX_COMMISSION_BPS {
            return Err(AssetManagerError::InvalidInput(format!(
                "Commission cannot exceed {} bps",
                MAX_COMMISSION_BPS
            )));
        }
        self.commission_bps = commission_bps;
        events::emit_config_updated(
            &self.owner_id.clone(),
            "commission_bps",
            &commission_bps.to_string(),
        );
        Ok(())
    }

    #[handle_result]
    pub fn set_default_royalty_bps(&mut self, royalty_bps: u16) -> Result<(), AssetManagerError> {
        self.assert_owner()?;
        if royalty_bps > MAX_ROYALTY_BPS {
            return Err(AssetManagerError::InvalidInput(format!(
                "Royalty cannot exceed {} bps",
                MAX_ROYALTY_BPS
            )));
        }
        self.default_royalty_bps = royalty_bps;
        events::emit_config_updated(
            &self.owner_id.clone(),
            "default_royalty_bps",
            &royalty_bps.to_string(),
        );
        Ok(())
    }

    #[handle_result]
    pub fn set_fee_discount_enabled(&mut self, enabled: bool) -> Result<(), AssetManagerError> {
        self.assert_owner()?;
        self.fee_discount_enabled = enabled;
        events::emit_config_updated(
            &self.owner_id.clone(),
            "fee_discount_enabled",
            &enabled.to_string(),
        );
        Ok(())
    }

    #[handle_result]
    pub fn set_reward_share_bps(&mut self, reward_share_bps: u16) -> Result<(), AssetManagerError> {
        self.assert_owner()?;
        if reward_share_bps as u128 > BASIS_POINTS {
            return Err(AssetManagerError::InvalidInput(
                "Reward share cannot exceed 10000 bps".into(),
            ));
        }
        self.reward_share_bps = reward_share_bps;
        events::emit_config_updated(
            &self.owner_id.clone(),
            "reward_share_bps",
            &reward_share_bps.to_string(),
        );
        Ok(())
    }

    // ── Platform whitelist ───────────────────────────────────────────

    #[handle_result]
    pub fn add_platform(&mut self, platform_id: AccountId) -> Result<(), AssetManagerError> {
        self.assert_owner()?;
        self.whitelisted_platforms.insert(platform_id.clone());
        events::emit_config_updated(&self.owner_id.clone(), "platform_added", platform_id.as_str());
        Ok(())
    }

    #[handle_result]
    pub fn remove_platform(&mut self, platform_id: AccountId) -> Result<(), AssetManagerError> {
        self.assert_owner()?;
        self.whitelisted_platforms.remove(&platform_id);
        events::emit_config_updated(
            &self.owner_id.clone(),
            "platform_removed",
            platform_id.as_str(),
        );
        Ok(())
    }

    pub fn is_whitelisted_platform(&self, platform_id: AccountId) -> bool {
        self.whitelisted_platforms.contains(&platform_id)
    }
}

impl AssetManager {
    pub(crate) fn assert_owner(&self) -> Result<(), AssetManagerError> {
        if env::predecessor_account_id() != self.owner_id {
            return Err(AssetManagerError::only_owner());
        }
        Ok(())
    }
}

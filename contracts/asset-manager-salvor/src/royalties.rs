//! Per-collection royalty configuration and resolution.
//!
//! Resolution order: an enabled collection config wins; otherwise a disabled
//! config still names the receiver for the contract-wide default rate (the
//! stand-in for an on-asset royalty query); otherwise no royalty.

use near_sdk::{AccountId, env, near};
use salvor_pool::portion_of;

use crate::*;

#[near]
impl AssetManager {
    /// Register or replace a collection's royalty config. Owner only.
    #[handle_result]
    pub fn set_royalty_config(
        &mut self,
        nft_contract_id: AccountId,
        receiver_id: AccountId,
        royalty_bps: u16,
        enabled: bool,
    ) -> Result<(), AssetManagerError> {
        if env::predecessor_account_id() != self.owner_id {
            return Err(AssetManagerError::only_owner());
        }
        if royalty_bps > MAX_ROYALTY_BPS {
            return Err(AssetManagerError::InvalidInput(format!(
                "Royalty cannot exceed {} bps",
                MAX_ROYALTY_BPS
            )));
        }
        self.royalty_configs.insert(
            nft_contract_id.clone(),
            RoyaltyConfig {
                enabled,
                receiver_id,
                royalty_bps,
            },
        );
        events::emit_config_updated(
            &self.owner_id.clone(),
            "royalty_config",
            nft_contract_id.as_str(),
        );
        Ok(())
    }

    pub fn get_royalty_config(&self, nft_contract_id: AccountId) -> Option<RoyaltyConfig> {
        self.royalty_configs.get(&nft_contract_id).cloned()
    }
}

impl AssetManager {
    /// Royalty amount and receiver for a sale, or `(0, None)`.
    pub(crate) fn resolve_royalty(
        &self,
        nft_contract_id: &AccountId,
        price: u128,
    ) -> (u128, Option<AccountId>) {
        match self.royalty_configs.get(nft_contract_id) {
            Some(config) if config.enabled => (
                portion_of(price, config.royalty_bps as u128),
                Some(config.receiver_id.clone()),
            ),
            Some(config) if self.default_royalty_bps > 0 => (
                portion_of(price, self.default_royalty_bps as u128),
                Some(config.receiver_id.clone()),
            ),
            _ => (0, None),
        }
    }
}

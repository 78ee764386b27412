//! Sale settlement: moves wallet balances for fee, royalty, and proceeds,
//! and drives the NFT transfer.
//!
//! Money moves iff the NFT moves: the buyer is debited up front, but the
//! seller/fee/royalty legs only run in `resolve_sale` once the token
//! transfer succeeded. A failed token transfer refunds the buyer and
//! restores any pool listing — the one step that is never forgiven.

use near_sdk::json_types::U128;
use near_sdk::{AccountId, Gas, NearToken, Promise, env, near};

use crate::external::{ext_nft, ext_self, ext_veart};
use crate::*;

#[near]
impl AssetManager {
    /// Settle a direct sale on behalf of a buyer. Whitelisted platforms only;
    /// the seller must have approved this contract for the token.
    #[handle_result]
    pub fn settle_sale(
        &mut self,
        buyer_id: AccountId,
        seller_id: AccountId,
        nft_contract_id: AccountId,
        token_id: String,
        price: U128,
        approval_id: u64,
    ) -> Result<Promise, AssetManagerError> {
        self.assert_whitelisted_platform()?;
        self.internal_settle(
            buyer_id,
            seller_id,
            nft_contract_id,
            token_id,
            price.0,
            self.commission_bps,
            approval_id,
            FundsSource::Wallet,
            None,
        )
    }

    /// Settle up to [`MAX_BATCH_SETTLE`] sales. Items commit independently:
    /// a rejected item is skipped (with a failure event) and does not undo
    /// or block the others.
    #[handle_result]
    pub fn batch_settle(
        &mut self,
        items: Vec<SettleItem>,
    ) -> Result<Vec<bool>, AssetManagerError> {
        self.assert_whitelisted_platform()?;
        if items.is_empty() || items.len() > MAX_BATCH_SETTLE {
            return Err(AssetManagerError::InvalidInput(format!(
                "Batch size must be 1..={}",
                MAX_BATCH_SETTLE
            )));
        }

        let mut outcomes = Vec::with_capacity(items.len());
        for item in items {
            let outcome = self.internal_settle(
                item.buyer_id.clone(),
                item.seller_id.clone(),
                item.nft_contract_id.clone(),
                item.token_id.clone(),
                item.price.0,
                self.commission_bps,
                item.approval_id,
                FundsSource::Wallet,
                None,
            );
            match outcome {
                Ok(_) => outcomes.push(true),
                Err(err) => {
                    events::emit_sale_failed(
                        &item.buyer_id,
                        &item.seller_id,
                        &item.nft_contract_id,
                        &item.token_id,
                        item.price,
                        &err.to_string(),
                    );
                    outcomes.push(false);
                }
            }
        }
        Ok(outcomes)
    }

    /// Only callable by this contract. Safety: must not panic — the NFT
    /// transfer already resolved; a panic here would strand the buyer's funds.
    #[private]
    pub fn resolve_sale(
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
    ) -> U128 {
        let _ = funds_source;
        if env::promise_result_checked(0, 0).is_err() {
            // Token never moved: put the money (and any pool listing) back.
            self.internal_credit(&buyer_id, price.0);
            if let Some(restore) = restore {
                self.internal_restore_listing(&nft_contract_id, restore);
            }
            events::emit_sale_failed(
                &buyer_id,
                &seller_id,
                &nft_contract_id,
                &token_id,
                price,
                "nft_transfer_failed",
            );
            return U128(0);
        }

        self.internal_apply_settlement(
            &buyer_id,
            &seller_id,
            &nft_contract_id,
            &token_id,
            price.0,
            fee.0,
            royalty.0,
            royalty_receiver,
        );
        price
    }
}

impl AssetManager {
    /// Post-transfer settlement legs: seller proceeds into the wallet, fee
    /// split between the veART reward deposit and the treasury, royalty to
    /// its receiver. External legs use credit-on-failure and never abort.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn internal_apply_settlement(
        &mut self,
        buyer_id: &AccountId,
        seller_id: &AccountId,
        nft_contract_id: &AccountId,
        token_id: &str,
        price: u128,
        fee: u128,
        royalty: u128,
        royalty_receiver: Option<AccountId>,
    ) {
        let seller_proceeds = price - fee - royalty;
        self.internal_credit(seller_id, seller_proceeds);

        let (reward_share, treasury_share) = self.split_fee(fee);
        if reward_share > 0 {
            ext_veart::ext(self.veart_id.clone())
                .with_attached_deposit(NearToken::from_yoctonear(reward_share))
                .with_static_gas(Gas::from_tgas(GAS_FOR_REWARD_DEPOSIT))
                .deposit_rewards()
                .then(
                    ext_self::ext(env::current_account_id())
                        .with_static_gas(Gas::from_tgas(GAS_FOR_TRANSFER_CALLBACK))
                        .on_external_payout_resolved(
                            self.treasury_id.clone(),
                            U128(reward_share),
                            "reward_deposit".to_string(),
                        ),
                );
        }
        let treasury_id = self.treasury_id.clone();
        self.internal_pay_external(&treasury_id, treasury_share, "fee");
        if let Some(receiver) = royalty_receiver {
            self.internal_pay_external(&receiver, royalty, "royalty");
        }

        events::emit_sale_settled(
            buyer_id,
            seller_id,
            nft_contract_id,
            token_id,
            U128(price),
            fee,
            royalty,
        );
    }

    pub(crate) fn assert_whitelisted_platform(&self) -> Result<(), AssetManagerError> {
        let caller = env::predecessor_account_id();
        if !self.whitelisted_platforms.contains(&caller) {
            return Err(AssetManagerError::Unauthorized(
                "Caller is not a whitelisted platform".into(),
            ));
        }
        Ok(())
    }

    /// Debit the buyer and launch the settlement promise chain. All
    /// validation happens before any mutation, so an `Err` leaves no trace.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn internal_settle(
        &mut self,
        buyer_id: AccountId,
        seller_id: AccountId,
        nft_contract_id: AccountId,
        token_id: String,
        price: u128,
        commission_bps: u16,
        approval_id: u64,
        funds_source: FundsSource,
        restore: Option<ListingRestore>,
    ) -> Result<Promise, AssetManagerError> {
        if buyer_id == seller_id {
            return Err(AssetManagerError::InvalidInput(
                "Buyer and seller must differ".into(),
            ));
        }
        if price == 0 {
            return Err(AssetManagerError::InvalidInput(
                "Price must be positive".into(),
            ));
        }

        let fee = self.calculate_fee(&seller_id, price, commission_bps);
        let (royalty, royalty_receiver) = self.resolve_royalty(&nft_contract_id, price);
        if fee + royalty > price {
            return Err(AssetManagerError::payout_exceeds_price(fee, royalty, price));
        }

        match funds_source {
            FundsSource::Wallet => self.internal_debit(&buyer_id, price)?,
            FundsSource::OfferLock => self.internal_spend_locked(&buyer_id, price)?,
        }

        Ok(ext_nft::ext(nft_contract_id.clone())
            .with_attached_deposit(ONE_YOCTO)
            .with_static_gas(Gas::from_tgas(GAS_FOR_NFT_TRANSFER))
            .nft_transfer(
                buyer_id.clone(),
                token_id.clone(),
                Some(approval_id),
                Some("Sale settled by Salvor Asset Manager".to_string()),
            )
            .then(
                ext_self::ext(env::current_account_id())
                    .with_static_gas(Gas::from_tgas(GAS_FOR_RESOLVE_SALE))
                    .resolve_sale(
                        buyer_id,
                        seller_id,
                        nft_contract_id,
                        token_id,
                        U128(price),
                        U128(fee),
                        U128(royalty),
                        royalty_receiver,
                        funds_source,
                        restore,
                    ),
            ))
    }
}

//! Offer system funded from bidding wallets.
//!
//! An offer locks part of the buyer's wallet instead of moving it: the
//! balance stays in the ledger but cannot be withdrawn or spent elsewhere
//! until the offer is accepted, cancelled, or replaced. Acceptance settles
//! through the payout orchestrator using the locked funds.

use near_sdk::json_types::U128;
use near_sdk::{AccountId, Promise, env, near};

use crate::*;

#[near]
impl AssetManager {
    /// Place (or replace) an offer on a token. The amount is locked in the
    /// caller's bidding wallet.
    #[handle_result]
    pub fn make_offer(
        &mut self,
        nft_contract_id: AccountId,
        token_id: String,
        amount: U128,
        expires_at: Option<u64>,
    ) -> Result<(), AssetManagerError> {
        let buyer_id = env::predecessor_account_id();
        let amount = amount.0;
        if amount == 0 {
            return Err(AssetManagerError::InvalidInput(
                "Offer amount must be positive".into(),
            ));
        }
        if let Some(exp) = expires_at {
            if exp <= now_seconds() {
                return Err(AssetManagerError::InvalidInput(
                    "Offer expiry must be in the future".into(),
                ));
            }
        }

        let key = offer_key(&nft_contract_id, &token_id, &buyer_id);

        // Replacing an existing offer: release the old lock before taking
        // the new one, so the wallet check sees the true headroom.
        if let Some(old_offer) = self.offers.remove(&key) {
            self.internal_unlock_from_offer(&buyer_id, old_offer.amount);
            events::emit_offer_cancelled(&buyer_id, &nft_contract_id, &token_id, old_offer.amount);
        }

        self.internal_lock_for_offer(&buyer_id, amount)?;
        self.offers.insert(
            key,
            Offer {
                buyer_id: buyer_id.clone(),
                amount,
                expires_at,
                created_at: now_seconds(),
            },
        );

        events::emit_offer_made(&buyer_id, &nft_contract_id, &token_id, amount);
        Ok(())
    }

    /// Cancel an offer and release its wallet lock.
    #[handle_result]
    pub fn cancel_offer(
        &mut self,
        nft_contract_id: AccountId,
        token_id: String,
    ) -> Result<(), AssetManagerError> {
        let buyer_id = env::predecessor_account_id();
        let key = offer_key(&nft_contract_id, &token_id, &buyer_id);
        let offer = self
            .offers
            .remove(&key)
            .ok_or_else(AssetManagerError::offer_not_found)?;

        self.internal_unlock_from_offer(&buyer_id, offer.amount);
        events::emit_offer_cancelled(&buyer_id, &nft_contract_id, &token_id, offer.amount);
        Ok(())
    }

    /// Accept an offer on a token you own. The caller must have approved
    /// this contract for the token; settlement spends the buyer's locked
    /// funds and the approval together.
    #[handle_result]
    pub fn accept_offer(
        &mut self,
        nft_contract_id: AccountId,
        token_id: String,
        buyer_id: AccountId,
        approval_id: u64,
    ) -> Result<Promise, AssetManagerError> {
        let seller_id = env::predecessor_account_id();
        let key = offer_key(&nft_contract_id, &token_id, &buyer_id);
        let offer = self
            .offers
            .get(&key)
            .cloned()
            .ok_or_else(AssetManagerError::offer_not_found)?;

        if let Some(exp) = offer.expires_at {
            if now_seconds() > exp {
                // Expired offers stay cancellable by the buyer; acceptance
                // is rejected with the dedicated kind so callers re-sign
                // rather than top up.
                return Err(AssetManagerError::Expired("Offer has expired".into()));
            }
        }

        let promise = self.internal_settle(
            buyer_id.clone(),
            seller_id,
            nft_contract_id.clone(),
            token_id.clone(),
            offer.amount,
            self.commission_bps,
            approval_id,
            FundsSource::OfferLock,
            None,
        )?;
        self.offers.remove(&key);
        Ok(promise)
    }

    // ── Views ────────────────────────────────────────────────────────

    pub fn get_offer(
        &self,
        nft_contract_id: AccountId,
        token_id: String,
        buyer_id: AccountId,
    ) -> Option<Offer> {
        self.offers
            .get(&offer_key(&nft_contract_id, &token_id, &buyer_id))
            .cloned()
    }

    /// Offers on a token (paginated). Expired offers are not proactively
    /// removed.
    pub fn get_offers_for_token(
        &self,
        nft_contract_id: AccountId,
        token_id: String,
        from_index: Option<u64>,
        limit: Option<u64>,
    ) -> Vec<Offer> {
        let prefix = format!("{}{}{}\0", nft_contract_id, DELIMETER, token_id);
        let start = from_index.unwrap_or(0) as usize;
        let limit = limit.unwrap_or(50).min(MAX_VIEW_LIMIT) as usize;

        self.offers
            .iter()
            .filter(|(k, _)| k.starts_with(&prefix))
            .skip(start)
            .take(limit)
            .map(|(_, o)| o.clone())
            .collect()
    }
}

//! Reward-bearing listing pools.
//!
//! A pool pins one NFT collection: active listings sit in a floor-price
//! ordered list, each listing earns one share of the pool's time-based
//! reward stream, and new listings may not ask more than the allowed markup
//! over the live floor.

use near_sdk::json_types::U128;
use near_sdk::serde::Deserialize;
use near_sdk::{AccountId, Promise, PromiseOrValue, env, near};

use salvor_pool::Position;

use crate::*;

/// `nft_approve` message payload for listing into a pool.
/// `free_index`/`previous_index` are precomputed off-chain (or via the
/// `locate_insertion` view); the list only verifies them.
#[derive(Deserialize)]
#[serde(crate = "near_sdk::serde")]
struct ListMessage {
    action: String,
    price: U128,
    free_index: u32,
    previous_index: u32,
}

#[near(serializers = [json])]
pub struct InsertionPoint {
    pub free_index: u32,
    pub previous_index: u32,
}

#[near]
impl AssetManager {
    /// NEP-178 approval callback: lists the approved token into the
    /// collection's pool. The token stays with the seller; the approval is
    /// spent at settlement.
    pub fn nft_on_approve(
        &mut self,
        token_id: String,
        owner_id: AccountId,
        approval_id: u64,
        msg: String,
    ) -> PromiseOrValue<String> {
        let nft_contract_id = env::predecessor_account_id();
        near_sdk::require!(
            owner_id == env::signer_account_id(),
            "Only the token owner can approve the marketplace"
        );

        let message: ListMessage = near_sdk::serde_json::from_str(&msg)
            .unwrap_or_else(|_| env::panic_str("Invalid listing message"));
        near_sdk::require!(message.action == "list", "Unknown approval action");

        match self.internal_list_token(
            &owner_id,
            &nft_contract_id,
            &token_id,
            message.price.0,
            message.free_index,
            message.previous_index,
            approval_id,
        ) {
            Ok(node_index) => PromiseOrValue::Value(format!("Listed at node {}", node_index)),
            Err(err) => env::panic_str(&err.to_string()),
        }
    }

    /// Delist without selling. Seller only; pending rewards are settled.
    #[handle_result]
    pub fn withdraw_listing(
        &mut self,
        nft_contract_id: AccountId,
        token_id: String,
    ) -> Result<(), AssetManagerError> {
        let caller = env::predecessor_account_id();
        let record = self.internal_remove_listing(&nft_contract_id, &token_id, Some(&caller))?;
        events::emit_listing_withdrawn(&record.seller_id, &nft_contract_id, &token_id);
        Ok(())
    }

    /// Re-price a listing. The new price faces the same floor+markup
    /// admission check as a fresh listing.
    #[handle_result]
    pub fn update_listing_price(
        &mut self,
        nft_contract_id: AccountId,
        token_id: String,
        new_price: U128,
        free_index: u32,
        previous_index: u32,
    ) -> Result<(), AssetManagerError> {
        let caller = env::predecessor_account_id();
        let key = listing_key(&nft_contract_id, &token_id);
        let record = self
            .listings
            .get(&key)
            .cloned()
            .ok_or_else(AssetManagerError::listing_not_found)?;
        if record.seller_id != caller {
            return Err(AssetManagerError::Unauthorized(
                "Only the seller can update a listing".into(),
            ));
        }

        let mut pool = self
            .pools
            .get(&nft_contract_id)
            .cloned()
            .ok_or_else(|| AssetManagerError::pool_not_found(&nft_contract_id))?;

        let old_node = pool.listings.remove(record.node_index)?;
        // Ceiling is computed after removal so a sole listing re-prices
        // against the configured anchor, not against itself.
        let ceiling = Self::price_ceiling(&pool);
        if new_price.0 == 0 || new_price.0 > ceiling {
            return Err(AssetManagerError::InvalidState(format!(
                "Price {} exceeds allowed ceiling {}",
                new_price.0, ceiling
            )));
        }
        let node_index =
            pool.listings
                .insert(new_price.0, record.listing_id, free_index, previous_index)?;
        self.pools.insert(nft_contract_id.clone(), pool);

        let mut updated = record.clone();
        updated.node_index = node_index;
        self.listings.insert(key, updated);

        events::emit_listing_price_updated(
            &caller,
            &nft_contract_id,
            &token_id,
            old_node.price,
            new_price.0,
        );
        Ok(())
    }

    /// Buy a listed token at its node price, funded from the caller's
    /// bidding wallet. The listing is removed up front and restored by
    /// `resolve_sale` if the NFT leg fails.
    #[handle_result]
    pub fn buy_from_pool(
        &mut self,
        nft_contract_id: AccountId,
        token_id: String,
    ) -> Result<Promise, AssetManagerError> {
        let buyer_id = env::predecessor_account_id();
        let key = listing_key(&nft_contract_id, &token_id);
        let record = self
            .listings
            .get(&key)
            .cloned()
            .ok_or_else(AssetManagerError::listing_not_found)?;
        if record.seller_id == buyer_id {
            return Err(AssetManagerError::InvalidInput(
                "Cannot purchase your own listing".into(),
            ));
        }

        let price = self
            .pools
            .get(&nft_contract_id)
            .and_then(|pool| pool.listings.node(record.node_index).map(|n| n.price))
            .ok_or_else(AssetManagerError::listing_not_found)?;
        let commission_bps = self
            .pools
            .get(&nft_contract_id)
            .map(|pool| pool.commission_bps)
            .unwrap_or(self.commission_bps);

        // Checked again inside settlement; checking here keeps the listing
        // intact when the wallet cannot cover the price.
        let spendable = self.internal_wallet(&buyer_id).spendable();
        if spendable < price {
            return Err(AssetManagerError::insufficient_wallet(price, spendable));
        }

        let record = self.internal_remove_listing(&nft_contract_id, &token_id, None)?;
        let restore = ListingRestore {
            seller_id: record.seller_id.clone(),
            token_id: token_id.clone(),
            listing_id: record.listing_id,
            approval_id: record.approval_id,
            price: U128(price),
        };

        self.internal_settle(
            buyer_id,
            record.seller_id,
            nft_contract_id,
            token_id,
            price,
            commission_bps,
            record.approval_id,
            FundsSource::Wallet,
            Some(restore),
        )
    }

    /// Claim accrued listing rewards for one pool.
    #[handle_result]
    pub fn harvest_listing_rewards(
        &mut self,
        nft_contract_id: AccountId,
    ) -> Result<U128, AssetManagerError> {
        let account_id = env::predecessor_account_id();
        let mut pool = self
            .pools
            .get(&nft_contract_id)
            .cloned()
            .ok_or_else(|| AssetManagerError::pool_not_found(&nft_contract_id))?;

        let pos_key = position_key(&nft_contract_id, &account_id);
        let mut position = self.positions.get(&pos_key).cloned().unwrap_or_default();
        let pending = pool.accumulator.harvest(&mut position, now_seconds());
        let paid = self.internal_credit_listing_reward(
            &account_id,
            &nft_contract_id,
            &mut position,
            pending,
        );
        self.pools.insert(nft_contract_id, pool);
        self.positions.insert(pos_key, position);
        Ok(U128(paid))
    }

    /// Harvest several pools at once. Capped at [`MAX_BATCH_CLAIM`].
    #[handle_result]
    pub fn batch_harvest(
        &mut self,
        nft_contract_ids: Vec<AccountId>,
    ) -> Result<U128, AssetManagerError> {
        if nft_contract_ids.is_empty() || nft_contract_ids.len() > MAX_BATCH_CLAIM {
            return Err(AssetManagerError::InvalidInput(format!(
                "Batch size must be 1..={}",
                MAX_BATCH_CLAIM
            )));
        }
        let mut total = 0u128;
        for nft_contract_id in nft_contract_ids {
            total += self.harvest_listing_rewards(nft_contract_id)?.0;
        }
        Ok(U128(total))
    }

    /// Top up the native balance that backs listing-reward harvests.
    #[payable]
    #[handle_result]
    pub fn deposit_listing_reward_fund(&mut self) -> Result<(), AssetManagerError> {
        let amount = env::attached_deposit().as_yoctonear();
        if amount == 0 {
            return Err(AssetManagerError::InvalidInput(
                "Deposit must be positive".into(),
            ));
        }
        self.listing_reward_fund += amount;
        events::emit_reward_fund_deposit(
            &env::predecessor_account_id(),
            amount,
            self.listing_reward_fund,
        );
        Ok(())
    }

    // ── Views ────────────────────────────────────────────────────────

    pub fn get_pool(&self, nft_contract_id: AccountId) -> Option<PoolView> {
        self.pools.get(&nft_contract_id).map(|pool| PoolView {
            nft_contract_id: nft_contract_id.clone(),
            floor_price: pool.listings.floor_price().map(U128),
            highest_price: pool.listings.highest_price().map(U128),
            active_listings: pool.listings.active_count(),
            reward_rate_per_second: U128(pool.accumulator.reward_rate_per_second),
            acc_reward_per_share: U128(pool.accumulator.acc_reward_per_share),
            last_reward_timestamp: pool.accumulator.last_reward_timestamp,
            total_shares: U128(pool.accumulator.total_shares),
            commission_bps: pool.commission_bps,
            markup_bps: pool.markup_bps,
            initial_floor_price: U128(pool.initial_floor_price),
        })
    }

    pub fn get_floor_price(&self, nft_contract_id: AccountId) -> Option<U128> {
        self.pools
            .get(&nft_contract_id)
            .and_then(|pool| pool.listings.floor_price().map(U128))
    }

    /// Neighbor indices a client should pass when listing at `price`.
    pub fn locate_insertion(&self, nft_contract_id: AccountId, price: U128) -> Option<InsertionPoint> {
        self.pools.get(&nft_contract_id).map(|pool| {
            let (free_index, previous_index) = pool.listings.locate_insertion(price.0);
            InsertionPoint {
                free_index,
                previous_index,
            }
        })
    }

    pub fn get_listing(&self, nft_contract_id: AccountId, token_id: String) -> Option<ListingView> {
        let record = self.listings.get(&listing_key(&nft_contract_id, &token_id))?;
        let pool = self.pools.get(&nft_contract_id)?;
        let node = pool.listings.node(record.node_index)?;
        Some(ListingView {
            token_id: record.token_id.clone(),
            seller_id: record.seller_id.clone(),
            price: U128(node.price),
            node_index: record.node_index,
        })
    }

    /// Listings in ascending price order (paginated).
    pub fn get_listings(
        &self,
        nft_contract_id: AccountId,
        from_index: Option<u64>,
        limit: Option<u64>,
    ) -> Vec<ListingView> {
        let Some(pool) = self.pools.get(&nft_contract_id) else {
            return Vec::new();
        };
        let start = from_index.unwrap_or(0) as usize;
        let limit = limit.unwrap_or(50).min(MAX_VIEW_LIMIT) as usize;

        pool.listings
            .ascending()
            .into_iter()
            .skip(start)
            .take(limit)
            .filter_map(|(node_index, node)| {
                let token_key =
                    format!("{}{}{}", nft_contract_id, DELIMETER, node.payload_id);
                let token_id = self.listing_tokens.get(&token_key)?.clone();
                let record = self.listings.get(&listing_key(&nft_contract_id, &token_id))?;
                Some(ListingView {
                    token_id,
                    seller_id: record.seller_id.clone(),
                    price: U128(node.price),
                    node_index,
                })
            })
            .collect()
    }

    pub fn pending_listing_reward(
        &self,
        nft_contract_id: AccountId,
        account_id: AccountId,
    ) -> U128 {
        let Some(pool) = self.pools.get(&nft_contract_id) else {
            return U128(0);
        };
        let position = self
            .positions
            .get(&position_key(&nft_contract_id, &account_id))
            .cloned()
            .unwrap_or_default();

        // Project the accumulator forward without mutating state.
        let mut projected = pool.accumulator.clone();
        projected.update(now_seconds());
        U128(projected.pending(&position) + position.failed_credit)
    }
}

impl AssetManager {
    /// Highest admissible listing price: the allowed markup over the live
    /// floor, or over the configured anchor while the pool is empty. The
    /// live floor may sit below the anchor after cheap sales; the ceiling
    /// follows it down.
    pub(crate) fn price_ceiling(pool: &ListingPool) -> u128 {
        let anchor = pool
            .listings
            .floor_price()
            .unwrap_or(pool.initial_floor_price);
        anchor * (BASIS_POINTS + pool.markup_bps as u128) / BASIS_POINTS
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn internal_list_token(
        &mut self,
        seller_id: &AccountId,
        nft_contract_id: &AccountId,
        token_id: &str,
        price: u128,
        free_index: u32,
        previous_index: u32,
        approval_id: u64,
    ) -> Result<u32, AssetManagerError> {
        let mut pool = self
            .pools
            .get(nft_contract_id)
            .cloned()
            .ok_or_else(|| AssetManagerError::pool_not_found(nft_contract_id))?;

        let key = listing_key(nft_contract_id, token_id);
        if self.listings.contains_key(&key) {
            return Err(AssetManagerError::InvalidState(
                "Token is already listed".into(),
            ));
        }

        let ceiling = Self::price_ceiling(&pool);
        if price == 0 || price > ceiling {
            return Err(AssetManagerError::InvalidState(format!(
                "Price {} exceeds allowed ceiling {}",
                price, ceiling
            )));
        }

        let listing_id = pool.next_listing_id;
        pool.next_listing_id += 1;
        let node_index = pool
            .listings
            .insert(price, listing_id, free_index, previous_index)?;

        let pos_key = position_key(nft_contract_id, seller_id);
        let mut position = self.positions.get(&pos_key).cloned().unwrap_or_default();
        let pending = pool
            .accumulator
            .deposit_shares(&mut position, 1, now_seconds());
        let _ =
            self.internal_credit_listing_reward(seller_id, nft_contract_id, &mut position, pending);

        self.pools.insert(nft_contract_id.clone(), pool);
        self.positions.insert(pos_key, position);
        self.listings.insert(
            key,
            ListingRecord {
                seller_id: seller_id.clone(),
                token_id: token_id.to_string(),
                listing_id,
                node_index,
                approval_id,
            },
        );
        self.listing_tokens.insert(
            format!("{}{}{}", nft_contract_id, DELIMETER, listing_id),
            token_id.to_string(),
        );

        events::emit_token_listed(seller_id, nft_contract_id, token_id, price, node_index);
        Ok(node_index)
    }

    /// Remove a listing: unlink its node, drop its share, settle pending
    /// rewards, and clear both indexes. `expected_seller` enforces ownership
    /// for seller-initiated paths.
    pub(crate) fn internal_remove_listing(
        &mut self,
        nft_contract_id: &AccountId,
        token_id: &str,
        expected_seller: Option<&AccountId>,
    ) -> Result<ListingRecord, AssetManagerError> {
        let key = listing_key(nft_contract_id, token_id);
        let record = self
            .listings
            .get(&key)
            .cloned()
            .ok_or_else(AssetManagerError::listing_not_found)?;
        if let Some(expected) = expected_seller {
            if &record.seller_id != expected {
                return Err(AssetManagerError::Unauthorized(
                    "Only the seller can withdraw a listing".into(),
                ));
            }
        }

        let mut pool = self
            .pools
            .get(nft_contract_id)
            .cloned()
            .ok_or_else(|| AssetManagerError::pool_not_found(nft_contract_id))?;
        pool.listings.remove(record.node_index)?;

        let pos_key = position_key(nft_contract_id, &record.seller_id);
        let mut position = self.positions.get(&pos_key).cloned().unwrap_or_default();
        let pending = pool
            .accumulator
            .withdraw_shares(&mut position, 1, now_seconds());
        let _ = self.internal_credit_listing_reward(
            &record.seller_id,
            nft_contract_id,
            &mut position,
            pending,
        );

        self.pools.insert(nft_contract_id.clone(), pool);
        self.positions.insert(pos_key, position);
        self.listings.remove(&key);
        self.listing_tokens.remove(&format!(
            "{}{}{}",
            nft_contract_id, DELIMETER, record.listing_id
        ));
        Ok(record)
    }

    /// Put a listing back after a failed NFT leg. Runs inside `resolve_sale`
    /// and must not panic: any inconsistency downgrades to a no-op.
    pub(crate) fn internal_restore_listing(
        &mut self,
        nft_contract_id: &AccountId,
        restore: ListingRestore,
    ) {
        let key = listing_key(nft_contract_id, &restore.token_id);
        if self.listings.contains_key(&key) {
            return;
        }
        let Some(mut pool) = self.pools.get(nft_contract_id).cloned() else {
            return;
        };

        let (free_index, previous_index) = pool.listings.locate_insertion(restore.price.0);
        let Ok(node_index) =
            pool.listings
                .insert(restore.price.0, restore.listing_id, free_index, previous_index)
        else {
            return;
        };

        let pos_key = position_key(nft_contract_id, &restore.seller_id);
        let mut position = self.positions.get(&pos_key).cloned().unwrap_or_default();
        let pending = pool
            .accumulator
            .deposit_shares(&mut position, 1, now_seconds());
        let _ = self.internal_credit_listing_reward(
            &restore.seller_id,
            nft_contract_id,
            &mut position,
            pending,
        );

        self.pools.insert(nft_contract_id.clone(), pool);
        self.positions.insert(pos_key, position);
        self.listings.insert(
            key,
            ListingRecord {
                seller_id: restore.seller_id.clone(),
                token_id: restore.token_id.clone(),
                listing_id: restore.listing_id,
                node_index,
                approval_id: restore.approval_id,
            },
        );
        self.listing_tokens.insert(
            format!("{}{}{}", nft_contract_id, DELIMETER, restore.listing_id),
            restore.token_id,
        );
    }

    /// Deliver pending + carried reward from the reward fund into the
    /// recipient's wallet. A short fund converts the whole amount into a
    /// carried credit added to future harvests, never an error.
    /// Returns the amount actually delivered.
    pub(crate) fn internal_credit_listing_reward(
        &mut self,
        account_id: &AccountId,
        nft_contract_id: &AccountId,
        position: &mut Position,
        pending: u128,
    ) -> u128 {
        let total = pending + position.failed_credit;
        if total == 0 {
            return 0;
        }
        if self.listing_reward_fund >= total {
            self.listing_reward_fund -= total;
            position.failed_credit = 0;
            self.internal_credit(account_id, total);
            events::emit_listing_reward_harvest(account_id, nft_contract_id, total, 0);
            total
        } else {
            position.failed_credit = total;
            events::emit_listing_reward_harvest(account_id, nft_contract_id, 0, total);
            0
        }
    }
}

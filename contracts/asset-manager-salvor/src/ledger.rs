//! Bidding wallets: escrowed native balances funding purchases and offers.
//!
//! Every outbound native transfer resolves through a callback. Delivery
//! failure credits the amount to the recipient's `failed_transfer_balance`
//! instead of failing the triggering operation; only `withdraw` and
//! `claim_failed_transfers` are initiated by the recipient themselves.

use near_sdk::json_types::U128;
use near_sdk::{AccountId, Gas, NearToken, Promise, env, near};

use crate::external::ext_self;
use crate::*;

#[near]
impl AssetManager {
    /// Fund the caller's bidding wallet with the attached deposit.
    #[payable]
    #[handle_result]
    pub fn deposit(&mut self) -> Result<(), AssetManagerError> {
        let account_id = env::predecessor_account_id();
        let amount = env::attached_deposit().as_yoctonear();
        if amount == 0 {
            return Err(AssetManagerError::InvalidInput(
                "Deposit must be positive".into(),
            ));
        }

        let mut wallet = self.internal_wallet(&account_id);
        wallet.available += amount;
        let new_balance = wallet.available;
        self.wallets.insert(account_id.clone(), wallet);

        events::emit_wallet_deposit(&account_id, amount, new_balance);
        Ok(())
    }

    /// Withdraw spendable balance. Funds committed to outstanding offers
    /// cannot leave the wallet.
    #[handle_result]
    pub fn withdraw(&mut self, amount: U128) -> Result<Promise, AssetManagerError> {
        let account_id = env::predecessor_account_id();
        let amount = amount.0;
        if amount == 0 {
            return Err(AssetManagerError::InvalidInput(
                "Withdrawal must be positive".into(),
            ));
        }

        let mut wallet = self.internal_wallet(&account_id);
        if wallet.spendable() < amount {
            return Err(AssetManagerError::insufficient_wallet(
                amount,
                wallet.spendable(),
            ));
        }
        wallet.available -= amount;
        let new_balance = wallet.available;
        self.wallets.insert(account_id.clone(), wallet);

        events::emit_wallet_withdraw(&account_id, amount, new_balance);

        Ok(Promise::new(account_id.clone())
            .transfer(NearToken::from_yoctonear(amount))
            .then(
                ext_self::ext(env::current_account_id())
                    .with_static_gas(Gas::from_tgas(GAS_FOR_TRANSFER_CALLBACK))
                    .on_withdraw_resolved(account_id, U128(amount)),
            ))
    }

    #[private]
    pub fn on_withdraw_resolved(&mut self, account_id: AccountId, amount: U128) {
        if env::promise_result_checked(0, 0).is_ok() {
            return;
        }
        // The ledger debit stands; the undelivered amount becomes a claimable
        // credit rather than a rollback.
        let mut wallet = self.internal_wallet(&account_id);
        wallet.failed_transfer_balance += amount.0;
        self.wallets.insert(account_id.clone(), wallet);
        events::emit_failed_transfer_credit(&account_id, amount.0, "withdraw");
    }

    /// Move spendable balance from the caller's wallet to another wallet.
    /// Applied atomically: either both mutations happen or neither.
    #[handle_result]
    pub fn transfer_balance(
        &mut self,
        receiver_id: AccountId,
        amount: U128,
    ) -> Result<(), AssetManagerError> {
        let account_id = env::predecessor_account_id();
        if amount.0 == 0 {
            return Err(AssetManagerError::InvalidInput(
                "Transfer must be positive".into(),
            ));
        }
        if receiver_id == account_id {
            return Err(AssetManagerError::InvalidInput(
                "Sender and receiver must differ".into(),
            ));
        }
        self.internal_transfer(&account_id, &receiver_id, amount.0)
    }

    /// Pay out the caller's accumulated undelivered credits.
    #[handle_result]
    pub fn claim_failed_transfers(&mut self) -> Result<Promise, AssetManagerError> {
        let account_id = env::predecessor_account_id();
        let mut wallet = self.internal_wallet(&account_id);
        let amount = wallet.failed_transfer_balance;
        if amount == 0 {
            return Err(AssetManagerError::NotFound(
                "No failed transfer balance to claim".into(),
            ));
        }
        wallet.failed_transfer_balance = 0;
        self.wallets.insert(account_id.clone(), wallet);

        events::emit_failed_transfer_claim(&account_id, amount);

        Ok(Promise::new(account_id.clone())
            .transfer(NearToken::from_yoctonear(amount))
            .then(
                ext_self::ext(env::current_account_id())
                    .with_static_gas(Gas::from_tgas(GAS_FOR_TRANSFER_CALLBACK))
                    .on_failed_claim_resolved(account_id, U128(amount)),
            ))
    }

    #[private]
    pub fn on_failed_claim_resolved(&mut self, account_id: AccountId, amount: U128) {
        if env::promise_result_checked(0, 0).is_ok() {
            return;
        }
        let mut wallet = self.internal_wallet(&account_id);
        wallet.failed_transfer_balance += amount.0;
        self.wallets.insert(account_id, wallet);
    }

    #[private]
    pub fn on_external_payout_resolved(
        &mut self,
        receiver_id: AccountId,
        amount: U128,
        context: String,
    ) {
        if env::promise_result_checked(0, 0).is_ok() {
            return;
        }
        let mut wallet = self.internal_wallet(&receiver_id);
        wallet.failed_transfer_balance += amount.0;
        self.wallets.insert(receiver_id.clone(), wallet);
        events::emit_failed_transfer_credit(&receiver_id, amount.0, &context);
    }

    // ── Views ────────────────────────────────────────────────────────

    pub fn get_wallet(&self, account_id: AccountId) -> Wallet {
        self.internal_wallet(&account_id)
    }
}

impl AssetManager {
    pub(crate) fn internal_wallet(&self, account_id: &AccountId) -> Wallet {
        self.wallets.get(account_id).cloned().unwrap_or_default()
    }

    pub(crate) fn internal_credit(&mut self, account_id: &AccountId, amount: u128) {
        if amount == 0 {
            return;
        }
        let mut wallet = self.internal_wallet(account_id);
        wallet.available += amount;
        self.wallets.insert(account_id.clone(), wallet);
    }

    pub(crate) fn internal_debit(
        &mut self,
        account_id: &AccountId,
        amount: u128,
    ) -> Result<(), AssetManagerError> {
        let mut wallet = self.internal_wallet(account_id);
        if wallet.spendable() < amount {
            return Err(AssetManagerError::insufficient_wallet(
                amount,
                wallet.spendable(),
            ));
        }
        wallet.available -= amount;
        self.wallets.insert(account_id.clone(), wallet);
        Ok(())
    }

    /// Move balance between two wallets. Either both mutations happen or
    /// neither: the debit is checked before anything is written.
    pub(crate) fn internal_transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), AssetManagerError> {
        self.internal_debit(from, amount)?;
        self.internal_credit(to, amount);
        events::emit_wallet_transfer(from, to, amount);
        Ok(())
    }

    /// Commit part of a wallet's balance to an outstanding offer.
    pub(crate) fn internal_lock_for_offer(
        &mut self,
        account_id: &AccountId,
        amount: u128,
    ) -> Result<(), AssetManagerError> {
        let mut wallet = self.internal_wallet(account_id);
        if wallet.spendable() < amount {
            return Err(AssetManagerError::insufficient_wallet(
                amount,
                wallet.spendable(),
            ));
        }
        wallet.locked_in_offers += amount;
        self.wallets.insert(account_id.clone(), wallet);
        Ok(())
    }

    pub(crate) fn internal_unlock_from_offer(&mut self, account_id: &AccountId, amount: u128) {
        let mut wallet = self.internal_wallet(account_id);
        wallet.locked_in_offers = wallet.locked_in_offers.saturating_sub(amount);
        self.wallets.insert(account_id.clone(), wallet);
    }

    /// Spend funds that were locked behind an offer: releases the lock and
    /// debits in one step.
    pub(crate) fn internal_spend_locked(
        &mut self,
        account_id: &AccountId,
        amount: u128,
    ) -> Result<(), AssetManagerError> {
        let mut wallet = self.internal_wallet(account_id);
        if wallet.locked_in_offers < amount || wallet.available < amount {
            return Err(AssetManagerError::InternalError(
                "Offer lock does not cover the settlement amount".into(),
            ));
        }
        wallet.locked_in_offers -= amount;
        wallet.available -= amount;
        self.wallets.insert(account_id.clone(), wallet);
        Ok(())
    }

    /// Send native tokens to an external receiver under the credit-on-failure
    /// policy: a failed delivery becomes a claimable balance, never an error.
    pub(crate) fn internal_pay_external(
        &mut self,
        receiver_id: &AccountId,
        amount: u128,
        context: &str,
    ) {
        if amount == 0 {
            return;
        }
        Promise::new(receiver_id.clone())
            .transfer(NearToken::from_yoctonear(amount))
            .then(
                ext_self::ext(env::current_account_id())
                    .with_static_gas(Gas::from_tgas(GAS_FOR_TRANSFER_CALLBACK))
                    .on_external_payout_resolved(
                        receiver_id.clone(),
                        U128(amount),
                        context.to_string(),
                    ),
            );
    }
}

//! NEP-297 JSON events for indexers and audit reconciliation.

use near_sdk::json_types::U128;
use near_sdk::{AccountId, env, serde_json};

const EVENT_STANDARD: &str = "salvor";
const EVENT_VERSION: &str = "1.0.0";
const EVENT_JSON_PREFIX: &str = "EVENT_JSON:";

fn emit_event(event_type: &str, account_id: &AccountId, data: serde_json::Value) {
    let event = serde_json::json!({
        "standard": EVENT_STANDARD,
        "version": EVENT_VERSION,
        "event": event_type,
        "data": [{
            "account_id": account_id.to_string(),
            "extra": data
        }]
    });
    env::log_str(&format!("{EVENT_JSON_PREFIX}{}", event));
}

// ── Ledger ───────────────────────────────────────────────────────────────────

pub fn emit_wallet_deposit(account_id: &AccountId, amount: u128, new_balance: u128) {
    emit_event(
        "WALLET_DEPOSIT",
        account_id,
        serde_json::json!({
            "amount": amount.to_string(),
            "new_balance": new_balance.to_string()
        }),
    );
}

pub fn emit_wallet_withdraw(account_id: &AccountId, amount: u128, new_balance: u128) {
    emit_event(
        "WALLET_WITHDRAW",
        account_id,
        serde_json::json!({
            "amount": amount.to_string(),
            "new_balance": new_balance.to_string()
        }),
    );
}

pub fn emit_wallet_transfer(from: &AccountId, to: &AccountId, amount: u128) {
    emit_event(
        "WALLET_TRANSFER",
        from,
        serde_json::json!({
            "to": to.to_string(),
            "amount": amount.to_string()
        }),
    );
}

pub fn emit_failed_transfer_credit(account_id: &AccountId, amount: u128, context: &str) {
    emit_event(
        "FAILED_TRANSFER_CREDIT",
        account_id,
        serde_json::json!({
            "amount": amount.to_string(),
            "context": context
        }),
    );
}

pub fn emit_failed_transfer_claim(account_id: &AccountId, amount: u128) {
    emit_event(
        "FAILED_TRANSFER_CLAIM",
        account_id,
        serde_json::json!({
            "amount": amount.to_string()
        }),
    );
}

// ── Offers ───────────────────────────────────────────────────────────────────

pub fn emit_offer_made(
    buyer_id: &AccountId,
    nft_contract_id: &AccountId,
    token_id: &str,
    amount: u128,
) {
    emit_event(
        "OFFER_MADE",
        buyer_id,
        serde_json::json!({
            "nft_contract_id": nft_contract_id.to_string(),
            "token_id": token_id,
            "amount": amount.to_string()
        }),
    );
}

pub fn emit_offer_cancelled(
    buyer_id: &AccountId,
    nft_contract_id: &AccountId,
    token_id: &str,
    amount: u128,
) {
    emit_event(
        "OFFER_CANCELLED",
        buyer_id,
        serde_json::json!({
            "nft_contract_id": nft_contract_id.to_string(),
            "token_id": token_id,
            "amount": amount.to_string()
        }),
    );
}

// ── Settlement ───────────────────────────────────────────────────────────────

pub fn emit_sale_settled(
    buyer_id: &AccountId,
    seller_id: &AccountId,
    nft_contract_id: &AccountId,
    token_id: &str,
    price: U128,
    fee: u128,
    royalty: u128,
) {
    emit_event(
        "SALE_SETTLED",
        buyer_id,
        serde_json::json!({
            "seller_id": seller_id.to_string(),
            "nft_contract_id": nft_contract_id.to_string(),
            "token_id": token_id,
            "price": price.0.to_string(),
            "fee": fee.to_string(),
            "royalty": royalty.to_string()
        }),
    );
}

pub fn emit_sale_failed(
    buyer_id: &AccountId,
    seller_id: &AccountId,
    nft_contract_id: &AccountId,
    token_id: &str,
    price: U128,
    reason: &str,
) {
    emit_event(
        "SALE_FAILED",
        buyer_id,
        serde_json::json!({
            "seller_id": seller_id.to_string(),
            "nft_contract_id": nft_contract_id.to_string(),
            "token_id": token_id,
            "price": price.0.to_string(),
            "reason": reason
        }),
    );
}

// ── Pools ────────────────────────────────────────────────────────────────────

pub fn emit_pool_added(nft_contract_id: &AccountId, reward_rate_per_second: u128) {
    emit_event(
        "POOL_ADDED",
        nft_contract_id,
        serde_json::json!({
            "reward_rate_per_second": reward_rate_per_second.to_string()
        }),
    );
}

pub fn emit_token_listed(
    seller_id: &AccountId,
    nft_contract_id: &AccountId,
    token_id: &str,
    price: u128,
    node_index: u32,
) {
    emit_event(
        "TOKEN_LISTED",
        seller_id,
        serde_json::json!({
            "nft_contract_id": nft_contract_id.to_string(),
            "token_id": token_id,
            "price": price.to_string(),
            "node_index": node_index
        }),
    );
}

pub fn emit_listing_withdrawn(seller_id: &AccountId, nft_contract_id: &AccountId, token_id: &str) {
    emit_event(
        "LISTING_WITHDRAWN",
        seller_id,
        serde_json::json!({
            "nft_contract_id": nft_contract_id.to_string(),
            "token_id": token_id
        }),
    );
}

pub fn emit_listing_price_updated(
    seller_id: &AccountId,
    nft_contract_id: &AccountId,
    token_id: &str,
    old_price: u128,
    new_price: u128,
) {
    emit_event(
        "LISTING_PRICE_UPDATED",
        seller_id,
        serde_json::json!({
            "nft_contract_id": nft_contract_id.to_string(),
            "token_id": token_id,
            "old_price": old_price.to_string(),
            "new_price": new_price.to_string()
        }),
    );
}

pub fn emit_listing_reward_harvest(
    account_id: &AccountId,
    nft_contract_id: &AccountId,
    amount: u128,
    carried_credit: u128,
) {
    emit_event(
        "LISTING_REWARD_HARVEST",
        account_id,
        serde_json::json!({
            "nft_contract_id": nft_contract_id.to_string(),
            "amount": amount.to_string(),
            "carried_credit": carried_credit.to_string()
        }),
    );
}

// ── Config ───────────────────────────────────────────────────────────────────

pub fn emit_stake_share_updated(account_id: &AccountId, share_bps: u16) {
    emit_event(
        "STAKE_SHARE_UPDATED",
        account_id,
        serde_json::json!({ "share_bps": share_bps }),
    );
}

pub fn emit_config_updated(owner_id: &AccountId, param: &str, value: &str) {
    emit_event(
        "CONFIG_UPDATED",
        owner_id,
        serde_json::json!({
            "param": param,
            "value": value
        }),
    );
}

pub fn emit_reward_fund_deposit(account_id: &AccountId, amount: u128, new_fund: u128) {
    emit_event(
        "REWARD_FUND_DEPOSIT",
        account_id,
        serde_json::json!({
            "amount": amount.to_string(),
            "new_fund": new_fund.to_string()
        }),
    );
}

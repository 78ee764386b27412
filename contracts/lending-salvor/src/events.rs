//! NEP-297 JSON events.

use near_sdk::{env, serde_json, AccountId};

const EVENT_STANDARD: &str = "salvor";
const EVENT_VERSION: &str = "1.0.0";
const EVENT_JSON_PREFIX: &str = "EVENT_JSON:";

pub fn emit_event(event_type: &str, account_id: &AccountId, data: serde_json::Value) {
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

pub const EVENT_BALANCE_DEPOSIT: &str = "BALANCE_DEPOSIT";
pub const EVENT_BALANCE_WITHDRAW: &str = "BALANCE_WITHDRAW";
pub const EVENT_LOAN_OPENED: &str = "LOAN_OPENED";
pub const EVENT_LOAN_REPAID: &str = "LOAN_REPAID";
pub const EVENT_LOAN_EXTENDED: &str = "LOAN_EXTENDED";
pub const EVENT_LOAN_DELEGATED: &str = "LOAN_DELEGATED";
pub const EVENT_AUCTION_BID: &str = "AUCTION_BID";
pub const EVENT_COLLATERAL_RETURN_PENDING: &str = "COLLATERAL_RETURN_PENDING";
pub const EVENT_SIGNING_KEY_REGISTERED: &str = "SIGNING_KEY_REGISTERED";
pub const EVENT_PARAMS_UPDATED: &str = "PARAMS_UPDATED";

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

pub const EVENT_ART_STAKE: &str = "ART_STAKE";
pub const EVENT_ART_UNSTAKE: &str = "ART_UNSTAKE";
pub const EVENT_NFT_STAKE: &str = "NFT_STAKE";
pub const EVENT_NFT_UNSTAKE: &str = "NFT_UNSTAKE";
pub const EVENT_REWARDS_DEPOSIT: &str = "REWARDS_DEPOSIT";
pub const EVENT_REWARDS_CLAIM: &str = "REWARDS_CLAIM";
pub const EVENT_EMISSION_FUNDED: &str = "EMISSION_FUNDED";
pub const EVENT_PARAMS_UPDATED: &str = "PARAMS_UPDATED";
pub const EVENT_PLATFORM_ADDED: &str = "PLATFORM_ADDED";
pub const EVENT_PLATFORM_REMOVED: &str = "PLATFORM_REMOVED";

use near_sdk::test_utils::VMContextBuilder;
use near_sdk::{AccountId, NearToken, testing_env};

use crate::*;

mod offers_tests;

// --- Test Helpers ---

pub fn owner() -> AccountId {
    "owner.near".parse().unwrap()
}

pub fn treasury() -> AccountId {
    "treasury.near".parse().unwrap()
}

pub fn veart() -> AccountId {
    "veart.near".parse().unwrap()
}

pub fn manager() -> AccountId {
    "asset-manager.near".parse().unwrap()
}

pub fn platform() -> AccountId {
    "platform.near".parse().unwrap()
}

pub fn nft() -> AccountId {
    "collection.near".parse().unwrap()
}

pub fn alice() -> AccountId {
    "alice.near".parse().unwrap()
}

pub fn bob() -> AccountId {
    "bob.near".parse().unwrap()
}

pub fn context(predecessor: AccountId) -> VMContextBuilder {
    let mut builder = VMContextBuilder::new();
    builder
        .current_account_id(manager())
        .signer_account_id(predecessor.clone())
        .predecessor_account_id(predecessor);
    builder
}

/// Context at `seconds` since epoch; reward accrual runs on seconds.
pub fn context_at(predecessor: AccountId, seconds: u64) -> VMContextBuilder {
    let mut builder = context(predecessor);
    builder.block_timestamp(seconds * NS_PER_SEC);
    builder
}

pub fn setup_contract() -> AssetManager {
    testing_env!(context(owner()).build());
    AssetManager::new(owner(), treasury(), veart())
}

pub fn deposit_as(contract: &mut AssetManager, account: AccountId, amount: u128) {
    let mut ctx = context(account);
    ctx.attached_deposit(NearToken::from_yoctonear(amount));
    testing_env!(ctx.build());
    contract.deposit().unwrap();
}

/// Owner registers a pool with the given economics at t=0.
pub fn setup_pool(contract: &mut AssetManager, rate: u128, commission_bps: u16, markup_bps: u16) {
    testing_env!(context_at(owner(), 0).build());
    contract
        .add_pool(
            nft(),
            near_sdk::json_types::U128(rate),
            commission_bps,
            markup_bps,
            near_sdk::json_types::U128(100),
        )
        .unwrap();
}

/// List a token through the NEP-178 approval callback at `seconds`.
pub fn list_token(
    contract: &mut AssetManager,
    seller: AccountId,
    token_id: &str,
    price: u128,
    approval_id: u64,
    seconds: u64,
) {
    let (free_index, previous_index) = {
        let point = contract
            .locate_insertion(nft(), near_sdk::json_types::U128(price))
            .unwrap();
        (point.free_index, point.previous_index)
    };
    let mut ctx = context_at(nft(), seconds);
    ctx.signer_account_id(seller.clone());
    testing_env!(ctx.build());
    contract.nft_on_approve(
        token_id.to_string(),
        seller,
        approval_id,
        format!(
            "{{\"action\":\"list\",\"price\":\"{}\",\"free_index\":{},\"previous_index\":{}}}",
            price, free_index, previous_index
        ),
    );
}

#[test]
fn test_new() {
    let contract = setup_contract();
    assert_eq!(contract.owner_id, owner());
    assert_eq!(contract.treasury_id, treasury());
    assert_eq!(contract.veart_id, veart());
    assert_eq!(contract.commission_bps, DEFAULT_COMMISSION_BPS);
    assert_eq!(contract.listing_reward_fund, 0);

    let stats = contract.get_stats();
    assert_eq!(stats.pool_count, 0);
    assert!(stats.fee_discount_enabled);
}

#[test]
fn test_owner_gating() {
    let mut contract = setup_contract();
    testing_env!(context(alice()).build());
    assert!(matches!(
        contract.set_commission_bps(100),
        Err(AssetManagerError::Unauthorized(_))
    ));
    assert!(matches!(
        contract.add_platform(platform()),
        Err(AssetManagerError::Unauthorized(_))
    ));
}

use anyhow::Result;
use near_workspaces::sandbox;
use near_workspaces::types::{NearGas, NearToken};
use serde_json::json;

use crate::utils::{deploy_asset_manager, make_account};

#[tokio::test]
async fn test_wallet_deposit_withdraw_cycle() -> Result<()> {
    let worker = sandbox().await?;
    let contract = deploy_asset_manager(&worker).await?;
    let owner = make_account(&worker, "owner").await?;
    let alice = make_account(&worker, "alice").await?;

    contract
        .call("new")
        .args_json(json!({
            "owner_id": owner.id(),
            "treasury_id": owner.id(),
            "veart_id": "veart.test.near"
        }))
        .transact()
        .await?
        .into_result()?;

    alice
        .call(contract.id(), "deposit")
        .deposit(NearToken::from_near(5))
        .transact()
        .await?
        .into_result()?;

    let wallet: serde_json::Value = contract
        .call("get_wallet")
        .args_json(json!({ "account_id": alice.id() }))
        .view()
        .await?
        .json()?;
    assert_eq!(
        wallet["available"].as_str().unwrap(),
        NearToken::from_near(5).as_yoctonear().to_string()
    );

    alice
        .call(contract.id(), "withdraw")
        .args_json(json!({ "amount": NearToken::from_near(2).as_yoctonear().to_string() }))
        .gas(NearGas::from_tgas(100))
        .transact()
        .await?
        .into_result()?;

    let wallet: serde_json::Value = contract
        .call("get_wallet")
        .args_json(json!({ "account_id": alice.id() }))
        .view()
        .await?
        .json()?;
    assert_eq!(
        wallet["available"].as_str().unwrap(),
        NearToken::from_near(3).as_yoctonear().to_string()
    );
    Ok(())
}

#[tokio::test]
async fn test_offer_lock_and_cancel() -> Result<()> {
    let worker = sandbox().await?;
    let contract = deploy_asset_manager(&worker).await?;
    let owner = make_account(&worker, "owner").await?;
    let alice = make_account(&worker, "alice").await?;

    contract
        .call("new")
        .args_json(json!({
            "owner_id": owner.id(),
            "treasury_id": owner.id(),
            "veart_id": "veart.test.near"
        }))
        .transact()
        .await?
        .into_result()?;

    alice
        .call(contract.id(), "deposit")
        .deposit(NearToken::from_near(5))
        .transact()
        .await?
        .into_result()?;

    alice
        .call(contract.id(), "make_offer")
        .args_json(json!({
            "nft_contract_id": "collection.test.near",
            "token_id": "token-1",
            "amount": NearToken::from_near(4).as_yoctonear().to_string(),
            "expires_at": null
        }))
        .transact()
        .await?
        .into_result()?;

    // The lock blocks withdrawals beyond the spendable headroom.
    let outcome = alice
        .call(contract.id(), "withdraw")
        .args_json(json!({ "amount": NearToken::from_near(2).as_yoctonear().to_string() }))
        .gas(NearGas::from_tgas(100))
        .transact()
        .await?;
    assert!(outcome.is_failure());

    alice
        .call(contract.id(), "cancel_offer")
        .args_json(json!({
            "nft_contract_id": "collection.test.near",
            "token_id": "token-1"
        }))
        .transact()
        .await?
        .into_result()?;

    alice
        .call(contract.id(), "withdraw")
        .args_json(json!({ "amount": NearToken::from_near(2).as_yoctonear().to_string() }))
        .gas(NearGas::from_tgas(100))
        .transact()
        .await?
        .into_result()?;
    Ok(())
}

#[tokio::test]
async fn test_pool_lifecycle_and_floor_queries() -> Result<()> {
    let worker = sandbox().await?;
    let contract = deploy_asset_manager(&worker).await?;
    let owner = make_account(&worker, "owner").await?;

    contract
        .call("new")
        .args_json(json!({
            "owner_id": owner.id(),
            "treasury_id": owner.id(),
            "veart_id": "veart.test.near"
        }))
        .transact()
        .await?
        .into_result()?;

    owner
        .call(contract.id(), "add_pool")
        .args_json(json!({
            "nft_contract_id": "collection.test.near",
            "reward_rate_per_second": "100",
            "commission_bps": 500,
            "markup_bps": 1000,
            "initial_floor_price": NearToken::from_near(1).as_yoctonear().to_string()
        }))
        .transact()
        .await?
        .into_result()?;

    let pool: serde_json::Value = contract
        .call("get_pool")
        .args_json(json!({ "nft_contract_id": "collection.test.near" }))
        .view()
        .await?
        .json()?;
    assert_eq!(pool["active_listings"], 0);
    assert_eq!(pool["commission_bps"], 500);
    assert!(pool["floor_price"].is_null());

    // Duplicate pools are rejected.
    let outcome = owner
        .call(contract.id(), "add_pool")
        .args_json(json!({
            "nft_contract_id": "collection.test.near",
            "reward_rate_per_second": "100",
            "commission_bps": 500,
            "markup_bps": 1000,
            "initial_floor_price": "1"
        }))
        .transact()
        .await?;
    assert!(outcome.is_failure());

    let point: serde_json::Value = contract
        .call("locate_insertion")
        .args_json(json!({
            "nft_contract_id": "collection.test.near",
            "price": "100"
        }))
        .view()
        .await?
        .json()?;
    assert_eq!(point["free_index"], 0);
    assert_eq!(point["previous_index"], 0);
    Ok(())
}

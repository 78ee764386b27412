use anyhow::Result;
use near_workspaces::sandbox;
use near_workspaces::types::NearToken;
use serde_json::json;

use crate::utils::{deploy_veart, make_account};

async fn init_veart(
    contract: &near_workspaces::Contract,
    owner: &near_workspaces::Account,
) -> Result<()> {
    contract
        .call("new")
        .args_json(json!({
            "art_token_id": "art.test.near",
            "nft_contract_id": "nft.test.near",
            "asset_manager_id": "asset-manager.test.near",
            "owner_id": owner.id(),
            "art_emission_rate_per_second": "100"
        }))
        .transact()
        .await?
        .into_result()?;
    Ok(())
}

#[tokio::test]
async fn test_init_and_stats() -> Result<()> {
    let worker = sandbox().await?;
    let contract = deploy_veart(&worker).await?;
    let owner = make_account(&worker, "owner").await?;
    init_veart(&contract, &owner).await?;

    let stats: serde_json::Value = contract.call("get_stats").view().await?.json()?;
    assert_eq!(stats["art_token_id"], "art.test.near");
    assert_eq!(stats["total_art_staked"], "0");
    assert_eq!(stats["art_emission_rate_per_second"], "100");
    Ok(())
}

#[tokio::test]
async fn test_reward_deposit_requires_whitelisting() -> Result<()> {
    let worker = sandbox().await?;
    let contract = deploy_veart(&worker).await?;
    let owner = make_account(&worker, "owner").await?;
    let platform = make_account(&worker, "platform").await?;
    init_veart(&contract, &owner).await?;

    let outcome = platform
        .call(contract.id(), "deposit_rewards")
        .deposit(NearToken::from_near(1))
        .transact()
        .await?;
    assert!(outcome.is_failure());

    owner
        .call(contract.id(), "add_platform")
        .args_json(json!({ "platform_id": platform.id() }))
        .transact()
        .await?
        .into_result()?;

    // With no stakers the deposit parks as undistributed, not lost.
    platform
        .call(contract.id(), "deposit_rewards")
        .deposit(NearToken::from_near(1))
        .transact()
        .await?
        .into_result()?;

    let stats: serde_json::Value = contract.call("get_stats").view().await?.json()?;
    assert_eq!(
        stats["undistributed_native"].as_str().unwrap(),
        NearToken::from_near(1).as_yoctonear().to_string()
    );
    Ok(())
}

#[tokio::test]
async fn test_emission_rate_update_is_owner_only() -> Result<()> {
    let worker = sandbox().await?;
    let contract = deploy_veart(&worker).await?;
    let owner = make_account(&worker, "owner").await?;
    let stranger = make_account(&worker, "stranger").await?;
    init_veart(&contract, &owner).await?;

    let outcome = stranger
        .call(contract.id(), "set_art_emission_rate")
        .args_json(json!({ "rate_per_second": "7" }))
        .transact()
        .await?;
    assert!(outcome.is_failure());

    owner
        .call(contract.id(), "set_art_emission_rate")
        .args_json(json!({ "rate_per_second": "7" }))
        .transact()
        .await?
        .into_result()?;

    let stats: serde_json::Value = contract.call("get_stats").view().await?.json()?;
    assert_eq!(stats["art_emission_rate_per_second"], "7");
    Ok(())
}

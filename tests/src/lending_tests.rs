use anyhow::Result;
use near_crypto::{KeyType, SecretKey};
use near_workspaces::sandbox;
use near_workspaces::types::{NearGas, NearToken};
use serde_json::json;

use crate::utils::{deploy_lending, loan_offer_payload, make_account, sign_offer_payload};

const DAY: u64 = 86_400;

async fn init_lending(
    contract: &near_workspaces::Contract,
    owner: &near_workspaces::Account,
) -> Result<()> {
    contract
        .call("new")
        .args_json(json!({
            "owner_id": owner.id(),
            "treasury_id": owner.id(),
            "auction_duration_seconds": DAY,
            "drop_interval_seconds": 3600
        }))
        .transact()
        .await?
        .into_result()?;
    Ok(())
}

#[tokio::test]
async fn test_lender_balance_and_key_registration() -> Result<()> {
    let worker = sandbox().await?;
    let contract = deploy_lending(&worker).await?;
    let owner = make_account(&worker, "owner").await?;
    let lender = make_account(&worker, "lender").await?;
    init_lending(&contract, &owner).await?;

    lender
        .call(contract.id(), "deposit")
        .deposit(NearToken::from_near(10))
        .transact()
        .await?
        .into_result()?;
    let balance: String = contract
        .call("get_balance")
        .args_json(json!({ "account_id": lender.id() }))
        .view()
        .await?
        .json()?;
    assert_eq!(balance, NearToken::from_near(10).as_yoctonear().to_string());

    let signing_key = SecretKey::from_random(KeyType::ED25519);
    lender
        .call(contract.id(), "register_signing_key")
        .args_json(json!({ "public_key": signing_key.public_key().to_string() }))
        .transact()
        .await?
        .into_result()?;

    let stored: Option<String> = contract
        .call("get_signing_key")
        .args_json(json!({ "account_id": lender.id() }))
        .view()
        .await?
        .json()?;
    assert_eq!(stored, Some(signing_key.public_key().to_string()));
    Ok(())
}

/// End-to-end: a lender signs an offer off-chain, the borrower redeems it by
/// transferring collateral, then repays before the deadline.
#[tokio::test]
async fn test_signed_offer_borrow_and_repay() -> Result<()> {
    let worker = sandbox().await?;
    let contract = deploy_lending(&worker).await?;
    let owner = make_account(&worker, "owner").await?;
    let lender = make_account(&worker, "lender").await?;
    let nft = make_account(&worker, "nft").await?;
    let borrower = make_account(&worker, "borrower").await?;
    init_lending(&contract, &owner).await?;

    lender
        .call(contract.id(), "deposit")
        .deposit(NearToken::from_near(10))
        .transact()
        .await?
        .into_result()?;

    let signing_key = SecretKey::from_random(KeyType::ED25519);
    lender
        .call(contract.id(), "register_signing_key")
        .args_json(json!({ "public_key": signing_key.public_key().to_string() }))
        .transact()
        .await?
        .into_result()?;

    let principal = NearToken::from_near(5).as_yoctonear();
    let rate = 100_000_000_000_000_000u128; // 10%
    let payload = loan_offer_payload(
        contract.id().as_str(),
        lender.id().as_str(),
        nft.id().as_str(),
        "token-1",
        principal,
        10 * DAY,
        rate,
        1,
        0,
    );
    let signature = sign_offer_payload(&signing_key, &payload);

    let msg = json!({
        "offer": {
            "lender_id": lender.id(),
            "nft_contract_id": nft.id(),
            "token_id": "token-1",
            "principal": principal.to_string(),
            "duration_seconds": 10 * DAY,
            "rate_per_ether": rate.to_string(),
            "nonce": 1,
            "expires_at": 0
        },
        "signature": near_sdk::base64::Engine::encode(
            &near_sdk::base64::engine::general_purpose::STANDARD,
            &signature
        )
    })
    .to_string();

    // The NFT contract account plays the collection: it invokes the
    // receiver the way nft_transfer_call's recipient leg would.
    let outcome = nft
        .call(contract.id(), "nft_on_transfer")
        .args_json(json!({
            "sender_id": borrower.id(),
            "previous_owner_id": borrower.id(),
            "token_id": "token-1",
            "msg": msg.clone()
        }))
        .gas(NearGas::from_tgas(200))
        .transact()
        .await?;
    outcome.into_result()?;

    // Principal moved lender → borrower inside the escrow ledger.
    let borrower_balance: String = contract
        .call("get_balance")
        .args_json(json!({ "account_id": borrower.id() }))
        .view()
        .await?
        .json()?;
    assert_eq!(borrower_balance, principal.to_string());

    let loan: serde_json::Value = contract
        .call("get_loan")
        .args_json(json!({ "nft_contract_id": nft.id(), "token_id": "token-1" }))
        .view()
        .await?
        .json()?;
    assert_eq!(loan["borrower_id"], borrower.id().as_str());
    assert_eq!(loan["lender_id"], lender.id().as_str());

    // Day 1: repayment = principal + 10% * 1/10 = principal * 1.01.
    let repayment: String = contract
        .call("get_repayment_amount")
        .args_json(json!({ "nft_contract_id": nft.id(), "token_id": "token-1" }))
        .view()
        .await?
        .json()?;
    assert_eq!(repayment, (principal + principal / 100).to_string());

    borrower
        .call(contract.id(), "repay")
        .args_json(json!({ "nft_contract_id": nft.id(), "token_id": "token-1" }))
        .deposit(NearToken::from_near(1))
        .gas(NearGas::from_tgas(200))
        .transact()
        .await?
        .into_result()?;

    let loan: Option<serde_json::Value> = contract
        .call("get_loan")
        .args_json(json!({ "nft_contract_id": nft.id(), "token_id": "token-1" }))
        .view()
        .await?
        .json()?;
    assert!(loan.is_none());

    // Replaying the consumed nonce fails.
    let outcome = nft
        .call(contract.id(), "nft_on_transfer")
        .args_json(json!({
            "sender_id": borrower.id(),
            "previous_owner_id": borrower.id(),
            "token_id": "token-1",
            "msg": msg
        }))
        .gas(NearGas::from_tgas(200))
        .transact()
        .await?;
    assert!(outcome.is_failure());
    Ok(())
}

#[tokio::test]
async fn test_tampered_offer_signature_is_rejected() -> Result<()> {
    let worker = sandbox().await?;
    let contract = deploy_lending(&worker).await?;
    let owner = make_account(&worker, "owner").await?;
    let lender = make_account(&worker, "lender").await?;
    let nft = make_account(&worker, "nft").await?;
    let borrower = make_account(&worker, "borrower").await?;
    init_lending(&contract, &owner).await?;

    lender
        .call(contract.id(), "deposit")
        .deposit(NearToken::from_near(10))
        .transact()
        .await?
        .into_result()?;
    let signing_key = SecretKey::from_random(KeyType::ED25519);
    lender
        .call(contract.id(), "register_signing_key")
        .args_json(json!({ "public_key": signing_key.public_key().to_string() }))
        .transact()
        .await?
        .into_result()?;

    let principal = NearToken::from_near(5).as_yoctonear();
    let rate = 100_000_000_000_000_000u128;
    let payload = loan_offer_payload(
        contract.id().as_str(),
        lender.id().as_str(),
        nft.id().as_str(),
        "token-1",
        principal,
        10 * DAY,
        rate,
        1,
        0,
    );
    let signature = sign_offer_payload(&signing_key, &payload);

    // The borrower doubles the principal after the lender signed.
    let msg = json!({
        "offer": {
            "lender_id": lender.id(),
            "nft_contract_id": nft.id(),
            "token_id": "token-1",
            "principal": (2 * principal).to_string(),
            "duration_seconds": 10 * DAY,
            "rate_per_ether": rate.to_string(),
            "nonce": 1,
            "expires_at": 0
        },
        "signature": near_sdk::base64::Engine::encode(
            &near_sdk::base64::engine::general_purpose::STANDARD,
            &signature
        )
    })
    .to_string();

    let outcome = nft
        .call(contract.id(), "nft_on_transfer")
        .args_json(json!({
            "sender_id": borrower.id(),
            "previous_owner_id": borrower.id(),
            "token_id": "token-1",
            "msg": msg
        }))
        .gas(NearGas::from_tgas(200))
        .transact()
        .await?;
    assert!(outcome.is_failure());
    Ok(())
}

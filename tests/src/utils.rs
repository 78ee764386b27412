//! Shared helpers for sandbox tests: wasm loading and loan-offer signing.

use anyhow::Result;
use near_workspaces::network::Sandbox;
use near_workspaces::{Account, Contract, Worker};
use near_workspaces::types::NearToken;
use serde_json::json;
use std::env;
use std::fs;

pub async fn deploy(worker: &Worker<Sandbox>, env_var: &str, default_path: &str) -> Result<Contract> {
    let wasm_path = env::var(env_var).unwrap_or(default_path.to_string());
    let wasm = fs::read(&wasm_path)?;
    Ok(worker.dev_deploy(&wasm).await?)
}

pub async fn deploy_asset_manager(worker: &Worker<Sandbox>) -> Result<Contract> {
    deploy(
        worker,
        "ASSET_MANAGER_WASM_PATH",
        "../target/wasm32-unknown-unknown/release/asset_manager_salvor.wasm",
    )
    .await
}

pub async fn deploy_veart(worker: &Worker<Sandbox>) -> Result<Contract> {
    deploy(
        worker,
        "VEART_WASM_PATH",
        "../target/wasm32-unknown-unknown/release/veart_salvor.wasm",
    )
    .await
}

pub async fn deploy_lending(worker: &Worker<Sandbox>) -> Result<Contract> {
    deploy(
        worker,
        "LENDING_WASM_PATH",
        "../target/wasm32-unknown-unknown/release/lending_salvor.wasm",
    )
    .await
}

pub async fn make_account(worker: &Worker<Sandbox>, name: &str) -> Result<Account> {
    let root = worker.root_account()?;
    let account = root
        .create_subaccount(name)
        .initial_balance(NearToken::from_near(50))
        .transact()
        .await?
        .into_result()?;
    Ok(account)
}

/// Canonical loan-offer signing payload; must byte-match
/// `lending-salvor/src/offer_sig.rs::signing_message`.
pub fn loan_offer_payload(
    contract_id: &str,
    lender_id: &str,
    nft_contract_id: &str,
    token_id: &str,
    principal: u128,
    duration_seconds: u64,
    rate_per_ether: u128,
    nonce: u64,
    expires_at: u64,
) -> Vec<u8> {
    json!({
        "domain": "salvor-lending",
        "contract_id": contract_id,
        "lender_id": lender_id,
        "nft_contract_id": nft_contract_id,
        "token_id": token_id,
        "principal": principal.to_string(),
        "duration_seconds": duration_seconds,
        "rate_per_ether": rate_per_ether.to_string(),
        "nonce": nonce,
        "expires_at": expires_at,
    })
    .to_string()
    .into_bytes()
}

/// Sign a loan-offer payload with an ed25519 key the way lenders do
/// off-chain: the contract verifies over the sha256 of the payload.
pub fn sign_offer_payload(secret_key: &near_crypto::SecretKey, payload: &[u8]) -> Vec<u8> {
    use near_crypto::Signature;
    use sha2::{Digest, Sha256};
    let hash = Sha256::digest(payload);
    match secret_key.sign(&hash) {
        Signature::ED25519(sig) => sig.to_bytes().to_vec(),
        _ => panic!("expected an ed25519 key"),
    }
}

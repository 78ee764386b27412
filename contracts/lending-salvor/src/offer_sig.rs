//! Ed25519 verification of off-chain-signed loan offers using NEAR host
//! functions. The signing payload is domain-separated by this contract's
//! account id, so an offer signed for one deployment cannot be replayed
//! against another.

use near_sdk::{env, CurveType, PublicKey};

use crate::errors::LendingError;
use crate::types::LoanOffer;

pub const DOMAIN_PREFIX: &str = "salvor-lending";

/// Canonical signing payload. Field order is part of the wire format.
pub fn signing_message(offer: &LoanOffer, contract_id: &str) -> Vec<u8> {
    let payload = near_sdk::serde_json::json!({
        "domain": DOMAIN_PREFIX,
        "contract_id": contract_id,
        "lender_id": offer.lender_id,
        "nft_contract_id": offer.nft_contract_id,
        "token_id": offer.token_id,
        "principal": offer.principal,
        "duration_seconds": offer.duration_seconds,
        "rate_per_ether": offer.rate_per_ether,
        "nonce": offer.nonce,
        "expires_at": offer.expires_at,
    });
    payload.to_string().into_bytes()
}

/// Verify an ed25519-signed loan offer against the lender's registered key.
pub fn verify_loan_offer(
    offer: &LoanOffer,
    signature: &[u8],
    public_key: &PublicKey,
) -> Result<(), LendingError> {
    if public_key.curve_type() != CurveType::ED25519 {
        return Err(LendingError::InvalidInput(
            "Only ed25519 public keys are supported".into(),
        ));
    }
    let pk_bytes: [u8; 32] = public_key.as_bytes()[1..]
        .try_into()
        .map_err(|_| LendingError::InvalidInput("Malformed public key".into()))?;
    let sig_bytes: [u8; 64] = signature
        .try_into()
        .map_err(|_| LendingError::SignatureInvalid("Signature must be 64 bytes".into()))?;

    let message = signing_message(offer, env::current_account_id().as_str());
    let message_hash = env::sha256_array(&message);
    if !env::ed25519_verify(&sig_bytes, &message_hash, &pk_bytes) {
        return Err(LendingError::SignatureInvalid(
            "Offer signature does not match the lender's key".into(),
        ));
    }
    Ok(())
}

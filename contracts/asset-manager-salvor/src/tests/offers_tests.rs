use near_sdk::json_types::U128;
use near_sdk::testing_env;

use super::*;

#[test]
fn make_offer_locks_wallet_funds() {
    let mut contract = setup_contract();
    deposit_as(&mut contract, alice(), 1_000);

    testing_env!(context(alice()).build());
    contract
        .make_offer(nft(), "token-1".into(), U128(600), None)
        .unwrap();

    let wallet = contract.get_wallet(alice());
    assert_eq!(wallet.available, 1_000);
    assert_eq!(wallet.locked_in_offers, 600);
    assert_eq!(wallet.spendable(), 400);

    let offer = contract.get_offer(nft(), "token-1".into(), alice()).unwrap();
    assert_eq!(offer.amount, 600);
}

#[test]
fn offer_beyond_spendable_balance_is_rejected() {
    let mut contract = setup_contract();
    deposit_as(&mut contract, alice(), 500);

    testing_env!(context(alice()).build());
    contract
        .make_offer(nft(), "token-1".into(), U128(400), None)
        .unwrap();
    let err = contract
        .make_offer(nft(), "token-2".into(), U128(200), None)
        .unwrap_err();
    assert!(matches!(err, AssetManagerError::InsufficientBalance(_)));
}

#[test]
fn replacing_an_offer_releases_the_old_lock_first() {
    let mut contract = setup_contract();
    deposit_as(&mut contract, alice(), 1_000);

    testing_env!(context(alice()).build());
    contract
        .make_offer(nft(), "token-1".into(), U128(800), None)
        .unwrap();
    // 900 > spendable(200) only if the old 800 lock stayed; replacement
    // releases it, so this succeeds.
    contract
        .make_offer(nft(), "token-1".into(), U128(900), None)
        .unwrap();
    assert_eq!(contract.get_wallet(alice()).locked_in_offers, 900);
}

#[test]
fn cancel_offer_unlocks() {
    let mut contract = setup_contract();
    deposit_as(&mut contract, alice(), 1_000);

    testing_env!(context(alice()).build());
    contract
        .make_offer(nft(), "token-1".into(), U128(600), None)
        .unwrap();
    contract.cancel_offer(nft(), "token-1".into()).unwrap();

    assert_eq!(contract.get_wallet(alice()).locked_in_offers, 0);
    assert!(contract.get_offer(nft(), "token-1".into(), alice()).is_none());

    let err = contract.cancel_offer(nft(), "token-1".into()).unwrap_err();
    assert!(matches!(err, AssetManagerError::NotFound(_)));
}

#[test]
fn accepting_an_expired_offer_fails_with_expired() {
    let mut contract = setup_contract();
    deposit_as(&mut contract, alice(), 1_000);

    testing_env!(context_at(alice(), 100).build());
    contract
        .make_offer(nft(), "token-1".into(), U128(600), Some(200))
        .unwrap();

    testing_env!(context_at(bob(), 201).build());
    let err = contract
        .accept_offer(nft(), "token-1".into(), alice(), 0)
        .err().unwrap();
    // Distinct from InsufficientBalance: the buyer re-signs, not tops up.
    assert!(matches!(err, AssetManagerError::Expired(_)));
}

#[test]
fn accepting_an_offer_spends_the_locked_funds() {
    let mut contract = setup_contract();
    deposit_as(&mut contract, alice(), 1_000);

    testing_env!(context_at(alice(), 100).build());
    contract
        .make_offer(nft(), "token-1".into(), U128(600), Some(500))
        .unwrap();

    testing_env!(context_at(bob(), 200).build());
    contract
        .accept_offer(nft(), "token-1".into(), alice(), 7)
        .unwrap();

    let wallet = contract.get_wallet(alice());
    assert_eq!(wallet.available, 400);
    assert_eq!(wallet.locked_in_offers, 0);
    assert!(contract.get_offer(nft(), "token-1".into(), alice()).is_none());
}

#[test]
fn offers_for_token_are_paginated_by_prefix() {
    let mut contract = setup_contract();
    deposit_as(&mut contract, alice(), 1_000);
    deposit_as(&mut contract, bob(), 1_000);

    testing_env!(context(alice()).build());
    contract
        .make_offer(nft(), "token-1".into(), U128(100), None)
        .unwrap();
    testing_env!(context(bob()).build());
    contract
        .make_offer(nft(), "token-1".into(), U128(200), None)
        .unwrap();
    testing_env!(context(alice()).build());
    contract
        .make_offer(nft(), "token-10".into(), U128(300), None)
        .unwrap();

    // "token-1" must not match "token-10": the key uses a \0 terminator.
    let offers = contract.get_offers_for_token(nft(), "token-1".into(), None, None);
    assert_eq!(offers.len(), 2);
}

mod common;

use bigdecimal::{num_bigint::BigInt, BigDecimal, Zero};
use std::sync::Arc;

use balance_watch::blockchain::TransactionAnalyzer;
use balance_watch::models::ChainTag;
use common::*;

fn analyzer(chain: &Arc<MockChain>) -> TransactionAnalyzer<MockChain> {
    TransactionAnalyzer::new(Arc::clone(chain))
}

#[tokio::test]
async fn test_native_transfer_reconstructs_both_sides() {
    let chain = Arc::new(MockChain::new());
    let tx = transaction("0xnative", ALICE, Some(BOB), wei("1"));
    chain.add_receipt(receipt("0xnative", vec![]));
    chain.set_native_balance(ALICE, "9.0");
    chain.set_native_balance(BOB, "3.5");

    let events = analyzer(&chain).analyze(&tx).await;

    assert_eq!(events.len(), 2);
    let (sender, receiver) = (&events[0], &events[1]);

    assert_eq!(sender.account_address, ALICE);
    assert_eq!(sender.current_native_balance, dec("9.0"));
    assert_eq!(sender.transaction_cost, dec("0.001"));
    assert_eq!(sender.previous_native_balance, dec("10.001"));
    assert_eq!(
        &sender.previous_native_balance - &sender.current_native_balance,
        &sender.transaction_cost + dec("1")
    );

    assert_eq!(receiver.account_address, BOB);
    assert_eq!(receiver.current_native_balance, dec("3.5"));
    assert_eq!(receiver.previous_native_balance, dec("2.5"));
    assert_eq!(receiver.transaction_cost, BigDecimal::zero());

    for event in &events {
        assert_eq!(event.currency_string, "ETH");
        assert_eq!(event.account_address_blockchain, ChainTag::Ethereum);
        assert_eq!(event.sequence_number, 100);
        assert_eq!(event.change_signature, "0xnative");
        assert_eq!(event.block_hash, "0xblock100");
        assert!(event.token_changes.is_empty());
    }
}

#[tokio::test]
async fn test_native_receiver_previous_balance_is_clamped_at_zero() {
    let chain = Arc::new(MockChain::new());
    let tx = transaction("0xclamp", ALICE, Some(BOB), wei("1"));
    chain.add_receipt(receipt("0xclamp", vec![]));
    chain.set_native_balance(ALICE, "5");
    chain.set_native_balance(BOB, "0.4");

    let events = analyzer(&chain).analyze(&tx).await;

    assert_eq!(events[1].current_native_balance, dec("0.4"));
    assert_eq!(events[1].previous_native_balance, BigDecimal::zero());
}

#[tokio::test]
async fn test_native_transfer_ignores_token_logs() {
    let chain = Arc::new(MockChain::new());
    chain.add_token(USDC, MockToken::new("USDC", 6).with_balance(BOB, 500_000_000));
    let tx = transaction("0xmixed", ALICE, Some(BOB), wei("1"));
    chain.add_receipt(receipt(
        "0xmixed",
        vec![transfer_log(USDC, ALICE, BOB, 100_000_000, 0)],
    ));

    let events = analyzer(&chain).analyze(&tx).await;

    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|event| event.token_changes.is_empty()));
}

#[tokio::test]
async fn test_contract_creation_credits_created_contract() {
    let chain = Arc::new(MockChain::new());
    let tx = transaction("0xdeploy", ALICE, None, wei("2"));
    let mut deploy_receipt = receipt("0xdeploy", vec![]);
    deploy_receipt.contract_address = Some(CAROL.to_string());
    chain.add_receipt(deploy_receipt);
    chain.set_native_balance(ALICE, "1");
    chain.set_native_balance(CAROL, "2");

    let events = analyzer(&chain).analyze(&tx).await;

    assert_eq!(events.len(), 2);
    assert_eq!(events[1].account_address, CAROL);
    assert_eq!(events[1].previous_native_balance, BigDecimal::zero());
}

#[tokio::test]
async fn test_token_transfer_from_transaction_sender() {
    let chain = Arc::new(MockChain::new());
    chain.add_token(
        USDC,
        MockToken::new("USDC", 6)
            .with_balance(ALICE, 20_000_000)
            .with_balance(BOB, 500_000_000),
    );
    chain.set_native_balance(ALICE, "1.5");
    chain.set_native_balance(BOB, "4");

    let tx = transaction("0xtoken", ALICE, Some(USDC), BigInt::zero());
    chain.add_receipt(receipt(
        "0xtoken",
        vec![transfer_log(USDC, ALICE, BOB, 100_000_000, 0)],
    ));

    let events = analyzer(&chain).analyze(&tx).await;

    assert_eq!(events.len(), 2);

    let sender = &events[0];
    assert_eq!(sender.account_address, ALICE);
    assert_eq!(sender.transaction_cost, dec("0.001"));
    assert_eq!(sender.previous_native_balance, dec("1.501"));
    assert_eq!(sender.token_changes.len(), 1);
    assert_eq!(sender.token_changes[0].symbol, "USDC");
    assert_eq!(sender.token_changes[0].mint, "");
    assert_eq!(sender.token_changes[0].pre_amount, dec("120"));
    assert_eq!(sender.token_changes[0].post_amount, dec("20"));

    let receiver = &events[1];
    assert_eq!(receiver.account_address, BOB);
    assert_eq!(receiver.transaction_cost, BigDecimal::zero());
    assert_eq!(receiver.current_native_balance, dec("4"));
    assert_eq!(receiver.previous_native_balance, dec("4"));
    assert_eq!(receiver.token_changes.len(), 1);
    assert_eq!(receiver.token_changes[0].pre_amount, dec("400"));
    assert_eq!(receiver.token_changes[0].post_amount, dec("500"));
}

#[tokio::test]
async fn test_token_receiver_pre_amount_is_clamped() {
    let chain = Arc::new(MockChain::new());
    chain.add_token(USDC, MockToken::new("USDC", 6).with_balance(BOB, 30_000_000));
    let tx = transaction("0xclamped", ALICE, Some(USDC), BigInt::zero());
    chain.add_receipt(receipt(
        "0xclamped",
        vec![transfer_log(USDC, ALICE, BOB, 100_000_000, 0)],
    ));

    let events = analyzer(&chain).analyze(&tx).await;

    let change = &events[1].token_changes[0];
    assert_eq!(change.pre_amount, BigDecimal::zero());
    assert!(change.post_amount <= dec("100"));
}

#[tokio::test]
async fn test_zero_value_without_transfer_logs_yields_single_sender_event() {
    let chain = Arc::new(MockChain::new());
    chain.set_native_balance(ALICE, "2");
    let tx = transaction("0xcall", ALICE, Some(ROUTER), BigInt::zero());

    // An Approval log shares the topic layout but not the signature
    let mut approval = transfer_log(USDC, ALICE, ROUTER, 1, 0);
    approval.topics[0] = "0x8c5be1e5ebec7d5bd14f71427d1e84f3dd0314c0f7b2291e5b200ac8c7c3b925".to_string();
    chain.add_receipt(receipt("0xcall", vec![approval]));

    let events = analyzer(&chain).analyze(&tx).await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].account_address, ALICE);
    assert_eq!(events[0].previous_native_balance, dec("2.001"));
    assert!(events[0].token_changes.is_empty());
}

#[tokio::test]
async fn test_probe_failure_keeps_sender_event_and_drops_remaining_logs() {
    let chain = Arc::new(MockChain::new());
    chain.add_token(USDC, MockToken::new("USDC", 6).with_balance(BOB, 500_000_000));
    let tx = transaction("0xprobe", ALICE, Some(ROUTER), BigInt::zero());
    chain.add_receipt(receipt(
        "0xprobe",
        vec![
            transfer_log(NOT_A_TOKEN, ALICE, BOB, 1, 0),
            transfer_log(USDC, ALICE, BOB, 100_000_000, 1),
        ],
    ));

    let events = analyzer(&chain).analyze(&tx).await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].account_address, ALICE);
    assert!(events[0].token_changes.is_empty());
}

#[tokio::test]
async fn test_probe_failure_after_a_valid_log_keeps_completed_log() {
    let chain = Arc::new(MockChain::new());
    chain.add_token(USDC, MockToken::new("USDC", 6).with_balance(BOB, 500_000_000));
    let mut no_supply = MockToken::new("FAKE", 18);
    no_supply.total_supply = None;
    chain.add_token(DAI, no_supply);

    let tx = transaction("0xpartial", ALICE, Some(ROUTER), BigInt::zero());
    chain.add_receipt(receipt(
        "0xpartial",
        vec![
            transfer_log(USDC, ALICE, BOB, 100_000_000, 0),
            transfer_log(DAI, ALICE, CAROL, 5, 1),
            transfer_log(USDC, ALICE, CAROL, 1_000_000, 2),
        ],
    ));

    let events = analyzer(&chain).analyze(&tx).await;

    let accounts: Vec<&str> = events.iter().map(|event| event.account_address.as_str()).collect();
    assert_eq!(accounts, vec![ALICE, BOB]);
    assert_eq!(events[0].token_changes.len(), 1);
    assert_eq!(events[1].token_changes.len(), 1);
}

#[tokio::test]
async fn test_router_transfers_create_and_reuse_events() {
    let chain = Arc::new(MockChain::new());
    chain.add_token(
        USDC,
        MockToken::new("USDC", 6)
            .with_balance(ALICE, 0)
            .with_balance(ROUTER, 100_000_000),
    );
    chain.add_token(
        DAI,
        MockToken::new("DAI", 2)
            .with_balance(ROUTER, 1_000)
            .with_balance(BOB, 9_900),
    );
    chain.set_native_balance(ROUTER, "0.25");

    let tx = transaction("0xswap", ALICE, Some(ROUTER), BigInt::zero());
    chain.add_receipt(receipt(
        "0xswap",
        vec![
            transfer_log(USDC, ALICE, ROUTER, 100_000_000, 0),
            transfer_log(DAI, ROUTER, BOB, 9_900, 1),
        ],
    ));

    let events = analyzer(&chain).analyze(&tx).await;

    let accounts: Vec<&str> = events.iter().map(|event| event.account_address.as_str()).collect();
    assert_eq!(accounts, vec![ALICE, ROUTER, BOB]);

    let router = &events[1];
    assert_eq!(router.transaction_cost, BigDecimal::zero());
    assert_eq!(router.previous_native_balance, dec("0.25"));
    let router_changes: Vec<(&str, BigDecimal, BigDecimal)> = router
        .token_changes
        .iter()
        .map(|change| (change.symbol.as_str(), change.pre_amount.clone(), change.post_amount.clone()))
        .collect();
    assert_eq!(
        router_changes,
        vec![("USDC", dec("0"), dec("100")), ("DAI", dec("109"), dec("10"))]
    );

    let bob = &events[2];
    assert_eq!(bob.token_changes.len(), 1);
    assert_eq!(bob.token_changes[0].pre_amount, dec("0"));
    assert_eq!(bob.token_changes[0].post_amount, dec("99"));
}

#[tokio::test]
async fn test_third_party_sender_gets_its_own_event() {
    let chain = Arc::new(MockChain::new());
    chain.add_token(
        USDC,
        MockToken::new("USDC", 6)
            .with_balance(CAROL, 5_000_000)
            .with_balance(BOB, 7_000_000),
    );
    chain.set_native_balance(CAROL, "8");

    let tx = transaction("0xrelay", ALICE, Some(ROUTER), BigInt::zero());
    chain.add_receipt(receipt(
        "0xrelay",
        vec![transfer_log(USDC, CAROL, BOB, 2_000_000, 0)],
    ));

    let events = analyzer(&chain).analyze(&tx).await;

    let accounts: Vec<&str> = events.iter().map(|event| event.account_address.as_str()).collect();
    assert_eq!(accounts, vec![ALICE, CAROL, BOB]);
    assert!(events[0].token_changes.is_empty());

    let carol = &events[1];
    assert_eq!(carol.transaction_cost, BigDecimal::zero());
    assert_eq!(carol.current_native_balance, dec("8"));
    assert_eq!(carol.previous_native_balance, dec("8"));
    assert_eq!(
        &carol.token_changes[0].pre_amount - &carol.token_changes[0].post_amount,
        dec("2")
    );
}

#[tokio::test]
async fn test_missing_receipt_yields_no_events() {
    let chain = Arc::new(MockChain::new());
    let tx = transaction("0xpending", ALICE, Some(BOB), wei("1"));

    let events = analyzer(&chain).analyze(&tx).await;

    assert!(events.is_empty());
    assert_eq!(chain.call_count(), 1);
}

#[tokio::test]
async fn test_effective_gas_price_used_when_transaction_has_none() {
    let chain = Arc::new(MockChain::new());
    let mut tx = transaction("0x1559", ALICE, Some(BOB), BigInt::zero());
    tx.gas_price = None;
    let mut typed_receipt = receipt("0x1559", vec![]);
    typed_receipt.effective_gas_price = Some(BigInt::from(40_000_000_000u64));
    chain.add_receipt(typed_receipt);

    let events = analyzer(&chain).analyze(&tx).await;

    assert_eq!(events[0].transaction_cost, dec("0.002"));
}

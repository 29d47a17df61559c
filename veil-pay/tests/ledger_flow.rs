//! Payment ledger integration tests: the full 402 exchange, replay and
//! expiry protection, underpayment boundaries, capacity eviction.

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use veil_core::{
    AgentId, CapabilityEconomics, CapabilityId, MethodKind, PaymentNetwork, PaymentProof,
    PaymentRequirement, SequenceTokenSource, SettlementStatus, TokenSource, VerifyFailure,
};
use veil_pay::{
    MemoryLedgerStore, MemoryStoreConfig, PaymentLedger, PaymentLedgerConfig,
};

fn economics(cost: i64) -> CapabilityEconomics {
    CapabilityEconomics::new(Decimal::new(cost, 0), "USDC")
}

fn ledger_with(
    store_config: MemoryStoreConfig,
    ledger_config: PaymentLedgerConfig,
) -> PaymentLedger<MemoryLedgerStore> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    PaymentLedger::new(
        Arc::new(MemoryLedgerStore::with_config(store_config)),
        Arc::new(SequenceTokenSource::new("test")),
        ledger_config,
    )
}

fn default_ledger() -> PaymentLedger<MemoryLedgerStore> {
    ledger_with(MemoryStoreConfig::default(), PaymentLedgerConfig::default())
}

fn proof_for(requirement: &PaymentRequirement, amount: Decimal) -> PaymentProof {
    PaymentProof {
        payment_id: requirement.payment_id.clone(),
        method: MethodKind::Credits,
        transaction_hash: None,
        payer_address: "agent-wallet".to_string(),
        amount,
        currency: requirement.currency.clone(),
        network: PaymentNetwork::Internal,
        nonce: requirement.nonce.clone(),
        timestamp: Utc::now(),
    }
}

async fn issue(ledger: &PaymentLedger<MemoryLedgerStore>, cost: i64) -> PaymentRequirement {
    ledger
        .generate_requirement(
            CapabilityId::new("cap:quote"),
            "quote",
            "confidential quote",
            &economics(cost),
        )
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn full_exchange_verifies_and_records() {
    let ledger = default_ledger();
    let requirement = issue(&ledger, 100).await;

    let verification = ledger
        .verify_proof(&proof_for(&requirement, requirement.amount))
        .await
        .unwrap();
    let verified = verification.accepted().expect("proof should be accepted").clone();
    assert_eq!(verified.settlement, SettlementStatus::Verified);

    let record = ledger
        .record_payment(AgentId::new("agent:1"), &verified)
        .await
        .unwrap();
    assert_eq!(record.status, SettlementStatus::Verified);

    let revenue = ledger.revenue().await;
    assert_eq!(revenue.payment_count, 1);
    assert_eq!(revenue.by_currency["USDC"], Decimal::new(100, 0));
    assert_eq!(
        revenue.by_agent[&AgentId::new("agent:1")],
        Decimal::new(100, 0)
    );
}

#[tokio::test]
async fn second_verification_is_replayed_or_not_found() {
    let ledger = default_ledger();
    let requirement = issue(&ledger, 100).await;
    let proof = proof_for(&requirement, requirement.amount);

    assert!(ledger.verify_proof(&proof).await.unwrap().is_accepted());

    let second = ledger.verify_proof(&proof).await.unwrap();
    match second.failure() {
        Some(VerifyFailure::Replayed) | Some(VerifyFailure::NotFound) => {}
        other => panic!("expected replayed/not_found, got {:?}", other),
    }
}

#[tokio::test]
async fn concurrent_verifications_yield_one_success() {
    let ledger = Arc::new(default_ledger());
    let requirement = issue(&ledger, 100).await;
    let proof = proof_for(&requirement, requirement.amount);

    let (a, b) = tokio::join!(ledger.verify_proof(&proof), ledger.verify_proof(&proof));
    let accepted = [a.unwrap(), b.unwrap()]
        .iter()
        .filter(|v| v.is_accepted())
        .count();
    assert_eq!(accepted, 1);
}

#[tokio::test]
async fn expired_requirement_rejects_and_evicts() {
    let ledger = ledger_with(
        MemoryStoreConfig::default(),
        PaymentLedgerConfig::default().with_requirement_ttl(0),
    );
    let requirement = issue(&ledger, 100).await;

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    let proof = proof_for(&requirement, requirement.amount);
    let first = ledger.verify_proof(&proof).await.unwrap();
    assert_eq!(first.failure(), Some(&VerifyFailure::Expired));

    // The requirement was evicted on expiry; retry sees no requirement
    let second = ledger.verify_proof(&proof).await.unwrap();
    assert_eq!(second.failure(), Some(&VerifyFailure::NotFound));
}

#[tokio::test]
async fn nonce_mismatch_is_rejected_and_requirement_survives() {
    let ledger = default_ledger();
    let requirement = issue(&ledger, 100).await;

    let mut tampered = proof_for(&requirement, requirement.amount);
    tampered.nonce = veil_core::Nonce::new("forged");
    let verification = ledger.verify_proof(&tampered).await.unwrap();
    assert_eq!(verification.failure(), Some(&VerifyFailure::NonceMismatch));

    // The honest proof still succeeds afterwards
    let honest = ledger
        .verify_proof(&proof_for(&requirement, requirement.amount))
        .await
        .unwrap();
    assert!(honest.is_accepted());
}

#[tokio::test]
async fn underpayment_boundary_is_inclusive() {
    let ledger = default_ledger();

    // 1% below exactly: accepted
    let requirement = issue(&ledger, 100).await;
    let boundary = requirement.amount * Decimal::new(99, 2);
    let at_boundary = ledger
        .verify_proof(&proof_for(&requirement, boundary))
        .await
        .unwrap();
    assert!(at_boundary.is_accepted());

    // Below the boundary: rejected with amounts in the reason
    let requirement = issue(&ledger, 100).await;
    let below = requirement.amount * Decimal::new(98, 2);
    let under = ledger
        .verify_proof(&proof_for(&requirement, below))
        .await
        .unwrap();
    match under.failure() {
        Some(VerifyFailure::Underpaid { paid, required }) => {
            assert_eq!(*paid, below);
            assert_eq!(*required, requirement.amount * Decimal::new(99, 2));
        }
        other => panic!("expected underpaid, got {:?}", other),
    }
}

#[tokio::test]
async fn settlement_classification_follows_reference_shape() {
    let ledger = default_ledger();

    // Well-formed Base hash: verified inline
    let requirement = issue(&ledger, 100).await;
    let mut proof = proof_for(&requirement, requirement.amount);
    proof.method = MethodKind::Token;
    proof.network = PaymentNetwork::Base;
    proof.transaction_hash = Some(format!("0x{}", "ab".repeat(32)));
    let verified = ledger.verify_proof(&proof).await.unwrap();
    assert_eq!(
        verified.accepted().map(|v| v.settlement),
        Some(SettlementStatus::Verified)
    );

    // Malformed reference: deferred to async confirmation
    let requirement = issue(&ledger, 100).await;
    let mut proof = proof_for(&requirement, requirement.amount);
    proof.method = MethodKind::Token;
    proof.network = PaymentNetwork::Base;
    proof.transaction_hash = Some("0xnot-a-hash".to_string());
    let pending = ledger.verify_proof(&proof).await.unwrap();
    assert_eq!(
        pending.accepted().map(|v| v.settlement),
        Some(SettlementStatus::Pending)
    );

    // No reference at all: simulated
    let requirement = issue(&ledger, 100).await;
    let mut proof = proof_for(&requirement, requirement.amount);
    proof.method = MethodKind::Token;
    proof.network = PaymentNetwork::Base;
    proof.transaction_hash = None;
    let simulated = ledger.verify_proof(&proof).await.unwrap();
    assert_eq!(
        simulated.accepted().map(|v| v.settlement),
        Some(SettlementStatus::Simulated)
    );
}

#[tokio::test]
async fn requirement_table_evicts_single_oldest_at_capacity() {
    let capacity = 5;
    let ledger = ledger_with(
        MemoryStoreConfig::default().with_max_requirements(capacity),
        PaymentLedgerConfig::default(),
    );

    let mut issued = Vec::new();
    for _ in 0..capacity + 1 {
        issued.push(issue(&ledger, 100).await);
    }

    let stats = ledger.stats().await.unwrap();
    assert_eq!(stats.outstanding_requirements, capacity);

    // Only the single oldest was evicted
    let oldest = ledger
        .verify_proof(&proof_for(&issued[0], issued[0].amount))
        .await
        .unwrap();
    assert_eq!(oldest.failure(), Some(&VerifyFailure::NotFound));

    for requirement in &issued[1..] {
        let verification = ledger
            .verify_proof(&proof_for(requirement, requirement.amount))
            .await
            .unwrap();
        assert!(verification.is_accepted());
    }
}

#[tokio::test]
async fn sweep_purges_expired_requirements() {
    let ledger = ledger_with(
        MemoryStoreConfig::default(),
        PaymentLedgerConfig::default().with_requirement_ttl(0),
    );
    issue(&ledger, 100).await;
    issue(&ledger, 100).await;

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    let outcome = ledger.sweep().await.unwrap();
    assert_eq!(outcome.requirements_expired, 2);
    assert_eq!(ledger.stats().await.unwrap().outstanding_requirements, 0);
}

#[tokio::test]
async fn nonces_are_never_reused_across_requirements() {
    let tokens = SequenceTokenSource::new("uniq");
    let mut seen = std::collections::HashSet::new();
    for _ in 0..100 {
        assert!(seen.insert(tokens.nonce()));
    }
}

#[tokio::test]
async fn default_capacities_match_contract() {
    let config = MemoryStoreConfig::default();
    assert_eq!(config.max_requirements, 10_000);
    assert_eq!(config.max_records, 50_000);
    assert_eq!(config.max_nonces, 100_000);
}

//! Payment Ledger
//!
//! Admission control for gated capabilities: decides whether an invocation
//! must pay, issues time-bounded single-use requirements, verifies submitted
//! proofs against replay, tampering, and under-payment, and keeps durable
//! records with revenue attribution.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::PayResult;
use crate::revenue::{RevenueBook, RevenueSnapshot};
use crate::store::{LedgerStore, StoreStats, SweepOutcome};
use veil_core::{
    AgentId, CapabilityEconomics, CapabilityId, MethodKind, PaymentMethod, PaymentNetwork,
    PaymentProof, PaymentRecord, PaymentRequirement, SettlementStatus, TokenSource, TrustLevel,
    Verification, VerifiedPayment, VerifyFailure,
};

/// Payment ledger configuration
#[derive(Clone, Debug)]
pub struct PaymentLedgerConfig {
    /// Requirement validity window in seconds
    pub requirement_ttl_secs: i64,
    /// Record retention window in seconds
    pub record_retention_secs: i64,
    /// Fraction of the required amount a proof must cover.
    /// 1% headroom absorbs currency-conversion rounding.
    pub underpayment_tolerance: Decimal,
    /// Treasury address on Base
    pub base_recipient: String,
    /// Treasury address on Solana
    pub solana_recipient: String,
    /// Internal credits account
    pub credits_account: String,
}

impl PaymentLedgerConfig {
    /// Override the requirement validity window
    pub fn with_requirement_ttl(mut self, secs: i64) -> Self {
        self.requirement_ttl_secs = secs;
        self
    }

    /// Override the record retention window
    pub fn with_record_retention(mut self, secs: i64) -> Self {
        self.record_retention_secs = secs;
        self
    }
}

impl Default for PaymentLedgerConfig {
    fn default() -> Self {
        Self {
            requirement_ttl_secs: 300,              // 5 minutes
            record_retention_secs: 30 * 24 * 3600,  // 30 days
            underpayment_tolerance: Decimal::new(99, 2),
            base_recipient: "0x7ae3f2b1e6c09d54c1a8f0b35c9d41e20d6b8a11".to_string(),
            solana_recipient: "VeiLTrsy7kqPm4xWnB9cJd2hQf5tGvR8uYeZsAaN3mE".to_string(),
            credits_account: "treasury:credits".to_string(),
        }
    }
}

/// Payment admission control
pub struct PaymentLedger<S> {
    store: Arc<S>,
    tokens: Arc<dyn TokenSource>,
    revenue: RevenueBook,
    config: PaymentLedgerConfig,
}

impl<S: LedgerStore> PaymentLedger<S> {
    /// Create a ledger over a store and token source
    pub fn new(store: Arc<S>, tokens: Arc<dyn TokenSource>, config: PaymentLedgerConfig) -> Self {
        Self {
            store,
            tokens,
            revenue: RevenueBook::new(),
            config,
        }
    }

    /// Access the underlying store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Decide whether an invocation must pay before executing.
    ///
    /// Pure predicate, no state mutation. Payment is enforced only when
    /// signaling is on, the cost is positive, settlement is mandatory, and
    /// the caller holds neither a valid token nor an exempt trust tier.
    pub fn should_require_payment(
        &self,
        economics: &CapabilityEconomics,
        trust: TrustLevel,
        has_token: bool,
    ) -> bool {
        if !economics.signaling_enabled {
            return false;
        }
        if economics.cost <= Decimal::ZERO {
            return false;
        }
        if economics.settlement_optional {
            // Payment is offered, never enforced
            return false;
        }
        if has_token {
            return false;
        }
        if trust.is_payment_exempt() {
            return false;
        }
        true
    }

    /// Issue a payment requirement for one gated invocation attempt.
    ///
    /// Returns `None` when signaling is disabled or the cost is not
    /// positive; the capability is then not payable at all.
    pub async fn generate_requirement(
        &self,
        capability_id: CapabilityId,
        name: impl Into<String>,
        description: impl Into<String>,
        economics: &CapabilityEconomics,
    ) -> PayResult<Option<PaymentRequirement>> {
        if !economics.signaling_enabled || economics.cost <= Decimal::ZERO {
            return Ok(None);
        }

        let now = Utc::now();
        let payment_id = self.tokens.payment_id();
        let nonce = self.tokens.nonce();

        let mut recipients = HashMap::new();
        recipients.insert(PaymentNetwork::Base, self.config.base_recipient.clone());
        recipients.insert(PaymentNetwork::Solana, self.config.solana_recipient.clone());
        recipients.insert(PaymentNetwork::Internal, self.config.credits_account.clone());

        // Ranked by settlement preference; credits last as the zero-latency
        // fallback.
        let payment_methods = vec![
            PaymentMethod {
                kind: MethodKind::Token,
                network: PaymentNetwork::Base,
                recipient: self.config.base_recipient.clone(),
                amount: economics.cost,
                currency: economics.currency.clone(),
            },
            PaymentMethod {
                kind: MethodKind::Token,
                network: PaymentNetwork::Solana,
                recipient: self.config.solana_recipient.clone(),
                amount: economics.cost,
                currency: economics.currency.clone(),
            },
            PaymentMethod {
                kind: MethodKind::Native,
                network: PaymentNetwork::Solana,
                recipient: self.config.solana_recipient.clone(),
                amount: economics.cost,
                currency: "SOL".to_string(),
            },
            PaymentMethod {
                kind: MethodKind::Credits,
                network: PaymentNetwork::Internal,
                recipient: self.config.credits_account.clone(),
                amount: economics.cost,
                currency: economics.currency.clone(),
            },
        ];

        let requirement = PaymentRequirement {
            payment_id: payment_id.clone(),
            capability_id,
            name: name.into(),
            description: description.into(),
            amount: economics.cost,
            currency: economics.currency.clone(),
            accepted_currencies: vec![economics.currency.clone(), "SOL".to_string()],
            accepted_networks: vec![
                PaymentNetwork::Base,
                PaymentNetwork::Solana,
                PaymentNetwork::Internal,
            ],
            recipients,
            nonce,
            issued_at: now,
            expires_at: now + Duration::seconds(self.config.requirement_ttl_secs),
            payment_methods,
        };

        self.store.put_requirement(requirement.clone()).await?;
        debug!(
            payment_id = %payment_id,
            amount = %requirement.amount,
            currency = %requirement.currency,
            "issued payment requirement"
        );
        Ok(Some(requirement))
    }

    /// Verify a submitted proof against its outstanding requirement.
    ///
    /// Deterministic ordered checks, short-circuiting on the first failure.
    /// On success the nonce joins the replay set and the requirement is
    /// consumed, atomically: of two concurrent verifications of the same
    /// proof exactly one is accepted.
    pub async fn verify_proof(&self, proof: &PaymentProof) -> PayResult<Verification> {
        let requirement = match self.store.get_requirement(&proof.payment_id).await? {
            Some(requirement) => requirement,
            None => return Ok(Verification::Rejected(VerifyFailure::NotFound)),
        };

        let now = Utc::now();
        if requirement.is_expired(&now) {
            self.store.remove_requirement(&proof.payment_id).await?;
            warn!(payment_id = %proof.payment_id, "proof submitted after expiry");
            return Ok(Verification::Rejected(VerifyFailure::Expired));
        }

        if self.store.nonce_seen(&proof.nonce).await? {
            warn!(payment_id = %proof.payment_id, "replayed nonce");
            return Ok(Verification::Rejected(VerifyFailure::Replayed));
        }

        if proof.nonce != requirement.nonce {
            return Ok(Verification::Rejected(VerifyFailure::NonceMismatch));
        }

        let required = requirement.amount * self.config.underpayment_tolerance;
        if proof.amount < required {
            return Ok(Verification::Rejected(VerifyFailure::Underpaid {
                paid: proof.amount,
                required,
            }));
        }

        // Atomic claim; a lost race reads as a replay
        if !self
            .store
            .commit_verification(&proof.payment_id, &proof.nonce)
            .await?
        {
            return Ok(Verification::Rejected(VerifyFailure::Replayed));
        }

        let settlement = Self::classify_settlement(proof);
        info!(
            payment_id = %proof.payment_id,
            settlement = settlement.name(),
            amount = %proof.amount,
            "payment verified"
        );

        Ok(Verification::Accepted(VerifiedPayment {
            payment_id: proof.payment_id.clone(),
            capability_id: requirement.capability_id,
            amount: proof.amount,
            currency: proof.currency.clone(),
            method: proof.method,
            network: proof.network,
            transaction_hash: proof.transaction_hash.clone(),
            settlement,
            verified_at: now,
        }))
    }

    /// Persist a verified payment and accrue revenue
    pub async fn record_payment(
        &self,
        agent_id: AgentId,
        verified: &VerifiedPayment,
    ) -> PayResult<PaymentRecord> {
        let record = PaymentRecord {
            payment_id: verified.payment_id.clone(),
            capability_id: verified.capability_id.clone(),
            agent_id,
            amount: verified.amount,
            currency: verified.currency.clone(),
            method: verified.method,
            network: verified.network,
            transaction_hash: verified.transaction_hash.clone(),
            status: verified.settlement,
            created_at: verified.verified_at,
            verified_at: Some(verified.verified_at),
            settled_at: None,
        };

        self.store.put_record(record.clone()).await?;
        self.revenue.accrue(&record).await;
        Ok(record)
    }

    /// Fetch a payment record
    pub async fn get_record(&self, payment_id: &veil_core::PaymentId) -> PayResult<Option<PaymentRecord>> {
        self.store.get_record(payment_id).await
    }

    /// Drop expired requirements and records past retention
    pub async fn sweep(&self) -> PayResult<SweepOutcome> {
        let outcome = self
            .store
            .sweep(
                Utc::now(),
                Duration::seconds(self.config.record_retention_secs),
            )
            .await?;
        if outcome.requirements_expired > 0 || outcome.records_purged > 0 {
            debug!(
                requirements_expired = outcome.requirements_expired,
                records_purged = outcome.records_purged,
                "ledger sweep"
            );
        }
        Ok(outcome)
    }

    /// Snapshot revenue totals
    pub async fn revenue(&self) -> RevenueSnapshot {
        self.revenue.snapshot().await
    }

    /// Current store sizes
    pub async fn stats(&self) -> PayResult<StoreStats> {
        self.store.stats().await
    }

    /// Classify how a verified payment settles.
    ///
    /// Credits settle instantly; an on-chain reference of the expected shape
    /// verifies inline; a malformed reference defers to async confirmation;
    /// no reference at all is an offered-but-unsettled payment.
    fn classify_settlement(proof: &PaymentProof) -> SettlementStatus {
        if proof.method == MethodKind::Credits {
            return SettlementStatus::Verified;
        }
        match proof.transaction_hash.as_deref() {
            Some(reference) if proof.network.valid_transaction_ref(reference) => {
                SettlementStatus::Verified
            }
            Some(_) => SettlementStatus::Pending,
            None => SettlementStatus::Simulated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn economics(cost: i64) -> CapabilityEconomics {
        CapabilityEconomics::new(Decimal::new(cost, 0), "USDC")
    }

    fn ledger() -> PaymentLedger<crate::store::MemoryLedgerStore> {
        PaymentLedger::new(
            Arc::new(crate::store::MemoryLedgerStore::new()),
            Arc::new(veil_core::SequenceTokenSource::new("t")),
            PaymentLedgerConfig::default(),
        )
    }

    #[test]
    fn test_payment_required_for_standard_caller() {
        let ledger = ledger();
        assert!(ledger.should_require_payment(&economics(5), TrustLevel::Standard, false));
    }

    #[test]
    fn test_payment_not_required_when_signaling_disabled() {
        let ledger = ledger();
        let econ = economics(5).with_signaling_disabled();
        assert!(!ledger.should_require_payment(&econ, TrustLevel::Standard, false));
    }

    #[test]
    fn test_payment_not_required_for_zero_cost() {
        let ledger = ledger();
        assert!(!ledger.should_require_payment(&economics(0), TrustLevel::Unknown, false));
    }

    #[test]
    fn test_payment_not_required_when_settlement_optional() {
        let ledger = ledger();
        let econ = economics(5).with_settlement_optional();
        assert!(!ledger.should_require_payment(&econ, TrustLevel::Unknown, false));
    }

    #[test]
    fn test_payment_not_required_with_token_or_exempt_trust() {
        let ledger = ledger();
        assert!(!ledger.should_require_payment(&economics(5), TrustLevel::Standard, true));
        assert!(!ledger.should_require_payment(&economics(5), TrustLevel::Trusted, false));
        assert!(!ledger.should_require_payment(&economics(5), TrustLevel::Premium, false));
    }

    #[tokio::test]
    async fn test_generate_requirement_orders_methods_credits_last() {
        let ledger = ledger();
        let requirement = ledger
            .generate_requirement(CapabilityId::new("cap:1"), "cap", "", &economics(5))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(requirement.payment_methods.len(), 4);
        assert_eq!(
            requirement.payment_methods.last().map(|m| m.kind),
            Some(MethodKind::Credits)
        );
        assert!(requirement.expires_at > requirement.issued_at);
    }

    #[tokio::test]
    async fn test_generate_requirement_none_when_unpayable() {
        let ledger = ledger();
        let disabled = economics(5).with_signaling_disabled();
        assert!(ledger
            .generate_requirement(CapabilityId::new("cap:1"), "cap", "", &disabled)
            .await
            .unwrap()
            .is_none());
        assert!(ledger
            .generate_requirement(CapabilityId::new("cap:1"), "cap", "", &economics(0))
            .await
            .unwrap()
            .is_none());
    }
}

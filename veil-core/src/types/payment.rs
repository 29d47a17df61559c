//! Payment Protocol Entities
//!
//! The 402 exchange: a gated invocation without proof receives a
//! [`PaymentRequirement`]; the caller answers with a [`PaymentProof`]; a
//! verified proof becomes a durable [`PaymentRecord`].

use super::common::{AgentId, CapabilityId, Nonce, PaymentId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================
// Capability Economics and Trust
// ============================================================

/// Economic metadata a capability declares
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CapabilityEconomics {
    /// Whether 402 payment signaling is enabled for this capability
    pub signaling_enabled: bool,
    /// Declared cost per invocation
    pub cost: Decimal,
    /// Cost currency
    pub currency: String,
    /// Payment is offered but never enforced when set
    pub settlement_optional: bool,
}

impl CapabilityEconomics {
    /// Create economics with signaling enabled and settlement required
    pub fn new(cost: Decimal, currency: impl Into<String>) -> Self {
        Self {
            signaling_enabled: true,
            cost,
            currency: currency.into(),
            settlement_optional: false,
        }
    }

    /// Disable payment signaling
    pub fn with_signaling_disabled(mut self) -> Self {
        self.signaling_enabled = false;
        self
    }

    /// Mark settlement as optional
    pub fn with_settlement_optional(mut self) -> Self {
        self.settlement_optional = true;
        self
    }
}

/// Caller trust tier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustLevel {
    /// No established relationship
    Unknown,
    /// Registered but unprivileged
    Standard,
    /// Payment-exempt
    Trusted,
    /// Payment-exempt
    Premium,
}

impl TrustLevel {
    /// Get trust level name
    pub fn name(&self) -> &'static str {
        match self {
            TrustLevel::Unknown => "unknown",
            TrustLevel::Standard => "standard",
            TrustLevel::Trusted => "trusted",
            TrustLevel::Premium => "premium",
        }
    }

    /// Trusted and premium callers bypass payment enforcement
    pub fn is_payment_exempt(&self) -> bool {
        matches!(self, TrustLevel::Trusted | TrustLevel::Premium)
    }
}

// ============================================================
// Networks and Methods
// ============================================================

/// Settlement network for one payment method
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentNetwork {
    /// Base (EVM) on-chain settlement
    Base,
    /// Solana on-chain settlement
    Solana,
    /// Internal credit balance, no chain involved
    Internal,
}

impl PaymentNetwork {
    /// Get network name
    pub fn name(&self) -> &'static str {
        match self {
            PaymentNetwork::Base => "base",
            PaymentNetwork::Solana => "solana",
            PaymentNetwork::Internal => "internal",
        }
    }

    /// Check a transaction reference against this network's expected shape.
    ///
    /// Base expects a 0x-prefixed 32-byte transaction hash, Solana a base58
    /// signature, Internal any non-empty ledger reference.
    pub fn valid_transaction_ref(&self, reference: &str) -> bool {
        match self {
            PaymentNetwork::Base => {
                reference.len() == 66
                    && reference.starts_with("0x")
                    && reference[2..].chars().all(|c| c.is_ascii_hexdigit())
            }
            PaymentNetwork::Solana => {
                (43..=88).contains(&reference.len())
                    && reference.chars().all(|c| {
                        c.is_ascii_alphanumeric() && !matches!(c, '0' | 'O' | 'I' | 'l')
                    })
            }
            PaymentNetwork::Internal => !reference.is_empty(),
        }
    }
}

/// How a payment moves value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    /// On-chain token transfer (stablecoin)
    Token,
    /// On-chain native coin transfer
    Native,
    /// Internal credit balance debit
    Credits,
}

impl MethodKind {
    /// Get method name
    pub fn name(&self) -> &'static str {
        match self {
            MethodKind::Token => "token",
            MethodKind::Native => "native",
            MethodKind::Credits => "credits",
        }
    }
}

/// One way to satisfy a requirement
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethod {
    /// Method kind
    pub kind: MethodKind,
    /// Settlement network
    pub network: PaymentNetwork,
    /// Recipient address or account on that network
    pub recipient: String,
    /// Amount due through this method
    pub amount: Decimal,
    /// Currency of the amount
    pub currency: String,
}

// ============================================================
// Requirement / Proof / Record
// ============================================================

/// One time-bounded, single-use payment challenge
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequirement {
    /// Payment ID, unique per gated invocation attempt
    pub payment_id: PaymentId,
    /// Gated capability
    pub capability_id: CapabilityId,
    /// Human-readable capability name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Amount due
    pub amount: Decimal,
    /// Primary currency
    pub currency: String,
    /// Currencies accepted in proofs
    pub accepted_currencies: Vec<String>,
    /// Networks accepted in proofs
    pub accepted_networks: Vec<PaymentNetwork>,
    /// Recipient per network
    pub recipients: HashMap<PaymentNetwork, String>,
    /// Single-use random nonce, never reused across requirements
    pub nonce: Nonce,
    /// Issuance time
    pub issued_at: DateTime<Utc>,
    /// Absolute expiry
    pub expires_at: DateTime<Utc>,
    /// Ranked payment methods, cheapest-latency last
    pub payment_methods: Vec<PaymentMethod>,
}

impl PaymentRequirement {
    /// Check expiry against a caller-supplied clock reading
    pub fn is_expired(&self, now: &DateTime<Utc>) -> bool {
        *now > self.expires_at
    }
}

/// Proof submitted by the caller to satisfy a requirement
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentProof {
    /// Requirement being satisfied
    pub payment_id: PaymentId,
    /// Method used
    pub method: MethodKind,
    /// Transaction reference, absent for offered-but-unsettled payments
    pub transaction_hash: Option<String>,
    /// Payer address or account
    pub payer_address: String,
    /// Amount paid
    pub amount: Decimal,
    /// Currency paid
    pub currency: String,
    /// Network used
    pub network: PaymentNetwork,
    /// Nonce echoed from the requirement
    pub nonce: Nonce,
    /// Caller-asserted payment time
    pub timestamp: DateTime<Utc>,
}

/// Settlement state of a payment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    /// Awaiting out-of-band on-chain confirmation
    Pending,
    /// Confirmed inline
    Verified,
    /// Finalized; the record is immutable from here
    Settled,
    /// Refunded after settlement dispute
    Refunded,
    /// Requirement lapsed before settlement
    Expired,
    /// Settlement optional and no transaction reference supplied
    Simulated,
}

impl SettlementStatus {
    /// Get status name
    pub fn name(&self) -> &'static str {
        match self {
            SettlementStatus::Pending => "pending",
            SettlementStatus::Verified => "verified",
            SettlementStatus::Settled => "settled",
            SettlementStatus::Refunded => "refunded",
            SettlementStatus::Expired => "expired",
            SettlementStatus::Simulated => "simulated",
        }
    }
}

/// Durable result of a verified payment
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Payment ID
    pub payment_id: PaymentId,
    /// Capability paid for
    pub capability_id: CapabilityId,
    /// Paying agent
    pub agent_id: AgentId,
    /// Amount paid
    pub amount: Decimal,
    /// Currency paid
    pub currency: String,
    /// Method used
    pub method: MethodKind,
    /// Network used
    pub network: PaymentNetwork,
    /// Transaction reference if any
    pub transaction_hash: Option<String>,
    /// Settlement state
    pub status: SettlementStatus,
    /// Record creation time
    pub created_at: DateTime<Utc>,
    /// Verification time
    pub verified_at: Option<DateTime<Utc>>,
    /// Settlement time
    pub settled_at: Option<DateTime<Utc>>,
}

impl PaymentRecord {
    /// Settled records are immutable
    pub fn is_immutable(&self) -> bool {
        self.status == SettlementStatus::Settled
    }
}

// ============================================================
// Verification Outcomes
// ============================================================

/// Typed reason a proof was rejected
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum VerifyFailure {
    /// No outstanding requirement for the payment id
    NotFound,
    /// Requirement lapsed; it has been evicted
    Expired,
    /// Nonce was already consumed
    Replayed,
    /// Nonce does not match the requirement's nonce
    NonceMismatch,
    /// Paid amount below the tolerated minimum
    Underpaid { paid: Decimal, required: Decimal },
}

impl VerifyFailure {
    /// Stable failure code for wire rendering
    pub fn code(&self) -> &'static str {
        match self {
            VerifyFailure::NotFound => "not_found",
            VerifyFailure::Expired => "expired",
            VerifyFailure::Replayed => "replayed",
            VerifyFailure::NonceMismatch => "nonce_mismatch",
            VerifyFailure::Underpaid { .. } => "underpaid",
        }
    }

    /// What the caller should do next; rendered into the 402 retry message
    pub fn retry_hint(&self) -> &'static str {
        match self {
            VerifyFailure::NotFound | VerifyFailure::Expired => {
                "request a fresh payment requirement and retry"
            }
            VerifyFailure::Replayed | VerifyFailure::NonceMismatch => {
                "a nonce is single-use; request a fresh requirement"
            }
            VerifyFailure::Underpaid { .. } => {
                "resubmit covering the full required amount on a fresh requirement"
            }
        }
    }
}

impl std::fmt::Display for VerifyFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerifyFailure::Underpaid { paid, required } => {
                write!(f, "underpaid: {} < {}", paid, required)
            }
            other => write!(f, "{}", other.code()),
        }
    }
}

/// Successfully verified payment, input to record keeping
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerifiedPayment {
    /// Payment ID
    pub payment_id: PaymentId,
    /// Capability paid for
    pub capability_id: CapabilityId,
    /// Amount paid
    pub amount: Decimal,
    /// Currency paid
    pub currency: String,
    /// Method used
    pub method: MethodKind,
    /// Network used
    pub network: PaymentNetwork,
    /// Transaction reference if any
    pub transaction_hash: Option<String>,
    /// Classified settlement state
    pub settlement: SettlementStatus,
    /// Verification time
    pub verified_at: DateTime<Utc>,
}

/// Outcome of one proof verification
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verification {
    /// Proof accepted; requirement consumed
    Accepted(VerifiedPayment),
    /// Proof rejected with a typed, user-actionable reason
    Rejected(VerifyFailure),
}

impl Verification {
    /// Whether the proof was accepted
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verification::Accepted(_))
    }

    /// Rejection reason if any
    pub fn failure(&self) -> Option<&VerifyFailure> {
        match self {
            Verification::Rejected(failure) => Some(failure),
            Verification::Accepted(_) => None,
        }
    }

    /// Verified payment if accepted
    pub fn accepted(&self) -> Option<&VerifiedPayment> {
        match self {
            Verification::Accepted(payment) => Some(payment),
            Verification::Rejected(_) => None,
        }
    }
}

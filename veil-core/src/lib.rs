//! Veil Core - Shared Vocabulary for Payment-Gated Confidential Execution
//!
//! Veil gates metered, privacy-sensitive capabilities behind an HTTP-402-style
//! payment protocol and executes admitted calls through a tiered pipeline of
//! confidential-compute stages. This crate holds the vocabulary the other
//! layers share:
//! - **Identifiers & digests**: string newtypes and a 32-byte BLAKE3 digest
//! - **Payment entities**: requirements, proofs, records, settlement states
//! - **Execution entities**: requests, results, operation kinds
//! - **Tier resolution**: the pure amount -> privacy-tier mapping
//! - **Token source**: injectable id/nonce generation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Router (external)                         │
//! │        (HTTP exchange, capability metadata, retries)         │
//! ├──────────────────────────────┬──────────────────────────────┤
//! │          veil-pay            │          veil-exec           │
//! │   (admission, requirements,  │   (stage chain, fee model,   │
//! │    proofs, revenue, sweeps)  │    books, auctions, signing) │
//! ├──────────────────────────────┴──────────────────────────────┤
//! │                   veil-core (this crate)                     │
//! │        (ids, entities, tiers, tokens, error registry)        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Core Types
//!
//! - [`PaymentRequirement`]: one time-bounded, single-use 402 challenge
//! - [`PaymentProof`]: the caller's answer to a requirement
//! - [`PaymentRecord`]: durable outcome of a verified payment
//! - [`ExecutionRequest`] / [`ExecutionResult`]: one admitted invocation
//! - [`Tier`] / [`TierThresholds`]: privacy level selection by amount
//! - [`TokenSource`]: injected id and nonce generation

pub mod error;
pub mod tier;
pub mod token;
pub mod types;

// Re-export error types
pub use error::{CoreError, CoreResult};

// Re-export tier resolution
pub use tier::{Tier, TierThresholds};

// Re-export token sources
pub use token::{SequenceTokenSource, SystemTokenSource, TokenSource};

// Re-export all types
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Protocol version carried in payment requirements
pub const PROTOCOL_VERSION: &str = "v1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert_eq!(PROTOCOL_VERSION, "v1");
    }

    #[test]
    fn test_payment_id_creation() {
        let id = PaymentId::new("pay:abc");
        assert_eq!(id.as_str(), "pay:abc");
    }

    #[test]
    fn test_digest_creation() {
        let digest = Digest::blake3(b"veil");
        assert!(!digest.is_zero());
    }
}

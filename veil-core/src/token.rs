//! Token Source
//!
//! Id and nonce generation behind a trait so the random source is injected,
//! not reached for globally. Tests supply deterministic sequences and assert
//! replay-protection behavior precisely.

use crate::types::{AuctionId, ExecutionId, Nonce, OrderId, OrderbookId, PaymentId};
use rand::RngCore;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Source of fresh identifiers and nonces
pub trait TokenSource: Send + Sync {
    /// Fresh payment id
    fn payment_id(&self) -> PaymentId;

    /// Fresh execution id
    fn execution_id(&self) -> ExecutionId;

    /// Fresh orderbook id
    fn orderbook_id(&self) -> OrderbookId;

    /// Fresh order id
    fn order_id(&self) -> OrderId;

    /// Fresh auction id
    fn auction_id(&self) -> AuctionId;

    /// Fresh single-use nonce
    fn nonce(&self) -> Nonce;
}

/// Production token source: UUIDv4 ids, 32 random bytes per nonce
#[derive(Debug, Default)]
pub struct SystemTokenSource;

impl SystemTokenSource {
    pub fn new() -> Self {
        Self
    }
}

impl TokenSource for SystemTokenSource {
    fn payment_id(&self) -> PaymentId {
        PaymentId::new(format!("pay:{}", Uuid::new_v4()))
    }

    fn execution_id(&self) -> ExecutionId {
        ExecutionId::new(format!("exec:{}", Uuid::new_v4()))
    }

    fn orderbook_id(&self) -> OrderbookId {
        OrderbookId::new(format!("book:{}", Uuid::new_v4()))
    }

    fn order_id(&self) -> OrderId {
        OrderId::new(format!("order:{}", Uuid::new_v4()))
    }

    fn auction_id(&self) -> AuctionId {
        AuctionId::new(format!("auction:{}", Uuid::new_v4()))
    }

    fn nonce(&self) -> Nonce {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Nonce::new(hex::encode(bytes))
    }
}

/// Deterministic token source for tests: monotone counter per instance
#[derive(Debug)]
pub struct SequenceTokenSource {
    prefix: String,
    counter: AtomicU64,
}

impl SequenceTokenSource {
    /// Create a sequence source with a distinguishing prefix
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }

    fn next(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::Relaxed)
    }
}

impl TokenSource for SequenceTokenSource {
    fn payment_id(&self) -> PaymentId {
        PaymentId::new(format!("pay:{}:{}", self.prefix, self.next()))
    }

    fn execution_id(&self) -> ExecutionId {
        ExecutionId::new(format!("exec:{}:{}", self.prefix, self.next()))
    }

    fn orderbook_id(&self) -> OrderbookId {
        OrderbookId::new(format!("book:{}:{}", self.prefix, self.next()))
    }

    fn order_id(&self) -> OrderId {
        OrderId::new(format!("order:{}:{}", self.prefix, self.next()))
    }

    fn auction_id(&self) -> AuctionId {
        AuctionId::new(format!("auction:{}:{}", self.prefix, self.next()))
    }

    fn nonce(&self) -> Nonce {
        Nonce::new(format!("nonce:{}:{}", self.prefix, self.next()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_nonces_are_unique() {
        let source = SystemTokenSource::new();
        let a = source.nonce();
        let b = source.nonce();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_sequence_source_is_deterministic() {
        let source = SequenceTokenSource::new("t");
        assert_eq!(source.payment_id().as_str(), "pay:t:0");
        assert_eq!(source.nonce().as_str(), "nonce:t:1");
        assert_eq!(source.nonce().as_str(), "nonce:t:2");
    }
}

//! Revenue Book
//!
//! Running revenue totals kept alongside the record table: by currency, by
//! capability, by agent. Totals only accumulate from verified payments.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use veil_core::{AgentId, CapabilityId, PaymentRecord, SettlementStatus};

/// Point-in-time revenue snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RevenueSnapshot {
    /// Totals keyed by currency
    pub by_currency: HashMap<String, Decimal>,
    /// Totals keyed by capability
    pub by_capability: HashMap<CapabilityId, Decimal>,
    /// Totals keyed by agent
    pub by_agent: HashMap<AgentId, Decimal>,
    /// Payments counted
    pub payment_count: u64,
}

#[derive(Debug, Default)]
struct RevenueTotals {
    by_currency: HashMap<String, Decimal>,
    by_capability: HashMap<CapabilityId, Decimal>,
    by_agent: HashMap<AgentId, Decimal>,
    payment_count: u64,
}

/// Concurrent revenue totals
#[derive(Debug, Default)]
pub struct RevenueBook {
    totals: RwLock<RevenueTotals>,
}

impl RevenueBook {
    /// Create an empty book
    pub fn new() -> Self {
        Self::default()
    }

    /// Accrue one verified payment. Simulated payments carry no revenue.
    pub async fn accrue(&self, record: &PaymentRecord) {
        if record.status == SettlementStatus::Simulated {
            return;
        }
        let mut totals = self.totals.write().await;
        *totals
            .by_currency
            .entry(record.currency.clone())
            .or_insert(Decimal::ZERO) += record.amount;
        *totals
            .by_capability
            .entry(record.capability_id.clone())
            .or_insert(Decimal::ZERO) += record.amount;
        *totals
            .by_agent
            .entry(record.agent_id.clone())
            .or_insert(Decimal::ZERO) += record.amount;
        totals.payment_count += 1;

        debug!(
            payment_id = %record.payment_id,
            capability_id = %record.capability_id,
            amount = %record.amount,
            currency = %record.currency,
            "accrued revenue"
        );
    }

    /// Snapshot the current totals
    pub async fn snapshot(&self) -> RevenueSnapshot {
        let totals = self.totals.read().await;
        RevenueSnapshot {
            by_currency: totals.by_currency.clone(),
            by_capability: totals.by_capability.clone(),
            by_agent: totals.by_agent.clone(),
            payment_count: totals.payment_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use veil_core::{MethodKind, PaymentId, PaymentNetwork};

    fn record(amount: i64, status: SettlementStatus) -> PaymentRecord {
        PaymentRecord {
            payment_id: PaymentId::new("pay:1"),
            capability_id: CapabilityId::new("cap:1"),
            agent_id: AgentId::new("agent:1"),
            amount: Decimal::new(amount, 0),
            currency: "USDC".to_string(),
            method: MethodKind::Token,
            network: PaymentNetwork::Base,
            transaction_hash: None,
            status,
            created_at: Utc::now(),
            verified_at: Some(Utc::now()),
            settled_at: None,
        }
    }

    #[tokio::test]
    async fn test_accrue_sums_three_dimensions() {
        let book = RevenueBook::new();
        book.accrue(&record(10, SettlementStatus::Verified)).await;
        book.accrue(&record(15, SettlementStatus::Verified)).await;

        let snapshot = book.snapshot().await;
        assert_eq!(snapshot.payment_count, 2);
        assert_eq!(snapshot.by_currency["USDC"], Decimal::new(25, 0));
        assert_eq!(
            snapshot.by_capability[&CapabilityId::new("cap:1")],
            Decimal::new(25, 0)
        );
        assert_eq!(
            snapshot.by_agent[&AgentId::new("agent:1")],
            Decimal::new(25, 0)
        );
    }

    #[tokio::test]
    async fn test_simulated_payments_carry_no_revenue() {
        let book = RevenueBook::new();
        book.accrue(&record(10, SettlementStatus::Simulated)).await;
        let snapshot = book.snapshot().await;
        assert_eq!(snapshot.payment_count, 0);
        assert!(snapshot.by_currency.is_empty());
    }
}

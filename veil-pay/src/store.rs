//! Ledger Storage
//!
//! Narrow async storage interface for the payment ledger plus the bounded
//! in-memory implementation. All tables are capacity-bounded; eviction is
//! oldest-first and silent. The core's correctness does not depend on a
//! durable backend.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::Hash;
use tokio::sync::RwLock;
use tracing::warn;

use crate::error::PayResult;
use veil_core::{Nonce, PaymentId, PaymentRecord, PaymentRequirement};

// ============================================================
// Bounded Containers
// ============================================================

/// Insertion-order bounded map.
///
/// Inserting past capacity silently drops the oldest live entry. Re-inserting
/// an existing key replaces the value without refreshing its age; the bound
/// is insertion-order, not recency.
#[derive(Debug)]
pub struct BoundedMap<K, V> {
    capacity: usize,
    entries: HashMap<K, V>,
    order: VecDeque<K>,
}

impl<K: Eq + Hash + Clone, V> BoundedMap<K, V> {
    /// Create with a fixed capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Insert, returning the evicted oldest entry if the bound was hit
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        if self.entries.insert(key.clone(), value).is_none() {
            self.order.push_back(key);
        }
        self.evict_to_capacity()
    }

    fn evict_to_capacity(&mut self) -> Option<(K, V)> {
        let mut evicted = None;
        while self.entries.len() > self.capacity {
            match self.order.pop_front() {
                // Keys whose entries were removed earlier are stale; skip them
                Some(oldest) => {
                    if let Some(value) = self.entries.remove(&oldest) {
                        evicted = Some((oldest, value));
                    }
                }
                None => break,
            }
        }
        evicted
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Drop entries failing the predicate, compacting the order queue
    pub fn retain<F: FnMut(&K, &V) -> bool>(&mut self, mut keep: F) -> usize {
        let before = self.entries.len();
        self.entries.retain(|k, v| keep(k, v));
        let entries = &self.entries;
        self.order.retain(|k| entries.contains_key(k));
        before - self.entries.len()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }
}

/// Bounded replay set.
///
/// Remembers consumed nonces in insertion order; when full, the oldest half
/// is dropped in one sweep.
#[derive(Debug)]
pub struct NonceSet {
    capacity: usize,
    seen: HashSet<Nonce>,
    order: VecDeque<Nonce>,
}

impl NonceSet {
    /// Create with a fixed capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            seen: HashSet::new(),
            order: VecDeque::new(),
        }
    }

    pub fn contains(&self, nonce: &Nonce) -> bool {
        self.seen.contains(nonce)
    }

    /// Record a consumed nonce, dropping the oldest half at capacity
    pub fn insert(&mut self, nonce: Nonce) {
        if self.seen.len() >= self.capacity {
            let drop_count = self.capacity / 2;
            for _ in 0..drop_count {
                if let Some(oldest) = self.order.pop_front() {
                    self.seen.remove(&oldest);
                }
            }
            warn!(dropped = drop_count, "replay set at capacity, dropped oldest half");
        }
        if self.seen.insert(nonce.clone()) {
            self.order.push_back(nonce);
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

// ============================================================
// Store Interface
// ============================================================

/// Counts from one sweep pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepOutcome {
    /// Requirements dropped for being past expiry
    pub requirements_expired: u64,
    /// Records dropped for being past the retention window
    pub records_purged: u64,
}

/// Table sizes for observability
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StoreStats {
    pub outstanding_requirements: usize,
    pub records: usize,
    pub consumed_nonces: usize,
}

/// Ledger storage interface.
///
/// Narrow by design so the in-memory implementation can later be swapped
/// for a distributed store without touching the ledger.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Insert an outstanding requirement, evicting the oldest at capacity
    async fn put_requirement(&self, requirement: PaymentRequirement) -> PayResult<()>;

    /// Fetch an outstanding requirement
    async fn get_requirement(&self, payment_id: &PaymentId)
        -> PayResult<Option<PaymentRequirement>>;

    /// Remove an outstanding requirement
    async fn remove_requirement(
        &self,
        payment_id: &PaymentId,
    ) -> PayResult<Option<PaymentRequirement>>;

    /// Whether a nonce was already consumed
    async fn nonce_seen(&self, nonce: &Nonce) -> PayResult<bool>;

    /// Atomically consume a nonce and delete its requirement.
    ///
    /// Returns true for exactly one of any set of concurrent callers with
    /// the same payment id/nonce; false when the requirement is already
    /// gone or the nonce already consumed.
    async fn commit_verification(&self, payment_id: &PaymentId, nonce: &Nonce)
        -> PayResult<bool>;

    /// Persist a payment record, evicting the oldest at capacity
    async fn put_record(&self, record: PaymentRecord) -> PayResult<()>;

    /// Fetch a payment record
    async fn get_record(&self, payment_id: &PaymentId) -> PayResult<Option<PaymentRecord>>;

    /// Drop expired requirements and records past the retention window
    async fn sweep(&self, now: DateTime<Utc>, retention: Duration) -> PayResult<SweepOutcome>;

    /// Current table sizes
    async fn stats(&self) -> PayResult<StoreStats>;
}

// ============================================================
// In-Memory Implementation
// ============================================================

/// Capacities for the in-memory store
#[derive(Debug, Clone, Copy)]
pub struct MemoryStoreConfig {
    /// Outstanding requirement cap
    pub max_requirements: usize,
    /// Historical record cap
    pub max_records: usize,
    /// Replay set cap
    pub max_nonces: usize,
}

impl MemoryStoreConfig {
    /// Default outstanding requirement cap
    pub const DEFAULT_MAX_REQUIREMENTS: usize = 10_000;
    /// Default historical record cap
    pub const DEFAULT_MAX_RECORDS: usize = 50_000;
    /// Default replay set cap
    pub const DEFAULT_MAX_NONCES: usize = 100_000;

    /// Override the requirement cap
    pub fn with_max_requirements(mut self, max: usize) -> Self {
        self.max_requirements = max;
        self
    }

    /// Override the record cap
    pub fn with_max_records(mut self, max: usize) -> Self {
        self.max_records = max;
        self
    }

    /// Override the replay set cap
    pub fn with_max_nonces(mut self, max: usize) -> Self {
        self.max_nonces = max;
        self
    }
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            max_requirements: Self::DEFAULT_MAX_REQUIREMENTS,
            max_records: Self::DEFAULT_MAX_RECORDS,
            max_nonces: Self::DEFAULT_MAX_NONCES,
        }
    }
}

#[derive(Debug)]
struct MemoryInner {
    requirements: BoundedMap<PaymentId, PaymentRequirement>,
    records: BoundedMap<PaymentId, PaymentRecord>,
    nonces: NonceSet,
}

/// Bounded in-memory ledger store.
///
/// One lock over all three tables keeps the existence check and the
/// nonce-consumption commit atomic with respect to each other.
#[derive(Debug)]
pub struct MemoryLedgerStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryLedgerStore {
    /// Create with default capacities
    pub fn new() -> Self {
        Self::with_config(MemoryStoreConfig::default())
    }

    /// Create with explicit capacities
    pub fn with_config(config: MemoryStoreConfig) -> Self {
        Self {
            inner: RwLock::new(MemoryInner {
                requirements: BoundedMap::new(config.max_requirements),
                records: BoundedMap::new(config.max_records),
                nonces: NonceSet::new(config.max_nonces),
            }),
        }
    }
}

impl Default for MemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn put_requirement(&self, requirement: PaymentRequirement) -> PayResult<()> {
        let mut inner = self.inner.write().await;
        let payment_id = requirement.payment_id.clone();
        if let Some((evicted, _)) = inner.requirements.insert(payment_id, requirement) {
            warn!(payment_id = %evicted, "requirement table at capacity, evicted oldest");
        }
        Ok(())
    }

    async fn get_requirement(
        &self,
        payment_id: &PaymentId,
    ) -> PayResult<Option<PaymentRequirement>> {
        let inner = self.inner.read().await;
        Ok(inner.requirements.get(payment_id).cloned())
    }

    async fn remove_requirement(
        &self,
        payment_id: &PaymentId,
    ) -> PayResult<Option<PaymentRequirement>> {
        let mut inner = self.inner.write().await;
        Ok(inner.requirements.remove(payment_id))
    }

    async fn nonce_seen(&self, nonce: &Nonce) -> PayResult<bool> {
        let inner = self.inner.read().await;
        Ok(inner.nonces.contains(nonce))
    }

    async fn commit_verification(
        &self,
        payment_id: &PaymentId,
        nonce: &Nonce,
    ) -> PayResult<bool> {
        let mut inner = self.inner.write().await;
        if inner.nonces.contains(nonce) || !inner.requirements.contains_key(payment_id) {
            return Ok(false);
        }
        inner.nonces.insert(nonce.clone());
        inner.requirements.remove(payment_id);
        Ok(true)
    }

    async fn put_record(&self, record: PaymentRecord) -> PayResult<()> {
        let mut inner = self.inner.write().await;
        let payment_id = record.payment_id.clone();
        if let Some((evicted, _)) = inner.records.insert(payment_id, record) {
            warn!(payment_id = %evicted, "record table at capacity, evicted oldest");
        }
        Ok(())
    }

    async fn get_record(&self, payment_id: &PaymentId) -> PayResult<Option<PaymentRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.records.get(payment_id).cloned())
    }

    async fn sweep(&self, now: DateTime<Utc>, retention: Duration) -> PayResult<SweepOutcome> {
        let mut inner = self.inner.write().await;
        let requirements_expired =
            inner.requirements.retain(|_, r| !r.is_expired(&now)) as u64;
        let cutoff = now - retention;
        let records_purged = inner.records.retain(|_, r| r.created_at >= cutoff) as u64;
        Ok(SweepOutcome {
            requirements_expired,
            records_purged,
        })
    }

    async fn stats(&self) -> PayResult<StoreStats> {
        let inner = self.inner.read().await;
        Ok(StoreStats {
            outstanding_requirements: inner.requirements.len(),
            records: inner.records.len(),
            consumed_nonces: inner.nonces.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_map_evicts_oldest() {
        let mut map = BoundedMap::new(3);
        for i in 0..3 {
            assert!(map.insert(i, i).is_none());
        }
        let evicted = map.insert(3, 3);
        assert_eq!(evicted, Some((0, 0)));
        assert_eq!(map.len(), 3);
        assert!(!map.contains_key(&0));
        assert!(map.contains_key(&3));
    }

    #[test]
    fn test_bounded_map_reinsert_keeps_age() {
        let mut map = BoundedMap::new(2);
        map.insert("a", 1);
        map.insert("b", 2);
        // Re-inserting "a" must not refresh its age
        map.insert("a", 10);
        let evicted = map.insert("c", 3);
        assert_eq!(evicted, Some(("a", 10)));
    }

    #[test]
    fn test_bounded_map_skips_stale_order_entries() {
        let mut map = BoundedMap::new(2);
        map.insert("a", 1);
        map.insert("b", 2);
        map.remove(&"a");
        // "a" is a stale order entry; eviction must pass over it to "b"
        map.insert("c", 3);
        let evicted = map.insert("d", 4);
        assert_eq!(evicted, Some(("b", 2)));
    }

    #[test]
    fn test_bounded_map_retain_reports_dropped() {
        let mut map = BoundedMap::new(10);
        for i in 0..6 {
            map.insert(i, i);
        }
        let dropped = map.retain(|_, v| v % 2 == 0);
        assert_eq!(dropped, 3);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_nonce_set_drops_oldest_half() {
        let mut set = NonceSet::new(4);
        for i in 0..4 {
            set.insert(Nonce::new(format!("n{}", i)));
        }
        assert_eq!(set.len(), 4);
        set.insert(Nonce::new("n4"));
        // Oldest half (n0, n1) dropped, n4 admitted
        assert_eq!(set.len(), 3);
        assert!(!set.contains(&Nonce::new("n0")));
        assert!(!set.contains(&Nonce::new("n1")));
        assert!(set.contains(&Nonce::new("n2")));
        assert!(set.contains(&Nonce::new("n4")));
    }

    #[tokio::test]
    async fn test_commit_verification_single_winner() {
        use std::sync::Arc;
        use veil_core::{CapabilityId, SequenceTokenSource, TokenSource};

        let tokens = SequenceTokenSource::new("t");
        let store = Arc::new(MemoryLedgerStore::new());
        let payment_id = tokens.payment_id();
        let nonce = tokens.nonce();

        let requirement = PaymentRequirement {
            payment_id: payment_id.clone(),
            capability_id: CapabilityId::new("cap:1"),
            name: "cap".into(),
            description: String::new(),
            amount: rust_decimal::Decimal::new(10, 0),
            currency: "USDC".into(),
            accepted_currencies: vec!["USDC".into()],
            accepted_networks: vec![],
            recipients: Default::default(),
            nonce: nonce.clone(),
            issued_at: Utc::now(),
            expires_at: Utc::now() + Duration::seconds(300),
            payment_methods: vec![],
        };
        store.put_requirement(requirement).await.unwrap();

        let (a, b) = tokio::join!(
            store.commit_verification(&payment_id, &nonce),
            store.commit_verification(&payment_id, &nonce),
        );
        let wins = [a.unwrap(), b.unwrap()];
        assert_eq!(wins.iter().filter(|w| **w).count(), 1);
    }
}

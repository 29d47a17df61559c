//! Veil Pay - Payment Admission Control
//!
//! Gates capability invocations behind an HTTP-402-style payment exchange:
//! - **Admission**: a pure predicate decides whether an invocation must pay
//! - **Requirements**: time-bounded, single-use challenges with ranked
//!   payment methods and a fresh nonce per issuance
//! - **Verification**: deterministic ordered checks with typed rejection
//!   reasons, replay protection through a bounded global nonce set, and an
//!   atomic consume-on-success step safe under concurrent submission
//! - **Records & revenue**: durable outcomes with totals by currency,
//!   capability, and agent
//! - **Sweeps**: periodic expiry and retention cleanup
//!
//! Memory is bounded throughout: the requirement, record, and nonce tables
//! all evict oldest-first and silently when full.
//!
//! # Modules
//!
//! - [`ledger`] - The payment ledger operations
//! - [`store`] - Storage interface and bounded in-memory implementation
//! - [`revenue`] - Revenue totals
//! - [`sweeper`] - Background cleanup task
//! - [`error`] - Error types

pub mod error;
pub mod ledger;
pub mod revenue;
pub mod store;
pub mod sweeper;

// Re-export error types
pub use error::{PayError, PayResult};

// Re-export ledger
pub use ledger::{PaymentLedger, PaymentLedgerConfig};

// Re-export store
pub use store::{
    BoundedMap, LedgerStore, MemoryLedgerStore, MemoryStoreConfig, NonceSet, StoreStats,
    SweepOutcome,
};

// Re-export revenue
pub use revenue::{RevenueBook, RevenueSnapshot};

// Re-export sweeper
pub use sweeper::{spawn_sweeper, SweeperHandle};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

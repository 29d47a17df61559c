//! Veil Exec - Tiered Confidential Execution Pipeline
//!
//! Runs admitted capability invocations through ordered privacy-preserving
//! stages, chosen by the economic size of the operation:
//!
//! ```text
//!            amount_usd
//!                │
//!        ┌───────▼────────┐
//!        │  TierResolver  │  public / protected / confidential
//!        └───────┬────────┘
//!                │
//!   ┌────────────▼──────────────────────────────────────────┐
//!   │              ExecutionPipeline                         │
//!   │  noir_eligibility ─ inco_encrypt ─ arcium_mpc ─        │
//!   │                           noir_execution_proof         │
//!   └──────┬──────────────┬──────────────┬──────────────────┘
//!          │              │              │
//!          ▼              ▼              ▼
//!    EligibilityProver  ParameterEncryptor  MpcExecutor
//!        (Noir)             (Inco FHE)       (Arcium)
//! ```
//!
//! Stages run sequentially within one request; each is timed and each is
//! conditional on the tier. The usage fee is derived from the slippage the
//! caller avoided by not executing publicly. On the same chassis sit the
//! secondary entities: threshold signing, multi-party swaps, encrypted
//! order books, private auctions.
//!
//! # Modules
//!
//! - [`pipeline`] - The pipeline and its primary `execute` operation
//! - [`stage`] - The fixed stage chain and skip-vs-run rules
//! - [`fees`] - Slippage estimation and fee derivation
//! - [`collaborators`] - External confidential-compute interfaces
//! - [`signing`] - Threshold signing
//! - [`swap`] - Multi-party swaps
//! - [`orderbook`] - Encrypted order books
//! - [`auction`] - Private auctions
//! - [`error`] - Error types

pub mod auction;
pub mod collaborators;
pub mod error;
pub mod fees;
pub mod orderbook;
pub mod pipeline;
pub mod signing;
pub mod stage;
pub mod swap;

// Re-export error types
pub use error::{ExecError, ExecResult};

// Re-export collaborator interfaces
pub use collaborators::{
    EligibilityProof, EligibilityProver, EncryptedValue, MpcExecutor, MpcOutcome,
    ParameterEncryptor,
};

// Re-export pipeline
pub use pipeline::{ExecutionPipeline, PipelineConfig, PipelineStats};

// Re-export stages
pub use stage::{
    StageContext, StageKind, STAGE_ELIGIBILITY, STAGE_ENCRYPT, STAGE_EXECUTION_PROOF, STAGE_MPC,
    STAGE_PUBLIC_EXECUTION,
};

// Re-export fees
pub use fees::{assess, public_estimate_bps, FeeBreakdown, FeeSchedule};

// Re-export signing
pub use signing::ThresholdSignature;

// Re-export swaps
pub use swap::{PartySettlement, SwapParty, SwapResult};

// Re-export order books
pub use orderbook::{EncryptedOrder, OrderAck, OrderMatch, OrderSide, Orderbook};

// Re-export auctions
pub use auction::{AuctionBid, AuctionSettlement, AuctionStatus, PrivateAuction};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

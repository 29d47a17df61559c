//! Execution Pipeline Error Codes
//!
//! Error code format: EXEC-{module}-{sequence}
//! - EXEC-COLLAB: Collaborator call failures
//! - EXEC-STAGE: Stage-level failures
//! - EXEC-BOOK: Order book errors
//! - EXEC-AUCTION: Auction errors
//!
//! Collaborator and stage errors never escape `execute()`; the pipeline
//! converts them into a failed `ExecutionResult` carrying partial progress.

use thiserror::Error;
use veil_core::{AuctionId, OrderbookId};

/// Execution result type
pub type ExecResult<T> = Result<T, ExecError>;

/// Execution pipeline error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    /// [EXEC-COLLAB-001] External collaborator call failed
    #[error("[EXEC-COLLAB-001] {service} collaborator call failed: {reason}")]
    Collaborator { service: String, reason: String },

    /// [EXEC-STAGE-001] Stage failed
    #[error("[EXEC-STAGE-001] stage {stage} failed: {reason}")]
    StageFailed { stage: String, reason: String },

    /// [EXEC-BOOK-001] Orderbook not found
    #[error("[EXEC-BOOK-001] orderbook {orderbook_id} not found")]
    OrderbookNotFound { orderbook_id: OrderbookId },

    /// [EXEC-AUCTION-001] Auction not found
    #[error("[EXEC-AUCTION-001] auction {auction_id} not found")]
    AuctionNotFound { auction_id: AuctionId },

    /// [EXEC-AUCTION-002] Settlement needs at least one bid
    #[error("[EXEC-AUCTION-002] auction {auction_id} has no bids")]
    AuctionWithoutBids { auction_id: AuctionId },

    /// [EXEC-AUCTION-003] Auction not accepting the operation
    #[error("[EXEC-AUCTION-003] auction {auction_id} is {status}, expected bidding")]
    AuctionNotBidding { auction_id: AuctionId, status: String },

    /// Invalid state
    #[error("Invalid state: {reason}")]
    InvalidState { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_in_messages() {
        let err = ExecError::Collaborator {
            service: "arcium".to_string(),
            reason: "timeout".to_string(),
        };
        assert!(err.to_string().contains("[EXEC-COLLAB-001]"));
        assert!(err.to_string().contains("arcium"));
    }
}

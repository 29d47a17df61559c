//! Payment Ledger Error Codes
//!
//! Error code format: PAY-{module}-{sequence}
//! - PAY-REQ: Requirement lifecycle errors
//! - PAY-REC: Record keeping errors
//! - PAY-STORE: Storage backend errors
//!
//! Proof rejections are NOT errors; they are `veil_core::VerifyFailure`
//! values so the router can render a specific 402 retry message.

use thiserror::Error;
use veil_core::PaymentId;

/// Payment result type
pub type PayResult<T> = Result<T, PayError>;

/// Payment ledger error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayError {
    /// [PAY-REQ-001] Requirement not found
    #[error("[PAY-REQ-001] Requirement {payment_id} not found")]
    RequirementNotFound { payment_id: PaymentId },

    /// [PAY-REC-001] Record not found
    #[error("[PAY-REC-001] Record {payment_id} not found")]
    RecordNotFound { payment_id: PaymentId },

    /// [PAY-REC-002] Settled records are immutable
    #[error("[PAY-REC-002] Record {payment_id} is settled and immutable")]
    RecordImmutable { payment_id: PaymentId },

    /// [PAY-STORE-001] Storage backend failure
    #[error("[PAY-STORE-001] Storage backend failure: {reason}")]
    Storage { reason: String },

    /// Invalid state
    #[error("Invalid state: {reason}")]
    InvalidState { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_in_messages() {
        let err = PayError::RequirementNotFound {
            payment_id: PaymentId::new("pay:1"),
        };
        assert!(err.to_string().contains("[PAY-REQ-001]"));
        assert!(err.to_string().contains("pay:1"));
    }
}

//! Core Error Registry
//!
//! Error code format: VEIL-{module}-{sequence}
//! - VEIL-TIER: Tier threshold configuration errors
//! - VEIL-AMOUNT: Amount validation errors
//! - VEIL-DIGEST: Digest parsing errors

use rust_decimal::Decimal;
use thiserror::Error;

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// [VEIL-TIER-001] Threshold ordering violated
    #[error("[VEIL-TIER-001] FHE floor {fhe} must be below MPC floor {mpc}")]
    InvalidThresholds { fhe: Decimal, mpc: Decimal },

    /// [VEIL-TIER-002] Negative threshold
    #[error("[VEIL-TIER-002] Tier threshold {value} must be non-negative")]
    NegativeThreshold { value: Decimal },

    /// [VEIL-AMOUNT-001] Invalid amount
    #[error("[VEIL-AMOUNT-001] Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// [VEIL-DIGEST-001] Invalid digest format
    #[error("[VEIL-DIGEST-001] Invalid digest format")]
    InvalidDigest,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_in_messages() {
        let err = CoreError::InvalidThresholds {
            fhe: Decimal::new(100, 0),
            mpc: Decimal::new(50, 0),
        };
        assert!(err.to_string().contains("[VEIL-TIER-001]"));
    }
}

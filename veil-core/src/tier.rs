//! Tier Resolution
//!
//! Pure mapping from the economic size of an operation to its privacy tier.
//! Boundary amounts resolve to the higher tier.

use crate::error::{CoreError, CoreResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Privacy/execution tier for one invocation
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Plain public execution, no confidential stages
    Public,
    /// FHE-encrypted parameters, no MPC
    Protected,
    /// Full confidential pipeline: encrypt, MPC, correctness proof
    Confidential,
    /// Explicit-override level; runs the confidential pipeline
    Maximum,
}

impl Tier {
    /// Get tier name
    pub fn name(&self) -> &'static str {
        match self {
            Tier::Public => "public",
            Tier::Protected => "protected",
            Tier::Confidential => "confidential",
            Tier::Maximum => "maximum",
        }
    }

    /// Tiers that encrypt parameters before execution
    pub fn requires_encryption(&self) -> bool {
        *self >= Tier::Protected
    }

    /// Tiers that execute inside MPC and prove correctness afterwards
    pub fn requires_mpc(&self) -> bool {
        *self >= Tier::Confidential
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Configured tier thresholds.
///
/// Invariant: `fhe_recommended < mpc_mandatory`, both non-negative.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TierThresholds {
    fhe_recommended: Decimal,
    mpc_mandatory: Decimal,
}

impl TierThresholds {
    /// Create thresholds, enforcing ordering
    pub fn new(fhe_recommended: Decimal, mpc_mandatory: Decimal) -> CoreResult<Self> {
        if fhe_recommended < Decimal::ZERO {
            return Err(CoreError::NegativeThreshold {
                value: fhe_recommended,
            });
        }
        if mpc_mandatory < Decimal::ZERO {
            return Err(CoreError::NegativeThreshold {
                value: mpc_mandatory,
            });
        }
        if fhe_recommended >= mpc_mandatory {
            return Err(CoreError::InvalidThresholds {
                fhe: fhe_recommended,
                mpc: mpc_mandatory,
            });
        }
        Ok(Self {
            fhe_recommended,
            mpc_mandatory,
        })
    }

    /// FHE-recommended floor
    pub fn fhe_recommended(&self) -> Decimal {
        self.fhe_recommended
    }

    /// Mandatory-MPC floor
    pub fn mpc_mandatory(&self) -> Decimal {
        self.mpc_mandatory
    }

    /// Resolve an amount to a tier. Pure and total; boundary values belong
    /// to the higher tier.
    pub fn resolve(&self, amount_usd: Decimal) -> Tier {
        if amount_usd >= self.mpc_mandatory {
            Tier::Confidential
        } else if amount_usd >= self.fhe_recommended {
            Tier::Protected
        } else {
            Tier::Public
        }
    }
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            fhe_recommended: Decimal::new(50_000, 0),
            mpc_mandatory: Decimal::new(100_000, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_resolution() {
        let thresholds = TierThresholds::default();
        assert_eq!(thresholds.resolve(Decimal::new(10_000, 0)), Tier::Public);
        assert_eq!(thresholds.resolve(Decimal::new(60_000, 0)), Tier::Protected);
        assert_eq!(
            thresholds.resolve(Decimal::new(150_000, 0)),
            Tier::Confidential
        );
    }

    #[test]
    fn test_boundaries_resolve_upward() {
        let thresholds = TierThresholds::default();
        assert_eq!(thresholds.resolve(Decimal::new(50_000, 0)), Tier::Protected);
        assert_eq!(
            thresholds.resolve(Decimal::new(100_000, 0)),
            Tier::Confidential
        );
    }

    #[test]
    fn test_monotone_non_decreasing() {
        let thresholds = TierThresholds::default();
        let amounts: Vec<Decimal> = (0..200)
            .map(|i| Decimal::new(i * 1_000, 0))
            .collect();
        let mut previous = Tier::Public;
        for amount in amounts {
            let tier = thresholds.resolve(amount);
            assert!(tier >= previous, "tier regressed at {}", amount);
            previous = tier;
        }
    }

    #[test]
    fn test_rejects_misordered_thresholds() {
        let result = TierThresholds::new(Decimal::new(100, 0), Decimal::new(100, 0));
        assert!(result.is_err());
        let result = TierThresholds::new(Decimal::new(-1, 0), Decimal::new(100, 0));
        assert!(result.is_err());
    }

    #[test]
    fn test_tier_capabilities() {
        assert!(!Tier::Public.requires_encryption());
        assert!(Tier::Protected.requires_encryption());
        assert!(!Tier::Protected.requires_mpc());
        assert!(Tier::Confidential.requires_mpc());
        assert!(Tier::Maximum.requires_mpc());
    }
}

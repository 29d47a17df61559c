//! Fee Derivation
//!
//! The usage fee is a share of the privacy value actually delivered: the
//! slippage a public execution of this size would have incurred, minus the
//! slippage the confidential path still incurs, priced in USD and clamped
//! to configured bounds. Never a flat tax.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use veil_core::Tier;

/// Fee configuration
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Share of the slippage saved charged as the fee
    pub fee_rate: Decimal,
    /// Fee floor in USD
    pub min_fee: Decimal,
    /// Fee ceiling in USD
    pub max_fee: Decimal,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            fee_rate: Decimal::new(10, 2),     // 10%
            min_fee: Decimal::new(10, 2),      // $0.10
            max_fee: Decimal::new(10_000, 0),  // $10,000
        }
    }
}

/// Residual slippage of a confidential-tier execution, in basis points
pub const CONFIDENTIAL_ACTUAL_BPS: i64 = 5;

/// Estimated slippage a public execution of this size would incur.
///
/// Monotone step function of the amount.
pub fn public_estimate_bps(amount_usd: Decimal) -> i64 {
    if amount_usd >= Decimal::new(1_000_000, 0) {
        500
    } else if amount_usd >= Decimal::new(500_000, 0) {
        300
    } else if amount_usd >= Decimal::new(100_000, 0) {
        150
    } else if amount_usd >= Decimal::new(50_000, 0) {
        75
    } else {
        25
    }
}

/// Actual slippage by tier: fixed residual at confidential tiers, half the
/// public estimate at protected, the full estimate (nothing saved) at public
pub fn actual_bps(tier: Tier, estimated_bps: i64) -> i64 {
    match tier {
        Tier::Confidential | Tier::Maximum => CONFIDENTIAL_ACTUAL_BPS,
        Tier::Protected => estimated_bps / 2,
        Tier::Public => estimated_bps,
    }
}

/// One fee assessment
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    /// Public-execution slippage estimate
    pub estimated_bps: i64,
    /// Slippage still incurred at the executed tier
    pub actual_bps: i64,
    /// Basis points avoided
    pub saved_bps: i64,
    /// USD value of the avoided slippage
    pub saved_usd: Decimal,
    /// Clamped usage fee
    pub fee_usd: Decimal,
}

/// Assess the fee for one execution
pub fn assess(schedule: &FeeSchedule, tier: Tier, amount_usd: Decimal) -> FeeBreakdown {
    let estimated_bps = public_estimate_bps(amount_usd);
    let actual = actual_bps(tier, estimated_bps);
    let saved_bps = estimated_bps - actual;
    let saved_usd = Decimal::new(saved_bps, 0) / Decimal::new(10_000, 0) * amount_usd;

    // No privacy delivered, no fee; the floor only applies to a real saving
    let fee_usd = if saved_bps <= 0 {
        Decimal::ZERO
    } else {
        (saved_usd * schedule.fee_rate).clamp(schedule.min_fee, schedule.max_fee)
    };

    FeeBreakdown {
        estimated_bps,
        actual_bps: actual,
        saved_bps,
        saved_usd,
        fee_usd,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_steps() {
        assert_eq!(public_estimate_bps(Decimal::new(10_000, 0)), 25);
        assert_eq!(public_estimate_bps(Decimal::new(50_000, 0)), 75);
        assert_eq!(public_estimate_bps(Decimal::new(100_000, 0)), 150);
        assert_eq!(public_estimate_bps(Decimal::new(500_000, 0)), 300);
        assert_eq!(public_estimate_bps(Decimal::new(1_000_000, 0)), 500);
    }

    #[test]
    fn test_estimate_is_monotone() {
        let mut previous = 0;
        for step in 0..50 {
            let bps = public_estimate_bps(Decimal::new(step * 50_000, 0));
            assert!(bps >= previous);
            previous = bps;
        }
    }

    #[test]
    fn test_confidential_fee_is_share_of_saving() {
        let breakdown = assess(
            &FeeSchedule::default(),
            Tier::Confidential,
            Decimal::new(150_000, 0),
        );
        assert_eq!(breakdown.estimated_bps, 150);
        assert_eq!(breakdown.actual_bps, 5);
        assert_eq!(breakdown.saved_bps, 145);
        // 145 bps of 150k = 2175; 10% share = 217.50
        assert_eq!(breakdown.saved_usd, Decimal::new(2_175, 0));
        assert_eq!(breakdown.fee_usd, Decimal::new(21_750, 2));
    }

    #[test]
    fn test_protected_saves_half() {
        let breakdown = assess(
            &FeeSchedule::default(),
            Tier::Protected,
            Decimal::new(60_000, 0),
        );
        assert_eq!(breakdown.estimated_bps, 75);
        assert_eq!(breakdown.actual_bps, 37);
        assert_eq!(breakdown.saved_bps, 38);
        assert!(breakdown.fee_usd > Decimal::ZERO);
    }

    #[test]
    fn test_public_pays_nothing() {
        let breakdown = assess(
            &FeeSchedule::default(),
            Tier::Public,
            Decimal::new(10_000, 0),
        );
        assert_eq!(breakdown.saved_bps, 0);
        assert_eq!(breakdown.fee_usd, Decimal::ZERO);
    }

    #[test]
    fn test_fee_clamps_to_bounds() {
        // Tiny confidential override: fee floors at $0.10
        let small = assess(
            &FeeSchedule::default(),
            Tier::Confidential,
            Decimal::new(100, 0),
        );
        assert_eq!(small.fee_usd, Decimal::new(10, 2));

        // Huge trade: fee ceilings at $10,000
        let large = assess(
            &FeeSchedule::default(),
            Tier::Confidential,
            Decimal::new(500_000_000, 0),
        );
        assert_eq!(large.fee_usd, Decimal::new(10_000, 0));
    }
}

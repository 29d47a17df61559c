//! Stage Chain
//!
//! The confidential stages run in one fixed order, each conditional on the
//! tier (eligibility on the request instead). Keeping the order and the
//! skip-vs-run rule in one place makes adding or removing a stage a
//! one-line change.

use serde::{Deserialize, Serialize};

use crate::collaborators::{EligibilityProof, EncryptedValue, MpcOutcome};
use veil_core::{ExecutionRequest, Tier};

/// Stage name: plain public execution
pub const STAGE_PUBLIC_EXECUTION: &str = "public_execution";
/// Stage name: eligibility proof (Noir)
pub const STAGE_ELIGIBILITY: &str = "noir_eligibility";
/// Stage name: parameter encryption (Inco FHE)
pub const STAGE_ENCRYPT: &str = "inco_encrypt";
/// Stage name: confidential execution (Arcium MPC)
pub const STAGE_MPC: &str = "arcium_mpc";
/// Stage name: post-execution correctness proof (Noir)
pub const STAGE_EXECUTION_PROOF: &str = "noir_execution_proof";

/// One confidential stage
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Prove policy eligibility before anything executes
    Eligibility,
    /// Encrypt the operation amount
    Encrypt,
    /// Execute inside MPC
    Mpc,
    /// Prove the MPC result correct
    ExecutionProof,
}

impl StageKind {
    /// The fixed execution order
    pub const ORDERED: [StageKind; 4] = [
        StageKind::Eligibility,
        StageKind::Encrypt,
        StageKind::Mpc,
        StageKind::ExecutionProof,
    ];

    /// Stage name as reported in `stages_completed`
    pub fn name(&self) -> &'static str {
        match self {
            StageKind::Eligibility => STAGE_ELIGIBILITY,
            StageKind::Encrypt => STAGE_ENCRYPT,
            StageKind::Mpc => STAGE_MPC,
            StageKind::ExecutionProof => STAGE_EXECUTION_PROOF,
        }
    }

    /// Whether this stage runs for the given tier and request.
    ///
    /// Eligibility is request-driven and runs at any tier; encryption runs
    /// from `Protected` up; MPC and the correctness proof from
    /// `Confidential` up.
    pub fn applies(&self, tier: Tier, request: &ExecutionRequest) -> bool {
        match self {
            StageKind::Eligibility => !request.required_proofs.is_empty(),
            StageKind::Encrypt => tier.requires_encryption(),
            StageKind::Mpc | StageKind::ExecutionProof => tier.requires_mpc(),
        }
    }
}

/// Artifacts threaded from stage to stage within one run
#[derive(Clone, Debug, Default)]
pub struct StageContext {
    /// Eligibility proof from the first required circuit
    pub eligibility: Option<EligibilityProof>,
    /// Encrypted operation amount
    pub encrypted_amount: Option<EncryptedValue>,
    /// MPC outcome
    pub mpc: Option<MpcOutcome>,
    /// Post-execution correctness proof
    pub correctness: Option<EligibilityProof>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use veil_core::{AgentId, OperationKind};

    fn request(proofs: &[&str]) -> ExecutionRequest {
        let mut request = ExecutionRequest::new(
            AgentId::new("agent:1"),
            OperationKind::Swap,
            Decimal::new(10_000, 0),
        );
        for proof in proofs {
            request = request.with_required_proof(*proof);
        }
        request
    }

    #[test]
    fn test_stage_applicability_by_tier() {
        let plain = request(&[]);
        assert!(!StageKind::Eligibility.applies(Tier::Confidential, &plain));
        assert!(!StageKind::Encrypt.applies(Tier::Public, &plain));
        assert!(StageKind::Encrypt.applies(Tier::Protected, &plain));
        assert!(!StageKind::Mpc.applies(Tier::Protected, &plain));
        assert!(StageKind::Mpc.applies(Tier::Confidential, &plain));
        assert!(StageKind::ExecutionProof.applies(Tier::Maximum, &plain));
    }

    #[test]
    fn test_eligibility_applies_at_any_tier_with_proofs() {
        let gated = request(&["balance_threshold"]);
        assert!(StageKind::Eligibility.applies(Tier::Public, &gated));
        assert!(StageKind::Eligibility.applies(Tier::Maximum, &gated));
    }

    #[test]
    fn test_order_is_fixed() {
        let names: Vec<&str> = StageKind::ORDERED.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                STAGE_ELIGIBILITY,
                STAGE_ENCRYPT,
                STAGE_MPC,
                STAGE_EXECUTION_PROOF
            ]
        );
    }
}

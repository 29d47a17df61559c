//! Multi-Party Confidential Swap
//!
//! Each party settles through an independent confidential-swap MPC call; the
//! swap as a whole succeeds only when every party committed. Volume and fee
//! accrue regardless of per-party outcome.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::fees;
use crate::pipeline::ExecutionPipeline;
use veil_core::{AgentId, ComputationId, Tier};

/// One side of a multi-party swap
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SwapParty {
    /// Settling agent
    pub agent_id: AgentId,
    /// Asset given up
    pub give_asset: String,
    /// USD notional given up
    pub give_amount_usd: Decimal,
    /// Asset received
    pub receive_asset: String,
}

/// Per-party settlement outcome
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartySettlement {
    /// Settling agent
    pub agent_id: AgentId,
    /// Whether this party's MPC call succeeded
    pub committed: bool,
    /// MPC computation id if a submission completed
    pub computation_id: Option<ComputationId>,
    /// Failure description
    pub error: Option<String>,
}

/// Outcome of one multi-party swap
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SwapResult {
    /// All parties committed
    pub success: bool,
    /// Tier the swap ran at, resolved from total notional
    pub tier: Tier,
    /// Per-party settlements in input order
    pub settlements: Vec<PartySettlement>,
    /// Total USD notional
    pub total_volume_usd: Decimal,
    /// Usage fee on the total notional
    pub fee_usd: Decimal,
}

impl ExecutionPipeline {
    /// Settle a multi-party swap.
    ///
    /// An empty party list is trivially unsuccessful and submits nothing.
    pub async fn multi_party_swap(&self, parties: &[SwapParty]) -> SwapResult {
        let total_volume_usd: Decimal = parties.iter().map(|p| p.give_amount_usd).sum();
        let tier = self.config.thresholds.resolve(total_volume_usd);

        if parties.is_empty() {
            return SwapResult {
                success: false,
                tier,
                settlements: Vec::new(),
                total_volume_usd,
                fee_usd: Decimal::ZERO,
            };
        }

        let mut settlements = Vec::with_capacity(parties.len());
        for party in parties {
            let mut encrypted_inputs = BTreeMap::new();
            encrypted_inputs.insert("agent_id".to_string(), party.agent_id.to_string());
            encrypted_inputs.insert("give_asset".to_string(), party.give_asset.clone());
            encrypted_inputs.insert(
                "give_amount_usd".to_string(),
                party.give_amount_usd.to_string(),
            );
            encrypted_inputs.insert("receive_asset".to_string(), party.receive_asset.clone());

            let mut metadata = BTreeMap::new();
            metadata.insert("swap_notional_usd".to_string(), total_volume_usd.to_string());
            metadata.insert("party_count".to_string(), parties.len().to_string());

            let settlement = match self
                .mpc
                .submit("confidential_swap", encrypted_inputs, metadata)
                .await
            {
                Ok(outcome) if outcome.success => PartySettlement {
                    agent_id: party.agent_id.clone(),
                    committed: true,
                    computation_id: Some(outcome.computation_id),
                    error: None,
                },
                Ok(outcome) => PartySettlement {
                    agent_id: party.agent_id.clone(),
                    committed: false,
                    computation_id: Some(outcome.computation_id),
                    error: Some("swap computation reported failure".to_string()),
                },
                Err(error) => {
                    warn!(agent_id = %party.agent_id, error = %error, "swap settlement failed");
                    PartySettlement {
                        agent_id: party.agent_id.clone(),
                        committed: false,
                        computation_id: None,
                        error: Some(error.to_string()),
                    }
                }
            };
            settlements.push(settlement);
        }

        let success = settlements.iter().all(|s| s.committed);
        let breakdown = fees::assess(&self.config.fees, tier, total_volume_usd);

        // Accrued regardless of per-party outcome
        self.accrue(total_volume_usd, breakdown.fee_usd).await;

        info!(
            parties = parties.len(),
            committed = settlements.iter().filter(|s| s.committed).count(),
            total_volume_usd = %total_volume_usd,
            fee_usd = %breakdown.fee_usd,
            "multi-party swap settled"
        );

        SwapResult {
            success,
            tier,
            settlements,
            total_volume_usd,
            fee_usd: breakdown.fee_usd,
        }
    }
}
